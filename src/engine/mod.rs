//! Update engine.
//!
//! `rows` flattens snapshots into the sheet's row block; `cycle` owns
//! the fetch→build→write sequencing and single-cycle failure isolation.

pub mod cycle;
pub mod rows;
