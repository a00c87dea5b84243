//! sheetfolio — broker account dashboard.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod brokers;
pub mod config;
pub mod engine;
pub mod sheet;
pub mod types;
pub mod valuation;
