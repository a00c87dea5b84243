//! sheetfolio — broker account dashboard.
//!
//! Entry point. Loads configuration from the environment, initialises
//! structured logging, builds the broker adapters and the sheet writer,
//! and runs the update cycle — once, or on an interval with graceful
//! shutdown.

use anyhow::Result;
use tracing::{error, info};

use sheetfolio::brokers::alpaca::AlpacaAdapter;
use sheetfolio::brokers::kraken::KrakenAdapter;
use sheetfolio::brokers::oanda::OandaAdapter;
use sheetfolio::config::Config;
use sheetfolio::engine::cycle::{log_cycle_report, BrokerSlot, Orchestrator};
use sheetfolio::sheet::google::GoogleSheetsWriter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = Config::from_env()?;

    init_logging();

    info!(
        worksheet = %cfg.sheet.worksheet,
        alpaca = cfg.alpaca.is_some(),
        kraken = cfg.kraken.is_some(),
        oanda = cfg.oanda.is_some(),
        interval_secs = cfg.update_interval.map(|d| d.as_secs()),
        timezone = %cfg.timezone,
        "sheetfolio starting up"
    );

    let orchestrator = build_orchestrator(&cfg)?;

    // -- Run once, or loop on the configured interval --------------------

    let Some(interval) = cfg.update_interval else {
        info!("Running single update...");
        let report = orchestrator.run_cycle().await?;
        log_cycle_report(&report);
        info!("Done.");
        return Ok(());
    };

    info!(
        interval_secs = interval.as_secs(),
        "Entering update loop. Press Ctrl+C to stop."
    );

    let mut ticker = tokio::time::interval(interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match orchestrator.run_cycle().await {
                    Ok(report) => log_cycle_report(&report),
                    Err(e) => {
                        // Cycle-fatal (writer) errors abort this cycle only;
                        // the next tick retries from scratch.
                        error!(error = %e, "Cycle failed — continuing to next");
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("sheetfolio shut down cleanly.");
    Ok(())
}

/// Wire configured adapters into their fixed slots (the row order on
/// the sheet never changes relative to other brokers).
fn build_orchestrator(cfg: &Config) -> Result<Orchestrator> {
    let alpaca = match &cfg.alpaca {
        Some(c) => BrokerSlot::configured(Box::new(AlpacaAdapter::new(c)?)),
        None => BrokerSlot::not_configured("Alpaca"),
    };
    let kraken = match &cfg.kraken {
        Some(c) => BrokerSlot::configured(Box::new(KrakenAdapter::new(c)?)),
        None => BrokerSlot::not_configured("Kraken"),
    };
    let oanda = match &cfg.oanda {
        Some(c) => BrokerSlot::configured(Box::new(OandaAdapter::new(c)?)),
        None => BrokerSlot::not_configured("OANDA"),
    };

    let writer = GoogleSheetsWriter::new(&cfg.sheet)?;

    Ok(Orchestrator::new(
        vec![alpaca, kraken, oanda],
        Box::new(writer),
        cfg.timezone,
    ))
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sheetfolio=info"));

    let json_logging = std::env::var("SHEETFOLIO_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
