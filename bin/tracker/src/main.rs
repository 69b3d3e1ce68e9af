//! # Configuration
//!
//! The tracker is configured through:
//! - Base configuration file (`base_config.ron`)
//! - Environment variables prefixed with `MULTIPROXY_` (override base config)
//!
//! ## Base Configuration
//!
//! The default configuration is loaded from `base_config.ron`:
//!
//! ```ron
//! Config(
//!     tracker: TrackerConfig(
//!         poll_interval: "6s",
//!         max_cycles: None,
//!         addresses: [],
//!     ),
//!     snapshot: SnapshotConfig(
//!         path: "./snapshot.json",
//!     ),
//!     signer: SignerConfig(
//!         local_addresses: {},
//!     ),
//! )
//! ```
//!
//! ## Environment Variable Overrides
//!
//! Use double underscores (`__`) to override nested configuration fields:
//!
//! ```bash
//! export MULTIPROXY_TRACKER__POLL_INTERVAL="12s"
//! export MULTIPROXY_TRACKER__MAX_CYCLES="1"
//! export MULTIPROXY_TRACKER__ADDRESSES="0x0101...01,0x0202...02"
//! export MULTIPROXY_SNAPSHOT__PATH="./recorded.json"
//!
//! cargo run --bin multiproxy-tracker
//! ```
//!
//! # Output
//!
//! When polling stops, either after `max_cycles` polls or on Ctrl-C, the tracked transaction
//! trees and the signing paths of every recorded account are printed to stdout as JSON.
//!
//! # Logging
//!
//! Logging is controlled via the `RUST_LOG` environment variable. Defaults to `info` level.

use multiproxy_calldata_engine::{Poller, PollerConfig, TransactionMerger};
use multiproxy_tracker::{config, report::Report, snapshot::SnapshotChain};
use tokio::{signal, task};
use tracing::{Subscriber, subscriber};
use tracing_subscriber::{EnvFilter, Registry, fmt::format::FmtSpan, layer::SubscriberExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = task::spawn_blocking(config::get_configuration).await??;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    subscriber::set_global_default(make_tracing_subscriber(env_filter))?;

    let chain = SnapshotChain::open(&config.snapshot.path).await?;
    tracing::info!(path = %config.snapshot.path.display(), "tracking chain snapshot");

    let poller_config = PollerConfig::builder()
        .interval(config.tracker.poll_interval)
        .maybe_max_cycles(config.tracker.max_cycles)
        .addresses(config.tracker.addresses)
        .build();
    let mut poller = Poller::new(&chain, &chain, TransactionMerger::new(), poller_config);

    let cycles = poller.run(shutdown_signal()).await;
    tracing::info!(cycles, transactions = poller.merger().store().len(), "polling stopped");

    let accounts = chain.accounts()?;
    let report = Report::new(poller.merger().store(), &accounts, &config.signer.local_addresses);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::warn!(%err, "cannot listen for ctrl-c, polling until max_cycles");
        std::future::pending::<()>().await;
    }
}

fn make_tracing_subscriber(env_filter: EnvFilter) -> impl Subscriber {
    Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE),
        )
        .with(env_filter)
}
