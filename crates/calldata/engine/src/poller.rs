//! Periodic merging of the indexer's best-known extrinsics.

use core::time::Duration;

use bon::Builder;
use multiproxy_calldata_domain::{Address, best_tx::BestTx};
use tokio::time::{self, MissedTickBehavior};

use crate::{
    chain::{ChainApi, ChainError},
    error::Result,
    merger::{MergeSummary, TransactionMerger},
};

/// The indexing service reporting finalized extrinsics per account.
pub trait BestTxSource {
    /// Returns the best-known extrinsics touching any of `addresses`.
    fn best_txs(
        &self,
        addresses: &[Address],
    ) -> impl Future<Output = Result<Vec<BestTx>, ChainError>> + Send;
}

impl<T> BestTxSource for &T
where
    T: BestTxSource + ?Sized,
{
    fn best_txs(
        &self,
        addresses: &[Address],
    ) -> impl Future<Output = Result<Vec<BestTx>, ChainError>> + Send {
        (**self).best_txs(addresses)
    }
}

/// Configuration of a [`Poller`].
#[derive(Debug, Clone, Builder)]
pub struct PollerConfig {
    /// Time between two polls.
    #[builder(default = Duration::from_secs(6))]
    interval: Duration,

    /// Stop after this many polls; run until shut down otherwise.
    max_cycles: Option<u64>,

    /// The accounts to watch.
    #[builder(default)]
    addresses: Vec<Address>,
}

impl PollerConfig {
    /// Returns the time between two polls.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the poll limit, if any.
    pub fn max_cycles(&self) -> Option<u64> {
        self.max_cycles
    }

    /// Returns the watched accounts.
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }
}

/// Drives a [`TransactionMerger`] from a [`BestTxSource`] on a fixed interval.
pub struct Poller<C, S> {
    chain: C,
    source: S,
    merger: TransactionMerger,
    config: PollerConfig,
}

impl<C, S> Poller<C, S>
where
    C: ChainApi,
    S: BestTxSource,
{
    /// Creates a poller starting from `merger`.
    pub fn new(chain: C, source: S, merger: TransactionMerger, config: PollerConfig) -> Self {
        Self { chain, source, merger, config }
    }

    /// Returns the merger and the transactions it holds.
    pub fn merger(&self) -> &TransactionMerger {
        &self.merger
    }

    /// Returns the merger, e.g. to register call data learned elsewhere.
    pub fn merger_mut(&mut self) -> &mut TransactionMerger {
        &mut self.merger
    }

    /// Consumes the poller, returning its merger.
    pub fn into_merger(self) -> TransactionMerger {
        self.merger
    }

    /// Fetches the best-known extrinsics once and merges them.
    #[tracing::instrument(skip_all, fields(addresses = self.config.addresses.len()))]
    pub async fn poll_once(&mut self) -> Result<MergeSummary> {
        let best_txs = self.source.best_txs(&self.config.addresses).await?;
        self.merger.merge_calldata(&self.chain, &best_txs).await
    }

    /// Polls until `shutdown` resolves or the configured number of cycles ran.
    ///
    /// A failed cycle is logged and retried on the next tick; nothing merged by earlier cycles is
    /// lost. Returns the number of cycles run.
    pub async fn run<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles = 0;
        while self.config.max_cycles.is_none_or(|max| cycles < max) {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!(cycles, "shutdown requested");
                    break;
                }
                _ = interval.tick() => {}
            }

            cycles += 1;
            match self.poll_once().await {
                Ok(summary) => tracing::debug!(cycles, ?summary, "poll cycle done"),
                Err(err) => tracing::warn!(%err, cycles, "poll cycle failed, retrying next tick"),
            }
        }

        cycles
    }
}
