//! Metrics collection module

use prometheus::{IntCounter, Opts, Registry};

/// Process-wide transaction counters
pub struct Metrics {
    registry: Registry,

    pub tx_submitted: IntCounter,
    pub tx_confirmed: IntCounter,
    pub tx_late_confirmed: IntCounter,
    pub tx_failed: IntCounter,
    pub retries_total: IntCounter,
    pub swaps_skipped: IntCounter,
    pub uploads_completed: IntCounter,
    pub accounts_aborted: IntCounter,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let tx_submitted = IntCounter::with_opts(Opts::new(
            "tx_submitted_total",
            "Transactions broadcast to the chain",
        ))?;

        let tx_confirmed = IntCounter::with_opts(Opts::new(
            "tx_confirmed_total",
            "Transactions confirmed within the wait window",
        ))?;

        let tx_late_confirmed = IntCounter::with_opts(Opts::new(
            "tx_late_confirmed_total",
            "Transactions confirmed by receipt polling after a wait timeout",
        ))?;

        let tx_failed =
            IntCounter::with_opts(Opts::new("tx_failed_total", "Reverted or unresolved transactions"))?;

        let retries_total =
            IntCounter::with_opts(Opts::new("retries_total", "Retry attempts scheduled"))?;

        let swaps_skipped = IntCounter::with_opts(Opts::new(
            "swaps_skipped_total",
            "Swap iterations skipped (zero amount or read failure)",
        ))?;

        let uploads_completed =
            IntCounter::with_opts(Opts::new("uploads_completed_total", "Files stored on-chain"))?;

        let accounts_aborted = IntCounter::with_opts(Opts::new(
            "accounts_aborted_total",
            "Account pipelines aborted by an unexpected error",
        ))?;

        registry.register(Box::new(tx_submitted.clone()))?;
        registry.register(Box::new(tx_confirmed.clone()))?;
        registry.register(Box::new(tx_late_confirmed.clone()))?;
        registry.register(Box::new(tx_failed.clone()))?;
        registry.register(Box::new(retries_total.clone()))?;
        registry.register(Box::new(swaps_skipped.clone()))?;
        registry.register(Box::new(uploads_completed.clone()))?;
        registry.register(Box::new(accounts_aborted.clone()))?;

        Ok(Self {
            registry,
            tx_submitted,
            tx_confirmed,
            tx_late_confirmed,
            tx_failed,
            retries_total,
            swaps_skipped,
            uploads_completed,
            accounts_aborted,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tx_submitted: self.tx_submitted.get(),
            tx_confirmed: self.tx_confirmed.get(),
            tx_late_confirmed: self.tx_late_confirmed.get(),
            tx_failed: self.tx_failed.get(),
            retries: self.retries_total.get(),
            swaps_skipped: self.swaps_skipped.get(),
            uploads_completed: self.uploads_completed.get(),
            accounts_aborted: self.accounts_aborted.get(),
        }
    }
}

/// Point-in-time copy of the counters, used for per-pass summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tx_submitted: u64,
    pub tx_confirmed: u64,
    pub tx_late_confirmed: u64,
    pub tx_failed: u64,
    pub retries: u64,
    pub swaps_skipped: u64,
    pub uploads_completed: u64,
    pub accounts_aborted: u64,
}

impl MetricsSnapshot {
    /// Counter deltas since an earlier snapshot
    pub fn since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            tx_submitted: self.tx_submitted.saturating_sub(earlier.tx_submitted),
            tx_confirmed: self.tx_confirmed.saturating_sub(earlier.tx_confirmed),
            tx_late_confirmed: self.tx_late_confirmed.saturating_sub(earlier.tx_late_confirmed),
            tx_failed: self.tx_failed.saturating_sub(earlier.tx_failed),
            retries: self.retries.saturating_sub(earlier.retries),
            swaps_skipped: self.swaps_skipped.saturating_sub(earlier.swaps_skipped),
            uploads_completed: self.uploads_completed.saturating_sub(earlier.uploads_completed),
            accounts_aborted: self.accounts_aborted.saturating_sub(earlier.accounts_aborted),
        }
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}
