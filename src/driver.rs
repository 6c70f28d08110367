//! Batch driver: walks every account through mint, swap and upload, then
//! sleeps until the next pass.

use crate::chain::{ChainClient, ChainConnector};
use crate::config::Config;
use crate::errors::{BotError, BotResult};
use crate::executors::{
    MintExecutor, MintSummary, SwapExecutor, SwapSummary, UploadExecutor, UploadSummary,
};
use crate::metrics::{metrics, MetricsSnapshot};
use crate::proxy::ProxyPool;
use crate::results::ResultSink;
use crate::storage::{ImageSource, StorageClient};
use crate::structured_logging::{ExplorerLink, StructuredLogger};
use crate::submitter::TxSubmitter;
use crate::wallet::Account;
use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Which phases run for each account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phases {
    pub mint: bool,
    pub swap: bool,
    pub upload: bool,
}

impl Phases {
    pub fn all() -> Self {
        Self {
            mint: true,
            swap: true,
            upload: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            mint: config.mint.enabled,
            swap: config.swap.enabled,
            upload: config.storage.enabled,
        }
    }

    /// Parse a comma separated subset such as `mint,upload`
    pub fn parse(list: &str) -> BotResult<Self> {
        let mut phases = Self {
            mint: false,
            swap: false,
            upload: false,
        };
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "mint" => phases.mint = true,
                "swap" => phases.swap = true,
                "upload" => phases.upload = true,
                other => {
                    return Err(BotError::Configuration(format!("unknown phase '{}'", other)))
                }
            }
        }
        Ok(phases)
    }

    /// Phases enabled in both
    pub fn intersect(self, other: Self) -> Self {
        Self {
            mint: self.mint && other.mint,
            swap: self.swap && other.swap,
            upload: self.upload && other.upload,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountReport {
    pub index: usize,
    pub address: Address,
    pub mint: Option<MintSummary>,
    pub swap: Option<SwapSummary>,
    pub upload: Option<UploadSummary>,
    /// Set when a fatal error cut the account's pipeline short
    pub aborted: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub pass_id: String,
    pub accounts: Vec<AccountReport>,
    pub metrics: MetricsSnapshot,
}

impl BatchReport {
    pub fn aborted_accounts(&self) -> usize {
        self.accounts.iter().filter(|a| a.aborted.is_some()).count()
    }
}

pub struct BatchDriver<K: ChainConnector> {
    config: Config,
    connector: K,
    accounts: Vec<Account>,
    storage: StorageClient,
    images: ImageSource,
    explorer: ExplorerLink,
    sink: ResultSink,
    phases: Phases,
}

impl<K: ChainConnector> BatchDriver<K> {
    pub fn new(config: Config, connector: K, accounts: Vec<Account>, proxies: ProxyPool) -> Self {
        let proxies = Arc::new(proxies.with_timeout(Duration::from_secs(config.http.timeout_secs)));
        let storage = StorageClient::new(config.storage.indexer_url.clone(), proxies.clone());
        let images = ImageSource::new(config.storage.image_sources.clone(), proxies);
        let explorer = ExplorerLink::new(config.network.explorer_tx_url.clone());
        let sink = if config.files.save_results {
            ResultSink::new(&config.files.results_dir)
        } else {
            ResultSink::disabled()
        };
        let phases = Phases::from_config(&config);

        Self {
            config,
            connector,
            accounts,
            storage,
            images,
            explorer,
            sink,
            phases,
        }
    }

    /// Restrict phases further; config-disabled phases stay disabled
    pub fn with_phases(mut self, phases: Phases) -> Self {
        self.phases = self.phases.intersect(phases);
        self
    }

    pub fn with_result_sink(mut self, sink: ResultSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn phases(&self) -> Phases {
        self.phases
    }

    /// Run passes forever, or a single pass when `once` is set
    pub async fn run(&self, once: bool) {
        let interval = Duration::from_secs(self.config.schedule.batch_interval_secs);
        loop {
            self.run_pass().await;
            if once {
                info!("🏁 Single pass finished");
                return;
            }
            info!(
                "⏳ All accounts done. Waiting {}h for the next pass...",
                interval.as_secs() / 3600
            );
            tokio::time::sleep(interval).await;
        }
    }

    /// One pass over every account, strictly in order
    pub async fn run_pass(&self) -> BatchReport {
        let pass_id = Uuid::new_v4().to_string();
        let before = metrics().snapshot();
        info!(pass_id = %pass_id, accounts = self.accounts.len(), "🚀 Starting pass");

        let mut reports = Vec::with_capacity(self.accounts.len());
        for (i, account) in self.accounts.iter().enumerate() {
            reports.push(self.run_account(account, &pass_id).await);

            if i + 1 < self.accounts.len() && self.config.schedule.account_delay_ms > 0 {
                info!(
                    "⏳ Waiting {}s before next account...",
                    self.config.schedule.account_delay_ms / 1000
                );
                tokio::time::sleep(Duration::from_millis(self.config.schedule.account_delay_ms))
                    .await;
            }
        }

        let report = BatchReport {
            pass_id,
            accounts: reports,
            metrics: metrics().snapshot().since(&before),
        };
        log_summary(&report);
        report
    }

    /// Never fails: a fatal error aborts only this account's remaining phases
    pub async fn run_account(&self, account: &Account, pass_id: &str) -> AccountReport {
        let mut report = AccountReport {
            index: account.index(),
            address: account.address(),
            ..Default::default()
        };
        info!("🔵 Processing wallet #{}: {}", account.index(), account.address());

        let chain = match self.connector.connect(account) {
            Ok(chain) => chain,
            Err(e) => {
                self.abort(&mut report, e);
                return report;
            }
        };

        let logger = StructuredLogger::new(pass_id.to_string(), account.address());
        if let Err(e) = self.run_phases(&chain, &logger, &mut report).await {
            logger.error(&format!("Aborting wallet #{}: {}", account.index(), e));
            self.abort(&mut report, e);
        }
        report
    }

    async fn run_phases<C: ChainClient>(
        &self,
        chain: &C,
        logger: &StructuredLogger,
        report: &mut AccountReport,
    ) -> BotResult<()> {
        let submitter = TxSubmitter::new(chain, &self.explorer, logger, &self.sink);

        if self.phases.mint {
            report.mint = Some(MintExecutor::new(&submitter, &self.config).run().await?);
        }
        if self.phases.swap {
            report.swap = Some(SwapExecutor::new(&submitter, &self.config).run().await?);
        }
        if self.phases.upload {
            let uploads = UploadExecutor::new(&submitter, &self.config, &self.storage, &self.images);
            report.upload = Some(uploads.run().await?);
        }
        Ok(())
    }

    fn abort(&self, report: &mut AccountReport, err: BotError) {
        metrics().accounts_aborted.inc();
        error!(
            account = %report.address,
            "❌ Wallet #{} aborted for this pass: {}",
            report.index,
            err
        );
        report.aborted = Some(err.to_string());
    }
}

fn log_summary(report: &BatchReport) {
    let m = &report.metrics;
    info!(
        pass_id = %report.pass_id,
        accounts = report.accounts.len(),
        aborted = report.aborted_accounts(),
        submitted = m.tx_submitted,
        confirmed = m.tx_confirmed,
        late_confirmed = m.tx_late_confirmed,
        failed = m.tx_failed,
        retries = m.retries,
        swaps_skipped = m.swaps_skipped,
        uploads = m.uploads_completed,
        "📊 Pass summary"
    );
    if report.aborted_accounts() > 0 {
        warn!(
            "{} of {} wallets were aborted this pass",
            report.aborted_accounts(),
            report.accounts.len()
        );
    }
}
