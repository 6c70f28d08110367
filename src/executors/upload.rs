//! Storage upload phase.
//!
//! One file = one image. An attempt re-posts the segment to the indexer,
//! builds a fresh submission template and sends it to the flow contract, so
//! a retry after a gateway failure repeats the whole off-chain + on-chain
//! sequence.

use super::{escalate_fatal, pause};
use crate::chain::{ChainClient, TxReceipt, TxRequest};
use crate::config::{Config, StorageConfig};
use crate::errors::BotResult;
use crate::metrics::metrics;
use crate::retry::retry_with_backoff;
use crate::storage::{ImageSource, PreparedImage, StorageClient, StorageSubmission};
use crate::submitter::TxSubmitter;
use rand::Rng;
use tracing::info;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub receipts: Vec<TxReceipt>,
    pub failed: usize,
}

pub struct UploadExecutor<'a, C: ChainClient> {
    submitter: &'a TxSubmitter<'a, C>,
    config: &'a Config,
    storage: &'a StorageClient,
    images: &'a ImageSource,
}

impl<'a, C: ChainClient> UploadExecutor<'a, C> {
    pub fn new(
        submitter: &'a TxSubmitter<'a, C>,
        config: &'a Config,
        storage: &'a StorageClient,
        images: &'a ImageSource,
    ) -> Self {
        Self {
            submitter,
            config,
            storage,
            images,
        }
    }

    fn storage_config(&self) -> &'a StorageConfig {
        &self.config.storage
    }

    pub async fn run(&self) -> BotResult<UploadSummary> {
        let count = rand::thread_rng().gen_range(self.storage_config().files_range());
        info!("📁 Uploading {} files", count);
        self.run_files(count).await
    }

    pub async fn run_files(&self, count: u32) -> BotResult<UploadSummary> {
        let mut summary = UploadSummary::default();

        for index in 1..=count {
            match self.upload_file(index).await? {
                Some(receipt) => summary.receipts.push(receipt),
                None => summary.failed += 1,
            }
            if index < count {
                pause(self.storage_config().file_delay_ms).await;
            }
        }

        info!(
            "📁 Uploads finished: {} succeeded, {} failed",
            summary.receipts.len(),
            summary.failed
        );
        Ok(summary)
    }

    /// Upload one random image. `Ok(None)` when the file was given up on.
    pub async fn upload_file(&self, index: u32) -> BotResult<Option<TxReceipt>> {
        let logger = self.submitter.logger();
        info!(
            "📤 Uploading file #{} from {}",
            index,
            self.submitter.chain().address()
        );

        let image = match self.images.fetch_prepared().await {
            Ok(image) => image,
            Err(e) => {
                logger.error(&format!("Failed to fetch image for file #{}: {}", index, e));
                escalate_fatal(e)?;
                return Ok(None);
            }
        };

        match self.upload_prepared(&image).await {
            Ok(receipt) => {
                metrics().uploads_completed.inc();
                info!("✅ File uploaded, root hash: {}", image.root_hex());
                Ok(Some(receipt))
            }
            Err(e) => {
                logger.error(&format!("Upload of file #{} abandoned: {}", index, e));
                escalate_fatal(e)?;
                Ok(None)
            }
        }
    }

    /// Segment post, template encoding and submission, retried together.
    pub async fn upload_prepared(&self, image: &PreparedImage) -> BotResult<TxReceipt> {
        let profile = &self.config.retry.upload;
        let policy = profile.retry_policy();
        let timeout = profile.confirmation_timeout();
        let contract = self.storage_config().contract_address();
        let submitter = self.submitter;
        let storage = self.storage;

        retry_with_backoff("upload", &policy, |attempt| async move {
            storage.upload_segment(image).await?;

            let calldata = StorageSubmission::new(image.root).encode();
            let request = TxRequest::new(contract, calldata).with_gas_limit(profile.gas_limit);
            info!(attempt, "⛓️ Submitting storage transaction");

            submitter
                .submit("Upload", request, timeout)
                .await?
                .into_result(submitter.explorer())
        })
        .await
    }
}
