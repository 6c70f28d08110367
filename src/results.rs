//! Optional JSON dump of confirmed transactions. Write-only.

use crate::chain::TxReceipt;
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    pub operation: String,
    pub account: Address,
    pub link: String,
    pub late_confirmation: bool,
    pub receipt: TxReceipt,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResultSink {
    dir: Option<PathBuf>,
}

impl ResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Sink that drops every record
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Write `tx-<timestamp>.json`. Failures are logged, never propagated.
    pub fn record(&self, record: &TxRecord) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        match write_record(dir, record) {
            Ok(path) => {
                debug!(path = %path.display(), "Saved transaction result");
                Some(path)
            }
            Err(e) => {
                error!("Failed to save transaction: {}", e);
                None
            }
        }
    }
}

fn write_record(dir: &Path, record: &TxRecord) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let timestamp = record.recorded_at.format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let mut path = dir.join(format!("tx-{}.json", timestamp));

    // Two confirmations inside the same millisecond
    let mut suffix = 1;
    while path.exists() {
        path = dir.join(format!("tx-{}-{}.json", timestamp, suffix));
        suffix += 1;
    }

    let json = serde_json::to_string_pretty(record).map_err(std::io::Error::other)?;
    std::fs::write(&path, json)?;
    Ok(path)
}
