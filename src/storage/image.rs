//! Random image download and payload preparation.

use crate::errors::{BotError, BotResult};
use crate::proxy::ProxyPool;
use alloy::primitives::B256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Image bytes reduced to what the indexer and the contract need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// SHA-256 of the raw bytes
    pub root: B256,
    /// Base64 of the raw bytes
    pub data: String,
    pub size: usize,
}

impl PreparedImage {
    pub fn prepare(bytes: &[u8]) -> BotResult<Self> {
        if bytes.is_empty() {
            return Err(BotError::Encoding("empty image body".into()));
        }
        let root = B256::from_slice(&Sha256::digest(bytes));
        Ok(Self {
            root,
            data: STANDARD.encode(bytes),
            size: bytes.len(),
        })
    }

    pub fn root_hex(&self) -> String {
        format!("0x{}", hex::encode(self.root))
    }
}

/// Picks one of the configured endpoints per download
#[derive(Debug, Clone)]
pub struct ImageSource {
    urls: Vec<String>,
    proxies: Arc<ProxyPool>,
}

impl ImageSource {
    pub fn new(urls: Vec<String>, proxies: Arc<ProxyPool>) -> Self {
        Self { urls, proxies }
    }

    pub async fn fetch_random(&self) -> BotResult<Vec<u8>> {
        let url = self
            .urls
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| BotError::Configuration("no image sources configured".into()))?;

        let client = self.proxies.http_client()?;
        let response = client.get(url).send().await.map_err(BotError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(BotError::from_http_status(status.as_u16(), ""));
        }

        let bytes = response.bytes().await.map_err(BotError::from)?;
        debug!(url = %url, size = bytes.len(), "Downloaded image");
        Ok(bytes.to_vec())
    }

    /// Download and prepare in one step
    pub async fn fetch_prepared(&self) -> BotResult<PreparedImage> {
        let bytes = self.fetch_random().await?;
        PreparedImage::prepare(&bytes)
    }
}
