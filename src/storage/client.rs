//! Storage indexer HTTP client.

use super::image::PreparedImage;
use crate::errors::{BotError, BotResult};
use crate::proxy::ProxyPool;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SegmentProof {
    pub siblings: Vec<String>,
    pub path: Vec<String>,
}

/// Body of `POST /file/segment`
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SegmentUpload<'a> {
    pub root: String,
    pub index: u64,
    pub data: &'a str,
    pub proof: SegmentProof,
}

impl<'a> SegmentUpload<'a> {
    /// Single-segment upload; the root is its own only sibling
    pub fn single(image: &'a PreparedImage) -> Self {
        let root = image.root_hex();
        Self {
            proof: SegmentProof {
                siblings: vec![root.clone()],
                path: Vec::new(),
            },
            root,
            index: 0,
            data: &image.data,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    indexer_url: String,
    proxies: Arc<ProxyPool>,
}

impl StorageClient {
    pub fn new(indexer_url: impl Into<String>, proxies: Arc<ProxyPool>) -> Self {
        Self {
            indexer_url: indexer_url.into().trim_end_matches('/').to_string(),
            proxies,
        }
    }

    pub fn indexer_url(&self) -> &str {
        &self.indexer_url
    }

    /// Post the image as segment 0. A 502 maps to a transient error.
    pub async fn upload_segment(&self, image: &PreparedImage) -> BotResult<()> {
        let url = format!("{}/file/segment", self.indexer_url);
        let client = self.proxies.http_client()?;

        let response = client
            .post(&url)
            .json(&SegmentUpload::single(image))
            .send()
            .await
            .map_err(BotError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::from_http_status(status.as_u16(), &body));
        }

        debug!(root = %image.root_hex(), "Segment accepted by indexer");
        Ok(())
    }
}
