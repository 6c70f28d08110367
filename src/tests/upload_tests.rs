use super::Fixture;
use crate::config::Config;
use crate::executors::UploadExecutor;
use crate::proxy::ProxyPool;
use crate::storage::{ImageSource, PreparedImage, StorageClient, StorageSubmission};
use crate::test_utils::{fast_config, WaitBehavior};
use mockito::{Matcher, Server};
use std::sync::Arc;

const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nnot really an image";

fn wire(config: &mut Config, server: &Server) -> (StorageClient, ImageSource) {
    config.storage.indexer_url = server.url();
    config.storage.image_sources = vec![format!("{}/800/600", server.url())];

    let proxies = Arc::new(ProxyPool::direct());
    (
        StorageClient::new(config.storage.indexer_url.clone(), proxies.clone()),
        ImageSource::new(config.storage.image_sources.clone(), proxies),
    )
}

#[tokio::test]
async fn test_upload_posts_segment_and_submits_template() {
    let mut server = Server::new_async().await;
    let prepared = PreparedImage::prepare(IMAGE).unwrap();

    let image = server
        .mock("GET", "/800/600")
        .with_status(200)
        .with_body(IMAGE)
        .create_async()
        .await;
    let segment = server
        .mock("POST", "/file/segment")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "root": prepared.root_hex(),
            "index": 0,
            "data": prepared.data,
            "proof": { "siblings": [prepared.root_hex()], "path": [] }
        })))
        .with_status(200)
        .with_body(r#"{"code":0}"#)
        .create_async()
        .await;

    let mut config = fast_config();
    let (storage, images) = wire(&mut config, &server);
    let fx = Fixture::new();
    let submitter = fx.submitter();

    let receipt = UploadExecutor::new(&submitter, &config, &storage, &images)
        .upload_file(1)
        .await
        .unwrap();
    assert!(receipt.is_some());

    image.assert_async().await;
    segment.assert_async().await;

    let sent = fx.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, config.storage.contract_address());
    assert_eq!(sent[0].gas_limit, Some(500_000));

    let submission = StorageSubmission::decode(&sent[0].input).unwrap();
    assert_eq!(submission.content_root(), prepared.root);
}

#[tokio::test]
async fn test_segment_502_exhausts_upload_ceiling() {
    let mut server = Server::new_async().await;
    let mut config = fast_config();
    let ceiling = config.retry.upload.max_attempts as usize;

    server
        .mock("GET", "/800/600")
        .with_status(200)
        .with_body(IMAGE)
        .create_async()
        .await;
    let segment = server
        .mock("POST", "/file/segment")
        .with_status(502)
        .with_body("Bad Gateway")
        .expect(ceiling)
        .create_async()
        .await;

    let (storage, images) = wire(&mut config, &server);
    let fx = Fixture::new();
    let submitter = fx.submitter();

    let receipt = UploadExecutor::new(&submitter, &config, &storage, &images)
        .upload_file(1)
        .await
        .unwrap();

    assert!(receipt.is_none());
    segment.assert_async().await;
    assert_eq!(fx.chain.send_count(), 0);
}

#[tokio::test]
async fn test_upload_late_confirmation_counts_as_success() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/800/600")
        .with_status(200)
        .with_body(IMAGE)
        .create_async()
        .await;
    server
        .mock("POST", "/file/segment")
        .with_status(200)
        .create_async()
        .await;

    let mut config = fast_config();
    let (storage, images) = wire(&mut config, &server);
    let fx = Fixture::new();
    fx.chain
        .push_wait(WaitBehavior::Timeout)
        .push_receipt(Some((true, 777)));
    let submitter = fx.submitter();

    let receipt = UploadExecutor::new(&submitter, &config, &storage, &images)
        .upload_file(1)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(receipt.block_number, Some(777));
    assert_eq!(fx.chain.send_count(), 1);
}

#[tokio::test]
async fn test_retry_reposts_segment_with_fresh_template() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/800/600")
        .with_status(200)
        .with_body(IMAGE)
        .create_async()
        .await;
    let segment = server
        .mock("POST", "/file/segment")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;

    let mut config = fast_config();
    let (storage, images) = wire(&mut config, &server);
    let fx = Fixture::new();
    fx.chain.push_wait(WaitBehavior::Revert { block: 3 });
    let submitter = fx.submitter();

    let summary = UploadExecutor::new(&submitter, &config, &storage, &images)
        .run_files(1)
        .await
        .unwrap();
    assert_eq!(summary.receipts.len(), 1);
    segment.assert_async().await;

    let sent = fx.chain.sent();
    assert_eq!(sent.len(), 2);
    let first = StorageSubmission::decode(&sent[0].input).unwrap();
    let second = StorageSubmission::decode(&sent[1].input).unwrap();
    assert_eq!(first.content_root(), second.content_root());
    assert_ne!(first.nodes[0].root, second.nodes[0].root);
}

#[tokio::test]
async fn test_image_failure_gives_up_file_without_transaction() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/800/600")
        .with_status(404)
        .create_async()
        .await;

    let mut config = fast_config();
    let (storage, images) = wire(&mut config, &server);
    let fx = Fixture::new();
    let submitter = fx.submitter();

    let summary = UploadExecutor::new(&submitter, &config, &storage, &images)
        .run_files(2)
        .await
        .unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(fx.chain.send_count(), 0);
}
