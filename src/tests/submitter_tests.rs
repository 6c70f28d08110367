use super::Fixture;
use crate::chain::TxRequest;
use crate::config::Config;
use crate::errors::BotError;
use crate::executors::submit_with_retry;
use crate::results::ResultSink;
use crate::submitter::{TxOutcome, TxSubmitter};
use crate::test_utils::{fast_config, gateway_error, WaitBehavior};
use alloy::primitives::{Address, Bytes};
use std::time::Duration;

fn request() -> TxRequest {
    TxRequest::new(Address::repeat_byte(1), Bytes::from_static(&[0x12, 0x49, 0xc5, 0x8b]))
}

#[tokio::test]
async fn test_plain_confirmation() {
    let fx = Fixture::new();
    fx.chain.push_wait(WaitBehavior::Confirm { block: 10 });

    let outcome = fx.submitter().submit("Mint", request(), None).await.unwrap();
    assert!(matches!(outcome, TxOutcome::Confirmed(ref r) if r.block_number == Some(10)));
    assert_eq!(fx.chain.receipt_lookups(), 0);
}

#[tokio::test]
async fn test_timeout_then_successful_receipt_is_late_confirmation() {
    let fx = Fixture::new();
    fx.chain
        .push_wait(WaitBehavior::Timeout)
        .push_receipt(Some((true, 4242)));

    let outcome = fx
        .submitter()
        .submit("Upload", request(), Some(Duration::from_secs(120)))
        .await
        .unwrap();

    match &outcome {
        TxOutcome::TimedOutButConfirmed(receipt) => {
            assert_eq!(receipt.block_number, Some(4242));
        }
        other => panic!("expected late confirmation, got {:?}", other),
    }
    assert!(outcome.is_confirmed());
    assert_eq!(fx.chain.receipt_lookups(), 1);

    let receipt = outcome.into_result(&fx.explorer).unwrap();
    assert_eq!(receipt.block_number, Some(4242));
}

#[tokio::test]
async fn test_timeout_without_receipt_is_unresolved() {
    let fx = Fixture::new();
    fx.chain.push_wait(WaitBehavior::Timeout).push_receipt(None);

    let outcome = fx
        .submitter()
        .submit("Upload", request(), Some(Duration::from_secs(120)))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        TxOutcome::TimedOutUnresolved { timeout_secs: 120, .. }
    ));

    let err = outcome.into_result(&fx.explorer).unwrap_err();
    match err {
        BotError::ConfirmationTimeout { link, .. } => {
            assert!(link.starts_with("https://chainscan-galileo.0g.ai/tx/0x"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_then_reverted_receipt_is_failure() {
    let fx = Fixture::new();
    fx.chain
        .push_wait(WaitBehavior::Timeout)
        .push_receipt(Some((false, 9)));

    let outcome = fx
        .submitter()
        .submit("Upload", request(), Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert!(matches!(outcome, TxOutcome::Failed { receipt: Some(_), .. }));
    assert!(!outcome.into_result(&fx.explorer).unwrap_err().is_transient());
}

#[tokio::test]
async fn test_rejection_before_broadcast_is_an_error() {
    let fx = Fixture::new();
    fx.chain.fail_sends_with_502(1);

    let err = fx.submitter().submit("Swap", request(), None).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_non_timeout_wait_error_is_returned() {
    let fx = Fixture::new();
    fx.chain.push_wait(WaitBehavior::Error(gateway_error()));

    let err = fx.submitter().submit("Swap", request(), None).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(fx.chain.receipt_lookups(), 0);
}

#[tokio::test]
async fn test_confirmed_receipt_is_saved() {
    let fx = Fixture::new();
    let dir = tempfile::tempdir().unwrap();
    let sink = ResultSink::new(dir.path());
    let submitter = TxSubmitter::new(&fx.chain, &fx.explorer, &fx.logger, &sink);

    submitter.submit("Mint", request(), None).await.unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_502_until_last_attempt_then_success() {
    let fx = Fixture::new();
    let profile = fast_config().retry.swap;
    let ceiling = profile.max_attempts as usize;
    fx.chain.fail_sends_with_502(ceiling - 1);

    let receipt = submit_with_retry(
        &fx.submitter(),
        "Swap",
        &profile,
        Address::repeat_byte(1),
        Bytes::new(),
    )
    .await
    .unwrap();

    assert!(receipt.success);
    assert_eq!(fx.chain.send_count(), ceiling);
}

#[tokio::test]
async fn test_502_for_whole_ceiling_is_exhausted() {
    let fx = Fixture::new();
    let profile = fast_config().retry.upload;
    let ceiling = profile.max_attempts as usize;
    fx.chain.fail_sends_with_502(ceiling + 3);

    let err = submit_with_retry(
        &fx.submitter(),
        "Upload",
        &profile,
        Address::repeat_byte(1),
        Bytes::new(),
    )
    .await
    .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(fx.chain.send_count(), ceiling);
}

#[tokio::test]
async fn test_non_transient_error_stops_without_flag() {
    let fx = Fixture::new();
    let profile = fast_config().retry.approve;
    assert!(!profile.retry_non_transient);
    fx.chain.push_wait(WaitBehavior::Revert { block: 5 });

    let result = submit_with_retry(
        &fx.submitter(),
        "Approve",
        &profile,
        Address::repeat_byte(1),
        Bytes::new(),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(fx.chain.send_count(), 1);
}

#[tokio::test]
async fn test_non_transient_error_retried_with_flag() {
    let fx = Fixture::new();
    let profile = fast_config().retry.upload;
    assert!(profile.retry_non_transient);
    fx.chain
        .push_wait(WaitBehavior::Revert { block: 5 })
        .push_wait(WaitBehavior::Timeout)
        .push_receipt(None);

    let receipt = submit_with_retry(
        &fx.submitter(),
        "Upload",
        &profile,
        Address::repeat_byte(1),
        Bytes::new(),
    )
    .await
    .unwrap();

    assert!(receipt.success);
    assert_eq!(fx.chain.send_count(), 3);
}

#[tokio::test]
async fn test_gas_limit_comes_from_profile() {
    let fx = Fixture::new();
    let profile = Config::default().retry.mint;

    submit_with_retry(&fx.submitter(), "Mint", &profile, Address::repeat_byte(1), Bytes::new())
        .await
        .unwrap();
    assert_eq!(fx.chain.sent()[0].gas_limit, Some(300_000));
}
