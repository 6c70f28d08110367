//! Per-account executors for the three phases of a pass.
//!
//! Each executor owns the loop of its phase and absorbs ordinary failures:
//! a failed mint, swap or upload is logged and the phase moves on. Only
//! fatal errors (see [`BotError::is_fatal`]) escape, and they abort the
//! remaining phases of the current account.

pub mod mint;
pub mod swap;
pub mod upload;

pub use mint::{MintExecutor, MintSummary};
pub use swap::{SwapExecutor, SwapSummary, TokenPair};
pub use upload::{UploadExecutor, UploadSummary};

use crate::chain::{ChainClient, TxReceipt, TxRequest};
use crate::config::SubmissionProfile;
use crate::errors::{BotError, BotResult};
use crate::retry::retry_with_backoff;
use crate::submitter::TxSubmitter;
use alloy::primitives::{Address, Bytes};
use std::time::Duration;

/// Submit `to`/`input` under `profile`, retrying as the profile allows.
pub(crate) async fn submit_with_retry<C: ChainClient>(
    submitter: &TxSubmitter<'_, C>,
    operation: &str,
    profile: &SubmissionProfile,
    to: Address,
    input: Bytes,
) -> BotResult<TxReceipt> {
    let policy = profile.retry_policy();
    let timeout = profile.confirmation_timeout();

    retry_with_backoff(operation, &policy, |_attempt| {
        let request = TxRequest::new(to, input.clone()).with_gas_limit(profile.gas_limit);
        async move {
            submitter
                .submit(operation, request, timeout)
                .await?
                .into_result(submitter.explorer())
        }
    })
    .await
}

/// Fatal errors propagate; anything else has already been logged by the
/// caller and is swallowed.
pub(crate) fn escalate_fatal(err: BotError) -> BotResult<()> {
    if err.is_fatal() {
        Err(err)
    } else {
        Ok(())
    }
}

pub(crate) async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
