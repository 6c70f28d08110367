//! Random token swaps through the V3-style router.

use super::{escalate_fatal, pause, submit_with_retry};
use crate::chain::contracts::{
    allowance_calldata, approve_max_calldata, balance_of_calldata, decode_uint256, SwapParams,
};
use crate::chain::ChainClient;
use crate::config::{Config, SwapConfig, TokenConfig};
use crate::errors::BotResult;
use crate::metrics::metrics;
use crate::submitter::TxSubmitter;
use alloy::primitives::{Address, U256};
use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};

/// Ordered (from, to) pair, never the same token twice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair<'a> {
    pub from: &'a TokenConfig,
    pub to: &'a TokenConfig,
}

impl<'a> TokenPair<'a> {
    /// Uniform draw with from != to. `None` with fewer than two tokens.
    pub fn pick<R: Rng + ?Sized>(tokens: &'a [TokenConfig], rng: &mut R) -> Option<Self> {
        if tokens.len() < 2 {
            return None;
        }
        let from = rng.gen_range(0..tokens.len());
        // Draw from the remaining n-1 slots and shift past `from`
        let mut to = rng.gen_range(0..tokens.len() - 1);
        if to >= from {
            to += 1;
        }
        Some(Self {
            from: &tokens[from],
            to: &tokens[to],
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SwapSummary {
    pub swapped: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Iteration {
    Swapped,
    Skipped,
    Failed,
}

pub struct SwapExecutor<'a, C: ChainClient> {
    submitter: &'a TxSubmitter<'a, C>,
    config: &'a Config,
}

impl<'a, C: ChainClient> SwapExecutor<'a, C> {
    pub fn new(submitter: &'a TxSubmitter<'a, C>, config: &'a Config) -> Self {
        Self { submitter, config }
    }

    fn swap_config(&self) -> &'a SwapConfig {
        &self.config.swap
    }

    pub async fn run(&self) -> BotResult<SwapSummary> {
        let count = rand::thread_rng().gen_range(self.swap_config().swaps_range());
        info!("🔄 Performing {} random swaps", count);
        self.run_iterations(count).await
    }

    pub async fn run_iterations(&self, count: u32) -> BotResult<SwapSummary> {
        let mut summary = SwapSummary::default();

        for i in 1..=count {
            let pair = TokenPair::pick(&self.config.tokens, &mut rand::thread_rng());
            let Some(pair) = pair else {
                self.submitter
                    .logger()
                    .log_skip("swap", "fewer than two tokens configured");
                break;
            };

            debug!(iteration = i, from = %pair.from.symbol, to = %pair.to.symbol, "Swap iteration");
            match self.swap_once(&pair).await? {
                Iteration::Swapped => summary.swapped += 1,
                Iteration::Skipped => summary.skipped += 1,
                Iteration::Failed => summary.failed += 1,
            }

            pause(self.swap_config().delay_ms).await;
        }

        Ok(summary)
    }

    async fn swap_once(&self, pair: &TokenPair<'_>) -> BotResult<Iteration> {
        let chain = self.submitter.chain();
        let logger = self.submitter.logger();
        let account = chain.address();
        let router = self.swap_config().router;

        let balance = match self.read_uint(pair.from.address, balance_of_calldata(account)).await {
            Ok(balance) => balance,
            Err(e) => {
                logger.warn(&format!("Failed to read {} balance: {}", pair.from.symbol, e));
                escalate_fatal(e)?;
                return Ok(Iteration::Skipped);
            }
        };

        let amount_in = balance / U256::from(self.swap_config().amount_divisor);
        if amount_in.is_zero() {
            metrics().swaps_skipped.inc();
            logger.log_skip("swap", &format!("{} balance too low", pair.from.symbol));
            return Ok(Iteration::Skipped);
        }

        let allowance = match self
            .read_uint(pair.from.address, allowance_calldata(account, router))
            .await
        {
            Ok(allowance) => allowance,
            Err(e) => {
                logger.warn(&format!("Failed to read {} allowance: {}", pair.from.symbol, e));
                escalate_fatal(e)?;
                return Ok(Iteration::Skipped);
            }
        };

        if allowance < amount_in {
            info!("🔓 Approving {}...", pair.from.symbol);
            let operation = format!("Approve {}", pair.from.symbol);
            if let Err(e) = submit_with_retry(
                self.submitter,
                &operation,
                &self.config.retry.approve,
                pair.from.address,
                approve_max_calldata(router),
            )
            .await
            {
                logger.error(&format!("Approval of {} failed: {}", pair.from.symbol, e));
                escalate_fatal(e)?;
                return Ok(Iteration::Failed);
            }
        }

        let params = SwapParams {
            token_in: pair.from.address,
            token_out: pair.to.address,
            fee: self.swap_config().fee,
            recipient: account,
            deadline: Utc::now().timestamp().max(0) as u64 + self.swap_config().deadline_secs,
            amount_in,
            amount_out_minimum: U256::from(self.swap_config().amount_out_minimum),
        };

        info!("🔄 Swapping {} → {}", pair.from.symbol, pair.to.symbol);
        let operation = format!("Swap {} → {}", pair.from.symbol, pair.to.symbol);
        match submit_with_retry(
            self.submitter,
            &operation,
            &self.config.retry.swap,
            router,
            params.calldata(),
        )
        .await
        {
            Ok(_) => Ok(Iteration::Swapped),
            Err(e) => {
                logger.error(&format!("{} failed: {}", operation, e));
                escalate_fatal(e)?;
                Ok(Iteration::Failed)
            }
        }
    }

    async fn read_uint(&self, to: Address, input: alloy::primitives::Bytes) -> BotResult<U256> {
        let output = self.submitter.chain().call(to, input).await?;
        decode_uint256(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tokens() -> Vec<TokenConfig> {
        Config::default().tokens
    }

    #[test]
    fn test_pair_never_repeats_token() {
        let tokens = tokens();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let pair = TokenPair::pick(&tokens, &mut rng).unwrap();
            assert_ne!(pair.from.address, pair.to.address);
        }
    }

    #[test]
    fn test_pair_covers_every_ordering() {
        let tokens = tokens();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1_000 {
            let pair = TokenPair::pick(&tokens, &mut rng).unwrap();
            seen.insert((pair.from.symbol.clone(), pair.to.symbol.clone()));
        }
        assert_eq!(seen.len(), tokens.len() * (tokens.len() - 1));
    }

    #[test]
    fn test_pair_needs_two_tokens() {
        let tokens = tokens();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(TokenPair::pick(&tokens[..1], &mut rng).is_none());
    }
}
