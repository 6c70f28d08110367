//! Cross-module tests driven by the mock chain

mod submitter_tests;
mod upload_tests;

use crate::chain::ChainClient;
use crate::results::ResultSink;
use crate::structured_logging::{ExplorerLink, StructuredLogger};
use crate::test_utils::MockChain;
use alloy::primitives::Address;

/// Owned pieces a `TxSubmitter` borrows
pub(crate) struct Fixture {
    pub chain: MockChain,
    pub explorer: ExplorerLink,
    pub logger: StructuredLogger,
    pub sink: ResultSink,
}

impl Fixture {
    pub fn new() -> Self {
        let chain = MockChain::new(Address::repeat_byte(0x42));
        let logger = StructuredLogger::detached(chain.address());
        Self {
            chain,
            explorer: ExplorerLink::new("https://chainscan-galileo.0g.ai/tx/"),
            logger,
            sink: ResultSink::disabled(),
        }
    }

    pub fn submitter(&self) -> crate::submitter::TxSubmitter<'_, MockChain> {
        crate::submitter::TxSubmitter::new(&self.chain, &self.explorer, &self.logger, &self.sink)
    }
}
