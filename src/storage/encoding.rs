//! Calldata for the storage flow contract's `submit` entry point.
//!
//! The contract takes a single dynamic `Submission` struct. This bot always
//! sends the same shape: a fixed declared length, no tags, and three nodes
//! `(root, height)`. Two of the node roots are random filler, the last one is
//! the content root of the uploaded segment.

use crate::errors::{BotError, BotResult};
use alloy::primitives::{Bytes, B256, U256};
use rand::Rng;

/// `submit((uint256,bytes,(bytes32,uint256)[]))`
pub const SUBMIT_SELECTOR: [u8; 4] = [0xef, 0x3e, 0x12, 0xdc];

/// Declared data length sent with every submission
pub const SUBMISSION_LENGTH: u64 = 0x18190;

const WORDS: usize = 12;
const SUBMISSION_OFFSET: u64 = 0x20;
const TAGS_OFFSET: u64 = 0x60;
const NODES_OFFSET: u64 = 0x80;
const NODE_COUNT: u64 = 3;

/// Encoded size: selector plus twelve words
pub const CALLDATA_LEN: usize = 4 + WORDS * 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionNode {
    pub root: B256,
    pub height: u64,
}

/// Structured view of the submission template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSubmission {
    pub length: u64,
    pub nodes: [SubmissionNode; 3],
}

impl StorageSubmission {
    /// Template with fresh random filler nodes around `content_root`
    pub fn new(content_root: B256) -> Self {
        let mut rng = rand::thread_rng();
        Self::with_filler(content_root, random_word(&mut rng), random_word(&mut rng))
    }

    pub fn with_filler(content_root: B256, filler_1: B256, filler_2: B256) -> Self {
        Self {
            length: SUBMISSION_LENGTH,
            nodes: [
                SubmissionNode {
                    root: filler_1,
                    height: 8,
                },
                SubmissionNode {
                    root: filler_2,
                    height: 7,
                },
                SubmissionNode {
                    root: content_root,
                    height: 5,
                },
            ],
        }
    }

    pub fn content_root(&self) -> B256 {
        self.nodes[2].root
    }

    pub fn encode(&self) -> Bytes {
        let mut out = Vec::with_capacity(CALLDATA_LEN);
        out.extend_from_slice(&SUBMIT_SELECTOR);

        let mut push = |word: B256| out.extend_from_slice(word.as_slice());
        push(uint_word(SUBMISSION_OFFSET));
        push(uint_word(self.length));
        push(uint_word(TAGS_OFFSET));
        push(uint_word(NODES_OFFSET));
        push(uint_word(0));
        push(uint_word(NODE_COUNT));
        for node in &self.nodes {
            push(node.root);
            push(uint_word(node.height));
        }

        out.into()
    }

    /// Parse calldata produced by [`encode`](Self::encode). Anything that
    /// deviates from the fixed template is rejected.
    pub fn decode(data: &[u8]) -> BotResult<Self> {
        if data.len() != CALLDATA_LEN {
            return Err(BotError::Encoding(format!(
                "expected {} bytes of submit calldata, got {}",
                CALLDATA_LEN,
                data.len()
            )));
        }
        if data[..4] != SUBMIT_SELECTOR {
            return Err(BotError::Encoding(format!(
                "unexpected selector 0x{}",
                hex::encode(&data[..4])
            )));
        }

        let words: Vec<B256> = data[4..].chunks_exact(32).map(B256::from_slice).collect();
        let check = |idx: usize, value: u64, what: &str| -> BotResult<()> {
            if words[idx] == uint_word(value) {
                Ok(())
            } else {
                Err(BotError::Encoding(format!("bad {} in word {}", what, idx)))
            }
        };
        check(0, SUBMISSION_OFFSET, "submission offset")?;
        check(2, TAGS_OFFSET, "tags offset")?;
        check(3, NODES_OFFSET, "nodes offset")?;
        check(4, 0, "tags length")?;
        check(5, NODE_COUNT, "node count")?;

        let length = word_to_u64(&words[1])?;
        let node = |idx: usize| -> BotResult<SubmissionNode> {
            Ok(SubmissionNode {
                root: words[idx],
                height: word_to_u64(&words[idx + 1])?,
            })
        };

        Ok(Self {
            length,
            nodes: [node(6)?, node(8)?, node(10)?],
        })
    }
}

fn uint_word(value: u64) -> B256 {
    B256::from(U256::from(value).to_be_bytes::<32>())
}

fn word_to_u64(word: &B256) -> BotResult<u64> {
    u64::try_from(U256::from_be_bytes(word.0))
        .map_err(|_| BotError::Encoding(format!("word {} does not fit u64", word)))
}

fn random_word<R: Rng>(rng: &mut R) -> B256 {
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    B256::from(bytes)
}
