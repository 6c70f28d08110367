//! Storage submission calldata

use alloy::primitives::B256;
use zero_bot::storage::encoding::{CALLDATA_LEN, SUBMIT_SELECTOR};
use zero_bot::storage::{PreparedImage, StorageSubmission};

#[test]
fn test_template_round_trip_recovers_words() {
    let image = PreparedImage::prepare(b"segment payload").unwrap();
    let submission = StorageSubmission::new(image.root);
    let calldata = submission.encode();

    assert_eq!(calldata.len(), CALLDATA_LEN);
    assert_eq!(calldata[..4], SUBMIT_SELECTOR);

    let decoded = StorageSubmission::decode(&calldata).unwrap();
    assert_eq!(decoded, submission);
    assert_eq!(decoded.content_root(), image.root);
    assert_eq!(decoded.length, 0x18190);
    let heights: Vec<u64> = decoded.nodes.iter().map(|n| n.height).collect();
    assert_eq!(heights, vec![8, 7, 5]);
}

#[test]
fn test_decode_rejects_foreign_calldata() {
    let mut calldata = StorageSubmission::new(B256::ZERO).encode().to_vec();
    // tags length must stay zero
    calldata[4 + 4 * 32 + 31] = 1;
    assert!(StorageSubmission::decode(&calldata).is_err());
}
