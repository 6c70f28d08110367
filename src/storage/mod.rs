//! Off-chain half of an upload: image download, indexer segment post and
//! the contract submission template.

pub mod client;
pub mod encoding;
pub mod image;

pub use client::StorageClient;
pub use encoding::StorageSubmission;
pub use image::{ImageSource, PreparedImage};
