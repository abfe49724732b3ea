pub mod mock;

use alloy::primitives::{Bytes, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mock::MockStateDiffFetcher;

/// State difference data produced for one block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub block_rlp: Bytes,
    pub state_diff_rlp: Bytes,
    pub receipts_rlp: Bytes,
    pub total_difficulty: U256,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("state diff fetcher has no payloads configured")]
    Unconfigured,
    #[error("failed to fetch state diff at block {height}: {reason}")]
    Source { height: u64, reason: String },
}

/// Source of state diff payloads by block height
#[async_trait]
pub trait StateDiffFetcher: Send + Sync {
    /// Fetch one payload per height, in the order given.
    ///
    /// A failure at any height fails the whole batch.
    async fn fetch_state_diffs_at(&self, heights: &[u64]) -> Result<Vec<Payload>, FetchError>;
}
