use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, warn};

use super::{FetchError, Payload, StateDiffFetcher};

/// Fetcher serving preconfigured payloads and errors, recording every call it receives.
///
/// Each instance owns its own call counter and call history.
#[derive(Debug, Default)]
pub struct MockStateDiffFetcher {
    payloads: Option<HashMap<u64, Payload>>,
    errors: HashMap<u64, FetchError>,
    called_times: AtomicU64,
    called_at_heights: Mutex<Vec<Vec<u64>>>,
}

impl MockStateDiffFetcher {
    /// A fetcher with no payloads configured; every fetch fails with `FetchError::Unconfigured`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payloads(payloads: HashMap<u64, Payload>) -> Self {
        Self {
            payloads: Some(payloads),
            ..Self::default()
        }
    }

    pub fn set_payload(&mut self, height: u64, payload: Payload) {
        self.payloads
            .get_or_insert_with(HashMap::new)
            .insert(height, payload);
    }

    /// Make any batch containing `height` fail with `error`
    pub fn set_error(&mut self, height: u64, error: FetchError) {
        self.errors.insert(height, error);
    }

    pub fn called_times(&self) -> u64 {
        self.called_times.load(Ordering::SeqCst)
    }

    /// Height batches of every recorded call, in the order the calls were recorded
    pub fn called_at_heights(&self) -> Vec<Vec<u64>> {
        self.called_at_heights.lock().clone()
    }
}

#[async_trait]
impl StateDiffFetcher for MockStateDiffFetcher {
    async fn fetch_state_diffs_at(&self, heights: &[u64]) -> Result<Vec<Payload>, FetchError> {
        let Some(payloads) = self.payloads.as_ref() else {
            error!("State diff fetcher called before any payloads were configured");
            return Err(FetchError::Unconfigured);
        };

        self.called_times.fetch_add(1, Ordering::SeqCst);
        self.called_at_heights.lock().push(heights.to_vec());
        debug!("Fetching state diffs at {:?}", heights);

        let mut results = Vec::with_capacity(heights.len());
        for height in heights {
            if let Some(error) = self.errors.get(height) {
                warn!("State diff fetch failed at block {}: {}", height, error);
                return Err(error.clone());
            }
            results.push(payloads.get(height).cloned().unwrap_or_default());
        }

        Ok(results)
    }
}
