//! Pairs request-phase metadata with the response that completes it.

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::{Header, TrackedRequest};

/// In-flight requests keyed by the browser's request id.
///
/// All operations are synchronous so a lookup and its removal can never be
/// split by an await point.
#[derive(Debug, Default)]
pub struct RequestCorrelator {
    requests: HashMap<String, TrackedRequest>,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request, replacing any stale entry with the same id.
    pub fn on_request_start(
        &mut self,
        request_id: &str,
        tab_id: i64,
        request_headers: Vec<Header>,
        now_ms: u64,
    ) {
        self.requests.insert(
            request_id.to_string(),
            TrackedRequest {
                request_id: request_id.to_string(),
                tab_id,
                request_headers,
                created_at_ms: now_ms,
            },
        );
    }

    /// Take the entry for `request_id`. `None` for requests that started
    /// before tracking began or were already claimed.
    pub fn on_response_headers(&mut self, request_id: &str) -> Option<TrackedRequest> {
        self.requests.remove(request_id)
    }

    /// Forget `request_id` after completion or error.
    pub fn on_request_terminal(&mut self, request_id: &str) {
        self.requests.remove(request_id);
    }

    /// Drop entries created more than `ttl` before `now_ms`. Returns how many
    /// were removed.
    pub fn purge_stale(&mut self, now_ms: u64, ttl: Duration) -> usize {
        let ttl_ms = ttl.as_millis() as u64;
        let before = self.requests.len();
        self.requests
            .retain(|_, r| now_ms.saturating_sub(r.created_at_ms) <= ttl_ms);
        before - self.requests.len()
    }
}

#[cfg(test)]
impl RequestCorrelator {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
