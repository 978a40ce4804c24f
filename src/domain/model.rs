use serde::{Deserialize, Serialize};

/// Tab id the browser reports for requests that belong to no tab.
pub const NO_TAB: i64 = -1;

/// An HTTP header as the browser reports it. Headers that are not valid
/// UTF-8 arrive with only `binaryValue`; they keep their name and get an
/// empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[cfg(test)]
impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Request-phase metadata held between `RequestStarted` and the response
/// or terminal event for the same request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRequest {
    pub request_id: String,
    pub tab_id: i64,
    pub request_headers: Vec<Header>,
    pub created_at_ms: u64,
}

/// A tracked request paired with the response headers that completed it.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: TrackedRequest,
    pub response_headers: Vec<Header>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Up,
    Down,
}

/// Last known policy of the external service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub status: ServiceStatus,
    pub monitoring: bool,
    pub blocked_hosts: Vec<String>,
    pub video_urls: Vec<String>,
    pub file_exts: Vec<String>,
    pub vid_exts: Vec<String>,
    pub video_list: Vec<serde_json::Value>,
    pub mime_list: Vec<String>,
}

impl SyncState {
    pub fn reachable(&self) -> bool {
        self.status == ServiceStatus::Up
    }
}

/// What the toolbar button should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolbarState {
    /// External service is not reachable.
    Blocked,
    /// Service is up but does not want anything relayed.
    MonitoringOff,
    /// User paused relaying.
    Paused,
    Active,
}

impl ToolbarState {
    pub fn derive(state: &SyncState, disabled: bool) -> Self {
        if !state.reachable() {
            ToolbarState::Blocked
        } else if !state.monitoring {
            ToolbarState::MonitoringOff
        } else if disabled {
            ToolbarState::Paused
        } else {
            ToolbarState::Active
        }
    }
}

/// Outcome of a best-effort call to the external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { status: u16 },
    Failed { reason: String },
}

#[cfg(test)]
impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}
