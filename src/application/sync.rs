use tracing::{debug, info};

use crate::api::XdmClient;
use crate::domain::{ServiceStatus, SyncState};

/// Polls the external service for its policy and keeps the last result.
///
/// `sync` takes `&mut self`, so two polls can never overlap.
pub struct SyncController {
    client: XdmClient,
    state: SyncState,
}

impl SyncController {
    pub fn new(client: XdmClient) -> Self {
        Self {
            client,
            state: SyncState::default(),
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Refresh the state from `/sync`. Any failure leaves the service marked
    /// down with monitoring off; nothing is raised.
    pub async fn sync(&mut self) -> SyncState {
        let previous = self.state.status;
        match self.client.sync().await {
            Ok(policy) => {
                self.state = SyncState {
                    status: ServiceStatus::Up,
                    monitoring: policy.enabled,
                    blocked_hosts: policy.blocked_hosts,
                    video_urls: policy.video_urls,
                    file_exts: policy.file_exts,
                    vid_exts: policy.vid_exts,
                    video_list: policy.vid_list,
                    mime_list: policy.mime_list,
                };
            }
            Err(e) => {
                debug!("xdm sync failed: {}", e);
                self.state.status = ServiceStatus::Down;
                self.state.monitoring = false;
                self.state.video_list.clear();
            }
        }

        if previous != self.state.status {
            info!(
                "xdm service {:?} -> {:?} (monitoring: {})",
                previous, self.state.status, self.state.monitoring
            );
        }

        self.state.clone()
    }
}
