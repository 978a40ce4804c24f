use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::classifier::is_media;
use super::collaborators::{CookieStore, PreferenceStore, TabLookup};
use super::correlator::RequestCorrelator;
use super::events::{BrowserEvent, MenuItem, Reply, Selection, UiMessage, TOGGLE_MONITORING};
use super::relay::OutboundRelay;
use super::sync::SyncController;
use crate::api::{ApiConfig, XdmClient};
use crate::config::Preferences;
use crate::domain::{Exchange, Header, ToolbarState, NO_TAB};
use crate::utils::{get_timestamp_ms, targets_host};

/// Owns every piece of mutable relay state and turns browser events into
/// relays.
///
/// `dispatch` never waits on a relay: relays are spawned onto an internal
/// task set. `settle` drains it and `shutdown` drains it with a deadline.
pub struct Controller {
    relay: OutboundRelay,
    sync: SyncController,
    correlator: RequestCorrelator,
    tabs: Arc<dyn TabLookup>,
    prefs: Arc<dyn PreferenceStore>,
    disabled: bool,
    request_ttl: Duration,
    toolbar: Option<ToolbarState>,
    clock: fn() -> u64,
    pending: JoinSet<()>,
}

impl Controller {
    pub fn new(
        prefs: &Preferences,
        cookies: Arc<dyn CookieStore>,
        tabs: Arc<dyn TabLookup>,
        store: Arc<dyn PreferenceStore>,
    ) -> Self {
        let client = XdmClient::new(ApiConfig {
            xdm_host: prefs.xdm_host.clone(),
        });
        Self {
            relay: OutboundRelay::new(client.clone(), cookies, prefs.user_agent.clone()),
            sync: SyncController::new(client),
            correlator: RequestCorrelator::new(),
            tabs,
            prefs: store,
            disabled: prefs.disabled,
            request_ttl: Duration::from_secs(prefs.request_ttl_secs),
            toolbar: None,
            clock: get_timestamp_ms,
            pending: JoinSet::new(),
        }
    }

    /// Relaying is allowed only while the service is up, wants traffic and
    /// the user has not paused it.
    pub fn is_active(&self) -> bool {
        let state = self.sync.state();
        state.reachable() && state.monitoring && !self.disabled
    }

    pub async fn dispatch(&mut self, event: BrowserEvent) -> Vec<Reply> {
        self.reap_finished();

        let mut replies = Vec::new();
        match event {
            BrowserEvent::RequestStarted {
                request_id,
                tab_id,
                request_headers,
            } => {
                if self.is_active() {
                    let now = (self.clock)();
                    self.correlator
                        .on_request_start(&request_id, tab_id, request_headers, now);
                }
            }
            BrowserEvent::ResponseReceived {
                request_id,
                url,
                status_code,
                response_headers,
            } => self.on_response(&request_id, url, status_code, response_headers),
            BrowserEvent::RequestTerminal { request_id } => {
                self.correlator.on_request_terminal(&request_id);
            }
            BrowserEvent::DownloadCreated { url } => {
                if self.is_active() && !url.is_empty() {
                    self.spawn_download(url);
                }
            }
            BrowserEvent::ContextMenu { item, info, tab_id } => {
                if let Some(reply) = self.on_context_menu(item, &info, tab_id) {
                    replies.push(reply);
                }
            }
            BrowserEvent::Command { name } => self.on_command(&name),
            BrowserEvent::Message { message } => {
                if let Some(reply) = self.on_message(message).await {
                    replies.push(reply);
                }
            }
            BrowserEvent::TimerTick => {
                self.sync.sync().await;
                let purged = self
                    .correlator
                    .purge_stale((self.clock)(), self.request_ttl);
                if purged > 0 {
                    debug!("purged {} stale tracked requests", purged);
                }
            }
        }

        if let Some(reply) = self.toolbar_change() {
            replies.push(reply);
        }
        replies
    }

    /// Wait for every spawned relay to finish.
    pub async fn settle(&mut self) {
        while let Some(result) = self.pending.join_next().await {
            if let Err(e) = result {
                warn!("relay task failed: {}", e);
            }
        }
    }

    /// Give pending relays up to `grace` to finish, then abort the rest.
    /// Returns how many relays were aborted.
    pub async fn shutdown(&mut self, grace: Duration) -> usize {
        if tokio::time::timeout(grace, self.settle()).await.is_ok() {
            return 0;
        }
        let stuck = self.pending.len();
        warn!("abandoning {} relays still pending after {:?}", stuck, grace);
        self.pending.abort_all();
        while self.pending.join_next().await.is_some() {}
        stuck
    }

    fn on_response(
        &mut self,
        request_id: &str,
        url: String,
        status_code: u16,
        response_headers: Vec<Header>,
    ) {
        // Claim the entry before anything else so it is purged whatever
        // the outcome.
        let tracked = self.correlator.on_response_headers(request_id);

        if !self.is_active() || !(status_code == 200 || status_code == 206) {
            return;
        }
        let Some(request) = tracked else {
            return;
        };
        if targets_host(&url, self.relay.host()) || !is_media(&response_headers) {
            return;
        }

        debug!(request_id = %request_id, url = %url, "media response detected");
        let exchange = Exchange {
            request,
            response_headers,
        };
        let relay = self.relay.clone();
        let tabs = Arc::clone(&self.tabs);
        self.pending.spawn(async move {
            let tab_id = exchange.request.tab_id;
            let title = if tab_id == NO_TAB {
                None
            } else {
                match tabs.title(tab_id).await {
                    Ok(title) => title,
                    Err(e) => {
                        debug!("tab lookup failed: {}", e);
                        None
                    }
                }
            };
            relay.relay_media(&exchange, &url, title.as_deref()).await;
        });
    }

    fn on_context_menu(
        &mut self,
        item: MenuItem,
        info: &Selection,
        tab_id: i64,
    ) -> Option<Reply> {
        if !self.is_active() {
            return None;
        }
        let target = match item {
            MenuItem::DownloadLink => info.link_target(),
            MenuItem::DownloadImage => info.image_target(),
            MenuItem::DownloadAll => {
                debug!(tab_id, "requesting link scrape");
                return Some(Reply::ScrapeLinks { tab_id });
            }
        };
        if let Some(url) = target {
            self.spawn_download(url.to_string());
        }
        None
    }

    fn on_command(&mut self, name: &str) {
        if name != TOGGLE_MONITORING {
            debug!("ignoring command {}", name);
            return;
        }
        let state = self.sync.state();
        if !state.reachable() || !state.monitoring {
            return;
        }
        self.set_disabled(!self.disabled);
    }

    async fn on_message(&mut self, message: UiMessage) -> Option<Reply> {
        match message {
            UiMessage::Stat => {
                let state = self.sync.sync().await;
                return Some(Reply::Stat {
                    is_disabled: self.disabled,
                    list: state.video_list,
                });
            }
            UiMessage::Cmd { disable } => self.set_disabled(disable),
            UiMessage::Links { links } => {
                if self.is_active() {
                    let relay = self.relay.clone();
                    self.pending.spawn(async move {
                        let sent = relay.relay_urls(&links).await;
                        debug!("relayed {} scraped links", sent);
                    });
                }
            }
            UiMessage::Vid { item_id } => {
                let relay = self.relay.clone();
                self.pending.spawn(async move {
                    relay.notify_item_selected(&item_id).await;
                });
            }
            UiMessage::Clear => {
                let relay = self.relay.clone();
                self.pending.spawn(async move {
                    relay.notify_clear_all().await;
                });
            }
        }
        None
    }

    fn spawn_download(&mut self, url: String) {
        let relay = self.relay.clone();
        self.pending.spawn(async move {
            relay.relay_download(&url, None).await;
        });
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        info!("relaying {}", if disabled { "paused" } else { "resumed" });
        if let Err(e) = self.prefs.set_disabled(disabled) {
            warn!("failed to persist preference: {}", e);
        }
    }

    fn toolbar_change(&mut self) -> Option<Reply> {
        let state = ToolbarState::derive(self.sync.state(), self.disabled);
        if self.toolbar == Some(state) {
            return None;
        }
        self.toolbar = Some(state);
        Some(Reply::Toolbar { state })
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.pending.try_join_next() {
            if let Err(e) = result {
                warn!("relay task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
impl Controller {
    /// Replace the millisecond clock used to stamp tracked requests.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn sync_state(&self) -> &crate::domain::SyncState {
        self.sync.state()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn tracked_requests(&self) -> usize {
        self.correlator.len()
    }
}
