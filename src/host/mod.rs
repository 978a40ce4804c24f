//! Host runtime: reads browser events as JSON lines on stdin and writes
//! replies as JSON lines on stdout.

mod cookies;
mod tabs;

pub use cookies::CookieJar;
pub use tabs::TabRegistry;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::{BrowserEvent, Controller, Reply};

/// How long pending relays may run once input has closed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Browser state the host mirrors for the cookie and tab collaborators.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedEvent {
    CookieSet {
        domain: String,
        name: String,
        value: String,
    },
    CookieRemoved {
        domain: String,
        name: String,
    },
    TabUpdated {
        tab_id: i64,
        #[serde(default)]
        title: String,
    },
    TabRemoved {
        tab_id: i64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    Feed(FeedEvent),
    Browser(BrowserEvent),
}

pub fn parse_line(line: &str) -> Result<HostInput, serde_json::Error> {
    serde_json::from_str::<FeedEvent>(line)
        .map(HostInput::Feed)
        .or_else(|_| serde_json::from_str::<BrowserEvent>(line).map(HostInput::Browser))
}

pub struct Host {
    controller: Controller,
    cookies: Arc<CookieJar>,
    tabs: Arc<TabRegistry>,
    sync_period: Duration,
}

impl Host {
    pub fn new(
        controller: Controller,
        cookies: Arc<CookieJar>,
        tabs: Arc<TabRegistry>,
        sync_period: Duration,
    ) -> Self {
        Self {
            controller,
            cookies,
            tabs,
            sync_period,
        }
    }

    /// Run until stdin closes.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        // The first tick fires immediately and doubles as the startup sync.
        let mut timer = tokio::time::interval(self.sync_period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let replies = self.controller.dispatch(BrowserEvent::TimerTick).await;
                    write_replies(&mut stdout, &replies).await?;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    let replies = self.handle_line(&line).await;
                    write_replies(&mut stdout, &replies).await?;
                }
            }
        }

        info!("input closed, waiting for pending relays");
        self.controller.shutdown(SHUTDOWN_GRACE).await;
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Vec<Reply> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match parse_line(line) {
            Ok(HostInput::Feed(feed)) => {
                self.apply_feed(feed);
                Vec::new()
            }
            Ok(HostInput::Browser(event)) => self.controller.dispatch(event).await,
            Err(e) => {
                warn!("skipping malformed event: {}", e);
                Vec::new()
            }
        }
    }

    fn apply_feed(&self, feed: FeedEvent) {
        let result = match feed {
            FeedEvent::CookieSet {
                domain,
                name,
                value,
            } => self.cookies.set(&domain, &name, &value),
            FeedEvent::CookieRemoved { domain, name } => self.cookies.remove(&domain, &name),
            FeedEvent::TabUpdated { tab_id, title } => {
                self.tabs.update(tab_id, title);
                Ok(())
            }
            FeedEvent::TabRemoved { tab_id } => {
                self.tabs.remove(tab_id);
                Ok(())
            }
        };
        if let Err(e) = result {
            debug!("feed update failed: {}", e);
        }
    }
}

async fn write_replies<W>(out: &mut W, replies: &[Reply]) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for reply in replies {
        let mut line = serde_json::to_vec(reply)?;
        line.push(b'\n');
        out.write_all(&line).await?;
    }
    if !replies.is_empty() {
        out.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::UiMessage;
    use crate::domain::{Header, ToolbarState};

    #[test]
    fn test_feed_lines_parse_as_feed() {
        let input = parse_line(r#"{"event":"cookie_set","domain":"a.com","name":"k","value":"v"}"#)
            .unwrap();
        assert_eq!(
            input,
            HostInput::Feed(FeedEvent::CookieSet {
                domain: "a.com".into(),
                name: "k".into(),
                value: "v".into(),
            })
        );
    }

    #[test]
    fn test_browser_lines_parse_as_browser() {
        let input =
            parse_line(r#"{"event":"message","message":{"type":"cmd","disable":true}}"#).unwrap();
        assert_eq!(
            input,
            HostInput::Browser(BrowserEvent::Message {
                message: UiMessage::Cmd { disable: true }
            })
        );
        assert_eq!(
            parse_line(r#"{"event":"timer_tick"}"#).unwrap(),
            HostInput::Browser(BrowserEvent::TimerTick)
        );
    }

    #[test]
    fn test_headers_without_text_value_keep_the_event() {
        let input = parse_line(
            r#"{"event":"request_started","request_id":"7","tab_id":3,"request_headers":[{"name":"X-Test","value":"1"},{"name":"X-Bin","binaryValue":[1,2]}]}"#,
        )
        .unwrap();
        assert_eq!(
            input,
            HostInput::Browser(BrowserEvent::RequestStarted {
                request_id: "7".into(),
                tab_id: 3,
                request_headers: vec![Header::new("X-Test", "1"), Header::new("X-Bin", "")],
            })
        );

        let input = parse_line(
            r#"{"event":"response_received","request_id":"7","url":"https://a/v.mp4","status_code":200,"response_headers":[{"name":"Content-Type","value":"video/mp4"},{"name":"X-Bin","binaryValue":[255]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            input,
            HostInput::Browser(BrowserEvent::ResponseReceived { ref response_headers, .. })
                if response_headers.len() == 2
        ));
    }

    #[test]
    fn test_unknown_event_is_an_error() {
        assert!(parse_line(r#"{"event":"bogus"}"#).is_err());
        assert!(parse_line("not json").is_err());
    }

    #[tokio::test]
    async fn test_replies_are_json_lines() {
        let mut out = Vec::new();
        write_replies(
            &mut out,
            &[
                Reply::ScrapeLinks { tab_id: 2 },
                Reply::Toolbar {
                    state: ToolbarState::MonitoringOff,
                },
            ],
        )
        .await
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"type\":\"scrape_links\",\"tab_id\":2}\n{\"type\":\"toolbar\",\"state\":\"monitoring_off\"}\n"
        );
    }
}
