//! Browser lifecycle signals and the replies the core sends back.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Header, ToolbarState, NO_TAB};

/// Keyboard command that pauses or resumes relaying.
pub const TOGGLE_MONITORING: &str = "toggle-monitoring";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BrowserEvent {
    RequestStarted {
        #[serde(deserialize_with = "opaque_id")]
        request_id: String,
        #[serde(default = "no_tab")]
        tab_id: i64,
        #[serde(default)]
        request_headers: Vec<Header>,
    },
    ResponseReceived {
        #[serde(deserialize_with = "opaque_id")]
        request_id: String,
        url: String,
        status_code: u16,
        #[serde(default)]
        response_headers: Vec<Header>,
    },
    /// Request completed or failed.
    RequestTerminal {
        #[serde(deserialize_with = "opaque_id")]
        request_id: String,
    },
    DownloadCreated {
        #[serde(default)]
        url: String,
    },
    ContextMenu {
        item: MenuItem,
        #[serde(default)]
        info: Selection,
        #[serde(default = "no_tab")]
        tab_id: i64,
    },
    Command {
        name: String,
    },
    Message {
        message: UiMessage,
    },
    TimerTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuItem {
    DownloadLink,
    DownloadImage,
    DownloadAll,
}

/// What the user right-clicked on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub link_url: Option<String>,
    pub src_url: Option<String>,
    pub page_url: Option<String>,
}

impl Selection {
    pub fn link_target(&self) -> Option<&str> {
        first_non_empty([&self.link_url, &self.src_url, &self.page_url])
    }

    pub fn image_target(&self) -> Option<&str> {
        first_non_empty([&self.src_url, &self.link_url, &self.page_url])
    }
}

fn first_non_empty<'a>(candidates: [&'a Option<String>; 3]) -> Option<&'a str> {
    candidates
        .into_iter()
        .filter_map(|c| c.as_deref())
        .find(|c| !c.is_empty())
}

/// Messages from the popup and the link scraper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UiMessage {
    Stat,
    Cmd {
        #[serde(default)]
        disable: bool,
    },
    Links {
        #[serde(default)]
        links: Vec<String>,
    },
    Vid {
        #[serde(rename = "itemId")]
        item_id: String,
    },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Stat {
        #[serde(rename = "isDisabled")]
        is_disabled: bool,
        list: Vec<serde_json::Value>,
    },
    /// Run the link scraper in this tab and send back a `links` message.
    ScrapeLinks { tab_id: i64 },
    Toolbar { state: ToolbarState },
}

fn no_tab() -> i64 {
    NO_TAB
}

/// Request ids arrive as strings or integers depending on the browser.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_started_accepts_numeric_id() {
        let event: BrowserEvent = serde_json::from_value(json!({
            "event": "request_started",
            "request_id": 1234,
            "tab_id": 5,
            "request_headers": [{"name": "X-Test", "value": "1"}]
        }))
        .unwrap();
        assert_eq!(
            event,
            BrowserEvent::RequestStarted {
                request_id: "1234".into(),
                tab_id: 5,
                request_headers: vec![Header::new("X-Test", "1")],
            }
        );
    }

    #[test]
    fn test_request_started_defaults_to_no_tab() {
        let event: BrowserEvent =
            serde_json::from_value(json!({"event": "request_started", "request_id": "a"})).unwrap();
        assert!(matches!(
            event,
            BrowserEvent::RequestStarted { tab_id: NO_TAB, .. }
        ));
    }

    #[test]
    fn test_ui_messages_parse() {
        let event: BrowserEvent = serde_json::from_value(json!({
            "event": "message",
            "message": {"type": "vid", "itemId": "v-1"}
        }))
        .unwrap();
        assert_eq!(
            event,
            BrowserEvent::Message {
                message: UiMessage::Vid {
                    item_id: "v-1".into()
                }
            }
        );

        let event: BrowserEvent =
            serde_json::from_value(json!({"event": "message", "message": {"type": "stat"}}))
                .unwrap();
        assert_eq!(
            event,
            BrowserEvent::Message {
                message: UiMessage::Stat
            }
        );
    }

    #[test]
    fn test_context_menu_item_ids() {
        let event: BrowserEvent = serde_json::from_value(json!({
            "event": "context_menu",
            "item": "download-image",
            "info": {"srcUrl": "http://a/i.png", "pageUrl": "http://a/"}
        }))
        .unwrap();
        match event {
            BrowserEvent::ContextMenu { item, info, tab_id } => {
                assert_eq!(item, MenuItem::DownloadImage);
                assert_eq!(info.image_target(), Some("http://a/i.png"));
                assert_eq!(tab_id, NO_TAB);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_selection_priorities() {
        let info = Selection {
            link_url: Some(String::new()),
            src_url: Some("http://a/src".into()),
            page_url: Some("http://a/page".into()),
        };
        assert_eq!(info.link_target(), Some("http://a/src"));

        let info = Selection {
            link_url: Some("http://a/link".into()),
            src_url: Some("http://a/src".into()),
            page_url: None,
        };
        assert_eq!(info.link_target(), Some("http://a/link"));
        assert_eq!(info.image_target(), Some("http://a/src"));

        assert_eq!(Selection::default().link_target(), None);
    }

    #[test]
    fn test_stat_reply_shape() {
        let reply = Reply::Stat {
            is_disabled: true,
            list: vec![json!({"id": "1"})],
        };
        assert_eq!(
            serde_json::to_value(reply).unwrap(),
            json!({"type": "stat", "isDisabled": true, "list": [{"id": "1"}]})
        );
    }
}
