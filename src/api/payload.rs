//! The `key=value` text body the external service expects on `/download`
//! and `/video`.

use crate::domain::{Cookie, Header};

const LINE_END: &str = "\r\n";

/// Ordered, line-oriented request body. Built per call, never stored.
#[derive(Debug, Clone, Default)]
pub struct OutboundPayload {
    lines: Vec<(&'static str, String)>,
}

impl OutboundPayload {
    pub fn new(url: &str) -> Self {
        let mut payload = Self::default();
        payload.push("url", url.to_string());
        payload
    }

    pub fn file(mut self, title: Option<&str>) -> Self {
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            self.push("file", title.to_string());
        }
        self
    }

    pub fn request_headers(mut self, headers: &[Header]) -> Self {
        for h in headers {
            self.push("req", format!("{}:{}", h.name, h.value));
        }
        self
    }

    pub fn response_headers(mut self, headers: &[Header]) -> Self {
        for h in headers {
            self.push("res", format!("{}:{}", h.name, h.value));
        }
        self
    }

    pub fn tab_id(mut self, tab_id: i64) -> Self {
        self.push("res", format!("tabId:{}", tab_id));
        self
    }

    pub fn user_agent(mut self, agent: &str) -> Self {
        self.push("res", format!("realUA:{}", agent));
        self
    }

    pub fn cookies(mut self, cookies: &[Cookie]) -> Self {
        for c in cookies {
            self.push("cookie", format!("{}:{}", c.name, c.value));
        }
        self
    }

    fn push(&mut self, key: &'static str, value: String) {
        self.lines.push((key, value));
    }

    pub fn encode(&self) -> String {
        let mut body = String::new();
        for (key, value) in &self.lines {
            body.push_str(key);
            body.push('=');
            body.push_str(value);
            body.push_str(LINE_END);
        }
        body
    }
}
