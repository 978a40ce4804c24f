use std::sync::Arc;

use tracing::debug;

use super::collaborators::CookieStore;
use crate::api::{ApiError, OutboundPayload, XdmClient};
use crate::domain::{Cookie, Delivery, Exchange};
use crate::utils::unique_urls;

/// Most distinct URLs relayed from a single batch.
pub const MAX_BATCH_URLS: usize = 500;

/// Hands URLs and captured requests to the external service.
///
/// Every call is best-effort: failures come back as [`Delivery::Failed`]
/// and are logged at debug level, never raised.
#[derive(Clone)]
pub struct OutboundRelay {
    client: XdmClient,
    cookies: Arc<dyn CookieStore>,
    user_agent: String,
}

impl OutboundRelay {
    pub fn new(client: XdmClient, cookies: Arc<dyn CookieStore>, user_agent: String) -> Self {
        Self {
            client,
            cookies,
            user_agent,
        }
    }

    pub fn host(&self) -> &str {
        self.client.host()
    }

    /// Relay a download. Without a captured exchange the payload is just the
    /// URL, the user agent and cookies.
    pub async fn relay_download(&self, url: &str, exchange: Option<&Exchange>) -> Delivery {
        debug!(url = %url, "sending download to xdm");
        let body = self.build_payload(url, exchange, None).await;
        Self::outcome("/download", self.client.download(body).await)
    }

    /// Relay a detected audio/video stream, optionally named after its tab.
    pub async fn relay_media(
        &self,
        exchange: &Exchange,
        url: &str,
        title: Option<&str>,
    ) -> Delivery {
        debug!(url = %url, "sending media to xdm");
        let body = self.build_payload(url, Some(exchange), title).await;
        Self::outcome("/video", self.client.video(body).await)
    }

    /// Relay each distinct URL in `urls` one after another. Returns how many
    /// relays were attempted.
    pub async fn relay_urls<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = unique_urls(urls, MAX_BATCH_URLS);
        for url in &urls {
            self.relay_download(url, None).await;
        }
        urls.len()
    }

    pub async fn notify_item_selected(&self, item_id: &str) -> Delivery {
        Self::outcome("/item", self.client.item(item_id).await)
    }

    pub async fn notify_clear_all(&self) -> Delivery {
        Self::outcome("/clear", self.client.clear().await)
    }

    async fn build_payload(
        &self,
        url: &str,
        exchange: Option<&Exchange>,
        title: Option<&str>,
    ) -> String {
        let mut payload = OutboundPayload::new(url).file(title);
        if let Some(exchange) = exchange {
            payload = payload
                .request_headers(&exchange.request.request_headers)
                .response_headers(&exchange.response_headers)
                .tab_id(exchange.request.tab_id);
        }
        payload
            .user_agent(&self.user_agent)
            .cookies(&self.cookies_for(url).await)
            .encode()
    }

    async fn cookies_for(&self, url: &str) -> Vec<Cookie> {
        match self.cookies.cookies_for(url).await {
            Ok(cookies) => cookies,
            Err(e) => {
                debug!(url = %url, "cookie read failed: {}", e);
                Vec::new()
            }
        }
    }

    fn outcome(path: &str, result: Result<u16, ApiError>) -> Delivery {
        match result {
            Ok(status) => Delivery::Sent { status },
            Err(e) => {
                debug!("{} failed: {}", path, e);
                Delivery::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::ApiConfig;
    use crate::domain::{Header, RelayError, TrackedRequest};
    use futures::future::BoxFuture;
    use mockito::Matcher;

    pub(crate) struct StaticCookies(pub Vec<Cookie>);

    impl CookieStore for StaticCookies {
        fn cookies_for<'a>(
            &'a self,
            _url: &'a str,
        ) -> BoxFuture<'a, Result<Vec<Cookie>, RelayError>> {
            Box::pin(async move { Ok(self.0.clone()) })
        }
    }

    struct BrokenCookies;

    impl CookieStore for BrokenCookies {
        fn cookies_for<'a>(
            &'a self,
            _url: &'a str,
        ) -> BoxFuture<'a, Result<Vec<Cookie>, RelayError>> {
            Box::pin(async { Err(RelayError::CookieStore("store offline".into())) })
        }
    }

    fn relay(host: String, cookies: Arc<dyn CookieStore>) -> OutboundRelay {
        OutboundRelay::new(
            XdmClient::new(ApiConfig { xdm_host: host }),
            cookies,
            "TestAgent/1.0".to_string(),
        )
    }

    fn sid() -> Vec<Cookie> {
        vec![Cookie {
            name: "sid".into(),
            value: "abc".into(),
        }]
    }

    fn exchange() -> Exchange {
        Exchange {
            request: TrackedRequest {
                request_id: "r1".into(),
                tab_id: 4,
                request_headers: vec![Header::new("X-Test", "1")],
                created_at_ms: 0,
            },
            response_headers: vec![Header::new("Content-Type", "video/mp4")],
        }
    }

    #[tokio::test]
    async fn test_download_without_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/download")
            .match_body("url=http://a/f.zip\r\nres=realUA:TestAgent/1.0\r\ncookie=sid:abc\r\n")
            .with_status(200)
            .create_async()
            .await;

        let delivery = relay(server.url(), Arc::new(StaticCookies(sid())))
            .relay_download("http://a/f.zip", None)
            .await;
        assert_eq!(delivery, Delivery::Sent { status: 200 });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_media_payload_has_title_headers_and_tab() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/video")
            .match_body(
                "url=https://example.com/v.mp4\r\nfile=Clip\r\nreq=X-Test:1\r\n\
                 res=Content-Type:video/mp4\r\nres=tabId:4\r\nres=realUA:TestAgent/1.0\r\n",
            )
            .with_status(200)
            .create_async()
            .await;

        let delivery = relay(server.url(), Arc::new(StaticCookies(vec![])))
            .relay_media(&exchange(), "https://example.com/v.mp4", Some("Clip"))
            .await;
        assert!(delivery.is_sent());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cookie_failure_still_relays() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/download")
            .match_body(Matcher::Regex("^url=http://a\r\nres=realUA:[^\r]*\r\n$".into()))
            .with_status(200)
            .create_async()
            .await;

        let delivery = relay(server.url(), Arc::new(BrokenCookies))
            .relay_download("http://a", None)
            .await;
        assert!(delivery.is_sent());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_service_is_swallowed() {
        let delivery = relay("http://127.0.0.1:1".into(), Arc::new(StaticCookies(vec![])))
            .relay_download("http://a", None)
            .await;
        assert!(matches!(delivery, Delivery::Failed { .. }));
    }

    #[tokio::test]
    async fn test_error_status_is_failed_delivery() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/download")
            .with_status(500)
            .create_async()
            .await;

        let delivery = relay(server.url(), Arc::new(StaticCookies(vec![])))
            .relay_download("http://a", None)
            .await;
        assert!(matches!(delivery, Delivery::Failed { .. }));
    }

    #[tokio::test]
    async fn test_relay_urls_dedupes_trimmed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/download")
            .match_body(Matcher::Regex("^url=http://a\r\n".into()))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let sent = relay(server.url(), Arc::new(StaticCookies(vec![])))
            .relay_urls(["http://a", "http://a ", "http://a", ""])
            .await;
        assert_eq!(sent, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_relay_urls_caps_batch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/download")
            .with_status(200)
            .expect(MAX_BATCH_URLS)
            .create_async()
            .await;

        let urls: Vec<String> = (0..600).map(|i| format!("http://h/{i}")).collect();
        let sent = relay(server.url(), Arc::new(StaticCookies(vec![])))
            .relay_urls(&urls)
            .await;
        assert_eq!(sent, MAX_BATCH_URLS);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_clear_and_item() {
        let mut server = mockito::Server::new_async().await;
        let clear = server
            .mock("GET", "/clear")
            .with_status(200)
            .create_async()
            .await;
        let item = server
            .mock("POST", "/item")
            .match_body("vid-9")
            .with_status(200)
            .create_async()
            .await;

        let relay = relay(server.url(), Arc::new(StaticCookies(vec![])));
        assert!(relay.notify_clear_all().await.is_sent());
        assert!(relay.notify_item_selected("vid-9").await.is_sent());
        clear.assert_async().await;
        item.assert_async().await;
    }
}
