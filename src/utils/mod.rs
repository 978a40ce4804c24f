use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

/// Get current Unix timestamp in milliseconds
pub fn get_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Trim, drop empties and de-duplicate `urls`, keeping first-seen order and
/// stopping once `cap` distinct entries are collected.
pub fn unique_urls<I, S>(urls: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for url in urls {
        if unique.len() >= cap {
            break;
        }
        let url = url.as_ref().trim();
        if url.is_empty() {
            continue;
        }
        if seen.insert(url.to_string()) {
            unique.push(url.to_string());
        }
    }
    unique
}

/// Whether `url` points at the external service living at `host`.
///
/// Compares scheme, host and port when both parse; otherwise falls back to
/// a plain prefix check.
pub fn targets_host(url: &str, host: &str) -> bool {
    match (Url::parse(url), Url::parse(host)) {
        (Ok(url), Ok(host)) => {
            url.scheme() == host.scheme()
                && url.host_str() == host.host_str()
                && url.port_or_known_default() == host.port_or_known_default()
        }
        _ => url.starts_with(host),
    }
}

/// Join the service base with an endpoint path, tolerating a trailing slash.
pub fn endpoint(host: &str, path: &str) -> String {
    format!("{}{}", host.trim_end_matches('/'), path)
}
