use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use url::Url;

use crate::application::CookieStore;
use crate::domain::{Cookie, RelayError};

/// Cookies mirrored from the browser, keyed by cookie domain.
#[derive(Debug, Default)]
pub struct CookieJar {
    by_domain: Mutex<HashMap<String, Vec<Cookie>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, domain: &str, name: &str, value: &str) -> Result<(), RelayError> {
        let mut jar = self.lock()?;
        let cookies = jar.entry(normalize_domain(domain)).or_default();
        match cookies.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => cookies.push(Cookie {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
        Ok(())
    }

    pub fn remove(&self, domain: &str, name: &str) -> Result<(), RelayError> {
        let mut jar = self.lock()?;
        let domain = normalize_domain(domain);
        if let Some(cookies) = jar.get_mut(&domain) {
            cookies.retain(|c| c.name != name);
            if cookies.is_empty() {
                jar.remove(&domain);
            }
        }
        Ok(())
    }

    /// Cookies whose domain is the URL's host or one of its parents.
    fn matching(&self, url: &str) -> Result<Vec<Cookie>, RelayError> {
        let parsed = Url::parse(url).map_err(|e| RelayError::CookieStore(e.to_string()))?;
        let Some(host) = parsed.host_str() else {
            return Ok(Vec::new());
        };
        let host = host.to_ascii_lowercase();

        let jar = self.lock()?;
        let mut domains: Vec<&String> = jar
            .keys()
            .filter(|d| host == **d || host.ends_with(&format!(".{}", d)))
            .collect();
        // Most specific domain first.
        domains.sort_by_key(|d| std::cmp::Reverse(d.len()));

        Ok(domains
            .into_iter()
            .flat_map(|d| jar[d].iter().cloned())
            .collect())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Cookie>>>, RelayError> {
        self.by_domain
            .lock()
            .map_err(|e| RelayError::CookieStore(e.to_string()))
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim_start_matches('.').to_ascii_lowercase()
}

impl CookieStore for CookieJar {
    fn cookies_for<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<Cookie>, RelayError>> {
        Box::pin(async move { self.matching(url) })
    }
}
