//! Browser capabilities the relay core consumes but does not own.

use futures::future::BoxFuture;

use crate::config::Preferences;
use crate::domain::{Cookie, RelayError};

/// Cookies visible to a URL.
pub trait CookieStore: Send + Sync {
    fn cookies_for<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<Cookie>, RelayError>>;
}

/// Tab metadata by id.
pub trait TabLookup: Send + Sync {
    fn title(&self, tab_id: i64) -> BoxFuture<'_, Result<Option<String>, RelayError>>;
}

/// Persistent user preferences.
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<Preferences, RelayError>;
    fn set_disabled(&self, disabled: bool) -> Result<(), RelayError>;
}
