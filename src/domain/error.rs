use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error("Cookie store unavailable: {0}")]
    CookieStore(String),

    #[error("Tab {0} not found")]
    TabNotFound(i64),

    #[error("Preference store error: {0}")]
    Preferences(String),
}
