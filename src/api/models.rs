use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_XDM_HOST: &str = "http://127.0.0.1:9614";

/// Response from the /sync endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked_hosts: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_urls: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_exts: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vid_exts: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vid_list: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_list: Vec<String>,
}

/// The service sends `null` for lists it has nothing for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub xdm_host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            xdm_host: DEFAULT_XDM_HOST.to_string(),
        }
    }
}
