use crate::domain::Header;

/// Value of the first `Content-Type` header, lower-cased.
pub fn content_type(headers: &[Header]) -> Option<String> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-type"))
        .map(|h| h.value.to_lowercase())
}

/// Whether a response carries streamable audio or video.
///
/// Prefix match so parameters such as `codecs=` or `charset=` don't matter.
pub fn is_media(headers: &[Header]) -> bool {
    match content_type(headers) {
        Some(mime) => mime.starts_with("audio/") || mime.starts_with("video/"),
        None => false,
    }
}
