//! Container id extraction from catalog web links.

use crate::error::FetchError;

/// Extracts the `id` parameter from the fragment of a catalog web link.
///
/// Web clients route inside the fragment, e.g.
/// `https://jf.example.com/web/index.html#!/details?id=abc&serverId=xyz` or
/// `.../#/details?id=abc`. The parameters after the first `?` in the fragment are
/// parsed; a fragment without `?` is parsed whole.
pub fn container_id_from_url(catalog_url: &str) -> Result<String, FetchError> {
    let parsed = url::Url::parse(catalog_url.trim())
        .map_err(|e| FetchError::MalformedInput(format!("invalid catalog URL: {}", e)))?;
    let fragment = parsed
        .fragment()
        .ok_or_else(|| FetchError::MalformedInput("catalog URL has no fragment".into()))?;
    let params = match fragment.split_once('?') {
        Some((_, query)) => query,
        None => fragment.trim_start_matches(|c| c == '!' || c == '/'),
    };
    url::form_urlencoded::parse(params.as_bytes())
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FetchError::MalformedInput("no id parameter in catalog URL fragment".into()))
}
