//! Blocking JSON GET over libcurl for catalog API calls.

use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::FetchError;

/// Header carrying the API token on every catalog request.
pub const TOKEN_HEADER: &str = "X-Emby-Token";

/// Total time allowed for one metadata call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn unavailable(url: &str, e: impl std::fmt::Display) -> FetchError {
    FetchError::Unavailable(format!("GET {}: {}", url, e))
}

/// Performs `GET url` with the token header and decodes the JSON body.
/// 404 maps to `NotFound`; transport errors, other non-2xx statuses and
/// undecodable bodies map to `Unavailable`.
pub(crate) fn get_json<T: DeserializeOwned>(
    url: &str,
    token: &str,
    connect_timeout: Duration,
) -> Result<T, FetchError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(|e| unavailable(url, e))?;
    easy.follow_location(true).map_err(|e| unavailable(url, e))?;
    easy.connect_timeout(connect_timeout)
        .map_err(|e| unavailable(url, e))?;
    easy.timeout(REQUEST_TIMEOUT).map_err(|e| unavailable(url, e))?;

    let mut list = curl::easy::List::new();
    list.append(&format!("{}: {}", TOKEN_HEADER, token.trim()))
        .map_err(|e| unavailable(url, e))?;
    list.append("Accept: application/json")
        .map_err(|e| unavailable(url, e))?;
    easy.http_headers(list).map_err(|e| unavailable(url, e))?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(|e| unavailable(url, e))?;
        transfer.perform().map_err(|e| unavailable(url, e))?;
    }

    let code = easy.response_code().map_err(|e| unavailable(url, e))?;
    if code == 404 {
        return Err(FetchError::NotFound(format!("GET {}: HTTP 404", url)));
    }
    if !(200..300).contains(&code) {
        return Err(unavailable(url, format!("HTTP {}", code)));
    }

    serde_json::from_slice(&body).map_err(|e| unavailable(url, format!("invalid JSON: {}", e)))
}
