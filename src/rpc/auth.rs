//! Basic-auth headers for nodes sitting behind an authenticating proxy.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use jsonrpsee::http_client::{HeaderMap, HeaderValue};

/// Headers attached to every query. `None` yields an empty map.
pub(crate) fn basic_auth_headers(credentials: Option<(&str, &str)>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let Some((user, password)) = credentials else {
        return Ok(headers);
    };

    let token = BASE64_STANDARD.encode(format!("{user}:{password}"));
    let mut value = HeaderValue::from_str(&format!("Basic {token}"))
        .with_context(|| format!("rpc credentials for user '{user}' are not header-safe"))?;
    value.set_sensitive(true);
    headers.insert("Authorization", value);
    Ok(headers)
}
