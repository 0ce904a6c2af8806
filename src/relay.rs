use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;

use crate::error::ApiError;
use crate::session::{issue_cookies, TokenPair};

/// Forward an upstream response to the original caller unchanged: status
/// copied, Content-Type copied (defaulting to JSON), body relayed as raw
/// bytes without re-parsing so non-JSON error bodies survive byte-for-byte.
pub async fn relay(upstream: reqwest::Response) -> Result<HttpResponse, ApiError> {
    relay_with_cookies(upstream, None).await
}

/// Same as [`relay`], additionally re-issuing the session cookies when the
/// call rotated the token pair.
pub async fn relay_with_cookies(
    upstream: reqwest::Response,
    rotated: Option<TokenPair>,
) -> Result<HttpResponse, ApiError> {
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).map_err(|_| ApiError::Internal)?;
    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_owned();

    let mut builder = HttpResponse::build(status);
    builder.insert_header((header::CONTENT_TYPE, content_type));
    if let Some(pair) = rotated {
        for cookie in issue_cookies(&pair) {
            builder.cookie(cookie);
        }
    }

    // No-content statuses are defined to carry no body; drop any spurious
    // one instead of forwarding it.
    if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) {
        return Ok(builder.finish());
    }

    let body = upstream.bytes().await?;
    Ok(builder.body(body))
}
