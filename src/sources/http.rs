//! Adapters for requests and responses received over HTTP.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Request, Response};
use bytes::Bytes;

use crate::trigger::request::normalize_headers;
use crate::trigger::{HttpRequest, HttpResponse};

/// Normalize a buffered inbound request.
///
/// Every header and query argument is visited once. Repeated keys keep the
/// last value. Non UTF-8 header values are converted lossily.
pub fn from_http_request(request: &Request<Bytes>) -> HttpRequest {
    let headers = normalize_headers(request.headers().iter().map(|(name, value)| {
        (
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        )
    }));

    let query: HashMap<String, String> = request
        .uri()
        .query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();

    HttpRequest::new(
        request.method().clone(),
        request.uri().path(),
        headers,
        query,
        request.body().clone(),
    )
}

/// Normalize a function response, reading its body exactly once.
///
/// The only failure is the transport failing mid-body.
pub async fn from_http_response(response: Response<Body>) -> Result<HttpResponse, axum::Error> {
    from_http_response_limited(response, usize::MAX).await
}

/// [`from_http_response`] that fails once the body exceeds `limit` bytes.
pub async fn from_http_response_limited(
    response: Response<Body>,
    limit: usize,
) -> Result<HttpResponse, axum::Error> {
    let (parts, body) = response.into_parts();
    let body = axum::body::to_bytes(body, limit).await?;
    Ok(HttpResponse::new(parts.status, parts.headers, body))
}
