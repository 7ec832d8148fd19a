//! Normalized function response.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

/// Headers that describe a single connection and must not be replayed.
const HOP_BY_HOP: [header::HeaderName; 7] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::TE,
    header::TRAILER,
    header::PROXY_AUTHENTICATE,
    header::CONTENT_LENGTH,
];

/// The function's response, ready to be translated for the provider.
///
/// The header map is moved out of the transport response, not copied.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    headers: HeaderMap,
    body: Bytes,
    status: StatusCode,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
            status,
        }
    }

    /// A `text/plain` response, used for failures produced by the membrane itself.
    pub fn text(status: StatusCode, message: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self::new(status, headers, message.into())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let (status, mut headers, body) = self.into_parts();
        // keep-alive has no constant in `http`
        headers.remove("keep-alive");
        for name in HOP_BY_HOP {
            headers.remove(name);
        }
        (status, headers, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_response_strips_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-function", HeaderValue::from_static("hello"));

        let response = HttpResponse::new(StatusCode::CREATED, headers, "made").into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::CONNECTION).is_none());
        assert!(response.headers().get("keep-alive").is_none());
        assert_ne!(
            response.headers().get(header::CONTENT_LENGTH).map(|v| v.as_bytes()),
            Some(&b"999"[..])
        );
        assert_eq!(response.headers()["x-function"], "hello");
    }

    #[test]
    fn test_text_sets_plain_content_type() {
        let response = HttpResponse::text(StatusCode::BAD_GATEWAY, "down");
        assert_eq!(response.status_code(), 502);
        assert_eq!(response.body(), &Bytes::from_static(b"down"));
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
