//! Normalized HTTP-shaped trigger.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Method, Request};
use bytes::Bytes;

/// Header that carries the caller's original `Host` after normalization.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// An inbound HTTP call, independent of the listener that received it.
///
/// Header and query maps are single valued: the last value seen for a key
/// wins. Multi-valued query parameters are not preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    headers: HashMap<String, String>,
    body: Bytes,
    method: Method,
    path: String,
    query: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        headers: HashMap<String, String>,
        query: HashMap<String, String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            headers,
            body: body.into(),
            method,
            path: path.into(),
            query,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Rebuild an origin-form request (`/path?query`) for forwarding.
    ///
    /// Headers that are not valid on the wire are dropped with a warning.
    pub fn to_request(&self) -> Result<Request<Body>, axum::http::Error> {
        let mut uri = if self.path.is_empty() {
            "/".to_string()
        } else {
            self.path.clone()
        };

        if !self.query.is_empty() {
            let mut pairs: Vec<_> = self.query.iter().collect();
            pairs.sort();
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            uri.push('?');
            uri.push_str(&encoded);
        }

        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(uri)
            .body(Body::from(self.body.clone()))?;

        let headers = request.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping header that is invalid on the wire"),
            }
        }

        Ok(request)
    }
}

/// Collapse a header sequence into the normalized single-valued map.
///
/// `Host` (any case) is renamed to `x-forwarded-for`; it takes precedence
/// over an inbound forwarding header. All other keys are kept as given.
pub(crate) fn normalize_headers<I, K, V>(headers: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut normalized = HashMap::new();
    let mut host = None;

    for (name, value) in headers {
        let name = name.as_ref();
        if name.eq_ignore_ascii_case("host") {
            host = Some(value.into());
        } else {
            normalized.insert(name.to_string(), value.into());
        }
    }

    if let Some(host) = host {
        normalized.retain(|key: &String, _| !key.eq_ignore_ascii_case(X_FORWARDED_FOR));
        normalized.insert(X_FORWARDED_FOR.to_string(), host);
    }

    normalized
}
