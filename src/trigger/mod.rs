//! Normalized invocation model.
//!
//! # Data Flow
//! ```text
//! provider listener / envelope
//!     → sources (adapters build a Trigger)
//!     → gateway plugin (matches on the variant)
//!     → Trigger::into_request (outbound request for the function)
//!     → proxy forward
//!     → HttpResponse (normalized function response)
//! ```
//!
//! # Design Decisions
//! - The source type is carried by the enum variant, never stored separately
//! - All trigger values are immutable once built; accessors only
//! - Event-shaped triggers reach the function as `POST /` with context headers

pub mod event;
pub mod request;
pub mod response;
pub mod source_type;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use bytes::Bytes;

pub use event::{CustomTrigger, Event};
pub use request::{HttpRequest, X_FORWARDED_FOR};
pub use response::HttpResponse;
pub use source_type::{SourceType, UnknownSourceType};

/// Delivery id header handed to the function for event-shaped triggers.
pub const X_NITRIC_REQUEST_ID: &str = "x-nitric-request-id";
/// Source type header (`SUBSCRIPTION`, `REQUEST`, `CUSTOM`).
pub const X_NITRIC_SOURCE_TYPE: &str = "x-nitric-source-type";
/// Topic or custom source name header.
pub const X_NITRIC_SOURCE: &str = "x-nitric-source";

/// A normalized inbound invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Pub/sub style delivery.
    Event(Event),
    /// HTTP-shaped request.
    Http(HttpRequest),
    /// Provider specific source such as a schedule.
    Custom(CustomTrigger),
}

impl Trigger {
    /// The source type implied by the variant.
    pub fn source_type(&self) -> SourceType {
        match self {
            Trigger::Event(_) => SourceType::Subscription,
            Trigger::Http(_) => SourceType::Request,
            Trigger::Custom(_) => SourceType::Custom,
        }
    }

    /// Delivery identifier, if the variant has one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Trigger::Event(event) => Some(event.id()),
            Trigger::Custom(custom) => Some(custom.id()),
            Trigger::Http(_) => None,
        }
    }

    /// Build the request that is forwarded to the function process.
    ///
    /// The returned request is in origin form (path and query only); the
    /// proxy supplies scheme and authority.
    pub fn into_request(self) -> Result<Request<Body>, axum::http::Error> {
        match self {
            Trigger::Http(request) => request.to_request(),
            Trigger::Event(event) => {
                let (id, topic, payload) = event.into_parts();
                context_request(&id, SourceType::Subscription, &topic, payload)
            }
            Trigger::Custom(custom) => {
                let (id, source, payload) = custom.into_parts();
                context_request(&id, SourceType::Custom, &source, payload)
            }
        }
    }
}

fn context_request(
    id: &str,
    source_type: SourceType,
    source: &str,
    payload: Bytes,
) -> Result<Request<Body>, axum::http::Error> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(CONTENT_TYPE, content_type_of(&payload))
        .header(X_NITRIC_REQUEST_ID, id)
        .header(X_NITRIC_SOURCE_TYPE, source_type.as_str())
        .header(X_NITRIC_SOURCE, source)
        .body(Body::from(payload))
}

fn content_type_of(payload: &[u8]) -> &'static str {
    if serde_json::from_slice::<serde::de::IgnoredAny>(payload).is_ok() {
        "application/json"
    } else {
        "application/octet-stream"
    }
}
