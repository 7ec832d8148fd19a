//! Source adapters: provider shapes in, normalized triggers out.
//!
//! # Data Flow
//! ```text
//! HTTP listener request ──▶ http::from_http_request ──▶ Trigger::Http
//! provider envelope JSON ─▶ envelope::parse_envelope ─▶ Trigger::{Http, Event, Custom}
//! function response ─────▶ http::from_http_response ─▶ HttpResponse
//! ```
//!
//! # Design Decisions
//! - Adapters are pure and never fail on well-formed input
//! - Malformed transport input is rejected by the listener, not here
//! - The response adapter performs the only read of the response body

pub mod envelope;
pub mod http;

pub use envelope::{parse_envelope, Envelope, EnvelopeError};
pub use http::{from_http_request, from_http_response, from_http_response_limited};
