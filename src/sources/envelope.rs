//! Provider event envelope adapter.
//!
//! Serverless runtimes hand the function a JSON document whose shape
//! depends on what fired it. This module recognises the shapes the membrane
//! serves and turns them into triggers:
//!
//! - API gateway v2 HTTP events (`routeKey` or `requestContext.apiId`)
//! - notification records (`Records[].EventSource == "aws:sns"`)
//! - health checks (`{"x-nitric-healthcheck": true}`)
//! - schedules (`{"x-nitric-schedule": "<name>"}`)

use std::collections::HashMap;

use axum::http::Method;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;

use crate::trigger::request::normalize_headers;
use crate::trigger::{CustomTrigger, Event, HttpRequest, Trigger};

const SNS_EVENT_SOURCE: &str = "aws:sns";

/// Errors produced while reading an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unhandled envelope type")]
    UnknownEventType,
    #[error("envelope is missing `{0}`")]
    MissingField(&'static str),
    #[error("invalid base64 body: {0}")]
    Body(#[from] base64::DecodeError),
    #[error("invalid http method `{0}`")]
    Method(String),
}

/// A classified envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// One HTTP request; the provider expects a proxy response back.
    Http(HttpRequest),
    /// A batch of event-shaped triggers (`Event` or `Custom`).
    Events(Vec<Trigger>),
    /// Liveness check from the provider; nothing is forwarded.
    HealthCheck,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEnvelope {
    #[serde(rename = "routeKey")]
    route_key: Option<String>,
    #[serde(rename = "rawPath")]
    raw_path: Option<String>,
    headers: Option<HashMap<String, String>>,
    cookies: Vec<String>,
    #[serde(rename = "queryStringParameters")]
    query_string_parameters: Option<HashMap<String, String>>,
    body: Option<String>,
    #[serde(rename = "isBase64Encoded")]
    is_base64_encoded: bool,
    #[serde(rename = "requestContext")]
    request_context: Option<RequestContext>,
    #[serde(rename = "Records")]
    records: Vec<Record>,
    #[serde(rename = "x-nitric-healthcheck")]
    healthcheck: bool,
    #[serde(rename = "x-nitric-schedule")]
    schedule: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RequestContext {
    #[serde(rename = "apiId")]
    api_id: Option<String>,
    http: Option<HttpContext>,
}

#[derive(Debug, Deserialize)]
struct HttpContext {
    method: String,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "EventSource", alias = "eventSource", default)]
    event_source: String,
    #[serde(rename = "Sns")]
    sns: Option<SnsEntity>,
}

#[derive(Debug, Deserialize)]
struct SnsEntity {
    #[serde(rename = "MessageId", default)]
    message_id: String,
    #[serde(rename = "TopicArn", default)]
    topic_arn: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// Message body published by membrane-aware publishers.
#[derive(Debug, Deserialize)]
struct PublishedEvent {
    id: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Classify and normalize a raw envelope.
pub fn parse_envelope(data: &[u8]) -> Result<Envelope, EnvelopeError> {
    let raw: RawEnvelope = serde_json::from_slice(data)?;

    if raw.is_http() {
        return raw.into_http().map(Envelope::Http);
    }
    if raw.healthcheck {
        return Ok(Envelope::HealthCheck);
    }
    if raw
        .records
        .first()
        .is_some_and(|record| record.event_source == SNS_EVENT_SOURCE)
    {
        return raw.into_events().map(Envelope::Events);
    }
    if let Some(schedule) = raw.schedule.filter(|name| !name.is_empty()) {
        let trigger = CustomTrigger::new(uuid::Uuid::new_v4().to_string(), schedule, Bytes::new());
        return Ok(Envelope::Events(vec![Trigger::Custom(trigger)]));
    }

    Err(EnvelopeError::UnknownEventType)
}

impl RawEnvelope {
    fn is_http(&self) -> bool {
        let routed = self.route_key.as_deref().is_some_and(|key| !key.is_empty());
        let api = self
            .request_context
            .as_ref()
            .and_then(|ctx| ctx.api_id.as_deref())
            .is_some_and(|id| !id.is_empty());
        routed || api
    }

    fn into_http(self) -> Result<HttpRequest, EnvelopeError> {
        let http = self
            .request_context
            .and_then(|ctx| ctx.http)
            .ok_or(EnvelopeError::MissingField("requestContext.http"))?;

        let method = Method::from_bytes(http.method.as_bytes())
            .map_err(|_| EnvelopeError::Method(http.method.clone()))?;

        let path = self
            .raw_path
            .filter(|path| !path.is_empty())
            .or(http.path)
            .unwrap_or_else(|| "/".to_string());

        let body = match self.body {
            Some(body) if self.is_base64_encoded => {
                Bytes::from(base64::engine::general_purpose::STANDARD.decode(body)?)
            }
            Some(body) => Bytes::from(body),
            None => Bytes::new(),
        };

        let mut headers = self.headers.unwrap_or_default();
        // v2 payloads move cookies out of the headers
        if !self.cookies.is_empty() {
            headers.retain(|name, _| !name.eq_ignore_ascii_case("cookie"));
            headers.insert("cookie".to_string(), self.cookies.join("; "));
        }

        Ok(HttpRequest::new(
            method,
            path,
            normalize_headers(headers),
            self.query_string_parameters.unwrap_or_default(),
            body,
        ))
    }

    fn into_events(self) -> Result<Vec<Trigger>, EnvelopeError> {
        let mut triggers = Vec::with_capacity(self.records.len());

        for record in self.records {
            let Some(sns) = record.sns else {
                tracing::warn!(event_source = %record.event_source, "Skipping record without notification body");
                continue;
            };

            let topic = sns.topic_arn.rsplit(':').next().unwrap_or_default().to_string();

            let event = match serde_json::from_str::<PublishedEvent>(&sns.message) {
                Ok(published) => {
                    Event::new(published.id, topic, serde_json::to_vec(&published.payload)?)
                }
                Err(_) => Event::new(sns.message_id, topic, sns.message.into_bytes()),
            };
            triggers.push(Trigger::Event(event));
        }

        Ok(triggers)
    }
}
