//! Event-shaped triggers.

use bytes::Bytes;

/// A pub/sub style delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    id: String,
    topic: String,
    payload: Bytes,
}

impl Event {
    /// Create an event. `id` identifies this delivery attempt.
    pub fn new(id: impl Into<String>, topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub(crate) fn into_parts(self) -> (String, String, Bytes) {
        (self.id, self.topic, self.payload)
    }
}

/// A provider specific trigger, e.g. a scheduled invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTrigger {
    id: String,
    source: String,
    payload: Bytes,
}

impl CustomTrigger {
    pub fn new(id: impl Into<String>, source: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            payload: payload.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the originating source (schedule name, custom source id).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub(crate) fn into_parts(self) -> (String, String, Bytes) {
        (self.id, self.source, self.payload)
    }
}
