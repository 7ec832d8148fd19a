//! Trigger source classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a trigger originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// Topic subscription delivery.
    Subscription,
    /// HTTP request.
    Request,
    /// Anything provider specific (schedules, custom sources).
    Custom,
}

impl SourceType {
    /// Wire name used in the `x-nitric-source-type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Subscription => "SUBSCRIPTION",
            SourceType::Request => "REQUEST",
            SourceType::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a source type header holds an unrecognised value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source type `{0}`")]
pub struct UnknownSourceType(pub String);

impl FromStr for SourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUBSCRIPTION" => Ok(SourceType::Subscription),
            "REQUEST" => Ok(SourceType::Request),
            "CUSTOM" => Ok(SourceType::Custom),
            _ => Err(UnknownSourceType(s.to_string())),
        }
    }
}
