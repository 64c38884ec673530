//! Request ID generation
//!
//! IDs use the format: `{6-char-hex}-req-{suffix}`
//! Example: `0193a1-req-c4f27c2e7a0b8d3e9f04b1d3aa`
//!
//! Prefix and suffix together are the full UUIDv7 in simple form. The prefix
//! is the high timestamp bits, so IDs sort roughly by creation time in logs.

use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to each request when it is queued
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh ID
    pub fn generate() -> Self {
        let simple = uuid::Uuid::now_v7().simple().to_string();
        Self(format!("{}-req-{}", &simple[..6], &simple[6..]))
    }

    /// Get the hex prefix (first 6 chars)
    pub fn hex_prefix(&self) -> &str {
        &self.0[..6.min(self.0.len())]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
