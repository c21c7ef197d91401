//! Core domain types for Blackstar content chunks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// ChunkId
// ---------------------------------------------------------------------------

/// Server-assigned chunk identifier, unique within a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub i64);

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for ChunkId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for ChunkId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// A single named, tagged unit of content as returned by the server.
///
/// Fields the client does not know about are kept in `extra` so that an
/// update sends back exactly what was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Server-assigned identifier.
    pub id: ChunkId,
    /// Display name; not guaranteed unique.
    #[serde(default)]
    pub name: String,
    /// Tags used for grouped retrieval.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Opaque content payload. Absent and `null` both read as `Null`, which
    /// is not written back.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// Any other fields sent by the server.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chunk {
    /// Whether this chunk carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A chunk that has not been stored yet (no id).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewChunk {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub value: Value,
}

// ---------------------------------------------------------------------------
// ErrorReport
// ---------------------------------------------------------------------------

/// Payload posted to the server's error-reporting endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Human-readable error message.
    pub message: String,
    /// Where the error was raised (module, command, URL...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-form context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            context: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
