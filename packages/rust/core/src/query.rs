//! Query shapes and request-kind classification.
//!
//! A [`RawQuery`] is what callers hand in (it deserializes from any JSON
//! object and ignores keys it does not know). It must select exactly one
//! retrieval mode; [`Query::from_raw`] is the only way to turn it into the
//! typed [`Query`] the rest of the client works with.

use serde::{Deserialize, Serialize};

use blackstar_shared::{BlackstarError, ChunkId, Result};

// ---------------------------------------------------------------------------
// RequestKind
// ---------------------------------------------------------------------------

/// Retrieval mode selected by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Ids,
    Names,
    Tags,
}

impl RequestKind {
    /// Path segment the server routes this mode under.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Ids => "byids",
            Self::Names => "bynames",
            Self::Tags => "bytags",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ids => "ids",
            Self::Names => "names",
            Self::Tags => "tags",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// RawQuery
// ---------------------------------------------------------------------------

/// Caller-supplied query before validation.
///
/// A field counts as present when it is `Some`, even if the list is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<ChunkId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl RawQuery {
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.ids = Some(ids.into_iter().map(ChunkId).collect());
        self
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Determine which retrieval mode `query` selects.
///
/// Fails with [`BlackstarError::AmbiguousQuery`] unless exactly one of
/// `ids`, `names`, `tags` is present. List contents are not inspected.
pub fn classify(query: &RawQuery) -> Result<RequestKind> {
    match (
        query.ids.is_some(),
        query.names.is_some(),
        query.tags.is_some(),
    ) {
        (true, false, false) => Ok(RequestKind::Ids),
        (false, true, false) => Ok(RequestKind::Names),
        (false, false, true) => Ok(RequestKind::Tags),
        _ => Err(BlackstarError::AmbiguousQuery),
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A validated query: exactly one retrieval mode with its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Ids(Vec<ChunkId>),
    Names(Vec<String>),
    Tags(Vec<String>),
}

impl Query {
    /// Validate a raw query, rejecting zero or multiple populated fields.
    pub fn from_raw(raw: RawQuery) -> Result<Self> {
        Ok(match classify(&raw)? {
            RequestKind::Ids => Self::Ids(raw.ids.unwrap_or_default()),
            RequestKind::Names => Self::Names(raw.names.unwrap_or_default()),
            RequestKind::Tags => Self::Tags(raw.tags.unwrap_or_default()),
        })
    }

    pub fn ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self::Ids(ids.into_iter().map(ChunkId).collect())
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tags(tags.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Ids(_) => RequestKind::Ids,
            Self::Names(_) => RequestKind::Names,
            Self::Tags(_) => RequestKind::Tags,
        }
    }

    /// Number of values carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Names(names) => names.len(),
            Self::Tags(tags) => tags.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<RawQuery> for Query {
    type Error = BlackstarError;

    fn try_from(raw: RawQuery) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<Query> for RawQuery {
    fn from(query: Query) -> Self {
        match query {
            Query::Ids(ids) => RawQuery {
                ids: Some(ids),
                ..Default::default()
            },
            Query::Names(names) => RawQuery {
                names: Some(names),
                ..Default::default()
            },
            Query::Tags(tags) => RawQuery {
                tags: Some(tags),
                ..Default::default()
            },
        }
    }
}
