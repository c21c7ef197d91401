//! Fetched chunk collections with lookup helpers.
//!
//! [`Collection`] takes ownership of the decoded `Vec<Chunk>` without
//! copying or reordering it. Lookups scan on demand; nothing is indexed.
//! Deriving a new sequence (filtering, slicing) yields plain chunks that
//! must be enriched again to get the lookups back.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use blackstar_shared::{Chunk, ChunkId};

/// An ordered chunk sequence with by-id, by-name and by-tag lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    chunks: Vec<Chunk>,
}

impl Collection {
    /// First chunk whose id equals `id`.
    pub fn by_id(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.id == id)
    }

    /// First chunk whose name equals `name` exactly.
    pub fn by_name(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    /// Every chunk tagged with `tag`, in collection order.
    pub fn by_tag(&self, tag: &str) -> Vec<&Chunk> {
        self.chunks.iter().filter(|c| c.has_tag(tag)).collect()
    }

    pub fn as_slice(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Give back the underlying chunks.
    pub fn into_inner(self) -> Vec<Chunk> {
        self.chunks
    }
}

impl Deref for Collection {
    type Target = [Chunk];

    fn deref(&self) -> &[Chunk] {
        &self.chunks
    }
}

impl From<Vec<Chunk>> for Collection {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }
}

impl From<Collection> for Vec<Chunk> {
    fn from(collection: Collection) -> Self {
        collection.chunks
    }
}

impl IntoIterator for Collection {
    type Item = Chunk;
    type IntoIter = std::vec::IntoIter<Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

// ---------------------------------------------------------------------------
// Enrich
// ---------------------------------------------------------------------------

/// Anything that can be wrapped into a [`Collection`].
///
/// Enriching a collection again returns it unchanged.
pub trait Enrich {
    fn enrich(self) -> Collection;
}

impl Enrich for Vec<Chunk> {
    fn enrich(self) -> Collection {
        Collection::from(self)
    }
}

impl Enrich for Collection {
    fn enrich(self) -> Collection {
        self
    }
}

/// Wrap `chunks` with lookup helpers. Never fails, including on empty input.
pub fn enrich(chunks: impl Enrich) -> Collection {
    chunks.enrich()
}
