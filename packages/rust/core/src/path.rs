//! Request path construction.
//!
//! Wire format, relative to the content root:
//! `byids/<id>/<id>/...`, `bynames/<name>/...`, `bytags/<tag>/...`.
//! Values are joined in the order given and are not escaped, so names and
//! tags must not contain `/`.

use std::fmt::Display;

use url::Url;

use blackstar_shared::{BlackstarError, ChunkId, Result};

use crate::query::{Query, RawQuery, RequestKind, classify};

/// Content API location relative to the server origin.
pub const CONTENT_API_PATH: &str = "api/content/";

/// Error-reporting endpoint relative to the server origin.
pub const ERRORS_API_PATH: &str = "api/errors";

const SEPARATOR: &str = "/";

/// Render the request path for a raw query.
///
/// Classification failures are returned unchanged and no path is built.
pub fn build_path(base_url: &str, query: &RawQuery) -> Result<String> {
    let kind = classify(query)?;
    let values = match kind {
        RequestKind::Ids => join(query.ids.iter().flatten()),
        RequestKind::Names => join(query.names.iter().flatten()),
        RequestKind::Tags => join(query.tags.iter().flatten()),
    };
    Ok(assemble(base_url, kind, &values))
}

/// Render the request path for an already validated query.
pub fn query_path(base_url: &str, query: &Query) -> String {
    let values = match query {
        Query::Ids(ids) => join(ids),
        Query::Names(names) => join(names),
        Query::Tags(tags) => join(tags),
    };
    assemble(base_url, query.kind(), &values)
}

fn assemble(base_url: &str, kind: RequestKind, values: &str) -> String {
    let mut path = String::with_capacity(base_url.len() + kind.segment().len() + values.len() + 2);
    path.push_str(base_url);
    if !base_url.is_empty() && !base_url.ends_with(SEPARATOR) {
        path.push_str(SEPARATOR);
    }
    path.push_str(kind.segment());
    path.push_str(SEPARATOR);
    path.push_str(values);
    path
}

fn join<T: Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

// ---------------------------------------------------------------------------
// Fixed endpoints
// ---------------------------------------------------------------------------

/// `<origin>/api/content/`, keeping any path prefix on the origin.
pub fn content_root(origin: &Url) -> Result<Url> {
    join_origin(origin, CONTENT_API_PATH)
}

/// `<origin>/api/errors`.
pub fn errors_endpoint(origin: &Url) -> Result<Url> {
    join_origin(origin, ERRORS_API_PATH)
}

/// `<root><id>` for single-chunk operations.
pub fn item_path(content_root: &Url, id: ChunkId) -> String {
    format!("{content_root}{id}")
}

fn join_origin(origin: &Url, relative: &str) -> Result<Url> {
    let mut base = origin.clone();
    if !base.path().ends_with(SEPARATOR) {
        let path = format!("{}{SEPARATOR}", base.path());
        base.set_path(&path);
    }
    base.join(relative)
        .map_err(|e| BlackstarError::validation(format!("cannot resolve {relative} on {origin}: {e}")))
}
