//! Request shaping and response shaping for the Blackstar content API.
//!
//! This crate holds the pure, synchronous part of the client:
//! - [`query`] — raw query validation and request-kind classification
//! - [`path`] — wire path construction for each request kind
//! - [`collection`] — lookup helpers over fetched chunk collections

pub mod collection;
pub mod path;
pub mod query;

pub use collection::{Collection, Enrich, enrich};
pub use path::{build_path, content_root, errors_endpoint, item_path, query_path};
pub use query::{Query, RawQuery, RequestKind, classify};
