//! Collaborator hooks invoked by [`BlackstarClient`](crate::BlackstarClient).

use blackstar_core::Collection;

/// Called when the server rejects a request with 401.
///
/// The hook runs before the request fails with
/// [`BlackstarError::Unauthorized`](blackstar_shared::BlackstarError::Unauthorized);
/// it is where callers start their own re-authentication.
pub trait AuthHook: Send + Sync {
    fn on_unauthorized(&self, url: &str);
}

impl<F> AuthHook for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_unauthorized(&self, url: &str) {
        self(url)
    }
}

/// Receives every collection returned by `get` / `get_all`.
///
/// Binders render or attach content somewhere (a terminal, a template,
/// a UI). The lookup layer never calls them.
pub trait ContentBinder: Send + Sync {
    fn bind(&self, chunks: &Collection);
}
