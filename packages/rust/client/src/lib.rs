//! HTTP client for the Blackstar content API.
//!
//! Queries are validated up front ([`Query::from_raw`]), so an invalid
//! query never produces a request. List responses are decoded and wrapped
//! in a [`Collection`] before they are handed back.

mod hooks;

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;

use blackstar_core::{Collection, Query, content_root, enrich, errors_endpoint, item_path, query_path};
use blackstar_shared::{BlackstarError, Chunk, ChunkId, ClientConfig, ErrorReport, NewChunk, Result};

pub use hooks::{AuthHook, ContentBinder};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("blackstar/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// BlackstarClient
// ---------------------------------------------------------------------------

/// Client for one Blackstar server.
///
/// Cookies set by the server are kept for the client's lifetime and sent
/// with every request.
#[derive(Clone)]
pub struct BlackstarClient {
    http: Client,
    origin: Url,
    content_root: Url,
    token: Option<String>,
    auth_hook: Option<Arc<dyn AuthHook>>,
    binder: Option<Arc<dyn ContentBinder>>,
}

impl std::fmt::Debug for BlackstarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlackstarClient")
            .field("origin", &self.origin.as_str())
            .field("has_token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl BlackstarClient {
    /// Create a client from runtime configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| BlackstarError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            content_root: content_root(&config.base_url)?,
            origin: config.base_url.clone(),
            token: config.token.clone(),
            auth_hook: None,
            binder: None,
        })
    }

    /// Run `hook` whenever the server answers 401.
    pub fn with_auth_hook(mut self, hook: Arc<dyn AuthHook>) -> Self {
        self.auth_hook = Some(hook);
        self
    }

    /// Hand every fetched collection to `binder`.
    pub fn with_binder(mut self, binder: Arc<dyn ContentBinder>) -> Self {
        self.binder = Some(binder);
        self
    }

    /// A copy of this client that does not notify the binder.
    ///
    /// Shares the HTTP client, so cookies and auth stay the same.
    pub fn without_binder(&self) -> Self {
        Self {
            binder: None,
            ..self.clone()
        }
    }

    /// `<origin>/api/content/`.
    pub fn content_root(&self) -> &Url {
        &self.content_root
    }

    // -----------------------------------------------------------------------
    // Content operations
    // -----------------------------------------------------------------------

    /// Fetch the chunks selected by `query`.
    #[instrument(skip_all, fields(kind = %query.kind(), values = query.len()))]
    pub async fn get(&self, query: &Query) -> Result<Collection> {
        let url = query_path(self.content_root.as_str(), query);
        self.fetch_collection(&url).await
    }

    /// Fetch every chunk on the server.
    #[instrument(skip_all)]
    pub async fn get_all(&self) -> Result<Collection> {
        let url = self.content_root.to_string();
        self.fetch_collection(&url).await
    }

    /// Store a new chunk and return it as saved by the server.
    #[instrument(skip_all, fields(name = %chunk.name))]
    pub async fn create(&self, chunk: &NewChunk) -> Result<Chunk> {
        let url = self.content_root.to_string();
        info!(%url, "creating chunk");

        let response = self.send(self.request(Method::POST, &url).json(chunk), &url).await?;
        decode(response, &url).await
    }

    /// Replace a stored chunk and return it as saved by the server.
    #[instrument(skip_all, fields(id = %chunk.id))]
    pub async fn update(&self, chunk: &Chunk) -> Result<Chunk> {
        let url = item_path(&self.content_root, chunk.id);
        info!(%url, "updating chunk");

        let response = self.send(self.request(Method::PUT, &url).json(chunk), &url).await?;
        decode(response, &url).await
    }

    /// Delete a stored chunk.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: ChunkId) -> Result<()> {
        let url = item_path(&self.content_root, id);
        info!(%url, "deleting chunk");

        self.send(self.request(Method::DELETE, &url), &url).await?;
        Ok(())
    }

    /// Post an error report to the server.
    ///
    /// Reporting is best effort: failures are logged and swallowed.
    #[instrument(skip_all)]
    pub async fn report_error(&self, report: &ErrorReport) {
        let url = match errors_endpoint(&self.origin) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(error = %e, "cannot resolve error endpoint");
                return;
            }
        };

        match self.send(self.request(Method::POST, &url).json(report), &url).await {
            Ok(_) => debug!(%url, "error report delivered"),
            Err(e) => warn!(%url, error = %e, "error report not delivered"),
        }
    }

    // -----------------------------------------------------------------------
    // Transport helpers
    // -----------------------------------------------------------------------

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response> {
        debug!(%url, "sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| BlackstarError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(%url, "server rejected credentials");
            if let Some(hook) = &self.auth_hook {
                hook.on_unauthorized(url);
            }
            return Err(BlackstarError::Unauthorized { url: url.to_string() });
        }

        if !status.is_success() {
            warn!(%url, %status, "request failed");
            return Err(BlackstarError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    async fn fetch_collection(&self, url: &str) -> Result<Collection> {
        let response = self.send(self.request(Method::GET, url), url).await?;
        let chunks: Vec<Chunk> = decode(response, url).await?;
        debug!(count = chunks.len(), "decoded chunks");

        let collection = enrich(chunks);
        if let Some(binder) = &self.binder {
            binder.bind(&collection);
        }
        Ok(collection)
    }
}

/// Read the body and decode it as JSON.
async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| BlackstarError::Network(format!("{url}: failed to read body: {e}")))?;

    serde_json::from_str(&body).map_err(|e| BlackstarError::Decode(format!("{url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use blackstar_core::RawQuery;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn index_page() -> serde_json::Value {
        json!([
            { "id": 6, "tags": ["index-page"], "name": "index-heading", "value": "Hello" },
            { "id": 7, "tags": ["index-page"], "name": "index-title", "value": "Home" },
            { "id": 8, "tags": ["index-page"], "name": "index-content", "value": "..." },
            { "id": 9, "tags": ["index-page"], "name": "index-footer", "value": "(c)" }
        ])
    }

    fn client_for(server: &MockServer) -> BlackstarClient {
        let config = ClientConfig::new(&server.uri()).expect("client config");
        BlackstarClient::new(&config).expect("build client")
    }

    #[test]
    fn content_root_is_under_api() {
        let config = ClientConfig::new("http://h").unwrap();
        let client = BlackstarClient::new(&config).unwrap();
        assert_eq!(client.content_root().as_str(), "http://h/api/content/");
    }

    #[tokio::test]
    async fn get_by_ids_hits_wire_path_and_enriches() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/content/byids/29/30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 29, "name": "a", "tags": [] },
                { "id": 30, "name": "b", "tags": ["x"] }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let chunks = client_for(&server).get(&Query::ids([29, 30])).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.by_id(ChunkId(30)).map(|c| c.name.as_str()), Some("b"));
        assert_eq!(chunks.by_tag("x").len(), 1);
    }

    #[tokio::test]
    async fn get_by_tags_returns_lookup_ready_collection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/content/bytags/index-page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(index_page()))
            .mount(&server)
            .await;

        let chunks = client_for(&server)
            .get(&Query::tags(["index-page"]))
            .await
            .unwrap();

        assert_eq!(chunks.by_name("index-heading").map(|c| c.id), Some(ChunkId(6)));
        assert_eq!(chunks.by_tag("index-page").len(), 4);
        assert!(chunks.by_id(ChunkId(99)).is_none());
    }

    #[tokio::test]
    async fn ambiguous_raw_query_never_reaches_server() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let raw = RawQuery::default().with_ids([1, 2]).with_tags(["a"]);
        let result = match Query::from_raw(raw) {
            Ok(query) => client.get(&query).await.map(|_| ()),
            Err(e) => Err(e),
        };

        assert!(matches!(result, Err(BlackstarError::AmbiguousQuery)));
        // MockServer verifies `expect(0)` on drop.
    }

    #[tokio::test]
    async fn get_all_uses_content_root() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/content/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(index_page()))
            .mount(&server)
            .await;

        let chunks = client_for(&server).get_all().await.unwrap();
        assert_eq!(chunks.len(), 4);
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/content/"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let config = ClientConfig::new(&server.uri()).unwrap().with_token("s3cret");
        let client = BlackstarClient::new(&config).unwrap();
        assert!(client.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_runs_auth_hook() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let client = client_for(&server).with_auth_hook(Arc::new(move |_url: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let err = client.get(&Query::names(["index-title"])).await.unwrap_err();
        assert!(matches!(err, BlackstarError::Unauthorized { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_maps_to_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).get_all().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"a list\"}"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_all().await.unwrap_err();
        assert!(matches!(err, BlackstarError::Decode(_)));
    }

    #[tokio::test]
    async fn create_posts_new_chunk() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/content/"))
            .and(body_json(json!({ "name": "promo", "tags": ["home"], "value": "Sale!" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12, "name": "promo", "tags": ["home"], "value": "Sale!"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let new_chunk = NewChunk {
            name: "promo".into(),
            tags: vec!["home".into()],
            value: json!("Sale!"),
        };
        let saved = client_for(&server).create(&new_chunk).await.unwrap();
        assert_eq!(saved.id, ChunkId(12));
    }

    #[tokio::test]
    async fn update_puts_to_item_path() {
        let server = MockServer::start().await;

        let chunk_json = json!({ "id": 7, "name": "index-title", "tags": ["index-page"], "value": "New" });
        Mock::given(method("PUT"))
            .and(path("/api/content/7"))
            .and(body_json(chunk_json.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(chunk_json.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let chunk: Chunk = serde_json::from_value(chunk_json).unwrap();
        let saved = client_for(&server).update(&chunk).await.unwrap();
        assert_eq!(saved, chunk);
    }

    #[tokio::test]
    async fn delete_hits_item_path() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/content/9"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete(ChunkId(9)).await.unwrap();
    }

    #[tokio::test]
    async fn report_error_swallows_failures() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/errors"))
            .and(body_json(json!({ "message": "boom", "source": "test" })))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .report_error(&ErrorReport::new("boom").with_source("test"))
            .await;
    }

    struct RecordingBinder {
        seen: Mutex<Vec<usize>>,
    }

    impl ContentBinder for RecordingBinder {
        fn bind(&self, chunks: &Collection) {
            self.seen.lock().unwrap().push(chunks.len());
        }
    }

    #[tokio::test]
    async fn binder_sees_fetched_collections() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/content/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(index_page()))
            .mount(&server)
            .await;

        let binder = Arc::new(RecordingBinder {
            seen: Mutex::new(Vec::new()),
        });
        let client = client_for(&server).with_binder(binder.clone());

        client.get_all().await.unwrap();
        assert_eq!(*binder.seen.lock().unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn without_binder_skips_notification() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/content/byids/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 7, "name": "index-title", "tags": ["index-page"] }
            ])))
            .mount(&server)
            .await;

        let binder = Arc::new(RecordingBinder {
            seen: Mutex::new(Vec::new()),
        });
        let client = client_for(&server).with_binder(binder.clone());

        let quiet = client.without_binder();
        assert_eq!(quiet.get(&Query::ids([7])).await.unwrap().len(), 1);
        assert!(binder.seen.lock().unwrap().is_empty());

        client.get(&Query::ids([7])).await.unwrap();
        assert_eq!(*binder.seen.lock().unwrap(), vec![1]);
    }
}
