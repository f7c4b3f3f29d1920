//! GraphQL query execution with lazy pagination and bounded retries.

use super::connection::Connection;
use super::retry::{self, GRAPHQL_RATE_LIMITED, RetryPolicy};
use crate::config::Config;
use crate::progress::RequestTracker;
use crate::{Error, NetworkError, Result};
use chrono::Utc;
use futures::Stream;
use futures::stream;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use url::Url;

/// Log target for the GraphQL client
pub(crate) const LOG_TARGET: &str = "github";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Longest response excerpt kept in error messages.
const MAX_BODY_EXCERPT: usize = 512;

/// An authenticated client for the GraphQL API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    token: Arc<str>,
    page_size: u32,
    retry: RetryPolicy,
    tracker: Option<RequestTracker>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Value>,

    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,

    #[serde(default)]
    path: Vec<Value>,
}

impl GraphQlErrorEntry {
    /// Errors scoped to a single connection node leave that node `null` and the rest of the page intact.
    fn is_node_level(&self) -> bool {
        self.path.iter().any(|segment| segment.as_str() == Some("nodes"))
    }
}

/// Outcome of a single failed attempt.
enum Failure {
    Retry(NetworkError),
    Fatal(Error),
}

impl Client {
    pub fn new(config: &Config, token: impl Into<Arc<str>>, tracker: Option<RequestTracker>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()
            .map_err(NetworkError::Transport)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            token: token.into(),
            page_size: config.page_size,
            retry: RetryPolicy::from_config(config),
            tracker,
        })
    }

    /// Run a query and decode its `data` payload.
    ///
    /// Rate limits and transient failures are retried according to the retry
    /// policy. `category` names the request for progress reporting.
    pub async fn query<T: DeserializeOwned>(&self, category: &str, document: &str, variables: &Map<String, Value>) -> Result<T> {
        if let Some(tracker) = &self.tracker {
            tracker.add_request(category);
        }

        let result = self.query_with_retry(document, variables).await;

        if let Some(tracker) = &self.tracker {
            tracker.complete_request(category);
        }

        result
    }

    /// Lazily walk every page of a connection.
    ///
    /// `extract` pulls the connection out of each decoded response; returning
    /// `None` (for example when a repository has no default branch) ends the
    /// stream. No request is made until the stream is polled, and dropping the
    /// stream stops further requests. Each call starts again from the first page.
    pub fn paginate<'a, T, N, F>(
        &'a self,
        category: &'a str,
        document: &'a str,
        variables: Map<String, Value>,
        extract: F,
    ) -> impl Stream<Item = Result<Vec<N>>> + 'a
    where
        T: DeserializeOwned + 'a,
        N: 'a,
        F: Fn(T) -> Option<Connection<N>> + 'a,
    {
        let extract = Arc::new(extract);

        // `None` once the last page has been produced, `Some(cursor)` otherwise.
        stream::try_unfold(Some(None::<String>), move |state| {
            let extract = Arc::clone(&extract);
            let variables = variables.clone();
            async move {
                match state {
                    None => Ok(None),
                    Some(cursor) => self
                        .fetch_page(category, document, variables, cursor, extract.as_ref())
                        .await
                        .map(Some),
                }
            }
        })
    }

    async fn fetch_page<T, N, F>(
        &self,
        category: &str,
        document: &str,
        mut variables: Map<String, Value>,
        cursor: Option<String>,
        extract: &F,
    ) -> Result<(Vec<N>, Option<Option<String>>)>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Option<Connection<N>>,
    {
        let _ = variables.insert("pageSize".to_string(), Value::from(self.page_size));
        let _ = variables.insert("cursor".to_string(), cursor.clone().map_or(Value::Null, Value::String));

        let data: T = self.query(category, document, &variables).await?;
        let Some(connection) = extract(data) else {
            return Ok((Vec::new(), None));
        };

        let (nodes, next) = connection.into_parts();
        let next = match next {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                log::warn!(target: LOG_TARGET, "Server returned the same {category} cursor twice, stopping pagination");
                None
            }
            Some(next) => Some(Some(next)),
            None => None,
        };

        Ok((nodes, next))
    }

    async fn query_with_retry<T: DeserializeOwned>(&self, document: &str, variables: &Map<String, Value>) -> Result<T> {
        let body = json!({ "query": document, "variables": variables });
        let mut attempt = 0;

        loop {
            let error = match self.send(&body).await {
                Ok(data) => return serde_json::from_value(data).map_err(Into::into),
                Err(Failure::Fatal(e)) => return Err(e),
                Err(Failure::Retry(e)) => e,
            };

            if attempt >= self.retry.max_retries {
                return Err(Error::RetriesExhausted {
                    attempts: attempt + 1,
                    last: error,
                });
            }

            let Some(delay) = self.retry.delay_for(&error, attempt) else {
                log::warn!(target: LOG_TARGET, "Not waiting for the rate limit to reset: {error}");
                return Err(error.into());
            };

            log::warn!(
                target: LOG_TARGET,
                "Request failed ({error}), retrying in {:.3}s (attempt {} of {})",
                delay.as_secs_f64(),
                attempt + 1,
                self.retry.max_retries
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send(&self, body: &Value) -> core::result::Result<Value, Failure> {
        let start_time = std::time::Instant::now();

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(transport_failure)?;

        log::trace!(target: LOG_TARGET, "HTTP {status} in {:.3}s", start_time.elapsed().as_secs_f64());

        if status == StatusCode::UNAUTHORIZED {
            return Err(Failure::Fatal(Error::Authentication(
                "the API rejected the access token (HTTP 401)".to_string(),
            )));
        }

        if let Some(wait) = retry::rate_limit_wait(status, &headers, &text, Utc::now()) {
            return Err(Failure::Retry(NetworkError::RateLimited { wait }));
        }

        if !status.is_success() {
            let error = NetworkError::Status {
                status: status.as_u16(),
                body: excerpt(&text),
            };
            return Err(if status.is_server_error() {
                Failure::Retry(error)
            } else {
                Failure::Fatal(error.into())
            });
        }

        let envelope: Envelope = serde_json::from_str(&text).map_err(|e| Failure::Fatal(e.into()))?;

        if let Some(first) = envelope.errors.first() {
            if envelope.errors.iter().any(|e| e.kind.as_deref() == Some(GRAPHQL_RATE_LIMITED)) {
                return Err(Failure::Retry(NetworkError::RateLimited {
                    wait: retry::requested_wait(&headers, Utc::now()),
                }));
            }

            let message = envelope.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ");

            if let Some(data) = envelope.data
                && !data.is_null()
                && envelope.errors.iter().all(GraphQlErrorEntry::is_node_level)
            {
                log::warn!(target: LOG_TARGET, "Skipping {} inaccessible item(s): {message}", envelope.errors.len());
                return Ok(data);
            }

            return Err(Failure::Fatal(Error::GraphQl {
                kind: first.kind.clone(),
                message,
            }));
        }

        envelope.data.ok_or_else(|| {
            Failure::Fatal(Error::GraphQl {
                kind: None,
                message: "response contained no data".to_string(),
            })
        })
    }
}

fn transport_failure(error: reqwest::Error) -> Failure {
    if error.is_builder() {
        Failure::Fatal(NetworkError::Transport(error).into())
    } else {
        Failure::Retry(NetworkError::Transport(error))
    }
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() > MAX_BODY_EXCERPT {
        format!("{}...", text.chars().take(MAX_BODY_EXCERPT).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct ViewerData {
        viewer: ViewerLogin,
    }

    #[derive(Debug, Deserialize)]
    struct ViewerLogin {
        login: String,
    }

    #[derive(Debug, Deserialize)]
    struct ItemsData {
        items: Connection<u32>,
    }

    fn viewer_body() -> Value {
        json!({ "data": { "viewer": { "login": "octo" } } })
    }

    fn client_for(server: &MockServer) -> Client {
        Client::new(&Config::for_mock_server(&server.uri()), "secret", None).unwrap()
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_query_sends_bearer_token_and_decodes_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer secret"))
            .and(body_string_contains("query ViewerIdentity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(viewer_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let data: ViewerData = client
            .query("identity", "query ViewerIdentity { viewer { login } }", &Map::new())
            .await
            .unwrap();
        assert_eq!(data.viewer.login, "octo");
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(viewer_body()))
            .with_priority(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let data: ViewerData = client.query("identity", "query { viewer { login } }", &Map::new()).await.unwrap();
        assert_eq!(data.viewer.login, "octo");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_graphql_rate_limited_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "type": "RATE_LIMITED", "message": "API rate limit exceeded" }]
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(viewer_body()))
            .with_priority(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let data: ViewerData = client.query("identity", "query { viewer { login } }", &Map::new()).await.unwrap();
        assert_eq!(data.viewer.login, "octo");
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_server_errors_exhaust_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .query::<ViewerData>("identity", "query { viewer { login } }", &Map::new())
            .await
            .unwrap_err();

        match err {
            Error::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, NetworkError::Status { status: 502, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_excessive_rate_limit_wait_is_not_honored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "86400"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .query::<ViewerData>("identity", "query { viewer { login } }", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(NetworkError::RateLimited { .. })));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .query::<ViewerData>("identity", "query { viewer { login } }", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_graphql_errors_are_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": null },
                "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a Repository" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .query::<Value>("commits", "query { repository { id } }", &Map::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Could not resolve"));
    }

    async fn mount_two_pages(server: &MockServer, walks: u64) {
        Mock::given(method("POST"))
            .and(body_string_contains(r#""cursor":null"#))
            .and(body_string_contains(r#""pageSize":50"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "items": { "pageInfo": { "hasNextPage": true, "endCursor": "c1" }, "nodes": [1, 2] } }
            })))
            .expect(walks)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#""cursor":"c1""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "items": { "pageInfo": { "hasNextPage": false, "endCursor": "c2" }, "nodes": [3] } }
            })))
            .expect(walks)
            .mount(server)
            .await;
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_paginate_follows_cursors_lazily() {
        let server = MockServer::start().await;
        mount_two_pages(&server, 1).await;

        let client = client_for(&server);
        let pages = client.paginate("items", "query Items", Map::new(), |data: ItemsData| Some(data.items));
        assert!(server.received_requests().await.unwrap().is_empty());

        let pages: Vec<Vec<u32>> = pages.try_collect().await.unwrap();
        assert_eq!(pages, [vec![1, 2], vec![3]]);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_paginate_restarts_per_call() {
        let server = MockServer::start().await;
        mount_two_pages(&server, 2).await;

        let client = client_for(&server);
        for _ in 0..2 {
            let pages: Vec<Vec<u32>> = client
                .paginate("items", "query Items", Map::new(), |data: ItemsData| Some(data.items))
                .try_collect()
                .await
                .unwrap();
            assert_eq!(pages.concat(), [1, 2, 3]);
        }
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_paginate_stops_when_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#""cursor":null"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "items": { "pageInfo": { "hasNextPage": true, "endCursor": "c1" }, "nodes": [1] } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#""cursor":"c1""#))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut pages = core::pin::pin!(client.paginate("items", "query Items", Map::new(), |data: ItemsData| Some(data.items)));
        let first = pages.try_next().await.unwrap();
        assert_eq!(first, Some(vec![1]));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_paginate_stops_when_extract_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "items": null } })))
            .expect(1)
            .mount(&server)
            .await;

        #[derive(Debug, Deserialize)]
        struct MaybeItems {
            items: Option<Connection<u32>>,
        }

        let client = client_for(&server);
        let pages: Vec<Vec<u32>> = client
            .paginate("items", "query Items", Map::new(), |data: MaybeItems| data.items)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(pages, [Vec::<u32>::new()]);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_node_level_errors_keep_the_rest_of_the_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "items": { "pageInfo": { "hasNextPage": false, "endCursor": null }, "nodes": [1, null, 3] } },
                "errors": [{
                    "type": "FORBIDDEN",
                    "path": ["items", "nodes", 1],
                    "message": "`acme` forbids access via a personal access token (classic)."
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let pages: Vec<Vec<u32>> = client
            .paginate("items", "query Items", Map::new(), |data: ItemsData| Some(data.items))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(pages, [vec![1, 3]]);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_errors_outside_nodes_are_fatal_even_with_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "viewer": { "login": "octo" } },
                "errors": [{ "type": "FORBIDDEN", "path": ["viewer", "email"], "message": "no access to email" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .query::<ViewerData>("identity", "query { viewer { login email } }", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GraphQl { kind: Some(ref kind), .. } if kind == "FORBIDDEN"));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort")]
    async fn test_paginate_stops_on_repeated_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#""cursor":null"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "items": { "pageInfo": { "hasNextPage": true, "endCursor": "c1" }, "nodes": [1] } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(r#""cursor":"c1""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "items": { "pageInfo": { "hasNextPage": true, "endCursor": "c1" }, "nodes": [2] } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let pages: Vec<Vec<u32>> = client
            .paginate("items", "query Items", Map::new(), |data: ItemsData| Some(data.items))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(pages, [vec![1], vec![2]]);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(MAX_BODY_EXCERPT + 10);
        let short = excerpt(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.len(), MAX_BODY_EXCERPT + 3);
        assert_eq!(excerpt("  hi \n"), "hi");
    }
}
