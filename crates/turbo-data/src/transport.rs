//! Transports that put a [`Request`] on the wire.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{FetchError, Method, Request, Response};

/// Sends a request and returns the raw response.
///
/// Non-2xx statuses are returned as responses, not errors. Only failures to
/// complete the exchange (connect, timeout, bad URL) are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, FetchError>;
}

/// Transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("turbo-data/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response, FetchError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().await?.to_vec();

        debug!(method = %request.method, url = %request.url, status, "response received");
        Ok(Response::new(status, headers, body))
    }
}

/// Scripted transport for tests.
pub mod mock {
    use super::*;

    struct Reply {
        result: Result<Response, FetchError>,
        delay: Option<Duration>,
    }

    struct Route {
        method: Method,
        path: String,
        replies: VecDeque<Reply>,
        sticky: Option<(u16, Vec<u8>)>,
    }

    /// A transport that answers from a table of routes and records every
    /// request it receives.
    ///
    /// Each route holds a queue of one-shot replies followed by an optional
    /// sticky reply that answers forever. Requests to an unknown route get a
    /// 404. A reply is picked when the request arrives, so per-reply delays
    /// can make responses arrive in a different order than their requests.
    #[derive(Default)]
    pub struct MockTransport {
        routes: Mutex<Vec<Route>>,
        log: Mutex<Vec<Request>>,
        delay: Mutex<Option<Duration>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn with_route<F: FnOnce(&mut Route)>(&self, method: Method, path: &str, f: F) {
            let mut routes = lock(&self.routes);
            if let Some(route) = routes
                .iter_mut()
                .find(|r| r.method == method && r.path == path)
            {
                f(route);
                return;
            }
            let mut route = Route {
                method,
                path: path.to_string(),
                replies: VecDeque::new(),
                sticky: None,
            };
            f(&mut route);
            routes.push(route);
        }

        /// Always answer `method path` with `status` and a JSON body.
        pub fn respond(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
            self.with_route(method, path, |route| {
                route.sticky = Some((status, body.to_string().into_bytes()));
            });
        }

        /// Answer the next request to `method path` once.
        pub fn respond_once(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
            self.push_reply(method, path, Ok(Response::json_body(status, &body)), None);
        }

        /// Answer the next request to `method path` once, `delay` after it
        /// arrives.
        pub fn respond_once_after(
            &self,
            method: Method,
            path: &str,
            delay: Duration,
            status: u16,
            body: serde_json::Value,
        ) {
            self.push_reply(method, path, Ok(Response::json_body(status, &body)), Some(delay));
        }

        /// Fail the next request to `method path` once with a transport error.
        pub fn fail_once(&self, method: Method, path: &str, error: FetchError) {
            self.push_reply(method, path, Err(error), None);
        }

        fn push_reply(
            &self,
            method: Method,
            path: &str,
            result: Result<Response, FetchError>,
            delay: Option<Duration>,
        ) {
            self.with_route(method, path, |route| {
                route.replies.push_back(Reply { result, delay })
            });
        }

        fn next_reply(&self, method: Method, path: &str) -> Reply {
            let mut routes = lock(&self.routes);
            let route = routes
                .iter_mut()
                .find(|r| r.method == method && r.path == path);
            let result = match route {
                Some(route) => match route.replies.pop_front() {
                    Some(reply) => return reply,
                    None => match &route.sticky {
                        Some((status, body)) => {
                            Ok(Response::new(*status, HashMap::new(), body.clone()))
                        }
                        None => Ok(not_found()),
                    },
                },
                None => Ok(not_found()),
            };
            Reply {
                result,
                delay: None,
            }
        }

        /// Delay every reply by `delay`.
        pub fn set_delay(&self, delay: Duration) {
            *lock(&self.delay) = Some(delay);
        }

        /// Every request received so far.
        pub fn requests(&self) -> Vec<Request> {
            lock(&self.log).clone()
        }

        /// Number of requests received for `method path`.
        pub fn count(&self, method: Method, path: &str) -> usize {
            lock(&self.log)
                .iter()
                .filter(|r| r.method == method && r.path() == path)
                .count()
        }
    }

    fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: Request) -> Result<Response, FetchError> {
            let path = request.path().to_string();
            let method = request.method;
            lock(&self.log).push(request);

            let reply = self.next_reply(method, &path);
            let delay = reply.delay.or(*lock(&self.delay));
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            reply.result
        }
    }

    fn not_found() -> Response {
        Response::new(404, HashMap::new(), b"Not Found".to_vec())
    }
}
