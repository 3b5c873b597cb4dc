//! HTTP client utilities for TurboCommerce.
//!
//! Provides a small async API for talking to the storefront backend with
//! automatic JSON handling. The wire is abstracted behind [`Transport`] so
//! the same client runs against `reqwest` in production and against
//! [`mock::MockTransport`] in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use turbo_data::{FetchClient, ReqwestTransport};
//!
//! let transport = ReqwestTransport::new(Duration::from_secs(10))?;
//! let client = FetchClient::new(transport)
//!     .with_base_url("https://api.example.com")
//!     .with_default_header("Accept", "application/json");
//!
//! let banners: serde_json::Value = client.get("/banners").send().await?.json()?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

mod error;
mod request;
mod response;
mod transport;

pub use error::FetchError;
pub use request::{Method, Request};
pub use response::Response;
pub use transport::{mock, ReqwestTransport, Transport};

/// HTTP client for making outbound requests.
///
/// Cloning is cheap and clones share the transport.
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    base_url: Option<String>,
    default_headers: BTreeMap<String, String>,
}

impl FetchClient {
    /// Create a new HTTP client over `transport`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Create a client over a transport that is shared elsewhere.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: None,
            default_headers: BTreeMap::new(),
        }
    }

    /// Create a client with a base URL that will be prepended to all requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Post, url)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder {
        let url = url.into();
        let full_url = match &self.base_url {
            Some(base) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                format!("{}{}", base.trim_end_matches('/'), url)
            }
            _ => url,
        };

        let mut request = Request::new(method, full_url);
        for (key, value) in &self.default_headers {
            request = request.header(key.clone(), value.clone());
        }

        ClientRequestBuilder {
            transport: Arc::clone(&self.transport),
            request,
        }
    }
}

/// A request bound to a client's transport.
pub struct ClientRequestBuilder {
    transport: Arc<dyn Transport>,
    request: Request,
}

impl ClientRequestBuilder {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.header(key, value);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Result<Self, FetchError> {
        self.request = self.request.json(value)?;
        Ok(self)
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(mut self, token: impl AsRef<str>) -> Self {
        self.request = self.request.bearer_auth(token);
        self
    }

    /// The request as it will be sent.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Send the request and return the response.
    pub async fn send(self) -> Result<Response, FetchError> {
        tracing::trace!(method = %self.request.method, url = %self.request.url, "sending request");
        self.transport.send(self.request).await
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FetchClient, FetchError, Method, Response, Transport};
}
