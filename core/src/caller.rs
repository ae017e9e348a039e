//! The reusable request object.
//!
//! # Design
//! `NetworkCaller<T>` stores its construction inputs and nothing else. The
//! target type is carried as a zero-sized type handle so the caller is
//! `Send + Sync + Clone` whatever `T` is. Each [`execute`](NetworkCaller::execute)
//! builds a fresh request and performs an independent round-trip; nothing
//! is cached between calls.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::builder::RequestBuilder;
use crate::call::Call;
use crate::decode::Decoder;
use crate::error::ApiError;
use crate::executor::RequestExecutor;
use crate::http::{HttpRequest, Method, Parameters};
use crate::transport::Transport;

/// A request shape bound to the type its response decodes into.
///
/// ```no_run
/// # async fn demo() -> Result<(), network_caller::ApiError> {
/// use network_caller::{Method, NetworkCaller, Timestamp};
///
/// #[derive(serde::Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Note {
///     id: u64,
///     created_at: Timestamp,
/// }
///
/// let caller = NetworkCaller::<Vec<Note>>::new(
///     "https://api.example.com",
///     "/notes",
///     Method::Get,
///     None,
/// );
/// let notes = caller.execute().await?;
/// println!("{} notes, first created {:?}", notes.len(), notes.first().map(|n| (n.id, n.created_at)));
/// # Ok(())
/// # }
/// ```
pub struct NetworkCaller<T> {
    base_url: String,
    url_path: String,
    method: Method,
    parameters: Option<Parameters>,
    executor: RequestExecutor,
    target: PhantomData<fn() -> T>,
}

impl<T> NetworkCaller<T> {
    /// Uses the shared transport and the default decoder.
    pub fn new(
        base_url: impl Into<String>,
        url_path: impl Into<String>,
        method: Method,
        parameters: Option<Parameters>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            url_path: url_path.into(),
            method,
            parameters,
            executor: RequestExecutor::default(),
            target: PhantomData,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.executor = RequestExecutor::new(transport).with_decoder(self.executor.decoder());
        self
    }

    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.executor = self.executor.with_decoder(decoder);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    /// The request `execute` would send.
    pub fn build_request(&self) -> Result<HttpRequest, ApiError> {
        RequestBuilder::new(self.base_url.as_str()).build(
            &self.url_path,
            self.method,
            self.parameters.as_ref(),
        )
    }
}

impl<T: DeserializeOwned + Send + 'static> NetworkCaller<T> {
    /// Start a new round-trip. The returned call sends nothing until polled,
    /// and a URL that cannot be built resolves it with `ApiError::InvalidUrl`.
    #[tracing::instrument(skip(self), fields(method = %self.method, path = %self.url_path))]
    pub fn execute(&self) -> Call<T> {
        let request = self.build_request();
        let executor = self.executor.clone();
        Call::new(async move { executor.execute(request?).await })
    }
}

impl<T> Clone for NetworkCaller<T> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            url_path: self.url_path.clone(),
            method: self.method,
            parameters: self.parameters.clone(),
            executor: self.executor.clone(),
            target: PhantomData,
        }
    }
}

impl<T> fmt::Debug for NetworkCaller<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCaller")
            .field("base_url", &self.base_url)
            .field("url_path", &self.url_path)
            .field("method", &self.method)
            .field("has_parameters", &self.parameters.is_some())
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}
