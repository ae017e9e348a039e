//! Sends a built request and decodes the response into the caller's type.
//!
//! Status handling is deliberately coarse: any status outside 200..=299, and
//! any failure to get a response at all, becomes `ApiError::ServerOffline`.
//! The body of an unsuccessful response is never inspected.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::decode::Decoder;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{shared_transport, Transport};

#[derive(Debug, Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    decoder: Decoder,
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new(shared_transport())
    }
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            decoder: Decoder::default(),
        }
    }

    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn decoder(&self) -> Decoder {
        self.decoder
    }

    /// Send `request` and decode a successful body as `T`.
    #[tracing::instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn execute<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        let body = self.execute_raw(request).await?;
        self.decoder.decode(&body).inspect_err(|e| {
            debug!(error = ?e, "response body did not match the target type");
        })
    }

    /// Send `request` and return the body of a successful response undecoded.
    pub async fn execute_raw(&self, request: HttpRequest) -> Result<Vec<u8>, ApiError> {
        debug!("dispatching request");
        let response = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "no HTTP response");
            ApiError::ServerOffline { status: None }
        })?;
        validate(response)
    }
}

/// Accept only 2xx responses, handing back their body.
pub fn validate(response: HttpResponse) -> Result<Vec<u8>, ApiError> {
    if response.is_success() {
        debug!(status = response.status, "request succeeded");
        Ok(response.body)
    } else {
        warn!(status = response.status, "unsuccessful status");
        Err(ApiError::ServerOffline {
            status: Some(response.status),
        })
    }
}
