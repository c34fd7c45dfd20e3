//! State shared by Slack muxes: failure hooks and the relay HTTP client.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{ErrorHandlerFn, MuxError};
use crate::verify;

/// Connect timeout of the default relay client.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total request timeout of the default relay client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the relay client used when none is supplied.
pub fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Cannot build relay client with timeouts, using reqwest defaults");
            reqwest::Client::new()
        })
}

/// Failure hooks, optional signing secret and the outbound client.
///
/// Embedded by [`InteractionMux`](crate::InteractionMux). Hook setters
/// replace any previous hook; a missing hook turns the condition into an
/// empty `200 OK`.
#[derive(Clone)]
pub struct MuxBase {
    parse_error: Option<ErrorHandlerFn>,
    verification_error: Option<ErrorHandlerFn>,
    unmatched_event: Option<ErrorHandlerFn>,
    signing_secret: Option<String>,
    http_client: reqwest::Client,
}

impl MuxBase {
    /// Creates a base with no hooks and the [default client](default_http_client).
    pub fn new() -> Self {
        Self::with_http_client(default_http_client())
    }

    /// Creates a base relaying through `client`.
    pub fn with_http_client(client: reqwest::Client) -> Self {
        Self {
            parse_error: None,
            verification_error: None,
            unmatched_event: None,
            signing_secret: None,
            http_client: client,
        }
    }

    /// Sets the hook for undecodable payloads.
    pub fn on_parse_error<F>(&mut self, handler: F)
    where
        F: Fn(&Request<Bytes>, &MuxError) -> Response + Send + Sync + 'static,
    {
        self.parse_error = Some(Arc::new(handler));
    }

    /// Sets the hook for requests whose signature does not verify.
    pub fn on_verification_error<F>(&mut self, handler: F)
    where
        F: Fn(&Request<Bytes>, &MuxError) -> Response + Send + Sync + 'static,
    {
        self.verification_error = Some(Arc::new(handler));
    }

    /// Sets the hook for events no handler is registered for.
    pub fn on_unmatched_event<F>(&mut self, handler: F)
    where
        F: Fn(&Request<Bytes>, &MuxError) -> Response + Send + Sync + 'static,
    {
        self.unmatched_event = Some(Arc::new(handler));
    }

    /// Enables signature verification of inbound requests.
    pub fn set_signing_secret(&mut self, secret: impl Into<String>) {
        self.signing_secret = Some(secret.into());
    }

    /// Replaces the relay client. The client is shared across requests.
    pub fn set_http_client(&mut self, client: reqwest::Client) {
        self.http_client = client;
    }

    /// Returns the relay client.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Checks the request signature when a signing secret is configured.
    pub(crate) fn verify(&self, request: &Request<Bytes>) -> Result<(), MuxError> {
        match &self.signing_secret {
            Some(secret) => verify::verify(
                secret,
                request.headers(),
                request.body(),
                SystemTime::now(),
            ),
            None => Ok(()),
        }
    }

    pub(crate) fn parse_failed(&self, request: &Request<Bytes>, err: MuxError) -> Response {
        respond_with(self.parse_error.as_ref(), request, err)
    }

    pub(crate) fn verification_failed(&self, request: &Request<Bytes>, err: MuxError) -> Response {
        respond_with(self.verification_error.as_ref(), request, err)
    }

    pub(crate) fn unmatched(&self, request: &Request<Bytes>) -> Response {
        respond_with(
            self.unmatched_event.as_ref(),
            request,
            MuxError::NoMatchingHandler,
        )
    }
}

fn respond_with(hook: Option<&ErrorHandlerFn>, request: &Request<Bytes>, err: MuxError) -> Response {
    match hook {
        Some(hook) => hook(request, &err),
        None => {
            debug!(error = %err, "No hook registered, swallowing");
            StatusCode::OK.into_response()
        }
    }
}

impl fmt::Debug for MuxBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MuxBase")
            .field("parse_error", &self.parse_error.is_some())
            .field("verification_error", &self.verification_error.is_some())
            .field("unmatched_event", &self.unmatched_event.is_some())
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl Default for MuxBase {
    fn default() -> Self {
        Self::new()
    }
}
