//! Error types for the interaction mux.
//!
//! [`MuxError`] is the vocabulary handed to the failure hooks registered on
//! [`MuxBase`](crate::MuxBase). [`RegistrationError`] reports misuse of the
//! builder and is meant to abort startup. [`DispatchError`] covers failures
//! while running a matched handler, all of which surface as a bare 500.

use std::sync::Arc;

use axum::http::Request;
use axum::response::Response;
use bytes::Bytes;
use thiserror::Error;

use crate::event::InteractionType;

/// Error returned by user-supplied handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Failure hook invoked with the original request and the condition that
/// stopped dispatch. The returned response is sent as-is.
pub type ErrorHandlerFn = Arc<dyn Fn(&Request<Bytes>, &MuxError) -> Response + Send + Sync>;

/// Conditions routed to the failure hooks.
///
/// # Examples
///
/// ```
/// use slackmux::MuxError;
///
/// let err = MuxError::NoMatchingHandler;
/// assert_eq!(err.to_string(), "no matching handler");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MuxError {
    /// The form body or its `payload` field could not be decoded.
    #[error("payload parse error: {0}")]
    Parse(String),

    /// The request signature did not verify.
    #[error("request verification failed: {0}")]
    Verification(String),

    /// No handler is registered for the event.
    #[error("no matching handler")]
    NoMatchingHandler,
}

/// Misuse of [`InteractionMuxBuilder`](crate::InteractionMuxBuilder).
///
/// These are programmer errors: a router with a broken table must never
/// serve traffic, so callers are expected to propagate this out of `main`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("slack interaction mux: empty action id")]
    EmptyActionId,

    #[error("slack interaction mux: empty interaction type")]
    EmptyInteractionType,

    #[error("slack interaction mux: multiple registration for action {0}")]
    DuplicateActionId(String),

    #[error(
        "slack interaction mux: multiple registration for {interaction_type} callback {callback_id:?}"
    )]
    DuplicateCallbackId {
        interaction_type: InteractionType,
        callback_id: String,
    },
}

/// Failure while running a matched handler or relaying its result.
#[derive(Debug, Error)]
pub(crate) enum DispatchError {
    #[error("handler failed: {0}")]
    Handler(HandlerError),

    #[error("cannot encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("relay to response_url failed: {0}")]
    Relay(#[from] reqwest::Error),
}
