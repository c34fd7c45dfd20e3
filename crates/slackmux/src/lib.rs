//! Slack interaction mux
//!
//! Routes Slack interaction webhooks (`block_actions` and `view_submission`)
//! to handlers registered by action id or by view callback id, and relays
//! handler output back to Slack.
//!
//! # Architecture
//!
//! - [`InteractionMuxBuilder`] collects handlers and failure hooks at startup
//! - [`InteractionMux`] classifies requests, looks up handlers and dispatches
//! - [`MuxBase`] holds the failure hooks and the shared relay client
//! - [`InteractionCallback`] is the decoded `payload` form field
//! - [`WebhookMessage`] / [`ViewSubmissionResponse`] are what handlers return
//! - [`verify`] checks `X-Slack-Signature` when a signing secret is set
//!
//! # Usage
//!
//! ```no_run
//! use slackmux::{InteractionMux, WebhookMessage};
//!
//! # async fn serve() -> Result<(), Box<dyn std::error::Error>> {
//! let app = InteractionMux::builder()
//!     .handle_block_action("approve", |_callback, _action| async {
//!         Ok(Some(WebhookMessage::text("Approved")))
//!     })
//!     .build()?
//!     .into_router("/slack/interactions");
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod base;
mod error;
pub mod event;
mod interaction;
pub mod response;
pub mod verify;

pub use base::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, MuxBase, default_http_client};
pub use error::{ErrorHandlerFn, HandlerError, MuxError, RegistrationError};
pub use event::{ActionId, BlockAction, InteractionCallback, InteractionType, View};
pub use interaction::{
    BlockActionHandlerFn, BlockActionResult, InteractionMux, InteractionMuxBuilder,
    MAX_BODY_BYTES, ViewSubmissionHandlerFn, ViewSubmissionResult,
};
pub use response::{ResponseAction, ViewSubmissionResponse, WebhookMessage};
