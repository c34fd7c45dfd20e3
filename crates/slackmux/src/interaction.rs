//! Interaction routing and dispatch.
//!
//! [`InteractionMuxBuilder`] collects handlers during startup and
//! [`InteractionMux`] serves them. Two tables are consulted:
//!
//! - block actions, keyed by `action_id`
//! - view submissions, keyed by `(type, view.callback_id)`
//!
//! An action without a handler inside a `block_actions` batch is skipped.
//! A `view_submission` without a handler goes to the unmatched-event hook.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, info, instrument, warn};

use crate::base::MuxBase;
use crate::error::{DispatchError, HandlerError, MuxError, RegistrationError};
use crate::event::{ActionId, BlockAction, InteractionCallback, InteractionType};
use crate::response::{ViewSubmissionResponse, WebhookMessage};

/// Upper bound on inbound request bodies read by [`InteractionMux::into_router`].
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const APPLICATION_JSON: &str = "application/json";

pub type BlockActionResult = Result<Option<WebhookMessage>, HandlerError>;
pub type ViewSubmissionResult = Result<Option<ViewSubmissionResponse>, HandlerError>;

/// Registered block action handler. Receives the whole payload and the
/// individual action that matched.
pub type BlockActionHandlerFn =
    Arc<dyn Fn(InteractionCallback, BlockAction) -> BoxFuture<'static, BlockActionResult> + Send + Sync>;

/// Registered view submission handler.
pub type ViewSubmissionHandlerFn =
    Arc<dyn Fn(InteractionCallback) -> BoxFuture<'static, ViewSubmissionResult> + Send + Sync>;

#[derive(Clone)]
struct BlockActionEntry {
    handler: BlockActionHandlerFn,
    action_id: ActionId,
}

#[derive(Clone)]
struct ViewSubmissionEntry {
    handler: ViewSubmissionHandlerFn,
    interaction_type: InteractionType,
    callback_id: String,
}

/// Collects handlers and hooks before any traffic is served.
///
/// Misuse (empty keys, duplicate registrations) is recorded and reported by
/// [`build`](Self::build), so a mux with a broken table never exists.
///
/// # Examples
///
/// ```
/// use slackmux::{BlockActionResult, InteractionMux, ViewSubmissionResponse, WebhookMessage};
///
/// let mux = InteractionMux::builder()
///     .handle_block_action("approve", |_callback, _action| async {
///         BlockActionResult::Ok(Some(WebhookMessage::text("Approved")))
///     })
///     .handle_view_submission("view_submission", "feedback", |_callback| async {
///         Ok(Some(ViewSubmissionResponse::clear()))
///     })
///     .build()
///     .unwrap();
///
/// assert!(mux.block_action_handler("approve").is_some());
/// assert!(mux.block_action_handler("reject").is_none());
/// ```
pub struct InteractionMuxBuilder {
    base: MuxBase,
    block_actions: HashMap<ActionId, BlockActionEntry>,
    view_submissions: HashMap<InteractionType, HashMap<String, ViewSubmissionEntry>>,
    error: Option<RegistrationError>,
}

impl InteractionMuxBuilder {
    pub fn new() -> Self {
        Self {
            base: MuxBase::new(),
            block_actions: HashMap::new(),
            view_submissions: HashMap::new(),
            error: None,
        }
    }

    fn fail(&mut self, err: RegistrationError) {
        warn!(error = %err, "Invalid interaction handler registration");
        self.error.get_or_insert(err);
    }

    /// Registers `handler` for block actions with the given `action_id`.
    ///
    /// An empty or already registered id makes [`build`](Self::build) fail.
    pub fn handle_block_action<F, Fut>(mut self, action_id: impl Into<ActionId>, handler: F) -> Self
    where
        F: Fn(InteractionCallback, BlockAction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BlockActionResult> + Send + 'static,
    {
        let action_id = action_id.into();
        if action_id.is_empty() {
            self.fail(RegistrationError::EmptyActionId);
            return self;
        }
        if self.block_actions.contains_key(&action_id) {
            self.fail(RegistrationError::DuplicateActionId(action_id.to_string()));
            return self;
        }

        let handler: BlockActionHandlerFn =
            Arc::new(move |callback, action| handler(callback, action).boxed());
        debug!(action_id = %action_id, "Registered block action handler");
        self.block_actions.insert(
            action_id.clone(),
            BlockActionEntry { handler, action_id },
        );
        self
    }

    /// Registers `handler` for view interactions of `interaction_type` whose
    /// view carries `callback_id`. The callback id may be empty.
    ///
    /// An empty type or an already registered pair makes
    /// [`build`](Self::build) fail.
    ///
    /// Only `view_submission` events are dispatched to this table. A handler
    /// registered under any other type, such as `view_closed`, is accepted
    /// but never invoked.
    pub fn handle_view_submission<F, Fut>(
        mut self,
        interaction_type: impl Into<InteractionType>,
        callback_id: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(InteractionCallback) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ViewSubmissionResult> + Send + 'static,
    {
        let interaction_type = interaction_type.into();
        let callback_id = callback_id.into();
        if interaction_type.is_empty() {
            self.fail(RegistrationError::EmptyInteractionType);
            return self;
        }
        let by_callback = self
            .view_submissions
            .entry(interaction_type.clone())
            .or_default();
        if by_callback.contains_key(&callback_id) {
            self.fail(RegistrationError::DuplicateCallbackId {
                interaction_type,
                callback_id,
            });
            return self;
        }

        let handler: ViewSubmissionHandlerFn = Arc::new(move |callback| handler(callback).boxed());
        debug!(%interaction_type, callback_id = %callback_id, "Registered view submission handler");
        by_callback.insert(
            callback_id.clone(),
            ViewSubmissionEntry {
                handler,
                interaction_type,
                callback_id,
            },
        );
        self
    }

    /// Sets the hook for undecodable payloads. Replaces any previous hook.
    pub fn on_parse_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Request<Bytes>, &MuxError) -> Response + Send + Sync + 'static,
    {
        self.base.on_parse_error(handler);
        self
    }

    /// Sets the hook for requests failing signature verification.
    pub fn on_verification_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Request<Bytes>, &MuxError) -> Response + Send + Sync + 'static,
    {
        self.base.on_verification_error(handler);
        self
    }

    /// Sets the hook for unknown event types and unmatched submissions.
    pub fn on_unmatched_event<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Request<Bytes>, &MuxError) -> Response + Send + Sync + 'static,
    {
        self.base.on_unmatched_event(handler);
        self
    }

    /// Verifies `X-Slack-Signature` on every request with this secret.
    pub fn signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.base.set_signing_secret(secret);
        self
    }

    /// Relays through `client` instead of the default one.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.base.set_http_client(client);
        self
    }

    /// Finishes registration.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistrationError`] recorded during registration.
    pub fn build(self) -> Result<InteractionMux, RegistrationError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        info!(
            block_actions = self.block_actions.len(),
            view_submissions = self.view_submissions.values().map(HashMap::len).sum::<usize>(),
            "Interaction mux ready"
        );
        Ok(InteractionMux {
            base: self.base,
            block_actions: self.block_actions,
            view_submissions: self.view_submissions,
        })
    }
}

impl Default for InteractionMuxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable interaction router. Share it as `Arc<InteractionMux>`; lookups
/// and dispatch only read the tables.
pub struct InteractionMux {
    base: MuxBase,
    block_actions: HashMap<ActionId, BlockActionEntry>,
    view_submissions: HashMap<InteractionType, HashMap<String, ViewSubmissionEntry>>,
}

impl InteractionMux {
    pub fn builder() -> InteractionMuxBuilder {
        InteractionMuxBuilder::new()
    }

    /// Returns the embedded hooks and relay client.
    pub fn base(&self) -> &MuxBase {
        &self.base
    }

    /// Looks up the handler registered for `action_id`.
    pub fn block_action_handler(&self, action_id: &str) -> Option<&BlockActionHandlerFn> {
        self.block_actions.get(action_id).map(|entry| &entry.handler)
    }

    /// Looks up the handler for the callback's own `type` and
    /// `view.callback_id`.
    pub fn view_submission_handler(
        &self,
        callback: &InteractionCallback,
    ) -> Option<&ViewSubmissionHandlerFn> {
        self.view_submissions
            .get(&callback.interaction_type)?
            .get(&callback.view.callback_id)
            .map(|entry| &entry.handler)
    }

    /// Handles one interaction request whose body has been read in full.
    ///
    /// Order of events: signature check, payload decode, classification,
    /// handler invocation. Handler, encoding and relay failures all produce
    /// a plain `500 Internal Server Error`.
    #[instrument(skip_all, fields(interaction_type, callback_id))]
    pub async fn handle(&self, request: Request<Bytes>) -> Response {
        if let Err(err) = self.base.verify(&request) {
            warn!(error = %err, "Rejected interaction request");
            return self.base.verification_failed(&request, err);
        }

        let callback = match InteractionCallback::from_form_body(request.body()) {
            Ok(callback) => callback,
            Err(err) => {
                warn!(error = %err, "Failed to parse interaction payload");
                return self.base.parse_failed(&request, err);
            }
        };

        let span = tracing::Span::current();
        span.record("interaction_type", callback.interaction_type.as_str());
        span.record("callback_id", callback.view.callback_id.as_str());

        match callback.interaction_type {
            InteractionType::BlockActions => return self.dispatch_block_actions(&callback).await,
            InteractionType::ViewSubmission => {
                if let Some(handler) = self.view_submission_handler(&callback).cloned() {
                    return dispatch_view_submission(handler, callback).await;
                }
            }
            _ => {}
        }

        debug!("No handler matched interaction");
        self.base.unmatched(&request)
    }

    /// Runs matched actions in payload order. The first failure aborts the
    /// rest of the batch.
    async fn dispatch_block_actions(&self, callback: &InteractionCallback) -> Response {
        debug!(actions = callback.actions.len(), "Dispatching block actions");
        for action in &callback.actions {
            let Some(handler) = self.block_action_handler(action.action_id.as_str()) else {
                debug!(action_id = %action.action_id, "No handler for action, skipping");
                continue;
            };
            if let Err(e) = self.run_block_action(handler, callback, action).await {
                warn!(action_id = %action.action_id, error = %e, "Block action failed");
                return internal_server_error();
            }
        }
        StatusCode::OK.into_response()
    }

    async fn run_block_action(
        &self,
        handler: &BlockActionHandlerFn,
        callback: &InteractionCallback,
        action: &BlockAction,
    ) -> Result<(), DispatchError> {
        let message = handler(callback.clone(), action.clone())
            .await
            .map_err(DispatchError::Handler)?;

        match message {
            Some(message) if !callback.response_url.is_empty() => {
                self.relay(&callback.response_url, &message).await
            }
            _ => Ok(()),
        }
    }

    /// POSTs `message` to a `response_url`. The relay's own status is not
    /// inspected; only transport errors fail.
    async fn relay(&self, url: &str, message: &WebhookMessage) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(message)?;
        let response = self
            .base
            .http_client()
            .post(url)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body)
            .send()
            .await?;
        debug!(status = %response.status(), "Relayed message to response_url");
        Ok(())
    }

    /// Mounts the mux on `POST path`.
    pub fn into_router(self, path: &str) -> Router {
        Router::new()
            .route(path, post(serve))
            .with_state(Arc::new(self))
    }
}

async fn dispatch_view_submission(
    handler: ViewSubmissionHandlerFn,
    callback: InteractionCallback,
) -> Response {
    let response = match handler(callback).await {
        Ok(Some(response)) => response,
        Ok(None) => return StatusCode::OK.into_response(),
        Err(e) => {
            warn!(error = %e, "View submission handler failed");
            return internal_server_error();
        }
    };

    match serde_json::to_vec(&response) {
        Ok(body) => ([(CONTENT_TYPE, APPLICATION_JSON)], body).into_response(),
        Err(e) => {
            warn!(error = %e, "Cannot encode view submission response");
            internal_server_error()
        }
    }
}

fn internal_server_error() -> Response {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

async fn serve(State(mux): State<Arc<InteractionMux>>, request: axum::extract::Request) -> Response {
    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => mux.handle(Request::from_parts(parts, bytes)).await,
        Err(e) => {
            let request = Request::from_parts(parts, Bytes::new());
            mux.base.parse_failed(&request, MuxError::Parse(e.to_string()))
        }
    }
}

impl fmt::Debug for InteractionMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<&str> = self
            .block_actions
            .values()
            .map(|entry| entry.action_id.as_str())
            .collect();
        let submissions: Vec<(&str, &str)> = self
            .view_submissions
            .values()
            .flat_map(HashMap::values)
            .map(|entry| (entry.interaction_type.as_str(), entry.callback_id.as_str()))
            .collect();
        f.debug_struct("InteractionMux")
            .field("base", &self.base)
            .field("block_actions", &actions)
            .field("view_submissions", &submissions)
            .finish()
    }
}

impl fmt::Debug for InteractionMuxBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionMuxBuilder")
            .field("base", &self.base)
            .field("block_actions", &self.block_actions.len())
            .field("view_submissions", &self.view_submissions.len())
            .field("error", &self.error)
            .finish()
    }
}
