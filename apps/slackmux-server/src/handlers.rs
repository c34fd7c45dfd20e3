//! Built-in interaction handlers and failure hooks.
//!
//! - [`ACK_ACTION`]: button that posts an ephemeral acknowledgement back
//!   through the interaction's `response_url`
//! - [`FEEDBACK_CALLBACK`]: modal that validates a free-text input and
//!   closes on success

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use slackmux::{
    BlockAction, BlockActionResult, InteractionCallback, InteractionMux, InteractionType,
    ViewSubmissionResponse, ViewSubmissionResult, WebhookMessage,
};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Action id of the acknowledge button.
pub const ACK_ACTION: &str = "slackmux_ack";

/// Callback id of the feedback modal.
pub const FEEDBACK_CALLBACK: &str = "slackmux_feedback";

/// Block id and action id of the feedback text input.
pub const FEEDBACK_BLOCK: &str = "feedback_block";
pub const FEEDBACK_INPUT: &str = "feedback_input";

/// Builds the mux served by this binary.
///
/// # Errors
///
/// Returns `ServerError` if the relay client cannot be built or a handler
/// registration is invalid.
pub fn build_mux(config: &ServerConfig) -> Result<InteractionMux, ServerError> {
    let mut builder = InteractionMux::builder()
        .http_client(config.relay.http_client()?)
        .on_parse_error(|_, err| {
            warn!(error = %err, "Rejecting undecodable interaction");
            (StatusCode::BAD_REQUEST, "invalid payload").into_response()
        })
        .on_verification_error(|_, err| {
            warn!(error = %err, "Rejecting unsigned interaction");
            StatusCode::UNAUTHORIZED.into_response()
        })
        .on_unmatched_event(|request, err| {
            info!(uri = %request.uri(), error = %err, "Unhandled interaction");
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        })
        .handle_block_action(ACK_ACTION, acknowledge)
        .handle_view_submission(InteractionType::ViewSubmission, FEEDBACK_CALLBACK, feedback);

    if let Some(secret) = &config.signing_secret {
        builder = builder.signing_secret(secret.clone());
    }
    Ok(builder.build()?)
}

async fn acknowledge(callback: InteractionCallback, action: BlockAction) -> BlockActionResult {
    let user = callback.user.map(|u| u.id).unwrap_or_default();
    info!(user = %user, action_id = %action.action_id, "Acknowledged");
    let text = match action.value {
        Some(value) if !value.is_empty() => format!("<@{user}> acknowledged `{value}`"),
        _ => format!("<@{user}> acknowledged"),
    };
    Ok(Some(WebhookMessage::text(text).ephemeral()))
}

async fn feedback(callback: InteractionCallback) -> ViewSubmissionResult {
    let Some(text) = input_value(&callback.view.state, FEEDBACK_BLOCK, FEEDBACK_INPUT) else {
        return Ok(Some(ViewSubmissionResponse::errors(HashMap::from([(
            FEEDBACK_BLOCK.to_string(),
            "Please enter some feedback".to_string(),
        )]))));
    };
    let user = callback.user.map(|u| u.id).unwrap_or_default();
    info!(user = %user, chars = text.chars().count(), "Feedback received");
    Ok(Some(ViewSubmissionResponse::clear()))
}

/// Reads a plain-text input from `view.state.values[block][action].value`.
fn input_value<'a>(state: &'a Value, block_id: &str, action_id: &str) -> Option<&'a str> {
    state
        .get("values")?
        .get(block_id)?
        .get(action_id)?
        .get("value")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
