//! Outbound payloads produced by handlers.
//!
//! [`WebhookMessage`] is relayed to a `response_url` after a block action.
//! [`ViewSubmissionResponse`] is written directly as the HTTP response to a
//! view submission and tells Slack what to do with the open modal.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Message posted to an interaction's `response_url`.
///
/// # Examples
///
/// ```
/// use slackmux::WebhookMessage;
///
/// let msg = WebhookMessage::text("Approved").replace_original();
/// let json = serde_json::to_string(&msg).unwrap();
/// assert_eq!(json, r#"{"text":"Approved","replace_original":true}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<serde_json::Value>,

    /// `in_channel` or `ephemeral`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub replace_original: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub delete_original: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfurl_links: Option<bool>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl WebhookMessage {
    /// Creates a plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Creates a Block Kit message with fallback text.
    pub fn blocks(text: impl Into<String>, blocks: Vec<serde_json::Value>) -> Self {
        Self {
            text: text.into(),
            blocks,
            ..Self::default()
        }
    }

    /// Marks the message as visible only to the acting user.
    pub fn ephemeral(mut self) -> Self {
        self.response_type = Some("ephemeral".to_string());
        self
    }

    /// Marks the message as visible to the whole channel.
    pub fn in_channel(mut self) -> Self {
        self.response_type = Some("in_channel".to_string());
        self
    }

    /// Replaces the message that contained the activated element.
    pub fn replace_original(mut self) -> Self {
        self.replace_original = true;
        self
    }

    /// Deletes the message that contained the activated element.
    pub fn delete_original(mut self) -> Self {
        self.delete_original = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    Clear,
    Update,
    Push,
    Errors,
}

/// Direct response to a `view_submission`.
///
/// # Examples
///
/// ```
/// use slackmux::ViewSubmissionResponse;
///
/// let json = serde_json::to_string(&ViewSubmissionResponse::clear()).unwrap();
/// assert_eq!(json, r#"{"response_action":"clear"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSubmissionResponse {
    pub response_action: ResponseAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<serde_json::Value>,

    /// Block id to error text, shown next to the offending inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, String>>,
}

impl ViewSubmissionResponse {
    /// Closes every view in the modal stack.
    pub fn clear() -> Self {
        Self {
            response_action: ResponseAction::Clear,
            view: None,
            errors: None,
        }
    }

    /// Replaces the submitted view.
    pub fn update(view: serde_json::Value) -> Self {
        Self {
            response_action: ResponseAction::Update,
            view: Some(view),
            errors: None,
        }
    }

    /// Pushes a new view on top of the stack.
    pub fn push(view: serde_json::Value) -> Self {
        Self {
            response_action: ResponseAction::Push,
            view: Some(view),
            errors: None,
        }
    }

    /// Keeps the modal open and shows validation errors.
    pub fn errors(errors: HashMap<String, String>) -> Self {
        Self {
            response_action: ResponseAction::Errors,
            view: None,
            errors: Some(errors),
        }
    }
}
