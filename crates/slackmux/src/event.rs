//! Inbound interaction payload model.
//!
//! Slack posts interactions as `application/x-www-form-urlencoded` bodies
//! with a single `payload` field holding the JSON event. Only the fields
//! needed for routing and commonly used by handlers are modelled; unknown
//! fields are ignored, and missing or `null` fields fall back to defaults.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::MuxError;

/// Decodes an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `type` tag of an interaction payload.
///
/// Known tags map to dedicated variants; anything else is kept verbatim in
/// [`InteractionType::Other`].
///
/// # Examples
///
/// ```
/// use slackmux::InteractionType;
///
/// let t: InteractionType = "view_submission".into();
/// assert_eq!(t, InteractionType::ViewSubmission);
/// assert_eq!(t.as_str(), "view_submission");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InteractionType {
    BlockActions,
    BlockSuggestion,
    ViewSubmission,
    ViewClosed,
    Shortcut,
    MessageAction,
    InteractiveMessage,
    DialogSubmission,
    Other(String),
}

impl InteractionType {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::BlockActions => "block_actions",
            Self::BlockSuggestion => "block_suggestion",
            Self::ViewSubmission => "view_submission",
            Self::ViewClosed => "view_closed",
            Self::Shortcut => "shortcut",
            Self::MessageAction => "message_action",
            Self::InteractiveMessage => "interactive_message",
            Self::DialogSubmission => "dialog_submission",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` for the empty tag, which can never be routed.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl Default for InteractionType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<&str> for InteractionType {
    fn from(s: &str) -> Self {
        match s {
            "block_actions" => Self::BlockActions,
            "block_suggestion" => Self::BlockSuggestion,
            "view_submission" => Self::ViewSubmission,
            "view_closed" => Self::ViewClosed,
            "shortcut" => Self::Shortcut,
            "message_action" => Self::MessageAction,
            "interactive_message" => Self::InteractiveMessage,
            "dialog_submission" => Self::DialogSubmission,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for InteractionType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<InteractionType> for String {
    fn from(t: InteractionType) -> Self {
        match t {
            InteractionType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of an interactive block element, e.g. a button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<str> for ActionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ActionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Top-level interaction payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionCallback {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub interaction_type: InteractionType,

    #[serde(default, deserialize_with = "null_as_default")]
    pub token: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub trigger_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub api_app_id: String,

    #[serde(default)]
    pub team: Option<Team>,

    #[serde(default)]
    pub user: Option<User>,

    #[serde(default)]
    pub channel: Option<Channel>,

    #[serde(default)]
    pub message: Option<Message>,

    /// The modal, for view interactions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub view: View,

    /// Activated elements, for `block_actions`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<BlockAction>,

    /// Single-use URL for follow-up messages. Empty when absent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_url: String,

    /// Response URLs collected from modal inputs configured to provide them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_urls: Vec<ResponseUrl>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_enterprise_install: bool,
}

impl InteractionCallback {
    /// Decodes a form-encoded request body carrying a `payload` field.
    ///
    /// # Errors
    ///
    /// Returns `MuxError::Parse` if the body has no `payload` field or its
    /// value is not a valid interaction payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use slackmux::{InteractionCallback, InteractionType};
    ///
    /// let body = b"payload=%7B%22type%22%3A%22block_actions%22%7D";
    /// let callback = InteractionCallback::from_form_body(body).unwrap();
    /// assert_eq!(callback.interaction_type, InteractionType::BlockActions);
    ///
    /// assert!(InteractionCallback::from_form_body(b"").is_err());
    /// ```
    pub fn from_form_body(body: &[u8]) -> Result<Self, MuxError> {
        let payload = form_urlencoded::parse(body)
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        serde_json::from_str(&payload).map_err(|e| MuxError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// The message containing the activated element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

/// A modal view as carried by view interactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct View {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub view_type: String,
    /// Chosen by whoever opened the modal; the submission routing key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub callback_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub private_metadata: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(default)]
    pub root_view_id: Option<String>,
    #[serde(default)]
    pub previous_view_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_id: String,
    /// Submitted input values, kept as raw JSON.
    #[serde(default)]
    pub state: serde_json::Value,
}

/// One activated element inside a `block_actions` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockAction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_id: ActionId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub block_id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub action_type: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_ts: String,
}

/// A selected option from a select menu element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectedOption {
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default)]
    pub text: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseUrl {
    #[serde(default, deserialize_with = "null_as_default")]
    pub block_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_body(payload: &str) -> Vec<u8> {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", payload)
            .finish()
            .into_bytes()
    }

    #[test]
    fn test_should_decode_block_actions_payload() {
        let json = serde_json::json!({
            "type": "block_actions",
            "trigger_id": "T1",
            "user": { "id": "U123", "username": "alice" },
            "channel": { "id": "C123", "name": "general" },
            "message": { "ts": "1700000000.000100" },
            "actions": [
                { "action_id": "approve", "block_id": "b1", "type": "button", "value": "42" },
                { "action_id": "reject", "type": "button" }
            ],
            "response_url": "https://hooks.slack.com/actions/T/1/abc"
        });

        let callback =
            InteractionCallback::from_form_body(&form_body(&json.to_string())).expect("decode");
        assert_eq!(callback.interaction_type, InteractionType::BlockActions);
        assert_eq!(callback.actions.len(), 2);
        assert_eq!(callback.actions[0].action_id.as_str(), "approve");
        assert_eq!(callback.actions[0].value.as_deref(), Some("42"));
        assert!(callback.actions[1].value.is_none());
        assert_eq!(callback.channel.expect("channel").id, "C123");
        assert!(callback.response_url.starts_with("https://hooks.slack.com"));
    }

    #[test]
    fn test_should_decode_view_submission_with_nulls() {
        let json = r#"{
            "type": "view_submission",
            "team": { "id": "TEAM_ID", "domain": "DOMAIN" },
            "view": {
                "id": "VIEW_ID",
                "type": "modal",
                "callback_id": "normal-callback",
                "state": {},
                "close": null,
                "previous_view_id": null,
                "root_view_id": "ROOT_VIEW_ID"
            },
            "response_urls": [],
            "enterprise": null
        }"#;

        let callback = InteractionCallback::from_form_body(&form_body(json)).expect("decode");
        assert_eq!(callback.interaction_type, InteractionType::ViewSubmission);
        assert_eq!(callback.view.callback_id, "normal-callback");
        assert!(callback.view.previous_view_id.is_none());
        assert!(callback.actions.is_empty());
        assert!(callback.response_url.is_empty());
    }

    #[test]
    fn test_should_keep_unknown_type_verbatim() {
        let callback: InteractionCallback =
            serde_json::from_str(r#"{"type":"workflow_step_edit"}"#).expect("decode");
        assert_eq!(
            callback.interaction_type,
            InteractionType::Other("workflow_step_edit".into())
        );
    }

    #[test]
    fn test_should_default_missing_type_to_empty() {
        let callback: InteractionCallback = serde_json::from_str("{}").expect("decode");
        assert!(callback.interaction_type.is_empty());
    }

    #[test]
    fn test_should_serialize_type_as_tag() {
        let json = serde_json::to_value(InteractionType::BlockActions).expect("serialize");
        assert_eq!(json, "block_actions");
    }

    #[test]
    fn test_should_reject_empty_body() {
        let err = InteractionCallback::from_form_body(b"").unwrap_err();
        assert!(matches!(err, MuxError::Parse(_)));
    }

    #[test]
    fn test_should_reject_body_without_payload_field() {
        let err = InteractionCallback::from_form_body(b"command=%2Fdeploy").unwrap_err();
        assert!(matches!(err, MuxError::Parse(_)));
    }

    #[test]
    fn test_should_reject_invalid_json() {
        let err = InteractionCallback::from_form_body(&form_body("{not json")).unwrap_err();
        assert!(matches!(err, MuxError::Parse(_)));
    }

    #[test]
    fn test_should_default_action_without_id_to_empty() {
        let action: BlockAction = serde_json::from_str(r#"{"type":"button"}"#).expect("decode");
        assert!(action.action_id.is_empty());
        assert_eq!(action.action_type, "button");
    }

    #[test]
    fn test_should_decode_null_fields_as_defaults() {
        let json = r#"{
            "type": "block_actions",
            "token": null,
            "trigger_id": null,
            "view": null,
            "actions": [{ "action_id": null, "block_id": null, "type": "button" }],
            "response_url": null,
            "response_urls": null,
            "is_enterprise_install": null
        }"#;

        let callback = InteractionCallback::from_form_body(&form_body(json)).expect("decode");
        assert_eq!(callback.interaction_type, InteractionType::BlockActions);
        assert!(callback.trigger_id.is_empty());
        assert!(callback.view.callback_id.is_empty());
        assert!(callback.response_url.is_empty());
        assert!(callback.response_urls.is_empty());
        assert!(!callback.is_enterprise_install);
        assert!(callback.actions[0].action_id.is_empty());
    }

    #[test]
    fn test_should_decode_null_view_fields() {
        let view: View = serde_json::from_str(
            r#"{"type": null, "callback_id": "cb", "private_metadata": null, "hash": null}"#,
        )
        .expect("decode");
        assert_eq!(view.callback_id, "cb");
        assert!(view.private_metadata.is_empty());
        assert!(view.view_type.is_empty());
    }

    #[test]
    fn test_should_decode_null_type_as_empty() {
        let callback: InteractionCallback =
            serde_json::from_str(r#"{"type": null}"#).expect("decode");
        assert!(callback.interaction_type.is_empty());
    }
}
