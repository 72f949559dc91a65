//! Notification payload construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when the request supplies none.
pub const DEFAULT_TITLE: &str = "Tribeca says";
/// Body used when the request supplies none.
pub const DEFAULT_BODY: &str = "You have received a Tribeca notification.";
/// Icon used when the request supplies none.
pub const DEFAULT_ICON: &str = "icon";

/// Incoming notify request body. Every field is optional; an absent body is
/// treated the same as an empty object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotifyBody {
    pub notification: Option<NotificationFields>,
    pub data: Option<Map<String, Value>>,
    pub exclude_users: Option<Vec<String>>,
}

/// Caller-supplied notification sub-fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationFields {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub tag: Option<String>,
}

/// Fully-resolved notification block. `tag` has no default and stays unset
/// unless the caller provided one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// The payload handed to the delivery client: resolved notification fields
/// plus an opaque data map forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub notification: Notification,
    pub data: Map<String, Value>,
}

impl NotifyBody {
    /// Users excluded from a topic fan-out; defaults to none.
    pub fn exclude_users(&self) -> Vec<String> {
        self.exclude_users.clone().unwrap_or_default()
    }

    /// Resolve the body into a delivery payload, filling missing fields with
    /// the fixed defaults.
    pub fn into_payload(self) -> MessagePayload {
        let fields = self.notification.unwrap_or_default();
        MessagePayload {
            notification: Notification {
                title: fields.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                body: fields.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
                icon: fields.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
                tag: fields.tag,
            },
            data: self.data.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_resolves_to_defaults() {
        let payload = NotifyBody::default().into_payload();

        assert_eq!(payload.notification.title, "Tribeca says");
        assert_eq!(
            payload.notification.body,
            "You have received a Tribeca notification."
        );
        assert_eq!(payload.notification.icon, "icon");
        assert_eq!(payload.notification.tag, None);
        assert!(payload.data.is_empty());
    }

    #[test]
    fn test_supplied_fields_override_defaults() {
        let body: NotifyBody = serde_json::from_value(json!({
            "notification": {"title": "hi", "tag": "chat"},
            "data": {"k": "v"}
        }))
        .unwrap();
        let payload = body.into_payload();

        assert_eq!(payload.notification.title, "hi");
        assert_eq!(
            payload.notification.body,
            "You have received a Tribeca notification."
        );
        assert_eq!(payload.notification.tag.as_deref(), Some("chat"));
        assert_eq!(payload.data.get("k"), Some(&json!("v")));
    }

    #[test]
    fn test_unset_tag_is_omitted_from_wire_shape() {
        let payload = NotifyBody::default().into_payload();
        let wire = serde_json::to_value(&payload).unwrap();
        assert!(wire["notification"].get("tag").is_none());
    }
}
