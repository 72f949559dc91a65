//! Target documents: the per-(user, app) aggregate of devices and topics.

use serde::{Deserialize, Serialize};

/// Composite key identifying a target within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetKey {
    pub user_id: String,
    pub app_id: String,
}

impl TargetKey {
    pub fn new(user_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            app_id: app_id.into(),
        }
    }

    /// Document id the store indexes on: `userId-appId`.
    pub fn doc_id(&self) -> String {
        format!("{}-{}", self.user_id, self.app_id)
    }
}

/// A registered device embedded in a target's device sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    pub register_token: String,
    pub model: String,
    pub platform: String,
}

/// One target per (user, app) pair.
///
/// `devices` keeps registration order; a device id appears at most once.
/// `topics` is logically a set stored as a sequence. `emails` and `sms` are
/// opaque contact channels carried for forward compatibility; resolution
/// never reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub app_id: String,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub sms: Vec<String>,
}

impl Target {
    /// Create an empty target for a key.
    pub fn new(key: &TargetKey) -> Self {
        Self {
            id: key.doc_id(),
            user_id: key.user_id.clone(),
            app_id: key.app_id.clone(),
            devices: Vec::new(),
            topics: Vec::new(),
            emails: Vec::new(),
            sms: Vec::new(),
        }
    }

    /// Create a target holding a single device, as first registration does.
    pub fn with_device(key: &TargetKey, device: Device) -> Self {
        let mut target = Self::new(key);
        target.devices.push(device);
        target
    }

    /// Position of a device id in the sequence, if registered.
    pub fn device_index(&self, device_id: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.device_id == device_id)
    }

    /// Look up a device by id.
    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }

    /// All register tokens, in registration order.
    pub fn register_tokens(&self) -> Vec<String> {
        self.devices
            .iter()
            .map(|d| d.register_token.clone())
            .collect()
    }
}

/// One topic or several; request bodies accept either form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TopicList {
    One(String),
    Many(Vec<String>),
}

impl TopicList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(topic) => vec![topic],
            Self::Many(topics) => topics,
        }
    }
}

impl From<&str> for TopicList {
    fn from(topic: &str) -> Self {
        Self::One(topic.to_string())
    }
}

impl From<Vec<String>> for TopicList {
    fn from(topics: Vec<String>) -> Self {
        Self::Many(topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, token: &str) -> Device {
        Device {
            device_id: id.into(),
            register_token: token.into(),
            model: "Nexus 5".into(),
            platform: "android".into(),
        }
    }

    #[test]
    fn test_doc_id_derivation() {
        let key = TargetKey::new("u1", "a1");
        assert_eq!(key.doc_id(), "u1-a1");
    }

    #[test]
    fn test_device_index_tracks_registration_order() {
        let key = TargetKey::new("u1", "a1");
        let mut target = Target::with_device(&key, device("d1", "t1"));
        target.devices.push(device("d2", "t2"));

        assert_eq!(target.device_index("d1"), Some(0));
        assert_eq!(target.device_index("d2"), Some(1));
        assert_eq!(target.device_index("d3"), None);
        assert_eq!(target.device("d2").map(|d| d.register_token.as_str()), Some("t2"));
    }

    #[test]
    fn test_topic_list_normalization() {
        assert_eq!(TopicList::from("news").into_vec(), vec!["news".to_string()]);
        let many: TopicList = vec!["a".to_string(), "b".to_string()].into();
        assert_eq!(many.into_vec().len(), 2);
    }
}
