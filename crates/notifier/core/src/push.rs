//! Push delivery types.

use serde::{Deserialize, Serialize};

/// Tokens addressed by one delivery call: a scalar for single-device
/// notifications, a sequence for user and topic fan-out.
#[derive(Debug, Clone, PartialEq)]
pub enum PushTokens {
    Single(String),
    Many(Vec<String>),
}

impl PushTokens {
    pub fn count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(tokens) => tokens.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Many(tokens) if tokens.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Single(token) => std::slice::from_ref(token),
            Self::Many(tokens) => tokens,
        };
        slice.iter().map(String::as_str)
    }
}

/// Outcome of delivering to one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushOutcome {
    pub fn success(token: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failure(token: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            token: token.into(),
            message_id: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The delivery provider's response, returned to callers unchanged.
///
/// A delivery call with zero recipients succeeds trivially with zero counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<PushOutcome>,
}

impl ProviderResponse {
    pub fn from_outcomes(results: Vec<PushOutcome>) -> Self {
        let success_count = results.iter().filter(|r| r.is_success()).count();
        Self {
            success_count,
            failure_count: results.len() - success_count,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_token_iteration() {
        let tokens = PushTokens::Single("t1".into());
        assert_eq!(tokens.count(), 1);
        assert!(!tokens.is_empty());
        assert_eq!(tokens.iter().collect::<Vec<_>>(), vec!["t1"]);
    }

    #[test]
    fn test_empty_fan_out_is_empty() {
        let tokens = PushTokens::Many(vec![]);
        assert!(tokens.is_empty());
        assert_eq!(tokens.count(), 0);
    }

    #[test]
    fn test_response_counts() {
        let response = ProviderResponse::from_outcomes(vec![
            PushOutcome::success("t1", "m1"),
            PushOutcome::failure("t2", "Unregistered"),
            PushOutcome::success("t3", "m3"),
        ]);
        assert_eq!(response.success_count, 2);
        assert_eq!(response.failure_count, 1);
    }
}
