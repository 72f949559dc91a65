//! Error envelope: the wire shape every failed operation reports.
//!
//! Validation collects one entry per failed precondition so a single response
//! can report every missing piece at once; operational failures contribute
//! exactly one entry.

use serde::Serialize;
use serde_json::Value;

/// A catalog code: numeric identifier plus its canonical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub code: u16,
    pub message: &'static str,
}

pub mod codes {
    use super::Code;

    pub const APP_ID_REQUIRED: Code = Code {
        code: 1001,
        message: "You should provide a valid appId",
    };
    pub const USER_ID_REQUIRED: Code = Code {
        code: 1002,
        message: "You should provide a valid userId",
    };
    pub const BODY_PARAMS_MISSING: Code = Code {
        code: 1003,
        message: "Maybe you forget some body params",
    };
    pub const USER_NOT_FOUND: Code = Code {
        code: 1004,
        message: "User not found",
    };
    pub const DEVICE_ID_REQUIRED: Code = Code {
        code: 1005,
        message: "You should provide a valid deviceId",
    };
    pub const DEVICE_NOT_FOUND: Code = Code {
        code: 1006,
        message: "Device not found",
    };
    pub const TOPIC_REQUIRED: Code = Code {
        code: 1007,
        message: "You should provide a valid topic",
    };
    pub const PUSH_CREDENTIAL_INVALID: Code = Code {
        code: 5001,
        message: "You should provide a valid push credential",
    };
    pub const PUSH_INIT_FAILED: Code = Code {
        code: 5002,
        message: "Cannot initialize push client",
    };
    pub const PUSH_CLIENT_NOT_FOUND: Code = Code {
        code: 5003,
        message: "Push client not found",
    };
    pub const PUSH_SEND_FAILED: Code = Code {
        code: 5004,
        message: "Push client could not send notifications",
    };
    pub const STORAGE_FAILED: Code = Code {
        code: 9001,
        message: "Database Error",
    };
}

/// One reported error: `{code, message, meta}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub code: u16,
    pub message: String,
    pub meta: Value,
}

impl ErrorEntry {
    pub fn new(code: Code) -> Self {
        Self {
            code: code.code,
            message: code.message.to_string(),
            meta: Value::Object(Default::default()),
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = meta;
        self
    }
}

impl From<Code> for ErrorEntry {
    fn from(code: Code) -> Self {
        Self::new(code)
    }
}

/// Accumulator for error entries; serializes as `{"errors": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub errors: Vec<ErrorEntry>,
}

impl ErrorEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(entry: impl Into<ErrorEntry>) -> Self {
        let mut envelope = Self::new();
        envelope.push(entry);
        envelope
    }

    pub fn push(&mut self, entry: impl Into<ErrorEntry>) {
        self.errors.push(entry.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accumulates_every_failed_precondition() {
        let mut envelope = ErrorEnvelope::new();
        envelope.push(codes::APP_ID_REQUIRED);
        envelope.push(codes::DEVICE_ID_REQUIRED);
        envelope.push(
            ErrorEntry::new(codes::PUSH_CLIENT_NOT_FOUND)
                .with_meta(json!({"missing": "push client for a1 not found"})),
        );

        assert_eq!(envelope.errors.len(), 3);
        assert_eq!(envelope.errors[0].code, 1001);
        assert_eq!(envelope.errors[2].meta["missing"], "push client for a1 not found");
    }

    #[test]
    fn test_wire_shape() {
        let envelope = ErrorEnvelope::single(codes::STORAGE_FAILED);
        let wire = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            wire,
            json!({"errors": [{"code": 9001, "message": "Database Error", "meta": {}}]})
        );
    }
}
