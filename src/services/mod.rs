pub mod account;
pub mod guest;
pub mod house;

use serde::Serialize;

/// Read/create/update envelope: `data` plus a display-language message.
/// Business-rule failures (validation, permission, store errors) land here
/// with `data: None` instead of being raised.
#[derive(Debug, Clone, Serialize)]
pub struct DataResult<T> {
    pub data: Option<T>,
    pub message: String,
}

impl<T> DataResult<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        DataResult {
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        DataResult {
            data: None,
            message: message.into(),
        }
    }
}

/// Delete envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        ActionResult {
            success: true,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        ActionResult {
            success: false,
            message: message.into(),
        }
    }
}
