use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::SpyCatId;

pub fn spy_cats_route() -> &'static str {
    "/spy-cats/"
}

pub fn spy_cat_route(id: SpyCatId) -> String {
    format!("/spy-cats/{}", id.0)
}

/// Error body returned by the server on non-success responses.
///
/// `detail` is usually a human-readable string. Request validation failures
/// carry a list of `{loc, msg, type}` entries instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ErrorPayload {
    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    pub fn detail_message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Array(entries) => {
                let messages: Vec<&str> = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }
}
