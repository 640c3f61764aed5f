//! Typed view of agent run events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const EVENT_RUN_STARTED: &str = "RunStarted";
pub const EVENT_RUN_RESPONSE: &str = "RunResponse";
pub const EVENT_RUN_COMPLETED: &str = "RunCompleted";
pub const EVENT_RUN_ERROR: &str = "RunError";

/// One decoded run event. Fields the client does not model are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunResponse {
    /// Messages whose known fields carry unexpected types are kept whole in `extra`.
    #[must_use]
    pub fn from_message(message: Value) -> Self {
        match serde_json::from_value::<Self>(message.clone()) {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, "run event does not match the typed view");
                let extra = match message {
                    Value::Object(map) => map,
                    other => Map::from_iter([("value".to_owned(), other)]),
                };
                Self {
                    extra,
                    ..Self::default()
                }
            }
        }
    }

    #[must_use]
    pub fn is_event(&self, name: &str) -> bool {
        self.event.as_deref() == Some(name)
    }

    /// Text content, when the event carries a string.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }
}
