use std::collections::BTreeMap;

use serde_json::Value;

/// Body of a run request.
#[derive(Debug, Clone, PartialEq)]
pub enum RunBody {
    /// Serialized as `application/json`.
    Json(Value),
    /// Sent as `multipart/form-data`; the transport sets the boundary content type.
    Form(Vec<(String, String)>),
}

/// One streaming run request.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub body: RunBody,
    /// Caller headers, applied over the configured defaults.
    pub headers: BTreeMap<String, String>,
}

impl RunRequest {
    pub fn json(body: impl Into<Value>) -> Self {
        Self {
            body: RunBody::Json(body.into()),
            headers: BTreeMap::new(),
        }
    }

    pub fn form(fields: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            body: RunBody::Form(fields.into_iter().collect()),
            headers: BTreeMap::new(),
        }
    }

    /// Form body expected by the agent run endpoint.
    ///
    /// Always requests streaming; `session_id` continues an existing session and
    /// `user_id` tags the run with the authenticated principal.
    pub fn agent_message(
        message: impl Into<String>,
        session_id: Option<&str>,
        user_id: Option<u64>,
    ) -> Self {
        let mut fields = vec![
            ("message".to_owned(), message.into()),
            ("stream".to_owned(), "true".to_owned()),
        ];
        if let Some(session_id) = session_id.map(str::trim).filter(|value| !value.is_empty()) {
            fields.push(("session_id".to_owned(), session_id.to_owned()));
        }
        if let Some(user_id) = user_id {
            fields.push(("user_id".to_owned(), user_id.to_string()));
        }
        Self::form(fields)
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn is_form(&self) -> bool {
        matches!(self.body, RunBody::Form(_))
    }
}
