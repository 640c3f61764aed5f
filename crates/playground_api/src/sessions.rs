use serde::{Deserialize, Serialize};

/// One entry of an agent's session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    /// Owner as recorded by the server; legacy rows may hold a username here.
    #[serde(default, deserialize_with = "deserialize_owner")]
    pub user_id: Option<String>,
}

impl SessionEntry {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            title: None,
            created_at: None,
            updated_at: None,
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

fn deserialize_owner<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(owner)) => Some(owner),
        Some(serde_json::Value::Number(owner)) => Some(owner.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::SessionEntry;
    use serde_json::json;

    #[test]
    fn owner_accepts_numeric_and_string_ids() {
        let entries: Vec<SessionEntry> = serde_json::from_value(json!([
            {"session_id": "a", "title": "hello", "created_at": 10, "updated_at": 12, "user_id": 1},
            {"session_id": "b", "user_id": "Lorenzo"},
            {"session_id": "c", "user_id": null},
        ]))
        .expect("listing should decode");

        assert_eq!(entries[0].user_id.as_deref(), Some("1"));
        assert_eq!(entries[0].title.as_deref(), Some("hello"));
        assert_eq!(entries[1].user_id.as_deref(), Some("Lorenzo"));
        assert_eq!(entries[2].user_id, None);
        assert_eq!(entries[2].created_at, None);
    }
}
