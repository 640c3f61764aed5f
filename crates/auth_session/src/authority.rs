use std::future::Future;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::AuthConfig;
use crate::error::AuthorityError;

pub const VERIFY_INVITATION_PATH: &str = "/api/auth/verify-invitation";
pub const VERIFY_SESSION_PATH: &str = "/api/auth/verify-session";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvitationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    /// Absent means the authority did not object.
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SessionResponse {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.success && self.valid != Some(false)
    }
}

/// Remote service that issues and validates session credentials.
pub trait AuthAuthority: Send + Sync {
    fn verify_invitation(
        &self,
        invitation_code: &str,
    ) -> impl Future<Output = Result<InvitationResponse, AuthorityError>> + Send;

    fn verify_session(
        &self,
        session_token: &str,
    ) -> impl Future<Output = Result<SessionResponse, AuthorityError>> + Send;

    fn logout(&self, session_token: &str) -> impl Future<Output = Result<(), AuthorityError>> + Send;
}

#[derive(Serialize)]
struct InvitationBody<'a> {
    invitation_code: &'a str,
}

#[derive(Serialize)]
struct TokenBody<'a> {
    session_token: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpAuthAuthority {
    http: Client,
    base_url: String,
}

impl HttpAuthAuthority {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthorityError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|error| AuthorityError::InvalidBaseUrl(format!("{}: {error}", config.base_url)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, AuthorityError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        decode_answer(status, &text)
    }
}

impl AuthAuthority for HttpAuthAuthority {
    fn verify_invitation(
        &self,
        invitation_code: &str,
    ) -> impl Future<Output = Result<InvitationResponse, AuthorityError>> + Send {
        async move {
            self.post_json(VERIFY_INVITATION_PATH, &InvitationBody { invitation_code })
                .await
        }
    }

    fn verify_session(
        &self,
        session_token: &str,
    ) -> impl Future<Output = Result<SessionResponse, AuthorityError>> + Send {
        async move {
            self.post_json(VERIFY_SESSION_PATH, &TokenBody { session_token })
                .await
        }
    }

    fn logout(&self, session_token: &str) -> impl Future<Output = Result<(), AuthorityError>> + Send {
        async move {
            let response = self
                .http
                .post(self.endpoint(LOGOUT_PATH))
                .json(&TokenBody { session_token })
                .send()
                .await?;
            tracing::debug!(status = %response.status(), "logout acknowledged");
            Ok(())
        }
    }
}

/// Rejections arrive as `{"error": ...}` with a 4xx status, so the body is
/// decoded regardless of status. Only an undecodable body is a failure.
fn decode_answer<R>(status: StatusCode, body: &str) -> Result<R, AuthorityError>
where
    R: for<'de> Deserialize<'de>,
{
    match serde_json::from_str::<R>(body) {
        Ok(answer) => Ok(answer),
        Err(_) if !status.is_success() => Err(AuthorityError::Status {
            status,
            body: body.to_string(),
        }),
        Err(error) => Err(AuthorityError::Decode(error)),
    }
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}
