//! HTTP client for the authentication endpoints
//!
//! Author: hephaex@gmail.com

use crate::storage::StorageError;
use async_trait::async_trait;
use gatehouse_core::{Role, UserId};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Client-side errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected by the server; `message` is the server's text, unchanged
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// User summary as returned by register and login
///
/// Login responses omit the names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub role: Role,
}

impl UserSummary {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

/// Token and user from a successful register or login
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserSummary,
}

/// Registration form
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthEnvelope {
    token: String,
    data: UserData,
}

#[derive(Deserialize)]
struct UserData {
    user: UserSummary,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Authentication endpoints
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError>;

    async fn register(&self, form: &RegisterForm) -> Result<AuthPayload, ClientError>;
}

/// [`AuthApi`] over HTTP
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_auth<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthPayload, ClientError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &text));
        }

        let envelope: AuthEnvelope = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        Ok(AuthPayload {
            token: envelope.token,
            user: envelope.data.user,
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        self.post_auth("/api/auth/login", &LoginBody { email, password })
            .await
    }

    async fn register(&self, form: &RegisterForm) -> Result<AuthPayload, ClientError> {
        self.post_auth("/api/auth/register", form).await
    }
}

/// Error carrying the server's `message`, or the raw body when it has none
fn api_error(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("Request failed with status {status}")
            } else {
                body.trim().to_string()
            }
        });
    ClientError::Api { status, message }
}
