//! Session and user models as returned by the identity provider.
//!
//! Field names follow the provider's snake_case JSON, so most structs
//! need no renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential bundle issued by the identity provider.
///
/// A session is never patched in place: a refresh or a new sign-in
/// produces a whole new value that replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    /// Time-to-live of the access token in seconds.
    pub expires_in: i64,
    pub refresh_token: String,
    pub user: User,
}

impl Session {
    /// Value for an `Authorization` header, e.g. `Bearer eyJ...`.
    pub fn authorization_header(&self) -> String {
        let token_type = if self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", token_type, self.access_token)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phone_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub identities: Vec<UserIdentity>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Email if present and non-empty, otherwise phone.
    pub fn display_handle(&self) -> Option<&str> {
        self.email
            .as_deref()
            .filter(|e| !e.is_empty())
            .or_else(|| self.phone.as_deref().filter(|p| !p.is_empty()))
    }
}

/// A linked login method (email, phone, external provider).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub identity_data: serde_json::Value,
    pub provider: String,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Sign-up and OTP verification answer with a session when the account is
/// confirmed immediately, and with the bare user when confirmation is
/// still pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionOrUser {
    Session(Session),
    User(User),
}

impl SessionOrUser {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionOrUser::Session(session) => Some(session),
            SessionOrUser::User(_) => None,
        }
    }

    pub fn user(&self) -> &User {
        match self {
            SessionOrUser::Session(session) => &session.user,
            SessionOrUser::User(user) => user,
        }
    }
}
