//! Request bodies for the auth endpoints.

use serde::{Deserialize, Serialize};

/// Body for `POST /signup`. Exactly one of `email` / `phone` is set.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

impl SignUpParams {
    pub fn email(email: &str, password: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            phone: None,
            password: password.to_string(),
        }
    }

    pub fn phone(phone: &str, password: &str) -> Self {
        Self {
            email: None,
            phone: Some(phone.to_string()),
            password: password.to_string(),
        }
    }
}

/// Body for `POST /token?grant_type=password`.
#[derive(Debug, Clone, Serialize)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

/// Body for `POST /token?grant_type=refresh_token`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenParams {
    pub refresh_token: String,
}

/// Body for `POST /otp` (magic link or SMS code).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtpParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Whether the provider may create the user if it does not exist yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_user: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Sms,
    PhoneChange,
    Signup,
    Invite,
    Magiclink,
    Recovery,
    EmailChange,
}

/// Body for `POST /verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpParams {
    #[serde(rename = "type")]
    pub otp_type: OtpType,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}
