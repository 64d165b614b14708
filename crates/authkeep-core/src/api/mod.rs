//! REST client module for the identity provider.
//!
//! `GoTrueApi` speaks the GoTrue auth API (sign-up, token grants, OTP,
//! verification, logout) and doubles as the production `TokenRefresher`.

pub mod client;
pub mod error;

pub use client::GoTrueApi;
pub use error::ApiError;
