//! Data models for the identity provider.
//!
//! - `Session`, `User`, `UserIdentity`: credentials and the account they belong to
//! - `SessionOrUser`: answer of flows that may or may not sign the user in
//! - Request parameter types for sign-up, sign-in, OTP and verification

pub mod params;
pub mod session;

pub use params::{OtpParams, OtpType, RefreshTokenParams, SignUpParams, UserCredentials, VerifyOtpParams};
pub use session::{Session, SessionOrUser, User, UserIdentity};
