use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Session;

/// Grace window in seconds, applied ahead of `now`: a session is valid
/// only while `expiration_date > now + EXPIRY_SKEW_SECS`, i.e. it turns
/// stale this long before its literal deadline.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Longest ttl honoured when deriving an expiration (ten years). Provider
/// values beyond it are clamped so the instant stays representable.
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// A session as persisted in the secure store.
///
/// `expiration_date` is fixed when the value is built and never
/// recomputed from the wrapped session afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: Session,
    pub expiration_date: DateTime<Utc>,
}

impl StoredSession {
    /// Wrap a freshly issued session, expiring `expires_in` seconds from now.
    pub fn new(session: Session) -> Self {
        Self::issued_at(session, Utc::now())
    }

    /// `expires_in` is clamped to `0..=MAX_TTL_SECS`: a negative ttl yields an
    /// already-stale session, an absurdly large one a far-future deadline.
    pub fn issued_at(session: Session, now: DateTime<Utc>) -> Self {
        let ttl = Duration::seconds(session.expires_in.clamp(0, MAX_TTL_SECS));
        let expiration_date = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            session,
            expiration_date,
        }
    }

    pub fn with_expiration(session: Session, expiration_date: DateTime<Utc>) -> Self {
        Self {
            session,
            expiration_date,
        }
    }

    /// Valid if the deadline lies more than the skew window after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match now.checked_add_signed(Duration::seconds(EXPIRY_SKEW_SECS)) {
            Some(threshold) => self.expiration_date > threshold,
            None => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Duration {
        self.expiration_date - now
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::fixtures;

    fn stored_expiring_in(now: DateTime<Utc>, secs: i64) -> StoredSession {
        StoredSession::with_expiration(fixtures::session("a", "r", 3600), now + Duration::seconds(secs))
    }

    #[test]
    fn test_validity_boundary() {
        let now = Utc::now();
        assert!(stored_expiring_in(now, 61).is_valid_at(now));
        assert!(!stored_expiring_in(now, 60).is_valid_at(now));
        assert!(!stored_expiring_in(now, 59).is_valid_at(now));
        assert!(!stored_expiring_in(now, -1).is_valid_at(now));
    }

    #[test]
    fn test_expiration_derived_from_ttl() {
        let now = Utc::now();
        let stored = StoredSession::issued_at(fixtures::session("a", "r", 3600), now);
        assert_eq!(stored.expiration_date, now + Duration::seconds(3600));
        assert_eq!(stored.time_until_expiry(now).num_seconds(), 3600);
        assert!(stored.is_valid_at(now));
    }

    #[test]
    fn test_extreme_ttl_is_clamped() {
        let now = Utc::now();

        let forever = StoredSession::issued_at(fixtures::session("a", "r", i64::MAX), now);
        assert_eq!(forever.expiration_date, now + Duration::seconds(MAX_TTL_SECS));
        assert!(forever.is_valid_at(now));
        let decoded = StoredSession::from_bytes(&forever.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, forever);

        let negative = StoredSession::issued_at(fixtures::session("a", "r", i64::MIN), now);
        assert_eq!(negative.expiration_date, now);
        assert!(!negative.is_valid_at(now));
    }

    #[test]
    fn test_short_lived_session_is_stale_immediately() {
        let stored = StoredSession::new(fixtures::session("a", "r", 30));
        assert!(!stored.is_valid());
    }

    #[test]
    fn test_persisted_expiration_is_not_recomputed() {
        let issued = Utc::now() - Duration::hours(2);
        let stored = StoredSession::issued_at(fixtures::session("a", "r", 3600), issued);

        let decoded = StoredSession::from_bytes(&stored.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.expiration_date, stored.expiration_date);
        assert!(!decoded.is_valid());
    }
}
