use std::future::Future;

use futures::future::BoxFuture;

use super::RefreshError;
use crate::models::Session;

pub type RefreshFuture = BoxFuture<'static, Result<Session, RefreshError>>;

/// Exchanges a refresh token for a new session.
///
/// Implemented by `GoTrueApi` for real clients and by any
/// `Fn(String) -> impl Future<Output = Result<Session, RefreshError>>`
/// closure, which keeps tests free of network access.
pub trait TokenRefresher: Send + Sync + 'static {
    fn refresh(&self, refresh_token: String) -> RefreshFuture;
}

impl<F, Fut> TokenRefresher for F
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Session, RefreshError>> + Send + 'static,
{
    fn refresh(&self, refresh_token: String) -> RefreshFuture {
        Box::pin(self(refresh_token))
    }
}
