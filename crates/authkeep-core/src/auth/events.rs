//! Auth state change broadcast.
//!
//! Backed by a `tokio::sync::watch` channel: subscribers always see the
//! latest event, and sending never waits on slow subscribers. A subscriber
//! that falls behind skips straight to the newest value.

use std::fmt;
use std::sync::Arc;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
}

impl fmt::Display for AuthChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthChangeEvent::SignedIn => write!(f, "signed in"),
            AuthChangeEvent::SignedOut => write!(f, "signed out"),
        }
    }
}

/// Producer side. Clone is cheap and every clone feeds the same channel.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    tx: Arc<watch::Sender<AuthChangeEvent>>,
}

impl AuthEvents {
    pub fn new(initial: AuthChangeEvent) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Publish `event`, waking every subscriber even if the value is unchanged.
    pub fn emit(&self, event: AuthChangeEvent) {
        self.tx.send_replace(event);
    }

    /// Publish `event` only if it differs from the current one.
    /// Returns whether anything was sent.
    pub fn emit_if_changed(&self, event: AuthChangeEvent) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == event {
                false
            } else {
                *current = event;
                true
            }
        })
    }

    pub fn current(&self) -> AuthChangeEvent {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> AuthEventStream {
        AuthEventStream {
            rx: self.tx.subscribe(),
            delivered_current: false,
        }
    }
}

/// Consumer side. The first `next()` yields the current event right away,
/// later calls wait for the next emission.
#[derive(Debug)]
pub struct AuthEventStream {
    rx: watch::Receiver<AuthChangeEvent>,
    delivered_current: bool,
}

impl AuthEventStream {
    /// Next event, or `None` once every producer is gone.
    pub async fn next(&mut self) -> Option<AuthChangeEvent> {
        if !self.delivered_current {
            self.delivered_current = true;
            return Some(*self.rx.borrow_and_update());
        }
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    pub fn current(&self) -> AuthChangeEvent {
        *self.rx.borrow()
    }

    pub fn into_stream(self) -> impl Stream<Item = AuthChangeEvent> {
        futures::stream::unfold(self, |mut events| async move {
            events.next().await.map(|event| (event, events))
        })
    }
}
