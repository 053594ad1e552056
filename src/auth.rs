//! Authentication state and change subscriptions.
//!
//! A provider owns the current [`Session`] (or none) and hands out
//! [`AuthSubscription`]s. A fresh subscription always reports the current
//! state first, then every later change. Dropping the subscription is the
//! unsubscribe.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::types::Session;

pub trait AuthProvider: Send + Sync {
    fn subscribe(&self) -> AuthSubscription;
}

/// Receiving half of an auth-state subscription.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: watch::Receiver<Option<Session>>,
}

impl AuthSubscription {
    fn new(mut rx: watch::Receiver<Option<Session>>) -> Self {
        rx.mark_changed();
        Self { rx }
    }

    /// Returns the pending auth state without waiting.
    ///
    /// `None` means nothing changed since the last call, or the provider is
    /// gone. `Some(None)` is a sign-out.
    pub fn try_next(&mut self) -> Option<Option<Session>> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            Ok(false) | Err(_) => None,
        }
    }

    /// Waits for the next auth state. Returns `None` once the provider is dropped.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {
        debug!("auth subscription released");
    }
}

/// In-process provider backed by a watch channel.
#[derive(Debug)]
pub struct LocalAuth {
    tx: watch::Sender<Option<Session>>,
}

impl LocalAuth {
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn signed_out() -> Self {
        Self::new(None)
    }

    pub fn sign_in(&self, session: Session) {
        info!(uid = %session.uid, "signed in");
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.tx.send_replace(None) {
            info!(uid = %previous.uid, "signed out");
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl AuthProvider for LocalAuth {
    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.tx.subscribe())
    }
}
