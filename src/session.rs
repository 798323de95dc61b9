use tokio::sync::watch;

use crate::models::Session;

/// SessionSnapshot
///
/// What a gate sees when it looks at the session: either nothing yet, because the
/// auth provider has not answered, or a resolved viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSnapshot {
    Resolving,
    Resolved(Session),
}

impl SessionSnapshot {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionSnapshot::Resolving => None,
            SessionSnapshot::Resolved(session) => Some(session),
        }
    }
}

impl From<Session> for SessionSnapshot {
    fn from(session: Session) -> Self {
        SessionSnapshot::Resolved(session)
    }
}

/// SessionStore
///
/// The process-wide session authority. It is the only writer; everything else reads
/// through a `SessionProvider`. Dropping the store closes every provider.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// A store whose session has not been resolved yet (initial application load).
    pub fn resolving() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::Resolving);
        Self { tx }
    }

    pub fn resolved(session: Session) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::Resolved(session));
        Self { tx }
    }

    /// A read-only handle for gates and navigators.
    pub fn provider(&self) -> SessionProvider {
        SessionProvider {
            rx: self.tx.subscribe(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Publishes the auth provider's answer. Subscribers are notified only when the
    /// snapshot actually changes.
    pub fn resolve(&self, session: Session) -> bool {
        self.publish(SessionSnapshot::Resolved(session))
    }

    pub fn sign_in(&self, session: Session) -> bool {
        tracing::info!(user_id = ?session.user_id, role = %session.role, "session signed in");
        self.resolve(session)
    }

    pub fn sign_out(&self) -> bool {
        tracing::info!("session signed out");
        self.resolve(Session::guest())
    }

    fn publish(&self, next: SessionSnapshot) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::debug!(subscribers = self.tx.receiver_count(), "session snapshot published");
        }
        changed
    }
}

/// SessionProvider
///
/// Read-only view of the session with change notification.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionProvider {
    /// The latest snapshot, without consuming the pending change notification.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.rx.borrow().clone()
    }

    /// The latest snapshot, marking it as seen.
    pub fn observe(&mut self) -> SessionSnapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Waits for the next published snapshot. Returns `false` once the
    /// `SessionStore` has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
