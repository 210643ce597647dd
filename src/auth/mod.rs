mod google;

use std::{
    collections::HashSet,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::instrument;

pub use google::GoogleIdentityProvider;

/// Identity asserted by the external provider after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Provider-level sign-in failure (network error, bad assertion). Retryable.
    #[error("identity provider error: {0}")]
    Provider(String),
    /// Authenticated but not on the allow-list. Terminates the provider session.
    #[error("account {email} is not authorized")]
    Denied { email: String },
}

/// Live admission state as seen by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    Unauthorized(String),
    Authorized(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies the client's identity assertion and records the session.
    async fn sign_in(&self, assertion: &str) -> Result<Identity, AuthError>;
    async fn sign_out(&self);
    /// Live session feed; holds `None` while signed out.
    fn sessions(&self) -> watch::Receiver<Option<Identity>>;
}

/// Immutable set of account emails permitted to use the content manager.
/// Built once from configuration; membership is case-insensitive.
#[derive(Debug, Clone)]
pub struct AllowList(Arc<HashSet<String>>);

impl AllowList {
    pub fn new(emails: impl IntoIterator<Item = String>) -> Self {
        Self(Arc::new(
            emails.into_iter().map(|e| e.to_lowercase()).collect(),
        ))
    }

    pub fn contains(&self, email: &str) -> bool {
        self.0.contains(&email.to_lowercase())
    }
}

/// Decides admission for provider-asserted identities against the allow-list.
pub struct AccessGuard {
    allow_list: AllowList,
    provider: Arc<dyn IdentityProvider>,
}

impl AccessGuard {
    pub fn new(allow_list: AllowList, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            allow_list,
            provider,
        }
    }

    /// Admits an asserted identity. On denial the provider session is
    /// force-terminated so the provider and the application never disagree
    /// about whether the user is signed in.
    #[instrument(name = "auth.establish_session", skip(self), fields(email = %identity.email))]
    pub async fn establish_session(&self, identity: &Identity) -> Result<String, AuthError> {
        if self.allow_list.contains(&identity.email) {
            Ok(identity.email.clone())
        } else {
            tracing::warn!(email = %identity.email, "sign-in denied, forcing provider sign-out");
            self.provider.sign_out().await;
            Err(AuthError::Denied {
                email: identity.email.clone(),
            })
        }
    }

    /// Runs the provider sign-in and immediately applies the admission check.
    pub async fn sign_in(&self, assertion: &str) -> Result<String, AuthError> {
        let identity = self.provider.sign_in(assertion).await?;
        self.establish_session(&identity).await
    }

    pub async fn sign_out(&self) {
        self.provider.sign_out().await;
    }

    /// Snapshot of the current session state.
    pub fn current(&self) -> SessionState {
        classify(self.provider.sessions().borrow().clone(), &self.allow_list)
    }

    /// Continuous session observation. The subscription delivers the state as
    /// of the call, then one update per provider session change. Dropping the
    /// subscription aborts the forwarding task, so nothing mutates state after
    /// teardown.
    pub fn watch(&self) -> SessionWatch {
        let mut sessions = self.provider.sessions();
        let allow_list = self.allow_list.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            loop {
                let state = classify(sessions.borrow_and_update().clone(), &allow_list);
                if tx.send(state).is_err() {
                    break;
                }
                if sessions.changed().await.is_err() {
                    break;
                }
            }
        });

        SessionWatch { rx, task }
    }
}

fn classify(identity: Option<Identity>, allow_list: &AllowList) -> SessionState {
    match identity {
        None => SessionState::SignedOut,
        Some(identity) if allow_list.contains(&identity.email) => {
            SessionState::Authorized(identity.email)
        }
        Some(identity) => SessionState::Unauthorized(identity.email),
    }
}

/// Cancellable subscription to session state changes.
pub struct SessionWatch {
    rx: mpsc::UnboundedReceiver<SessionState>,
    task: JoinHandle<()>,
}

impl SessionWatch {
    pub async fn next_state(&mut self) -> Option<SessionState> {
        self.rx.recv().await
    }
}

impl Stream for SessionWatch {
    type Item = SessionState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for SessionWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider fake whose session feed is driven directly by the tests.
    struct FakeProvider {
        current: watch::Sender<Option<Identity>>,
        fail_sign_in: bool,
    }

    impl FakeProvider {
        fn new() -> Self {
            let (current, _) = watch::channel(None);
            Self {
                current,
                fail_sign_in: false,
            }
        }

        fn failing() -> Self {
            let mut provider = Self::new();
            provider.fail_sign_in = true;
            provider
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn sign_in(&self, assertion: &str) -> Result<Identity, AuthError> {
            if self.fail_sign_in {
                return Err(AuthError::Provider("user cancelled".to_string()));
            }
            let identity = Identity {
                email: assertion.to_string(),
            };
            self.current.send_replace(Some(identity.clone()));
            Ok(identity)
        }

        async fn sign_out(&self) {
            self.current.send_replace(None);
        }

        fn sessions(&self) -> watch::Receiver<Option<Identity>> {
            self.current.subscribe()
        }
    }

    fn guard_with(provider: Arc<dyn IdentityProvider>) -> AccessGuard {
        AccessGuard::new(
            AllowList::new(vec!["admin@talos.example".to_string()]),
            provider,
        )
    }

    #[tokio::test]
    async fn allow_listed_identity_is_granted() {
        let guard = guard_with(Arc::new(FakeProvider::new()));
        let email = guard.sign_in("admin@talos.example").await.unwrap();
        assert_eq!(email, "admin@talos.example");
        assert_eq!(
            guard.current(),
            SessionState::Authorized("admin@talos.example".to_string())
        );
    }

    #[tokio::test]
    async fn membership_is_case_insensitive() {
        let guard = guard_with(Arc::new(FakeProvider::new()));
        let email = guard.sign_in("Admin@Talos.Example").await.unwrap();
        assert_eq!(email, "Admin@Talos.Example");
    }

    #[tokio::test]
    async fn denied_identity_forces_sign_out() {
        let provider = Arc::new(FakeProvider::new());
        let guard = guard_with(provider.clone());

        let err = guard.sign_in("intruder@example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::Denied { ref email } if email == "intruder@example.com"));

        // The provider session must not be left half-authenticated.
        assert!(provider.sessions().borrow().is_none());
        assert_eq!(guard.current(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn provider_failure_is_not_conflated_with_denial() {
        let guard = guard_with(Arc::new(FakeProvider::failing()));
        let err = guard.sign_in("admin@talos.example").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }

    #[tokio::test]
    async fn watch_delivers_session_changes() {
        let provider = Arc::new(FakeProvider::new());
        let guard = guard_with(provider.clone());

        let mut watch = guard.watch();
        assert_eq!(watch.next_state().await, Some(SessionState::SignedOut));

        guard.sign_in("admin@talos.example").await.unwrap();
        assert_eq!(
            watch.next_state().await,
            Some(SessionState::Authorized("admin@talos.example".to_string()))
        );

        guard.sign_out().await;
        assert_eq!(watch.next_state().await, Some(SessionState::SignedOut));
    }

    #[tokio::test]
    async fn dropping_the_watch_aborts_the_forwarding_task() {
        let provider = Arc::new(FakeProvider::new());
        let guard = guard_with(provider.clone());

        let mut watch = guard.watch();
        assert_eq!(watch.next_state().await, Some(SessionState::SignedOut));
        // The forwarding task holds the only live receiver.
        assert_eq!(provider.current.receiver_count(), 1);

        drop(watch);
        for _ in 0..100 {
            if provider.current.receiver_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        assert_eq!(provider.current.receiver_count(), 0);

        // Later session changes land nowhere; no task is left to observe them.
        provider.current.send_replace(Some(Identity {
            email: "admin@talos.example".to_string(),
        }));
        assert_eq!(provider.current.receiver_count(), 0);
    }

    #[tokio::test]
    async fn watch_reports_unauthorized_identity() {
        let provider = Arc::new(FakeProvider::new());
        let guard = guard_with(provider.clone());

        // Drive the provider session directly, bypassing the guard, as if the
        // vendor SDK signed the user in on its own.
        provider.current.send_replace(Some(Identity {
            email: "guest@example.com".to_string(),
        }));

        let mut watch = guard.watch();
        assert_eq!(
            watch.next_state().await,
            Some(SessionState::Unauthorized("guest@example.com".to_string()))
        );
    }
}
