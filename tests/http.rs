//! HTTP surface tests for the admin gate: every mutating request must carry
//! its own verifiable assertion.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use tokio::sync::watch;
use tower::ServiceExt;

use talos_remote::{
    AppState, Server,
    auth::{AccessGuard, AllowList, AuthError, Identity, IdentityProvider},
    config::{DocumentStoreConfig, IdentityProviderConfig, RemoteServerConfig},
    store::memory::MemoryDocumentStore,
};

/// Provider fake that resolves a fixed table of bearer assertions.
struct TokenTableProvider {
    current: watch::Sender<Option<Identity>>,
}

impl TokenTableProvider {
    fn new() -> Arc<Self> {
        let (current, _) = watch::channel(None);
        Arc::new(Self { current })
    }
}

#[async_trait]
impl IdentityProvider for TokenTableProvider {
    async fn sign_in(&self, assertion: &str) -> Result<Identity, AuthError> {
        let email = match assertion {
            "token-admin" => "admin@talos.example",
            "token-guest" => "guest@example.com",
            _ => return Err(AuthError::Provider("unknown assertion".to_string())),
        };
        let identity = Identity {
            email: email.to_string(),
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

fn test_state() -> AppState {
    let config = RemoteServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        allowed_emails: vec!["admin@talos.example".to_string()],
        store: DocumentStoreConfig {
            base_url: "http://store.invalid".to_string(),
            api_key: None,
        },
        media: None,
        identity: IdentityProviderConfig {
            tokeninfo_url: "http://identity.invalid".to_string(),
        },
    };

    let guard = Arc::new(AccessGuard::new(
        AllowList::new(config.allowed_emails.clone()),
        TokenTableProvider::new(),
    ));
    let store = Arc::new(MemoryDocumentStore::new());

    AppState::new(config, guard, store, None, reqwest::Client::new())
}

fn delete_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri("/v1/projects/p1");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn admin_routes_reject_requests_without_an_assertion() {
    let app = Server::router(test_state());
    let response = app.oneshot(delete_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_ignore_other_callers_sessions() {
    // An earlier sign-in by the real admin must not admit a later caller
    // that presents no credentials of its own.
    let state = test_state();
    state.guard().sign_in("token-admin").await.unwrap();

    let app = Server::router(state);
    let response = app.oneshot(delete_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unlisted_account_is_forbidden() {
    let app = Server::router(test_state());
    let response = app.oneshot(delete_request(Some("token-guest"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejected_assertion_is_unauthorized() {
    let app = Server::router(test_state());
    let response = app
        .oneshot(delete_request(Some("token-forged")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verified_admin_passes_the_gate() {
    let app = Server::router(test_state());
    let response = app.oneshot(delete_request(Some("token-admin"))).await.unwrap();
    // No media host is configured in this state, so the handler itself
    // answers 503: the caller made it past the gate.
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn public_listing_needs_no_assertion() {
    let app = Server::router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
