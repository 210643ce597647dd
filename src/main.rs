use std::sync::Arc;

use talos_remote::{
    AppState, Server,
    auth::{AccessGuard, AllowList, GoogleIdentityProvider},
    config::RemoteServerConfig,
    media::{MediaHost, MediaHostService},
    store::{DocumentStore, RestDocumentStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    talos_remote::init_tracing();

    let config = RemoteServerConfig::from_env()?;
    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let provider = Arc::new(GoogleIdentityProvider::new(
        &config.identity,
        http_client.clone(),
    ));
    let guard = Arc::new(AccessGuard::new(
        AllowList::new(config.allowed_emails.clone()),
        provider,
    ));

    let store: Arc<dyn DocumentStore> =
        Arc::new(RestDocumentStore::new(&config.store, http_client.clone()));

    let media: Option<Arc<dyn MediaHost>> = config
        .media
        .as_ref()
        .map(|media| Arc::new(MediaHostService::new(media, http_client.clone())) as _);

    let state = AppState::new(config, guard, store, media, http_client);
    Server::serve(state).await
}
