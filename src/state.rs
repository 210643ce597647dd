use std::sync::Arc;

use crate::{
    auth::AccessGuard, config::RemoteServerConfig, manager::ContentManager, media::MediaHost,
    store::DocumentStore,
};

#[derive(Clone)]
pub struct AppState {
    config: RemoteServerConfig,
    http_client: reqwest::Client,
    guard: Arc<AccessGuard>,
    store: Arc<dyn DocumentStore>,
    manager: Option<Arc<ContentManager>>,
}

impl AppState {
    pub fn new(
        config: RemoteServerConfig,
        guard: Arc<AccessGuard>,
        store: Arc<dyn DocumentStore>,
        media: Option<Arc<dyn MediaHost>>,
        http_client: reqwest::Client,
    ) -> Self {
        let manager = media.map(|media| Arc::new(ContentManager::new(Arc::clone(&store), media)));

        Self {
            config,
            http_client,
            guard,
            store,
            manager,
        }
    }

    pub fn config(&self) -> &RemoteServerConfig {
        &self.config
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    pub fn store(&self) -> &dyn DocumentStore {
        &*self.store
    }

    /// `None` when the media host is not configured; admin mutations are
    /// unavailable in that case.
    pub fn manager(&self) -> Option<&ContentManager> {
        self.manager.as_deref()
    }
}
