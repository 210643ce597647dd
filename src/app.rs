use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, routes};

pub struct Server;

impl Server {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .nest("/v1", routes::router(state.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn serve(state: AppState) -> anyhow::Result<()> {
        let listen_addr = state.config().listen_addr.clone();
        let app = Self::router(state);

        let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
        tracing::info!(addr = %listen_addr, "server listening");
        axum::serve(listener, app).await?;
        Ok(())
    }
}
