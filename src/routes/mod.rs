pub mod error;
pub mod projects;
pub mod session;
pub mod testimonials;

use axum::Router;

use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(session::router())
        .merge(projects::router(state))
        .merge(testimonials::router())
}
