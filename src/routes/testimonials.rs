use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::{ErrorResponse, catalog_error};
use crate::{
    AppState,
    catalog::{Testimonial, TestimonialRepository},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/testimonials", get(list_testimonials))
        .route("/testimonials", post(create_testimonial))
}

#[derive(Debug, Deserialize)]
pub struct ListTestimonialsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListTestimonialsResponse {
    pub testimonials: Vec<Testimonial>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTestimonialRequest {
    pub name: Option<String>,
    pub message: String,
}

#[instrument(name = "testimonials.list", skip_all)]
async fn list_testimonials(
    State(state): State<AppState>,
    Query(query): Query<ListTestimonialsQuery>,
) -> Result<Json<ListTestimonialsResponse>, ErrorResponse> {
    let testimonials = TestimonialRepository::list(state.store(), query.limit)
        .await
        .map_err(|error| catalog_error(error, "failed to list testimonials"))?;

    Ok(Json(ListTestimonialsResponse { testimonials }))
}

#[instrument(name = "testimonials.create", skip_all)]
async fn create_testimonial(
    State(state): State<AppState>,
    Json(payload): Json<CreateTestimonialRequest>,
) -> Result<Json<Testimonial>, ErrorResponse> {
    let testimonial =
        TestimonialRepository::create(state.store(), payload.name.as_deref(), &payload.message)
            .await
            .map_err(|error| catalog_error(error, "failed to save testimonial"))?;

    Ok(Json(testimonial))
}
