use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tracing::instrument;

use super::{
    error::{ErrorResponse, catalog_error, submit_error},
    session::{AdminContext, require_admin},
};
use crate::{
    AppState,
    catalog::{Project, ProjectRepository},
    draft::{AttachedFile, ProjectDraft},
    manager::ContentManager,
};

pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/projects", post(create_project))
        .route("/projects/{id}", put(update_project))
        .route("/projects/{id}", delete(delete_project))
        .layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/projects", get(list_projects))
        .merge(admin)
}

#[derive(Debug, Serialize)]
pub struct ListProjectsResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: String,
}

#[instrument(name = "projects.list", skip_all)]
async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<ListProjectsResponse>, ErrorResponse> {
    let projects = ProjectRepository::list(state.store())
        .await
        .map_err(|error| catalog_error(error, "failed to list projects"))?;

    Ok(Json(ListProjectsResponse { projects }))
}

#[instrument(name = "projects.create", skip_all, fields(admin = %ctx.email))]
async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, ErrorResponse> {
    let manager = require_manager(&state)?;

    let mut draft = manager.new_draft();
    read_draft_parts(&mut draft, manager, multipart).await?;

    let id = manager.submit(&mut draft).await.map_err(submit_error)?;
    Ok(Json(SubmitResponse { id }))
}

#[instrument(name = "projects.update", skip_all, fields(project_id = %id, admin = %ctx.email))]
async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, ErrorResponse> {
    let manager = require_manager(&state)?;

    let mut draft = manager.new_draft();
    draft.id = Some(id);
    read_draft_parts(&mut draft, manager, multipart).await?;

    let id = manager.submit(&mut draft).await.map_err(submit_error)?;
    Ok(Json(SubmitResponse { id }))
}

#[instrument(name = "projects.delete", skip_all, fields(project_id = %id, admin = %ctx.email))]
async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    let manager = require_manager(&state)?;

    manager
        .delete(&id)
        .await
        .map_err(|error| catalog_error(error, "failed to delete project"))?;

    Ok(StatusCode::NO_CONTENT)
}

fn require_manager(state: &AppState) -> Result<&ContentManager, ErrorResponse> {
    state.manager().ok_or_else(|| {
        ErrorResponse::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "media host not configured",
        )
    })
}

/// Builds the draft from multipart parts in arrival order. Text fields set
/// the record fields; `existing_image` parts carry already-durable URLs (an
/// edit's untouched gallery); `image` parts are fresh payloads to upload.
async fn read_draft_parts(
    draft: &mut ProjectDraft,
    manager: &ContentManager,
    mut multipart: Multipart,
) -> Result<(), ErrorResponse> {
    let bad_request =
        |message: &str| ErrorResponse::new(StatusCode::BAD_REQUEST, message.to_string());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("malformed multipart payload"))?
    {
        match field.name().unwrap_or_default() {
            "name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| bad_request("invalid name field"))?;
                draft.set_name(value);
            }
            "description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| bad_request("invalid description field"))?;
                draft.set_description(value);
            }
            "category" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| bad_request("invalid category field"))?;
                draft.set_category(value);
            }
            "existing_image" => {
                let url = field
                    .text()
                    .await
                    .map_err(|_| bad_request("invalid existing_image field"))?;
                draft.attach_uploaded(url);
            }
            "image" => {
                let name = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("failed to read image payload"))?;

                draft.attach_images(
                    vec![AttachedFile {
                        name,
                        content_type,
                        bytes: bytes.to_vec(),
                    }],
                    manager.previews(),
                );
            }
            other => {
                tracing::debug!(field = %other, "ignoring unknown multipart field");
            }
        }
    }

    Ok(())
}
