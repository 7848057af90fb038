//! Person registration and lookup routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::pagination::{Page, Pagination};
use crate::models::person::{CreatePerson, Person};
use crate::services::person as person_service;
use crate::AppState;

/// POST /api/people — validate, normalize, and register a person.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreatePerson>,
) -> Result<impl IntoResponse, AppError> {
    let person = person_service::create(&state.store, &body).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success(person, "Person registered successfully"),
    ))
}

/// GET /api/people — list people with pagination.
pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Page<Person>>>, AppError> {
    let result = person_service::list(&state.store, &pagination).await?;
    Ok(ApiResponse::success(result, "People listed successfully"))
}

/// GET /api/people/{id} — fetch one person by id.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Person>>, AppError> {
    let person = person_service::find_by_id(&state.store, id).await?;
    Ok(ApiResponse::success(person, "Person found"))
}
