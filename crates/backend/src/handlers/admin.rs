//! Ремонт денормализованных рейтингов и демо-данные (только администратор)

use axum::extract::{Path, State};
use axum::Json;
use contracts::domain::a001_car::aggregate::{CarId, RatingAggregate};
use contracts::domain::a002_review::aggregate::ReviewId;
use contracts::shared::api::ApiResponse;

use super::parse_id;
use crate::domain::a002_review::rating::RecomputeSummary;
use crate::shared::api_error::ApiError;
use crate::shared::state::AppState;
use crate::system::initialization::{seed_demo_data, SeedSummary};

/// POST /api/admin/cars/:id/recompute-rating
pub async fn recompute_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RatingAggregate>>, ApiError> {
    let id: CarId = parse_id(&id)?;
    match state.aggregator.recompute(id).await? {
        Some(aggregate) => Ok(Json(ApiResponse::with_message(
            aggregate,
            "Rating recomputed",
        ))),
        None => Err(ApiError::not_found("Car not found")),
    }
}

/// POST /api/admin/ratings/recompute-all
pub async fn recompute_all(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RecomputeSummary>>, ApiError> {
    let summary = state.aggregator.recompute_all().await?;
    Ok(Json(ApiResponse::data(summary)))
}

/// DELETE /api/admin/reviews/:id
pub async fn hard_delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id: ReviewId = parse_id(&id)?;
    state.reviews.hard_delete(id).await?;
    Ok(Json(ApiResponse::message("Review permanently deleted")))
}

/// POST /api/admin/seed
pub async fn seed(State(state): State<AppState>) -> Result<Json<ApiResponse<SeedSummary>>, ApiError> {
    let summary = seed_demo_data(&state.cars, &state.reviews).await?;
    let message = if summary.skipped {
        "Catalogue is not empty, nothing seeded"
    } else {
        "Demo data seeded"
    };
    Ok(Json(ApiResponse::with_message(summary, message)))
}
