use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a001_car::aggregate::CarId;
use contracts::domain::a002_review::aggregate::{
    CreateReviewDto, HelpfulResponse, Review, ReviewId, ReviewListQuery, ReviewStats,
    UpdateReviewDto,
};
use contracts::shared::api::{ApiResponse, ListResponse};

use super::parse_id;
use crate::shared::api_error::ApiError;
use crate::shared::state::AppState;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/reviews
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ReviewListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<Review>>, ApiError> {
    let Query(query) = query?;
    let page = state.reviews.list(&query).await?;
    Ok(Json(ListResponse::from_page(page)))
}

/// GET /api/reviews/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Review>>, ApiError> {
    let id: ReviewId = parse_id(&id)?;
    Ok(Json(ApiResponse::data(state.reviews.get(id).await?)))
}

/// POST /api/reviews
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    dto: Result<Json<CreateReviewDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Review>>), ApiError> {
    let Json(dto) = dto?;
    let review = state.reviews.create(&user.actor(), dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(review, "Review created successfully")),
    ))
}

/// PUT /api/reviews/:id
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    dto: Result<Json<UpdateReviewDto>, JsonRejection>,
) -> Result<Json<ApiResponse<Review>>, ApiError> {
    let id: ReviewId = parse_id(&id)?;
    let Json(dto) = dto?;
    let review = state.reviews.update(&user.actor(), id, dto).await?;
    Ok(Json(ApiResponse::with_message(review, "Review updated successfully")))
}

/// DELETE /api/reviews/:id
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id: ReviewId = parse_id(&id)?;
    state.reviews.delete(&user.actor(), id).await?;
    Ok(Json(ApiResponse::message("Review deleted successfully")))
}

/// PUT /api/reviews/:id/helpful
pub async fn mark_helpful(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<HelpfulResponse>>, ApiError> {
    let id: ReviewId = parse_id(&id)?;
    let helpful_count = state.reviews.mark_helpful(id).await?;
    Ok(Json(ApiResponse::with_message(
        HelpfulResponse { helpful_count },
        "Review marked as helpful",
    )))
}

/// PUT /api/reviews/:id/report
pub async fn report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id: ReviewId = parse_id(&id)?;
    state.reviews.report(id).await?;
    Ok(Json(ApiResponse::message("Review reported successfully")))
}

/// GET /api/reviews/stats/:car_id
pub async fn stats(
    State(state): State<AppState>,
    Path(car_id): Path<String>,
) -> Result<Json<ApiResponse<ReviewStats>>, ApiError> {
    let car_id: CarId = parse_id(&car_id)?;
    Ok(Json(ApiResponse::data(state.reviews.stats(car_id).await?)))
}
