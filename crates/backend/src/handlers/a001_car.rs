use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a001_car::aggregate::{CarDto, CarId, CarListQuery, CarView};
use contracts::shared::api::{ApiResponse, ItemsResponse, ListResponse};
use contracts::projections::p001_car_search::dto::LimitQuery;

use super::parse_id;
use crate::shared::api_error::ApiError;
use crate::shared::state::AppState;

/// GET /api/cars
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<CarListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<CarView>>, ApiError> {
    let Query(query) = query?;
    let page = state.cars.list(&query).await?;
    Ok(Json(ListResponse::from_page(page)))
}

/// GET /api/cars/featured/list
pub async fn featured(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<ItemsResponse<CarView>>, ApiError> {
    let Query(query) = query?;
    let cars = state.cars.featured(query.limit).await?;
    Ok(Json(ItemsResponse::new(cars)))
}

/// GET /api/cars/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CarView>>, ApiError> {
    let id: CarId = parse_id(&id)?;
    let car = state.cars.get_and_count_view(id).await?;
    Ok(Json(ApiResponse::data(car.into())))
}

/// POST /api/cars (admin)
pub async fn create(
    State(state): State<AppState>,
    dto: Result<Json<CarDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CarView>>), ApiError> {
    let Json(dto) = dto?;
    let car = state.cars.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(car.into(), "Car created successfully")),
    ))
}

/// PUT /api/cars/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    dto: Result<Json<CarDto>, JsonRejection>,
) -> Result<Json<ApiResponse<CarView>>, ApiError> {
    let id: CarId = parse_id(&id)?;
    let Json(dto) = dto?;
    let car = state.cars.update(id, dto).await?;
    Ok(Json(ApiResponse::with_message(car.into(), "Car updated successfully")))
}

/// DELETE /api/cars/:id (admin)
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id: CarId = parse_id(&id)?;
    state.cars.delete(id).await?;
    Ok(Json(ApiResponse::message("Car deleted successfully")))
}
