use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use contracts::domain::a001_car::aggregate::CarView;
use contracts::projections::p001_car_search::dto::{
    FilterOptions, LimitQuery, PopularSearch, SearchQuery, SuggestionsQuery,
};
use contracts::shared::api::{ApiResponse, ItemsResponse, ListResponse};

use crate::shared::api_error::ApiError;
use crate::shared::state::AppState;

/// GET /api/search
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<ListResponse<CarView>>, ApiError> {
    let Query(query) = query?;
    let page = state.search.search(&query).await?;
    Ok(Json(ListResponse::from_page(page).with_query(query.q)))
}

/// GET /api/search/suggestions
pub async fn suggestions(
    State(state): State<AppState>,
    query: Result<Query<SuggestionsQuery>, QueryRejection>,
) -> Result<Json<ItemsResponse<String>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(ItemsResponse::new(state.search.suggestions(&query).await?)))
}

/// GET /api/search/popular
pub async fn popular(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<ItemsResponse<PopularSearch>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(ItemsResponse::new(state.search.popular(query.limit).await?)))
}

/// GET /api/search/filters
pub async fn filter_options(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FilterOptions>>, ApiError> {
    Ok(Json(ApiResponse::data(state.search.filter_options().await?)))
}
