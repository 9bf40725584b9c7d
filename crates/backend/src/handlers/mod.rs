pub mod a001_car;
pub mod a002_review;
pub mod admin;
pub mod p001_car_search;

use contracts::domain::common::AggregateId;

use crate::shared::api_error::ApiError;

/// Path id → typed id; malformed ids are a 400, not a 404
pub(crate) fn parse_id<T: AggregateId>(raw: &str) -> Result<T, ApiError> {
    T::from_string(raw).map_err(|_| ApiError::bad_request("Invalid ID format"))
}
