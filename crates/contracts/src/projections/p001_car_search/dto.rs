use serde::{Deserialize, Serialize};

use crate::domain::a001_car::aggregate::{Category, FuelType};

/// Параметры поиска (`GET /api/search`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// relevance | price | -price | year | -year | name | -name
    pub sort: Option<String>,
    pub category: Option<Category>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub brand: Option<String>,
    pub fuel_type: Option<FuelType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionsQuery {
    pub q: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

/// Популярный запрос (по просмотрам)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularSearch {
    pub term: String,
    pub brand: String,
    pub model: String,
    pub views: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange<T> {
    pub min: T,
    pub max: T,
}

/// Доступные значения фильтров по активным автомобилям
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub brands: Vec<String>,
    pub categories: Vec<String>,
    pub fuel_types: Vec<String>,
    pub conditions: Vec<String>,
    pub price_range: NumericRange<f64>,
    pub year_range: NumericRange<i32>,
}
