//! Поиск по каталогу: полнотекстовый запрос, подсказки, популярное, фасеты

use contracts::domain::a001_car::aggregate::Car;
use contracts::projections::p001_car_search::dto::{
    FilterOptions, NumericRange, PopularSearch, SearchQuery, SuggestionsQuery,
};
use contracts::shared::api::Page;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::a001_car::repository::{CarFilter, CarOrder, CarRepository};
use crate::domain::a001_car::service::{
    parse_order, validate_price_range, CarError, DEFAULT_LIST_LIMIT,
};
use crate::shared::query::PageParams;

pub const DEFAULT_SUGGESTIONS_LIMIT: u64 = 5;
pub const DEFAULT_POPULAR_LIMIT: u64 = 10;

const SEARCH_SORTS: &[&str] = &[
    "relevance", "price", "-price", "year", "-year", "name", "-name",
];

// Веса совпадений для ранжирования
const NAME_WEIGHT: u32 = 3;
const BRAND_MODEL_WEIGHT: u32 = 2;
const DESCRIPTION_WEIGHT: u32 = 1;

pub struct SearchService {
    repo: Arc<CarRepository>,
}

impl SearchService {
    pub fn new(repo: Arc<CarRepository>) -> Self {
        Self { repo }
    }

    /// Search active cars. Without `sort` the newest come first;
    /// `relevance` without a query degrades to the same order.
    pub async fn search(&self, query: &SearchQuery) -> Result<Page<Car>, CarError> {
        let page = PageParams::parse(query.page, query.limit, DEFAULT_LIST_LIMIT)
            .map_err(CarError::Validation)?;
        validate_price_range(query.min_price, query.max_price)?;

        let terms = split_terms(query.q.as_deref());
        let filter = CarFilter {
            category: query.category,
            brand: query.brand.clone(),
            fuel_type: query.fuel_type,
            min_price: query.min_price,
            max_price: query.max_price,
            text_terms: terms.clone(),
            ..Default::default()
        };

        match query.sort.as_deref() {
            Some("relevance") if !terms.is_empty() => {
                let cars = self.repo.find_all(&filter).await?;
                Ok(paginate(rank_by_relevance(cars, &terms), page))
            }
            Some("relevance") | None => Ok(self.repo.list(&filter, CarOrder::NEWEST, page).await?),
            Some(raw) => {
                let order = parse_order(Some(raw), "relevance", SEARCH_SORTS)?;
                Ok(self.repo.list(&filter, order, page).await?)
            }
        }
    }

    /// Distinct names, brands and models containing `q`, in that order
    pub async fn suggestions(&self, query: &SuggestionsQuery) -> Result<Vec<String>, CarError> {
        let q = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| CarError::Validation("Search query is required".into()))?;
        let limit = query.limit.unwrap_or(DEFAULT_SUGGESTIONS_LIMIT).max(1) as usize;

        let rows = self.repo.name_brand_model_matching(q).await?;
        let needle = q.to_lowercase();
        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        let names = rows.iter().map(|(name, _, _)| name);
        let brands = rows.iter().map(|(_, brand, _)| brand);
        let models = rows.iter().map(|(_, _, model)| model);
        for candidate in names.chain(brands).chain(models) {
            if result.len() >= limit {
                break;
            }
            if candidate.to_lowercase().contains(&needle) && seen.insert(candidate.clone()) {
                result.push(candidate.clone());
            }
        }
        Ok(result)
    }

    /// Самые просматриваемые активные автомобили
    pub async fn popular(&self, limit: Option<u64>) -> Result<Vec<PopularSearch>, CarError> {
        let limit = limit.unwrap_or(DEFAULT_POPULAR_LIMIT).max(1);
        let cars = self.repo.most_viewed(limit).await?;
        Ok(cars
            .into_iter()
            .map(|car| PopularSearch {
                term: car.name,
                brand: car.brand,
                model: car.model,
                views: car.views,
            })
            .collect())
    }

    pub async fn filter_options(&self) -> Result<FilterOptions, CarError> {
        let rows = self.repo.facet_rows().await?;
        if rows.is_empty() {
            return Ok(FilterOptions::default());
        }

        let mut brands = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut fuel_types = BTreeSet::new();
        let mut conditions = BTreeSet::new();
        let mut price = NumericRange {
            min: f64::MAX,
            max: f64::MIN,
        };
        let mut year = NumericRange {
            min: i32::MAX,
            max: i32::MIN,
        };
        for (brand, category, fuel_type, condition, row_price, row_year) in rows {
            brands.insert(brand);
            categories.insert(category);
            if let Some(fuel_type) = fuel_type {
                fuel_types.insert(fuel_type);
            }
            conditions.insert(condition);
            price.min = price.min.min(row_price);
            price.max = price.max.max(row_price);
            year.min = year.min.min(row_year);
            year.max = year.max.max(row_year);
        }

        Ok(FilterOptions {
            brands: brands.into_iter().collect(),
            categories: categories.into_iter().collect(),
            fuel_types: fuel_types.into_iter().collect(),
            conditions: conditions.into_iter().collect(),
            price_range: price,
            year_range: year,
        })
    }
}

fn split_terms(q: Option<&str>) -> Vec<String> {
    q.map(|q| q.split_whitespace().map(str::to_lowercase).collect())
        .unwrap_or_default()
}

fn relevance(car: &Car, terms: &[String]) -> u32 {
    let name = car.name.to_lowercase();
    let brand = car.brand.to_lowercase();
    let model = car.model.to_lowercase();
    let description = car.description.to_lowercase();
    terms
        .iter()
        .map(|term| {
            let mut score = 0;
            if name.contains(term.as_str()) {
                score += NAME_WEIGHT;
            }
            if brand.contains(term.as_str()) || model.contains(term.as_str()) {
                score += BRAND_MODEL_WEIGHT;
            }
            if description.contains(term.as_str()) {
                score += DESCRIPTION_WEIGHT;
            }
            score
        })
        .sum()
}

/// Stable: cars with equal score keep the newest-first order of the input
fn rank_by_relevance(cars: Vec<Car>, terms: &[String]) -> Vec<Car> {
    let mut scored: Vec<(u32, Car)> = cars
        .into_iter()
        .map(|car| (relevance(&car, terms), car))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, car)| car).collect()
}

fn paginate(cars: Vec<Car>, page: PageParams) -> Page<Car> {
    let total = cars.len() as u64;
    let items = cars
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect();
    Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    }
}
