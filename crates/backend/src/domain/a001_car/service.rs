use chrono::Datelike;
use contracts::domain::a001_car::aggregate::{Car, CarDto, CarId, CarListQuery};
use contracts::shared::api::Page;
use std::sync::Arc;
use thiserror::Error;

use super::repository::{CarFilter, CarOrder, CarRepository};
use crate::shared::query::{PageParams, SortSpec};

pub const DEFAULT_LIST_LIMIT: u64 = 12;
pub const DEFAULT_FEATURED_LIMIT: u64 = 6;

const LIST_SORTS: &[&str] = &[
    "price", "-price", "year", "-year", "name", "-name", "createdAt", "-createdAt",
];

/// Ошибки каталога автомобилей
#[derive(Debug, Error)]
pub enum CarError {
    #[error("{0}")]
    Validation(String),

    #[error("Car not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct CarService {
    repo: Arc<CarRepository>,
}

impl CarService {
    pub fn new(repo: Arc<CarRepository>) -> Self {
        Self { repo }
    }

    /// Создание нового автомобиля
    pub async fn create(&self, dto: CarDto) -> Result<Car, CarError> {
        let mut car = Car::new_for_insert(dto);

        // Валидация
        car.validate(current_year()).map_err(CarError::Validation)?;

        // Before write
        car.before_write();

        self.repo.insert(&car).await?;
        tracing::info!(car_id = %car.id, "car created");
        Ok(car)
    }

    /// Обновление существующего автомобиля (удалённые тоже можно править)
    pub async fn update(&self, id: CarId, dto: CarDto) -> Result<Car, CarError> {
        let mut car = self.repo.get_by_id(id).await?.ok_or(CarError::NotFound)?;

        car.update(dto);
        car.validate(current_year()).map_err(CarError::Validation)?;
        car.before_write();

        self.repo.update(&car).await?;
        Ok(car)
    }

    /// Мягкое удаление автомобиля
    pub async fn delete(&self, id: CarId) -> Result<(), CarError> {
        if self.repo.soft_delete(id).await? {
            tracing::info!(car_id = %id, "car deactivated");
            Ok(())
        } else {
            Err(CarError::NotFound)
        }
    }

    /// Карточка автомобиля; каждый просмотр увеличивает счётчик
    pub async fn get_and_count_view(&self, id: CarId) -> Result<Car, CarError> {
        let mut car = self.repo.get_active(id).await?.ok_or(CarError::NotFound)?;
        self.repo.increment_views(id).await?;
        car.views += 1;
        Ok(car)
    }

    /// Список активных автомобилей с фильтрами и пагинацией
    pub async fn list(&self, query: &CarListQuery) -> Result<Page<Car>, CarError> {
        let page = PageParams::parse(query.page, query.limit, DEFAULT_LIST_LIMIT)
            .map_err(CarError::Validation)?;
        let order = parse_order(query.sort.as_deref(), "-createdAt", LIST_SORTS)?;
        validate_price_range(query.min_price, query.max_price)?;

        let filter = CarFilter {
            category: query.category,
            condition: query.condition,
            brand: query.brand.clone(),
            fuel_type: query.fuel_type,
            featured: query.featured,
            min_price: query.min_price,
            max_price: query.max_price,
            text_terms: Vec::new(),
        };
        Ok(self.repo.list(&filter, order, page).await?)
    }

    /// Есть ли в БД хотя бы один автомобиль (включая удалённые)
    pub async fn is_catalogue_empty(&self) -> Result<bool, CarError> {
        Ok(self.repo.count_all().await? == 0)
    }

    pub async fn featured(&self, limit: Option<u64>) -> Result<Vec<Car>, CarError> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT).max(1);
        Ok(self.repo.featured(limit).await?)
    }
}

pub(crate) fn parse_order(
    raw: Option<&str>,
    default: &str,
    allowed: &[&str],
) -> Result<CarOrder, CarError> {
    let sort = SortSpec::parse(raw, default, allowed).map_err(CarError::Validation)?;
    CarOrder::from_field(sort.field, sort.descending)
        .ok_or_else(|| CarError::Validation("Invalid sort field".into()))
}

pub(crate) fn validate_price_range(min: Option<f64>, max: Option<f64>) -> Result<(), CarError> {
    for price in [min, max].into_iter().flatten() {
        if !price.is_finite() || price < 0.0 {
            return Err(CarError::Validation(
                "Price filters must be positive numbers".into(),
            ));
        }
    }
    Ok(())
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}
