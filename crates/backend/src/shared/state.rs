use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::a001_car::repository::CarRepository;
use crate::domain::a001_car::service::CarService;
use crate::domain::a001_car::store::CarStore;
use crate::domain::a002_review::rating::RatingAggregator;
use crate::domain::a002_review::repository::ReviewRepository;
use crate::domain::a002_review::service::ReviewService;
use crate::domain::a002_review::store::ReviewStore;
use crate::projections::p001_car_search::service::SearchService;

/// Сервисы, доступные обработчикам через `State`
#[derive(Clone)]
pub struct AppState {
    pub cars: Arc<CarService>,
    pub reviews: Arc<ReviewService>,
    pub search: Arc<SearchService>,
    pub aggregator: Arc<RatingAggregator>,
}

impl AppState {
    /// Wire repositories and services over one connection pool
    pub fn new(conn: DatabaseConnection) -> Self {
        let car_repo = Arc::new(CarRepository::new(conn.clone()));
        let car_store: Arc<dyn CarStore> = car_repo.clone();
        let review_store: Arc<dyn ReviewStore> = Arc::new(ReviewRepository::new(conn));

        let aggregator = Arc::new(RatingAggregator::new(
            review_store.clone(),
            car_store.clone(),
        ));

        Self {
            cars: Arc::new(CarService::new(car_repo.clone())),
            reviews: Arc::new(ReviewService::new(
                review_store,
                car_store,
                aggregator.clone(),
            )),
            search: Arc::new(SearchService::new(car_repo)),
            aggregator,
        }
    }
}
