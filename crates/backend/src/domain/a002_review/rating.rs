//! Денормализация рейтинга: `average_rating` / `review_count` автомобиля
//! всегда выводятся из множества активных отзывов.

use contracts::domain::a001_car::aggregate::{CarId, RatingAggregate};
use contracts::domain::a002_review::aggregate::{MAX_RATING, MIN_RATING};
use maplit::btreemap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::store::ReviewStore;
use crate::domain::a001_car::store::{CarStore, RatingUpdate};

/// Mean rounded half away from zero to one decimal.
///
/// Evaluated on integers: `tenths = round(sum * 10 / count)`, so 4.25 and 4.15
/// land on 4.3 and 4.2 regardless of binary floating point.
pub fn compute_aggregate(ratings: &[i32]) -> RatingAggregate {
    if ratings.is_empty() {
        return RatingAggregate::EMPTY;
    }
    let count = ratings.len() as i64;
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    // ratings are positive, half-up == half-away-from-zero
    let tenths = (sum * 20 + count) / (2 * count);
    RatingAggregate {
        average_rating: tenths as f64 / 10.0,
        review_count: count as i32,
    }
}

/// Количество отзывов по каждой оценке, ключи "1".."5"
pub fn rating_distribution(ratings: &[i32]) -> BTreeMap<String, i32> {
    let mut counts = btreemap! {
        "1".to_string() => 0,
        "2".to_string() => 0,
        "3".to_string() => 0,
        "4".to_string() => 0,
        "5".to_string() => 0,
    };
    for rating in ratings.iter().filter(|r| (MIN_RATING..=MAX_RATING).contains(*r)) {
        if let Some(count) = counts.get_mut(&rating.to_string()) {
            *count += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeSummary {
    pub updated: usize,
    pub failed: usize,
}

pub struct RatingAggregator {
    reviews: Arc<dyn ReviewStore>,
    cars: Arc<dyn CarStore>,
}

impl RatingAggregator {
    pub fn new(reviews: Arc<dyn ReviewStore>, cars: Arc<dyn CarStore>) -> Self {
        Self { reviews, cars }
    }

    /// Recompute and store the aggregate of one car.
    ///
    /// `Ok(None)` when the car does not exist. No lock is taken: a concurrent
    /// mutation may overwrite the result, and its own recompute repairs it.
    pub async fn recompute(&self, car_id: CarId) -> anyhow::Result<Option<RatingAggregate>> {
        let ratings = self.reviews.find_active_ratings_by_car(car_id).await?;
        let aggregate = compute_aggregate(&ratings);

        match self
            .cars
            .update_rating_fields(car_id, aggregate.average_rating, aggregate.review_count)
            .await?
        {
            RatingUpdate::Updated => {
                tracing::debug!(
                    car_id = %car_id,
                    average_rating = aggregate.average_rating,
                    review_count = aggregate.review_count,
                    "rating recomputed"
                );
                Ok(Some(aggregate))
            }
            RatingUpdate::NotFound => {
                tracing::debug!(car_id = %car_id, "rating recompute skipped: car not found");
                Ok(None)
            }
        }
    }

    /// Вызывается после каждой мутации отзыва, влияющей на рейтинг.
    /// Ошибка логируется и не всплывает: мутация отзыва уже сохранена.
    pub async fn refresh_after_mutation(&self, car_id: CarId) {
        if let Err(e) = self.recompute(car_id).await {
            tracing::error!(car_id = %car_id, error = %e, "failed to update car rating");
        }
    }

    /// Пересчёт по всем автомобилям (ремонт после импорта)
    pub async fn recompute_all(&self) -> anyhow::Result<RecomputeSummary> {
        let mut summary = RecomputeSummary::default();
        for car_id in self.cars.all_ids().await? {
            match self.recompute(car_id).await {
                Ok(Some(_)) => summary.updated += 1,
                Ok(None) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(car_id = %car_id, error = %e, "bulk rating recompute failed");
                }
            }
        }
        tracing::info!(
            updated = summary.updated,
            failed = summary.failed,
            "bulk rating recompute finished"
        );
        Ok(summary)
    }
}
