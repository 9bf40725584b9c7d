//! In-memory stores for service and aggregator tests

use async_trait::async_trait;
use contracts::domain::a001_car::aggregate::{CarId, RatingAggregate};
use contracts::domain::a002_review::aggregate::{Review, ReviewId};
use contracts::shared::api::Page;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::store::{InsertOutcome, ReviewSort, ReviewSortField, ReviewStore};
use crate::domain::a001_car::store::{CarStore, RatingUpdate};
use crate::shared::query::PageParams;

#[derive(Default)]
pub struct InMemoryReviews {
    rows: Mutex<Vec<Review>>,
    lose_insert_race: AtomicBool,
    deactivate_before_update: AtomicBool,
}

impl InMemoryReviews {
    /// `insert` reports Duplicate as if a concurrent insert won
    pub fn lose_insert_race(&self, lose: bool) {
        self.lose_insert_race.store(lose, Ordering::SeqCst);
    }

    /// Отзыв мягко удаляется между чтением и записью `update_content`
    pub fn deactivate_before_update(&self, on: bool) {
        self.deactivate_before_update.store(on, Ordering::SeqCst);
    }

    fn with_row<T>(&self, id: ReviewId, f: impl FnOnce(&mut Review) -> T) -> Option<T> {
        let mut rows = self.rows.lock().unwrap();
        rows.iter_mut().find(|r| r.id == id).map(f)
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviews {
    async fn find_active_ratings_by_car(&self, car_id: CarId) -> anyhow::Result<Vec<i32>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.car_id == car_id && r.is_active())
            .map(|r| r.rating)
            .collect())
    }

    async fn exists_for_user_and_car(&self, user_id: &str, car_id: CarId) -> anyhow::Result<bool> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().any(|r| r.car_id == car_id && r.user_id == user_id))
    }

    async fn get_by_id(&self, id: ReviewId) -> anyhow::Result<Option<Review>> {
        Ok(self.with_row(id, |r| r.clone()))
    }

    async fn insert(&self, review: &Review) -> anyhow::Result<InsertOutcome> {
        let mut rows = self.rows.lock().unwrap();
        if self.lose_insert_race.load(Ordering::SeqCst)
            || rows
                .iter()
                .any(|r| r.car_id == review.car_id && r.user_id == review.user_id)
        {
            return Ok(InsertOutcome::Duplicate);
        }
        rows.push(review.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn update_content(&self, review: &Review) -> anyhow::Result<bool> {
        let deactivate = self.deactivate_before_update.load(Ordering::SeqCst);
        Ok(self
            .with_row(review.id, |r| {
                if deactivate {
                    r.metadata.deactivate();
                }
                if !r.is_active() {
                    return false;
                }
                r.title = review.title.clone();
                r.text = review.text.clone();
                r.rating = review.rating;
                r.metadata.updated_at = review.metadata.updated_at;
                true
            })
            .unwrap_or(false))
    }

    async fn soft_delete(&self, id: ReviewId) -> anyhow::Result<bool> {
        Ok(self
            .with_row(id, |r| {
                let was_active = r.is_active();
                r.metadata.deactivate();
                was_active
            })
            .unwrap_or(false))
    }

    async fn hard_delete(&self, id: ReviewId) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }

    async fn increment_helpful(&self, id: ReviewId) -> anyhow::Result<Option<i32>> {
        Ok(self
            .with_row(id, |r| {
                r.is_active().then(|| {
                    r.helpful_count += 1;
                    r.helpful_count
                })
            })
            .flatten())
    }

    async fn increment_report(&self, id: ReviewId) -> anyhow::Result<bool> {
        Ok(self
            .with_row(id, |r| {
                if r.is_active() {
                    r.report_count += 1;
                }
                r.is_active()
            })
            .unwrap_or(false))
    }

    async fn list_active(
        &self,
        car_id: Option<CarId>,
        sort: ReviewSort,
        page: PageParams,
    ) -> anyhow::Result<Page<Review>> {
        let rows = self.rows.lock().unwrap();
        let mut items: Vec<Review> = rows
            .iter()
            .filter(|r| r.is_active() && car_id.map_or(true, |c| r.car_id == c))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            let ord = match sort.field {
                ReviewSortField::Rating => a.rating.cmp(&b.rating),
                ReviewSortField::CreatedAt => a.metadata.created_at.cmp(&b.metadata.created_at),
                ReviewSortField::HelpfulCount => a.helpful_count.cmp(&b.helpful_count),
            };
            if sort.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Page {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }
}

/// Cars reduced to what the review domain sees: activity and the cached aggregate.
#[derive(Default)]
pub struct InMemoryCars {
    cars: Mutex<HashMap<CarId, (bool, RatingAggregate)>>,
    fail_updates: AtomicBool,
    update_calls: AtomicUsize,
}

impl InMemoryCars {
    pub fn with_cars(ids: &[CarId]) -> Self {
        let cars = Self::default();
        for id in ids {
            cars.add(*id);
        }
        cars
    }

    pub fn add(&self, id: CarId) {
        self.cars
            .lock()
            .unwrap()
            .insert(id, (true, RatingAggregate::EMPTY));
    }

    pub fn deactivate(&self, id: CarId) {
        if let Some(entry) = self.cars.lock().unwrap().get_mut(&id) {
            entry.0 = false;
        }
    }

    /// Подменить кэш, имитируя рассинхронизацию
    pub fn set_aggregate(&self, id: CarId, aggregate: RatingAggregate) {
        if let Some(entry) = self.cars.lock().unwrap().get_mut(&id) {
            entry.1 = aggregate;
        }
    }

    pub fn aggregate(&self, id: CarId) -> Option<RatingAggregate> {
        self.cars.lock().unwrap().get(&id).map(|(_, agg)| *agg)
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CarStore for InMemoryCars {
    async fn is_active(&self, id: CarId) -> anyhow::Result<bool> {
        Ok(self
            .cars
            .lock()
            .unwrap()
            .get(&id)
            .map_or(false, |(active, _)| *active))
    }

    async fn update_rating_fields(
        &self,
        id: CarId,
        average_rating: f64,
        review_count: i32,
    ) -> anyhow::Result<RatingUpdate> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            anyhow::bail!("car store unavailable");
        }
        let mut cars = self.cars.lock().unwrap();
        match cars.get_mut(&id) {
            Some(entry) => {
                entry.1 = RatingAggregate {
                    average_rating,
                    review_count,
                };
                Ok(RatingUpdate::Updated)
            }
            None => Ok(RatingUpdate::NotFound),
        }
    }

    async fn all_ids(&self) -> anyhow::Result<Vec<CarId>> {
        Ok(self.cars.lock().unwrap().keys().copied().collect())
    }
}
