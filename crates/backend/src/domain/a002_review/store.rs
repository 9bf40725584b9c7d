use async_trait::async_trait;
use contracts::domain::a001_car::aggregate::CarId;
use contracts::domain::a002_review::aggregate::{Review, ReviewId};
use contracts::shared::api::Page;

use crate::shared::query::PageParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Нарушен уникальный индекс (car_id, user_id)
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSortField {
    Rating,
    CreatedAt,
    HelpfulCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSort {
    pub field: ReviewSortField,
    pub descending: bool,
}

impl ReviewSort {
    /// `rating | createdAt | helpfulCount`
    pub fn from_field(field: &str, descending: bool) -> Option<Self> {
        let field = match field {
            "rating" => ReviewSortField::Rating,
            "createdAt" => ReviewSortField::CreatedAt,
            "helpfulCount" => ReviewSortField::HelpfulCount,
            _ => return None,
        };
        Some(Self { field, descending })
    }
}

/// Review persistence. Writes are single-row; nothing here touches cars.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Оценки активных отзывов автомобиля, порядок не важен
    async fn find_active_ratings_by_car(&self, car_id: CarId) -> anyhow::Result<Vec<i32>>;

    /// Any review of the pair, active or soft-deleted
    async fn exists_for_user_and_car(&self, user_id: &str, car_id: CarId) -> anyhow::Result<bool>;

    /// По ID, включая удалённые
    async fn get_by_id(&self, id: ReviewId) -> anyhow::Result<Option<Review>>;

    async fn insert(&self, review: &Review) -> anyhow::Result<InsertOutcome>;

    /// Пишет title, text, rating, updated_at; `false`, если отзыв уже неактивен
    async fn update_content(&self, review: &Review) -> anyhow::Result<bool>;

    /// `true` if the review was active and is now inactive
    async fn soft_delete(&self, id: ReviewId) -> anyhow::Result<bool>;

    async fn hard_delete(&self, id: ReviewId) -> anyhow::Result<bool>;

    /// Новое значение счётчика; `None`, если отзыв не найден или удалён
    async fn increment_helpful(&self, id: ReviewId) -> anyhow::Result<Option<i32>>;

    async fn increment_report(&self, id: ReviewId) -> anyhow::Result<bool>;

    async fn list_active(
        &self,
        car_id: Option<CarId>,
        sort: ReviewSort,
        page: PageParams,
    ) -> anyhow::Result<Page<Review>>;
}
