use async_trait::async_trait;
use contracts::domain::a001_car::aggregate::CarId;

/// Результат частичного обновления рейтинга
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingUpdate {
    Updated,
    NotFound,
}

/// Car persistence as seen by the review domain.
#[async_trait]
pub trait CarStore: Send + Sync {
    /// Существует и не удалён
    async fn is_active(&self, id: CarId) -> anyhow::Result<bool>;

    /// Partial update of `average_rating` / `review_count` only.
    /// No other column is read, validated or rewritten.
    async fn update_rating_fields(
        &self,
        id: CarId,
        average_rating: f64,
        review_count: i32,
    ) -> anyhow::Result<RatingUpdate>;

    /// Все автомобили, включая удалённые
    async fn all_ids(&self) -> anyhow::Result<Vec<CarId>>;
}
