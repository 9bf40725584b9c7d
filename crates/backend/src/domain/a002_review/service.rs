use contracts::domain::a001_car::aggregate::CarId;
use contracts::domain::a002_review::aggregate::{
    CreateReviewDto, Review, ReviewId, ReviewListQuery, ReviewStats, UpdateReviewDto,
};
use contracts::domain::common::AggregateId;
use contracts::shared::api::Page;
use contracts::system::auth::TokenClaims;
use std::sync::Arc;
use thiserror::Error;

use super::rating::{compute_aggregate, rating_distribution, RatingAggregator};
use super::store::{InsertOutcome, ReviewSort, ReviewStore};
use crate::domain::a001_car::store::CarStore;
use crate::shared::query::{PageParams, SortSpec};

pub const DEFAULT_LIST_LIMIT: u64 = 10;

const LIST_SORTS: &[&str] = &[
    "rating",
    "-rating",
    "createdAt",
    "-createdAt",
    "helpfulCount",
    "-helpfulCount",
];

/// Ошибки операций с отзывами
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0}")]
    Validation(String),

    #[error("You have already reviewed this car")]
    Duplicate,

    #[error("Car not found")]
    CarNotFound,

    #[error("Review not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Кто выполняет операцию
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub is_admin: bool,
}

impl From<&TokenClaims> for Actor {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            is_admin: claims.is_admin,
        }
    }
}

/// Review mutations. Every write that can change the active rating set of a car
/// is followed by exactly one `refresh_after_mutation` for that car.
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    cars: Arc<dyn CarStore>,
    aggregator: Arc<RatingAggregator>,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        cars: Arc<dyn CarStore>,
        aggregator: Arc<RatingAggregator>,
    ) -> Self {
        Self {
            reviews,
            cars,
            aggregator,
        }
    }

    pub async fn create(&self, actor: &Actor, dto: CreateReviewDto) -> Result<Review, ReviewError> {
        let car_id = parse_car_id(&dto.car_id)?;
        let mut review = Review::new_for_insert(car_id, actor.user_id.clone(), &dto);
        review.before_write();
        review.validate().map_err(ReviewError::Validation)?;

        if !self.cars.is_active(car_id).await? {
            return Err(ReviewError::CarNotFound);
        }
        if self
            .reviews
            .exists_for_user_and_car(&actor.user_id, car_id)
            .await?
        {
            return Err(ReviewError::Duplicate);
        }
        // Гонка двух одновременных вставок решается уникальным индексом
        if self.reviews.insert(&review).await? == InsertOutcome::Duplicate {
            return Err(ReviewError::Duplicate);
        }
        tracing::info!(review_id = %review.id, car_id = %car_id, rating = review.rating, "review created");

        self.aggregator.refresh_after_mutation(car_id).await;
        Ok(review)
    }

    /// Only the owner may edit. Aggregation runs only when the rating actually changed.
    pub async fn update(
        &self,
        actor: &Actor,
        id: ReviewId,
        dto: UpdateReviewDto,
    ) -> Result<Review, ReviewError> {
        let mut review = self.get(id).await?;
        if review.user_id != actor.user_id {
            return Err(ReviewError::Forbidden("Not authorized to update this review"));
        }

        let rating_changed = review.apply(&dto);
        review.before_write();
        review.validate().map_err(ReviewError::Validation)?;

        if !self.reviews.update_content(&review).await? {
            // мягко удалён между чтением и записью
            return Err(ReviewError::NotFound);
        }
        if rating_changed {
            self.aggregator.refresh_after_mutation(review.car_id).await;
        }
        Ok(review)
    }

    /// Мягкое удаление: владелец или администратор
    pub async fn delete(&self, actor: &Actor, id: ReviewId) -> Result<(), ReviewError> {
        let review = self.get(id).await?;
        if review.user_id != actor.user_id && !actor.is_admin {
            return Err(ReviewError::Forbidden("Not authorized to delete this review"));
        }

        if !self.reviews.soft_delete(id).await? {
            // удалён параллельным запросом, пересчёт сделал он
            return Err(ReviewError::NotFound);
        }
        tracing::info!(review_id = %id, car_id = %review.car_id, "review deactivated");

        self.aggregator.refresh_after_mutation(review.car_id).await;
        Ok(())
    }

    /// Физическое удаление (только администратор; маршрут защищён middleware)
    pub async fn hard_delete(&self, id: ReviewId) -> Result<(), ReviewError> {
        let review = self
            .reviews
            .get_by_id(id)
            .await?
            .ok_or(ReviewError::NotFound)?;
        if !self.reviews.hard_delete(id).await? {
            return Err(ReviewError::NotFound);
        }
        tracing::warn!(review_id = %id, car_id = %review.car_id, "review permanently deleted");

        self.aggregator.refresh_after_mutation(review.car_id).await;
        Ok(())
    }

    pub async fn mark_helpful(&self, id: ReviewId) -> Result<i32, ReviewError> {
        self.reviews
            .increment_helpful(id)
            .await?
            .ok_or(ReviewError::NotFound)
    }

    pub async fn report(&self, id: ReviewId) -> Result<(), ReviewError> {
        if self.reviews.increment_report(id).await? {
            Ok(())
        } else {
            Err(ReviewError::NotFound)
        }
    }

    /// Активный отзыв по ID
    pub async fn get(&self, id: ReviewId) -> Result<Review, ReviewError> {
        self.reviews
            .get_by_id(id)
            .await?
            .filter(Review::is_active)
            .ok_or(ReviewError::NotFound)
    }

    pub async fn list(&self, query: &ReviewListQuery) -> Result<Page<Review>, ReviewError> {
        let page = PageParams::parse(query.page, query.limit, DEFAULT_LIST_LIMIT)
            .map_err(ReviewError::Validation)?;
        let sort = SortSpec::parse(query.sort.as_deref(), "-createdAt", LIST_SORTS)
            .map_err(ReviewError::Validation)?;
        let sort = ReviewSort::from_field(sort.field, sort.descending)
            .ok_or_else(|| ReviewError::Validation("Invalid sort field".into()))?;
        let car_id = query.car.as_deref().map(parse_car_id).transpose()?;

        Ok(self.reviews.list_active(car_id, sort, page).await?)
    }

    /// Статистика по активным отзывам; формула та же, что у агрегатора
    pub async fn stats(&self, car_id: CarId) -> Result<ReviewStats, ReviewError> {
        if !self.cars.is_active(car_id).await? {
            return Err(ReviewError::CarNotFound);
        }
        let ratings = self.reviews.find_active_ratings_by_car(car_id).await?;
        let aggregate = compute_aggregate(&ratings);
        Ok(ReviewStats {
            total_reviews: aggregate.review_count,
            average_rating: aggregate.average_rating,
            rating_counts: rating_distribution(&ratings),
        })
    }
}

fn parse_car_id(raw: &str) -> Result<CarId, ReviewError> {
    CarId::from_string(raw).map_err(|_| ReviewError::Validation("Invalid car id".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a002_review::fakes::{InMemoryCars, InMemoryReviews};
    use contracts::domain::a001_car::aggregate::RatingAggregate;

    struct Fixture {
        reviews: Arc<InMemoryReviews>,
        cars: Arc<InMemoryCars>,
        service: ReviewService,
    }

    fn fixture(car_ids: &[CarId]) -> Fixture {
        let reviews = Arc::new(InMemoryReviews::default());
        let cars = Arc::new(InMemoryCars::with_cars(car_ids));
        let aggregator = Arc::new(RatingAggregator::new(reviews.clone(), cars.clone()));
        let service = ReviewService::new(reviews.clone(), cars.clone(), aggregator);
        Fixture {
            reviews,
            cars,
            service,
        }
    }

    fn user(id: &str) -> Actor {
        Actor {
            user_id: id.into(),
            is_admin: false,
        }
    }

    fn admin() -> Actor {
        Actor {
            user_id: "admin".into(),
            is_admin: true,
        }
    }

    fn dto(car: CarId, rating: i32) -> CreateReviewDto {
        CreateReviewDto {
            car_id: car.to_string(),
            title: "  Solid family car ".into(),
            text: "Comfortable and quiet on the motorway".into(),
            rating,
        }
    }

    fn agg(average_rating: f64, review_count: i32) -> Option<RatingAggregate> {
        Some(RatingAggregate {
            average_rating,
            review_count,
        })
    }

    #[tokio::test]
    async fn test_create_update_delete_keeps_aggregate_in_sync() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);

        let r1 = f.service.create(&user("u1"), dto(c1, 5)).await.unwrap();
        assert_eq!(r1.title, "Solid family car");
        assert_eq!(f.cars.aggregate(c1), agg(5.0, 1));

        f.service.create(&user("u2"), dto(c1, 3)).await.unwrap();
        assert_eq!(f.cars.aggregate(c1), agg(4.0, 2));

        f.service.delete(&user("u1"), r1.id).await.unwrap();
        assert_eq!(f.cars.aggregate(c1), agg(3.0, 1));
    }

    #[tokio::test]
    async fn test_rating_change_triggers_once() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);
        let r = f.service.create(&user("u1"), dto(c1, 2)).await.unwrap();
        assert_eq!(f.cars.update_calls(), 1);

        let text_only = UpdateReviewDto {
            text: Some("Still thinking about it".into()),
            ..Default::default()
        };
        f.service.update(&user("u1"), r.id, text_only).await.unwrap();
        let same_rating = UpdateReviewDto {
            rating: Some(2),
            ..Default::default()
        };
        f.service.update(&user("u1"), r.id, same_rating).await.unwrap();
        assert_eq!(f.cars.update_calls(), 1);

        let new_rating = UpdateReviewDto {
            rating: Some(4),
            ..Default::default()
        };
        f.service.update(&user("u1"), r.id, new_rating).await.unwrap();
        assert_eq!(f.cars.update_calls(), 2);
        assert_eq!(f.cars.aggregate(c1), agg(4.0, 1));
    }

    #[tokio::test]
    async fn test_helpful_and_report_do_not_trigger() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);
        let r = f.service.create(&user("u1"), dto(c1, 4)).await.unwrap();
        let calls = f.cars.update_calls();

        assert_eq!(f.service.mark_helpful(r.id).await.unwrap(), 1);
        assert_eq!(f.service.mark_helpful(r.id).await.unwrap(), 2);
        f.service.report(r.id).await.unwrap();
        assert_eq!(f.cars.update_calls(), calls);
        assert_eq!(f.cars.aggregate(c1), agg(4.0, 1));
    }

    #[tokio::test]
    async fn test_duplicate_even_after_soft_delete() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);
        let r = f.service.create(&user("u1"), dto(c1, 4)).await.unwrap();
        assert!(matches!(
            f.service.create(&user("u1"), dto(c1, 5)).await,
            Err(ReviewError::Duplicate)
        ));

        f.service.delete(&user("u1"), r.id).await.unwrap();
        let calls = f.cars.update_calls();
        assert!(matches!(
            f.service.create(&user("u1"), dto(c1, 5)).await,
            Err(ReviewError::Duplicate)
        ));
        assert_eq!(f.cars.update_calls(), calls);
    }

    #[tokio::test]
    async fn test_concurrent_insert_maps_to_duplicate() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);
        f.reviews.lose_insert_race(true);

        assert!(matches!(
            f.service.create(&user("u1"), dto(c1, 5)).await,
            Err(ReviewError::Duplicate)
        ));
        assert_eq!(f.cars.update_calls(), 0);
        assert_eq!(f.cars.aggregate(c1), agg(0.0, 0));
    }

    #[tokio::test]
    async fn test_update_of_review_deleted_mid_flight() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);
        let r = f.service.create(&user("u1"), dto(c1, 2)).await.unwrap();
        let calls = f.cars.update_calls();

        f.reviews.deactivate_before_update(true);
        let new_rating = UpdateReviewDto {
            rating: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(&user("u1"), r.id, new_rating).await,
            Err(ReviewError::NotFound)
        ));
        assert_eq!(f.cars.update_calls(), calls);

        f.reviews.deactivate_before_update(false);
        let stored = f.reviews.get_by_id(r.id).await.unwrap().unwrap();
        assert_eq!(stored.rating, 2);
        assert!(!stored.is_active());
    }

    #[tokio::test]
    async fn test_validation_rejects_before_write() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);

        assert!(matches!(
            f.service.create(&user("u1"), dto(c1, 6)).await,
            Err(ReviewError::Validation(_))
        ));
        let mut blank = dto(c1, 4);
        blank.title = "   ".into();
        assert!(matches!(
            f.service.create(&user("u1"), blank).await,
            Err(ReviewError::Validation(_))
        ));
        let mut bad_id = dto(c1, 4);
        bad_id.car_id = "not-a-uuid".into();
        assert!(matches!(
            f.service.create(&user("u1"), bad_id).await,
            Err(ReviewError::Validation(_))
        ));
        assert!(matches!(
            f.service.create(&user("u1"), dto(CarId::new_v4(), 4)).await,
            Err(ReviewError::CarNotFound)
        ));
        assert_eq!(f.cars.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_ownership_rules() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);
        let r = f.service.create(&user("u1"), dto(c1, 4)).await.unwrap();

        let change = UpdateReviewDto {
            rating: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(&user("u2"), r.id, change.clone()).await,
            Err(ReviewError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.update(&admin(), r.id, change).await,
            Err(ReviewError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete(&user("u2"), r.id).await,
            Err(ReviewError::Forbidden(_))
        ));

        f.service.delete(&admin(), r.id).await.unwrap();
        assert_eq!(f.cars.aggregate(c1), agg(0.0, 0));
        assert!(matches!(f.service.get(r.id).await, Err(ReviewError::NotFound)));
        assert!(matches!(
            f.service.mark_helpful(r.id).await,
            Err(ReviewError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_hard_delete_recomputes() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);
        let r = f.service.create(&user("u1"), dto(c1, 2)).await.unwrap();
        f.service.create(&user("u2"), dto(c1, 4)).await.unwrap();

        f.service.hard_delete(r.id).await.unwrap();
        assert_eq!(f.cars.aggregate(c1), agg(4.0, 1));
        assert!(matches!(
            f.service.hard_delete(r.id).await,
            Err(ReviewError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_aggregation_failure_is_swallowed() {
        let c1 = CarId::new_v4();
        let f = fixture(&[c1]);
        f.cars.fail_updates(true);

        let r = f.service.create(&user("u1"), dto(c1, 5)).await.unwrap();
        assert_eq!(f.service.get(r.id).await.unwrap().rating, 5);
        assert_eq!(f.cars.aggregate(c1), agg(0.0, 0));
        assert_eq!(f.cars.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_stats_and_list() {
        let c1 = CarId::new_v4();
        let c2 = CarId::new_v4();
        let f = fixture(&[c1, c2]);
        for (u, rating) in [("u1", 4), ("u2", 4), ("u3", 5)] {
            f.service.create(&user(u), dto(c1, rating)).await.unwrap();
        }
        f.service.create(&user("u1"), dto(c2, 1)).await.unwrap();

        let stats = f.service.stats(c1).await.unwrap();
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, 4.3);
        assert_eq!(stats.rating_counts["4"], 2);
        assert_eq!(stats.rating_counts["1"], 0);

        let query = ReviewListQuery {
            car: Some(c1.to_string()),
            sort: Some("-rating".into()),
            ..Default::default()
        };
        let page = f.service.list(&query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].rating, 5);

        let bad = ReviewListQuery {
            sort: Some("title".into()),
            ..Default::default()
        };
        assert!(matches!(
            f.service.list(&bad).await,
            Err(ReviewError::Validation(_))
        ));

        f.cars.deactivate(c2);
        assert!(matches!(
            f.service.stats(c2).await,
            Err(ReviewError::CarNotFound)
        ));
    }
}
