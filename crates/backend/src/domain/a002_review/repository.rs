use async_trait::async_trait;
use contracts::domain::a001_car::aggregate::CarId;
use contracts::domain::a002_review::aggregate::{Review, ReviewId};
use contracts::domain::common::{AggregateId, EntityMetadata};
use contracts::shared::api::Page;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{Order, QueryOrder, QuerySelect, Select, Set, SqlErr};

use super::store::{InsertOutcome, ReviewSort, ReviewSortField, ReviewStore};
use crate::shared::query::PageParams;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub car_id: String,
    pub user_id: String,
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub is_verified: bool,
    pub helpful_count: i32,
    pub report_count: i32,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Review {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> anyhow::Result<Self> {
        Ok(Review {
            id: ReviewId::from_string(&m.id).map_err(anyhow::Error::msg)?,
            car_id: CarId::from_string(&m.car_id).map_err(anyhow::Error::msg)?,
            user_id: m.user_id,
            title: m.title,
            text: m.text,
            rating: m.rating,
            is_verified: m.is_verified,
            helpful_count: m.helpful_count,
            report_count: m.report_count,
            metadata: EntityMetadata {
                created_at: m.created_at,
                updated_at: m.updated_at,
                is_active: m.is_active,
            },
        })
    }
}

#[derive(Clone)]
pub struct ReviewRepository {
    conn: DatabaseConnection,
}

impl ReviewRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn active_by_id(id: ReviewId) -> Select<Entity> {
        Entity::find_by_id(id.as_string()).filter(Column::IsActive.eq(true))
    }
}

#[async_trait]
impl ReviewStore for ReviewRepository {
    async fn find_active_ratings_by_car(&self, car_id: CarId) -> anyhow::Result<Vec<i32>> {
        let ratings = Entity::find()
            .filter(Column::CarId.eq(car_id.as_string()))
            .filter(Column::IsActive.eq(true))
            .select_only()
            .column(Column::Rating)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;
        Ok(ratings)
    }

    async fn exists_for_user_and_car(&self, user_id: &str, car_id: CarId) -> anyhow::Result<bool> {
        let count = Entity::find()
            .filter(Column::CarId.eq(car_id.as_string()))
            .filter(Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn get_by_id(&self, id: ReviewId) -> anyhow::Result<Option<Review>> {
        Entity::find_by_id(id.as_string())
            .one(&self.conn)
            .await?
            .map(Review::try_from)
            .transpose()
    }

    async fn insert(&self, review: &Review) -> anyhow::Result<InsertOutcome> {
        let active = ActiveModel {
            id: Set(review.id.as_string()),
            car_id: Set(review.car_id.as_string()),
            user_id: Set(review.user_id.clone()),
            title: Set(review.title.clone()),
            text: Set(review.text.clone()),
            rating: Set(review.rating),
            is_verified: Set(review.is_verified),
            helpful_count: Set(review.helpful_count),
            report_count: Set(review.report_count),
            is_active: Set(review.metadata.is_active),
            created_at: Set(review.metadata.created_at),
            updated_at: Set(review.metadata.updated_at),
        };
        match Entity::insert(active).exec(&self.conn).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_content(&self, review: &Review) -> anyhow::Result<bool> {
        let result = Entity::update_many()
            .col_expr(Column::Title, Expr::value(review.title.clone()))
            .col_expr(Column::Text, Expr::value(review.text.clone()))
            .col_expr(Column::Rating, Expr::value(review.rating))
            .col_expr(Column::UpdatedAt, Expr::value(review.metadata.updated_at))
            .filter(Column::Id.eq(review.id.as_string()))
            .filter(Column::IsActive.eq(true))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn soft_delete(&self, id: ReviewId) -> anyhow::Result<bool> {
        let result = Entity::update_many()
            .col_expr(Column::IsActive, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(Column::Id.eq(id.as_string()))
            .filter(Column::IsActive.eq(true))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn hard_delete(&self, id: ReviewId) -> anyhow::Result<bool> {
        let result = Entity::delete_by_id(id.as_string())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn increment_helpful(&self, id: ReviewId) -> anyhow::Result<Option<i32>> {
        let result = Entity::update_many()
            .col_expr(Column::HelpfulCount, Expr::col(Column::HelpfulCount).add(1))
            .filter(Column::Id.eq(id.as_string()))
            .filter(Column::IsActive.eq(true))
            .exec(&self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        let count = Self::active_by_id(id)
            .select_only()
            .column(Column::HelpfulCount)
            .into_tuple::<i32>()
            .one(&self.conn)
            .await?;
        Ok(count)
    }

    async fn increment_report(&self, id: ReviewId) -> anyhow::Result<bool> {
        let result = Entity::update_many()
            .col_expr(Column::ReportCount, Expr::col(Column::ReportCount).add(1))
            .filter(Column::Id.eq(id.as_string()))
            .filter(Column::IsActive.eq(true))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_active(
        &self,
        car_id: Option<CarId>,
        sort: ReviewSort,
        page: PageParams,
    ) -> anyhow::Result<Page<Review>> {
        let mut query = Entity::find().filter(Column::IsActive.eq(true));
        if let Some(car_id) = car_id {
            query = query.filter(Column::CarId.eq(car_id.as_string()));
        }
        let column = match sort.field {
            ReviewSortField::Rating => Column::Rating,
            ReviewSortField::CreatedAt => Column::CreatedAt,
            ReviewSortField::HelpfulCount => Column::HelpfulCount,
        };
        let order = if sort.descending { Order::Desc } else { Order::Asc };
        let paginator = query
            .order_by(column, order)
            .order_by_asc(Column::Id)
            .paginate(&self.conn, page.limit);

        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page.page - 1)
            .await?
            .into_iter()
            .map(Review::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Page {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use contracts::domain::a002_review::aggregate::CreateReviewDto;

    fn review(car_id: CarId, user: &str, rating: i32) -> Review {
        let dto = CreateReviewDto {
            car_id: car_id.to_string(),
            title: format!("{} stars", rating),
            text: "Test drive notes".into(),
            rating,
        };
        Review::new_for_insert(car_id, user.into(), &dto)
    }

    async fn repo() -> ReviewRepository {
        ReviewRepository::new(connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_active_ratings_exclude_soft_deleted() {
        let repo = repo().await;
        let car = CarId::new_v4();
        let other_car = CarId::new_v4();
        let first = review(car, "u1", 5);
        repo.insert(&first).await.unwrap();
        repo.insert(&review(car, "u2", 4)).await.unwrap();
        repo.insert(&review(other_car, "u1", 1)).await.unwrap();

        let mut ratings = repo.find_active_ratings_by_car(car).await.unwrap();
        ratings.sort();
        assert_eq!(ratings, vec![4, 5]);

        assert!(repo.soft_delete(first.id).await.unwrap());
        assert!(!repo.soft_delete(first.id).await.unwrap());
        assert_eq!(repo.find_active_ratings_by_car(car).await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_unique_pair_survives_soft_delete() {
        let repo = repo().await;
        let car = CarId::new_v4();
        let first = review(car, "u1", 5);
        assert_eq!(repo.insert(&first).await.unwrap(), InsertOutcome::Inserted);
        repo.soft_delete(first.id).await.unwrap();

        assert!(repo.exists_for_user_and_car("u1", car).await.unwrap());
        assert!(!repo.exists_for_user_and_car("u2", car).await.unwrap());
        assert_eq!(
            repo.insert(&review(car, "u1", 3)).await.unwrap(),
            InsertOutcome::Duplicate
        );
    }

    #[tokio::test]
    async fn test_counters_only_on_active_reviews() {
        let repo = repo().await;
        let r = review(CarId::new_v4(), "u1", 4);
        repo.insert(&r).await.unwrap();

        assert_eq!(repo.increment_helpful(r.id).await.unwrap(), Some(1));
        assert_eq!(repo.increment_helpful(r.id).await.unwrap(), Some(2));
        assert!(repo.increment_report(r.id).await.unwrap());

        let stored = repo.get_by_id(r.id).await.unwrap().unwrap();
        assert_eq!(stored.helpful_count, 2);
        assert_eq!(stored.report_count, 1);
        assert_eq!(stored.rating, 4);

        repo.soft_delete(r.id).await.unwrap();
        assert_eq!(repo.increment_helpful(r.id).await.unwrap(), None);
        assert!(!repo.increment_report(r.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_content_and_hard_delete() {
        let repo = repo().await;
        let mut r = review(CarId::new_v4(), "u1", 2);
        repo.insert(&r).await.unwrap();

        r.rating = 5;
        r.title = "Changed my mind".into();
        assert!(repo.update_content(&r).await.unwrap());
        let stored = repo.get_by_id(r.id).await.unwrap().unwrap();
        assert_eq!(stored.rating, 5);
        assert_eq!(stored.title, "Changed my mind");

        repo.soft_delete(r.id).await.unwrap();
        r.rating = 1;
        assert!(!repo.update_content(&r).await.unwrap());
        assert_eq!(repo.get_by_id(r.id).await.unwrap().unwrap().rating, 5);

        assert!(repo.hard_delete(r.id).await.unwrap());
        assert!(repo.get_by_id(r.id).await.unwrap().is_none());
        assert!(!repo.hard_delete(r.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_active_sorted_by_rating() {
        let repo = repo().await;
        let car = CarId::new_v4();
        for (user, rating) in [("u1", 3), ("u2", 5), ("u3", 1)] {
            repo.insert(&review(car, user, rating)).await.unwrap();
        }
        let hidden = review(car, "u4", 4);
        repo.insert(&hidden).await.unwrap();
        repo.soft_delete(hidden.id).await.unwrap();

        let page = repo
            .list_active(
                Some(car),
                ReviewSort::from_field("rating", true).unwrap(),
                PageParams { page: 1, limit: 2 },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let ratings: Vec<i32> = page.items.iter().map(|r| r.rating).collect();
        assert_eq!(ratings, vec![5, 3]);
    }
}
