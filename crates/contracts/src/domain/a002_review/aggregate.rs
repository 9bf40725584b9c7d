use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::a001_car::aggregate::CarId;
use crate::domain::common::EntityMetadata;

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(
    /// Уникальный идентификатор отзыва
    ReviewId
);

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const TITLE_MAX_LEN: usize = 100;
pub const TEXT_MAX_LEN: usize = 1000;

// ============================================================================
// Aggregate Root
// ============================================================================

/// Отзыв пользователя об автомобиле
///
/// Пара `(car_id, user_id)` уникальна независимо от `is_active`:
/// мягко удалённый отзыв тоже блокирует повторный.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub car_id: CarId,
    pub user_id: String,
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub is_verified: bool,
    pub helpful_count: i32,
    pub report_count: i32,
    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl Review {
    /// Создать новый отзыв для вставки в БД
    pub fn new_for_insert(car_id: CarId, user_id: String, dto: &CreateReviewDto) -> Self {
        Self {
            id: ReviewId::new_v4(),
            car_id,
            user_id,
            title: dto.title.clone(),
            text: dto.text.clone(),
            rating: dto.rating,
            is_verified: false,
            helpful_count: 0,
            report_count: 0,
            metadata: EntityMetadata::new(),
        }
    }

    /// Применить изменения; возвращает `true`, если поменялась оценка
    pub fn apply(&mut self, dto: &UpdateReviewDto) -> bool {
        if let Some(title) = &dto.title {
            self.title = title.clone();
        }
        if let Some(text) = &dto.text {
            self.text = text.clone();
        }
        let rating_changed = matches!(dto.rating, Some(r) if r != self.rating);
        if let Some(rating) = dto.rating {
            self.rating = rating;
        }
        rating_changed
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        validate_rating(self.rating)?;
        validate_title(&self.title)?;
        validate_text(&self.text)
    }

    pub fn is_active(&self) -> bool {
        self.metadata.is_active
    }

    /// Хук перед записью
    pub fn before_write(&mut self) {
        self.title = self.title.trim().to_string();
        self.text = self.text.trim().to_string();
        self.metadata.touch();
    }
}

pub fn validate_rating(rating: i32) -> Result<(), String> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err("Rating must be between 1 and 5".into());
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), String> {
    let len = title.trim().chars().count();
    if len == 0 || len > TITLE_MAX_LEN {
        return Err("Title is required and must be less than 100 characters".into());
    }
    Ok(())
}

pub fn validate_text(text: &str) -> Result<(), String> {
    let len = text.trim().chars().count();
    if len == 0 || len > TEXT_MAX_LEN {
        return Err("Review text is required and must be less than 1000 characters".into());
    }
    Ok(())
}

// ============================================================================
// DTO
// ============================================================================

/// DTO для создания отзыва (`POST /api/reviews`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewDto {
    #[serde(alias = "car")]
    pub car_id: String,
    pub title: String,
    pub text: String,
    pub rating: i32,
}

/// DTO для редактирования отзыва (`PUT /api/reviews/:id`); все поля опциональны
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewDto {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i32>,
}

/// Параметры списка отзывов (`GET /api/reviews`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListQuery {
    pub car: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Option<String>,
}

/// Статистика отзывов по автомобилю (`GET /api/reviews/stats/:car_id`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_reviews: i32,
    pub average_rating: f64,
    /// Ключи "1".."5"
    pub rating_counts: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpfulResponse {
    pub helpful_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(rating: i32) -> CreateReviewDto {
        CreateReviewDto {
            car_id: CarId::new_v4().to_string(),
            title: "Great".into(),
            text: "Drives well".into(),
            rating,
        }
    }

    #[test]
    fn test_validate_rating_bounds() {
        let car = CarId::new_v4();
        for rating in 1..=5 {
            assert!(Review::new_for_insert(car, "u1".into(), &dto(rating))
                .validate()
                .is_ok());
        }
        assert!(Review::new_for_insert(car, "u1".into(), &dto(0)).validate().is_err());
        assert!(Review::new_for_insert(car, "u1".into(), &dto(6)).validate().is_err());
    }

    #[test]
    fn test_validate_text_lengths() {
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(101)).is_err());
        assert!(validate_title(&"x".repeat(100)).is_ok());
        assert!(validate_text(&"y".repeat(1001)).is_err());
    }

    #[test]
    fn test_apply_reports_rating_change_only() {
        let mut review = Review::new_for_insert(CarId::new_v4(), "u1".into(), &dto(4));

        let changed = review.apply(&UpdateReviewDto {
            title: Some("Updated".into()),
            ..Default::default()
        });
        assert!(!changed);
        assert_eq!(review.title, "Updated");

        let same = review.apply(&UpdateReviewDto {
            rating: Some(4),
            ..Default::default()
        });
        assert!(!same);

        let changed = review.apply(&UpdateReviewDto {
            rating: Some(2),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(review.rating, 2);
    }

    #[test]
    fn test_create_dto_accepts_car_alias() {
        let json = r#"{"car":"c1","title":"t","text":"x","rating":5}"#;
        let dto: CreateReviewDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.car_id, "c1");
    }
}
