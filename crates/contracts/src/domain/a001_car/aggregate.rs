use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::common::EntityMetadata;

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(
    /// Уникальный идентификатор автомобиля
    CarId
);

// ============================================================================
// Enumerations
// ============================================================================

/// Строковые перечисления каталога: serde-имя совпадает с тем, что хранится в БД.
macro_rules! catalogue_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Invalid {}: {}", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

catalogue_enum!(
    /// Категория автомобиля
    Category {
        New => "New",
        Used => "Used",
        Electric => "Electric",
        Hybrid => "Hybrid",
        Suv => "SUV",
        Hatchback => "Hatchback",
        Saloon => "Saloon",
        Estate => "Estate",
        Coupe => "Coupe",
        Convertible => "Convertible",
        Mpv => "MPV",
    }
);

catalogue_enum!(
    /// Состояние автомобиля
    Condition {
        New => "New",
        Used => "Used",
        NearlyNew => "Nearly New",
    }
);

catalogue_enum!(
    /// Тип топлива
    FuelType {
        Petrol => "Petrol",
        Diesel => "Diesel",
        Electric => "Electric",
        Hybrid => "Hybrid",
        PlugInHybrid => "Plug-in Hybrid",
    }
);

catalogue_enum!(
    Transmission {
        Manual => "Manual",
        Automatic => "Automatic",
        Cvt => "CVT",
    }
);

catalogue_enum!(
    /// Доступность для покупки
    Availability {
        Available => "Available",
        Sold => "Sold",
        Reserved => "Reserved",
    }
);

impl Default for Availability {
    fn default() -> Self {
        Availability::Available
    }
}

// ============================================================================
// Nested value objects
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeasePrice {
    pub monthly: Option<f64>,
    pub deposit: Option<f64>,
    /// Срок в месяцах
    pub term: Option<i32>,
}

impl LeasePrice {
    pub fn is_empty(&self) -> bool {
        self.monthly.is_none() && self.deposit.is_none() && self.term.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarImage {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specifications {
    pub engine: Option<String>,
    pub fuel_type: Option<FuelType>,
    pub transmission: Option<Transmission>,
    pub doors: Option<i32>,
    pub seats: Option<i32>,
    pub mileage: Option<i32>,
    pub co2_emissions: Option<i32>,
    pub top_speed: Option<i32>,
    /// Разгон 0-60 mph, секунды
    pub acceleration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerContact {
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dealer {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub contact: DealerContact,
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Автомобиль в каталоге
///
/// `average_rating` и `review_count` — денормализованный кэш по активным отзывам.
/// Их пишет только `RatingAggregator`; из DTO они никогда не берутся.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: CarId,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_percentage: f64,
    pub lease_price: Option<LeasePrice>,
    pub description: String,
    pub images: Vec<CarImage>,
    pub specifications: Specifications,
    pub category: Category,
    pub condition: Condition,
    pub availability: Availability,
    pub dealer: Dealer,
    pub features: Vec<String>,
    pub tags: Vec<String>,
    pub average_rating: f64,
    pub review_count: i32,
    pub views: i32,
    pub is_featured: bool,
    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl Car {
    /// Создать новый автомобиль для вставки в БД
    pub fn new_for_insert(dto: CarDto) -> Self {
        Self {
            id: CarId::new_v4(),
            name: dto.name,
            brand: dto.brand,
            model: dto.model,
            year: dto.year,
            price: dto.price,
            original_price: dto.original_price,
            discount_percentage: dto.discount_percentage,
            lease_price: dto.lease_price.filter(|l| !l.is_empty()),
            description: dto.description,
            images: dto.images,
            specifications: dto.specifications,
            category: dto.category,
            condition: dto.condition,
            availability: dto.availability,
            dealer: dto.dealer,
            features: dto.features,
            tags: dto.tags,
            average_rating: 0.0,
            review_count: 0,
            views: 0,
            is_featured: dto.is_featured,
            metadata: EntityMetadata::new(),
        }
    }

    /// Обновить редактируемые поля из DTO (рейтинг и просмотры не трогаем)
    pub fn update(&mut self, dto: CarDto) {
        self.name = dto.name;
        self.brand = dto.brand;
        self.model = dto.model;
        self.year = dto.year;
        self.price = dto.price;
        self.original_price = dto.original_price;
        self.discount_percentage = dto.discount_percentage;
        self.lease_price = dto.lease_price.filter(|l| !l.is_empty());
        self.description = dto.description;
        if !dto.images.is_empty() {
            self.images = dto.images;
        }
        self.specifications = dto.specifications;
        self.category = dto.category;
        self.condition = dto.condition;
        self.availability = dto.availability;
        self.dealer = dto.dealer;
        self.features = dto.features;
        self.tags = dto.tags;
        self.is_featured = dto.is_featured;
    }

    /// Валидация данных
    pub fn validate(&self, current_year: i32) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err("Name is required and must be less than 100 characters".into());
        }
        if self.brand.trim().is_empty() {
            return Err("Brand is required".into());
        }
        if self.model.trim().is_empty() {
            return Err("Model is required".into());
        }
        if self.year < 1900 || self.year > current_year + 1 {
            return Err("Valid year is required".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("Valid price is required".into());
        }
        let description = self.description.trim();
        if description.is_empty() || description.chars().count() > 500 {
            return Err("Description is required and must be less than 500 characters".into());
        }
        if !(0.0..=100.0).contains(&self.discount_percentage) {
            return Err("Discount must be between 0 and 100%".into());
        }
        if let Some(doors) = self.specifications.doors {
            if !(2..=5).contains(&doors) {
                return Err("Doors must be between 2 and 5".into());
            }
        }
        if let Some(seats) = self.specifications.seats {
            if !(2..=8).contains(&seats) {
                return Err("Seats must be between 2 and 8".into());
            }
        }
        if self.dealer.name.trim().is_empty() {
            return Err("Dealer name is required".into());
        }
        if self.dealer.location.trim().is_empty() {
            return Err("Dealer location is required".into());
        }
        if self.images.iter().any(|img| img.url.trim().is_empty()) {
            return Err("Image url is required".into());
        }
        Ok(())
    }

    /// Хук перед записью
    pub fn before_write(&mut self) {
        self.name = self.name.trim().to_string();
        self.brand = self.brand.trim().to_string();
        self.model = self.model.trim().to_string();
        self.metadata.touch();
    }

    /// Размер скидки: originalPrice - price, если скидка задана
    pub fn discount_amount(&self) -> f64 {
        match self.original_price {
            Some(original) if self.discount_percentage > 0.0 => original - self.price,
            _ => 0.0,
        }
    }

    /// URL основного изображения, иначе первого, иначе None
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
            .map(|img| img.url.as_str())
    }
}

/// Представление автомобиля для API (с вычисляемыми полями)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarView {
    #[serde(flatten)]
    pub car: Car,
    pub discount_amount: f64,
    pub primary_image: Option<String>,
}

impl From<Car> for CarView {
    fn from(car: Car) -> Self {
        let discount_amount = car.discount_amount();
        let primary_image = car.primary_image().map(str::to_string);
        Self {
            car,
            discount_amount,
            primary_image,
        }
    }
}

/// Денормализованный рейтинг автомобиля
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub review_count: i32,
}

impl RatingAggregate {
    pub const EMPTY: RatingAggregate = RatingAggregate {
        average_rating: 0.0,
        review_count: 0,
    };
}

// ============================================================================
// DTO
// ============================================================================

/// DTO для создания и редактирования автомобиля
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDto {
    pub name: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub lease_price: Option<LeasePrice>,
    pub description: String,
    #[serde(default)]
    pub images: Vec<CarImage>,
    #[serde(default)]
    pub specifications: Specifications,
    pub category: Category,
    pub condition: Condition,
    #[serde(default)]
    pub availability: Availability,
    pub dealer: Dealer,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Параметры списка автомобилей (`GET /api/cars`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Option<String>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    pub brand: Option<String>,
    pub fuel_type: Option<FuelType>,
    pub featured: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}
