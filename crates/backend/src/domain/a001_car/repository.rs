use async_trait::async_trait;
use contracts::domain::a001_car::aggregate::{
    Car, CarId, CarImage, Category, Condition as CarCondition, Dealer, DealerContact, FuelType,
    LeasePrice, Specifications,
};
use contracts::domain::common::{AggregateId, EntityMetadata};
use contracts::shared::api::Page;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{Condition, Order, QueryOrder, QuerySelect, Select, Set};

use super::store::{CarStore, RatingUpdate};
use crate::shared::query::PageParams;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_car")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_percentage: f64,
    pub lease_monthly: Option<f64>,
    pub lease_deposit: Option<f64>,
    pub lease_term: Option<i32>,
    pub description: String,
    /// JSON array
    pub images: String,
    pub spec_engine: Option<String>,
    pub spec_fuel_type: Option<String>,
    pub spec_transmission: Option<String>,
    pub spec_doors: Option<i32>,
    pub spec_seats: Option<i32>,
    pub spec_mileage: Option<i32>,
    pub spec_co2_emissions: Option<i32>,
    pub spec_top_speed: Option<i32>,
    pub spec_acceleration: Option<f64>,
    pub category: String,
    pub condition: String,
    pub availability: String,
    pub dealer_name: String,
    pub dealer_location: String,
    pub dealer_phone: Option<String>,
    pub dealer_email: Option<String>,
    /// JSON array
    pub features: String,
    /// JSON array
    pub tags: String,
    pub average_rating: f64,
    pub review_count: i32,
    pub views: i32,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Car {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> anyhow::Result<Self> {
        let lease = LeasePrice {
            monthly: m.lease_monthly,
            deposit: m.lease_deposit,
            term: m.lease_term,
        };
        Ok(Car {
            id: CarId::from_string(&m.id).map_err(anyhow::Error::msg)?,
            name: m.name,
            brand: m.brand,
            model: m.model,
            year: m.year,
            price: m.price,
            original_price: m.original_price,
            discount_percentage: m.discount_percentage,
            lease_price: (!lease.is_empty()).then_some(lease),
            description: m.description,
            images: serde_json::from_str::<Vec<CarImage>>(&m.images)?,
            specifications: Specifications {
                engine: m.spec_engine,
                fuel_type: m
                    .spec_fuel_type
                    .as_deref()
                    .map(str::parse)
                    .transpose()
                    .map_err(anyhow::Error::msg)?,
                transmission: m
                    .spec_transmission
                    .as_deref()
                    .map(str::parse)
                    .transpose()
                    .map_err(anyhow::Error::msg)?,
                doors: m.spec_doors,
                seats: m.spec_seats,
                mileage: m.spec_mileage,
                co2_emissions: m.spec_co2_emissions,
                top_speed: m.spec_top_speed,
                acceleration: m.spec_acceleration,
            },
            category: m.category.parse().map_err(anyhow::Error::msg)?,
            condition: m.condition.parse().map_err(anyhow::Error::msg)?,
            availability: m.availability.parse().map_err(anyhow::Error::msg)?,
            dealer: Dealer {
                name: m.dealer_name,
                location: m.dealer_location,
                contact: DealerContact {
                    phone: m.dealer_phone,
                    email: m.dealer_email,
                },
            },
            features: serde_json::from_str(&m.features)?,
            tags: serde_json::from_str(&m.tags)?,
            average_rating: m.average_rating,
            review_count: m.review_count,
            views: m.views,
            is_featured: m.is_featured,
            metadata: EntityMetadata {
                created_at: m.created_at,
                updated_at: m.updated_at,
                is_active: m.is_active,
            },
        })
    }
}

/// Editable columns; derived rating fields, views and `created_at` stay `NotSet`.
fn editable_active_model(car: &Car) -> anyhow::Result<ActiveModel> {
    let lease = car.lease_price.clone().unwrap_or_default();
    let spec = &car.specifications;
    Ok(ActiveModel {
        id: Set(car.id.as_string()),
        name: Set(car.name.clone()),
        brand: Set(car.brand.clone()),
        model: Set(car.model.clone()),
        year: Set(car.year),
        price: Set(car.price),
        original_price: Set(car.original_price),
        discount_percentage: Set(car.discount_percentage),
        lease_monthly: Set(lease.monthly),
        lease_deposit: Set(lease.deposit),
        lease_term: Set(lease.term),
        description: Set(car.description.clone()),
        images: Set(serde_json::to_string(&car.images)?),
        spec_engine: Set(spec.engine.clone()),
        spec_fuel_type: Set(spec.fuel_type.map(|f| f.as_str().to_string())),
        spec_transmission: Set(spec.transmission.map(|t| t.as_str().to_string())),
        spec_doors: Set(spec.doors),
        spec_seats: Set(spec.seats),
        spec_mileage: Set(spec.mileage),
        spec_co2_emissions: Set(spec.co2_emissions),
        spec_top_speed: Set(spec.top_speed),
        spec_acceleration: Set(spec.acceleration),
        category: Set(car.category.as_str().to_string()),
        condition: Set(car.condition.as_str().to_string()),
        availability: Set(car.availability.as_str().to_string()),
        dealer_name: Set(car.dealer.name.clone()),
        dealer_location: Set(car.dealer.location.clone()),
        dealer_phone: Set(car.dealer.contact.phone.clone()),
        dealer_email: Set(car.dealer.contact.email.clone()),
        features: Set(serde_json::to_string(&car.features)?),
        tags: Set(serde_json::to_string(&car.tags)?),
        is_featured: Set(car.is_featured),
        updated_at: Set(car.metadata.updated_at),
        ..Default::default()
    })
}

/// Фильтр активных автомобилей (каталог и поиск)
#[derive(Debug, Clone, Default)]
pub struct CarFilter {
    pub category: Option<Category>,
    pub condition: Option<CarCondition>,
    /// Подстрока, без учёта регистра
    pub brand: Option<String>,
    pub fuel_type: Option<FuelType>,
    pub featured: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Любой из терминов в name/brand/model/description
    pub text_terms: Vec<String>,
}

impl CarFilter {
    fn apply(&self, mut q: Select<Entity>) -> Select<Entity> {
        q = q.filter(Column::IsActive.eq(true));
        if let Some(category) = self.category {
            q = q.filter(Column::Category.eq(category.as_str()));
        }
        if let Some(condition) = self.condition {
            q = q.filter(Column::Condition.eq(condition.as_str()));
        }
        if let Some(brand) = self.brand.as_deref().filter(|b| !b.trim().is_empty()) {
            q = q.filter(Column::Brand.contains(brand.trim()));
        }
        if let Some(fuel_type) = self.fuel_type {
            q = q.filter(Column::SpecFuelType.eq(fuel_type.as_str()));
        }
        if let Some(featured) = self.featured {
            q = q.filter(Column::IsFeatured.eq(featured));
        }
        if let Some(min) = self.min_price {
            q = q.filter(Column::Price.gte(min));
        }
        if let Some(max) = self.max_price {
            q = q.filter(Column::Price.lte(max));
        }
        if !self.text_terms.is_empty() {
            let mut any = Condition::any();
            for term in &self.text_terms {
                any = any
                    .add(Column::Name.contains(term.as_str()))
                    .add(Column::Brand.contains(term.as_str()))
                    .add(Column::Model.contains(term.as_str()))
                    .add(Column::Description.contains(term.as_str()));
            }
            q = q.filter(any);
        }
        q
    }
}

/// Порядок сортировки списка
#[derive(Debug, Clone, Copy)]
pub struct CarOrder {
    pub column: Column,
    pub descending: bool,
}

impl CarOrder {
    pub const NEWEST: CarOrder = CarOrder {
        column: Column::CreatedAt,
        descending: true,
    };

    /// `price | year | name | createdAt`
    pub fn from_field(field: &str, descending: bool) -> Option<Self> {
        let column = match field {
            "price" => Column::Price,
            "year" => Column::Year,
            "name" => Column::Name,
            "createdAt" => Column::CreatedAt,
            _ => return None,
        };
        Some(Self { column, descending })
    }

    fn apply(&self, q: Select<Entity>) -> Select<Entity> {
        let order = if self.descending { Order::Desc } else { Order::Asc };
        // id as tie-breaker keeps pages stable
        q.order_by(self.column, order).order_by_asc(Column::Id)
    }
}

/// Строка для фасетов фильтра: brand, category, fuel_type, condition, price, year
pub type FacetRow = (String, String, Option<String>, String, f64, i32);

#[derive(Clone)]
pub struct CarRepository {
    conn: DatabaseConnection,
}

impl CarRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, car: &Car) -> anyhow::Result<CarId> {
        let mut active = editable_active_model(car)?;
        active.average_rating = Set(car.average_rating);
        active.review_count = Set(car.review_count);
        active.views = Set(car.views);
        active.is_active = Set(car.metadata.is_active);
        active.created_at = Set(car.metadata.created_at);
        active.insert(&self.conn).await?;
        Ok(car.id)
    }

    /// Обновить редактируемые поля. Рейтинг, просмотры и флаг активности не пишутся.
    pub async fn update(&self, car: &Car) -> anyhow::Result<()> {
        editable_active_model(car)?.update(&self.conn).await?;
        Ok(())
    }

    /// По ID, включая удалённые
    pub async fn get_by_id(&self, id: CarId) -> anyhow::Result<Option<Car>> {
        Entity::find_by_id(id.as_string())
            .one(&self.conn)
            .await?
            .map(Car::try_from)
            .transpose()
    }

    pub async fn get_active(&self, id: CarId) -> anyhow::Result<Option<Car>> {
        Ok(self.get_by_id(id).await?.filter(|c| c.metadata.is_active))
    }

    pub async fn soft_delete(&self, id: CarId) -> anyhow::Result<bool> {
        let result = Entity::update_many()
            .col_expr(Column::IsActive, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(Column::Id.eq(id.as_string()))
            .filter(Column::IsActive.eq(true))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn increment_views(&self, id: CarId) -> anyhow::Result<()> {
        Entity::update_many()
            .col_expr(Column::Views, Expr::col(Column::Views).add(1))
            .filter(Column::Id.eq(id.as_string()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &CarFilter,
        order: CarOrder,
        page: PageParams,
    ) -> anyhow::Result<Page<Car>> {
        let query = order.apply(filter.apply(Entity::find()));
        let paginator = query.paginate(&self.conn, page.limit);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page.page - 1)
            .await?
            .into_iter()
            .map(Car::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Page {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Все совпадения без пагинации (ранжирование по релевантности)
    pub async fn find_all(&self, filter: &CarFilter) -> anyhow::Result<Vec<Car>> {
        CarOrder::NEWEST
            .apply(filter.apply(Entity::find()))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Car::try_from)
            .collect()
    }

    pub async fn featured(&self, limit: u64) -> anyhow::Result<Vec<Car>> {
        let filter = CarFilter {
            featured: Some(true),
            ..Default::default()
        };
        CarOrder::NEWEST
            .apply(filter.apply(Entity::find()))
            .limit(limit)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Car::try_from)
            .collect()
    }

    pub async fn most_viewed(&self, limit: u64) -> anyhow::Result<Vec<Car>> {
        CarOrder {
            column: Column::Views,
            descending: true,
        }
        .apply(CarFilter::default().apply(Entity::find()))
        .limit(limit)
        .all(&self.conn)
        .await?
        .into_iter()
        .map(Car::try_from)
        .collect()
    }

    /// (name, brand, model) активных автомобилей, где любое поле содержит `q`
    pub async fn name_brand_model_matching(
        &self,
        q: &str,
    ) -> anyhow::Result<Vec<(String, String, String)>> {
        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(Column::Name.contains(q))
                    .add(Column::Brand.contains(q))
                    .add(Column::Model.contains(q)),
            )
            .order_by_asc(Column::Name)
            .select_only()
            .column(Column::Name)
            .column(Column::Brand)
            .column(Column::Model)
            .into_tuple::<(String, String, String)>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn facet_rows(&self) -> anyhow::Result<Vec<FacetRow>> {
        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .select_only()
            .column(Column::Brand)
            .column(Column::Category)
            .column(Column::SpecFuelType)
            .column(Column::Condition)
            .column(Column::Price)
            .column(Column::Year)
            .into_tuple::<FacetRow>()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn count_all(&self) -> anyhow::Result<u64> {
        Ok(Entity::find().count(&self.conn).await?)
    }
}

#[async_trait]
impl CarStore for CarRepository {
    async fn is_active(&self, id: CarId) -> anyhow::Result<bool> {
        let found = Entity::find_by_id(id.as_string())
            .filter(Column::IsActive.eq(true))
            .select_only()
            .column(Column::Id)
            .into_tuple::<String>()
            .one(&self.conn)
            .await?;
        Ok(found.is_some())
    }

    async fn update_rating_fields(
        &self,
        id: CarId,
        average_rating: f64,
        review_count: i32,
    ) -> anyhow::Result<RatingUpdate> {
        let result = Entity::update_many()
            .col_expr(Column::AverageRating, Expr::value(average_rating))
            .col_expr(Column::ReviewCount, Expr::value(review_count))
            .filter(Column::Id.eq(id.as_string()))
            .exec(&self.conn)
            .await?;
        Ok(if result.rows_affected > 0 {
            RatingUpdate::Updated
        } else {
            RatingUpdate::NotFound
        })
    }

    async fn all_ids(&self) -> anyhow::Result<Vec<CarId>> {
        Entity::find()
            .select_only()
            .column(Column::Id)
            .into_tuple::<String>()
            .all(&self.conn)
            .await?
            .iter()
            .map(|id| CarId::from_string(id).map_err(anyhow::Error::msg))
            .collect()
    }
}
