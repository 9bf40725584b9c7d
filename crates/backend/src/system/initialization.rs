//! Демо-каталог и отзывы. Всё пишется через обычные сервисы,
//! поэтому рейтинги автомобилей после сидинга согласованы.

use contracts::domain::a001_car::aggregate::{
    Availability, CarDto, CarImage, Category, Condition, Dealer, DealerContact, FuelType,
    LeasePrice, Specifications, Transmission,
};
use contracts::domain::a002_review::aggregate::CreateReviewDto;
use serde::Serialize;

use crate::domain::a001_car::service::CarService;
use crate::domain::a002_review::service::{Actor, ReviewService};
use crate::system::auth::jwt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub skipped: bool,
    pub cars: usize,
    pub reviews: usize,
}

struct DemoCar {
    name: &'static str,
    brand: &'static str,
    model: &'static str,
    year: i32,
    price: f64,
    original_price: Option<f64>,
    discount: f64,
    lease: (f64, f64, i32),
    description: &'static str,
    image: &'static str,
    engine: &'static str,
    fuel_type: FuelType,
    transmission: Transmission,
    doors: i32,
    mileage: i32,
    co2: i32,
    top_speed: i32,
    acceleration: f64,
    category: Category,
    condition: Condition,
    dealer: (&'static str, &'static str, &'static str, &'static str),
    features: &'static [&'static str],
    tags: &'static [&'static str],
    featured: bool,
}

impl From<&DemoCar> for CarDto {
    fn from(c: &DemoCar) -> Self {
        let (dealer_name, location, phone, email) = c.dealer;
        CarDto {
            name: c.name.into(),
            brand: c.brand.into(),
            model: c.model.into(),
            year: c.year,
            price: c.price,
            original_price: c.original_price,
            discount_percentage: c.discount,
            lease_price: Some(LeasePrice {
                monthly: Some(c.lease.0),
                deposit: Some(c.lease.1),
                term: Some(c.lease.2),
            }),
            description: c.description.into(),
            images: vec![CarImage {
                url: format!("/uploads/cars/{}", c.image),
                alt: format!("{} - Front view", c.name),
                is_primary: true,
            }],
            specifications: Specifications {
                engine: Some(c.engine.into()),
                fuel_type: Some(c.fuel_type),
                transmission: Some(c.transmission),
                doors: Some(c.doors),
                seats: Some(5),
                mileage: Some(c.mileage),
                co2_emissions: Some(c.co2),
                top_speed: Some(c.top_speed),
                acceleration: Some(c.acceleration),
            },
            category: c.category,
            condition: c.condition,
            availability: Availability::Available,
            dealer: Dealer {
                name: dealer_name.into(),
                location: location.into(),
                contact: DealerContact {
                    phone: Some(phone.into()),
                    email: Some(email.into()),
                },
            },
            features: c.features.iter().map(|f| f.to_string()).collect(),
            tags: c.tags.iter().map(|t| t.to_string()).collect(),
            is_featured: c.featured,
        }
    }
}

const DEMO_CARS: &[DemoCar] = &[
    DemoCar {
        name: "Jaguar 7",
        brand: "Jaguar",
        model: "7",
        year: 2024,
        price: 28623.0,
        original_price: Some(30000.0),
        discount: 5.0,
        lease: (294.0, 2500.0, 36),
        description: "Jaguar SUV with bold styling",
        image: "jaguar-7.jpg",
        engine: "2.0L Turbo",
        fuel_type: FuelType::Petrol,
        transmission: Transmission::Automatic,
        doors: 5,
        mileage: 0,
        co2: 180,
        top_speed: 155,
        acceleration: 7.2,
        category: Category::Suv,
        condition: Condition::New,
        dealer: ("Premium Motors", "London", "020 1234 5678", "sales@premiummotors.co.uk"),
        features: &["LED Headlights", "Panoramic Sunroof", "Leather Seats", "Navigation System"],
        tags: &["luxury", "suv", "new"],
        featured: true,
    },
    DemoCar {
        name: "Hyundai Tucson",
        brand: "Hyundai",
        model: "Tucson",
        year: 2023,
        price: 25958.0,
        original_price: Some(28000.0),
        discount: 7.0,
        lease: (267.0, 2000.0, 36),
        description: "Hyundai's unusual-looking family SUV contender",
        image: "hyundai-tucson.jpg",
        engine: "1.6L Hybrid",
        fuel_type: FuelType::Hybrid,
        transmission: Transmission::Automatic,
        doors: 5,
        mileage: 15000,
        co2: 120,
        top_speed: 180,
        acceleration: 8.5,
        category: Category::Suv,
        condition: Condition::NearlyNew,
        dealer: ("City Hyundai", "Manchester", "0161 234 5678", "info@cityhyundai.co.uk"),
        features: &["Hybrid Engine", "Apple CarPlay", "Android Auto", "Rear Camera"],
        tags: &["hybrid", "suv", "efficient"],
        featured: true,
    },
    DemoCar {
        name: "Kia Sportage",
        brand: "Kia",
        model: "Sportage",
        year: 2023,
        price: 28416.0,
        original_price: Some(30000.0),
        discount: 5.0,
        lease: (236.0, 2200.0, 36),
        description: "Practical family SUV with stand-out styling",
        image: "kia-sportage.jpg",
        engine: "1.6L Turbo",
        fuel_type: FuelType::Petrol,
        transmission: Transmission::Manual,
        doors: 5,
        mileage: 8500,
        co2: 155,
        top_speed: 175,
        acceleration: 9.1,
        category: Category::Suv,
        condition: Condition::NearlyNew,
        dealer: ("Kia Central", "Birmingham", "0121 345 6789", "sales@kiacentral.co.uk"),
        features: &["7-Year Warranty", "Heated Seats", "Wireless Charging"],
        tags: &["suv", "reliable", "warranty"],
        featured: true,
    },
    DemoCar {
        name: "Tesla Model 3",
        brand: "Tesla",
        model: "Model 3",
        year: 2024,
        price: 42990.0,
        original_price: None,
        discount: 0.0,
        lease: (450.0, 3000.0, 36),
        description: "Premium electric sedan with autopilot capabilities",
        image: "tesla-model3.jpg",
        engine: "Electric Motor",
        fuel_type: FuelType::Electric,
        transmission: Transmission::Automatic,
        doors: 4,
        mileage: 0,
        co2: 0,
        top_speed: 225,
        acceleration: 5.3,
        category: Category::Electric,
        condition: Condition::New,
        dealer: ("Tesla Store London", "London", "020 8765 4321", "london@tesla.com"),
        features: &["Autopilot", "Glass Roof", "Over-the-air Updates"],
        tags: &["electric", "luxury", "tech"],
        featured: true,
    },
    DemoCar {
        name: "BMW 3 Series",
        brand: "BMW",
        model: "3 Series",
        year: 2022,
        price: 35500.0,
        original_price: Some(38000.0),
        discount: 7.0,
        lease: (380.0, 2800.0, 36),
        description: "Executive saloon with sporty handling",
        image: "bmw-3series.jpg",
        engine: "2.0L Turbo",
        fuel_type: FuelType::Petrol,
        transmission: Transmission::Automatic,
        doors: 4,
        mileage: 12000,
        co2: 140,
        top_speed: 250,
        acceleration: 6.2,
        category: Category::Saloon,
        condition: Condition::Used,
        dealer: ("BMW Park Lane", "London", "020 7123 4567", "parklane@bmw.co.uk"),
        features: &["Sport Seats", "Head-up Display", "Adaptive Cruise Control"],
        tags: &["luxury", "performance", "executive"],
        featured: false,
    },
    DemoCar {
        name: "Volkswagen Golf",
        brand: "Volkswagen",
        model: "Golf",
        year: 2023,
        price: 24500.0,
        original_price: None,
        discount: 0.0,
        lease: (280.0, 2000.0, 36),
        description: "Reliable family hatchback with excellent build quality",
        image: "vw-golf.jpg",
        engine: "1.5L TSI",
        fuel_type: FuelType::Petrol,
        transmission: Transmission::Manual,
        doors: 5,
        mileage: 5000,
        co2: 125,
        top_speed: 200,
        acceleration: 8.5,
        category: Category::Hatchback,
        condition: Condition::NearlyNew,
        dealer: ("Volkswagen Centre", "Leeds", "0113 456 7890", "leeds@volkswagen.co.uk"),
        features: &["Digital Cockpit", "Lane Assist", "App Connect"],
        tags: &["reliable", "efficient", "family"],
        featured: false,
    },
];

/// (title, text, rating); отзыв i относится к автомобилю i
const DEMO_REVIEWS: &[(&str, &str, i32)] = &[
    (
        "Excellent SUV",
        "The Jaguar 7 is an outstanding vehicle with great performance and luxury features. Highly recommended!",
        5,
    ),
    (
        "Great value hybrid",
        "Very impressed with the fuel economy and build quality of the Hyundai Tucson. Perfect for families.",
        4,
    ),
    (
        "Stylish and practical",
        "The Kia Sportage offers great value for money with its 7-year warranty and modern features.",
        4,
    ),
    (
        "Future of driving",
        "Tesla Model 3 is simply amazing. The technology and performance are unmatched.",
        5,
    ),
];

const DEMO_USERS: &[&str] = &["demo-user-1", "demo-user-2", "demo-user-3"];

pub fn demo_cars() -> Vec<CarDto> {
    DEMO_CARS.iter().map(CarDto::from).collect()
}

/// Fill an empty catalogue with demo cars and reviews. A non-empty database is left untouched.
pub async fn seed_demo_data(
    cars: &CarService,
    reviews: &ReviewService,
) -> anyhow::Result<SeedSummary> {
    if !cars.is_catalogue_empty().await? {
        tracing::info!("Catalogue is not empty, demo data skipped");
        return Ok(SeedSummary {
            skipped: true,
            ..Default::default()
        });
    }

    let mut summary = SeedSummary::default();
    let mut car_ids = Vec::new();
    for dto in demo_cars() {
        let car = cars.create(dto).await?;
        car_ids.push(car.id);
        summary.cars += 1;
    }

    for (i, (title, text, rating)) in DEMO_REVIEWS.iter().enumerate() {
        let Some(car_id) = car_ids.get(i) else {
            continue;
        };
        let user = DEMO_USERS[i.min(DEMO_USERS.len() - 1)];
        let actor = Actor {
            user_id: user.to_string(),
            is_admin: false,
        };
        let dto = CreateReviewDto {
            car_id: car_id.to_string(),
            title: title.to_string(),
            text: text.to_string(),
            rating: *rating,
        };
        reviews.create(&actor, dto).await?;
        summary.reviews += 1;
    }

    tracing::info!(cars = summary.cars, reviews = summary.reviews, "demo data seeded");
    Ok(summary)
}

/// Dev admin token for trying the admin routes by hand. It goes to `out` only:
/// the tracing subscribers also write to logs/backend.log.
pub fn announce_dev_admin_token(
    secret: &str,
    out: &mut impl std::io::Write,
) -> anyhow::Result<()> {
    let token = jwt::generate_access_token_with(secret, "dev-admin", "admin", true)?;
    writeln!(out, "Dev admin token (24h): {}", token)?;
    tracing::info!("dev admin token printed to stdout");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_car::repository::CarRepository;
    use crate::domain::a001_car::store::CarStore;
    use crate::domain::a002_review::rating::RatingAggregator;
    use crate::domain::a002_review::repository::ReviewRepository;
    use crate::domain::a002_review::store::ReviewStore;
    use crate::shared::data::db::connect_in_memory;
    use chrono::Datelike;
    use contracts::domain::a001_car::aggregate::Car;
    use contracts::domain::a001_car::aggregate::CarListQuery;
    use std::sync::Arc;

    #[test]
    fn test_demo_cars_are_valid() {
        let year = chrono::Utc::now().year();
        for dto in demo_cars() {
            let car = Car::new_for_insert(dto);
            assert!(car.validate(year).is_ok(), "{} is invalid", car.name);
        }
    }

    #[tokio::test]
    async fn test_seed_once_with_consistent_ratings() {
        let conn = connect_in_memory().await.unwrap();
        let car_repo = Arc::new(CarRepository::new(conn.clone()));
        let review_store: Arc<dyn ReviewStore> = Arc::new(ReviewRepository::new(conn));
        let car_store: Arc<dyn CarStore> = car_repo.clone();
        let aggregator = Arc::new(RatingAggregator::new(review_store.clone(), car_store.clone()));
        let cars = CarService::new(car_repo);
        let reviews = ReviewService::new(review_store, car_store, aggregator);

        let summary = seed_demo_data(&cars, &reviews).await.unwrap();
        assert_eq!(summary.cars, DEMO_CARS.len());
        assert_eq!(summary.reviews, DEMO_REVIEWS.len());

        let again = seed_demo_data(&cars, &reviews).await.unwrap();
        assert!(again.skipped);

        let query = CarListQuery {
            brand: Some("Jaguar".into()),
            ..Default::default()
        };
        let jaguar = cars.list(&query).await.unwrap().items.remove(0);
        assert_eq!(jaguar.review_count, 1);
        assert_eq!(jaguar.average_rating, 5.0);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dev_token_stays_out_of_logs() {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .finish();

        let mut stdout = Vec::new();
        tracing::subscriber::with_default(subscriber, || {
            announce_dev_admin_token("dev-secret", &mut stdout).unwrap();
        });

        let printed = String::from_utf8(stdout).unwrap();
        let token = printed.trim().rsplit(' ').next().unwrap().to_string();
        let claims = jwt::validate_token_with(&token, "dev-secret").unwrap();
        assert!(claims.is_admin);

        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("dev admin token printed"));
        assert!(!logged.contains(&token));
    }
}
