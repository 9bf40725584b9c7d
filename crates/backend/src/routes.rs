use axum::{
    handler::Handler,
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::shared::state::AppState;
use crate::system::auth::middleware::{require_admin, require_auth};

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    let auth = || middleware::from_fn(require_auth);
    let admin = || middleware::from_fn(require_admin);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // A001 CARS
        // ========================================
        .route(
            "/api/cars",
            get(handlers::a001_car::list).post(handlers::a001_car::create.layer(admin())),
        )
        .route("/api/cars/featured/list", get(handlers::a001_car::featured))
        .route(
            "/api/cars/:id",
            get(handlers::a001_car::get_by_id)
                .put(handlers::a001_car::update.layer(admin()))
                .delete(handlers::a001_car::delete.layer(admin())),
        )
        // ========================================
        // A002 REVIEWS
        // ========================================
        .route(
            "/api/reviews",
            get(handlers::a002_review::list).post(handlers::a002_review::create.layer(auth())),
        )
        .route(
            "/api/reviews/stats/:car_id",
            get(handlers::a002_review::stats),
        )
        .route(
            "/api/reviews/:id",
            get(handlers::a002_review::get_by_id)
                .put(handlers::a002_review::update.layer(auth()))
                .delete(handlers::a002_review::delete.layer(auth())),
        )
        .route(
            "/api/reviews/:id/helpful",
            put(handlers::a002_review::mark_helpful).layer(auth()),
        )
        .route(
            "/api/reviews/:id/report",
            put(handlers::a002_review::report).layer(auth()),
        )
        // ========================================
        // P001 SEARCH
        // ========================================
        .route("/api/search", get(handlers::p001_car_search::search))
        .route(
            "/api/search/suggestions",
            get(handlers::p001_car_search::suggestions),
        )
        .route(
            "/api/search/popular",
            get(handlers::p001_car_search::popular),
        )
        .route(
            "/api/search/filters",
            get(handlers::p001_car_search::filter_options),
        )
        // ========================================
        // ADMIN
        // ========================================
        .route(
            "/api/admin/cars/:id/recompute-rating",
            post(handlers::admin::recompute_rating).layer(admin()),
        )
        .route(
            "/api/admin/ratings/recompute-all",
            post(handlers::admin::recompute_all).layer(admin()),
        )
        .route(
            "/api/admin/reviews/:id",
            delete(handlers::admin::hard_delete_review).layer(admin()),
        )
        .route("/api/admin/seed", post(handlers::admin::seed).layer(admin()))
        .with_state(state)
}
