pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ownership;
pub mod services;

use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the full application router.
pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API behind the JWT middleware
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    use axum::routing::post;
    use handlers::public::{auth, catalog, payment};

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/lectures", get(catalog::list))
        .route("/lectures/:id", get(catalog::detail))
        .route("/lectures/:id/reviews", get(catalog::reviews))
        .route("/payments/webhook", post(payment::webhook))
}

fn protected_routes() -> Router {
    use axum::routing::{delete, post, put};
    use handlers::protected::{asset, curriculum, lecture, payment, purchase, review};

    Router::new()
        // Lectures (content-tree roots)
        .route("/api/lectures", get(lecture::list).post(lecture::create))
        .route(
            "/api/lectures/:id",
            put(lecture::update).delete(lecture::delete),
        )
        .route("/api/lectures/:id/curriculums", post(curriculum::create))
        .route("/api/lectures/:id/reviews", post(review::create))
        // Curriculum tree
        .route("/api/curriculums/:id", delete(curriculum::delete))
        .route(
            "/api/curriculums/:id/sections",
            post(curriculum::create_section),
        )
        .route("/api/sections/:id", delete(curriculum::delete_section))
        .route("/api/sections/:id/videos", post(asset::create_video))
        .route("/api/sections/:id/files", post(asset::create_file))
        .route("/api/videos/:id", delete(asset::delete_video))
        .route("/api/files/:id", delete(asset::delete_file))
        // Purchases and reviews
        .route(
            "/api/purchases",
            get(purchase::list).post(purchase::create),
        )
        .route("/api/reviews/:id/replies", post(review::reply))
        // Payment orders
        .route("/api/payments/orders", post(payment::create_order))
        .route(
            "/api/payments/orders/:merchant_uid",
            get(payment::get_order),
        )
        .layer(axum::middleware::from_fn(
            middleware::auth::jwt_auth_middleware,
        ))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Lectern API",
        "version": version,
        "description": "Course marketplace backend API",
        "endpoints": {
            "home": "/ (public)",
            "auth": "/auth/register, /auth/login (public)",
            "catalog": "/lectures[/:id[/reviews]] (public)",
            "webhook": "/payments/webhook (public - gateway callback)",
            "lectures": "/api/lectures[/:id] (protected)",
            "curriculum": "/api/curriculums/:id, /api/sections/:id (protected)",
            "assets": "/api/videos/:id, /api/files/:id (protected)",
            "purchases": "/api/purchases (protected)",
            "reviews": "/api/lectures/:id/reviews, /api/reviews/:id/replies (protected)",
            "payments": "/api/payments/orders (protected)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
