use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{about, contact, gallery, hero, pricing, settings, testimonials, trainers, training};
use crate::middleware::{admin_only, editor_or_admin, protect};
use crate::state::AppState;

/// Assemble the full application router. Reads are public; section writes
/// require an editor or admin token, settings writes an admin token.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.media.root());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/hero", hero_routes())
        .nest("/api/about", about_routes())
        .nest("/api/training", training_routes())
        .nest("/api/trainers", trainer_routes())
        .nest("/api/gallery", gallery_routes())
        .nest("/api/testimonials", testimonial_routes())
        .nest("/api/pricing", pricing_routes())
        .nest("/api/contact", contact_routes())
        .nest("/api/settings", settings_routes())
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(crate::config::config().api.max_request_size_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn hero_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(hero::list))
        .route("/:id", get(hero::get));
    let protected = Router::new()
        .route("/", post(hero::create))
        .route("/:id", put(hero::update).delete(hero::remove))
        .route_layer(middleware::from_fn(editor_or_admin))
        .route_layer(middleware::from_fn(protect));
    public.merge(protected)
}

fn about_routes() -> Router<AppState> {
    let public = Router::new().route("/", get(about::get));
    let protected = Router::new()
        .route("/", post(about::create))
        .route("/:id", put(about::update).delete(about::remove))
        .route_layer(middleware::from_fn(editor_or_admin))
        .route_layer(middleware::from_fn(protect));
    public.merge(protected)
}

fn training_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(training::list))
        .route("/categories/list", get(training::categories))
        .route("/:id", get(training::get));
    let protected = Router::new()
        .route("/", post(training::create))
        .route("/:id", put(training::update).delete(training::remove))
        .route_layer(middleware::from_fn(editor_or_admin))
        .route_layer(middleware::from_fn(protect));
    public.merge(protected)
}

fn trainer_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(trainers::list))
        .route("/:id", get(trainers::get));
    let protected = Router::new()
        .route("/", post(trainers::create))
        .route("/:id", put(trainers::update).delete(trainers::remove))
        .route_layer(middleware::from_fn(editor_or_admin))
        .route_layer(middleware::from_fn(protect));
    public.merge(protected)
}

fn gallery_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(gallery::list))
        .route("/categories/list", get(gallery::categories))
        .route("/:id", get(gallery::get));
    let protected = Router::new()
        .route("/", post(gallery::create))
        .route("/:id", put(gallery::update).delete(gallery::remove))
        .route_layer(middleware::from_fn(editor_or_admin))
        .route_layer(middleware::from_fn(protect));
    public.merge(protected)
}

fn testimonial_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(testimonials::list))
        .route("/:id", get(testimonials::get));
    let protected = Router::new()
        .route("/", post(testimonials::create))
        .route("/:id", put(testimonials::update).delete(testimonials::remove))
        .route_layer(middleware::from_fn(editor_or_admin))
        .route_layer(middleware::from_fn(protect));
    public.merge(protected)
}

fn pricing_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(pricing::list))
        .route("/:id", get(pricing::get));
    let protected = Router::new()
        .route("/", post(pricing::create))
        .route("/:id", put(pricing::update).delete(pricing::remove))
        .route_layer(middleware::from_fn(editor_or_admin))
        .route_layer(middleware::from_fn(protect));
    public.merge(protected)
}

fn contact_routes() -> Router<AppState> {
    let public = Router::new().route("/", get(contact::get));
    let protected = Router::new()
        .route("/", post(contact::create))
        .route("/:id", put(contact::update).delete(contact::remove))
        .route_layer(middleware::from_fn(editor_or_admin))
        .route_layer(middleware::from_fn(protect));
    public.merge(protected)
}

fn settings_routes() -> Router<AppState> {
    let public = Router::new().route("/", get(settings::get));
    let admin = Router::new()
        .route("/admin", get(settings::get_admin))
        .route("/", put(settings::update))
        .route("/theme", put(settings::update_theme))
        .route("/maintenance", put(settings::update_maintenance))
        .route_layer(middleware::from_fn(admin_only))
        .route_layer(middleware::from_fn(protect));
    public.merge(admin)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Studio CMS",
            "version": version,
            "description": "Content API for a fitness studio marketing site",
            "endpoints": {
                "hero": "/api/hero",
                "about": "/api/about",
                "training": "/api/training",
                "trainers": "/api/trainers",
                "gallery": "/api/gallery",
                "testimonials": "/api/testimonials",
                "pricing": "/api/pricing",
                "contact": "/api/contact",
                "settings": "/api/settings",
                "uploads": "/uploads",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
