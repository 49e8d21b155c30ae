//! Airfleet Server
//!
//! JSON API over the Airfleet record engine: aircraft, engines, airlines and
//! users kept in a document store, with reads served through a shared cache.
//!
//! Uses SQLite (embedded) for documents and either an in-process map or
//! Redis for the cache.

mod handlers;
mod settings;
mod storage;

use airfleet_core::{
    BestEffortSync, CacheStore, Deadline, DocumentStore, MemoryCache, MemoryStore, Navigator,
    RelationshipSync, Repositories,
};
use anyhow::{Context, Result};
use axum::{
    routing::{get, put},
    Router,
};
use handlers::records;
use settings::{CacheBackend, LogFormat, Settings, StoreBackend};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use storage::{RedisCache, SqliteStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub sync: Arc<dyn RelationshipSync>,
    pub navigator: Arc<Navigator>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(repos: Repositories, request_timeout: Duration) -> Self {
        Self {
            sync: Arc::new(BestEffortSync::new(repos.clone())),
            navigator: Arc::new(Navigator::new(repos.clone())),
            repos,
            request_timeout,
        }
    }

    /// Fresh budget for one request
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("[FATAL] Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(settings.log_format) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Airfleet Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server(settings).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))
}

async fn run_server(settings: Settings) -> Result<()> {
    info!(
        "Config loaded: bind={}, store={:?}, cache={:?}, timeout={}s",
        settings.bind_address,
        settings.store.backend,
        settings.cache.backend,
        settings.request_timeout_secs
    );

    let store: Arc<dyn DocumentStore> = match settings.store.backend {
        StoreBackend::Sqlite => Arc::new(
            SqliteStore::new(&settings.store.database_path)
                .await
                .context("Failed to initialize database")?,
        ),
        StoreBackend::Memory => {
            info!("Using in-memory document store; records are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let cache: Arc<dyn CacheStore> = match settings.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Redis => Arc::new(
            RedisCache::new(&settings.cache.redis_url)
                .await
                .context("Failed to initialize Redis cache")?,
        ),
    };
    info!(
        "Cache initialized (failure mode {:?})",
        settings.cache.failure_mode
    );

    let repos = Repositories::new(store, cache, settings.cache.failure_mode);
    let state = AppState::new(repos, settings.request_timeout());
    let app = router(state);

    let addr: SocketAddr = settings
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    use airfleet_core::{Aircraft, Airline, Engine, Flight, Review, Route, User};
    use handlers::{aircraft, airlines, engines, users};

    Router::new()
        // Aircraft
        .route(
            "/aircraft",
            get(records::list::<Aircraft>).post(records::create::<Aircraft>),
        )
        .route("/aircraft/search", get(aircraft::search))
        .route(
            "/aircraft/:id",
            get(records::get::<Aircraft>)
                .patch(records::patch::<Aircraft>)
                .delete(aircraft::delete),
        )
        .route(
            "/aircraft/:id/engines",
            get(aircraft::engines).put(aircraft::update_engines),
        )
        .route("/aircraft/:id/tags", put(aircraft::update_tags))
        .route(
            "/aircraft/:id/owner",
            get(aircraft::owner).put(aircraft::update_owner),
        )
        .route("/aircraft/:id/operator", get(aircraft::operator))
        // Engines
        .route(
            "/engines",
            get(records::list::<Engine>).post(records::create::<Engine>),
        )
        .route(
            "/engines/:id",
            get(records::get::<Engine>)
                .patch(records::patch::<Engine>)
                .delete(engines::delete),
        )
        // Airlines
        .route(
            "/airlines",
            get(records::list::<Airline>).post(records::create::<Airline>),
        )
        .route(
            "/airlines/:id",
            get(records::get::<Airline>)
                .patch(records::patch::<Airline>)
                .delete(airlines::delete),
        )
        .route(
            "/airlines/:id/fleet",
            get(airlines::fleet).put(airlines::update_fleet),
        )
        .route(
            "/airlines/:id/owner",
            get(airlines::owner).put(airlines::update_owner),
        )
        .route("/airlines/:id/reviews", put(airlines::update_reviews))
        .route("/airlines/:id/routes", put(airlines::update_routes))
        // Users
        .route(
            "/users",
            get(records::list::<User>).post(records::create::<User>),
        )
        .route("/users/search", get(users::search))
        .route(
            "/users/:id",
            get(records::get::<User>)
                .patch(records::patch::<User>)
                .delete(users::delete),
        )
        .route(
            "/users/:id/airlines",
            get(users::airlines).put(users::update_airlines),
        )
        // Plain records
        .route(
            "/flights",
            get(records::list::<Flight>).post(records::create::<Flight>),
        )
        .route(
            "/flights/:id",
            get(records::get::<Flight>)
                .patch(records::patch::<Flight>)
                .delete(records::delete::<Flight>),
        )
        .route(
            "/routes",
            get(records::list::<Route>).post(records::create::<Route>),
        )
        .route(
            "/routes/:id",
            get(records::get::<Route>)
                .patch(records::patch::<Route>)
                .delete(records::delete::<Route>),
        )
        .route(
            "/reviews",
            get(records::list::<Review>).post(records::create::<Review>),
        )
        .route(
            "/reviews/:id",
            get(records::get::<Review>)
                .patch(records::patch::<Review>)
                .delete(records::delete::<Review>),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use airfleet_core::CacheFailureMode;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let repos = Repositories::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryCache::new()),
            CacheFailureMode::Surface,
        );
        router(AppState::new(repos, Duration::from_secs(10)))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_install_engine_over_http() {
        let app = app();
        let (status, aircraft) = call(
            &app,
            Method::POST,
            "/api/v1/aircraft",
            Some(json!({
                "general": {"name": "Beaver"},
                "engines": [airfleet_core::RecordId::generate().to_string()],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(aircraft["engines"], json!([]));
        let aircraft_id = aircraft["id"].as_str().unwrap().to_string();

        let (_, engine) = call(&app, Method::POST, "/api/v1/engines", Some(json!({"model": "R-985"}))).await;
        let engine_id = engine["id"].as_str().unwrap().to_string();

        let (status, report) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/aircraft/{aircraft_id}/engines"),
            Some(json!({"ids": [engine_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["committed"].as_array().unwrap().len(), 2);

        let (_, engines) = call(
            &app,
            Method::GET,
            &format!("/api/v1/aircraft/{aircraft_id}/engines"),
            None,
        )
        .await;
        assert_eq!(engines[0]["owningAircraft"], json!(aircraft_id));

        let (_, found) = call(&app, Method::GET, "/api/v1/aircraft/search?name=Beaver", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/v1/engines/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("not-a-uuid"));

        let (status, body) = call(&app, Method::GET, "/api/v1/aircraft/search?name=Concorde", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Concorde"));

        let missing = airfleet_core::RecordId::generate();
        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/airlines/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, airline) = call(&app, Method::POST, "/api/v1/airlines", Some(json!({"general": {"name": "Kenmore"}}))).await;
        let airline_id = airline["id"].as_str().unwrap();
        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/api/v1/airlines/{airline_id}"),
            Some(json!({"owner": missing.to_string()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_engine_id_leaves_both_sides_untouched() {
        let app = app();
        let (_, aircraft) = call(&app, Method::POST, "/api/v1/aircraft", Some(json!({"general": {"name": "Dash 7"}}))).await;
        let aircraft_id = aircraft["id"].as_str().unwrap().to_string();
        let (_, engine) = call(&app, Method::POST, "/api/v1/engines", Some(json!({"model": "PT6A-50"}))).await;
        let engine_id = engine["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/aircraft/{aircraft_id}/engines"),
            Some(json!({"ids": [engine_id, "64b7f0c2e4b0a1a2b3c4d5e6"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("64b7f0c2e4b0a1a2b3c4d5e6"));

        let (_, aircraft) = call(&app, Method::GET, &format!("/api/v1/aircraft/{aircraft_id}"), None).await;
        assert_eq!(aircraft["engines"], json!([]));
        let (_, engine) = call(&app, Method::GET, &format!("/api/v1/engines/{engine_id}"), None).await;
        assert_eq!(engine["owningAircraft"], Value::Null);
    }

    #[tokio::test]
    async fn test_plain_record_crud() {
        let app = app();
        let (status, flight) = call(&app, Method::POST, "/api/v1/flights", Some(json!({"flightNumber": "HA101"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = flight["id"].as_str().unwrap().to_string();

        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/flights/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/flights/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
