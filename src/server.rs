use crate::domain::{Event, EventPatch, EventType};
use crate::error::EventsError;
use crate::local_store::{BatchFailure, LocalEventStore};
use axum::{
    extract::Path,
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use uuid::Uuid;

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "afisha-local-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// All local events, insertion order.
async fn list_events(Extension(store): Extension<Arc<LocalEventStore>>) -> impl IntoResponse {
    Json(store.list(None))
}

/// Local events scoped to one category. Unknown categories match nothing.
async fn list_events_by_type(
    Extension(store): Extension<Arc<LocalEventStore>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match key.parse::<EventType>() {
        Ok(event_type) => Json(store.list(Some(event_type))),
        Err(_) => Json(Vec::new()),
    }
}

async fn get_event(
    Extension(store): Extension<Arc<LocalEventStore>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    // A malformed uuid is just a lookup miss, same as an unknown one.
    match Uuid::parse_str(&key).ok().and_then(|uuid| store.get(uuid)) {
        Some(event) => (StatusCode::OK, Json(json!(event))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Event not found" })),
        ),
    }
}

async fn add_event(
    Extension(store): Extension<Arc<LocalEventStore>>,
    Json(event): Json<Event>,
) -> impl IntoResponse {
    match store.insert(event).await {
        Ok(stored) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Event added successfully",
                "uuid": stored.uuid,
                "event": stored,
            })),
        ),
        Err(EventsError::Conflict(uuid)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Event with this UUID already exists",
                "uuid": uuid,
            })),
        ),
        Err(EventsError::Validation(message)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Invalid event: {}", message) })),
        ),
        Err(e) => {
            error!("Error adding event: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
        }
    }
}

async fn update_event(
    Extension(store): Extension<Arc<LocalEventStore>>,
    Path(key): Path<String>,
    Json(patch): Json<EventPatch>,
) -> impl IntoResponse {
    let Ok(uuid) = Uuid::parse_str(&key) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid uuid" })),
        );
    };
    match store.update(uuid, patch).await {
        Ok(event) => (
            StatusCode::OK,
            Json(json!({
                "message": "Event updated successfully",
                "event": event,
            })),
        ),
        Err(EventsError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Event not found" })),
        ),
        Err(e) => {
            error!("Error updating event: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
        }
    }
}

async fn delete_event(
    Extension(store): Extension<Arc<LocalEventStore>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let Ok(uuid) = Uuid::parse_str(&key) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid uuid" })),
        );
    };
    match store.delete(uuid).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Event deleted successfully", "uuid": uuid })),
        ),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Event not found" })),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    events: Vec<serde_json::Value>,
}

/// Batch insert with per-item outcomes. Malformed elements land in
/// `failed`; the rest go through normal insert semantics. Never aborts.
async fn add_events_batch(
    Extension(store): Extension<Arc<LocalEventStore>>,
    Json(request): Json<BatchRequest>,
) -> impl IntoResponse {
    let mut decode_failures = Vec::new();
    let mut decoded = Vec::new();
    for value in request.events {
        let uuid = value
            .get("uuid")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        match serde_json::from_value::<Event>(value) {
            Ok(event) => decoded.push(event),
            Err(e) => decode_failures.push(BatchFailure {
                uuid,
                error: format!("Missing required fields: {}", e),
            }),
        }
    }

    let mut report = store.insert_batch(decoded).await;
    report.failed.extend(decode_failures);

    (StatusCode::CREATED, Json(report))
}

async fn stats(Extension(store): Extension<Arc<LocalEventStore>>) -> impl IntoResponse {
    Json(store.stats())
}

pub fn create_server(store: Arc<LocalEventStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/events", get(list_events).post(add_event))
        .route("/events/batch", axum::routing::post(add_events_batch))
        .route("/events/uuid/:uuid", get(get_event))
        .route(
            "/events/:key",
            get(list_events_by_type)
                .put(update_event)
                .delete(delete_event),
        )
        .route("/stats", get(stats))
        .layer(ServiceBuilder::new().layer(Extension(store)).layer(cors))
}

pub async fn start_server(
    store: Arc<LocalEventStore>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(store);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Local API server started on port {}", port);
    info!("  GET  http://localhost:{}/health", port);
    info!("  GET  http://localhost:{}/events", port);
    info!("  POST http://localhost:{}/events", port);
    info!("  POST http://localhost:{}/events/batch", port);

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
