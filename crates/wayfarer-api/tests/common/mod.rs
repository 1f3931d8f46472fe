//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;
use wayfarer_game::application::engine::{GameEngine, SharedRng};
use wayfarer_narrative::narrator::{Narrator, NarratorSettings};
use wayfarer_rules::config::BalanceConfig;
use wayfarer_store::pg_catalog_repository::PgCatalogRepository;
use wayfarer_store::pg_game_repository::PgGameRepository;
use wayfarer_test_support::{FixedClock, ScriptedNarrativeGenerator, SequenceRng};

use wayfarer_api::routes;
use wayfarer_api::state::AppState;

/// Seeded race `Human`.
pub const HUMAN: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0101);
/// Seeded class `Fighter`.
pub const FIGHTER: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0201);

/// Build the full app router over the Postgres repositories with a scripted
/// narrator and deterministic Clock/RNG. Uses the same route structure as
/// `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, ScriptedNarrativeGenerator::new(), SequenceRng::new(vec![]))
}

/// Build the app with custom narrator scripts and dice.
pub fn build_test_app_with(
    pool: PgPool,
    generator: ScriptedNarrativeGenerator,
    rng: SequenceRng,
) -> Router {
    let rng: SharedRng = Arc::new(Mutex::new(rng));
    let balance = BalanceConfig::default();
    let settings = NarratorSettings::from_balance(&balance, NarratorSettings::DEFAULT_TIMEOUT);
    let engine = GameEngine::new(
        Arc::new(PgGameRepository::new(pool.clone())),
        Arc::new(PgCatalogRepository::new(pool)),
        Narrator::new(Arc::new(generator), settings),
        balance,
        Arc::new(FixedClock::epoch()),
        rng,
    );
    routes::build_router(AppState::new(engine))
}

/// Request body for a human fighter campaign.
pub fn new_campaign_body() -> serde_json::Value {
    serde_json::json!({
        "account_id": Uuid::new_v4(),
        "name": "Ashen Road",
        "description": "A road through the burned lands",
        "character_name": "Mira",
        "race_id": HUMAN,
        "class_id": FIGHTER,
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a DELETE request and return the response.
pub async fn delete(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
