//! Wayfarer RPG API server entry point.

use std::sync::{Arc, Mutex};

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use wayfarer_api::config::ApiConfig;
use wayfarer_api::error::AppError;
use wayfarer_api::routes;
use wayfarer_api::state::AppState;
use wayfarer_api::telemetry::Telemetry;
use wayfarer_core::clock::SystemClock;
use wayfarer_core::rng::StdRngSource;
use wayfarer_game::application::engine::{GameEngine, SharedRng};
use wayfarer_narrative::anthropic::AnthropicNarrator;
use wayfarer_narrative::generator::NarrativeGenerator;
use wayfarer_narrative::narrator::{Narrator, NarratorSettings};
use wayfarer_narrative::template::TemplateNarrator;
use wayfarer_rules::config::BalanceConfig;
use wayfarer_store::pg_catalog_repository::PgCatalogRepository;
use wayfarer_store::pg_game_repository::PgGameRepository;
use wayfarer_store::schema::MIGRATOR;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ApiConfig::from_env()?;
    let telemetry = Telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Wayfarer RPG API server");

    let balance = match &config.balance_config_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading balance configuration");
            BalanceConfig::load_yaml(path)?
        }
        None => BalanceConfig::default(),
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    MIGRATOR.run(&pool).await?;

    let generator: Arc<dyn NarrativeGenerator> = match &config.anthropic_api_key {
        Some(key) => {
            let mut narrator = AnthropicNarrator::new(key.clone());
            if let Some(model) = &config.narrative_model {
                narrator = narrator.with_model(model.clone());
            }
            Arc::new(narrator)
        }
        None => {
            tracing::warn!("ANTHROPIC_API_KEY not set; using template narration");
            Arc::new(TemplateNarrator)
        }
    };
    let narrator = Narrator::new(
        generator,
        NarratorSettings::from_balance(&balance, config.narrative_timeout),
    );

    let rng: SharedRng = Arc::new(Mutex::new(StdRngSource::from_os()));
    let engine = GameEngine::new(
        Arc::new(PgGameRepository::new(pool.clone())),
        Arc::new(PgCatalogRepository::new(pool)),
        narrator,
        balance,
        Arc::new(SystemClock),
        rng,
    );

    // TODO: Replace CorsLayer::permissive() with the deployed client origin.
    let app = routes::build_router(AppState::new(engine))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    telemetry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
}
