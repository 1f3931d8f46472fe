//! Campaign routes: lifecycle and player actions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use wayfarer_game::application::engine::CreateCampaign;
use wayfarer_game::application::responses::{GameServiceResponse, GameState};
use wayfarer_game::domain::action::{ActionType, PlayerAction};

use crate::error::ApiError;
use crate::state::AppState;

/// A campaign view together with the choices valid in its current phase.
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    /// Full state of the campaign.
    pub game_state: GameState,
    /// Choices valid next.
    pub choices: Vec<String>,
}

impl From<GameState> for CampaignResponse {
    fn from(game_state: GameState) -> Self {
        Self {
            choices: game_state.choices(),
            game_state,
        }
    }
}

/// POST /
#[instrument(skip(state, request), fields(account_id = %request.account_id))]
async fn create_campaign(
    State(state): State<AppState>,
    Json(request): Json<CreateCampaign>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    let game_state = state.engine.create_campaign(request).await?;
    info!(campaign_id = %game_state.campaign.id, "campaign started");
    Ok((StatusCode::CREATED, Json(game_state.into())))
}

/// GET /{campaign_id}
#[instrument(skip(state))]
async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let game_state = state.engine.get_game_state(campaign_id).await?;
    Ok(Json(game_state.into()))
}

/// DELETE /{campaign_id}
#[instrument(skip(state))]
async fn delete_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_campaign(campaign_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /{campaign_id}/actions
///
/// Rejected actions still answer 200; the envelope carries `success: false`
/// and the unchanged state.
#[instrument(skip(state, action), fields(action = action.as_str()))]
async fn submit_action(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(action): Json<ActionType>,
) -> Json<GameServiceResponse> {
    let response = state
        .engine
        .process_player_action(PlayerAction {
            campaign_id,
            action,
        })
        .await;
    Json(response)
}

/// Returns the router for campaign routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_campaign))
        .route("/{campaign_id}", get(get_campaign).delete(delete_campaign))
        .route("/{campaign_id}/actions", post(submit_action))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;
    use wayfarer_game::application::engine::{GameEngine, SharedRng};
    use wayfarer_game::domain::repository::{CatalogRepository, GameRepository};
    use wayfarer_narrative::narrator::{Narrator, NarratorSettings};
    use wayfarer_rules::config::BalanceConfig;
    use wayfarer_test_support::{
        FailingGameRepository, FixedClock, InMemoryGameRepository, ScriptedNarrativeGenerator,
        SequenceRng, fixtures,
    };

    fn app_state_with(
        repo: Arc<dyn GameRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> AppState {
        let rng: SharedRng = Arc::new(Mutex::new(SequenceRng::new(vec![])));
        AppState::new(GameEngine::new(
            repo,
            catalog,
            Narrator::new(
                Arc::new(ScriptedNarrativeGenerator::new()),
                NarratorSettings::default(),
            ),
            BalanceConfig::default(),
            Arc::new(FixedClock::epoch()),
            rng,
        ))
    }

    fn test_app_state() -> AppState {
        let repo = Arc::new(
            InMemoryGameRepository::new()
                .with_race(fixtures::human())
                .with_class(fixtures::fighter())
                .with_enemies([fixtures::wolf()]),
        );
        app_state_with(repo.clone(), repo)
    }

    fn failing_app_state() -> AppState {
        let catalog = Arc::new(
            InMemoryGameRepository::new()
                .with_race(fixtures::human())
                .with_class(fixtures::fighter()),
        );
        app_state_with(Arc::new(FailingGameRepository), catalog)
    }

    fn create_body() -> Value {
        serde_json::json!({
            "account_id": Uuid::new_v4(),
            "name": "Ashen Road",
            "character_name": "Mira",
            "race_id": fixtures::human().id,
            "class_id": fixtures::fighter().id,
        })
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };
        (status, json)
    }

    async fn create(state: &AppState) -> Uuid {
        let app = router().with_state(state.clone());
        let (status, json) = send(app, "POST", "/", Some(&create_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        json["game_state"]["campaign"]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_campaign_returns_201_with_state_and_choices() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let (status, json) = send(app, "POST", "/", Some(&create_body())).await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["game_state"]["phase"], "exploration");
        assert_eq!(json["game_state"]["character"]["current_health"], 20);
        assert_eq!(json["choices"], serde_json::json!(["Continue Forward"]));
    }

    #[tokio::test]
    async fn test_create_campaign_with_blank_name_returns_400() {
        // Arrange
        let app = router().with_state(test_app_state());
        let mut body = create_body();
        body["name"] = Value::from("   ");

        // Act
        let (status, json) = send(app, "POST", "/", Some(&body)).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_create_campaign_with_unknown_race_returns_404() {
        // Arrange
        let app = router().with_state(test_app_state());
        let mut body = create_body();
        body["race_id"] = Value::from(Uuid::new_v4().to_string());

        // Act
        let (status, json) = send(app, "POST", "/", Some(&body)).await;

        // Assert
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_create_campaign_returns_422_for_missing_fields() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let (status, _) = send(app, "POST", "/", Some(&serde_json::json!({}))).await;

        // Assert
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_get_unknown_campaign_returns_404() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let (status, json) = send(app, "GET", &format!("/{}", Uuid::new_v4()), None).await;

        // Assert
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_continue_action_returns_introduction() {
        // Arrange
        let state = test_app_state();
        let campaign_id = create(&state).await;
        let app = router().with_state(state);

        // Act
        let (status, json) = send(
            app,
            "POST",
            &format!("/{campaign_id}/actions"),
            Some(&serde_json::json!({ "action_type": "continue" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["game_state"]["event_count"], 1);
        assert_eq!(json["choices"], serde_json::json!(["Continue Forward"]));
    }

    #[tokio::test]
    async fn test_action_in_wrong_phase_reports_failure_in_body() {
        // Arrange
        let state = test_app_state();
        let campaign_id = create(&state).await;
        let app = router().with_state(state);

        // Act
        let (status, json) = send(
            app,
            "POST",
            &format!("/{campaign_id}/actions"),
            Some(&serde_json::json!({ "action_type": "attack" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "The action could not be completed.");
        assert!(
            json["error"]
                .as_str()
                .unwrap()
                .contains("only valid during combat")
        );
        assert_eq!(json["game_state"]["phase"], "exploration");
    }

    #[tokio::test]
    async fn test_delete_campaign_returns_204_then_404() {
        // Arrange
        let state = test_app_state();
        let campaign_id = create(&state).await;

        // Act
        let (status, _) = send(
            router().with_state(state.clone()),
            "DELETE",
            &format!("/{campaign_id}"),
            None,
        )
        .await;
        let (after, _) = send(
            router().with_state(state),
            "GET",
            &format!("/{campaign_id}"),
            None,
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(after, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_campaign_returns_500_when_repository_fails() {
        // Arrange
        let app = router().with_state(failing_app_state());

        // Act
        let (status, json) = send(app, "POST", "/", Some(&create_body())).await;

        // Assert
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
