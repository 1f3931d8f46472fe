//! Integration tests for the campaign routes against Postgres.

mod common;

use axum::http::StatusCode;
use sqlx::PgPool;
use uuid::Uuid;
use wayfarer_test_support::{ScriptedNarrativeGenerator, SequenceRng};

fn campaign_id_of(json: &serde_json::Value) -> Uuid {
    json["game_state"]["campaign"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_campaign_round_trip(pool: PgPool) {
    let app = common::build_test_app(pool);

    // POST /api/v1/campaigns
    let (status, json) =
        common::post_json(app.clone(), "/api/v1/campaigns", &common::new_campaign_body()).await;

    assert_eq!(status, StatusCode::CREATED);
    let campaign_id = campaign_id_of(&json);
    assert_eq!(json["game_state"]["character"]["race_name"], "Human");
    assert_eq!(json["game_state"]["character"]["class_name"], "Fighter");
    assert_eq!(json["game_state"]["character"]["max_health"], 20);
    assert_eq!(json["game_state"]["max_event_count"], 50);

    // GET /api/v1/campaigns/{id}
    let (status, json) =
        common::get_json(app, &format!("/api/v1/campaigns/{campaign_id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["game_state"]["campaign"]["state"], "active");
    assert_eq!(json["game_state"]["event_count"], 0);
    assert_eq!(json["choices"], serde_json::json!(["Continue Forward"]));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_campaign_with_unknown_class_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let mut body = common::new_campaign_body();
    body["class_id"] = serde_json::json!(Uuid::new_v4());

    let (status, json) = common::post_json(app, "/api/v1/campaigns", &body).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_environmental_boost_is_persisted(pool: PgPool) {
    let generator = ScriptedNarrativeGenerator::new()
        .with_event_types(&["Environmental"])
        .with_stat_boosts(&[("attack", 3)]);
    let app = common::build_test_app_with(pool.clone(), generator, SequenceRng::new(vec![10]));
    let (_, json) =
        common::post_json(app.clone(), "/api/v1/campaigns", &common::new_campaign_body()).await;
    let campaign_id = campaign_id_of(&json);
    let actions = format!("/api/v1/campaigns/{campaign_id}/actions");

    // Introduction, then an environmental prompt, then investigate.
    let (_, intro) =
        common::post_json(app.clone(), &actions, &serde_json::json!({ "action_type": "continue" }))
            .await;
    let (_, prompt) =
        common::post_json(app.clone(), &actions, &serde_json::json!({ "action_type": "continue" }))
            .await;
    let (status, json) =
        common::post_json(app, &actions, &serde_json::json!({ "action_type": "investigate" }))
            .await;

    assert_eq!(intro["success"], true);
    assert_eq!(prompt["game_state"]["phase"], "investigation_prompt");
    assert_eq!(prompt["choices"], serde_json::json!(["Investigate", "Decline"]));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    // A fresh engine over the same database sees the committed turn.
    let app = common::build_test_app(pool);
    let (status, json) =
        common::get_json(app, &format!("/api/v1/campaigns/{campaign_id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["game_state"]["character"]["attack"], 8);
    assert_eq!(json["game_state"]["event_count"], 2);
    assert_eq!(json["game_state"]["recent_events"][0]["event_type"], "Environmental");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_action_on_unknown_campaign_reports_failure(pool: PgPool) {
    let app = common::build_test_app(pool);
    let campaign_id = Uuid::new_v4();

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/campaigns/{campaign_id}/actions"),
        &serde_json::json!({ "action_type": "continue" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(
        json["error"],
        format!("campaign not found: {campaign_id}")
    );
    assert!(json["game_state"].is_null());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_campaign_removes_it(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, json) =
        common::post_json(app.clone(), "/api/v1/campaigns", &common::new_campaign_body()).await;
    let uri = format!("/api/v1/campaigns/{}", campaign_id_of(&json));

    let (status, _) = common::delete(app.clone(), &uri).await;
    let (after, json) = common::get_json(app.clone(), &uri).await;
    let (again, _) = common::delete(app, &uri).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(after, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
    assert_eq!(again, StatusCode::NOT_FOUND);
}
