//! Exploration scenarios driven through `GameEngine::process_player_action`.

mod common;

use uuid::Uuid;
use wayfarer_core::vocabulary::{CampaignState, EquipmentSlot, EventType, StatType};
use wayfarer_game::domain::action::{ActionType, CHOICE_CONTINUE, GamePhase, PlayerAction};
use wayfarer_narrative::context::Scene;
use wayfarer_narrative::generator::RawItemDrop;
use wayfarer_test_support::{ScriptedNarrativeGenerator, SequenceRng, fixtures};

use common::{catalog, start};

#[tokio::test]
async fn test_new_campaign_offers_continue_only() {
    // Arrange / Act
    let h = start(catalog(), ScriptedNarrativeGenerator::new(), SequenceRng::new(vec![])).await;

    // Assert
    let state = h.state().await;
    assert_eq!(state.phase, GamePhase::Exploration);
    assert_eq!(state.choices(), vec![CHOICE_CONTINUE.to_owned()]);
    assert_eq!(state.character.max_health, 20);
    assert_eq!(state.character.current_health, 20);
    assert_eq!(state.event_count, 0);
    assert_eq!(state.max_event_count, 50);
}

#[tokio::test]
async fn test_first_continue_is_introduction_not_selection() {
    // Arrange: an empty RNG and an empty event-type script, so any call into
    // the selector would fail the test.
    let h = start(catalog(), ScriptedNarrativeGenerator::new(), SequenceRng::new(vec![])).await;

    // Act
    let response = h.ok(ActionType::Continue).await;

    // Assert
    let events = h.repo.events(h.campaign_id);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_number, 1);
    assert_eq!(events[0].event_type, EventType::Descriptive);
    assert!(events[0].event_data.as_ref().unwrap().introduction);
    assert_eq!(h.generator.scenes(), vec![Scene::Introduction]);
    assert_eq!(response.choices, vec![CHOICE_CONTINUE.to_owned()]);
}

#[tokio::test]
async fn test_descriptive_events_build_a_streak() {
    // Arrange
    let generator = ScriptedNarrativeGenerator::new().with_event_types(&["Descriptive", "Descriptive"]);
    let h = start(catalog(), generator, SequenceRng::new(vec![])).await;
    h.seed_log(&[EventType::Environmental]);

    // Act
    h.ok(ActionType::Continue).await;
    let response = h.ok(ActionType::Continue).await;

    // Assert
    let state = response.game_state.unwrap();
    assert_eq!(state.descriptive_streak, 2);
    assert_eq!(state.event_count, 3);
    assert_eq!(state.phase, GamePhase::Exploration);
}

#[tokio::test]
async fn test_non_descriptive_event_raises_prompt_without_effects() {
    // Arrange
    let generator = ScriptedNarrativeGenerator::new().with_event_types(&["Environmental"]);
    let h = start(catalog(), generator, SequenceRng::new(vec![])).await;
    h.seed_log(&[EventType::Descriptive]);

    // Act
    let response = h.ok(ActionType::Continue).await;

    // Assert
    let state = response.game_state.unwrap();
    assert_eq!(state.phase, GamePhase::InvestigationPrompt);
    assert_eq!(
        state.pending_prompt.unwrap().event_type,
        EventType::Environmental
    );
    assert_eq!(response.choices, vec!["Investigate", "Decline"]);
    assert_eq!(h.repo.commit_count(), 0);
    assert_eq!(h.repo.events(h.campaign_id).len(), 1);
}

#[tokio::test]
async fn test_decline_logs_original_type_as_declined() {
    // Arrange
    let generator = ScriptedNarrativeGenerator::new().with_event_types(&["Combat"]);
    let h = start(catalog(), generator, SequenceRng::new(vec![])).await;
    h.seed_log(&[EventType::Descriptive]);
    h.ok(ActionType::Continue).await;

    // Act
    let response = h.ok(ActionType::Decline).await;

    // Assert
    let events = h.repo.events(h.campaign_id);
    let declined = events.last().unwrap();
    assert_eq!(declined.event_number, 2);
    assert_eq!(declined.event_type, EventType::Combat);
    assert!(declined.is_declined());
    let state = response.game_state.unwrap();
    assert_eq!(state.phase, GamePhase::Exploration);
    assert!(state.pending_prompt.is_none());
}

#[tokio::test]
async fn test_environmental_boost_applies_rolled_value() {
    // Arrange: regular roll leaves the base value unchanged.
    let generator = ScriptedNarrativeGenerator::new()
        .with_event_types(&["Environmental"])
        .with_stat_boosts(&[("attack", 3)]);
    let h = start(catalog(), generator, SequenceRng::new(vec![10])).await;
    h.seed_log(&[EventType::Descriptive]);
    h.ok(ActionType::Continue).await;

    // Act
    let response = h.ok(ActionType::Investigate).await;

    // Assert
    let character = h.repo.character(h.campaign_id).unwrap();
    assert_eq!(character.attack, 8);
    let event = h.repo.events(h.campaign_id).pop().unwrap();
    let data = event.event_data.unwrap();
    assert_eq!(event.event_type, EventType::Environmental);
    assert_eq!(data.dice_roll, Some(10));
    assert_eq!(data.stat_type, Some(StatType::Attack));
    assert_eq!(data.stat_delta, Some(3));
    assert_eq!(response.game_state.unwrap().phase, GamePhase::Exploration);
}

#[tokio::test]
async fn test_fatal_environment_ends_the_campaign() {
    // Arrange: critical failure doubles a setback of 10.
    let generator = ScriptedNarrativeGenerator::new()
        .with_event_types(&["Environmental"])
        .with_stat_boosts(&[("health", -10)]);
    let h = start(catalog(), generator, SequenceRng::new(vec![2])).await;
    h.seed_log(&[EventType::Descriptive]);
    h.ok(ActionType::Continue).await;

    // Act
    let response = h.ok(ActionType::Investigate).await;

    // Assert
    let state = response.game_state.unwrap();
    assert_eq!(state.phase, GamePhase::GameOver);
    assert_eq!(state.character.current_health, 0);
    assert!(response.choices.is_empty());
    assert_eq!(
        h.repo.campaign(h.campaign_id).unwrap().state,
        CampaignState::GameOver
    );
}

#[tokio::test]
async fn test_game_over_rejects_every_action() {
    // Arrange
    let generator = ScriptedNarrativeGenerator::new()
        .with_event_types(&["Environmental"])
        .with_stat_boosts(&[("health", -10)]);
    let h = start(catalog(), generator, SequenceRng::new(vec![2])).await;
    h.seed_log(&[EventType::Descriptive]);
    h.ok(ActionType::Continue).await;
    h.ok(ActionType::Investigate).await;
    let commits = h.repo.commit_count();

    // Act
    let response = h.act(ActionType::Continue).await;

    // Assert
    assert!(!response.success);
    assert!(response.error.unwrap().contains("campaign is over"));
    assert_eq!(response.game_state.unwrap().phase, GamePhase::GameOver);
    assert_eq!(h.repo.commit_count(), commits);
}

#[tokio::test]
async fn test_action_outside_its_phase_is_rejected_without_mutation() {
    // Arrange
    let h = start(catalog(), ScriptedNarrativeGenerator::new(), SequenceRng::new(vec![])).await;

    // Act
    let attack = h.act(ActionType::Attack).await;
    let investigate = h.act(ActionType::Investigate).await;

    // Assert
    assert!(!attack.success);
    assert!(attack.error.unwrap().contains("only valid during combat"));
    assert!(!investigate.success);
    assert!(
        investigate
            .error
            .unwrap()
            .contains("only valid during investigation_prompt")
    );
    assert_eq!(attack.choices, vec![CHOICE_CONTINUE.to_owned()]);
    assert_eq!(h.repo.commit_count(), 0);
    assert!(h.repo.events(h.campaign_id).is_empty());
}

#[tokio::test]
async fn test_full_inventory_leaves_item_behind() {
    // Arrange: roll 12 targets rarity 40.
    let generator = ScriptedNarrativeGenerator::new().with_event_types(&["Item_Drop"]);
    let h = start(catalog(), generator, SequenceRng::new(vec![12])).await;
    h.repo
        .give_items(h.character_id, &fixtures::health_potion(), 10);
    h.seed_log(&[EventType::Descriptive]);
    h.ok(ActionType::Continue).await;

    // Act
    let response = h.ok(ActionType::Investigate).await;

    // Assert
    let found = response.item_found.unwrap();
    assert!(found.left_behind);
    assert_eq!(found.name, "Strength Tonic");
    assert_eq!(h.repo.inventory(h.character_id).len(), 10);
    let event = h.repo.events(h.campaign_id).pop().unwrap();
    assert_eq!(event.event_type, EventType::ItemDrop);
    assert!(event.event_data.unwrap().left_behind);
}

#[tokio::test]
async fn test_consumable_drop_adds_one_row() {
    // Arrange: 0.5 is above the equipment odds.
    let generator = ScriptedNarrativeGenerator::new()
        .with_event_types(&["Item_Drop"])
        .with_item_drops(vec![RawItemDrop {
            stat_type: Some("attack".to_owned()),
            flavor: None,
        }]);
    let rng = SequenceRng::new(vec![12]).with_floats(vec![0.5]);
    let h = start(catalog(), generator, rng).await;
    h.seed_log(&[EventType::Descriptive]);
    h.ok(ActionType::Continue).await;

    // Act
    let response = h.ok(ActionType::Investigate).await;

    // Assert
    let inventory = h.repo.inventory(h.character_id);
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].item.id, fixtures::strength_tonic().id);
    let found = response.item_found.unwrap();
    assert!(!found.left_behind);
    assert!(!found.auto_equipped);
}

#[tokio::test]
async fn test_equipment_drop_auto_equips_armor_and_rescales_health() {
    // Arrange: 0.1 is under the equipment odds; slot index 1 is armor.
    let generator = ScriptedNarrativeGenerator::new().with_event_types(&["Item_Drop"]);
    let rng = SequenceRng::new(vec![12, 1]).with_floats(vec![0.1]);
    let h = start(catalog(), generator, rng).await;
    h.seed_log(&[EventType::Descriptive]);
    h.ok(ActionType::Continue).await;

    // Act
    let response = h.ok(ActionType::Investigate).await;

    // Assert
    let found = response.item_found.unwrap();
    assert!(found.auto_equipped);
    assert_eq!(found.equipment_slot, Some(EquipmentSlot::Armor));
    assert_eq!(found.replaced_item, None);
    let state = response.game_state.unwrap();
    assert_eq!(state.true_max_health, 25);
    assert_eq!(state.character.current_health, 25);
    assert_eq!(state.equipment.armor.unwrap().name, "Leather Armor");
    assert!(h.repo.inventory(h.character_id).is_empty());
    let narrated = h.generator.characters().pop().unwrap();
    assert_eq!(narrated.max_health, 25);
    assert_eq!(narrated.current_health, 25);
}

#[tokio::test]
async fn test_failing_narrator_still_completes_turns() {
    // Arrange: every generator call fails, so the selector falls back.
    let h = start(
        catalog(),
        ScriptedNarrativeGenerator::failing(),
        SequenceRng::new(vec![0]),
    )
    .await;
    h.seed_log(&[EventType::Descriptive]);

    // Act
    let response = h.ok(ActionType::Continue).await;

    // Assert: first acceptable type in declaration order is Descriptive.
    assert!(!response.message.is_empty());
    assert_eq!(h.repo.events(h.campaign_id).len(), 2);
}

#[tokio::test]
async fn test_delete_campaign_discards_everything() {
    // Arrange
    let generator = ScriptedNarrativeGenerator::new().with_event_types(&["Combat"]);
    let h = start(catalog(), generator, SequenceRng::new(vec![])).await;
    h.seed_log(&[EventType::Descriptive]);
    h.ok(ActionType::Continue).await;

    // Act
    h.engine.delete_campaign(h.campaign_id).await.unwrap();

    // Assert
    assert!(h.repo.campaign(h.campaign_id).is_none());
    assert!(h.repo.events(h.campaign_id).is_empty());
    assert!(h.engine.get_game_state(h.campaign_id).await.is_err());
    assert_eq!(h.engine.busy_campaigns(), 0);
}

#[tokio::test]
async fn test_unknown_campaign_lookups_leave_no_lock_behind() {
    // Arrange
    let h = start(catalog(), ScriptedNarrativeGenerator::new(), SequenceRng::new(vec![])).await;

    // Act
    for _ in 0..3 {
        let campaign_id = Uuid::new_v4();
        assert!(h.engine.get_game_state(campaign_id).await.is_err());
        let response = h
            .engine
            .process_player_action(PlayerAction {
                campaign_id,
                action: ActionType::Continue,
            })
            .await;
        assert!(!response.success);
    }

    // Assert
    assert_eq!(h.engine.busy_campaigns(), 0);
}

#[tokio::test]
async fn test_continue_past_event_limit_is_rejected() {
    // Arrange
    let h = start(catalog(), ScriptedNarrativeGenerator::new(), SequenceRng::new(vec![])).await;
    h.seed_mixed_log(50);

    // Act
    let response = h.act(ActionType::Continue).await;

    // Assert
    assert!(!response.success);
    assert!(response.error.unwrap().contains("limit of 50 events"));
    assert_eq!(h.repo.commit_count(), 0);
}

#[tokio::test]
async fn test_concurrent_actions_on_one_campaign_are_serialized() {
    // Arrange
    let generator =
        ScriptedNarrativeGenerator::new().with_event_types(&["Descriptive", "Descriptive"]);
    let h = start(catalog(), generator, SequenceRng::new(vec![])).await;
    h.seed_log(&[EventType::Environmental]);

    // Act
    let (first, second) = tokio::join!(h.act(ActionType::Continue), h.act(ActionType::Continue));

    // Assert
    assert!(first.success);
    assert!(second.success);
    let numbers: Vec<i64> = h
        .repo
        .events(h.campaign_id)
        .iter()
        .map(|event| event.event_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}
