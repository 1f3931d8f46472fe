//! Shared harness for engine scenario tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use uuid::Uuid;
use wayfarer_core::vocabulary::EventType;
use wayfarer_game::application::engine::{CreateCampaign, GameEngine, SharedRng};
use wayfarer_game::application::responses::{GameServiceResponse, GameState};
use wayfarer_game::domain::action::{ActionType, PlayerAction};
use wayfarer_game::domain::event::{EventData, GameEvent};
use wayfarer_narrative::narrator::{Narrator, NarratorSettings};
use wayfarer_rules::config::BalanceConfig;
use wayfarer_test_support::{
    FixedClock, InMemoryGameRepository, ScriptedNarrativeGenerator, SequenceRng, fixtures,
};

pub struct Harness {
    pub engine: GameEngine,
    pub repo: Arc<InMemoryGameRepository>,
    pub generator: Arc<ScriptedNarrativeGenerator>,
    pub campaign_id: Uuid,
    pub character_id: Uuid,
}

/// Catalog with the standard fixtures.
pub fn catalog() -> InMemoryGameRepository {
    InMemoryGameRepository::new()
        .with_race(fixtures::human())
        .with_class(fixtures::fighter())
        .with_items([
            fixtures::health_potion(),
            fixtures::strength_tonic(),
            fixtures::bitter_draught(),
        ])
        .with_equipment(fixtures::starter_equipment())
        .with_enemies([fixtures::wolf(), fixtures::lich_king()])
}

/// Builds an engine over `repo` and creates a campaign for a human fighter
/// (20 health, 5 attack, 5 defense).
pub async fn start(
    repo: InMemoryGameRepository,
    generator: ScriptedNarrativeGenerator,
    rng: SequenceRng,
) -> Harness {
    let repo = Arc::new(repo);
    let generator = Arc::new(generator);
    let rng: SharedRng = Arc::new(Mutex::new(rng));
    let balance = BalanceConfig::default();
    let settings = NarratorSettings::from_balance(&balance, NarratorSettings::DEFAULT_TIMEOUT);
    let engine = GameEngine::new(
        repo.clone(),
        repo.clone(),
        Narrator::new(generator.clone(), settings),
        balance,
        Arc::new(FixedClock::epoch()),
        rng,
    );

    let state = engine
        .create_campaign(CreateCampaign {
            account_id: Uuid::new_v4(),
            name: "Ashen Road".to_owned(),
            description: "A test campaign".to_owned(),
            character_name: "Mira".to_owned(),
            race_id: fixtures::human().id,
            class_id: fixtures::fighter().id,
            sprite_path: None,
        })
        .await
        .unwrap();

    Harness {
        engine,
        repo,
        generator,
        campaign_id: state.campaign.id,
        character_id: state.character.id,
    }
}

impl Harness {
    pub async fn act(&self, action: ActionType) -> GameServiceResponse {
        self.engine
            .process_player_action(PlayerAction {
                campaign_id: self.campaign_id,
                action,
            })
            .await
    }

    /// Acts and asserts success.
    pub async fn ok(&self, action: ActionType) -> GameServiceResponse {
        let response = self.act(action).await;
        assert!(
            response.success,
            "{} failed: {:?}",
            action.as_str(),
            response.error
        );
        response
    }

    pub async fn state(&self) -> GameState {
        self.engine.get_game_state(self.campaign_id).await.unwrap()
    }

    /// Logs events `1..=types.len()` directly.
    pub fn seed_log(&self, types: &[EventType]) {
        let events = types.iter().zip(1_i64..).map(|(event_type, event_number)| GameEvent {
            id: Uuid::new_v4(),
            campaign_id: self.campaign_id,
            message: format!("seeded #{event_number}"),
            event_number,
            event_type: *event_type,
            event_data: Some(EventData::default()),
            created_at: FixedClock::epoch().0,
        });
        self.repo.seed_events(events);
    }

    /// Logs `count` events cycling through every category without tripping
    /// the repeat rule.
    pub fn seed_mixed_log(&self, count: usize) {
        let cycle = [
            EventType::Descriptive,
            EventType::Environmental,
            EventType::ItemDrop,
            EventType::Combat,
        ];
        let types: Vec<EventType> = cycle.iter().copied().cycle().take(count).collect();
        self.seed_log(&types);
    }
}
