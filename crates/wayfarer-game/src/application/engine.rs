//! The game orchestrator.
//!
//! One player action becomes one turn: take the campaign lock, load durable
//! state, validate the action against the derived phase, resolve it into a
//! [`Resolution`], commit the buffered writes, then apply the ephemeral
//! store changes that depend on the commit having succeeded.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use wayfarer_core::clock::Clock;
use wayfarer_core::error::DomainError;
use wayfarer_core::rng::DeterministicRng;
use wayfarer_core::vocabulary::CampaignState;
use wayfarer_narrative::context::{EnemySummary, NarrativeContext};
use wayfarer_narrative::narrator::Narrator;
use wayfarer_rules::config::BalanceConfig;
use wayfarer_rules::stats::{RollScaledStatCalculator, StatCalculator};

use super::locks::CampaignLocks;
use super::prompt_store::{InvestigationPrompt, InvestigationPromptStore};
use super::responses::{
    CombatResult, EnemyState, GameServiceResponse, GameState, ItemFound, TurnOutcome,
};
use super::snapshot_store::{CombatSnapshot, CombatSnapshotStore};
use super::streak::DescriptiveStreaks;
use crate::domain::action::{ActionType, GamePhase, PlayerAction};
use crate::domain::campaign::{Campaign, Character, InventoryEntry, Loadout};
use crate::domain::event::GameEvent;
use crate::domain::repository::{CatalogRepository, GameRepository};
use crate::domain::turn::TurnChanges;

/// RNG shared by every turn of the process.
pub type SharedRng = Arc<Mutex<dyn DeterministicRng + Send>>;

/// Runs `f` with the RNG locked. The guard never outlives the closure, so it
/// is never held across an await point.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the RNG mutex is poisoned.
pub(crate) fn with_rng<R>(
    rng: &Mutex<dyn DeterministicRng + Send>,
    f: impl FnOnce(&mut dyn DeterministicRng) -> R,
) -> Result<R, DomainError> {
    let mut guard = rng
        .lock()
        .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
    Ok(f(&mut *guard))
}

/// Phase implied by the campaign row and the ephemeral stores.
///
/// A terminal campaign state wins over any leftover scratch state.
#[must_use]
pub fn derive_phase(state: CampaignState, in_combat: bool, prompt_pending: bool) -> GamePhase {
    match state {
        CampaignState::GameOver => GamePhase::GameOver,
        CampaignState::Completed => GamePhase::Victory,
        CampaignState::Active if in_combat => GamePhase::Combat,
        CampaignState::Active if prompt_pending => GamePhase::InvestigationPrompt,
        CampaignState::Active => GamePhase::Exploration,
    }
}

/// Request to start a new campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCampaign {
    /// Owning account.
    pub account_id: Uuid,
    /// Campaign title.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Name of the character.
    pub character_name: String,
    /// Catalog race.
    pub race_id: Uuid,
    /// Catalog class.
    pub class_id: Uuid,
    /// Portrait shown by the client.
    #[serde(default)]
    pub sprite_path: Option<String>,
}

/// Durable state read at the start of a turn.
#[derive(Debug, Clone)]
pub(crate) struct LoadedTurn {
    pub campaign: Campaign,
    pub character: Character,
    pub loadout: Loadout,
    pub inventory: Vec<InventoryEntry>,
    /// Newest first.
    pub recent: Vec<GameEvent>,
}

impl LoadedTurn {
    pub fn last_event_number(&self) -> i64 {
        self.recent.first().map_or(0, |event| event.event_number)
    }

    pub fn next_event_number(&self) -> i64 {
        self.last_event_number() + 1
    }
}

/// Ephemeral store changes applied once the turn's writes are durable.
#[derive(Debug, Clone)]
pub(crate) enum AfterCommit {
    OpenCombat(Box<CombatSnapshot>),
    CloseCombat,
    OpenPrompt(InvestigationPrompt),
    ClearPrompt,
}

/// A resolved action, not yet committed.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub turn: Option<TurnChanges>,
    pub after_commit: Vec<AfterCommit>,
    pub message: String,
    pub combat_result: Option<CombatResult>,
    pub item_found: Option<ItemFound>,
}

impl Resolution {
    /// A turn with durable writes.
    pub fn committing(turn: TurnChanges, message: String) -> Self {
        Self {
            turn: Some(turn),
            after_commit: Vec::new(),
            message,
            combat_result: None,
            item_found: None,
        }
    }

    /// A turn that only touched ephemeral state.
    pub fn ephemeral(message: String) -> Self {
        Self {
            turn: None,
            after_commit: Vec::new(),
            message,
            combat_result: None,
            item_found: None,
        }
    }

    #[must_use]
    pub fn then(mut self, effect: AfterCommit) -> Self {
        self.after_commit.push(effect);
        self
    }

    #[must_use]
    pub fn with_combat_result(mut self, result: CombatResult) -> Self {
        self.combat_result = Some(result);
        self
    }

    #[must_use]
    pub fn with_item_found(mut self, item_found: Option<ItemFound>) -> Self {
        self.item_found = item_found;
        self
    }
}

/// Turn-based orchestrator for exploration and combat.
pub struct GameEngine {
    pub(crate) repo: Arc<dyn GameRepository>,
    pub(crate) catalog: Arc<dyn CatalogRepository>,
    pub(crate) narrator: Narrator,
    pub(crate) config: BalanceConfig,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) rng: SharedRng,
    pub(crate) stat_calculator: Arc<dyn StatCalculator>,
    pub(crate) locks: CampaignLocks,
    pub(crate) snapshots: CombatSnapshotStore,
    pub(crate) prompts: InvestigationPromptStore,
    pub(crate) streaks: DescriptiveStreaks,
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("narrator", &self.narrator)
            .field("config", &self.config)
            .field("stat_calculator", &self.stat_calculator)
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Creates an engine with empty ephemeral stores and the default stat rule.
    #[must_use]
    pub fn new(
        repo: Arc<dyn GameRepository>,
        catalog: Arc<dyn CatalogRepository>,
        narrator: Narrator,
        config: BalanceConfig,
        clock: Arc<dyn Clock + Send + Sync>,
        rng: SharedRng,
    ) -> Self {
        Self {
            repo,
            catalog,
            narrator,
            config,
            clock,
            rng,
            stat_calculator: Arc::new(RollScaledStatCalculator),
            locks: CampaignLocks::new(),
            snapshots: CombatSnapshotStore::new(),
            prompts: InvestigationPromptStore::new(),
            streaks: DescriptiveStreaks::new(),
        }
    }

    /// Replaces the environmental stat rule.
    #[must_use]
    pub fn with_stat_calculator(mut self, stat_calculator: Arc<dyn StatCalculator>) -> Self {
        self.stat_calculator = stat_calculator;
        self
    }

    /// The active balance block.
    #[must_use]
    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    /// Number of campaigns with a turn in flight or queued.
    #[must_use]
    pub fn busy_campaigns(&self) -> usize {
        self.locks.len()
    }

    /// Applies one player action. Failures are reported in the response,
    /// never returned.
    #[instrument(
        skip(self),
        fields(campaign_id = %action.campaign_id, action = action.action.as_str())
    )]
    pub async fn process_player_action(&self, action: PlayerAction) -> GameServiceResponse {
        match self.execute_action(action).await {
            Ok(outcome) => {
                info!(phase = %outcome.game_state.phase, "action applied");
                GameServiceResponse::success(outcome)
            }
            Err(error) => {
                warn!(%error, "action rejected");
                let state = self.get_game_state(action.campaign_id).await.ok();
                GameServiceResponse::failure(&error, state)
            }
        }
    }

    /// Applies one player action.
    ///
    /// Nothing is mutated unless the action validates against the current
    /// phase, and durable writes happen in a single commit.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for terminal campaigns, actions
    /// outside their phase or missing pending state, `DomainError::NotFound`
    /// for unknown campaigns or items, and repository errors from the commit.
    pub async fn execute_action(&self, action: PlayerAction) -> Result<TurnOutcome, DomainError> {
        let campaign_id = action.campaign_id;
        let _guard = self.locks.acquire(campaign_id).await?;

        let state = self.load_turn(campaign_id).await?;
        state.campaign.ensure_playable()?;
        let phase = self.phase_of(campaign_id, state.campaign.state)?;
        action.action.validate(phase)?;
        self.streaks.current(campaign_id, &state.recent)?;
        debug!(%phase, next_event_number = state.next_event_number(), "turn loaded");

        let resolution = match action.action {
            ActionType::Continue => self.continue_forward(&state).await?,
            ActionType::Investigate => self.investigate(&state).await?,
            ActionType::Decline => self.decline(&state).await?,
            ActionType::Attack => self.attack(&state).await?,
            ActionType::Flee => self.flee(&state).await?,
            ActionType::UseItemCombat { item_id } => self.use_item(&state, item_id).await?,
        };

        self.apply(campaign_id, resolution).await
    }

    async fn apply(
        &self,
        campaign_id: Uuid,
        resolution: Resolution,
    ) -> Result<TurnOutcome, DomainError> {
        if let Some(turn) = resolution.turn.as_ref().filter(|turn| !turn.is_empty()) {
            self.repo.commit_turn(turn).await?;
            info!(
                events = turn.events.len(),
                campaign_state = ?turn.campaign_state,
                "turn committed"
            );
            self.streaks
                .record(campaign_id, turn.events.iter().map(|event| event.event_type))?;
        }

        for effect in resolution.after_commit {
            match effect {
                AfterCommit::OpenCombat(snapshot) => self.snapshots.create(*snapshot)?,
                AfterCommit::CloseCombat => {
                    self.snapshots.clear(campaign_id)?;
                }
                AfterCommit::OpenPrompt(prompt) => {
                    self.streaks.record(campaign_id, [prompt.event_type])?;
                    self.prompts.create(prompt)?;
                }
                AfterCommit::ClearPrompt => {
                    self.prompts.clear(campaign_id)?;
                }
            }
        }

        let game_state = self.load_game_state(campaign_id).await?;
        Ok(TurnOutcome {
            message: resolution.message,
            game_state,
            combat_result: resolution.combat_result,
            item_found: resolution.item_found,
        })
    }

    /// Creates a campaign and its character, returning the opening state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for blank names,
    /// `DomainError::NotFound` for unknown race or class ids, and repository
    /// errors from the insert.
    #[instrument(skip(self, request), fields(account_id = %request.account_id))]
    pub async fn create_campaign(&self, request: CreateCampaign) -> Result<GameState, DomainError> {
        let name = request.name.trim();
        let character_name = request.character_name.trim();
        if name.is_empty() || character_name.is_empty() {
            return Err(DomainError::Validation(
                "campaign and character names must not be blank".to_owned(),
            ));
        }

        let race = self.catalog.load_race(request.race_id).await?;
        let class = self.catalog.load_class(request.class_id).await?;

        let now = self.clock.now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            account_id: request.account_id,
            name: name.to_owned(),
            description: request.description,
            state: CampaignState::Active,
            created_at: now,
            updated_at: now,
        };
        let character = Character::create(
            Uuid::new_v4(),
            campaign.id,
            character_name.to_owned(),
            &race,
            &class,
            request.sprite_path,
        );

        self.repo.create_campaign(&campaign, &character).await?;
        info!(
            campaign_id = %campaign.id,
            race = %race.name,
            class = %class.name,
            max_health = character.max_health,
            "campaign created"
        );
        self.load_game_state(campaign.id).await
    }

    /// The full view of a campaign.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the campaign does not exist.
    pub async fn get_game_state(&self, campaign_id: Uuid) -> Result<GameState, DomainError> {
        let _guard = self.locks.acquire(campaign_id).await?;
        self.load_game_state(campaign_id).await
    }

    /// Deletes a campaign with everything it owns, durable and ephemeral.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the campaign does not exist.
    #[instrument(skip(self))]
    pub async fn delete_campaign(&self, campaign_id: Uuid) -> Result<(), DomainError> {
        let _guard = self.locks.acquire(campaign_id).await?;
        self.repo.delete_campaign(campaign_id).await?;
        self.snapshots.clear(campaign_id)?;
        self.prompts.clear(campaign_id)?;
        self.streaks.forget(campaign_id)?;
        info!("campaign deleted");
        Ok(())
    }

    pub(crate) async fn load_turn(&self, campaign_id: Uuid) -> Result<LoadedTurn, DomainError> {
        let campaign = self.repo.load_campaign(campaign_id).await?;
        let character = self.repo.load_character(campaign_id).await?;
        let loadout = self.repo.load_loadout(&character).await?;
        let inventory = self.repo.load_inventory(character.id).await?;
        let window = i64::try_from(self.config.repeat_window).unwrap_or(i64::MAX);
        let recent = self
            .repo
            .recent_events(campaign_id, self.config.recent_event_limit.max(window))
            .await?;
        Ok(LoadedTurn {
            campaign,
            character,
            loadout,
            inventory,
            recent,
        })
    }

    fn phase_of(&self, campaign_id: Uuid, state: CampaignState) -> Result<GamePhase, DomainError> {
        Ok(derive_phase(
            state,
            self.snapshots.contains(campaign_id)?,
            self.prompts.get(campaign_id)?.is_some(),
        ))
    }

    async fn load_game_state(&self, campaign_id: Uuid) -> Result<GameState, DomainError> {
        let turn = self.load_turn(campaign_id).await?;
        let snapshot = self.snapshots.get(campaign_id)?;
        let pending_prompt = self.prompts.get(campaign_id)?;
        let phase = derive_phase(
            turn.campaign.state,
            snapshot.is_some(),
            pending_prompt.is_some(),
        );
        let descriptive_streak = self.streaks.current(campaign_id, &turn.recent)?;
        let event_count = turn.last_event_number();

        let LoadedTurn {
            campaign,
            mut character,
            loadout,
            mut inventory,
            mut recent,
        } = turn;
        let true_max_health = character.true_max_health(loadout.armor_bonus());

        let enemy = match snapshot {
            Some(snapshot) if phase == GamePhase::Combat => {
                character.current_health = snapshot.character_hp;
                inventory = snapshot.inventory;
                Some(EnemyState {
                    enemy: snapshot.enemy,
                    current_hp: snapshot.enemy_current_hp,
                    boss: snapshot.boss,
                    attack_buff: snapshot.attack_buff,
                    defense_buff: snapshot.defense_buff,
                    combat_log: snapshot.combat_log,
                })
            }
            _ => None,
        };
        recent.truncate(usize::try_from(self.config.recent_event_limit).unwrap_or(usize::MAX));

        Ok(GameState {
            campaign,
            character,
            true_max_health,
            equipment: loadout,
            inventory,
            enemy,
            recent_events: recent,
            phase,
            pending_prompt: if phase == GamePhase::InvestigationPrompt {
                pending_prompt
            } else {
                None
            },
            descriptive_streak,
            event_count,
            max_event_count: self.config.max_event_count,
        })
    }

    /// Empty write buffer on top of the loaded log.
    pub(crate) fn begin_turn(&self, state: &LoadedTurn) -> TurnChanges {
        TurnChanges::new(
            state.campaign.id,
            state.character.id,
            state.last_event_number(),
            self.clock.as_ref(),
        )
    }

    /// Narrative context for a turn about to log `event_number`.
    pub(crate) fn narrative_context(
        &self,
        state: &LoadedTurn,
        character: &Character,
        loadout: &Loadout,
        event_number: i64,
        enemy: Option<EnemySummary>,
    ) -> NarrativeContext {
        let limit = usize::try_from(self.config.recent_event_limit).unwrap_or(usize::MAX);
        NarrativeContext {
            campaign_name: state.campaign.name.clone(),
            event_number,
            character: character.summary(loadout.armor_bonus()),
            recent_events: state
                .recent
                .iter()
                .take(limit)
                .map(GameEvent::summary)
                .collect(),
            enemy,
        }
    }
}
