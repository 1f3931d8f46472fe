//! Combat turns.
//!
//! An encounter logs one durable event and opens a snapshot. Attacks, flee
//! attempts and item use only touch the snapshot. When the encounter ends
//! the snapshot is reconciled into a single commit (final hit points,
//! consumed items, reward, campaign state) and only then discarded.

use tracing::{debug, info};
use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::{CampaignState, EventType, StatType};
use wayfarer_narrative::context::{CombatEnding, FeaturedItem, Scene};
use wayfarer_rules::{combat, dice, formulas};

use super::catalog::{select_equipment, select_item};
use super::engine::{AfterCommit, GameEngine, LoadedTurn, Resolution, with_rng};
use super::exploration::{equip_piece, item_data};
use super::responses::{CombatResult, ItemFound};
use super::snapshot_store::CombatSnapshot;
use crate::domain::campaign::{Character, Loadout};
use crate::domain::catalog::{Enemy, Item};
use crate::domain::event::{CombatPhaseTag, EventData};
use crate::domain::turn::TurnChanges;

/// Numbers reported for one combat action.
struct Exchange {
    roll: Option<u32>,
    dealt: Option<i32>,
    received: Option<i32>,
}

impl Exchange {
    fn result(&self, snapshot: &CombatSnapshot, outcome: Option<CombatEnding>) -> CombatResult {
        CombatResult {
            dice_roll: self.roll,
            roll_class: self.roll.map(dice::classify),
            damage_dealt: self.dealt,
            damage_received: self.received,
            enemy_hp: snapshot.enemy_current_hp,
            character_hp: snapshot.character_hp,
            outcome,
            flee_refused: false,
            item_used: None,
        }
    }
}

/// How an encounter ends. Only an attack can defeat the enemy, so that
/// ending carries the attack roll the reward is scaled by.
#[derive(Debug, Clone, Copy)]
enum Finish {
    EnemyDefeated { roll: u32 },
    CharacterDefeated,
    Fled,
}

impl Finish {
    fn ending(self) -> CombatEnding {
        match self {
            Self::EnemyDefeated { .. } => CombatEnding::EnemyDefeated,
            Self::CharacterDefeated => CombatEnding::CharacterDefeated,
            Self::Fled => CombatEnding::Fled,
        }
    }
}

/// A reward granted for defeating an ordinary enemy.
struct Reward {
    found: ItemFound,
    featured: FeaturedItem,
    data: EventData,
}

fn encounter_data(enemy: &Enemy, boss: bool) -> EventData {
    EventData {
        enemy_id: Some(enemy.id),
        enemy_name: Some(enemy.name.clone()),
        enemy_difficulty: Some(enemy.difficulty),
        boss,
        ..EventData::default()
    }
}

impl GameEngine {
    /// Logs the encounter and stages the snapshot it opens.
    pub(crate) async fn start_encounter(
        &self,
        state: &LoadedTurn,
        mut turn: TurnChanges,
        enemy: Enemy,
        boss: bool,
        roll: Option<u32>,
    ) -> Result<Resolution, DomainError> {
        let context = self.narrative_context(
            state,
            &state.character,
            &state.loadout,
            turn.next_event_number(),
            Some(enemy.summary(enemy.health)),
        );
        let message = self
            .narrator
            .describe(Scene::CombatEncounter { boss }, &context, None)
            .await;
        let event_number = turn.record(
            EventType::Combat,
            message.clone(),
            EventData {
                dice_roll: roll,
                phase: Some(CombatPhaseTag::Encounter),
                ..encounter_data(&enemy, boss)
            },
        );
        info!(
            enemy = %enemy.name,
            difficulty = enemy.difficulty,
            boss,
            "combat encounter"
        );

        let snapshot = CombatSnapshot::open(
            enemy,
            boss,
            &state.character,
            state.loadout.armor_bonus(),
            state.inventory.clone(),
            event_number,
        );
        Ok(Resolution::committing(turn, message).then(AfterCommit::OpenCombat(Box::new(snapshot))))
    }

    fn active_snapshot(&self, campaign_id: Uuid) -> Result<CombatSnapshot, DomainError> {
        self.snapshots.get(campaign_id)?.ok_or_else(|| {
            DomainError::Validation(format!("no active combat for campaign {campaign_id}"))
        })
    }

    /// Writes a mid-combat exchange into the snapshot store.
    fn store_exchange(&self, snapshot: &CombatSnapshot, line: String) -> Result<(), DomainError> {
        self.snapshots
            .update_enemy_hp(snapshot.campaign_id, snapshot.enemy_current_hp)?;
        self.snapshots
            .update_character_hp(snapshot.campaign_id, snapshot.character_hp)?;
        self.snapshots.append_combat_log(snapshot.campaign_id, line)
    }

    pub(crate) async fn attack(&self, state: &LoadedTurn) -> Result<Resolution, DomainError> {
        let mut snapshot = self.active_snapshot(state.campaign.id)?;
        let roll = with_rng(&self.rng, dice::roll)?;
        let exchange = combat::exchange(
            snapshot.effective_attack(),
            snapshot.effective_defense(),
            snapshot.enemy.attack,
            snapshot.enemy.defense,
            roll,
        );

        snapshot.enemy_current_hp = snapshot
            .enemy_current_hp
            .saturating_sub(exchange.dealt)
            .max(0);
        let received = if snapshot.enemy_defeated() {
            0
        } else {
            exchange.received
        };
        snapshot.character_hp = snapshot
            .character_hp
            .saturating_sub(received)
            .clamp(0, snapshot.true_max_health());
        debug!(
            roll,
            dealt = exchange.dealt,
            received,
            enemy_hp = snapshot.enemy_current_hp,
            character_hp = snapshot.character_hp,
            "attack exchange"
        );

        let mut line = format!(
            "{} strikes {} for {} damage.",
            state.character.name, snapshot.enemy.name, exchange.dealt
        );
        if received > 0 {
            line.push_str(&format!(
                " {} hits back for {received}.",
                snapshot.enemy.name
            ));
        }
        let numbers = Exchange {
            roll: Some(roll),
            dealt: Some(exchange.dealt),
            received: Some(received),
        };

        if snapshot.enemy_defeated() {
            return self
                .conclude_combat(state, snapshot, Finish::EnemyDefeated { roll }, numbers, line)
                .await;
        }
        if snapshot.character_defeated() {
            return self
                .conclude_combat(state, snapshot, Finish::CharacterDefeated, numbers, line)
                .await;
        }
        self.store_exchange(&snapshot, line.clone())?;
        Ok(Resolution::ephemeral(line).with_combat_result(numbers.result(&snapshot, None)))
    }

    pub(crate) async fn flee(&self, state: &LoadedTurn) -> Result<Resolution, DomainError> {
        let mut snapshot = self.active_snapshot(state.campaign.id)?;
        // Rolled even when a boss refuses the attempt.
        let roll = with_rng(&self.rng, dice::roll)?;

        if snapshot.boss {
            let line = format!(
                "{} blocks every path of escape. There is no fleeing this fight.",
                snapshot.enemy.name
            );
            debug!(roll, "flee refused by boss");
            self.snapshots
                .append_combat_log(snapshot.campaign_id, line.clone())?;
            let mut result = Exchange {
                roll: Some(roll),
                dealt: None,
                received: None,
            }
            .result(&snapshot, None);
            result.flee_refused = true;
            return Ok(Resolution::ephemeral(line).with_combat_result(result));
        }

        if combat::flee_succeeds(&self.config, roll) {
            debug!(roll, "flee succeeded");
            let line = format!(
                "{} slips away from {}.",
                state.character.name, snapshot.enemy.name
            );
            let numbers = Exchange {
                roll: Some(roll),
                dealt: None,
                received: None,
            };
            return self
                .conclude_combat(state, snapshot, Finish::Fled, numbers, line)
                .await;
        }

        let received = combat::damage_received(
            snapshot.enemy.attack,
            snapshot.effective_defense(),
            roll,
        );
        snapshot.character_hp = snapshot
            .character_hp
            .saturating_sub(received)
            .clamp(0, snapshot.true_max_health());
        debug!(roll, received, "flee failed");
        let line = format!(
            "{} fails to escape and {} strikes for {received}.",
            state.character.name, snapshot.enemy.name
        );
        let numbers = Exchange {
            roll: Some(roll),
            dealt: None,
            received: Some(received),
        };

        if snapshot.character_defeated() {
            return self
                .conclude_combat(state, snapshot, Finish::CharacterDefeated, numbers, line)
                .await;
        }
        self.store_exchange(&snapshot, line.clone())?;
        Ok(Resolution::ephemeral(line).with_combat_result(numbers.result(&snapshot, None)))
    }

    pub(crate) async fn use_item(
        &self,
        state: &LoadedTurn,
        item_id: Uuid,
    ) -> Result<Resolution, DomainError> {
        let mut snapshot = self.active_snapshot(state.campaign.id)?;
        let item = snapshot.take_item(item_id)?.item;

        let line = match item.stat {
            StatType::Health => {
                snapshot.shift_character_hp(item.value);
                if item.value >= 0 {
                    format!(
                        "{} drinks {} and recovers {} health.",
                        state.character.name, item.name, item.value
                    )
                } else {
                    format!(
                        "{} drinks {} and it burns, costing {} health.",
                        state.character.name,
                        item.name,
                        item.value.unsigned_abs()
                    )
                }
            }
            stat => {
                snapshot.add_buff(stat, item.value)?;
                format!(
                    "{} uses {}. Their {stat} shifts by {} for this fight.",
                    state.character.name, item.name, item.value
                )
            }
        };
        debug!(item = %item.name, stat = %item.stat, value = item.value, "item used in combat");

        let numbers = Exchange {
            roll: None,
            dealt: None,
            received: None,
        };
        if snapshot.character_defeated() {
            let mut resolution = self
                .conclude_combat(state, snapshot, Finish::CharacterDefeated, numbers, line)
                .await?;
            if let Some(result) = resolution.combat_result.as_mut() {
                result.item_used = Some(item);
            }
            return Ok(resolution);
        }

        self.store_item_use(&snapshot, &item, line.clone())?;
        let mut result = numbers.result(&snapshot, None);
        result.item_used = Some(item);
        Ok(Resolution::ephemeral(line).with_combat_result(result))
    }

    /// Writes a mid-combat item use into the snapshot store.
    fn store_item_use(
        &self,
        snapshot: &CombatSnapshot,
        item: &Item,
        line: String,
    ) -> Result<(), DomainError> {
        let campaign_id = snapshot.campaign_id;
        self.snapshots.remove_item(campaign_id, item.id)?;
        match item.stat {
            StatType::Health => self
                .snapshots
                .update_character_hp(campaign_id, snapshot.character_hp)?,
            stat => self
                .snapshots
                .apply_temporary_buff(campaign_id, stat, item.value)?,
        }
        self.snapshots.append_combat_log(campaign_id, line)
    }

    /// Ends the encounter from a final copy of the snapshot.
    ///
    /// Everything durable goes into one turn; the stored snapshot is only
    /// cleared after that turn commits.
    async fn conclude_combat(
        &self,
        state: &LoadedTurn,
        snapshot: CombatSnapshot,
        finish: Finish,
        numbers: Exchange,
        line: String,
    ) -> Result<Resolution, DomainError> {
        let ending = finish.ending();
        let mut turn = self.begin_turn(state);
        let mut character = state.character.clone();
        let mut loadout = state.loadout.clone();
        let reconciliation = snapshot.reconcile();
        character.set_health(reconciliation.character_hp, state.loadout.armor_bonus());
        for item_id in &reconciliation.consumed_items {
            turn.remove_item(*item_id);
        }
        debug!(
            character_hp = reconciliation.character_hp,
            consumed = reconciliation.consumed_items.len(),
            "combat reconciled"
        );

        let mut reward = None;
        match finish {
            Finish::EnemyDefeated { .. } if snapshot.boss => {
                info!(enemy = %snapshot.enemy.name, "boss defeated, campaign completed");
                turn.set_campaign_state(CampaignState::Completed);
            }
            Finish::EnemyDefeated { roll } => {
                reward = Some(
                    self.combat_reward(&snapshot, &mut character, &mut loadout, &mut turn, roll)
                        .await?,
                );
            }
            Finish::CharacterDefeated => {
                info!(enemy = %snapshot.enemy.name, "character defeated, game over");
                turn.set_campaign_state(CampaignState::GameOver);
            }
            Finish::Fled => info!(enemy = %snapshot.enemy.name, "fled from combat"),
        }
        turn.update_character(&character);

        let context = self.narrative_context(
            state,
            &character,
            &loadout,
            turn.next_event_number(),
            Some(snapshot.enemy.summary(snapshot.enemy_current_hp)),
        );
        let narration = self
            .narrator
            .describe(
                Scene::CombatConclusion { ending },
                &context,
                reward.as_ref().map(|reward| &reward.featured),
            )
            .await;
        let message = format!("{line}\n\n{narration}");

        let mut data = reward
            .as_ref()
            .map_or_else(EventData::default, |reward| reward.data.clone());
        data.dice_roll = numbers.roll;
        data.phase = Some(CombatPhaseTag::Conclusion);
        data.outcome = Some(ending);
        data.enemy_id = Some(snapshot.enemy.id);
        data.enemy_name = Some(snapshot.enemy.name.clone());
        data.enemy_difficulty = Some(snapshot.enemy.difficulty);
        data.boss = snapshot.boss;
        turn.record(EventType::Combat, message.clone(), data);

        let result = numbers.result(&snapshot, Some(ending));
        Ok(Resolution::committing(turn, message)
            .then(AfterCommit::CloseCombat)
            .with_combat_result(result)
            .with_item_found(reward.map(|reward| reward.found)))
    }

    /// Loot for defeating an ordinary enemy: usually equipment, otherwise a
    /// consumable that still respects inventory capacity.
    async fn combat_reward(
        &self,
        snapshot: &CombatSnapshot,
        character: &mut Character,
        loadout: &mut Loadout,
        turn: &mut TurnChanges,
        roll: u32,
    ) -> Result<Reward, DomainError> {
        let rarity = formulas::combat_reward_rarity(&self.config, snapshot.enemy.difficulty, roll);
        let variance = self.config.rarity_variance;
        let is_equipment = with_rng(&self.rng, |rng| {
            rng.next_f64() < self.config.reward_equipment_chance
        })?;
        debug!(rarity, is_equipment, "combat reward");

        if is_equipment {
            let slot = self.random_slot()?;
            let piece =
                select_equipment(self.catalog.as_ref(), slot, rarity, variance, &self.rng).await?;
            let replaced = equip_piece(loadout, character, &piece);
            info!(piece = %piece.name, %slot, ?replaced, "reward equipped");
            return Ok(Reward {
                found: ItemFound::equipped(&piece, replaced),
                featured: piece.featured(),
                data: EventData {
                    equipment_slot: Some(slot),
                    auto_equipped: true,
                    replaced_item: replaced,
                    ..item_data(roll, piece.id, &piece.name, piece.rarity)
                },
            });
        }

        let item = select_item(self.catalog.as_ref(), rarity, variance, None, &self.rng).await?;
        // Durable inventory after reconciliation matches the in-combat copy.
        let left_behind = snapshot.inventory.len() >= self.config.inventory_capacity;
        if left_behind {
            info!(item = %item.name, "inventory full, reward left behind");
        } else {
            turn.add_item(&item);
        }
        Ok(Reward {
            found: ItemFound::consumable(&item, left_behind),
            featured: item.featured(),
            data: EventData {
                left_behind,
                ..item_data(roll, item.id, &item.name, item.rarity)
            },
        })
    }
}
