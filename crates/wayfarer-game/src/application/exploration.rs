//! Exploration turns: continue, investigate, decline.
//!
//! Continue either narrates or parks a non-descriptive event as an
//! investigation prompt; nothing happens to the character until the player
//! investigates. Environmental and item-drop events resolve here, combat
//! events hand over to the encounter in [`super::combat`].

use tracing::{debug, info, warn};
use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::{CampaignState, EquipmentSlot, EventType};
use wayfarer_narrative::context::Scene;
use wayfarer_rules::{dice, formulas};

use super::catalog::{select_enemy, select_equipment, select_item};
use super::engine::{AfterCommit, GameEngine, LoadedTurn, Resolution, with_rng};
use super::prompt_store::InvestigationPrompt;
use super::responses::ItemFound;
use super::selector::{Selection, SelectionHistory, select_event_type};
use crate::domain::campaign::{Character, Loadout};
use crate::domain::catalog::Equipment;
use crate::domain::event::EventData;
use crate::domain::turn::TurnChanges;

/// Equips `piece` on the character and in `loadout`, returning the replaced
/// piece's id.
pub(crate) fn equip_piece(
    loadout: &mut Loadout,
    character: &mut Character,
    piece: &Equipment,
) -> Option<Uuid> {
    let replaced = character.equip(piece, loadout.get(piece.slot));
    loadout.set(piece.clone());
    replaced
}

impl GameEngine {
    pub(crate) async fn continue_forward(
        &self,
        state: &LoadedTurn,
    ) -> Result<Resolution, DomainError> {
        let event_number = state.next_event_number();
        if event_number > self.config.max_event_count {
            return Err(DomainError::Validation(format!(
                "campaign has reached its limit of {} events",
                self.config.max_event_count
            )));
        }

        let mut turn = self.begin_turn(state);
        let context =
            self.narrative_context(state, &state.character, &state.loadout, event_number, None);

        if event_number == 1 {
            let message = self
                .narrator
                .describe(Scene::Introduction, &context, None)
                .await;
            turn.record(
                EventType::Descriptive,
                message.clone(),
                EventData {
                    introduction: true,
                    ..EventData::default()
                },
            );
            info!("campaign introduced");
            return Ok(Resolution::committing(turn, message));
        }

        let history = SelectionHistory {
            next_event_number: event_number,
            recent_types: state.recent.iter().map(|event| event.event_type).collect(),
            descriptive_count: self
                .repo
                .count_events_of_type(state.campaign.id, EventType::Descriptive)
                .await?,
        };
        let selection =
            select_event_type(&self.config, &self.narrator, &context, &history, &self.rng).await?;

        match selection {
            Selection::ForcedBoss => {
                let enemy = select_enemy(
                    self.catalog.as_ref(),
                    self.config.boss_difficulty,
                    self.config.difficulty_variance,
                    &self.rng,
                )
                .await?;
                let boss = self.config.is_boss_tier(enemy.difficulty);
                if !boss {
                    warn!(
                        enemy = %enemy.name,
                        difficulty = enemy.difficulty,
                        "no boss-tier enemy in catalog, forcing closest match"
                    );
                }
                info!(enemy = %enemy.name, "boss encounter forced");
                self.start_encounter(state, turn, enemy, boss, None).await
            }
            Selection::Chosen {
                event_type: EventType::Descriptive,
                ..
            } => {
                let message = self
                    .narrator
                    .describe(Scene::Descriptive, &context, None)
                    .await;
                turn.record(EventType::Descriptive, message.clone(), EventData::default());
                Ok(Resolution::committing(turn, message))
            }
            Selection::Chosen { event_type, source } => {
                let message = self
                    .narrator
                    .describe(Scene::InvestigationHook { event_type }, &context, None)
                    .await;
                debug!(%event_type, ?source, "investigation prompt raised");
                let prompt = InvestigationPrompt {
                    campaign_id: state.campaign.id,
                    event_type,
                    message: message.clone(),
                };
                Ok(Resolution::ephemeral(message).then(AfterCommit::OpenPrompt(prompt)))
            }
        }
    }

    pub(crate) async fn investigate(&self, state: &LoadedTurn) -> Result<Resolution, DomainError> {
        let prompt = self.pending_prompt(state)?;
        let roll = with_rng(&self.rng, dice::roll)?;
        debug!(roll, event_type = %prompt.event_type, "investigation roll");
        let turn = self.begin_turn(state);

        let resolution = match prompt.event_type {
            EventType::Environmental => self.resolve_environmental(state, turn, roll).await?,
            EventType::ItemDrop => self.resolve_item_drop(state, turn, roll).await?,
            EventType::Combat => {
                let event_number = turn.next_event_number();
                let difficulty = with_rng(&self.rng, |rng| {
                    formulas::enemy_difficulty(&self.config, event_number, roll, rng)
                })?;
                let enemy = select_enemy(
                    self.catalog.as_ref(),
                    difficulty,
                    self.config.difficulty_variance,
                    &self.rng,
                )
                .await?;
                debug!(difficulty, enemy = %enemy.name, "enemy chosen");
                let boss = self.config.is_boss_tier(enemy.difficulty);
                self.start_encounter(state, turn, enemy, boss, Some(roll))
                    .await?
            }
            EventType::Descriptive => {
                let mut turn = turn;
                let context = self.narrative_context(
                    state,
                    &state.character,
                    &state.loadout,
                    turn.next_event_number(),
                    None,
                );
                let message = self
                    .narrator
                    .describe(Scene::Descriptive, &context, None)
                    .await;
                turn.record(EventType::Descriptive, message.clone(), EventData::default());
                Resolution::committing(turn, message)
            }
        };
        Ok(resolution.then(AfterCommit::ClearPrompt))
    }

    pub(crate) async fn decline(&self, state: &LoadedTurn) -> Result<Resolution, DomainError> {
        let prompt = self.pending_prompt(state)?;
        let mut turn = self.begin_turn(state);
        let context = self.narrative_context(
            state,
            &state.character,
            &state.loadout,
            turn.next_event_number(),
            None,
        );
        let message = self
            .narrator
            .describe(
                Scene::Declined {
                    event_type: prompt.event_type,
                },
                &context,
                None,
            )
            .await;
        turn.record(
            prompt.event_type,
            message.clone(),
            EventData {
                declined: true,
                ..EventData::default()
            },
        );
        debug!(event_type = %prompt.event_type, "investigation declined");
        Ok(Resolution::committing(turn, message).then(AfterCommit::ClearPrompt))
    }

    /// One of the three equipment slots, evenly.
    pub(crate) fn random_slot(&self) -> Result<EquipmentSlot, DomainError> {
        let last = u32::try_from(EquipmentSlot::ALL.len() - 1).unwrap_or(0);
        let index = with_rng(&self.rng, |rng| rng.next_u32_range(0, last))? as usize;
        Ok(EquipmentSlot::ALL[index.min(EquipmentSlot::ALL.len() - 1)])
    }

    fn pending_prompt(&self, state: &LoadedTurn) -> Result<InvestigationPrompt, DomainError> {
        self.prompts.get(state.campaign.id)?.ok_or_else(|| {
            DomainError::Validation(format!(
                "no pending investigation for campaign {}",
                state.campaign.id
            ))
        })
    }

    async fn resolve_environmental(
        &self,
        state: &LoadedTurn,
        mut turn: TurnChanges,
        roll: u32,
    ) -> Result<Resolution, DomainError> {
        let event_number = turn.next_event_number();
        let context =
            self.narrative_context(state, &state.character, &state.loadout, event_number, None);
        let boost = self
            .narrator
            .propose_stat_boost(&context, EventType::Environmental)
            .await;
        let final_value = self.stat_calculator.final_value(boost.base_value, roll);

        let mut character = state.character.clone();
        let applied =
            character.apply_stat_delta(boost.stat, final_value, state.loadout.armor_bonus());
        debug!(
            stat = %boost.stat,
            base = boost.base_value,
            final_value,
            applied,
            "environmental effect"
        );

        let context =
            self.narrative_context(state, &character, &state.loadout, event_number, None);
        let message = self
            .narrator
            .describe(
                Scene::Environmental {
                    stat: boost.stat,
                    delta: applied,
                },
                &context,
                None,
            )
            .await;
        turn.record(
            EventType::Environmental,
            message.clone(),
            EventData {
                dice_roll: Some(roll),
                stat_type: Some(boost.stat),
                stat_delta: Some(applied),
                ..EventData::default()
            },
        );
        turn.update_character(&character);
        if character.is_defeated() {
            info!("character succumbed to the surroundings");
            turn.set_campaign_state(CampaignState::GameOver);
        }
        Ok(Resolution::committing(turn, message))
    }

    async fn resolve_item_drop(
        &self,
        state: &LoadedTurn,
        mut turn: TurnChanges,
        roll: u32,
    ) -> Result<Resolution, DomainError> {
        let event_number = turn.next_event_number();
        let rarity = formulas::item_rarity(&self.config, event_number, roll);
        let variance = self.config.rarity_variance;
        let context =
            self.narrative_context(state, &state.character, &state.loadout, event_number, None);
        let mut character = state.character.clone();
        let mut loadout = state.loadout.clone();

        let inventory_full = state.inventory.len() >= self.config.inventory_capacity;
        let is_equipment = !inventory_full
            && with_rng(&self.rng, |rng| {
                rng.next_f64() < self.config.equipment_drop_chance
            })?;
        debug!(rarity, inventory_full, is_equipment, "item drop");

        let (found, featured, data) = if is_equipment {
            let slot = self.random_slot()?;
            let piece =
                select_equipment(self.catalog.as_ref(), slot, rarity, variance, &self.rng).await?;
            let replaced = equip_piece(&mut loadout, &mut character, &piece);
            turn.update_character(&character);
            info!(piece = %piece.name, %slot, ?replaced, "equipment auto-equipped");
            (
                ItemFound::equipped(&piece, replaced),
                piece.featured(),
                EventData {
                    equipment_slot: Some(slot),
                    auto_equipped: true,
                    replaced_item: replaced,
                    ..item_data(roll, piece.id, &piece.name, piece.rarity)
                },
            )
        } else {
            let hint = self.narrator.propose_item_drop(&context).await;
            let item = select_item(
                self.catalog.as_ref(),
                rarity,
                variance,
                hint.preferred_stat,
                &self.rng,
            )
            .await?;
            if inventory_full {
                info!(item = %item.name, "inventory full, item left behind");
            } else {
                turn.add_item(&item);
            }
            (
                ItemFound::consumable(&item, inventory_full),
                item.featured(),
                EventData {
                    left_behind: inventory_full,
                    ..item_data(roll, item.id, &item.name, item.rarity)
                },
            )
        };

        let context = self.narrative_context(state, &character, &loadout, event_number, None);
        let message = self
            .narrator
            .describe(
                Scene::ItemDrop {
                    left_behind: found.left_behind,
                },
                &context,
                Some(&featured),
            )
            .await;
        turn.record(EventType::ItemDrop, message.clone(), data);
        Ok(Resolution::committing(turn, message).with_item_found(Some(found)))
    }
}

/// Event data naming a found item.
pub(crate) fn item_data(roll: u32, item_id: Uuid, name: &str, rarity: i32) -> EventData {
    EventData {
        dice_roll: Some(roll),
        item_id: Some(item_id),
        item_name: Some(name.to_owned()),
        item_rarity: Some(rarity),
        ..EventData::default()
    }
}
