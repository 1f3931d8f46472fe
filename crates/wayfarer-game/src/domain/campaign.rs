//! Campaign and character entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::{CampaignState, EquipmentSlot, StatType};
use wayfarer_narrative::context::CharacterSummary;

use super::catalog::{CharacterClass, Equipment, Item, Race};

/// A campaign: one character's run from introduction to victory or death.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign identifier.
    pub id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Lifecycle state.
    pub state: CampaignState,
    /// Creation time. Never changes.
    pub created_at: DateTime<Utc>,
    /// Last commit time.
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Rejects any action once the campaign has ended.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for `game_over` and `completed`.
    pub fn ensure_playable(&self) -> Result<(), DomainError> {
        match self.state {
            CampaignState::Active => Ok(()),
            CampaignState::GameOver => Err(DomainError::Validation(
                "the character has fallen and this campaign is over; start a new campaign"
                    .to_owned(),
            )),
            CampaignState::Completed => Err(DomainError::Validation(
                "this campaign has been completed; start a new campaign".to_owned(),
            )),
        }
    }
}

/// A campaign's single character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Character identifier.
    pub id: Uuid,
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// Display name.
    pub name: String,
    /// Race reference.
    pub race_id: Uuid,
    /// Race display name.
    pub race_name: String,
    /// Class reference.
    pub class_id: Uuid,
    /// Class display name.
    pub class_name: String,
    /// Current hit points, `0..=max_health + armor bonus`.
    pub current_health: i32,
    /// Base maximum hit points, excluding armor.
    pub max_health: i32,
    /// Attack, including the equipped weapon's bonus.
    pub attack: i32,
    /// Defense, including the equipped shield's bonus.
    pub defense: i32,
    /// Equipped weapon.
    pub weapon_id: Option<Uuid>,
    /// Equipped armor.
    pub armor_id: Option<Uuid>,
    /// Equipped shield.
    pub shield_id: Option<Uuid>,
    /// Sprite shown by the client.
    pub sprite_path: Option<String>,
}

/// Proportionally rescales `current` from one health ceiling to another.
///
/// A living character stays alive (at least 1 HP).
fn rescale_health(current: i32, old_max: i32, new_max: i32) -> i32 {
    let new_max = new_max.max(0);
    if old_max <= 0 {
        return current.clamp(0, new_max);
    }
    let scaled = (i64::from(current) * i64::from(new_max) + i64::from(old_max) / 2)
        / i64::from(old_max);
    let scaled = i32::try_from(scaled).unwrap_or(new_max);
    let scaled = if current > 0 { scaled.max(1) } else { 0 };
    scaled.clamp(0, new_max)
}

impl Character {
    /// Rolls up a fresh character from its race and class.
    #[must_use]
    pub fn create(
        id: Uuid,
        campaign_id: Uuid,
        name: String,
        race: &Race,
        class: &CharacterClass,
        sprite_path: Option<String>,
    ) -> Self {
        let stats = race.stats + class.stats;
        let max_health = stats.vitality.max(1);
        Self {
            id,
            campaign_id,
            name,
            race_id: race.id,
            race_name: race.name.clone(),
            class_id: class.id,
            class_name: class.name.clone(),
            current_health: max_health,
            max_health,
            attack: stats.attack.max(0),
            defense: stats.defense.max(0),
            weapon_id: None,
            armor_id: None,
            shield_id: None,
            sprite_path,
        }
    }

    /// Health ceiling including the equipped armor's bonus.
    #[must_use]
    pub fn true_max_health(&self, armor_bonus: i32) -> i32 {
        self.max_health.saturating_add(armor_bonus).max(0)
    }

    /// Whether the character has fallen.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.current_health <= 0
    }

    /// Sets current health, clamped to `0..=true_max_health`.
    pub fn set_health(&mut self, value: i32, armor_bonus: i32) {
        self.current_health = value.clamp(0, self.true_max_health(armor_bonus));
    }

    /// Applies `delta` to `stat` and returns the change actually applied.
    ///
    /// Health is clamped to `0..=true_max_health`; attack and defense never
    /// drop below 0.
    pub fn apply_stat_delta(&mut self, stat: StatType, delta: i32, armor_bonus: i32) -> i32 {
        let field = match stat {
            StatType::Health => {
                let before = self.current_health;
                self.set_health(before.saturating_add(delta), armor_bonus);
                return self.current_health - before;
            }
            StatType::Attack => &mut self.attack,
            StatType::Defense => &mut self.defense,
        };
        let before = *field;
        *field = before.saturating_add(delta).max(0);
        *field - before
    }

    /// Identifier of the piece equipped in `slot`.
    #[must_use]
    pub fn equipped(&self, slot: EquipmentSlot) -> Option<Uuid> {
        match slot {
            EquipmentSlot::Weapon => self.weapon_id,
            EquipmentSlot::Armor => self.armor_id,
            EquipmentSlot::Shield => self.shield_id,
        }
    }

    /// Equips `new`, replacing `current` (the piece presently in that slot).
    ///
    /// The old bonus is subtracted and the new one added. Armor changes move
    /// the health ceiling, so current health is rescaled to keep its ratio.
    /// Returns the replaced piece's identifier.
    pub fn equip(&mut self, new: &Equipment, current: Option<&Equipment>) -> Option<Uuid> {
        let old_bonus = current.map_or(0, |piece| piece.bonus);
        let replaced = self.equipped(new.slot);
        match new.slot {
            EquipmentSlot::Weapon => {
                self.attack = self
                    .attack
                    .saturating_sub(old_bonus)
                    .saturating_add(new.bonus)
                    .max(0);
                self.weapon_id = Some(new.id);
            }
            EquipmentSlot::Shield => {
                self.defense = self
                    .defense
                    .saturating_sub(old_bonus)
                    .saturating_add(new.bonus)
                    .max(0);
                self.shield_id = Some(new.id);
            }
            EquipmentSlot::Armor => {
                let old_max = self.true_max_health(old_bonus);
                let new_max = self.true_max_health(new.bonus);
                self.current_health = rescale_health(self.current_health, old_max, new_max);
                self.armor_id = Some(new.id);
            }
        }
        replaced
    }

    /// Narrative view of the character.
    #[must_use]
    pub fn summary(&self, armor_bonus: i32) -> CharacterSummary {
        CharacterSummary {
            name: self.name.clone(),
            race: self.race_name.clone(),
            class: self.class_name.clone(),
            current_health: self.current_health,
            max_health: self.true_max_health(armor_bonus),
            attack: self.attack,
            defense: self.defense,
        }
    }
}

/// The character's currently equipped pieces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    /// Equipped weapon.
    pub weapon: Option<Equipment>,
    /// Equipped armor.
    pub armor: Option<Equipment>,
    /// Equipped shield.
    pub shield: Option<Equipment>,
}

impl Loadout {
    /// The piece in `slot`.
    #[must_use]
    pub fn get(&self, slot: EquipmentSlot) -> Option<&Equipment> {
        match slot {
            EquipmentSlot::Weapon => self.weapon.as_ref(),
            EquipmentSlot::Armor => self.armor.as_ref(),
            EquipmentSlot::Shield => self.shield.as_ref(),
        }
    }

    /// Puts `piece` into its slot, returning what was there.
    pub fn set(&mut self, piece: Equipment) -> Option<Equipment> {
        let slot = match piece.slot {
            EquipmentSlot::Weapon => &mut self.weapon,
            EquipmentSlot::Armor => &mut self.armor,
            EquipmentSlot::Shield => &mut self.shield,
        };
        slot.replace(piece)
    }

    /// Bonus of the equipped armor, or 0.
    #[must_use]
    pub fn armor_bonus(&self) -> i32 {
        self.armor.as_ref().map_or(0, |armor| armor.bonus)
    }
}

/// One inventory row. Stacked consumables are separate rows sharing an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Row identifier.
    pub id: Uuid,
    /// The item held.
    pub item: Item,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::BaseStats;

    fn character() -> Character {
        let race = Race {
            id: Uuid::new_v4(),
            name: "Human".to_owned(),
            stats: BaseStats {
                vitality: 15,
                attack: 5,
                defense: 3,
            },
        };
        let class = CharacterClass {
            id: Uuid::new_v4(),
            name: "Warrior".to_owned(),
            stats: BaseStats {
                vitality: 5,
                attack: 5,
                defense: 2,
            },
        };
        Character::create(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Aldric".to_owned(),
            &race,
            &class,
            None,
        )
    }

    fn piece(slot: EquipmentSlot, bonus: i32) -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            name: format!("{slot} +{bonus}"),
            rarity: 10,
            slot,
            bonus,
        }
    }

    #[test]
    fn test_create_sums_race_and_class() {
        let character = character();
        assert_eq!(character.max_health, 20);
        assert_eq!(character.current_health, 20);
        assert_eq!(character.attack, 10);
        assert_eq!(character.defense, 5);
        assert_eq!(character.race_name, "Human");
        assert_eq!(character.class_name, "Warrior");
    }

    #[test]
    fn test_health_delta_clamps_to_true_max() {
        let mut character = character();
        character.current_health = 18;

        let applied = character.apply_stat_delta(StatType::Health, 10, 4);

        assert_eq!(character.current_health, 24);
        assert_eq!(applied, 6);
    }

    #[test]
    fn test_health_delta_never_drops_below_zero() {
        let mut character = character();
        let applied = character.apply_stat_delta(StatType::Health, -50, 0);
        assert_eq!(character.current_health, 0);
        assert_eq!(applied, -20);
        assert!(character.is_defeated());
    }

    #[test]
    fn test_attack_delta_floors_at_zero() {
        let mut character = character();
        character.apply_stat_delta(StatType::Attack, -40, 0);
        assert_eq!(character.attack, 0);
    }

    #[test]
    fn test_equip_weapon_replaces_rather_than_stacks() {
        let mut character = character();
        let sword = piece(EquipmentSlot::Weapon, 4);
        let axe = piece(EquipmentSlot::Weapon, 6);

        assert_eq!(character.equip(&sword, None), None);
        assert_eq!(character.attack, 14);

        let replaced = character.equip(&axe, Some(&sword));
        assert_eq!(replaced, Some(sword.id));
        assert_eq!(character.attack, 16);
        assert_eq!(character.weapon_id, Some(axe.id));
    }

    #[test]
    fn test_equip_armor_rescales_health_ratio() {
        let mut character = character();
        character.current_health = 10;
        let mail = piece(EquipmentSlot::Armor, 20);

        character.equip(&mail, None);

        // 10/20 of the old ceiling becomes 20/40 of the new one.
        assert_eq!(character.current_health, 20);
        assert_eq!(character.max_health, 20);
        assert_eq!(character.true_max_health(mail.bonus), 40);
    }

    #[test]
    fn test_swapping_to_weaker_armor_keeps_health_in_bounds() {
        let mut character = character();
        let plate = piece(EquipmentSlot::Armor, 10);
        let cloth = piece(EquipmentSlot::Armor, 1);
        character.equip(&plate, None);
        character.current_health = 30;

        character.equip(&cloth, Some(&plate));

        assert!(character.current_health <= character.true_max_health(cloth.bonus));
        assert_eq!(character.current_health, 21);
    }

    #[test]
    fn test_loadout_set_returns_previous_piece() {
        let mut loadout = Loadout::default();
        let first = piece(EquipmentSlot::Shield, 2);
        let second = piece(EquipmentSlot::Shield, 3);
        assert!(loadout.set(first.clone()).is_none());
        assert_eq!(loadout.set(second), Some(first));
        assert_eq!(loadout.armor_bonus(), 0);
    }

    #[test]
    fn test_game_over_campaign_rejects_actions() {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            name: "c".to_owned(),
            description: String::new(),
            state: CampaignState::GameOver,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            campaign.ensure_playable(),
            Err(DomainError::Validation(_))
        ));
    }
}
