//! JSON roster documents.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::{BotBrain, BotRoster, BotSpawn};
use crate::engine::{BotStatMod, EquipmentSlot, ItemTemplate, ObjectGuid};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("invalid roster document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("creature {creature} names unknown owner {owner}")]
    UnknownOwner {
        creature: ObjectGuid,
        owner: ObjectGuid,
    },
    #[error("{context} references unknown item entry {entry}")]
    UnknownTemplate { context: String, entry: u32 },
    #[error("creature {creature} equips into invalid slot {slot}")]
    InvalidSlot { creature: ObjectGuid, slot: u8 },
    #[error("creature {creature} has equipment but no AI")]
    EquipmentWithoutAi { creature: ObjectGuid },
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RosterFixture {
    pub templates: Vec<ItemTemplate>,
    pub players: Vec<PlayerFixture>,
    pub creatures: Vec<CreatureFixture>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlayerFixture {
    pub guid: ObjectGuid,
    pub name: String,
    /// Item entries minted into the backpack on load.
    #[serde(default)]
    pub items: Vec<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreatureFixture {
    pub guid: ObjectGuid,
    #[serde(default)]
    pub entry: u32,
    pub name: String,
    #[serde(default)]
    pub bot: Option<BotFixture>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BotFixture {
    #[serde(default)]
    pub class: u8,
    #[serde(default)]
    pub owner: Option<ObjectGuid>,
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default)]
    pub spec: u8,
    #[serde(default)]
    pub roles: u32,
    #[serde(default)]
    pub stats: BTreeMap<u8, f32>,
    /// Slot index to item entry.
    #[serde(default)]
    pub equipment: BTreeMap<u8, u32>,
    /// `false` spawns a bot without an AI handle.
    #[serde(default = "default_ai")]
    pub ai: bool,
}

fn default_level() -> u8 {
    80
}

fn default_ai() -> bool {
    true
}

impl RosterFixture {
    pub fn from_json(contents: &str) -> Result<Self, RosterError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Builds a roster, checking every cross reference first.
    pub fn build(&self) -> Result<BotRoster, RosterError> {
        self.validate()?;

        let mut roster = BotRoster::new();
        for template in &self.templates {
            roster.register_template(template.clone());
        }
        for player in &self.players {
            roster.spawn_player(player.guid, &player.name);
            for &entry in &player.items {
                roster.give_item(player.guid, entry);
            }
        }
        for creature in &self.creatures {
            let Some(bot) = &creature.bot else {
                roster.spawn_creature(creature.guid, creature.entry, &creature.name);
                continue;
            };
            let brain = bot.ai.then(|| {
                bot.stats.iter().fold(
                    BotBrain::new(bot.level, bot.spec, bot.roles),
                    |brain, (&code, &value)| brain.with_stat(BotStatMod(code), value),
                )
            });
            let spawned = roster.spawn_bot(BotSpawn {
                guid: creature.guid,
                entry: creature.entry,
                name: creature.name.clone(),
                class: bot.class,
                owner: bot.owner,
                brain,
            });
            if !spawned {
                if let Some(owner) = bot.owner {
                    return Err(RosterError::UnknownOwner {
                        creature: creature.guid,
                        owner,
                    });
                }
            }
            for (&slot, &entry) in &bot.equipment {
                if let Some(slot) = EquipmentSlot::new(u32::from(slot)) {
                    roster.preload_equipment(creature.guid, slot, entry);
                }
            }
        }
        Ok(roster)
    }

    fn validate(&self) -> Result<(), RosterError> {
        let known_entry = |entry: u32| self.templates.iter().any(|t| t.entry == entry);
        for player in &self.players {
            if let Some(&entry) = player.items.iter().find(|&&e| !known_entry(e)) {
                return Err(RosterError::UnknownTemplate {
                    context: format!("player {}", player.name),
                    entry,
                });
            }
        }
        for creature in &self.creatures {
            let Some(bot) = &creature.bot else {
                continue;
            };
            if let Some(owner) = bot.owner {
                if !self.players.iter().any(|p| p.guid == owner) {
                    return Err(RosterError::UnknownOwner {
                        creature: creature.guid,
                        owner,
                    });
                }
            }
            if !bot.ai && !bot.equipment.is_empty() {
                return Err(RosterError::EquipmentWithoutAi {
                    creature: creature.guid,
                });
            }
            for (&slot, &entry) in &bot.equipment {
                if EquipmentSlot::new(u32::from(slot)).is_none() {
                    return Err(RosterError::InvalidSlot {
                        creature: creature.guid,
                        slot,
                    });
                }
                if !known_entry(entry) {
                    return Err(RosterError::UnknownTemplate {
                        context: format!("creature {}", creature.name),
                        entry,
                    });
                }
            }
        }
        Ok(())
    }
}

impl BotRoster {
    pub fn from_fixture(fixture: &RosterFixture) -> Result<Self, RosterError> {
        fixture.build()
    }

    pub fn from_json(contents: &str) -> Result<Self, RosterError> {
        Self::from_fixture(&RosterFixture::from_json(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        BotAi, EntityAccessor, ItemTemplateStore, PlayerInventory, BOT_SLOT_CHEST,
    };

    const ROSTER: &str = r#"{
        "templates": [
            { "entry": 1001, "name": "Valorous Chestguard", "item_level": 213, "inventory_type": 5, "required_level": 80 }
        ],
        "players": [
            { "guid": 1, "name": "Jaina", "items": [1001] }
        ],
        "creatures": [
            { "guid": 100, "entry": 70001, "name": "Aldric",
              "bot": { "class": 1, "owner": 1, "roles": 1, "stats": { "4": 1450.0 }, "equipment": { "5": 1001 } } },
            { "guid": 101, "entry": 70002, "name": "Wanderer", "bot": { "class": 8 } },
            { "guid": 200, "entry": 3100, "name": "Kobold Miner" }
        ]
    }"#;

    #[test]
    fn loads_players_bots_and_plain_creatures() {
        let roster = BotRoster::from_json(ROSTER).expect("roster");
        assert!(roster.is_npc_bot(ObjectGuid(100)));
        assert!(roster.is_free_bot(ObjectGuid(101)));
        assert!(!roster.is_npc_bot(ObjectGuid(200)));
        assert_eq!(roster.creature_name(ObjectGuid(200)).as_deref(), Some("Kobold Miner"));
        assert_eq!(roster.bot_class(ObjectGuid(101)), 8);
        assert!(roster.item_template(1001).is_some());

        let jaina = roster.player(ObjectGuid(1)).expect("player");
        assert!(roster.find_item_by_entry(&jaina, 1001).is_some());

        let chest = EquipmentSlot::new(u32::from(BOT_SLOT_CHEST)).expect("slot");
        assert_eq!(
            roster.bot_equipment(ObjectGuid(100), chest).map(|i| i.entry),
            Some(1001)
        );
        let ai = roster.bot_ai(ObjectGuid(100)).expect("ai");
        assert_eq!(ai.total_stat(BotStatMod::STRENGTH), 1450.0);
    }

    #[test]
    fn unknown_owner_is_rejected() {
        let doc = r#"{ "creatures": [ { "guid": 5, "name": "Stray", "bot": { "owner": 9 } } ] }"#;
        let err = BotRoster::from_json(doc).err().expect("error");
        assert!(matches!(err, RosterError::UnknownOwner { .. }));
    }

    #[test]
    fn equipment_must_reference_templates() {
        let doc = r#"{ "creatures": [ { "guid": 5, "name": "Stray", "bot": { "equipment": { "3": 77 } } } ] }"#;
        let err = BotRoster::from_json(doc).err().expect("error");
        assert_eq!(err.to_string(), "creature Stray references unknown item entry 77");
    }

    #[test]
    fn bots_can_be_loaded_without_ai() {
        let doc = r#"{ "creatures": [ { "guid": 5, "name": "Husk", "bot": { "ai": false } } ] }"#;
        let roster = BotRoster::from_json(doc).expect("roster");
        assert!(roster.is_npc_bot(ObjectGuid(5)));
        assert!(roster.bot_ai(ObjectGuid(5)).is_none());
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let err = BotRoster::from_json("{ not json").err().expect("error");
        assert!(matches!(err, RosterError::Json(_)));
    }
}
