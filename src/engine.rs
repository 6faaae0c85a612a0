//! Collaborator interfaces of the game engine and the bot AI module.
//!
//! The bridge never owns engine state. Everything it touches is reached through
//! the traits below for the duration of a single dispatched call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Last valid equipment slot index (inclusive).
pub const EQUIPMENT_SLOT_END: u32 = 19;

/// Number of equipment slots a bot actually carries.
pub const BOT_INVENTORY_SIZE: u8 = 18;

pub const BOT_SLOT_MAINHAND: u8 = 0;
pub const BOT_SLOT_OFFHAND: u8 = 1;
pub const BOT_SLOT_RANGED: u8 = 2;
pub const BOT_SLOT_HEAD: u8 = 3;
pub const BOT_SLOT_SHOULDERS: u8 = 4;
pub const BOT_SLOT_CHEST: u8 = 5;
pub const BOT_SLOT_WAIST: u8 = 6;
pub const BOT_SLOT_LEGS: u8 = 7;
pub const BOT_SLOT_FEET: u8 = 8;
pub const BOT_SLOT_WRIST: u8 = 9;
pub const BOT_SLOT_HANDS: u8 = 10;
pub const BOT_SLOT_BACK: u8 = 11;
pub const BOT_SLOT_BODY: u8 = 12;
pub const BOT_SLOT_FINGER1: u8 = 13;
pub const BOT_SLOT_FINGER2: u8 = 14;
pub const BOT_SLOT_TRINKET1: u8 = 15;
pub const BOT_SLOT_TRINKET2: u8 = 16;
pub const BOT_SLOT_NECK: u8 = 17;

pub const ROLE_NONE: u32 = 0x00;
pub const ROLE_TANK: u32 = 0x01;
pub const ROLE_TANK_OFF: u32 = 0x02;
pub const ROLE_DPS: u32 = 0x04;
pub const ROLE_HEAL: u32 = 0x08;
pub const ROLE_RANGED: u32 = 0x10;

/// 64-bit object identifier shared by creatures, players and item instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectGuid(pub u64);

impl ObjectGuid {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub guid: ObjectGuid,
    pub name: String,
}

/// Handle to an instantiated item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub guid: ObjectGuid,
    pub entry: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub entry: u32,
    pub name: String,
    #[serde(default)]
    pub item_level: u16,
    #[serde(default)]
    pub inventory_type: u8,
    #[serde(default)]
    pub required_level: u8,
}

/// Aggregated bot stat selector. Unknown codes are passed through to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BotStatMod(pub u8);

impl BotStatMod {
    pub const MANA: BotStatMod = BotStatMod(0);
    pub const HEALTH: BotStatMod = BotStatMod(1);
    pub const AGILITY: BotStatMod = BotStatMod(3);
    pub const STRENGTH: BotStatMod = BotStatMod(4);
    pub const INTELLECT: BotStatMod = BotStatMod(5);
    pub const SPIRIT: BotStatMod = BotStatMod(6);
    pub const STAMINA: BotStatMod = BotStatMod(7);
    pub const ATTACK_POWER: BotStatMod = BotStatMod(38);
    pub const SPELL_POWER: BotStatMod = BotStatMod(45);
    pub const ARMOR: BotStatMod = BotStatMod(50);
}

/// Equipment slot index that passed range validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EquipmentSlot(u8);

impl EquipmentSlot {
    /// Returns `None` for anything above [`EQUIPMENT_SLOT_END`].
    pub fn new(raw: u32) -> Option<Self> {
        if raw > EQUIPMENT_SLOT_END {
            return None;
        }
        u8::try_from(raw).ok().map(EquipmentSlot)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Per-creature state reads. Unknown guids answer as non-bots.
pub trait EntityAccessor {
    fn is_npc_bot(&self, creature: ObjectGuid) -> bool;
    fn is_free_bot(&self, creature: ObjectGuid) -> bool;
    fn bot_owner(&self, creature: ObjectGuid) -> Option<PlayerRef>;
    fn bot_owner_guid(&self, creature: ObjectGuid) -> Option<ObjectGuid>;
    fn bot_class(&self, creature: ObjectGuid) -> u8;
    fn bot_roles(&self, creature: ObjectGuid) -> u32;
    fn bot_average_item_level(&self, creature: ObjectGuid) -> f32;
    fn bot_equipment(&self, creature: ObjectGuid, slot: EquipmentSlot) -> Option<ItemRef>;
    fn bot_ai(&self, creature: ObjectGuid) -> Option<&dyn BotAi>;
    /// Mutable AI access. Equipment changes made through it move items between
    /// the bot and its owner's inventory.
    fn bot_ai_mut(&mut self, creature: ObjectGuid) -> Option<Box<dyn BotAi + '_>>;
}

/// The bot AI capability object.
pub trait BotAi {
    fn is_tank(&self) -> bool;
    fn is_off_tank(&self) -> bool;
    fn total_stat(&self, stat: BotStatMod) -> f32;
    fn spec(&self) -> u8;
    fn equip(&mut self, slot: EquipmentSlot, item: ItemRef, owner: ObjectGuid) -> bool;
    fn can_equip(&self, template: &ItemTemplate, slot: EquipmentSlot, strict: bool) -> bool;
    fn unequip(&mut self, slot: EquipmentSlot, owner: ObjectGuid) -> bool;
    fn dump(&self, owner: Option<&PlayerRef>, bot: ObjectGuid) -> String;
}

impl<T: BotAi + ?Sized> BotAi for &mut T {
    fn is_tank(&self) -> bool {
        (**self).is_tank()
    }

    fn is_off_tank(&self) -> bool {
        (**self).is_off_tank()
    }

    fn total_stat(&self, stat: BotStatMod) -> f32 {
        (**self).total_stat(stat)
    }

    fn spec(&self) -> u8 {
        (**self).spec()
    }

    fn equip(&mut self, slot: EquipmentSlot, item: ItemRef, owner: ObjectGuid) -> bool {
        (**self).equip(slot, item, owner)
    }

    fn can_equip(&self, template: &ItemTemplate, slot: EquipmentSlot, strict: bool) -> bool {
        (**self).can_equip(template, slot, strict)
    }

    fn unequip(&mut self, slot: EquipmentSlot, owner: ObjectGuid) -> bool {
        (**self).unequip(slot, owner)
    }

    fn dump(&self, owner: Option<&PlayerRef>, bot: ObjectGuid) -> String {
        (**self).dump(owner, bot)
    }
}

pub trait ItemTemplateStore {
    fn item_template(&self, entry: u32) -> Option<ItemTemplate>;
}

pub trait PlayerInventory {
    fn find_item_by_entry(&self, player: &PlayerRef, entry: u32) -> Option<ItemRef>;
    fn holds_item(&self, player: &PlayerRef, item: ItemRef) -> bool;
}

/// Everything the dispatcher needs from the engine in one object.
pub trait BotWorld: EntityAccessor + ItemTemplateStore + PlayerInventory {}

impl<T: EntityAccessor + ItemTemplateStore + PlayerInventory + ?Sized> BotWorld for T {}
