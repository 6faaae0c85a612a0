use bevy::prelude::Component;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::engine::*;

pub const INVTYPE_HEAD: u8 = 1;
pub const INVTYPE_NECK: u8 = 2;
pub const INVTYPE_SHOULDERS: u8 = 3;
pub const INVTYPE_BODY: u8 = 4;
pub const INVTYPE_CHEST: u8 = 5;
pub const INVTYPE_WAIST: u8 = 6;
pub const INVTYPE_LEGS: u8 = 7;
pub const INVTYPE_FEET: u8 = 8;
pub const INVTYPE_WRISTS: u8 = 9;
pub const INVTYPE_HANDS: u8 = 10;
pub const INVTYPE_FINGER: u8 = 11;
pub const INVTYPE_TRINKET: u8 = 12;
pub const INVTYPE_WEAPON: u8 = 13;
pub const INVTYPE_SHIELD: u8 = 14;
pub const INVTYPE_RANGED: u8 = 15;
pub const INVTYPE_CLOAK: u8 = 16;
pub const INVTYPE_2HWEAPON: u8 = 17;
pub const INVTYPE_ROBE: u8 = 20;
pub const INVTYPE_WEAPONMAINHAND: u8 = 21;
pub const INVTYPE_WEAPONOFFHAND: u8 = 22;
pub const INVTYPE_HOLDABLE: u8 = 23;
pub const INVTYPE_THROWN: u8 = 25;
pub const INVTYPE_RANGEDRIGHT: u8 = 26;
pub const INVTYPE_RELIC: u8 = 28;

/// Whether an item of `inventory_type` can sit in bot slot `slot`.
pub fn slot_accepts(slot: u8, inventory_type: u8) -> bool {
    match slot {
        BOT_SLOT_MAINHAND => matches!(
            inventory_type,
            INVTYPE_WEAPON | INVTYPE_2HWEAPON | INVTYPE_WEAPONMAINHAND
        ),
        BOT_SLOT_OFFHAND => matches!(
            inventory_type,
            INVTYPE_WEAPON | INVTYPE_SHIELD | INVTYPE_WEAPONOFFHAND | INVTYPE_HOLDABLE
        ),
        BOT_SLOT_RANGED => matches!(
            inventory_type,
            INVTYPE_RANGED | INVTYPE_THROWN | INVTYPE_RANGEDRIGHT | INVTYPE_RELIC
        ),
        BOT_SLOT_HEAD => inventory_type == INVTYPE_HEAD,
        BOT_SLOT_SHOULDERS => inventory_type == INVTYPE_SHOULDERS,
        BOT_SLOT_CHEST => matches!(inventory_type, INVTYPE_CHEST | INVTYPE_ROBE),
        BOT_SLOT_WAIST => inventory_type == INVTYPE_WAIST,
        BOT_SLOT_LEGS => inventory_type == INVTYPE_LEGS,
        BOT_SLOT_FEET => inventory_type == INVTYPE_FEET,
        BOT_SLOT_WRIST => inventory_type == INVTYPE_WRISTS,
        BOT_SLOT_HANDS => inventory_type == INVTYPE_HANDS,
        BOT_SLOT_BACK => inventory_type == INVTYPE_CLOAK,
        BOT_SLOT_BODY => inventory_type == INVTYPE_BODY,
        BOT_SLOT_FINGER1 | BOT_SLOT_FINGER2 => inventory_type == INVTYPE_FINGER,
        BOT_SLOT_TRINKET1 | BOT_SLOT_TRINKET2 => inventory_type == INVTYPE_TRINKET,
        BOT_SLOT_NECK => inventory_type == INVTYPE_NECK,
        _ => false,
    }
}

/// AI state of a bot creature. Owns the bot's equipment slots; moving items in
/// and out of an owner's backpack is the roster's job.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct BotBrain {
    pub level: u8,
    pub spec: u8,
    pub roles: u32,
    pub stats: BTreeMap<u8, f32>,
    owner: Option<ObjectGuid>,
    equipment: BTreeMap<u8, ItemRef>,
}

impl BotBrain {
    pub fn new(level: u8, spec: u8, roles: u32) -> Self {
        Self {
            level,
            spec,
            roles,
            ..Default::default()
        }
    }

    pub fn with_stat(mut self, stat: BotStatMod, value: f32) -> Self {
        self.stats.insert(stat.0, value);
        self
    }

    pub fn owner(&self) -> Option<ObjectGuid> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ObjectGuid>) {
        self.owner = owner;
    }

    /// Places an item without owner checks, for roster setup.
    pub(crate) fn preload(&mut self, slot: EquipmentSlot, item: ItemRef) {
        self.equipment.insert(slot.index(), item);
    }

    pub fn equipped(&self, slot: EquipmentSlot) -> Option<ItemRef> {
        self.equipment.get(&slot.index()).copied()
    }

    pub fn equipped_items(&self) -> impl Iterator<Item = &ItemRef> {
        self.equipment.values()
    }

    fn acts_for(&self, owner: ObjectGuid) -> bool {
        self.owner == Some(owner)
    }

    /// Whether `owner` may put an item into `slot`.
    pub(crate) fn accepts(&self, slot: EquipmentSlot, owner: ObjectGuid) -> bool {
        self.acts_for(owner) && slot.index() < BOT_INVENTORY_SIZE
    }

    /// Puts `item` into `slot`, handing back whatever was there.
    pub(crate) fn swap(&mut self, slot: EquipmentSlot, item: ItemRef) -> Option<ItemRef> {
        self.equipment.insert(slot.index(), item)
    }

    /// Empties `slot` on behalf of `owner`.
    pub(crate) fn take(&mut self, slot: EquipmentSlot, owner: ObjectGuid) -> Option<ItemRef> {
        if !self.acts_for(owner) {
            return None;
        }
        self.equipment.remove(&slot.index())
    }
}

impl BotAi for BotBrain {
    fn is_tank(&self) -> bool {
        self.roles & ROLE_TANK != 0
    }

    fn is_off_tank(&self) -> bool {
        self.roles & ROLE_TANK_OFF != 0
    }

    fn total_stat(&self, stat: BotStatMod) -> f32 {
        self.stats.get(&stat.0).copied().unwrap_or(0.0)
    }

    fn spec(&self) -> u8 {
        self.spec
    }

    fn equip(&mut self, slot: EquipmentSlot, item: ItemRef, owner: ObjectGuid) -> bool {
        if !self.accepts(slot, owner) {
            return false;
        }
        self.swap(slot, item);
        true
    }

    fn can_equip(&self, template: &ItemTemplate, slot: EquipmentSlot, strict: bool) -> bool {
        if !slot_accepts(slot.index(), template.inventory_type) {
            return false;
        }
        !strict || template.required_level <= self.level
    }

    fn unequip(&mut self, slot: EquipmentSlot, owner: ObjectGuid) -> bool {
        self.take(slot, owner).is_some()
    }

    fn dump(&self, owner: Option<&PlayerRef>, bot: ObjectGuid) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "bot {bot}");
        match owner {
            Some(owner) => {
                let _ = writeln!(out, "owner: {} ({})", owner.name, owner.guid);
            }
            None => {
                let _ = writeln!(out, "owner: none");
            }
        }
        let _ = writeln!(
            out,
            "level: {}  spec: {}  roles: 0x{:02X}",
            self.level, self.spec, self.roles
        );
        let _ = writeln!(out, "equipment:");
        for (slot, item) in &self.equipment {
            let _ = writeln!(out, "  [{slot:2}] entry {} ({})", item.entry, item.guid);
        }
        if !self.stats.is_empty() {
            let _ = writeln!(out, "stats:");
            for (code, value) in &self.stats {
                let _ = writeln!(out, "  [{code:2}] {value:.1}");
            }
        }
        out
    }
}
