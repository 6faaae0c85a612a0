//! In-memory bot world on a bevy ECS [`World`].
//!
//! Creatures, players and items live as entities and resources. [`BotRoster`]
//! implements every engine collaborator trait, so the dispatcher and the
//! script hosts can run without a game server attached.

pub mod brain;
pub mod fixture;

use bevy::prelude::{Component, Entity, Resource, World};
use std::collections::HashMap;

use crate::engine::*;

pub use brain::BotBrain;
pub use fixture::{RosterError, RosterFixture};

/// Item guids stay below 2^53 so they survive a trip through a Lua number.
const FIRST_ITEM_GUID: u64 = 0x0010_0000_0000_0001;

#[derive(Component, Clone, Debug)]
pub struct CreatureInfo {
    pub guid: ObjectGuid,
    pub entry: u32,
    pub name: String,
}

/// Marks a creature as an NPC bot.
#[derive(Component, Clone, Debug)]
pub struct NpcBot {
    pub class: u8,
    pub owner: Option<PlayerRef>,
}

#[derive(Component, Clone, Debug)]
pub struct PlayerInfo(pub PlayerRef);

#[derive(Component, Clone, Debug, Default)]
pub struct Backpack {
    pub items: Vec<ItemRef>,
}

#[derive(Resource, Default)]
pub struct ItemTemplateRegistry {
    pub templates: HashMap<u32, ItemTemplate>,
}

#[derive(Resource, Default)]
struct GuidIndex {
    creatures: HashMap<ObjectGuid, Entity>,
    players: HashMap<ObjectGuid, Entity>,
}

#[derive(Resource)]
struct NextItemGuid(u64);

impl Default for NextItemGuid {
    fn default() -> Self {
        Self(FIRST_ITEM_GUID)
    }
}

/// Parameters for [`BotRoster::spawn_bot`].
#[derive(Clone, Debug)]
pub struct BotSpawn {
    pub guid: ObjectGuid,
    pub entry: u32,
    pub name: String,
    pub class: u8,
    pub owner: Option<ObjectGuid>,
    /// `None` spawns a bot whose AI handle cannot be obtained.
    pub brain: Option<BotBrain>,
}

pub struct BotRoster {
    world: World,
}

impl Default for BotRoster {
    fn default() -> Self {
        let mut world = World::new();
        world.init_resource::<ItemTemplateRegistry>();
        world.init_resource::<GuidIndex>();
        world.init_resource::<NextItemGuid>();
        Self { world }
    }
}

impl BotRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_template(&mut self, template: ItemTemplate) {
        self.world
            .resource_mut::<ItemTemplateRegistry>()
            .templates
            .insert(template.entry, template);
    }

    pub fn spawn_player(&mut self, guid: ObjectGuid, name: &str) -> PlayerRef {
        let player = PlayerRef {
            guid,
            name: name.to_string(),
        };
        let entity = self
            .world
            .spawn((PlayerInfo(player.clone()), Backpack::default()))
            .id();
        self.world
            .resource_mut::<GuidIndex>()
            .players
            .insert(guid, entity);
        player
    }

    pub fn player(&self, guid: ObjectGuid) -> Option<PlayerRef> {
        let entity = self.player_entity(guid)?;
        self.world.get::<PlayerInfo>(entity).map(|p| p.0.clone())
    }

    /// Mints a new item instance into the player's backpack.
    pub fn give_item(&mut self, player: ObjectGuid, entry: u32) -> Option<ItemRef> {
        let entity = self.player_entity(player)?;
        let item = self.mint_item(entry);
        self.world.get_mut::<Backpack>(entity)?.items.push(item);
        Some(item)
    }

    pub fn backpack(&self, player: ObjectGuid) -> Vec<ItemRef> {
        self.player_entity(player)
            .and_then(|e| self.world.get::<Backpack>(e))
            .map(|b| b.items.clone())
            .unwrap_or_default()
    }

    pub fn spawn_creature(&mut self, guid: ObjectGuid, entry: u32, name: &str) {
        let entity = self
            .world
            .spawn(CreatureInfo {
                guid,
                entry,
                name: name.to_string(),
            })
            .id();
        self.world
            .resource_mut::<GuidIndex>()
            .creatures
            .insert(guid, entity);
    }

    /// Spawns a bot creature. Returns `false` if the owner guid is not a known player.
    pub fn spawn_bot(&mut self, spawn: BotSpawn) -> bool {
        let owner = match spawn.owner {
            Some(guid) => match self.player(guid) {
                Some(player) => Some(player),
                None => return false,
            },
            None => None,
        };
        self.spawn_creature(spawn.guid, spawn.entry, &spawn.name);
        let Some(entity) = self.creature_entity(spawn.guid) else {
            return false;
        };
        let owner_guid = owner.as_ref().map(|p| p.guid);
        let mut entity_mut = self.world.entity_mut(entity);
        entity_mut.insert(NpcBot {
            class: spawn.class,
            owner,
        });
        if let Some(mut brain) = spawn.brain {
            brain.set_owner(owner_guid);
            entity_mut.insert(brain);
        }
        true
    }

    /// Hands a bot to a player, or frees it with `None`.
    pub fn set_owner(&mut self, bot: ObjectGuid, owner: Option<ObjectGuid>) -> bool {
        let owner = match owner {
            Some(guid) => match self.player(guid) {
                Some(player) => Some(player),
                None => return false,
            },
            None => None,
        };
        let Some(entity) = self.creature_entity(bot) else {
            return false;
        };
        let owner_guid = owner.as_ref().map(|p| p.guid);
        match self.world.get_mut::<NpcBot>(entity) {
            Some(mut npc_bot) => npc_bot.owner = owner,
            None => return false,
        }
        if let Some(mut brain) = self.world.get_mut::<BotBrain>(entity) {
            brain.set_owner(owner_guid);
        }
        true
    }

    pub fn creature_name(&self, guid: ObjectGuid) -> Option<String> {
        let entity = self.creature_entity(guid)?;
        self.world.get::<CreatureInfo>(entity).map(|c| c.name.clone())
    }

    pub fn creature_guids(&self) -> Vec<ObjectGuid> {
        let mut guids: Vec<ObjectGuid> = self
            .world
            .resource::<GuidIndex>()
            .creatures
            .keys()
            .copied()
            .collect();
        guids.sort();
        guids
    }

    pub fn has_creature(&self, guid: ObjectGuid) -> bool {
        self.creature_entity(guid).is_some()
    }

    /// Places an item straight into a bot slot, bypassing ownership rules.
    pub(crate) fn preload_equipment(&mut self, bot: ObjectGuid, slot: EquipmentSlot, entry: u32) -> bool {
        let Some(entity) = self.creature_entity(bot) else {
            return false;
        };
        if self.world.get::<BotBrain>(entity).is_none() {
            return false;
        }
        let item = self.mint_item(entry);
        match self.world.get_mut::<BotBrain>(entity) {
            Some(mut brain) => {
                brain.preload(slot, item);
                true
            }
            None => false,
        }
    }

    fn mint_item(&mut self, entry: u32) -> ItemRef {
        let mut next = self.world.resource_mut::<NextItemGuid>();
        let guid = ObjectGuid(next.0);
        next.0 += 1;
        ItemRef { guid, entry }
    }

    fn creature_entity(&self, guid: ObjectGuid) -> Option<Entity> {
        self.world
            .resource::<GuidIndex>()
            .creatures
            .get(&guid)
            .copied()
    }

    fn player_entity(&self, guid: ObjectGuid) -> Option<Entity> {
        player_entity(&self.world, guid)
    }

    fn npc_bot(&self, guid: ObjectGuid) -> Option<&NpcBot> {
        self.creature_entity(guid)
            .and_then(|e| self.world.get::<NpcBot>(e))
    }

    fn brain(&self, guid: ObjectGuid) -> Option<&BotBrain> {
        self.creature_entity(guid)
            .and_then(|e| self.world.get::<BotBrain>(e))
    }
}

fn player_entity(world: &World, guid: ObjectGuid) -> Option<Entity> {
    world.resource::<GuidIndex>().players.get(&guid).copied()
}

/// Mutable view of one bot's AI. Equipping takes the item out of the owner's
/// backpack and hands any displaced item back; unequipping returns the item.
struct BotHandle<'w> {
    world: &'w mut World,
    bot: Entity,
}

impl BotHandle<'_> {
    fn brain(&self) -> Option<&BotBrain> {
        self.world.get::<BotBrain>(self.bot)
    }
}

impl BotAi for BotHandle<'_> {
    fn is_tank(&self) -> bool {
        self.brain().is_some_and(|b| b.is_tank())
    }

    fn is_off_tank(&self) -> bool {
        self.brain().is_some_and(|b| b.is_off_tank())
    }

    fn total_stat(&self, stat: BotStatMod) -> f32 {
        self.brain().map_or(0.0, |b| b.total_stat(stat))
    }

    fn spec(&self) -> u8 {
        self.brain().map_or(0, |b| b.spec())
    }

    fn equip(&mut self, slot: EquipmentSlot, item: ItemRef, owner: ObjectGuid) -> bool {
        let Some(bag) = player_entity(&*self.world, owner) else {
            return false;
        };
        let held = self
            .world
            .get::<Backpack>(bag)
            .is_some_and(|b| b.items.contains(&item));
        if !held {
            return false;
        }
        let displaced = match self.world.get_mut::<BotBrain>(self.bot) {
            Some(mut brain) if brain.accepts(slot, owner) => brain.swap(slot, item),
            _ => return false,
        };
        if let Some(mut backpack) = self.world.get_mut::<Backpack>(bag) {
            backpack.items.retain(|carried| *carried != item);
            backpack.items.extend(displaced);
        }
        true
    }

    fn can_equip(&self, template: &ItemTemplate, slot: EquipmentSlot, strict: bool) -> bool {
        self.brain()
            .is_some_and(|b| b.can_equip(template, slot, strict))
    }

    fn unequip(&mut self, slot: EquipmentSlot, owner: ObjectGuid) -> bool {
        let Some(bag) = player_entity(&*self.world, owner) else {
            return false;
        };
        let removed = match self.world.get_mut::<BotBrain>(self.bot) {
            Some(mut brain) => brain.take(slot, owner),
            None => None,
        };
        let Some(item) = removed else {
            return false;
        };
        if let Some(mut backpack) = self.world.get_mut::<Backpack>(bag) {
            backpack.items.push(item);
        }
        true
    }

    fn dump(&self, owner: Option<&PlayerRef>, bot: ObjectGuid) -> String {
        self.brain().map(|b| b.dump(owner, bot)).unwrap_or_default()
    }
}

impl EntityAccessor for BotRoster {
    fn is_npc_bot(&self, creature: ObjectGuid) -> bool {
        self.npc_bot(creature).is_some()
    }

    fn is_free_bot(&self, creature: ObjectGuid) -> bool {
        self.npc_bot(creature).is_some_and(|b| b.owner.is_none())
    }

    fn bot_owner(&self, creature: ObjectGuid) -> Option<PlayerRef> {
        self.npc_bot(creature).and_then(|b| b.owner.clone())
    }

    fn bot_owner_guid(&self, creature: ObjectGuid) -> Option<ObjectGuid> {
        self.npc_bot(creature)
            .and_then(|b| b.owner.as_ref())
            .map(|p| p.guid)
    }

    fn bot_class(&self, creature: ObjectGuid) -> u8 {
        self.npc_bot(creature).map_or(0, |b| b.class)
    }

    fn bot_roles(&self, creature: ObjectGuid) -> u32 {
        self.brain(creature).map_or(ROLE_NONE, |b| b.roles)
    }

    fn bot_average_item_level(&self, creature: ObjectGuid) -> f32 {
        let Some(brain) = self.brain(creature) else {
            return 0.0;
        };
        let registry = self.world.resource::<ItemTemplateRegistry>();
        let levels: Vec<f32> = brain
            .equipped_items()
            .filter_map(|item| registry.templates.get(&item.entry))
            .map(|t| f32::from(t.item_level))
            .collect();
        if levels.is_empty() {
            return 0.0;
        }
        levels.iter().sum::<f32>() / levels.len() as f32
    }

    fn bot_equipment(&self, creature: ObjectGuid, slot: EquipmentSlot) -> Option<ItemRef> {
        self.brain(creature).and_then(|b| b.equipped(slot))
    }

    fn bot_ai(&self, creature: ObjectGuid) -> Option<&dyn BotAi> {
        self.brain(creature).map(|b| b as &dyn BotAi)
    }

    fn bot_ai_mut(&mut self, creature: ObjectGuid) -> Option<Box<dyn BotAi + '_>> {
        let bot = self.creature_entity(creature)?;
        if self.world.get::<BotBrain>(bot).is_none() {
            return None;
        }
        Some(Box::new(BotHandle {
            world: &mut self.world,
            bot,
        }))
    }
}

impl ItemTemplateStore for BotRoster {
    fn item_template(&self, entry: u32) -> Option<ItemTemplate> {
        self.world
            .resource::<ItemTemplateRegistry>()
            .templates
            .get(&entry)
            .cloned()
    }
}

impl PlayerInventory for BotRoster {
    fn find_item_by_entry(&self, player: &PlayerRef, entry: u32) -> Option<ItemRef> {
        let entity = self.player_entity(player.guid)?;
        self.world
            .get::<Backpack>(entity)?
            .items
            .iter()
            .find(|item| item.entry == entry)
            .copied()
    }

    fn holds_item(&self, player: &PlayerRef, item: ItemRef) -> bool {
        self.player_entity(player.guid)
            .and_then(|e| self.world.get::<Backpack>(e))
            .is_some_and(|b| b.items.contains(&item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_with_bot() -> BotRoster {
        let mut roster = BotRoster::new();
        roster.register_template(ItemTemplate {
            entry: 1001,
            name: "Valorous Chestguard".to_string(),
            item_level: 200,
            inventory_type: brain::INVTYPE_CHEST,
            required_level: 80,
        });
        roster.register_template(ItemTemplate {
            entry: 1002,
            name: "Valorous Helm".to_string(),
            item_level: 226,
            inventory_type: brain::INVTYPE_HEAD,
            required_level: 80,
        });
        roster.spawn_player(ObjectGuid(1), "Jaina");
        assert!(roster.spawn_bot(BotSpawn {
            guid: ObjectGuid(100),
            entry: 70001,
            name: "Aldric".to_string(),
            class: 1,
            owner: Some(ObjectGuid(1)),
            brain: Some(BotBrain::new(80, 1, ROLE_TANK)),
        }));
        roster
    }

    #[test]
    fn owner_is_mirrored_into_the_brain() {
        let roster = roster_with_bot();
        assert!(roster.is_npc_bot(ObjectGuid(100)));
        assert!(!roster.is_free_bot(ObjectGuid(100)));
        assert_eq!(roster.bot_owner_guid(ObjectGuid(100)), Some(ObjectGuid(1)));
        assert_eq!(
            roster.brain(ObjectGuid(100)).and_then(BotBrain::owner),
            Some(ObjectGuid(1))
        );
    }

    #[test]
    fn unknown_guids_are_not_bots() {
        let roster = roster_with_bot();
        assert!(!roster.is_npc_bot(ObjectGuid(999)));
        assert!(!roster.is_free_bot(ObjectGuid(999)));
        assert!(roster.bot_ai(ObjectGuid(999)).is_none());
    }

    #[test]
    fn spawn_bot_rejects_unknown_owner() {
        let mut roster = BotRoster::new();
        assert!(!roster.spawn_bot(BotSpawn {
            guid: ObjectGuid(5),
            entry: 1,
            name: "Stray".to_string(),
            class: 4,
            owner: Some(ObjectGuid(77)),
            brain: None,
        }));
        assert!(!roster.has_creature(ObjectGuid(5)));
    }

    #[test]
    fn freeing_a_bot_clears_both_owner_copies() {
        let mut roster = roster_with_bot();
        assert!(roster.set_owner(ObjectGuid(100), None));
        assert!(roster.is_free_bot(ObjectGuid(100)));
        assert_eq!(roster.brain(ObjectGuid(100)).and_then(BotBrain::owner), None);
        assert!(!roster.set_owner(ObjectGuid(100), Some(ObjectGuid(404))));
    }

    #[test]
    fn average_item_level_over_equipped_items() {
        let mut roster = roster_with_bot();
        assert_eq!(roster.bot_average_item_level(ObjectGuid(100)), 0.0);
        let chest = EquipmentSlot::new(u32::from(BOT_SLOT_CHEST)).expect("slot");
        let head = EquipmentSlot::new(u32::from(BOT_SLOT_HEAD)).expect("slot");
        assert!(roster.preload_equipment(ObjectGuid(100), chest, 1001));
        assert!(roster.preload_equipment(ObjectGuid(100), head, 1002));
        assert_eq!(roster.bot_average_item_level(ObjectGuid(100)), 213.0);
    }

    #[test]
    fn inventory_lookup_is_per_player() {
        let mut roster = roster_with_bot();
        let other = roster.spawn_player(ObjectGuid(2), "Varian");
        let item = roster.give_item(ObjectGuid(1), 1001).expect("give");
        let jaina = roster.player(ObjectGuid(1)).expect("player");
        assert_eq!(roster.find_item_by_entry(&jaina, 1001), Some(item));
        assert_eq!(roster.find_item_by_entry(&other, 1001), None);
        let second = roster.give_item(ObjectGuid(1), 1001).expect("give");
        assert_ne!(item.guid, second.guid);
        assert_eq!(roster.backpack(ObjectGuid(1)).len(), 2);
    }

    #[test]
    fn equipping_moves_items_out_of_the_backpack() {
        let mut roster = roster_with_bot();
        let first = roster.give_item(ObjectGuid(1), 1001).expect("give");
        let second = roster.give_item(ObjectGuid(1), 1001).expect("give");
        let chest = EquipmentSlot::new(u32::from(BOT_SLOT_CHEST)).expect("slot");

        let mut ai = roster.bot_ai_mut(ObjectGuid(100)).expect("ai");
        assert!(ai.equip(chest, first, ObjectGuid(1)));
        assert!(!ai.equip(chest, first, ObjectGuid(1)));
        assert!(ai.equip(chest, second, ObjectGuid(1)));
        drop(ai);
        assert_eq!(roster.backpack(ObjectGuid(1)), vec![first]);
        assert_eq!(roster.bot_equipment(ObjectGuid(100), chest), Some(second));

        let mut ai = roster.bot_ai_mut(ObjectGuid(100)).expect("ai");
        assert!(ai.unequip(chest, ObjectGuid(1)));
        assert!(!ai.unequip(chest, ObjectGuid(1)));
        drop(ai);
        assert_eq!(roster.backpack(ObjectGuid(1)), vec![first, second]);
        assert_eq!(roster.bot_equipment(ObjectGuid(100), chest), None);
    }

    #[test]
    fn equipping_needs_the_item_in_the_owners_backpack() {
        let mut roster = roster_with_bot();
        roster.spawn_player(ObjectGuid(2), "Varian");
        let helm = roster.give_item(ObjectGuid(2), 1002).expect("give");
        let head = EquipmentSlot::new(u32::from(BOT_SLOT_HEAD)).expect("slot");
        let mut ai = roster.bot_ai_mut(ObjectGuid(100)).expect("ai");
        assert!(!ai.equip(head, helm, ObjectGuid(1)));
        assert!(!ai.equip(head, helm, ObjectGuid(2)));
        drop(ai);
        assert_eq!(roster.backpack(ObjectGuid(2)), vec![helm]);
        assert_eq!(roster.bot_equipment(ObjectGuid(100), head), None);
    }

    #[test]
    fn minted_item_guids_fit_a_double() {
        let mut roster = roster_with_bot();
        let item = roster.give_item(ObjectGuid(1), 1001).expect("give");
        assert!(item.guid.raw() < 1 << 53);
        assert_eq!(item.guid.raw() as f64 as u64, item.guid.raw());
    }
}
