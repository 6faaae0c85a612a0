//! The capability-gated command dispatcher.
//!
//! Preconditions run in a fixed order and short-circuit: bot-ness, then
//! ownership for gated operations, then argument shape and value validation.
//! Only then is the engine called, once.

use tracing::{debug, trace, warn};

use crate::capability::{ConfirmedBot, Ownership};
use crate::coerce::{coerce, ArgValue, ItemArg, Param};
use crate::command::{Command, Operation};
use crate::config::BridgeConfig;
use crate::engine::{BotWorld, EquipmentSlot, ItemRef, ItemTemplate, ObjectGuid, PlayerRef};
use crate::error::{BotError, ErrorKind};
use crate::projection::Outcome;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BotDispatcher {
    strict_can_equip: bool,
}

impl Default for BotDispatcher {
    fn default() -> Self {
        Self {
            strict_can_equip: true,
        }
    }
}

impl BotDispatcher {
    pub fn new(strict_can_equip: bool) -> Self {
        Self { strict_can_equip }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.strict_can_equip)
    }

    /// Dispatches a raw call frame.
    ///
    /// The frame is only coerced once the creature is known to be a bot and,
    /// for gated operations, an owned one. Non-bots never see argument errors.
    pub fn call<W: BotWorld + ?Sized>(
        &self,
        world: &mut W,
        creature: ObjectGuid,
        operation: Operation,
        args: &[ArgValue],
    ) -> Result<Outcome, BotError> {
        debug!(operation = operation.name(), creature = %creature, "dispatching bot call");
        let result = self.admit_and_run(world, creature, operation, || coerce(operation, args));
        log_result(operation, creature, &result);
        result
    }

    /// Dispatches an already typed command.
    pub fn dispatch<W: BotWorld + ?Sized>(
        &self,
        world: &mut W,
        creature: ObjectGuid,
        command: &Command,
    ) -> Result<Outcome, BotError> {
        let operation = command.operation();
        debug!(operation = operation.name(), creature = %creature, "dispatching bot command");
        let result = self.admit_and_run(world, creature, operation, || Ok(command.clone()));
        log_result(operation, creature, &result);
        result
    }

    fn admit_and_run<W: BotWorld + ?Sized>(
        &self,
        world: &mut W,
        creature: ObjectGuid,
        operation: Operation,
        command: impl FnOnce() -> Result<Command, BotError>,
    ) -> Result<Outcome, BotError> {
        let (bot, owner) = match admit(&*world, creature, operation) {
            Admission::Refused(outcome) => return Ok(outcome),
            Admission::Admitted { bot, owner } => (bot, owner),
        };
        let command = command()?;
        match owner {
            Some(owner) => self.run_owned(world, &bot, &owner, &command),
            None => self.run_unowned(world, &bot, &command),
        }
    }

    fn run_owned<W: BotWorld + ?Sized>(
        &self,
        world: &mut W,
        bot: &ConfirmedBot,
        owner: &PlayerRef,
        command: &Command,
    ) -> Result<Outcome, BotError> {
        let operation = command.operation();
        match *command {
            Command::GetBotEquipment { slot } => {
                let slot = validate_slot(operation, slot)?;
                Ok(Outcome::optional(world.bot_equipment(bot.guid(), slot)))
            }
            Command::BotEquipItem { item, slot } => {
                let slot = validate_slot(operation, slot)?;
                let item = match item {
                    ItemArg::Handle(item) => owned_handle(&*world, operation, owner, item)?,
                    ItemArg::Entry(entry) => resolve_owned_item(&*world, operation, owner, entry)?,
                };
                let equipped = bot.ai_mut(world, operation)?.equip(slot, item, owner.guid);
                debug!(
                    creature = %bot.guid(),
                    slot = slot.index(),
                    entry = item.entry,
                    equipped,
                    "bot equip"
                );
                Ok(Outcome::value(equipped))
            }
            Command::BotUnequipItem { slot } => {
                let slot = validate_slot(operation, slot)?;
                let removed = bot.ai_mut(world, operation)?.unequip(slot, owner.guid);
                Ok(Outcome::value(removed))
            }
            _ => self.run_unowned(world, bot, command),
        }
    }

    fn run_unowned<W: BotWorld + ?Sized>(
        &self,
        world: &mut W,
        bot: &ConfirmedBot,
        command: &Command,
    ) -> Result<Outcome, BotError> {
        let operation = command.operation();
        let guid = bot.guid();
        let outcome = match *command {
            Command::IsNpcBot => Outcome::value(true),
            Command::GetBotOwner => Outcome::optional(world.bot_owner(guid)),
            Command::GetBotOwnerGuid => Outcome::optional(world.bot_owner_guid(guid)),
            Command::GetBotClass => Outcome::value(world.bot_class(guid)),
            Command::GetBotRoles => Outcome::value(world.bot_roles(guid)),
            Command::IsBotTank => Outcome::value(bot.ai(&*world, operation)?.is_tank()),
            Command::IsBotOffTank => Outcome::value(bot.ai(&*world, operation)?.is_off_tank()),
            Command::IsFreeBot => Outcome::value(world.is_free_bot(guid)),
            Command::GetBotAverageItemLevel => {
                Outcome::value(world.bot_average_item_level(guid))
            }
            // TODO: restrict stat reveal to the bot's owner once the access rule is settled.
            Command::GetBotStat { stat } => Outcome::value(bot.ai(&*world, operation)?.total_stat(stat)),
            Command::GetTalentSpec => Outcome::value(bot.ai(&*world, operation)?.spec()),
            Command::BotCanEquipItem { entry, slot } => {
                if entry == 0 {
                    return Ok(Outcome::NotApplicable);
                }
                let template = known_template(&*world, operation, entry)?;
                let slot = validate_slot(operation, slot)?;
                let ai = bot.ai(&*world, operation)?;
                Outcome::value(ai.can_equip(&template, slot, self.strict_can_equip))
            }
            Command::GetBotDump => {
                let ai = bot.ai(&*world, operation)?;
                let owner = world.bot_owner(guid);
                let dump = ai.dump(owner.as_ref(), guid);
                if dump.trim().is_empty() {
                    return Err(BotError::Operation {
                        operation: operation.name(),
                        message: format!("dump produced no output for bot {guid}"),
                    });
                }
                Outcome::value(dump)
            }
            // Only reachable without an owner, which makes them not applicable.
            Command::GetBotEquipment { .. }
            | Command::BotEquipItem { .. }
            | Command::BotUnequipItem { .. } => Outcome::NotApplicable,
        };
        Ok(outcome)
    }
}

enum Admission {
    Refused(Outcome),
    Admitted {
        bot: ConfirmedBot,
        owner: Option<PlayerRef>,
    },
}

/// Bot-ness and the owner gate, decided before any argument is looked at.
fn admit<W: BotWorld + ?Sized>(world: &W, creature: ObjectGuid, operation: Operation) -> Admission {
    let Some(bot) = ConfirmedBot::confirm(world, creature) else {
        return Admission::Refused(match operation {
            Operation::IsNpcBot => Outcome::value(false),
            _ => Outcome::NotApplicable,
        });
    };
    if !operation.requires_owner() {
        return Admission::Admitted { bot, owner: None };
    }
    match bot.ownership(world) {
        Ownership::Free => Admission::Refused(Outcome::NotApplicable),
        Ownership::Owned(owner) => Admission::Admitted {
            bot,
            owner: Some(owner),
        },
    }
}

fn log_result(operation: Operation, creature: ObjectGuid, result: &Result<Outcome, BotError>) {
    match result {
        Ok(Outcome::NotApplicable) => {
            trace!(operation = operation.name(), creature = %creature, "not applicable");
        }
        Err(err) if err.kind() == ErrorKind::Operation => {
            warn!(creature = %creature, "{err}");
        }
        _ => {}
    }
}

fn validate_slot(operation: Operation, raw: u32) -> Result<EquipmentSlot, BotError> {
    EquipmentSlot::new(raw).ok_or_else(|| BotError::ArgumentValue {
        operation: operation.name(),
        position: operation.position_of(Param::Slot),
        message: format!("valid equipment slot expected, got {raw}"),
    })
}

fn known_template<W: BotWorld + ?Sized>(
    world: &W,
    operation: Operation,
    entry: u32,
) -> Result<ItemTemplate, BotError> {
    let param = match operation {
        Operation::BotEquipItem => Param::Item,
        _ => Param::ItemEntry,
    };
    world
        .item_template(entry)
        .ok_or_else(|| BotError::ArgumentValue {
            operation: operation.name(),
            position: operation.position_of(param),
            message: format!("valid item entry expected, got {entry}"),
        })
}

/// Resolves an item entry against the owner's inventory, never a global pool.
fn resolve_owned_item<W: BotWorld + ?Sized>(
    world: &W,
    operation: Operation,
    owner: &PlayerRef,
    entry: u32,
) -> Result<ItemRef, BotError> {
    known_template(world, operation, entry)?;
    world
        .find_item_by_entry(owner, entry)
        .ok_or_else(|| BotError::ArgumentValue {
            operation: operation.name(),
            position: operation.position_of(Param::Item),
            message: format!("owner {} carries no item with entry {entry}", owner.name),
        })
}

fn owned_handle<W: BotWorld + ?Sized>(
    world: &W,
    operation: Operation,
    owner: &PlayerRef,
    item: ItemRef,
) -> Result<ItemRef, BotError> {
    if world.holds_item(owner, item) {
        return Ok(item);
    }
    Err(BotError::ArgumentValue {
        operation: operation.name(),
        position: operation.position_of(Param::Item),
        message: format!("owner {} does not hold item {}", owner.name, item.guid),
    })
}
