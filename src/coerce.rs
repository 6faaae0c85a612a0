//! Argument coercion: loosely-typed call frames into typed [`Command`]s.
//!
//! Only the shape of each argument is checked here. Whether a slot is in range
//! or an item entry exists is decided by the dispatcher.

use crate::command::{Command, Operation};
use crate::engine::{BotStatMod, ItemRef};
use crate::error::BotError;

/// Position of the first declared parameter; position 1 is the creature.
pub const FIRST_ARG_POSITION: usize = 2;

static MISSING_ARG: ArgValue = ArgValue::Nil;

/// Host-neutral argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Nil,
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    Item(ItemRef),
    Other(&'static str),
}

impl ArgValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Num(_) => "number",
            Self::Str(_) => "string",
            Self::Item(_) => "Item",
            Self::Other(name) => *name,
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::Num(v) if v.is_finite() && v.fract() == 0.0 => {
                if v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                    Some(v as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param {
    Slot,
    StatCode,
    /// Item handle or numeric item entry.
    Item,
    ItemEntry,
}

impl Param {
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Slot | Self::ItemEntry => "uint32",
            Self::StatCode => "uint8",
            Self::Item => "item",
        }
    }
}

/// An item argument, told apart by the value's tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemArg {
    Handle(ItemRef),
    Entry(u32),
}

struct ArgFrame<'a> {
    operation: Operation,
    args: &'a [ArgValue],
    cursor: usize,
}

impl<'a> ArgFrame<'a> {
    fn new(operation: Operation, args: &'a [ArgValue]) -> Self {
        Self {
            operation,
            args,
            cursor: 0,
        }
    }

    fn next(&mut self) -> (usize, &'a ArgValue) {
        let index = self.cursor;
        self.cursor += 1;
        let value = self.args.get(index).unwrap_or(&MISSING_ARG);
        (index + FIRST_ARG_POSITION, value)
    }

    fn mismatch(&self, position: usize, param: Param, found: &ArgValue) -> BotError {
        let found = match found.as_integer() {
            Some(v) => format!("number {v}"),
            None => found.type_name().to_string(),
        };
        BotError::ArgumentType {
            operation: self.operation.name(),
            position,
            expected: param.type_name(),
            found,
        }
    }

    fn uint<T: TryFrom<i64>>(&mut self, param: Param) -> Result<T, BotError> {
        let (position, value) = self.next();
        value
            .as_integer()
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| self.mismatch(position, param, value))
    }

    fn slot(&mut self) -> Result<u32, BotError> {
        self.uint(Param::Slot)
    }

    fn stat_code(&mut self) -> Result<BotStatMod, BotError> {
        self.uint(Param::StatCode).map(BotStatMod)
    }

    fn item_entry(&mut self) -> Result<u32, BotError> {
        self.uint(Param::ItemEntry)
    }

    fn item(&mut self) -> Result<ItemArg, BotError> {
        let (position, value) = self.next();
        if let ArgValue::Item(item) = value {
            return Ok(ItemArg::Handle(*item));
        }
        value
            .as_integer()
            .and_then(|v| u32::try_from(v).ok())
            .map(ItemArg::Entry)
            .ok_or_else(|| self.mismatch(position, Param::Item, value))
    }
}

/// Reads `args` in the operation's declared order and builds its [`Command`].
///
/// Arguments past the declared shape are ignored.
pub fn coerce(operation: Operation, args: &[ArgValue]) -> Result<Command, BotError> {
    let mut frame = ArgFrame::new(operation, args);
    let command = match operation {
        Operation::IsNpcBot => Command::IsNpcBot,
        Operation::GetBotOwner => Command::GetBotOwner,
        Operation::GetBotOwnerGuid => Command::GetBotOwnerGuid,
        Operation::GetBotClass => Command::GetBotClass,
        Operation::GetBotRoles => Command::GetBotRoles,
        Operation::IsBotTank => Command::IsBotTank,
        Operation::IsBotOffTank => Command::IsBotOffTank,
        Operation::IsFreeBot => Command::IsFreeBot,
        Operation::GetBotAverageItemLevel => Command::GetBotAverageItemLevel,
        Operation::GetBotEquipment => Command::GetBotEquipment {
            slot: frame.slot()?,
        },
        Operation::GetBotStat => Command::GetBotStat {
            stat: frame.stat_code()?,
        },
        Operation::GetTalentSpec => Command::GetTalentSpec,
        Operation::BotEquipItem => {
            let item = frame.item()?;
            let slot = frame.slot()?;
            Command::BotEquipItem { item, slot }
        }
        Operation::BotCanEquipItem => {
            let entry = frame.item_entry()?;
            let slot = frame.slot()?;
            Command::BotCanEquipItem { entry, slot }
        }
        Operation::BotUnequipItem => Command::BotUnequipItem {
            slot: frame.slot()?,
        },
        Operation::GetBotDump => Command::GetBotDump,
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ObjectGuid;
    use crate::error::ErrorKind;

    fn sample_for(param: Param) -> ArgValue {
        match param {
            Param::Item => ArgValue::Item(ItemRef {
                guid: ObjectGuid(9),
                entry: 1001,
            }),
            _ => ArgValue::Int(1),
        }
    }

    #[test]
    fn every_shape_coerces_from_matching_args() {
        for op in Operation::ALL {
            let args: Vec<ArgValue> = op.shape().iter().map(|p| sample_for(*p)).collect();
            let command = coerce(op, &args).expect("shape-conforming args coerce");
            assert_eq!(command.operation(), op);
        }
    }

    #[test]
    fn item_union_is_resolved_by_tag() {
        let handle = ItemRef {
            guid: ObjectGuid(77),
            entry: 1001,
        };
        let by_handle = coerce(
            Operation::BotEquipItem,
            &[ArgValue::Item(handle), ArgValue::Int(5)],
        )
        .expect("handle");
        assert_eq!(
            by_handle,
            Command::BotEquipItem {
                item: ItemArg::Handle(handle),
                slot: 5
            }
        );

        let by_entry = coerce(
            Operation::BotEquipItem,
            &[ArgValue::Num(1001.0), ArgValue::Num(5.0)],
        )
        .expect("entry");
        assert_eq!(
            by_entry,
            Command::BotEquipItem {
                item: ItemArg::Entry(1001),
                slot: 5
            }
        );
    }

    #[test]
    fn out_of_range_slots_pass_coercion() {
        let command = coerce(Operation::BotUnequipItem, &[ArgValue::Int(4000)]).expect("coerce");
        assert_eq!(command, Command::BotUnequipItem { slot: 4000 });
    }

    #[test]
    fn wrong_types_name_position_and_expectation() {
        let err = coerce(
            Operation::BotEquipItem,
            &[ArgValue::Int(1001), ArgValue::Str("chest".to_string())],
        )
        .expect_err("string slot");
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert_eq!(
            err.to_string(),
            "bad argument #3 to 'BotEquipItem' (uint32 expected, got string)"
        );

        let err = coerce(Operation::GetBotEquipment, &[]).expect_err("missing slot");
        assert_eq!(
            err.to_string(),
            "bad argument #2 to 'GetBotEquipment' (uint32 expected, got nil)"
        );
    }

    #[test]
    fn integers_must_fit_declared_width() {
        assert!(coerce(Operation::GetBotStat, &[ArgValue::Int(255)]).is_ok());
        let err = coerce(Operation::GetBotStat, &[ArgValue::Int(256)]).expect_err("too wide");
        assert!(err.to_string().contains("uint8 expected, got number 256"));
        assert!(coerce(Operation::GetBotEquipment, &[ArgValue::Int(-1)]).is_err());
        assert!(coerce(Operation::GetBotEquipment, &[ArgValue::Num(2.5)]).is_err());
        assert!(coerce(Operation::GetBotEquipment, &[ArgValue::Num(f64::NAN)]).is_err());
    }

    #[test]
    fn can_equip_rejects_item_handles() {
        let handle = ArgValue::Item(ItemRef {
            guid: ObjectGuid(1),
            entry: 1,
        });
        let err = coerce(Operation::BotCanEquipItem, &[handle, ArgValue::Int(5)])
            .expect_err("handle where entry expected");
        assert!(err.to_string().contains("got Item"));
    }

    #[test]
    fn trailing_arguments_are_ignored() {
        let command = coerce(
            Operation::IsBotTank,
            &[ArgValue::Bool(true), ArgValue::Nil],
        )
        .expect("extra args");
        assert_eq!(command, Command::IsBotTank);
    }
}
