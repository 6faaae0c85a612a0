//! Script hosts exposing the bot surface to Lua and Rhai.

#[cfg(not(target_arch = "wasm32"))]
pub mod lua_host;
pub mod rhai_host;

use std::cell::RefCell;
use std::rc::Rc;

use crate::coerce::ArgValue;
use crate::command::Operation;
use crate::dispatch::BotDispatcher;
use crate::engine::{BotWorld, ObjectGuid, PlayerRef};
use crate::error::BotError;
use crate::projection::{BotValue, Outcome};
use crate::roster::BotRoster;

#[cfg(not(target_arch = "wasm32"))]
pub use lua_host::LuaBotHost;
pub use rhai_host::RhaiBotHost;

pub const DEFAULT_RHAI_MAX_OPERATIONS: u64 = 500_000;
pub const DEFAULT_RHAI_MAX_CALL_LEVELS: usize = 64;

/// Lookups the hosts need to hand out creature and player handles.
pub trait ScriptWorld: BotWorld {
    fn creature_exists(&self, guid: ObjectGuid) -> bool;
    fn find_player(&self, guid: ObjectGuid) -> Option<PlayerRef>;
}

impl ScriptWorld for BotRoster {
    fn creature_exists(&self, guid: ObjectGuid) -> bool {
        self.has_creature(guid)
    }

    fn find_player(&self, guid: ObjectGuid) -> Option<PlayerRef> {
        self.player(guid)
    }
}

pub type SharedWorld = Rc<RefCell<dyn ScriptWorld>>;

pub fn share(roster: BotRoster) -> SharedWorld {
    Rc::new(RefCell::new(roster))
}

/// Runs one operation for `creature`, borrowing the world for the call only.
pub(crate) fn invoke(
    world: &SharedWorld,
    dispatcher: &BotDispatcher,
    creature: ObjectGuid,
    operation: Operation,
    args: &[ArgValue],
) -> Result<Option<BotValue>, BotError> {
    let mut world = world.try_borrow_mut().map_err(|_| BotError::Operation {
        operation: operation.name(),
        message: "bot world is already borrowed".to_string(),
    })?;
    dispatcher
        .call(&mut *world, creature, operation, args)
        .map(Outcome::into_frame)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Guid from a script number. Negative or fractional values are rejected.
fn guid_from_arg(value: &ArgValue) -> Option<ObjectGuid> {
    match *value {
        ArgValue::Int(v) => u64::try_from(v).ok().map(ObjectGuid),
        ArgValue::Num(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Some(ObjectGuid(v as u64))
        }
        _ => None,
    }
}

/// Guids cross into scripts as signed integers with the same bit pattern.
/// LuaJIT keeps numbers as doubles, so only guids below 2^53 come back exact.
fn guid_to_int(guid: ObjectGuid) -> i64 {
    guid.raw() as i64
}

fn bad_guid(function: &str, value: &ArgValue) -> String {
    format!(
        "bad argument #1 to '{function}' (guid expected, got {})",
        value.type_name()
    )
}
