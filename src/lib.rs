//! Scripting bridge for NPC bots: a capability-gated command surface over the
//! game engine and the bot AI, exposed to Lua and Rhai scripts.

pub mod capability;
pub mod coerce;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod projection;
pub mod roster;
pub mod scripting;

pub use coerce::ArgValue;
pub use command::{Command, Operation};
pub use config::{BridgeConfig, ScriptHost};
pub use dispatch::BotDispatcher;
pub use engine::{BotWorld, ObjectGuid};
pub use error::{BotError, ErrorKind};
pub use projection::{BotValue, Outcome};
pub use roster::BotRoster;
