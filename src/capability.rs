//! Entity capability checks and the bot guard.
//!
//! The AI handle of a creature is only reachable through [`ConfirmedBot`],
//! which can only be built by a successful bot-ness check.

use tracing::warn;

use crate::command::Operation;
use crate::engine::{BotAi, EntityAccessor, ObjectGuid, PlayerRef};
use crate::error::BotError;

pub fn is_bot<W: EntityAccessor + ?Sized>(world: &W, creature: ObjectGuid) -> bool {
    world.is_npc_bot(creature)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ownership {
    Free,
    Owned(PlayerRef),
}

impl Ownership {
    pub fn owner(&self) -> Option<&PlayerRef> {
        match self {
            Self::Free => None,
            Self::Owned(player) => Some(player),
        }
    }
}

/// Proof that a creature was a bot when the guard was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedBot {
    guid: ObjectGuid,
}

impl ConfirmedBot {
    pub fn confirm<W: EntityAccessor + ?Sized>(world: &W, creature: ObjectGuid) -> Option<Self> {
        is_bot(world, creature).then_some(Self { guid: creature })
    }

    pub fn guid(&self) -> ObjectGuid {
        self.guid
    }

    pub fn ownership<W: EntityAccessor + ?Sized>(&self, world: &W) -> Ownership {
        if world.is_free_bot(self.guid) {
            return Ownership::Free;
        }
        match world.bot_owner(self.guid) {
            Some(owner) => Ownership::Owned(owner),
            None => {
                warn!(creature = %self.guid, "bot is not free but has no owner; treating as free");
                Ownership::Free
            }
        }
    }

    pub fn ai<'w, W: EntityAccessor + ?Sized>(
        &self,
        world: &'w W,
        operation: Operation,
    ) -> Result<&'w dyn BotAi, BotError> {
        world
            .bot_ai(self.guid)
            .ok_or_else(|| missing_ai(operation, self.guid))
    }

    pub fn ai_mut<'w, W: EntityAccessor + ?Sized>(
        &self,
        world: &'w mut W,
        operation: Operation,
    ) -> Result<Box<dyn BotAi + 'w>, BotError> {
        world
            .bot_ai_mut(self.guid)
            .ok_or_else(|| missing_ai(operation, self.guid))
    }
}

fn missing_ai(operation: Operation, creature: ObjectGuid) -> BotError {
    BotError::Operation {
        operation: operation.name(),
        message: format!("bot AI handle unavailable for creature {creature}"),
    }
}
