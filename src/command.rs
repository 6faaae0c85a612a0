use crate::coerce::{ItemArg, Param, FIRST_ARG_POSITION};
use crate::engine::BotStatMod;

/// Every operation exposed to scripts, named the way scripts call them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    IsNpcBot,
    GetBotOwner,
    GetBotOwnerGuid,
    GetBotClass,
    GetBotRoles,
    IsBotTank,
    IsBotOffTank,
    IsFreeBot,
    GetBotAverageItemLevel,
    GetBotEquipment,
    GetBotStat,
    GetTalentSpec,
    BotEquipItem,
    BotCanEquipItem,
    BotUnequipItem,
    GetBotDump,
}

impl Operation {
    pub const ALL: [Operation; 16] = [
        Operation::IsNpcBot,
        Operation::GetBotOwner,
        Operation::GetBotOwnerGuid,
        Operation::GetBotClass,
        Operation::GetBotRoles,
        Operation::IsBotTank,
        Operation::IsBotOffTank,
        Operation::IsFreeBot,
        Operation::GetBotAverageItemLevel,
        Operation::GetBotEquipment,
        Operation::GetBotStat,
        Operation::GetTalentSpec,
        Operation::BotEquipItem,
        Operation::BotCanEquipItem,
        Operation::BotUnequipItem,
        Operation::GetBotDump,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::IsNpcBot => "IsNPCBot",
            Self::GetBotOwner => "GetBotOwner",
            Self::GetBotOwnerGuid => "GetBotOwnerGUID",
            Self::GetBotClass => "GetBotClass",
            Self::GetBotRoles => "GetBotRoles",
            Self::IsBotTank => "IsBotTank",
            Self::IsBotOffTank => "IsBotOffTank",
            Self::IsFreeBot => "IsFreeBot",
            Self::GetBotAverageItemLevel => "GetBotAverageItemLevel",
            Self::GetBotEquipment => "GetBotEquipment",
            Self::GetBotStat => "GetBotStat",
            Self::GetTalentSpec => "GetTalentSpec",
            Self::BotEquipItem => "BotEquipItem",
            Self::BotCanEquipItem => "BotCanEquipItem",
            Self::BotUnequipItem => "BotUnequipItem",
            Self::GetBotDump => "GetBotDump",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Declared argument shape, not counting the creature itself.
    pub fn shape(self) -> &'static [Param] {
        match self {
            Self::GetBotEquipment | Self::BotUnequipItem => &[Param::Slot],
            Self::GetBotStat => &[Param::StatCode],
            Self::BotEquipItem => &[Param::Item, Param::Slot],
            Self::BotCanEquipItem => &[Param::ItemEntry, Param::Slot],
            _ => &[],
        }
    }

    /// Call-frame position of the first `param` in this operation's shape.
    pub fn position_of(self, param: Param) -> usize {
        self.shape()
            .iter()
            .position(|p| *p == param)
            .map_or(FIRST_ARG_POSITION, |index| index + FIRST_ARG_POSITION)
    }

    /// Operations that only make sense for a bot with an owner.
    pub fn requires_owner(self) -> bool {
        matches!(
            self,
            Self::GetBotEquipment | Self::BotEquipItem | Self::BotUnequipItem
        )
    }

    /// Human-readable signature, e.g. `BotEquipItem(item, uint32)`.
    pub fn signature(self) -> String {
        let params: Vec<&str> = self.shape().iter().map(|p| p.type_name()).collect();
        format!("{}({})", self.name(), params.join(", "))
    }
}

/// A fully coerced call, ready for dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    IsNpcBot,
    GetBotOwner,
    GetBotOwnerGuid,
    GetBotClass,
    GetBotRoles,
    IsBotTank,
    IsBotOffTank,
    IsFreeBot,
    GetBotAverageItemLevel,
    GetBotEquipment { slot: u32 },
    GetBotStat { stat: BotStatMod },
    GetTalentSpec,
    BotEquipItem { item: ItemArg, slot: u32 },
    BotCanEquipItem { entry: u32, slot: u32 },
    BotUnequipItem { slot: u32 },
    GetBotDump,
}

impl Command {
    pub fn operation(&self) -> Operation {
        match self {
            Self::IsNpcBot => Operation::IsNpcBot,
            Self::GetBotOwner => Operation::GetBotOwner,
            Self::GetBotOwnerGuid => Operation::GetBotOwnerGuid,
            Self::GetBotClass => Operation::GetBotClass,
            Self::GetBotRoles => Operation::GetBotRoles,
            Self::IsBotTank => Operation::IsBotTank,
            Self::IsBotOffTank => Operation::IsBotOffTank,
            Self::IsFreeBot => Operation::IsFreeBot,
            Self::GetBotAverageItemLevel => Operation::GetBotAverageItemLevel,
            Self::GetBotEquipment { .. } => Operation::GetBotEquipment,
            Self::GetBotStat { .. } => Operation::GetBotStat,
            Self::GetTalentSpec => Operation::GetTalentSpec,
            Self::BotEquipItem { .. } => Operation::BotEquipItem,
            Self::BotCanEquipItem { .. } => Operation::BotCanEquipItem,
            Self::BotUnequipItem { .. } => Operation::BotUnequipItem,
            Self::GetBotDump => Operation::GetBotDump,
        }
    }
}
