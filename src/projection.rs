//! Native results and the 0-or-1 value frame handed back to hosts.

use crate::engine::{ItemRef, ObjectGuid, PlayerRef};

#[derive(Clone, Debug, PartialEq)]
pub enum BotValue {
    Bool(bool),
    Integer(i64),
    Float(f32),
    Guid(ObjectGuid),
    Player(PlayerRef),
    Item(ItemRef),
    Text(String),
}

impl From<bool> for BotValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u8> for BotValue {
    fn from(value: u8) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for BotValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f32> for BotValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<ObjectGuid> for BotValue {
    fn from(value: ObjectGuid) -> Self {
        Self::Guid(value)
    }
}

impl From<PlayerRef> for BotValue {
    fn from(value: PlayerRef) -> Self {
        Self::Player(value)
    }
}

impl From<ItemRef> for BotValue {
    fn from(value: ItemRef) -> Self {
        Self::Item(value)
    }
}

impl From<String> for BotValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Result of a dispatched call that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Not a bot, or a free bot where an owner is required. Projects to zero values.
    NotApplicable,
    Value(BotValue),
}

impl Outcome {
    pub fn value(value: impl Into<BotValue>) -> Self {
        Self::Value(value.into())
    }

    /// `None` and `Some` values project to an empty frame and a one-value frame.
    pub fn optional<T: Into<BotValue>>(value: Option<T>) -> Self {
        value.map_or(Self::NotApplicable, Self::value)
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn into_frame(self) -> Option<BotValue> {
        match self {
            Self::NotApplicable => None,
            Self::Value(value) => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_stay_booleans() {
        assert_eq!(Outcome::value(false).into_frame(), Some(BotValue::Bool(false)));
    }

    #[test]
    fn missing_optional_values_are_not_applicable() {
        assert_eq!(Outcome::optional::<ItemRef>(None), Outcome::NotApplicable);
        assert!(!Outcome::NotApplicable.is_applicable());
        assert_eq!(Outcome::NotApplicable.into_frame(), None);
        let guid = Outcome::optional(Some(ObjectGuid(4)));
        assert_eq!(guid.into_frame(), Some(BotValue::Guid(ObjectGuid(4))));
    }
}
