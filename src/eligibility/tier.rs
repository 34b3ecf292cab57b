//! Membership tiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority class of a member relative to one event.
///
/// Stored as its number: 1 = roster, 2 = first priority, 3 = second priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    Roster = 1,
    FirstPriority = 2,
    SecondPriority = 3,
}

impl Tier {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.as_u8()
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Roster),
            2 => Ok(Tier::FirstPriority),
            3 => Ok(Tier::SecondPriority),
            other => Err(format!("invalid tier: {}", other)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
