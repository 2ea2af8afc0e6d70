//! Shared enumerations used by models, stores and the API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a user holds within a single trip plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanRole {
    Owner,
    Member,
}

/// Lifecycle of a daily schedule row. Deleted is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Active,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Accommodation,
    Restaurant,
    Attraction,
    Transport,
    Etc,
}

/// Category of a budget line: money set aside, or money already spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetType {
    Planned,
    Spent,
}

/// State of a friend request between two users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendshipStatus {
    Requested,
    Accepted,
    Rejected,
}

/// Raised when a stored text column holds a value no enum variant matches
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// Stored as upper-case text columns; these mirror the serde names.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(PlanRole, "plan role", {
    Owner => "OWNER",
    Member => "MEMBER",
});

text_enum!(ScheduleStatus, "schedule status", {
    Active => "ACTIVE",
    Deleted => "DELETED",
});

text_enum!(LocationType, "location type", {
    Accommodation => "ACCOMMODATION",
    Restaurant => "RESTAURANT",
    Attraction => "ATTRACTION",
    Transport => "TRANSPORT",
    Etc => "ETC",
});

text_enum!(BudgetType, "budget type", {
    Planned => "PLANNED",
    Spent => "SPENT",
});

text_enum!(FriendshipStatus, "friendship status", {
    Requested => "REQUESTED",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
});
