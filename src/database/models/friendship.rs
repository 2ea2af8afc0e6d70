use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{FriendshipStatus, UnknownVariant};

/// A friend request from `requester_id` to `receiver_id` and its answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    pub fn involves(&self, a: Uuid, b: Uuid) -> bool {
        (self.requester_id == a && self.receiver_id == b) || (self.requester_id == b && self.receiver_id == a)
    }

    /// The other side of the pair, seen from `user_id`
    pub fn counterpart(&self, user_id: Uuid) -> Uuid {
        if self.requester_id == user_id {
            self.receiver_id
        } else {
            self.requester_id
        }
    }

    /// Pending or accepted; a rejected request no longer blocks a new one
    pub fn is_open(&self) -> bool {
        matches!(self.status, FriendshipStatus::Requested | FriendshipStatus::Accepted)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FriendshipRow {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FriendshipRow> for Friendship {
    type Error = UnknownVariant;

    fn try_from(row: FriendshipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            requester_id: row.requester_id,
            receiver_id: row.receiver_id,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_symmetric() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        let request = Friendship {
            id: Uuid::new_v4(),
            requester_id: a,
            receiver_id: b,
            status: FriendshipStatus::Requested,
            created_at: now,
            updated_at: now,
        };

        assert!(request.involves(b, a));
        assert!(!request.involves(a, Uuid::new_v4()));
        assert_eq!(request.counterpart(a), b);
        assert_eq!(request.counterpart(b), a);
        assert!(request.is_open());
        assert!(!Friendship { status: FriendshipStatus::Rejected, ..request }.is_open());
    }
}
