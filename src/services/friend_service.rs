use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{Friendship, UserProfile};
use crate::database::repository::{FriendshipRepository, UserRepository};
use crate::database::DatabaseError;
use crate::types::FriendshipStatus;

#[derive(Debug, thiserror::Error)]
pub enum FriendError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),
    #[error("A friend request between these users already exists")]
    AlreadyRequested,
    #[error("No pending friend request from {0}")]
    RequestNotFound(Uuid),
    #[error("Cannot send a friend request to yourself")]
    SelfRequest,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Friend requests and the friend lists they produce
pub struct FriendService {
    users: Arc<dyn UserRepository>,
    friendships: Arc<dyn FriendshipRepository>,
}

impl FriendService {
    pub fn new(users: Arc<dyn UserRepository>, friendships: Arc<dyn FriendshipRepository>) -> Self {
        Self { users, friendships }
    }

    pub async fn send_request(&self, caller: &AuthUser, receiver_id: Uuid) -> Result<Friendship, FriendError> {
        info!("Friend request: from={}, to={}", caller.user_id, receiver_id);

        if receiver_id == caller.user_id {
            return Err(FriendError::SelfRequest);
        }
        self.users.upsert(caller.user_id, &caller.username).await?;
        self.find_user(receiver_id).await?;

        let inserted = match self.friendships.insert_if_open(caller.user_id, receiver_id).await {
            Ok(inserted) => inserted,
            Err(DatabaseError::NotFound(_)) => return Err(FriendError::UserNotFound(receiver_id)),
            Err(e) => return Err(e.into()),
        };
        let friendship = inserted.ok_or_else(|| {
            error!(
                "Friend request failed: {} and {} already have an open request",
                caller.user_id, receiver_id
            );
            FriendError::AlreadyRequested
        })?;

        info!("Friend request sent: friendship_id={}", friendship.id);
        Ok(friendship)
    }

    pub async fn accept(&self, caller: &AuthUser, sender_id: Uuid) -> Result<Friendship, FriendError> {
        self.respond(caller, sender_id, FriendshipStatus::Accepted).await
    }

    pub async fn reject(&self, caller: &AuthUser, sender_id: Uuid) -> Result<Friendship, FriendError> {
        self.respond(caller, sender_id, FriendshipStatus::Rejected).await
    }

    /// Users with a pending request to the caller, oldest request first
    pub async fn list_incoming(&self, caller: &AuthUser) -> Result<Vec<UserProfile>, FriendError> {
        let pending = self.friendships.find_incoming(caller.user_id).await?;
        let ids: Vec<Uuid> = pending.iter().map(|f| f.requester_id).collect();
        let profiles = self.profiles_in_order(&ids).await?;
        info!("Friend requests listed: user_id={}, count={}", caller.user_id, profiles.len());
        Ok(profiles)
    }

    pub async fn list_friends(&self, caller: &AuthUser) -> Result<Vec<UserProfile>, FriendError> {
        let accepted = self.friendships.find_accepted(caller.user_id).await?;
        let ids: Vec<Uuid> = accepted.iter().map(|f| f.counterpart(caller.user_id)).collect();
        let profiles = self.profiles_in_order(&ids).await?;
        info!("Friends listed: user_id={}, count={}", caller.user_id, profiles.len());
        Ok(profiles)
    }

    async fn respond(
        &self,
        caller: &AuthUser,
        sender_id: Uuid,
        status: FriendshipStatus,
    ) -> Result<Friendship, FriendError> {
        info!("Friend request answer: from={}, to={}, answer={}", sender_id, caller.user_id, status);
        self.find_user(sender_id).await?;

        let friendship = self
            .friendships
            .respond(sender_id, caller.user_id, status)
            .await?
            .ok_or_else(|| {
                error!("Friend request answer failed: nothing pending from {} to {}", sender_id, caller.user_id);
                FriendError::RequestNotFound(sender_id)
            })?;

        info!("Friend request answered: friendship_id={}, status={}", friendship.id, friendship.status);
        Ok(friendship)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<UserProfile, FriendError> {
        self.users.find_by_id(user_id).await?.ok_or_else(|| {
            error!("User lookup failed: user_id={}", user_id);
            FriendError::UserNotFound(user_id)
        })
    }

    async fn profiles_in_order(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>, FriendError> {
        let mut found: HashMap<Uuid, UserProfile> = self
            .users
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();
        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn request_then_accept_makes_friends_both_ways() {
        let ctx = TestContext::new();
        let mina = ctx.user("mina");
        let joon = ctx.user("joon");
        ctx.register(&joon).await;
        let service = ctx.friends();

        let request = service.send_request(&mina, joon.user_id).await.unwrap();
        assert_eq!(request.status, FriendshipStatus::Requested);

        let incoming = service.list_incoming(&joon).await.unwrap();
        assert_eq!(incoming.iter().map(|p| p.user_id).collect::<Vec<_>>(), vec![mina.user_id]);
        assert!(service.list_friends(&mina).await.unwrap().is_empty());

        let accepted = service.accept(&joon, mina.user_id).await.unwrap();
        assert_eq!(accepted.id, request.id);
        assert_eq!(accepted.status, FriendshipStatus::Accepted);

        assert!(service.list_incoming(&joon).await.unwrap().is_empty());
        assert_eq!(service.list_friends(&mina).await.unwrap()[0].user_id, joon.user_id);
        assert_eq!(service.list_friends(&joon).await.unwrap()[0].user_id, mina.user_id);
    }

    #[tokio::test]
    async fn duplicate_requests_are_refused() {
        let ctx = TestContext::new();
        let mina = ctx.user("mina");
        let joon = ctx.user("joon");
        ctx.register(&joon).await;
        let service = ctx.friends();

        service.send_request(&mina, joon.user_id).await.unwrap();
        assert!(matches!(
            service.send_request(&mina, joon.user_id).await,
            Err(FriendError::AlreadyRequested)
        ));
        assert!(matches!(
            service.send_request(&joon, mina.user_id).await,
            Err(FriendError::AlreadyRequested)
        ));

        service.accept(&joon, mina.user_id).await.unwrap();
        assert!(matches!(
            service.send_request(&mina, joon.user_id).await,
            Err(FriendError::AlreadyRequested)
        ));
    }

    #[tokio::test]
    async fn rejected_request_can_be_sent_again() {
        let ctx = TestContext::new();
        let mina = ctx.user("mina");
        let joon = ctx.user("joon");
        ctx.register(&joon).await;
        let service = ctx.friends();

        service.send_request(&mina, joon.user_id).await.unwrap();
        let rejected = service.reject(&joon, mina.user_id).await.unwrap();
        assert_eq!(rejected.status, FriendshipStatus::Rejected);
        assert!(matches!(
            service.accept(&joon, mina.user_id).await,
            Err(FriendError::RequestNotFound(id)) if id == mina.user_id
        ));

        assert!(service.send_request(&mina, joon.user_id).await.is_ok());
        assert_eq!(service.list_incoming(&joon).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_users_and_self_requests() {
        let ctx = TestContext::new();
        let mina = ctx.user("mina");
        let ghost = Uuid::new_v4();
        let service = ctx.friends();

        assert!(matches!(
            service.send_request(&mina, ghost).await,
            Err(FriendError::UserNotFound(id)) if id == ghost
        ));
        assert!(matches!(
            service.send_request(&mina, mina.user_id).await,
            Err(FriendError::SelfRequest)
        ));
        assert!(matches!(
            service.accept(&mina, ghost).await,
            Err(FriendError::UserNotFound(_))
        ));

        // the receiver answering a request that was never sent
        let joon = ctx.user("joon");
        ctx.register(&joon).await;
        assert!(matches!(
            service.reject(&mina, joon.user_id).await,
            Err(FriendError::RequestNotFound(_))
        ));
    }
}
