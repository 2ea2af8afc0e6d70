use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Budget, BudgetDraft, BudgetFilter, DailySchedule, Friendship, Location, LocationDraft, NewTripPlan,
    ScheduleDraft, TripPlan, UserProfile,
};
use crate::types::{FriendshipStatus, LocationType, PlanRole};

/// Store access for trip plans and their membership
#[async_trait]
pub trait TripPlanRepository: Send + Sync {
    /// Persist the plan and its single owner in one unit
    async fn create(&self, plan: NewTripPlan, owner: Uuid) -> Result<TripPlan, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TripPlan>, DatabaseError>;

    /// Plans on which the user holds any role, ordered by start date
    async fn find_all_by_member(&self, user_id: Uuid) -> Result<Vec<TripPlan>, DatabaseError>;

    /// Returns false when the user already holds a role on the plan
    async fn add_member(&self, plan_id: Uuid, user_id: Uuid, role: PlanRole) -> Result<bool, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

/// Outcome of a guarded batch insert
#[derive(Debug)]
pub enum BatchInsert {
    Inserted(Vec<DailySchedule>),
    AlreadyExists,
}

/// Store access for daily schedule rows
#[async_trait]
pub trait DailyScheduleRepository: Send + Sync {
    /// Insert every draft for the plan, unless an active row already references it.
    /// The check and the insert share one transaction: concurrent callers for the
    /// same plan see exactly one `Inserted`.
    async fn insert_batch_if_absent(
        &self,
        plan_id: Uuid,
        drafts: &[ScheduleDraft],
    ) -> Result<BatchInsert, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DailySchedule>, DatabaseError>;

    /// All rows of a plan, active and deleted, ordered by day number then date
    async fn find_all_by_plan(&self, plan_id: Uuid) -> Result<Vec<DailySchedule>, DatabaseError>;

    /// Write date, day number and updated_at back to the row while it is still active.
    /// Status is never written here. Returns false when no active row has the id.
    async fn update(&self, schedule: &DailySchedule) -> Result<bool, DatabaseError>;

    /// Mark an active row deleted. Returns false when no active row has the id.
    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DatabaseError>;

    async fn delete_all_by_plan(&self, plan_id: Uuid) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, draft: LocationDraft) -> Result<Location, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, DatabaseError>;

    async fn find_all(&self) -> Result<Vec<Location>, DatabaseError>;

    async fn find_by_type(&self, location_type: LocationType) -> Result<Vec<Location>, DatabaseError>;

    /// Country is fixed at creation and is not rewritten here
    async fn update(&self, id: Uuid, draft: LocationDraft) -> Result<Option<Location>, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

/// Outcome of a nickname change
#[derive(Debug)]
pub enum NicknameChange {
    Changed(UserProfile),
    /// Another user already holds the nickname
    Taken,
    UnknownUser,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register the user on first sight; later calls refresh the username only
    async fn upsert(&self, user_id: Uuid, username: &str) -> Result<UserProfile, DatabaseError>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, DatabaseError>;

    /// Profiles for the ids that exist, in no particular order
    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<UserProfile>, DatabaseError>;

    async fn nickname_taken(&self, nickname: &str) -> Result<bool, DatabaseError>;

    /// Nickname check and write are one step, so two users cannot claim the same name
    async fn update_nickname(&self, user_id: Uuid, nickname: &str) -> Result<NicknameChange, DatabaseError>;
}

#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// Record a REQUESTED row unless the pair already has a REQUESTED or ACCEPTED row
    /// in either direction. Returns None in that case.
    async fn insert_if_open(&self, requester_id: Uuid, receiver_id: Uuid) -> Result<Option<Friendship>, DatabaseError>;

    /// Move a pending request from `requester_id` to `receiver_id` into `status`.
    /// Returns None when no such request is pending.
    async fn respond(
        &self,
        requester_id: Uuid,
        receiver_id: Uuid,
        status: FriendshipStatus,
    ) -> Result<Option<Friendship>, DatabaseError>;

    /// Pending requests addressed to the user, oldest first
    async fn find_incoming(&self, receiver_id: Uuid) -> Result<Vec<Friendship>, DatabaseError>;

    /// Accepted pairs the user is part of, oldest first
    async fn find_accepted(&self, user_id: Uuid) -> Result<Vec<Friendship>, DatabaseError>;
}

#[async_trait]
pub trait BudgetRepository: Send + Sync {
    /// Fails with NotFound when the plan or the daily plan is gone
    async fn create(&self, plan_id: Uuid, draft: BudgetDraft) -> Result<Budget, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Budget>, DatabaseError>;

    /// Budgets of a plan in creation order, narrowed by the filter
    async fn find_by_plan(&self, plan_id: Uuid, filter: BudgetFilter) -> Result<Vec<Budget>, DatabaseError>;

    async fn update(&self, id: Uuid, draft: BudgetDraft) -> Result<Option<Budget>, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn delete_all_by_plan(&self, plan_id: Uuid) -> Result<u64, DatabaseError>;
}
