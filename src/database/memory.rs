//! In-process store used by tests and by `STORE_BACKEND=memory`.
//!
//! Each repository guards its data with a single `RwLock`; a guarded batch insert
//! runs entirely under the write lock, which gives the same all-or-nothing and
//! one-winner behaviour the PostgreSQL transaction provides.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Budget, BudgetDraft, BudgetFilter, DailySchedule, Friendship, Location, LocationDraft, NewTripPlan,
    ScheduleDraft, TripPlan, UserProfile,
};
use crate::database::repository::{
    BatchInsert, BudgetRepository, DailyScheduleRepository, FriendshipRepository, LocationRepository,
    NicknameChange, TripPlanRepository, UserRepository,
};
use crate::types::{FriendshipStatus, LocationType, PlanRole, ScheduleStatus};

#[derive(Default)]
pub struct MemoryTripPlanRepository {
    plans: RwLock<HashMap<Uuid, TripPlan>>,
}

impl MemoryTripPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TripPlanRepository for MemoryTripPlanRepository {
    async fn create(&self, plan: NewTripPlan, owner: Uuid) -> Result<TripPlan, DatabaseError> {
        let now = Utc::now();
        let created = TripPlan {
            id: Uuid::new_v4(),
            title: plan.title,
            description: plan.description,
            start_date: plan.start_date,
            end_date: plan.end_date,
            total_budget: plan.total_budget,
            members: HashMap::from([(owner, PlanRole::Owner)]),
            created_at: now,
            updated_at: now,
        };

        self.plans.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TripPlan>, DatabaseError> {
        Ok(self.plans.read().await.get(&id).cloned())
    }

    async fn find_all_by_member(&self, user_id: Uuid) -> Result<Vec<TripPlan>, DatabaseError> {
        let plans = self.plans.read().await;
        let mut found: Vec<TripPlan> = plans
            .values()
            .filter(|plan| plan.is_member(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.created_at.cmp(&b.created_at)));
        Ok(found)
    }

    async fn add_member(&self, plan_id: Uuid, user_id: Uuid, role: PlanRole) -> Result<bool, DatabaseError> {
        let mut plans = self.plans.write().await;
        let plan = plans
            .get_mut(&plan_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("trip plan {}", plan_id)))?;

        if plan.members.contains_key(&user_id) {
            return Ok(false);
        }
        plan.members.insert(user_id, role);
        plan.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.plans.write().await.remove(&id).is_some())
    }
}

pub struct MemoryDailyScheduleRepository {
    rows: RwLock<Vec<DailySchedule>>,
    plans: Arc<MemoryTripPlanRepository>,
}

impl MemoryDailyScheduleRepository {
    /// Rows are only inserted for plans present in `plans`
    pub fn new(plans: Arc<MemoryTripPlanRepository>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            plans,
        }
    }
}

#[async_trait]
impl DailyScheduleRepository for MemoryDailyScheduleRepository {
    async fn insert_batch_if_absent(
        &self,
        plan_id: Uuid,
        drafts: &[ScheduleDraft],
    ) -> Result<BatchInsert, DatabaseError> {
        let mut rows = self.rows.write().await;

        // Held until the rows are in, so a concurrent plan delete purges them afterwards
        let plans = self.plans.plans.read().await;
        if !plans.contains_key(&plan_id) {
            return Err(DatabaseError::NotFound(format!("trip plan {}", plan_id)));
        }

        if rows.iter().any(|row| row.plan_id == plan_id && row.is_active()) {
            return Ok(BatchInsert::AlreadyExists);
        }

        let now = Utc::now();
        let inserted: Vec<DailySchedule> = drafts
            .iter()
            .map(|draft| DailySchedule::from_draft(plan_id, draft, now))
            .collect();
        rows.extend(inserted.iter().cloned());

        Ok(BatchInsert::Inserted(inserted))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DailySchedule>, DatabaseError> {
        Ok(self.rows.read().await.iter().find(|row| row.id == id).cloned())
    }

    async fn find_all_by_plan(&self, plan_id: Uuid) -> Result<Vec<DailySchedule>, DatabaseError> {
        let rows = self.rows.read().await;
        let mut found: Vec<DailySchedule> = rows.iter().filter(|row| row.plan_id == plan_id).cloned().collect();
        found.sort_by_key(|row| (row.trip_day_number, row.date));
        Ok(found)
    }

    async fn update(&self, schedule: &DailySchedule) -> Result<bool, DatabaseError> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|row| row.id == schedule.id && row.is_active()) else {
            return Ok(false);
        };

        row.date = schedule.date;
        row.trip_day_number = schedule.trip_day_number;
        row.updated_at = schedule.updated_at;
        Ok(true)
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|row| row.id == id && row.is_active()) {
            Some(row) => {
                row.status = ScheduleStatus::Deleted;
                row.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all_by_plan(&self, plan_id: Uuid) -> Result<u64, DatabaseError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.plan_id != plan_id);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryLocationRepository {
    locations: RwLock<HashMap<Uuid, Location>>,
}

impl MemoryLocationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_creation(mut locations: Vec<Location>) -> Vec<Location> {
    locations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    locations
}

#[async_trait]
impl LocationRepository for MemoryLocationRepository {
    async fn create(&self, draft: LocationDraft) -> Result<Location, DatabaseError> {
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            country: draft.country,
            city: draft.city,
            district: draft.district,
            address: draft.address,
            latitude: draft.latitude,
            longitude: draft.longitude,
            location_type: draft.location_type,
            created_at: now,
            updated_at: now,
        };

        self.locations.write().await.insert(location.id, location.clone());
        Ok(location)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, DatabaseError> {
        Ok(self.locations.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Location>, DatabaseError> {
        let locations = self.locations.read().await;
        Ok(sorted_by_creation(locations.values().cloned().collect()))
    }

    async fn find_by_type(&self, location_type: LocationType) -> Result<Vec<Location>, DatabaseError> {
        let locations = self.locations.read().await;
        Ok(sorted_by_creation(
            locations
                .values()
                .filter(|l| l.location_type == location_type)
                .cloned()
                .collect(),
        ))
    }

    async fn update(&self, id: Uuid, draft: LocationDraft) -> Result<Option<Location>, DatabaseError> {
        let mut locations = self.locations.write().await;
        let Some(location) = locations.get_mut(&id) else {
            return Ok(None);
        };

        location.city = draft.city;
        location.district = draft.district;
        location.address = draft.address;
        location.latitude = draft.latitude;
        location.longitude = draft.longitude;
        location.location_type = draft.location_type;
        location.updated_at = Utc::now();
        Ok(Some(location.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.locations.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, UserProfile>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn upsert(&self, user_id: Uuid, username: &str) -> Result<UserProfile, DatabaseError> {
        let mut users = self.users.write().await;
        let now = Utc::now();
        let profile = users.entry(user_id).or_insert_with(|| UserProfile {
            user_id,
            username: username.to_string(),
            nickname: None,
            created_at: now,
            updated_at: now,
        });
        profile.username = username.to_string();
        Ok(profile.clone())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, DatabaseError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<UserProfile>, DatabaseError> {
        let users = self.users.read().await;
        Ok(user_ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn nickname_taken(&self, nickname: &str) -> Result<bool, DatabaseError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .any(|u| u.nickname.as_deref() == Some(nickname)))
    }

    async fn update_nickname(&self, user_id: Uuid, nickname: &str) -> Result<NicknameChange, DatabaseError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.user_id != user_id && u.nickname.as_deref() == Some(nickname))
        {
            return Ok(NicknameChange::Taken);
        }

        let Some(profile) = users.get_mut(&user_id) else {
            return Ok(NicknameChange::UnknownUser);
        };
        profile.nickname = Some(nickname.to_string());
        profile.updated_at = Utc::now();
        Ok(NicknameChange::Changed(profile.clone()))
    }
}

#[derive(Default)]
pub struct MemoryFriendshipRepository {
    rows: RwLock<Vec<Friendship>>,
}

impl MemoryFriendshipRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FriendshipRepository for MemoryFriendshipRepository {
    async fn insert_if_open(&self, requester_id: Uuid, receiver_id: Uuid) -> Result<Option<Friendship>, DatabaseError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|f| f.involves(requester_id, receiver_id) && f.is_open()) {
            return Ok(None);
        }

        let now = Utc::now();
        let friendship = Friendship {
            id: Uuid::new_v4(),
            requester_id,
            receiver_id,
            status: FriendshipStatus::Requested,
            created_at: now,
            updated_at: now,
        };
        rows.push(friendship.clone());
        Ok(Some(friendship))
    }

    async fn respond(
        &self,
        requester_id: Uuid,
        receiver_id: Uuid,
        status: FriendshipStatus,
    ) -> Result<Option<Friendship>, DatabaseError> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|f| {
            f.requester_id == requester_id && f.receiver_id == receiver_id && f.status == FriendshipStatus::Requested
        }) else {
            return Ok(None);
        };

        row.status = status;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn find_incoming(&self, receiver_id: Uuid) -> Result<Vec<Friendship>, DatabaseError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|f| f.receiver_id == receiver_id && f.status == FriendshipStatus::Requested)
            .cloned()
            .collect())
    }

    async fn find_accepted(&self, user_id: Uuid) -> Result<Vec<Friendship>, DatabaseError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|f| (f.requester_id == user_id || f.receiver_id == user_id) && f.status == FriendshipStatus::Accepted)
            .cloned()
            .collect())
    }
}

/// Budget lines in insertion order; inserts confirm the plan under its lock like daily schedules do
pub struct MemoryBudgetRepository {
    rows: RwLock<Vec<Budget>>,
    plans: Arc<MemoryTripPlanRepository>,
}

impl MemoryBudgetRepository {
    pub fn new(plans: Arc<MemoryTripPlanRepository>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            plans,
        }
    }
}

#[async_trait]
impl BudgetRepository for MemoryBudgetRepository {
    async fn create(&self, plan_id: Uuid, draft: BudgetDraft) -> Result<Budget, DatabaseError> {
        let mut rows = self.rows.write().await;
        if !self.plans.plans.read().await.contains_key(&plan_id) {
            return Err(DatabaseError::NotFound(format!("trip plan {}", plan_id)));
        }

        let now = Utc::now();
        let budget = Budget {
            id: Uuid::new_v4(),
            plan_id,
            daily_plan_id: draft.daily_plan_id,
            category: draft.category,
            name: draft.name,
            amount: draft.amount,
            budget_type: draft.budget_type,
            created_at: now,
            updated_at: now,
        };
        rows.push(budget.clone());
        Ok(budget)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Budget>, DatabaseError> {
        Ok(self.rows.read().await.iter().find(|b| b.id == id).cloned())
    }

    async fn find_by_plan(&self, plan_id: Uuid, filter: BudgetFilter) -> Result<Vec<Budget>, DatabaseError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|b| b.plan_id == plan_id && filter.matches(b))
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, draft: BudgetDraft) -> Result<Option<Budget>, DatabaseError> {
        let mut rows = self.rows.write().await;
        let Some(budget) = rows.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };

        budget.daily_plan_id = draft.daily_plan_id;
        budget.category = draft.category;
        budget.name = draft.name;
        budget.amount = draft.amount;
        budget.budget_type = draft.budget_type;
        budget.updated_at = Utc::now();
        Ok(Some(budget.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|b| b.id != id);
        Ok(rows.len() < before)
    }

    async fn delete_all_by_plan(&self, plan_id: Uuid) -> Result<u64, DatabaseError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|b| b.plan_id != plan_id);
        Ok((before - rows.len()) as u64)
    }
}
