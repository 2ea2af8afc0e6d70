use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::config::PlanConfig;
use crate::database::memory::{
    MemoryBudgetRepository, MemoryDailyScheduleRepository, MemoryFriendshipRepository, MemoryLocationRepository,
    MemoryTripPlanRepository, MemoryUserRepository,
};
use crate::database::models::{Budget, BudgetFilter, DailySchedule, NewTripPlan, TripPlan};
use crate::database::repository::{BudgetRepository, DailyScheduleRepository, TripPlanRepository, UserRepository};
use crate::services::{BudgetService, FriendService, LocationService, PlanService, ScheduleService, UserService};
use crate::types::PlanRole;

/// Parse an ISO date, panicking on malformed test input
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|e| panic!("bad test date {}: {}", s, e))
}

/// In-memory stores shared by every service built from one context
pub struct TestContext {
    plans: Arc<MemoryTripPlanRepository>,
    schedules: Arc<MemoryDailyScheduleRepository>,
    budgets: Arc<MemoryBudgetRepository>,
    locations: Arc<MemoryLocationRepository>,
    users: Arc<MemoryUserRepository>,
    friendships: Arc<MemoryFriendshipRepository>,
}

impl TestContext {
    pub fn new() -> Self {
        let plans = Arc::new(MemoryTripPlanRepository::new());
        Self {
            schedules: Arc::new(MemoryDailyScheduleRepository::new(plans.clone())),
            budgets: Arc::new(MemoryBudgetRepository::new(plans.clone())),
            plans,
            locations: Arc::new(MemoryLocationRepository::new()),
            users: Arc::new(MemoryUserRepository::new()),
            friendships: Arc::new(MemoryFriendshipRepository::new()),
        }
    }

    pub fn schedules(&self) -> ScheduleService {
        ScheduleService::new(self.plans.clone(), self.schedules.clone())
    }

    pub fn plans(&self) -> PlanService {
        PlanService::new(
            self.plans.clone(),
            self.schedules.clone(),
            self.budgets.clone(),
            PlanConfig::default(),
        )
    }

    pub fn budgets(&self) -> BudgetService {
        BudgetService::new(self.plans.clone(), self.schedules.clone(), self.budgets.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.users.clone())
    }

    pub fn friends(&self) -> FriendService {
        FriendService::new(self.users.clone(), self.friendships.clone())
    }

    pub fn locations(&self) -> LocationService {
        LocationService::new(self.locations.clone())
    }

    /// A fresh caller identity
    pub fn user(&self, username: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
        }
    }

    /// Store a plan owned by `owner`, bypassing request validation
    pub async fn seed_plan(&self, owner: &AuthUser, start: &str, end: &str) -> TripPlan {
        self.plans
            .create(
                NewTripPlan {
                    title: format!("{}'s trip", owner.username),
                    description: None,
                    start_date: date(start),
                    end_date: date(end),
                    total_budget: None,
                },
                owner.user_id,
            )
            .await
            .expect("seed plan")
    }

    /// Rows held by the schedule store for a plan, whether or not the plan still exists
    pub async fn stored_schedules(&self, plan_id: Uuid) -> Vec<DailySchedule> {
        self.schedules.find_all_by_plan(plan_id).await.expect("read schedules")
    }

    /// Budgets held for a plan, whether or not the plan still exists
    pub async fn stored_budgets(&self, plan_id: Uuid) -> Vec<Budget> {
        self.budgets
            .find_by_plan(plan_id, BudgetFilter::default())
            .await
            .expect("read budgets")
    }

    /// Make the user known to the profile store, as their first authenticated call would
    pub async fn register(&self, user: &AuthUser) {
        self.users.upsert(user.user_id, &user.username).await.expect("register user");
    }

    pub async fn add_member(&self, plan: &TripPlan, user: &AuthUser) {
        let added = self
            .plans
            .add_member(plan.id, user.user_id, PlanRole::Member)
            .await
            .expect("add member");
        assert!(added, "{} was already a member", user.username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn services_share_one_store() {
        let ctx = TestContext::new();
        let owner = ctx.user("owner");
        let plan = ctx.seed_plan(&owner, "2025-06-01", "2025-06-02").await;

        assert_eq!(ctx.plans().get(plan.id, &owner).await.unwrap().id, plan.id);
        assert_eq!(ctx.schedules().generate(plan.id, &owner).await.unwrap().len(), 3);
    }

    #[test]
    fn user_ids_are_unique() {
        let ctx = TestContext::new();
        assert_ne!(ctx.user("a").user_id, ctx.user("a").user_id);
    }
}
