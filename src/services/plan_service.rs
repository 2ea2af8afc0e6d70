use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::config::PlanConfig;
use crate::database::models::{NewTripPlan, TripPlan};
use crate::database::repository::{BudgetRepository, DailyScheduleRepository, TripPlanRepository};
use crate::database::DatabaseError;
use crate::types::PlanRole;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Trip plan not found: {0}")]
    PlanNotFound(Uuid),
    #[error("Access denied to trip plan {0}")]
    AccessDenied(Uuid),
    #[error("User {user_id} is already a member of trip plan {plan_id}")]
    MemberAlreadyExists { plan_id: Uuid, user_id: Uuid },
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl PlanError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        PlanError::Validation { field, message: message.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub title: String,
    #[serde(default, alias = "total_plan_description")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub total_budget: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

pub struct PlanService {
    plans: Arc<dyn TripPlanRepository>,
    schedules: Arc<dyn DailyScheduleRepository>,
    budgets: Arc<dyn BudgetRepository>,
    limits: PlanConfig,
}

impl PlanService {
    pub fn new(
        plans: Arc<dyn TripPlanRepository>,
        schedules: Arc<dyn DailyScheduleRepository>,
        budgets: Arc<dyn BudgetRepository>,
        limits: PlanConfig,
    ) -> Self {
        Self {
            plans,
            schedules,
            budgets,
            limits,
        }
    }

    /// Create a plan with the caller as its owner
    pub async fn create(&self, request: CreatePlanRequest, caller: &AuthUser) -> Result<TripPlan, PlanError> {
        info!("Trip plan creation requested: user={}", caller.username);

        let new_plan = self.validate(request)?;
        let plan = self.plans.create(new_plan, caller.user_id).await?;

        info!("Trip plan created: plan_id={}, owner={}", plan.id, caller.username);
        Ok(plan)
    }

    /// Any member may read a plan
    pub async fn get(&self, plan_id: Uuid, caller: &AuthUser) -> Result<TripPlan, PlanError> {
        let plan = self.find(plan_id).await?;
        if !plan.is_member(caller.user_id) {
            error!("Trip plan read denied: plan_id={}, user={}", plan_id, caller.username);
            return Err(PlanError::AccessDenied(plan_id));
        }
        Ok(plan)
    }

    pub async fn list_mine(&self, caller: &AuthUser) -> Result<Vec<TripPlan>, PlanError> {
        let plans = self.plans.find_all_by_member(caller.user_id).await?;
        info!("Trip plans listed: user={}, count={}", caller.username, plans.len());
        Ok(plans)
    }

    /// Owner adds another user with the MEMBER role
    pub async fn add_member(&self, plan_id: Uuid, user_id: Uuid, caller: &AuthUser) -> Result<TripPlan, PlanError> {
        info!("Member add requested: plan_id={}, member={}, by={}", plan_id, user_id, caller.username);

        let plan = self.find(plan_id).await?;
        self.ensure_owner(&plan, caller)?;

        match self.plans.add_member(plan_id, user_id, PlanRole::Member).await {
            Ok(true) => {}
            Ok(false) => return Err(PlanError::MemberAlreadyExists { plan_id, user_id }),
            Err(DatabaseError::NotFound(_)) => return Err(PlanError::PlanNotFound(plan_id)),
            Err(e) => return Err(e.into()),
        }

        info!("Member added: plan_id={}, member={}", plan_id, user_id);
        self.find(plan_id).await
    }

    /// Owner removes the plan together with its daily plans and their budgets
    pub async fn delete(&self, plan_id: Uuid, caller: &AuthUser) -> Result<(), PlanError> {
        info!("Trip plan delete requested: plan_id={}, user={}", plan_id, caller.username);

        let plan = self.find(plan_id).await?;
        self.ensure_owner(&plan, caller)?;

        // Plan goes first so no generator can attach rows after the purge
        if !self.plans.delete(plan_id).await? {
            return Err(PlanError::PlanNotFound(plan_id));
        }
        let purged = self.schedules.delete_all_by_plan(plan_id).await?;
        let budgets = self.budgets.delete_all_by_plan(plan_id).await?;

        info!(
            "Trip plan deleted: plan_id={}, daily_plans_removed={}, budgets_removed={}",
            plan_id, purged, budgets
        );
        Ok(())
    }

    fn validate(&self, request: CreatePlanRequest) -> Result<NewTripPlan, PlanError> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(PlanError::invalid("title", "must not be blank"));
        }
        if title.chars().count() > self.limits.title_max_chars {
            return Err(PlanError::invalid(
                "title",
                format!("must be at most {} characters", self.limits.title_max_chars),
            ));
        }

        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(description) = &description {
            if description.chars().count() > self.limits.description_max_chars {
                return Err(PlanError::invalid(
                    "description",
                    format!("must be at most {} characters", self.limits.description_max_chars),
                ));
            }
        }

        if request.start_date > request.end_date {
            return Err(PlanError::invalid("end_date", "must not be before start_date"));
        }
        let days = (request.end_date - request.start_date).num_days() + 1;
        if days > self.limits.max_trip_days {
            return Err(PlanError::invalid(
                "end_date",
                format!("trip may span at most {} days", self.limits.max_trip_days),
            ));
        }

        if matches!(request.total_budget, Some(budget) if budget < 0) {
            return Err(PlanError::invalid("total_budget", "must not be negative"));
        }

        Ok(NewTripPlan {
            title,
            description,
            start_date: request.start_date,
            end_date: request.end_date,
            total_budget: request.total_budget,
        })
    }

    async fn find(&self, plan_id: Uuid) -> Result<TripPlan, PlanError> {
        self.plans.find_by_id(plan_id).await?.ok_or_else(|| {
            error!("Trip plan lookup failed: plan_id={}", plan_id);
            PlanError::PlanNotFound(plan_id)
        })
    }

    fn ensure_owner(&self, plan: &TripPlan, caller: &AuthUser) -> Result<(), PlanError> {
        if plan.is_owner(caller.user_id) {
            Ok(())
        } else {
            error!("Owner-only request denied: plan_id={}, user={}", plan.id, caller.username);
            Err(PlanError::AccessDenied(plan.id))
        }
    }
}
