use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{Budget, BudgetDraft, BudgetFilter, TripPlan};
use crate::database::repository::{BudgetRepository, DailyScheduleRepository, TripPlanRepository};
use crate::database::DatabaseError;

const CATEGORY_MAX_CHARS: usize = 30;
const NAME_MAX_CHARS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    #[error("Trip plan not found: {0}")]
    PlanNotFound(Uuid),
    #[error("Access denied to trip plan {0}")]
    AccessDenied(Uuid),
    #[error("Budget not found: {0}")]
    BudgetNotFound(Uuid),
    #[error("Daily plan not found: {0}")]
    DailyPlanNotFound(Uuid),
    #[error("Daily plan {daily_plan_id} does not belong to trip plan {plan_id}")]
    DailyPlanNotInPlan { plan_id: Uuid, daily_plan_id: Uuid },
    #[error("Daily plan {0} has been deleted")]
    DailyPlanRetired(Uuid),
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl BudgetError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        BudgetError::Validation { field, message: message.into() }
    }
}

/// Budget lines hung off the daily plans of a trip plan. Any plan member may manage them.
pub struct BudgetService {
    plans: Arc<dyn TripPlanRepository>,
    schedules: Arc<dyn DailyScheduleRepository>,
    budgets: Arc<dyn BudgetRepository>,
}

impl BudgetService {
    pub fn new(
        plans: Arc<dyn TripPlanRepository>,
        schedules: Arc<dyn DailyScheduleRepository>,
        budgets: Arc<dyn BudgetRepository>,
    ) -> Self {
        Self { plans, schedules, budgets }
    }

    pub async fn create(&self, plan_id: Uuid, draft: BudgetDraft, caller: &AuthUser) -> Result<Budget, BudgetError> {
        info!(
            "Budget creation requested: plan_id={}, daily_plan_id={}, category={}, name={}, amount={}",
            plan_id, draft.daily_plan_id, draft.category, draft.name, draft.amount
        );
        self.member_plan(plan_id, caller).await?;
        let draft = validate(draft)?;
        self.ensure_parent(plan_id, draft.daily_plan_id).await?;

        let budget = match self.budgets.create(plan_id, draft).await {
            Ok(budget) => budget,
            Err(DatabaseError::NotFound(_)) => return Err(BudgetError::PlanNotFound(plan_id)),
            Err(e) => return Err(e.into()),
        };
        info!("Budget created: budget_id={}", budget.id);
        Ok(budget)
    }

    pub async fn get(&self, plan_id: Uuid, budget_id: Uuid, caller: &AuthUser) -> Result<Budget, BudgetError> {
        info!("Budget lookup: plan_id={}, budget_id={}", plan_id, budget_id);
        self.member_plan(plan_id, caller).await?;
        self.find_in_plan(plan_id, budget_id).await
    }

    /// Budgets of the plan, optionally narrowed to one daily plan or one type
    pub async fn list(&self, plan_id: Uuid, filter: BudgetFilter, caller: &AuthUser) -> Result<Vec<Budget>, BudgetError> {
        self.member_plan(plan_id, caller).await?;
        let budgets = self.budgets.find_by_plan(plan_id, filter).await?;
        info!(
            "Budgets listed: plan_id={}, daily_plan_id={:?}, type={:?}, count={}",
            plan_id,
            filter.daily_plan_id,
            filter.budget_type,
            budgets.len()
        );
        Ok(budgets)
    }

    /// Replace every field; moving to another daily plan re-checks the new parent
    pub async fn update(
        &self,
        plan_id: Uuid,
        budget_id: Uuid,
        draft: BudgetDraft,
        caller: &AuthUser,
    ) -> Result<Budget, BudgetError> {
        info!("Budget update requested: plan_id={}, budget_id={}", plan_id, budget_id);
        self.member_plan(plan_id, caller).await?;
        let draft = validate(draft)?;
        let current = self.find_in_plan(plan_id, budget_id).await?;
        let target = draft.daily_plan_id;
        if current.daily_plan_id != target {
            self.ensure_parent(plan_id, target).await?;
        }

        let budget = match self.budgets.update(budget_id, draft).await {
            Ok(Some(budget)) => budget,
            Ok(None) => return Err(BudgetError::BudgetNotFound(budget_id)),
            Err(DatabaseError::NotFound(_)) => return Err(BudgetError::DailyPlanNotFound(target)),
            Err(e) => return Err(e.into()),
        };
        info!("Budget updated: budget_id={}", budget_id);
        Ok(budget)
    }

    pub async fn delete(&self, plan_id: Uuid, budget_id: Uuid, caller: &AuthUser) -> Result<(), BudgetError> {
        info!("Budget delete requested: plan_id={}, budget_id={}", plan_id, budget_id);
        self.member_plan(plan_id, caller).await?;
        self.find_in_plan(plan_id, budget_id).await?;

        if !self.budgets.delete(budget_id).await? {
            return Err(BudgetError::BudgetNotFound(budget_id));
        }
        info!("Budget deleted: budget_id={}", budget_id);
        Ok(())
    }

    async fn member_plan(&self, plan_id: Uuid, caller: &AuthUser) -> Result<TripPlan, BudgetError> {
        let plan = self.plans.find_by_id(plan_id).await?.ok_or_else(|| {
            error!("Trip plan lookup failed: plan_id={}", plan_id);
            BudgetError::PlanNotFound(plan_id)
        })?;
        if !plan.is_member(caller.user_id) {
            error!("Unauthorized budget access: plan_id={}, user={}", plan_id, caller.username);
            return Err(BudgetError::AccessDenied(plan_id));
        }
        Ok(plan)
    }

    /// Budgets only attach to active daily plans of the same trip plan
    async fn ensure_parent(&self, plan_id: Uuid, daily_plan_id: Uuid) -> Result<(), BudgetError> {
        let parent = self.schedules.find_by_id(daily_plan_id).await?.ok_or_else(|| {
            error!("Budget parent lookup failed: daily_plan_id={}", daily_plan_id);
            BudgetError::DailyPlanNotFound(daily_plan_id)
        })?;
        if parent.plan_id != plan_id {
            return Err(BudgetError::DailyPlanNotInPlan { plan_id, daily_plan_id });
        }
        if !parent.is_active() {
            return Err(BudgetError::DailyPlanRetired(daily_plan_id));
        }
        Ok(())
    }

    /// A budget of another plan is reported as missing
    async fn find_in_plan(&self, plan_id: Uuid, budget_id: Uuid) -> Result<Budget, BudgetError> {
        match self.budgets.find_by_id(budget_id).await? {
            Some(budget) if budget.plan_id == plan_id => Ok(budget),
            _ => {
                error!("Budget lookup failed: budget_id={} in plan_id={}", budget_id, plan_id);
                Err(BudgetError::BudgetNotFound(budget_id))
            }
        }
    }
}

fn validate(mut draft: BudgetDraft) -> Result<BudgetDraft, BudgetError> {
    draft.category = draft.category.trim().to_string();
    draft.name = draft.name.trim().to_string();

    if draft.category.is_empty() {
        return Err(BudgetError::invalid("category", "must not be blank"));
    }
    if draft.category.chars().count() > CATEGORY_MAX_CHARS {
        return Err(BudgetError::invalid(
            "category",
            format!("must be at most {} characters", CATEGORY_MAX_CHARS),
        ));
    }
    if draft.name.is_empty() {
        return Err(BudgetError::invalid("name", "must not be blank"));
    }
    if draft.name.chars().count() > NAME_MAX_CHARS {
        return Err(BudgetError::invalid("name", format!("must be at most {} characters", NAME_MAX_CHARS)));
    }
    if draft.amount < 0 {
        return Err(BudgetError::invalid("amount", "must be zero or greater"));
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::DailySchedule;
    use crate::testing::TestContext;
    use crate::types::BudgetType;

    fn draft(daily_plan_id: Uuid, amount: i64, budget_type: BudgetType) -> BudgetDraft {
        BudgetDraft {
            daily_plan_id,
            category: " FOOD ".to_string(),
            name: "Black pork dinner".to_string(),
            amount,
            budget_type,
        }
    }

    /// Owner, a generated plan and its daily plan rows
    async fn planned_trip(ctx: &TestContext) -> (AuthUser, TripPlan, Vec<DailySchedule>) {
        let owner = ctx.user("owner");
        let plan = ctx.seed_plan(&owner, "2025-06-01", "2025-06-02").await;
        ctx.schedules().generate(plan.id, &owner).await.unwrap();
        let rows = ctx.schedules().list(plan.id).await.unwrap();
        (owner, plan, rows)
    }

    #[tokio::test]
    async fn members_manage_budgets_on_daily_plans() {
        let ctx = TestContext::new();
        let (owner, plan, rows) = planned_trip(&ctx).await;
        let friend = ctx.user("friend");
        ctx.add_member(&plan, &friend).await;
        let service = ctx.budgets();

        let planned = service.create(plan.id, draft(rows[1].id, 40_000, BudgetType::Planned), &owner).await.unwrap();
        assert_eq!(planned.category, "FOOD");
        assert_eq!(planned.plan_id, plan.id);
        service.create(plan.id, draft(rows[1].id, 38_500, BudgetType::Spent), &friend).await.unwrap();
        service.create(plan.id, draft(rows[2].id, 12_000, BudgetType::Planned), &friend).await.unwrap();

        assert_eq!(service.list(plan.id, BudgetFilter::default(), &owner).await.unwrap().len(), 3);
        let day_one = BudgetFilter { daily_plan_id: Some(rows[1].id), budget_type: None };
        assert_eq!(service.list(plan.id, day_one, &friend).await.unwrap().len(), 2);
        let spent = BudgetFilter { daily_plan_id: None, budget_type: Some(BudgetType::Spent) };
        let spent = service.list(plan.id, spent, &owner).await.unwrap();
        assert_eq!(spent.iter().map(|b| b.amount).collect::<Vec<_>>(), vec![38_500]);

        assert_eq!(service.get(plan.id, planned.id, &friend).await.unwrap(), planned);
    }

    #[tokio::test]
    async fn outsiders_are_denied() {
        let ctx = TestContext::new();
        let (owner, plan, rows) = planned_trip(&ctx).await;
        let stranger = ctx.user("stranger");
        let service = ctx.budgets();
        let budget = service.create(plan.id, draft(rows[0].id, 1, BudgetType::Planned), &owner).await.unwrap();

        assert!(matches!(
            service.create(plan.id, draft(rows[0].id, 1, BudgetType::Planned), &stranger).await,
            Err(BudgetError::AccessDenied(_))
        ));
        assert!(matches!(
            service.list(plan.id, BudgetFilter::default(), &stranger).await,
            Err(BudgetError::AccessDenied(_))
        ));
        assert!(matches!(
            service.delete(plan.id, budget.id, &stranger).await,
            Err(BudgetError::AccessDenied(_))
        ));
        assert!(matches!(
            service.get(Uuid::new_v4(), budget.id, &owner).await,
            Err(BudgetError::PlanNotFound(_))
        ));
    }

    #[tokio::test]
    async fn parent_must_be_active_row_of_same_plan() {
        let ctx = TestContext::new();
        let (owner, plan, rows) = planned_trip(&ctx).await;
        let other = ctx.seed_plan(&owner, "2025-07-01", "2025-07-01").await;
        ctx.schedules().generate(other.id, &owner).await.unwrap();
        let foreign_row = ctx.schedules().list(other.id).await.unwrap().remove(0);
        let service = ctx.budgets();

        assert!(matches!(
            service.create(plan.id, draft(Uuid::new_v4(), 1, BudgetType::Planned), &owner).await,
            Err(BudgetError::DailyPlanNotFound(_))
        ));
        assert!(matches!(
            service.create(plan.id, draft(foreign_row.id, 1, BudgetType::Planned), &owner).await,
            Err(BudgetError::DailyPlanNotInPlan { .. })
        ));

        ctx.schedules().retire(plan.id, rows[2].id, &owner).await.unwrap();
        assert!(matches!(
            service.create(plan.id, draft(rows[2].id, 1, BudgetType::Planned), &owner).await,
            Err(BudgetError::DailyPlanRetired(id)) if id == rows[2].id
        ));
    }

    #[tokio::test]
    async fn update_can_move_budget_between_daily_plans() {
        let ctx = TestContext::new();
        let (owner, plan, rows) = planned_trip(&ctx).await;
        let service = ctx.budgets();
        let budget = service.create(plan.id, draft(rows[1].id, 10, BudgetType::Planned), &owner).await.unwrap();

        let moved = service
            .update(plan.id, budget.id, draft(rows[2].id, 25, BudgetType::Spent), &owner)
            .await
            .unwrap();
        assert_eq!(moved.daily_plan_id, rows[2].id);
        assert_eq!(moved.amount, 25);
        assert_eq!(moved.budget_type, BudgetType::Spent);

        assert!(matches!(
            service.update(plan.id, budget.id, draft(Uuid::new_v4(), 25, BudgetType::Spent), &owner).await,
            Err(BudgetError::DailyPlanNotFound(_))
        ));
        assert!(matches!(
            service.update(plan.id, budget.id, draft(rows[2].id, -5, BudgetType::Spent), &owner).await,
            Err(BudgetError::Validation { field: "amount", .. })
        ));

        service.delete(plan.id, budget.id, &owner).await.unwrap();
        assert!(matches!(
            service.get(plan.id, budget.id, &owner).await,
            Err(BudgetError::BudgetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn budget_of_other_plan_is_not_found() {
        let ctx = TestContext::new();
        let (owner, plan, rows) = planned_trip(&ctx).await;
        let other = ctx.seed_plan(&owner, "2025-08-01", "2025-08-01").await;
        let service = ctx.budgets();
        let budget = service.create(plan.id, draft(rows[0].id, 3, BudgetType::Planned), &owner).await.unwrap();

        assert!(matches!(
            service.get(other.id, budget.id, &owner).await,
            Err(BudgetError::BudgetNotFound(_))
        ));
        assert!(matches!(
            service.delete(other.id, budget.id, &owner).await,
            Err(BudgetError::BudgetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let ctx = TestContext::new();
        let (owner, plan, rows) = planned_trip(&ctx).await;
        let service = ctx.budgets();

        let mut blank_name = draft(rows[0].id, 1, BudgetType::Planned);
        blank_name.name = "   ".to_string();
        assert!(matches!(
            service.create(plan.id, blank_name, &owner).await,
            Err(BudgetError::Validation { field: "name", .. })
        ));

        let mut long_category = draft(rows[0].id, 1, BudgetType::Planned);
        long_category.category = "c".repeat(31);
        assert!(matches!(
            service.create(plan.id, long_category, &owner).await,
            Err(BudgetError::Validation { field: "category", .. })
        ));
    }
}
