use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{DailySchedule, ScheduleDraft, ScheduleSlot, TripPlan};
use crate::database::repository::{BatchInsert, DailyScheduleRepository, TripPlanRepository};
use crate::database::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Trip plan not found: {0}")]
    PlanNotFound(Uuid),
    #[error("Daily plan not found: {0}")]
    ScheduleNotFound(Uuid),
    #[error("Daily plan {schedule_id} does not belong to trip plan {plan_id}")]
    ScheduleNotInPlan { plan_id: Uuid, schedule_id: Uuid },
    #[error("Daily plans already exist for trip plan {0}")]
    ScheduleAlreadyExists(Uuid),
    #[error("Only the plan owner may change its daily plans")]
    AccessDenied,
    #[error("Daily plan {0} has been deleted")]
    ScheduleRetired(Uuid),
    #[error("Trip day number must be zero or greater, got {0}")]
    InvalidDayNumber(i32),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// New values for one daily plan row
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleUpdate {
    pub date: NaiveDate,
    pub trip_day_number: i32,
}

/// Overview row (day 0 on the start date) followed by one row per calendar day,
/// both endpoints included. Empty when `start` is after `end`.
pub fn schedule_drafts(start: NaiveDate, end: NaiveDate) -> Vec<ScheduleDraft> {
    if start > end {
        return Vec::new();
    }

    let mut drafts = vec![ScheduleDraft { date: start, trip_day_number: 0 }];
    drafts.extend(
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .zip(1..)
            .map(|(date, trip_day_number)| ScheduleDraft { date, trip_day_number }),
    );
    drafts
}

/// Owns the daily plan rows of every trip plan: generation, lookup, edits and retirement
pub struct ScheduleService {
    plans: Arc<dyn TripPlanRepository>,
    schedules: Arc<dyn DailyScheduleRepository>,
}

impl ScheduleService {
    pub fn new(plans: Arc<dyn TripPlanRepository>, schedules: Arc<dyn DailyScheduleRepository>) -> Self {
        Self { plans, schedules }
    }

    /// Create the full set of daily plans for a trip plan in one batch
    pub async fn generate(&self, plan_id: Uuid, caller: &AuthUser) -> Result<Vec<ScheduleSlot>, ScheduleError> {
        info!("Daily plan generation requested: plan_id={}, user={}", plan_id, caller.username);

        let plan = self.find_plan(plan_id).await?;
        ensure_owner(&plan, caller)?;

        let drafts = schedule_drafts(plan.start_date, plan.end_date);
        let inserted = match self.schedules.insert_batch_if_absent(plan_id, &drafts).await {
            Ok(BatchInsert::Inserted(rows)) => rows,
            Ok(BatchInsert::AlreadyExists) => {
                error!("Daily plan generation failed: plan_id={} already has daily plans", plan_id);
                return Err(ScheduleError::ScheduleAlreadyExists(plan_id));
            }
            Err(DatabaseError::NotFound(_)) => return Err(ScheduleError::PlanNotFound(plan_id)),
            Err(e) => return Err(e.into()),
        };

        match inserted.first() {
            Some(first) => info!(
                "Daily plans generated: plan_id={}, first_id={}, count={}",
                plan_id,
                first.id,
                inserted.len()
            ),
            None => warn!("Daily plan generation stored no rows: plan_id={}", plan_id),
        }

        Ok(inserted.iter().map(DailySchedule::slot).collect())
    }

    /// Every row of the plan, retired ones included
    pub async fn list(&self, plan_id: Uuid) -> Result<Vec<DailySchedule>, ScheduleError> {
        self.find_plan(plan_id).await?;
        let rows = self.schedules.find_all_by_plan(plan_id).await?;
        info!("Daily plans listed: plan_id={}, count={}", plan_id, rows.len());
        Ok(rows)
    }

    pub async fn get(&self, plan_id: Uuid, schedule_id: Uuid) -> Result<DailySchedule, ScheduleError> {
        info!("Daily plan lookup: plan_id={}, daily_plan_id={}", plan_id, schedule_id);
        self.find_in_plan(plan_id, schedule_id).await
    }

    /// Overwrite date and day number. Contiguity with sibling rows is not re-checked.
    pub async fn update(
        &self,
        plan_id: Uuid,
        schedule_id: Uuid,
        change: ScheduleUpdate,
        caller: &AuthUser,
    ) -> Result<ScheduleSlot, ScheduleError> {
        info!("Daily plan update requested: plan_id={}, daily_plan_id={}", plan_id, schedule_id);

        let mut schedule = self.find_in_plan(plan_id, schedule_id).await?;
        let plan = self.find_plan(schedule.plan_id).await?;
        ensure_owner(&plan, caller)?;
        ensure_active(&schedule)?;

        if change.trip_day_number < 0 {
            return Err(ScheduleError::InvalidDayNumber(change.trip_day_number));
        }

        schedule.date = change.date;
        schedule.trip_day_number = change.trip_day_number;
        schedule.updated_at = Utc::now();
        if !self.schedules.update(&schedule).await? {
            // retired between the read and the write
            error!("Daily plan update failed: daily_plan_id={} is no longer active", schedule_id);
            return Err(ScheduleError::ScheduleRetired(schedule_id));
        }

        info!("Daily plan updated: plan_id={}, daily_plan_id={}", plan_id, schedule_id);
        Ok(schedule.slot())
    }

    /// Soft delete; the row stays readable by id
    pub async fn retire(&self, plan_id: Uuid, schedule_id: Uuid, caller: &AuthUser) -> Result<(), ScheduleError> {
        info!(
            "Daily plan delete requested: plan_id={}, daily_plan_id={}, user={}",
            plan_id, schedule_id, caller.username
        );

        let schedule = self.find_in_plan(plan_id, schedule_id).await?;
        let plan = self.find_plan(schedule.plan_id).await?;
        ensure_owner(&plan, caller)?;
        ensure_active(&schedule)?;

        if !self.schedules.soft_delete(schedule_id, Utc::now()).await? {
            error!("Daily plan delete failed: daily_plan_id={} is no longer active", schedule_id);
            return Err(ScheduleError::ScheduleRetired(schedule_id));
        }

        info!("Daily plan deleted: plan_id={}, daily_plan_id={}", plan_id, schedule_id);
        Ok(())
    }

    async fn find_plan(&self, plan_id: Uuid) -> Result<TripPlan, ScheduleError> {
        self.plans.find_by_id(plan_id).await?.ok_or_else(|| {
            error!("Trip plan lookup failed: plan_id={}", plan_id);
            ScheduleError::PlanNotFound(plan_id)
        })
    }

    /// Resolve a row and confirm it belongs to the given plan
    async fn find_in_plan(&self, plan_id: Uuid, schedule_id: Uuid) -> Result<DailySchedule, ScheduleError> {
        let schedule = self.schedules.find_by_id(schedule_id).await?.ok_or_else(|| {
            error!("Daily plan lookup failed: daily_plan_id={} does not exist", schedule_id);
            ScheduleError::ScheduleNotFound(schedule_id)
        })?;

        if schedule.plan_id != plan_id {
            error!(
                "Daily plan lookup failed: daily_plan_id={} is not part of plan_id={}",
                schedule_id, plan_id
            );
            return Err(ScheduleError::ScheduleNotInPlan { plan_id, schedule_id });
        }
        Ok(schedule)
    }
}

fn ensure_owner(plan: &TripPlan, caller: &AuthUser) -> Result<(), ScheduleError> {
    if plan.is_owner(caller.user_id) {
        return Ok(());
    }
    error!(
        "Unauthorized daily plan change: plan_id={}, user={}",
        plan.id, caller.username
    );
    Err(ScheduleError::AccessDenied)
}

fn ensure_active(schedule: &DailySchedule) -> Result<(), ScheduleError> {
    if schedule.is_active() {
        Ok(())
    } else {
        Err(ScheduleError::ScheduleRetired(schedule.id))
    }
}
