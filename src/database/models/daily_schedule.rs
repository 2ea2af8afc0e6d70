use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{ScheduleStatus, UnknownVariant};

/// One day slot of a trip plan. Day number 0 is the plan overview row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySchedule {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub date: NaiveDate,
    pub trip_day_number: i32,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailySchedule {
    pub fn from_draft(plan_id: Uuid, draft: &ScheduleDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan_id,
            date: draft.date,
            trip_day_number: draft.trip_day_number,
            status: ScheduleStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ScheduleStatus::Active
    }

    pub fn slot(&self) -> ScheduleSlot {
        ScheduleSlot {
            date: self.date,
            trip_day_number: self.trip_day_number,
        }
    }
}

/// A row yet to be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleDraft {
    pub date: NaiveDate,
    pub trip_day_number: i32,
}

/// The caller-facing view of a generated or edited row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleSlot {
    pub date: NaiveDate,
    pub trip_day_number: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct DailyScheduleRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub schedule_date: NaiveDate,
    pub trip_day_number: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DailyScheduleRow> for DailySchedule {
    type Error = UnknownVariant;

    fn try_from(row: DailyScheduleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            plan_id: row.plan_id,
            date: row.schedule_date,
            trip_day_number: row.trip_day_number,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
