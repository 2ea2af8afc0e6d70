use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{BudgetType, UnknownVariant};

/// One budget line attached to a daily plan of a trip plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub daily_plan_id: Uuid,
    pub category: String,
    pub name: String,
    pub amount: i64,
    pub budget_type: BudgetType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or replacing a budget line
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetDraft {
    pub daily_plan_id: Uuid,
    pub category: String,
    pub name: String,
    pub amount: i64,
    pub budget_type: BudgetType,
}

/// Narrows a plan's budget listing; unset fields match everything
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BudgetFilter {
    pub daily_plan_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub budget_type: Option<BudgetType>,
}

impl BudgetFilter {
    pub fn matches(&self, budget: &Budget) -> bool {
        self.daily_plan_id.map_or(true, |id| budget.daily_plan_id == id)
            && self.budget_type.map_or(true, |t| budget.budget_type == t)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BudgetRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub daily_plan_id: Uuid,
    pub category: String,
    pub name: String,
    pub amount: i64,
    pub budget_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BudgetRow> for Budget {
    type Error = UnknownVariant;

    fn try_from(row: BudgetRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            plan_id: row.plan_id,
            daily_plan_id: row.daily_plan_id,
            category: row.category,
            name: row.name,
            amount: row.amount,
            budget_type: row.budget_type.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
