use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

use crate::types::PlanRole;

/// A trip plan together with its membership map
#[derive(Debug, Clone, PartialEq)]
pub struct TripPlan {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_budget: Option<i64>,
    pub members: HashMap<Uuid, PlanRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripPlan {
    pub fn role_of(&self, user_id: Uuid) -> Option<PlanRole> {
        self.members.get(&user_id).copied()
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.role_of(user_id) == Some(PlanRole::Owner)
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains_key(&user_id)
    }

    /// Number of calendar days covered, both endpoints included
    pub fn trip_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Validated input for a new plan
#[derive(Debug, Clone)]
pub struct NewTripPlan {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_budget: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanMember {
    pub user_id: Uuid,
    pub role: PlanRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripPlanResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travel_duration: i64,
    pub total_budget: Option<i64>,
    pub members: Vec<PlanMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TripPlan> for TripPlanResponse {
    fn from(plan: &TripPlan) -> Self {
        let mut members: Vec<PlanMember> = plan
            .members
            .iter()
            .map(|(user_id, role)| PlanMember { user_id: *user_id, role: *role })
            .collect();
        // Owners first, then stable by user id
        members.sort_by_key(|m| (m.role != PlanRole::Owner, m.user_id));

        Self {
            id: plan.id,
            title: plan.title.clone(),
            description: plan.description.clone(),
            start_date: plan.start_date,
            end_date: plan.end_date,
            travel_duration: plan.trip_days(),
            total_budget: plan.total_budget,
            members,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TripPlanRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_budget: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripPlanRow {
    pub fn into_plan(self, members: HashMap<Uuid, PlanRole>) -> TripPlan {
        TripPlan {
            id: self.id,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            total_budget: self.total_budget,
            members,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PlanMemberRow {
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}
