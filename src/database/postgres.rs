use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Budget, BudgetDraft, BudgetFilter, BudgetRow, DailySchedule, DailyScheduleRow, Friendship, FriendshipRow,
    Location, LocationDraft, LocationRow, NewTripPlan, PlanMemberRow, ScheduleDraft, TripPlan, TripPlanRow,
    UserProfile,
};
use crate::database::repository::{
    BatchInsert, BudgetRepository, DailyScheduleRepository, FriendshipRepository, LocationRepository,
    NicknameChange, TripPlanRepository, UserRepository,
};
use crate::types::{FriendshipStatus, LocationType, PlanRole, ScheduleStatus};

const PLAN_COLUMNS: &str =
    "id, title, description, start_date, end_date, total_budget, created_at, updated_at";

const SCHEDULE_COLUMNS: &str =
    "id, plan_id, schedule_date, trip_day_number, status, created_at, updated_at";

const LOCATION_COLUMNS: &str =
    "id, country, city, district, address, latitude, longitude, location_type, created_at, updated_at";

const USER_COLUMNS: &str = "user_id, username, nickname, created_at, updated_at";

const FRIENDSHIP_COLUMNS: &str = "id, requester_id, receiver_id, status, created_at, updated_at";

const BUDGET_COLUMNS: &str =
    "id, plan_id, daily_plan_id, category, name, amount, budget_type, created_at, updated_at";

/// Turn a foreign-key violation into NotFound for the named parent
fn missing_parent(err: sqlx::Error, parent: impl FnOnce() -> String) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => DatabaseError::NotFound(parent()),
        _ => DatabaseError::Sqlx(err),
    }
}

pub struct PgTripPlanRepository {
    pool: PgPool,
}

impl PgTripPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load membership for a set of plans, keyed by plan id
    async fn members_for(&self, plan_ids: &[Uuid]) -> Result<HashMap<Uuid, HashMap<Uuid, PlanRole>>, DatabaseError> {
        let rows = sqlx::query_as::<_, PlanMemberRow>(
            "SELECT plan_id, user_id, role FROM plan_members WHERE plan_id = ANY($1)",
        )
        .bind(plan_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, HashMap<Uuid, PlanRole>> = HashMap::new();
        for row in rows {
            let role: PlanRole = row.role.parse()?;
            grouped.entry(row.plan_id).or_default().insert(row.user_id, role);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl TripPlanRepository for PgTripPlanRepository {
    async fn create(&self, plan: NewTripPlan, owner: Uuid) -> Result<TripPlan, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TripPlanRow>(&format!(
            "INSERT INTO trip_plans (id, title, description, start_date, end_date, total_budget)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            PLAN_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.start_date)
        .bind(plan.end_date)
        .bind(plan.total_budget)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO plan_members (plan_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(row.id)
            .bind(owner)
            .bind(PlanRole::Owner.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into_plan(HashMap::from([(owner, PlanRole::Owner)])))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TripPlan>, DatabaseError> {
        let row = sqlx::query_as::<_, TripPlanRow>(&format!(
            "SELECT {} FROM trip_plans WHERE id = $1",
            PLAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut members = self.members_for(&[id]).await?;
        Ok(Some(row.into_plan(members.remove(&id).unwrap_or_default())))
    }

    async fn find_all_by_member(&self, user_id: Uuid) -> Result<Vec<TripPlan>, DatabaseError> {
        let rows = sqlx::query_as::<_, TripPlanRow>(
            "SELECT p.id, p.title, p.description, p.start_date, p.end_date, p.total_budget,
                    p.created_at, p.updated_at
             FROM trip_plans p
             JOIN plan_members m ON m.plan_id = p.id
             WHERE m.user_id = $1
             ORDER BY p.start_date, p.created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut members = self.members_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let plan_members = members.remove(&row.id).unwrap_or_default();
                row.into_plan(plan_members)
            })
            .collect())
    }

    async fn add_member(&self, plan_id: Uuid, user_id: Uuid, role: PlanRole) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO plan_members (plan_id, user_id, role) VALUES ($1, $2, $3)
             ON CONFLICT (plan_id, user_id) DO NOTHING",
        )
        .bind(plan_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            sqlx::query("UPDATE trip_plans SET updated_at = now() WHERE id = $1")
                .bind(plan_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        // plan_members and daily_schedules go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM trip_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgDailyScheduleRepository {
    pool: PgPool,
}

impl PgDailyScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DailyScheduleRepository for PgDailyScheduleRepository {
    async fn insert_batch_if_absent(
        &self,
        plan_id: Uuid,
        drafts: &[ScheduleDraft],
    ) -> Result<BatchInsert, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the plan serializes generators for the same plan
        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM trip_plans WHERE id = $1 FOR UPDATE")
            .bind(plan_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(DatabaseError::NotFound(format!("trip plan {}", plan_id)));
        }

        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM daily_schedules WHERE plan_id = $1 AND status = $2)",
        )
        .bind(plan_id)
        .bind(ScheduleStatus::Active.as_str())
        .fetch_one(&mut *tx)
        .await?;
        if exists {
            tx.rollback().await?;
            return Ok(BatchInsert::AlreadyExists);
        }

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let schedule = DailySchedule::from_draft(plan_id, draft, now);
            sqlx::query(
                "INSERT INTO daily_schedules
                    (id, plan_id, schedule_date, trip_day_number, status, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(schedule.id)
            .bind(schedule.plan_id)
            .bind(schedule.date)
            .bind(schedule.trip_day_number)
            .bind(schedule.status.as_str())
            .bind(schedule.created_at)
            .bind(schedule.updated_at)
            .execute(&mut *tx)
            .await?;
            inserted.push(schedule);
        }

        // Dropping tx on any error above rolls the whole batch back
        tx.commit().await?;
        Ok(BatchInsert::Inserted(inserted))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DailySchedule>, DatabaseError> {
        let row = sqlx::query_as::<_, DailyScheduleRow>(&format!(
            "SELECT {} FROM daily_schedules WHERE id = $1",
            SCHEDULE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DailySchedule::try_from).transpose()?)
    }

    async fn find_all_by_plan(&self, plan_id: Uuid) -> Result<Vec<DailySchedule>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM daily_schedules WHERE plan_id = $1 ORDER BY trip_day_number, schedule_date",
            SCHEDULE_COLUMNS
        );
        let mut rows = sqlx::query_as::<_, DailyScheduleRow>(&sql)
            .bind(plan_id)
            .fetch(&self.pool);

        let mut schedules = Vec::new();
        while let Some(row) = rows.try_next().await? {
            schedules.push(DailySchedule::try_from(row)?);
        }
        Ok(schedules)
    }

    async fn update(&self, schedule: &DailySchedule) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE daily_schedules
             SET schedule_date = $2, trip_day_number = $3, updated_at = $4
             WHERE id = $1 AND status = $5",
        )
        .bind(schedule.id)
        .bind(schedule.date)
        .bind(schedule.trip_day_number)
        .bind(schedule.updated_at)
        .bind(ScheduleStatus::Active.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE daily_schedules SET status = $2, updated_at = $3 WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(ScheduleStatus::Deleted.as_str())
        .bind(at)
        .bind(ScheduleStatus::Active.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_by_plan(&self, plan_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM daily_schedules WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

pub struct PgLocationRepository {
    pool: PgPool,
}

impl PgLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_where(&self, clause: &str, location_type: Option<LocationType>) -> Result<Vec<Location>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM locations {} ORDER BY created_at, id",
            LOCATION_COLUMNS, clause
        );
        let mut query = sqlx::query_as::<_, LocationRow>(&sql);
        if let Some(location_type) = location_type {
            query = query.bind(location_type.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| Location::try_from(row).map_err(DatabaseError::from))
            .collect()
    }
}

#[async_trait]
impl LocationRepository for PgLocationRepository {
    async fn create(&self, draft: LocationDraft) -> Result<Location, DatabaseError> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "INSERT INTO locations
                (id, country, city, district, address, latitude, longitude, location_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.country)
        .bind(&draft.city)
        .bind(&draft.district)
        .bind(&draft.address)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(draft.location_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(Location::try_from(row)?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, DatabaseError> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {} FROM locations WHERE id = $1",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Location::try_from).transpose()?)
    }

    async fn find_all(&self) -> Result<Vec<Location>, DatabaseError> {
        self.select_where("", None).await
    }

    async fn find_by_type(&self, location_type: LocationType) -> Result<Vec<Location>, DatabaseError> {
        self.select_where("WHERE location_type = $1", Some(location_type)).await
    }

    async fn update(&self, id: Uuid, draft: LocationDraft) -> Result<Option<Location>, DatabaseError> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "UPDATE locations
             SET city = $2, district = $3, address = $4, latitude = $5, longitude = $6,
                 location_type = $7, updated_at = now()
             WHERE id = $1
             RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .bind(&draft.city)
        .bind(&draft.district)
        .bind(&draft.address)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(draft.location_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Location::try_from).transpose()?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn upsert(&self, user_id: Uuid, username: &str) -> Result<UserProfile, DatabaseError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "INSERT INTO user_profiles (user_id, username) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET username = EXCLUDED.username
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, DatabaseError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM user_profiles WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<UserProfile>, DatabaseError> {
        let profiles = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM user_profiles WHERE user_id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn nickname_taken(&self, nickname: &str) -> Result<bool, DatabaseError> {
        let (taken,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM user_profiles WHERE nickname = $1)")
            .bind(nickname)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn update_nickname(&self, user_id: Uuid, nickname: &str) -> Result<NicknameChange, DatabaseError> {
        let result = sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE user_profiles SET nickname = $2, updated_at = now()
             WHERE user_id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(profile)) => Ok(NicknameChange::Changed(profile)),
            Ok(None) => Ok(NicknameChange::UnknownUser),
            // unique index on nickname
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(NicknameChange::Taken),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct PgFriendshipRepository {
    pool: PgPool,
}

impl PgFriendshipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select(&self, clause: &str, user_id: Uuid, status: FriendshipStatus) -> Result<Vec<Friendship>, DatabaseError> {
        let rows = sqlx::query_as::<_, FriendshipRow>(&format!(
            "SELECT {} FROM friendships WHERE {} AND status = $2 ORDER BY created_at, id",
            FRIENDSHIP_COLUMNS, clause
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Friendship::try_from(row).map_err(DatabaseError::from))
            .collect()
    }
}

#[async_trait]
impl FriendshipRepository for PgFriendshipRepository {
    async fn insert_if_open(&self, requester_id: Uuid, receiver_id: Uuid) -> Result<Option<Friendship>, DatabaseError> {
        // friendships_open_pair_idx rejects a second open row for the pair
        let row = sqlx::query_as::<_, FriendshipRow>(&format!(
            "INSERT INTO friendships (id, requester_id, receiver_id, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING
             RETURNING {}",
            FRIENDSHIP_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(requester_id)
        .bind(receiver_id)
        .bind(FriendshipStatus::Requested.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| missing_parent(e, || format!("user {}", receiver_id)))?;

        Ok(row.map(Friendship::try_from).transpose()?)
    }

    async fn respond(
        &self,
        requester_id: Uuid,
        receiver_id: Uuid,
        status: FriendshipStatus,
    ) -> Result<Option<Friendship>, DatabaseError> {
        let row = sqlx::query_as::<_, FriendshipRow>(&format!(
            "UPDATE friendships SET status = $3, updated_at = now()
             WHERE requester_id = $1 AND receiver_id = $2 AND status = $4
             RETURNING {}",
            FRIENDSHIP_COLUMNS
        ))
        .bind(requester_id)
        .bind(receiver_id)
        .bind(status.as_str())
        .bind(FriendshipStatus::Requested.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Friendship::try_from).transpose()?)
    }

    async fn find_incoming(&self, receiver_id: Uuid) -> Result<Vec<Friendship>, DatabaseError> {
        self.select("receiver_id = $1", receiver_id, FriendshipStatus::Requested).await
    }

    async fn find_accepted(&self, user_id: Uuid) -> Result<Vec<Friendship>, DatabaseError> {
        self.select("(requester_id = $1 OR receiver_id = $1)", user_id, FriendshipStatus::Accepted)
            .await
    }
}

pub struct PgBudgetRepository {
    pool: PgPool,
}

impl PgBudgetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BudgetRepository for PgBudgetRepository {
    async fn create(&self, plan_id: Uuid, draft: BudgetDraft) -> Result<Budget, DatabaseError> {
        let row = sqlx::query_as::<_, BudgetRow>(&format!(
            "INSERT INTO budgets (id, plan_id, daily_plan_id, category, name, amount, budget_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            BUDGET_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(plan_id)
        .bind(draft.daily_plan_id)
        .bind(&draft.category)
        .bind(&draft.name)
        .bind(draft.amount)
        .bind(draft.budget_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_parent(e, || format!("trip plan {} or daily plan {}", plan_id, draft.daily_plan_id)))?;

        Ok(Budget::try_from(row)?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Budget>, DatabaseError> {
        let row = sqlx::query_as::<_, BudgetRow>(&format!("SELECT {} FROM budgets WHERE id = $1", BUDGET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Budget::try_from).transpose()?)
    }

    async fn find_by_plan(&self, plan_id: Uuid, filter: BudgetFilter) -> Result<Vec<Budget>, DatabaseError> {
        let rows = sqlx::query_as::<_, BudgetRow>(&format!(
            "SELECT {} FROM budgets
             WHERE plan_id = $1
               AND ($2::uuid IS NULL OR daily_plan_id = $2)
               AND ($3::text IS NULL OR budget_type = $3)
             ORDER BY created_at, id",
            BUDGET_COLUMNS
        ))
        .bind(plan_id)
        .bind(filter.daily_plan_id)
        .bind(filter.budget_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Budget::try_from(row).map_err(DatabaseError::from))
            .collect()
    }

    async fn update(&self, id: Uuid, draft: BudgetDraft) -> Result<Option<Budget>, DatabaseError> {
        let row = sqlx::query_as::<_, BudgetRow>(&format!(
            "UPDATE budgets
             SET daily_plan_id = $2, category = $3, name = $4, amount = $5, budget_type = $6,
                 updated_at = now()
             WHERE id = $1
             RETURNING {}",
            BUDGET_COLUMNS
        ))
        .bind(id)
        .bind(draft.daily_plan_id)
        .bind(&draft.category)
        .bind(&draft.name)
        .bind(draft.amount)
        .bind(draft.budget_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| missing_parent(e, || format!("daily plan {}", draft.daily_plan_id)))?;

        Ok(row.map(Budget::try_from).transpose()?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_by_plan(&self, plan_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM budgets WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
