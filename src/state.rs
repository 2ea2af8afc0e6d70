use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::database::memory::{
    MemoryBudgetRepository, MemoryDailyScheduleRepository, MemoryFriendshipRepository, MemoryLocationRepository,
    MemoryTripPlanRepository, MemoryUserRepository,
};
use crate::database::postgres::{
    PgBudgetRepository, PgDailyScheduleRepository, PgFriendshipRepository, PgLocationRepository,
    PgTripPlanRepository, PgUserRepository,
};
use crate::database::repository::{
    BudgetRepository, DailyScheduleRepository, FriendshipRepository, LocationRepository, TripPlanRepository,
    UserRepository,
};
use crate::database::{DatabaseError, DatabaseManager};
use crate::services::{BudgetService, FriendService, LocationService, PlanService, ScheduleService, UserService};

/// Services shared by every request handler
pub struct State {
    pub plans: PlanService,
    pub schedules: ScheduleService,
    pub budgets: BudgetService,
    pub locations: LocationService,
    pub users: UserService,
    pub friends: FriendService,
    pub jwt_secret: String,
    /// Present only for the PostgreSQL backend; used by the health check
    pub pool: Option<PgPool>,
}

pub type AppState = Arc<State>;

/// One repository per entity, all over the same backend
struct Stores {
    plans: Arc<dyn TripPlanRepository>,
    schedules: Arc<dyn DailyScheduleRepository>,
    budgets: Arc<dyn BudgetRepository>,
    locations: Arc<dyn LocationRepository>,
    users: Arc<dyn UserRepository>,
    friendships: Arc<dyn FriendshipRepository>,
}

impl State {
    /// Build services over the configured backend, running migrations when enabled
    pub async fn from_config(config: &AppConfig) -> Result<AppState, DatabaseError> {
        match config.database.backend {
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Ok(Self::in_memory(config))
            }
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                if config.database.run_migrations {
                    DatabaseManager::migrate(&pool).await?;
                }
                Ok(Self::postgres(config, pool))
            }
        }
    }

    pub fn in_memory(config: &AppConfig) -> AppState {
        let plans = Arc::new(MemoryTripPlanRepository::new());
        let stores = Stores {
            schedules: Arc::new(MemoryDailyScheduleRepository::new(plans.clone())),
            budgets: Arc::new(MemoryBudgetRepository::new(plans.clone())),
            plans,
            locations: Arc::new(MemoryLocationRepository::new()),
            users: Arc::new(MemoryUserRepository::new()),
            friendships: Arc::new(MemoryFriendshipRepository::new()),
        };
        Self::assemble(config, stores, None)
    }

    pub fn postgres(config: &AppConfig, pool: PgPool) -> AppState {
        let stores = Stores {
            plans: Arc::new(PgTripPlanRepository::new(pool.clone())),
            schedules: Arc::new(PgDailyScheduleRepository::new(pool.clone())),
            budgets: Arc::new(PgBudgetRepository::new(pool.clone())),
            locations: Arc::new(PgLocationRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            friendships: Arc::new(PgFriendshipRepository::new(pool.clone())),
        };
        Self::assemble(config, stores, Some(pool))
    }

    fn assemble(config: &AppConfig, stores: Stores, pool: Option<PgPool>) -> AppState {
        let Stores {
            plans,
            schedules,
            budgets,
            locations,
            users,
            friendships,
        } = stores;

        Arc::new(Self {
            plans: PlanService::new(plans.clone(), schedules.clone(), budgets.clone(), config.plan.clone()),
            schedules: ScheduleService::new(plans.clone(), schedules.clone()),
            budgets: BudgetService::new(plans, schedules, budgets),
            locations: LocationService::new(locations),
            users: UserService::new(users.clone()),
            friends: FriendService::new(users, friendships),
            jwt_secret: config.security.jwt_secret.clone(),
            pool,
        })
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.pool {
            Some(pool) => DatabaseManager::health_check(pool).await,
            None => Ok(()),
        }
    }
}
