pub mod budget_service;
pub mod friend_service;
pub mod location_service;
pub mod plan_service;
pub mod schedule_service;
pub mod user_service;

pub use budget_service::{BudgetError, BudgetService};
pub use friend_service::{FriendError, FriendService};
pub use location_service::{LocationError, LocationService};
pub use plan_service::{AddMemberRequest, CreatePlanRequest, PlanError, PlanService};
pub use schedule_service::{schedule_drafts, ScheduleError, ScheduleService, ScheduleUpdate};
pub use user_service::{UserError, UserService};
