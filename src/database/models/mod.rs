pub mod budget;
pub mod daily_schedule;
pub mod friendship;
pub mod location;
pub mod trip_plan;
pub mod user_profile;

pub use budget::{Budget, BudgetDraft, BudgetFilter, BudgetRow};
pub use daily_schedule::{DailySchedule, DailyScheduleRow, ScheduleDraft, ScheduleSlot};
pub use friendship::{Friendship, FriendshipRow};
pub use location::{Location, LocationDraft, LocationRow};
pub use trip_plan::{NewTripPlan, PlanMember, PlanMemberRow, TripPlan, TripPlanResponse, TripPlanRow};
pub use user_profile::UserProfile;
