pub mod blocked_date;
pub mod booking;
pub mod calendar;
pub mod holiday;
pub mod settings;
pub mod time_rule;
pub mod user;

pub use blocked_date::BlockedDate;
pub use booking::{ApprovalStatus, Booking, BookingStatus, WalkType};
pub use calendar::DayType;
pub use holiday::{Holiday, HolidaySource, OfficialHoliday};
pub use settings::{SettingsPatch, SystemSettings};
pub use time_rule::{BookingTimeRule, MinuteRange, RuleInput};
pub use user::ViewerContext;
