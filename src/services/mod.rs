pub mod approval;
pub mod availability;
pub mod blocked_dates;
pub mod cancellation;
pub mod holiday_source;
pub mod holidays;
pub mod settings;
pub mod time_rules;
