use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::time_rule::MINUTES_PER_DAY;

pub const DEFAULT_GRANULARITY_MINUTES: i64 = 15;
pub const MAX_ADVANCE_DAYS: i64 = 3650;
pub const MAX_CACHE_DAYS: i64 = 365;

/// Administrator-controlled settings. Read once at the start of an operation
/// and passed down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemSettings {
    pub require_approval_for_morning_walks: bool,
    pub cancellation_lead_hours: i64,
    pub slot_granularity_minutes: i64,
    pub booking_advance_days: i64,
    pub use_official_holidays: bool,
    pub holiday_region: String,
    pub holiday_cache_days: i64,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            require_approval_for_morning_walks: true,
            cancellation_lead_hours: 12,
            slot_granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            booking_advance_days: 14,
            use_official_holidays: true,
            holiday_region: "BW".to_string(),
            holiday_cache_days: 7,
        }
    }
}

impl SystemSettings {
    /// Builds settings from the stored key/value pairs. Missing or unparseable
    /// values keep their default.
    pub fn from_pairs(pairs: &HashMap<String, String>) -> Self {
        let mut s = Self::default();
        let int = |key: &str, fallback: i64| {
            pairs
                .get(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(fallback)
        };
        let flag = |key: &str, fallback: bool| match pairs.get(key).map(|v| v.trim()) {
            Some("true") => true,
            Some("false") => false,
            _ => fallback,
        };

        s.require_approval_for_morning_walks = flag(
            "morning_walk_requires_approval",
            s.require_approval_for_morning_walks,
        );
        s.cancellation_lead_hours = int("cancellation_notice_hours", s.cancellation_lead_hours);
        s.slot_granularity_minutes = int("booking_time_granularity", s.slot_granularity_minutes);
        s.booking_advance_days = int("booking_advance_days", s.booking_advance_days);
        s.use_official_holidays = flag("use_official_holidays", s.use_official_holidays);
        if let Some(region) = pairs.get("holiday_region").filter(|v| !v.trim().is_empty()) {
            s.holiday_region = region.trim().to_string();
        }
        s.holiday_cache_days = int("holiday_cache_days", s.holiday_cache_days);
        s
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "morning_walk_requires_approval",
                self.require_approval_for_morning_walks.to_string(),
            ),
            ("cancellation_notice_hours", self.cancellation_lead_hours.to_string()),
            ("booking_time_granularity", self.slot_granularity_minutes.to_string()),
            ("booking_advance_days", self.booking_advance_days.to_string()),
            ("use_official_holidays", self.use_official_holidays.to_string()),
            ("holiday_region", self.holiday_region.clone()),
            ("holiday_cache_days", self.holiday_cache_days.to_string()),
        ]
    }

    pub fn validate(&self) -> AppResult<()> {
        let g = self.slot_granularity_minutes;
        if g <= 0 || MINUTES_PER_DAY as i64 % g != 0 {
            return Err(AppError::InvalidInput(format!(
                "slot granularity must be a positive divisor of 1440 minutes, got {g}"
            )));
        }
        if self.cancellation_lead_hours < 0 {
            return Err(AppError::InvalidInput(
                "cancellation lead hours cannot be negative".to_string(),
            ));
        }
        if !(1..=MAX_ADVANCE_DAYS).contains(&self.booking_advance_days) {
            return Err(AppError::InvalidInput(format!(
                "booking advance days must be between 1 and {MAX_ADVANCE_DAYS}"
            )));
        }
        if !(0..=MAX_CACHE_DAYS).contains(&self.holiday_cache_days) {
            return Err(AppError::InvalidInput(format!(
                "holiday cache days must be between 0 and {MAX_CACHE_DAYS}"
            )));
        }
        Ok(())
    }

    /// Granularity the slot generator should use; a corrupt stored value falls
    /// back to the default rather than blocking every walk.
    pub fn effective_granularity(&self) -> u32 {
        let g = self.slot_granularity_minutes;
        if g > 0 && MINUTES_PER_DAY as i64 % g == 0 {
            g as u32
        } else {
            DEFAULT_GRANULARITY_MINUTES as u32
        }
    }
}

/// Partial update sent by an administrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub require_approval_for_morning_walks: Option<bool>,
    pub cancellation_lead_hours: Option<i64>,
    pub slot_granularity_minutes: Option<i64>,
    pub booking_advance_days: Option<i64>,
    pub use_official_holidays: Option<bool>,
    pub holiday_region: Option<String>,
    pub holiday_cache_days: Option<i64>,
}

impl SettingsPatch {
    pub fn apply(self, mut s: SystemSettings) -> SystemSettings {
        if let Some(v) = self.require_approval_for_morning_walks {
            s.require_approval_for_morning_walks = v;
        }
        if let Some(v) = self.cancellation_lead_hours {
            s.cancellation_lead_hours = v;
        }
        if let Some(v) = self.slot_granularity_minutes {
            s.slot_granularity_minutes = v;
        }
        if let Some(v) = self.booking_advance_days {
            s.booking_advance_days = v;
        }
        if let Some(v) = self.use_official_holidays {
            s.use_official_holidays = v;
        }
        if let Some(v) = self.holiday_region {
            s.holiday_region = v;
        }
        if let Some(v) = self.holiday_cache_days {
            s.holiday_cache_days = v;
        }
        s
    }
}
