use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::calendar::{hhmm, parse_time_input, DayType};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingTimeRule {
    pub id: i64,
    pub rule_name: String,
    pub day_type: DayType,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// `00:00` as an end time means end of day.
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub is_blocked: bool,
    pub requires_approval: bool,
}

impl BookingTimeRule {
    pub fn range(&self) -> MinuteRange {
        MinuteRange::new(minute_of_day(&self.start_time), end_minute(&self.end_time))
    }
}

/// Payload for creating or replacing a rule; times arrive as `HH:MM`.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleInput {
    pub rule_name: String,
    pub day_type: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub requires_approval: bool,
}

impl RuleInput {
    pub fn into_rule(self, id: i64) -> AppResult<BookingTimeRule> {
        let rule_name = self.rule_name.trim().to_string();
        if rule_name.is_empty() {
            return Err(AppError::InvalidInput("rule_name is required".to_string()));
        }
        let rule = BookingTimeRule {
            id,
            rule_name,
            day_type: DayType::parse(&self.day_type)?,
            start_time: parse_time_input(&self.start_time)?,
            end_time: parse_time_input(&self.end_time)?,
            is_blocked: self.is_blocked,
            requires_approval: self.requires_approval,
        };
        if rule.range().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "rule '{}': end_time must be after start_time",
                rule.rule_name
            )));
        }
        Ok(rule)
    }
}

/// Half-open range of minutes since midnight, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteRange {
    pub start: u32,
    pub end: u32,
}

impl MinuteRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn full_day() -> Self {
        Self::new(0, MINUTES_PER_DAY)
    }

    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &MinuteRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &MinuteRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

pub fn minute_of_day(t: &NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

fn end_minute(t: &NaiveTime) -> u32 {
    match minute_of_day(t) {
        0 => MINUTES_PER_DAY,
        m => m,
    }
}

pub fn time_from_minute(minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
}
