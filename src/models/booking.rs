use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::calendar::hhmm;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub dog_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub scheduled_time: NaiveTime,
    pub walk_type: WalkType,
    pub status: BookingStatus,
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn walk_start(&self) -> NaiveDateTime {
        self.date.and_time(self.scheduled_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(AppError::InvalidState(format!("unknown booking status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::None => "none",
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "none" => Ok(ApprovalStatus::None),
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(AppError::InvalidState(format!("unknown approval status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WalkType {
    Morning,
    Evening,
}

impl WalkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkType::Morning => "morning",
            WalkType::Evening => "evening",
        }
    }

    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "morning" => Ok(WalkType::Morning),
            "evening" => Ok(WalkType::Evening),
            other => Err(AppError::InvalidInput(format!(
                "walk_type must be 'morning' or 'evening', got '{other}'"
            ))),
        }
    }

    /// Walks starting before noon count as morning walks.
    pub fn for_time(t: &NaiveTime) -> Self {
        if t.hour() < 12 {
            WalkType::Morning
        } else {
            WalkType::Evening
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_type_for_time() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(WalkType::for_time(&t(9, 0)), WalkType::Morning);
        assert_eq!(WalkType::for_time(&t(11, 45)), WalkType::Morning);
        assert_eq!(WalkType::for_time(&t(12, 0)), WalkType::Evening);
        assert_eq!(WalkType::for_time(&t(18, 30)), WalkType::Evening);
    }

    #[test]
    fn test_unknown_status_is_invalid_state() {
        assert!(matches!(
            BookingStatus::parse("scheduled"),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            ApprovalStatus::parse("maybe"),
            Err(AppError::InvalidState(_))
        ));
    }
}
