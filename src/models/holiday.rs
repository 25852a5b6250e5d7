use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HolidaySource {
    Official,
    Custom,
}

impl HolidaySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidaySource::Official => "official",
            HolidaySource::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "official" => HolidaySource::Official,
            _ => HolidaySource::Custom,
        }
    }

    /// Higher wins when both sources list the same date.
    pub fn priority(&self) -> u8 {
        match self {
            HolidaySource::Official => 0,
            HolidaySource::Custom => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub source: HolidaySource,
    pub is_active: bool,
    pub created_by: Option<i64>,
}

/// One entry of the yearly official calendar as delivered by the holiday source.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficialHoliday {
    pub date: NaiveDate,
    pub name: String,
}
