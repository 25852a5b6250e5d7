use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::OfficialHoliday;

/// Supplier of the official public-holiday calendar.
#[async_trait]
pub trait HolidayProvider: Send + Sync {
    async fn fetch_year(&self, year: i32, region: &str) -> anyhow::Result<Vec<OfficialHoliday>>;
}

/// Client for feiertage-api.de, which answers with a map of
/// holiday name → `{ "datum": "YYYY-MM-DD", "hinweis": "..." }`.
pub struct FeiertageSource {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct FeiertagEntry {
    datum: String,
}

impl FeiertageSource {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HolidayProvider for FeiertageSource {
    async fn fetch_year(&self, year: i32, region: &str) -> anyhow::Result<Vec<OfficialHoliday>> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[("jahr", year.to_string()), ("nur_land", region.to_string())])
            .send()
            .await
            .context("failed to call holiday API")?;

        anyhow::ensure!(
            resp.status().is_success(),
            "holiday API returned status {}",
            resp.status()
        );

        let body: HashMap<String, FeiertagEntry> = resp
            .json()
            .await
            .context("failed to parse holiday API response")?;

        parse_entries(body)
    }
}

fn parse_entries(body: HashMap<String, FeiertagEntry>) -> anyhow::Result<Vec<OfficialHoliday>> {
    let mut holidays = body
        .into_iter()
        .map(|(name, entry)| {
            let date = NaiveDate::parse_from_str(&entry.datum, "%Y-%m-%d")
                .with_context(|| format!("bad date '{}' for holiday '{name}'", entry.datum))?;
            Ok(OfficialHoliday { date, name })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    holidays.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    Ok(holidays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feiertage_payload() {
        let json = r#"{
            "Neujahrstag": {"datum": "2025-01-01", "hinweis": ""},
            "Heilige Drei Könige": {"datum": "2025-01-06", "hinweis": ""}
        }"#;
        let body: HashMap<String, FeiertagEntry> = serde_json::from_str(json).unwrap();
        let holidays = parse_entries(body).unwrap();
        assert_eq!(holidays.len(), 2);
        assert_eq!(holidays[0].name, "Neujahrstag");
        assert_eq!(holidays[1].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_dates() {
        let json = r#"{"Broken": {"datum": "01.01.2025", "hinweis": ""}}"#;
        let body: HashMap<String, FeiertagEntry> = serde_json::from_str(json).unwrap();
        assert!(parse_entries(body).is_err());
    }
}
