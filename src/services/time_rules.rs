use chrono::{NaiveDate, NaiveTime, Timelike};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::time_rule::{minute_of_day, time_from_minute, MINUTES_PER_DAY};
use crate::models::{
    BookingTimeRule, DayType, MinuteRange, RuleInput, SystemSettings, ViewerContext, WalkType,
};
use crate::services::holidays;

/// Legal slot start times for `day_type`, ascending.
pub fn legal_slots(
    conn: &Connection,
    day_type: DayType,
    settings: &SystemSettings,
) -> AppResult<Vec<NaiveTime>> {
    let rules = queries::get_rules_by_day_type(conn, day_type)?;
    Ok(slots_from_rules(&rules, settings.effective_granularity()))
}

/// Discretises the bookable part of the day into `[start, start + granularity)`
/// slots on a grid anchored at midnight.
pub fn slots_from_rules(rules: &[BookingTimeRule], granularity: u32) -> Vec<NaiveTime> {
    let base = base_window(rules);
    let mut slots = Vec::new();
    let mut start = 0;
    while start + granularity <= MINUTES_PER_DAY {
        let slot = MinuteRange::new(start, start + granularity);
        if slot_is_legal(rules, &base, &slot) {
            if let Some(t) = time_from_minute(start) {
                slots.push(t);
            }
        }
        start += granularity;
    }
    slots
}

/// True when `time` starts a legal slot under `rules`.
pub fn is_legal_start(rules: &[BookingTimeRule], time: &NaiveTime, granularity: u32) -> bool {
    let start = minute_of_day(time);
    if time.second() != 0 || time.nanosecond() != 0 || start % granularity != 0 {
        return false;
    }
    let slot = MinuteRange::new(start, start + granularity);
    slot.end <= MINUTES_PER_DAY && slot_is_legal(rules, &base_window(rules), &slot)
}

/// Union of the non-blocked rule ranges, or the whole day when there are none.
fn base_window(rules: &[BookingTimeRule]) -> Vec<MinuteRange> {
    let mut open: Vec<MinuteRange> = rules
        .iter()
        .filter(|r| !r.is_blocked)
        .map(|r| r.range())
        .filter(|r| !r.is_empty())
        .collect();
    if open.is_empty() {
        return vec![MinuteRange::full_day()];
    }

    open.sort_by_key(|r| r.start);
    let mut merged: Vec<MinuteRange> = Vec::with_capacity(open.len());
    for r in open {
        match merged.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => merged.push(r),
        }
    }
    merged
}

fn slot_is_legal(rules: &[BookingTimeRule], base: &[MinuteRange], slot: &MinuteRange) -> bool {
    if !base.iter().any(|r| r.contains(slot)) {
        return false;
    }

    let overlapping: Vec<&BookingTimeRule> = rules
        .iter()
        .filter(|r| r.range().overlaps(slot))
        .collect();
    if !overlapping.iter().any(|r| r.is_blocked) {
        return true;
    }

    // The narrowest overlapping rule decides; on equal width the blocked one wins.
    let narrowest = overlapping
        .iter()
        .min_by_key(|r| (r.range().width(), !r.is_blocked));
    matches!(narrowest, Some(r) if !r.is_blocked && r.range().contains(slot))
}

/// Either signal forces approval: the covering rule's flag, or a morning walk
/// while morning walks require approval.
pub fn requires_approval(
    conn: &Connection,
    day_type: DayType,
    time: &NaiveTime,
    walk_type: WalkType,
    settings: &SystemSettings,
) -> AppResult<bool> {
    let rules = queries::get_rules_by_day_type(conn, day_type)?;
    Ok(rules_require_approval(&rules, time, walk_type, settings))
}

pub fn rules_require_approval(
    rules: &[BookingTimeRule],
    time: &NaiveTime,
    walk_type: WalkType,
    settings: &SystemSettings,
) -> bool {
    let start = minute_of_day(time);
    let slot = MinuteRange::new(start, start + settings.effective_granularity());
    let by_rule = rules
        .iter()
        .filter(|r| !r.is_blocked && r.range().contains(&slot))
        .min_by_key(|r| r.range().width())
        .map(|r| r.requires_approval)
        .unwrap_or(false);
    let by_setting = walk_type == WalkType::Morning && settings.require_approval_for_morning_walks;
    by_rule || by_setting
}

/// Checks a complete rule set for one day type.
pub fn validate_rule_set(rules: &[BookingTimeRule]) -> AppResult<()> {
    for (i, a) in rules.iter().enumerate() {
        if a.range().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "rule '{}': end_time must be after start_time",
                a.rule_name
            )));
        }
        for b in &rules[i + 1..] {
            if a.day_type != b.day_type {
                continue;
            }
            if a.rule_name == b.rule_name {
                return Err(AppError::InvalidInput(format!(
                    "duplicate rule name '{}' for {}",
                    a.rule_name,
                    a.day_type.as_str()
                )));
            }
            if !a.range().overlaps(&b.range()) {
                continue;
            }
            if !a.is_blocked && !b.is_blocked {
                return Err(AppError::InvalidInput(format!(
                    "bookable rules '{}' and '{}' overlap",
                    a.rule_name, b.rule_name
                )));
            }
            if a.is_blocked != b.is_blocked && a.range().width() == b.range().width() {
                return Err(AppError::InvalidInput(format!(
                    "rules '{}' and '{}' overlap with equal width and conflicting blocking",
                    a.rule_name, b.rule_name
                )));
            }
        }
    }
    Ok(())
}

// ── Administration ──

pub fn list_rules(conn: &Connection, viewer: &ViewerContext) -> AppResult<Vec<BookingTimeRule>> {
    viewer.require_admin("list booking time rules")?;
    Ok(queries::get_all_rules(conn)?)
}

pub fn rules_for_date(
    conn: &Connection,
    date: &NaiveDate,
) -> AppResult<(DayType, Vec<BookingTimeRule>)> {
    let day_type = holidays::classify_date(conn, date)?;
    let rules = queries::get_rules_by_day_type(conn, day_type)?;
    Ok((day_type, rules))
}

pub fn create_rule(
    conn: &Connection,
    viewer: &ViewerContext,
    input: RuleInput,
) -> AppResult<BookingTimeRule> {
    viewer.require_admin("create booking time rules")?;

    let mut rule = input.into_rule(0)?;
    let mut set = queries::get_rules_by_day_type(conn, rule.day_type)?;
    set.push(rule.clone());
    validate_rule_set(&set)?;

    rule.id = queries::insert_rule(conn, &rule)?;
    tracing::info!(rule_id = rule.id, day_type = rule.day_type.as_str(), "time rule created");
    Ok(rule)
}

pub fn update_rule(
    conn: &Connection,
    viewer: &ViewerContext,
    id: i64,
    input: RuleInput,
) -> AppResult<BookingTimeRule> {
    viewer.require_admin("update booking time rules")?;

    if queries::get_rule(conn, id)?.is_none() {
        return Err(AppError::NotFound(format!("time rule {id}")));
    }
    let rule = input.into_rule(id)?;
    let mut set: Vec<BookingTimeRule> = queries::get_rules_by_day_type(conn, rule.day_type)?
        .into_iter()
        .filter(|r| r.id != id)
        .collect();
    set.push(rule.clone());
    validate_rule_set(&set)?;

    queries::update_rule(conn, &rule)?;
    tracing::info!(rule_id = id, "time rule updated");
    Ok(rule)
}

pub fn delete_rule(conn: &Connection, viewer: &ViewerContext, id: i64) -> AppResult<()> {
    viewer.require_admin("delete booking time rules")?;

    if !queries::delete_rule(conn, id)? {
        return Err(AppError::NotFound(format!("time rule {id}")));
    }
    tracing::info!(rule_id = id, "time rule deleted");
    Ok(())
}

/// Swaps the whole rule set of one day type in a single transaction.
pub fn replace_rules(
    conn: &Connection,
    viewer: &ViewerContext,
    day_type: DayType,
    inputs: Vec<RuleInput>,
) -> AppResult<Vec<BookingTimeRule>> {
    viewer.require_admin("replace booking time rules")?;

    let mut rules = inputs
        .into_iter()
        .map(|input| input.into_rule(0))
        .collect::<AppResult<Vec<_>>>()?;
    if let Some(stray) = rules.iter().find(|r| r.day_type != day_type) {
        return Err(AppError::InvalidInput(format!(
            "rule '{}' is for {}, expected {}",
            stray.rule_name,
            stray.day_type.as_str(),
            day_type.as_str()
        )));
    }
    validate_rule_set(&rules)?;

    let tx = conn.unchecked_transaction()?;
    queries::delete_rules_for_day_type(&tx, day_type)?;
    for rule in rules.iter_mut() {
        rule.id = queries::insert_rule(&tx, rule)?;
    }
    tx.commit()?;

    tracing::info!(day_type = day_type.as_str(), count = rules.len(), "time rules replaced");
    Ok(rules)
}
