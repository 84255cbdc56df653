//! Derive the displayed list from the raw collection and a [`FilterConfig`].
//!
//! # Design
//! [`apply_filters`] runs five stages in a fixed order (search, status, date,
//! time, sort), each over the previous stage's output. The current time is an
//! argument rather than read from the system, so the same inputs always give
//! the same output. Sorting breaks ties on `id`, which makes the result a
//! total order: running the pipeline over its own output changes nothing.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::Todo;

/// Sort position for records without a due date.
const MISSING_DUE_DATE: (i32, u32, u32) = (9999, 12, 31);
/// Sort position for records without a time, i.e. "99:99".
const MISSING_TIME_MINUTES: u16 = 99 * 60 + 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateFilter {
    #[default]
    All,
    Today,
    ThisWeek,
    ThisMonth,
    Overdue,
    /// Due date in `[start, end)`.
    Custom { start: NaiveDate, end: NaiveDate },
}

/// Minute-of-day bands. `Custom` bounds are inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeFilter {
    #[default]
    All,
    Morning,
    Afternoon,
    Evening,
    Night,
    Custom { start: u16, end: u16 },
}

impl TimeFilter {
    /// Custom band from two "HH:MM" strings.
    pub fn custom(start: &str, end: &str) -> Option<Self> {
        Some(TimeFilter::Custom { start: parse_minutes(start)?, end: parse_minutes(end)? })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    DueDate,
    #[default]
    CreatedAt,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub search_query: String,
    pub status: StatusFilter,
    pub date: DateFilter,
    pub time: TimeFilter,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl FilterConfig {
    /// True when nothing but the sort differs from the defaults.
    pub fn is_unfiltered(&self) -> bool {
        self.search_query.trim().is_empty()
            && self.status == StatusFilter::All
            && self.date == DateFilter::All
            && self.time == TimeFilter::All
    }
}

/// Run the whole pipeline.
pub fn apply_filters(todos: &[Todo], config: &FilterConfig, now: NaiveDateTime) -> Vec<Todo> {
    let mut out: Vec<Todo> = todos
        .iter()
        .filter(|t| matches_search(t, &config.search_query))
        .filter(|t| matches_status(t, config.status))
        .filter(|t| matches_date(t, config.date, now))
        .filter(|t| matches_time(t, config.time))
        .cloned()
        .collect();
    sort_todos(&mut out, config.sort_by, config.sort_order);
    out
}

/// Case-insensitive substring match on name or description.
pub fn matches_search(todo: &Todo, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    todo.name.to_lowercase().contains(&query)
        || todo
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&query))
}

pub fn matches_status(todo: &Todo, filter: StatusFilter) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Completed => todo.completed,
        StatusFilter::Pending => !todo.completed,
    }
}

pub fn matches_date(todo: &Todo, filter: DateFilter, now: NaiveDateTime) -> bool {
    if filter == DateFilter::All {
        return true;
    }
    let Some(due) = todo.due_date else {
        return false;
    };
    let today = now.date();
    match filter {
        DateFilter::All => true,
        DateFilter::Today => due == today,
        DateFilter::ThisWeek => week_start(due) == week_start(today),
        DateFilter::ThisMonth => due.year() == today.year() && due.month() == today.month(),
        DateFilter::Overdue => {
            !todo.completed && due.and_hms_opt(0, 0, 0).is_some_and(|midnight| midnight < now)
        }
        DateFilter::Custom { start, end } => start <= due && due < end,
    }
}

pub fn matches_time(todo: &Todo, filter: TimeFilter) -> bool {
    if filter == TimeFilter::All {
        return true;
    }
    let Some(minutes) = todo.time.as_deref().and_then(parse_minutes) else {
        return false;
    };
    match filter {
        TimeFilter::All => true,
        TimeFilter::Morning => (360..720).contains(&minutes),
        TimeFilter::Afternoon => (720..1080).contains(&minutes),
        TimeFilter::Evening => (1080..1440).contains(&minutes),
        TimeFilter::Night => minutes < 360,
        TimeFilter::Custom { start, end } => (start..=end).contains(&minutes),
    }
}

/// Sort in place; ties fall back to `id` ascending regardless of `order`.
pub fn sort_todos(todos: &mut [Todo], key: SortKey, order: SortOrder) {
    todos.sort_by(|a, b| {
        let primary = compare_by(a, b, key);
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_by(a: &Todo, b: &Todo, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::DueDate => due_sort_key(a).cmp(&due_sort_key(b)),
        SortKey::Time => time_sort_key(a).cmp(&time_sort_key(b)),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

fn due_sort_key(todo: &Todo) -> (i32, u32, u32) {
    todo.due_date
        .map(|d| (d.year(), d.month(), d.day()))
        .unwrap_or(MISSING_DUE_DATE)
}

fn time_sort_key(todo: &Todo) -> u16 {
    todo.time.as_deref().and_then(parse_minutes).unwrap_or(MISSING_TIME_MINUTES)
}

/// Sunday on or before `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Minutes since midnight for "H:MM" / "HH:MM"; `None` for anything else.
pub fn parse_minutes(time: &str) -> Option<u16> {
    let (hours, minutes) = time.split_once(':')?;
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if minutes.len() != 2 || hours.is_empty() || hours.len() > 2 || !digits(hours) || !digits(minutes) {
        return None;
    }
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
            StatusFilter::Pending => "pending",
        }
    }
}

impl DateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            DateFilter::All => "all",
            DateFilter::Today => "today",
            DateFilter::ThisWeek => "thisWeek",
            DateFilter::ThisMonth => "thisMonth",
            DateFilter::Overdue => "overdue",
            DateFilter::Custom { .. } => "custom",
        }
    }
}

impl TimeFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeFilter::All => "all",
            TimeFilter::Morning => "morning",
            TimeFilter::Afternoon => "afternoon",
            TimeFilter::Evening => "evening",
            TimeFilter::Night => "night",
            TimeFilter::Custom { .. } => "custom",
        }
    }
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::DueDate => "dueDate",
            SortKey::CreatedAt => "createdAt",
            SortKey::Time => "time",
        }
    }
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One-line summary for a filter bar, e.g.
/// `Search: "milk" • Status: pending • Sort: createdAt (desc)`.
impl fmt::Display for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.search_query.is_empty() {
            parts.push(format!("Search: \"{}\"", self.search_query));
        }
        if self.status != StatusFilter::All {
            parts.push(format!("Status: {}", self.status.as_str()));
        }
        if self.date != DateFilter::All {
            parts.push(format!("Date: {}", self.date.as_str()));
        }
        if self.time != TimeFilter::All {
            parts.push(format!("Time: {}", self.time.as_str()));
        }
        parts.push(format!("Sort: {} ({})", self.sort_by.as_str(), self.sort_order.as_str()));
        f.write_str(&parts.join(" • "))
    }
}
