//! Task query filters.
//!
//! Every filter is an optional, pure predicate over a task and the current
//! time. Blank or unparseable parameters mean "filter not applied", never an
//! error, and never an empty result on their own. Active filters combine
//! with logical AND.

use chrono::{DateTime, Datelike, Days, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use crate::models::Task;

/// Raw query parameters as they arrive on `GET /api/v1/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub q: Option<String>,
    pub checked: Option<String>,
    pub next_days: Option<String>,
    pub expired: Option<String>,
}

/// Parsed filter set. Construction is lenient: only values that parse
/// cleanly activate a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub q: Option<String>,
    pub checked: Option<bool>,
    pub next_days: Option<i64>,
    pub expired: Option<bool>,
}

impl TaskFilter {
    pub fn from_query(query: &TaskQuery) -> Self {
        Self {
            q: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            checked: query.checked.as_deref().and_then(parse_bool_strict),
            next_days: query
                .next_days
                .as_deref()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|n| *n > 0),
            expired: query.expired.as_deref().and_then(parse_bool_strict),
        }
    }

    /// Whether a task passes every active filter at the given instant.
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if let Some(q) = &self.q {
            let needle = q.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_content = task
                .content
                .as_deref()
                .map(|c| c.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_content {
                return false;
            }
        }

        if let Some(checked) = self.checked {
            if task.checked != checked {
                return false;
            }
        }

        if let Some(days) = self.next_days {
            let Some(due) = task.due_to else { return false };
            let (start, end) = upcoming_window(now, days);
            if due < start || due > end {
                return false;
            }
        }

        if let Some(expired) = self.expired {
            // Strict comparison both ways: a due date exactly equal to
            // "now" matches neither side of the filter.
            let Some(due) = task.due_to else { return false };
            let keep = if expired { due < now } else { due > now };
            if !keep {
                return false;
            }
        }

        true
    }

    /// Apply the filter set to an already owner-scoped collection and order
    /// the result deterministically: due date ascending with undated tasks
    /// last, id as tiebreaker.
    pub fn apply(&self, mut tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
        tasks.retain(|t| self.matches(t, now));
        tasks.sort_by(|a, b| match (a.due_to, b.due_to) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        tasks
    }
}

/// Only literal `true`/`false` count; any other value leaves the tri-state
/// filter unspecified.
fn parse_bool_strict(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// `[start of today, end of the day N days from now]` in UTC.
fn upcoming_window(now: DateTime<Utc>, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
        .single()
        .unwrap_or(now);
    let end_date = now
        .date_naive()
        .checked_add_days(Days::new(days as u64))
        .unwrap_or_else(|| now.date_naive());
    let end_time =
        NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).expect("valid end-of-day time");
    let end = Utc.from_utc_datetime(&end_date.and_time(end_time));
    (start, end)
}
