//! Date tools: today's date and the current work week
//!
//! Both tools read "now" from an injected [`Clock`] so results are
//! reproducible in tests.

use crate::error::Result;
use crate::tools::{Tool, ToolExecutor};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current time in the team's time zone
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock shifted to a fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Clock at `hours` east of UTC; out-of-range offsets fall back to UTC
    pub fn with_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| {
            tracing::warn!("Invalid UTC offset {} hours, using UTC", hours);
            Utc.fix()
        });
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// A calendar day as reported to the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayInfo {
    /// ISO date, e.g. `2024-06-10`
    pub date: String,
    /// Day-of-month label matching roster dates, e.g. `10`
    pub day_of_month: String,
    /// English weekday name
    pub weekday: String,
}

impl DayInfo {
    fn from_date(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            day_of_month: date.day().to_string(),
            weekday: date.format("%A").to_string(),
        }
    }
}

/// `get_current_date`: today's date
pub struct CurrentDateTool {
    clock: Arc<dyn Clock>,
}

impl CurrentDateTool {
    /// Create the tool
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ToolExecutor for CurrentDateTool {
    fn tool_definition(&self) -> Tool {
        Tool::new(
            "get_current_date",
            "Get today's date, its day of the month, and weekday.",
            json!({ "type": "object", "properties": {} }),
        )
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<serde_json::Value> {
        let now = self.clock.now();
        let day = DayInfo::from_date(now.date_naive());
        Ok(json!({
            "date": day.date,
            "day_of_month": day.day_of_month,
            "weekday": day.weekday,
            "month": now.format("%B").to_string(),
            "year": now.year(),
            "time": now.format("%H:%M").to_string(),
        }))
    }
}

/// `get_current_work_week`: Monday to Friday of the current week
pub struct CurrentWorkWeekTool {
    clock: Arc<dyn Clock>,
}

impl CurrentWorkWeekTool {
    /// Create the tool
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Monday..Friday of the week containing `date`
fn work_week(date: NaiveDate) -> Vec<NaiveDate> {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (0..5).map(|i| monday + Duration::days(i)).collect()
}

#[async_trait]
impl ToolExecutor for CurrentWorkWeekTool {
    fn tool_definition(&self) -> Tool {
        Tool::new(
            "get_current_work_week",
            "Get the dates of the current work week, Monday to Friday.",
            json!({ "type": "object", "properties": {} }),
        )
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<serde_json::Value> {
        let days: Vec<DayInfo> = work_week(self.clock.now().date_naive())
            .into_iter()
            .map(DayInfo::from_date)
            .collect();
        Ok(json!({ "days": days }))
    }
}
