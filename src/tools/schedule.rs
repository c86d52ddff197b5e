//! Roster lookups: work-from-anywhere, work-from-office and leave days
//!
//! The three tools share one implementation parameterized by
//! [`ScheduleKind`]. When nothing matches they return a localized "no data"
//! sentence instead of an empty list so the assistant can relay it verbatim.

use crate::error::Result;
use crate::locales::{t, Key, Lang};
use crate::tools::roster::{Roster, ScheduleKind};
use crate::tools::{parse_args, Tool, ToolExecutor};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// A day label as the assistant sends it: `"10"` or `10`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DateArg {
    Text(String),
    Number(u32),
}

impl DateArg {
    fn into_label(self) -> String {
        match self {
            DateArg::Text(s) => s,
            DateArg::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleParams {
    #[serde(default)]
    dates: Vec<DateArg>,
    #[serde(default)]
    nicknames: Vec<String>,
}

/// Lookup tool for one roster schedule
pub struct ScheduleTool {
    kind: ScheduleKind,
    roster: Arc<Roster>,
    lang: Lang,
}

impl ScheduleTool {
    /// Create a lookup over `kind` answering "no data" in `lang`
    pub fn new(kind: ScheduleKind, roster: Arc<Roster>, lang: Lang) -> Self {
        Self { kind, roster, lang }
    }

    /// Name the assistant calls this tool by
    pub fn name(&self) -> &'static str {
        match self.kind {
            ScheduleKind::Wfa => "get_wfa_by_date_and_nickname",
            ScheduleKind::Wfo => "get_wfo_by_date_and_nickname",
            ScheduleKind::Leave => "get_leave_by_date_and_nickname",
        }
    }

    fn subject(&self) -> &'static str {
        match self.kind {
            ScheduleKind::Wfa => "work-from-anywhere (home)",
            ScheduleKind::Wfo => "work-from-office",
            ScheduleKind::Leave => "leave",
        }
    }
}

#[async_trait]
impl ToolExecutor for ScheduleTool {
    fn tool_definition(&self) -> Tool {
        Tool::new(
            self.name(),
            format!(
                "Get team members' {} days filtered by day of month and nickname. \
                 Omit a filter to match everything.",
                self.subject()
            ),
            json!({
                "type": "object",
                "properties": {
                    "dates": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Days of the month, e.g. [\"10\", \"11\"]"
                    },
                    "nicknames": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Team member nicknames"
                    }
                }
            }),
        )
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let params: ScheduleParams = parse_args(self.name(), args)?;
        let dates: Vec<String> = params.dates.into_iter().map(DateArg::into_label).collect();

        let entries = self.roster.lookup(self.kind, &dates, &params.nicknames);
        tracing::debug!(
            "{} dates={:?} nicknames={:?} -> {} entries",
            self.name(),
            dates,
            params.nicknames,
            entries.len()
        );

        if entries.is_empty() {
            return Ok(serde_json::Value::String(
                t(self.lang, Key::NoData).to_string(),
            ));
        }
        Ok(serde_json::to_value(entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;

    fn roster() -> Arc<Roster> {
        Arc::new(
            Roster::from_yaml_str(
                r#"
version: 1
members:
  - nickname: Achi
    wfa: ["3", "10", "17"]
    wfo: ["4"]
    leave: ["20"]
  - nickname: Bank
    wfa: ["10"]
"#,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_wfa_for_achi_on_the_tenth() {
        let tool = ScheduleTool::new(ScheduleKind::Wfa, roster(), Lang::En);
        let result = tool
            .execute(json!({"dates": ["10"], "nicknames": ["Achi"]}))
            .await
            .unwrap();
        assert_eq!(result, json!([{"nickname": "Achi", "dates": ["10"]}]));
    }

    #[tokio::test]
    async fn test_unknown_nickname_returns_no_data_text() {
        let tool = ScheduleTool::new(ScheduleKind::Wfa, roster(), Lang::En);
        let result = tool
            .execute(json!({"dates": ["10"], "nicknames": ["Nobody"]}))
            .await
            .unwrap();
        assert_eq!(result, json!(t(Lang::En, Key::NoData)));
    }

    #[tokio::test]
    async fn test_no_data_text_is_localized() {
        let tool = ScheduleTool::new(ScheduleKind::Leave, roster(), Lang::Ja);
        let result = tool.execute(json!({"nicknames": ["Bank"]})).await.unwrap();
        assert_eq!(result, json!(t(Lang::Ja, Key::NoData)));
    }

    #[tokio::test]
    async fn test_numeric_dates_are_accepted() {
        let tool = ScheduleTool::new(ScheduleKind::Wfa, roster(), Lang::En);
        let result = tool.execute(json!({"dates": [10]})).await.unwrap();
        assert_eq!(result.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_arguments_match_everything() {
        let tool = ScheduleTool::new(ScheduleKind::Leave, roster(), Lang::En);
        let result = tool.execute(serde_json::Value::Null).await.unwrap();
        assert_eq!(result, json!([{"nickname": "Achi", "dates": ["20"]}]));
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_rejected() {
        let tool = ScheduleTool::new(ScheduleKind::Wfo, roster(), Lang::En);
        let err = tool.execute(json!({"nicknames": "Achi"})).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RelayError>(),
            Some(RelayError::ToolArguments { tool, .. }) if tool == "get_wfo_by_date_and_nickname"
        ));
    }

    #[test]
    fn test_tool_names() {
        let names: Vec<String> = [ScheduleKind::Wfa, ScheduleKind::Wfo, ScheduleKind::Leave]
            .into_iter()
            .map(|k| ScheduleTool::new(k, roster(), Lang::En).tool_definition().name)
            .collect();
        assert_eq!(
            names,
            vec![
                "get_wfa_by_date_and_nickname",
                "get_wfo_by_date_and_nickname",
                "get_leave_by_date_and_nickname"
            ]
        );
    }
}
