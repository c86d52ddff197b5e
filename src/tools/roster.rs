//! Team roster reference data
//!
//! The roster lists, per team member, the days they work from anywhere, the
//! days they are in the office, and their leave days. It is loaded once from
//! a versioned YAML file and shared read-only with the schedule tools.
//!
//! ```yaml
//! version: 1
//! period: 2024-06
//! members:
//!   - nickname: Achi
//!     wfa: ["3", "10", "17"]
//!     wfo: ["4", "11"]
//!     leave: ["20"]
//! ```
//!
//! Dates are day-of-month labels within `period`.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Roster file format version understood by this build
pub const ROSTER_VERSION: u32 = 1;

/// Team roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// File format version
    pub version: u32,
    /// Period the dates belong to, e.g. `2024-06`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Team members
    #[serde(default)]
    pub members: Vec<RosterMember>,
}

/// One team member's schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    /// Nickname the assistant uses to refer to the member
    pub nickname: String,
    /// Full name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Work-from-anywhere days
    #[serde(default)]
    pub wfa: Vec<String>,
    /// Work-from-office days
    #[serde(default)]
    pub wfo: Vec<String>,
    /// Leave days
    #[serde(default)]
    pub leave: Vec<String>,
}

/// Which schedule a lookup reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Work from anywhere
    Wfa,
    /// Work from office
    Wfo,
    /// Leave
    Leave,
}

impl RosterMember {
    /// Days of the given schedule
    pub fn dates(&self, kind: ScheduleKind) -> &[String] {
        match kind {
            ScheduleKind::Wfa => &self.wfa,
            ScheduleKind::Wfo => &self.wfo,
            ScheduleKind::Leave => &self.leave,
        }
    }
}

/// One member's matching days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Member nickname as written in the roster
    pub nickname: String,
    /// Matching days in roster order
    pub dates: Vec<String>,
}

/// Canonical form of a day label: numeric labels lose leading zeros
fn normalize_date(date: &str) -> String {
    let trimmed = date.trim();
    match trimmed.parse::<u32>() {
        Ok(day) => day.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

impl Roster {
    /// Load and validate a roster file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid YAML, or fails
    /// [`Roster::validate`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Roster(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let roster = Self::from_yaml_str(&contents)?;
        tracing::info!(
            "Loaded roster from {}: {} members, period={}",
            path.display(),
            roster.members.len(),
            roster.period.as_deref().unwrap_or("-")
        );
        Ok(roster)
    }

    /// Parse and validate a roster from YAML text
    ///
    /// # Errors
    ///
    /// Returns error on invalid YAML or a roster that fails validation
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let roster: Roster = serde_yaml::from_str(contents)
            .map_err(|e| RelayError::Roster(format!("Failed to parse roster: {}", e)))?;
        roster.validate()?;
        Ok(roster)
    }

    /// Check version and nickname uniqueness
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Roster`] describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.version != ROSTER_VERSION {
            return Err(RelayError::Roster(format!(
                "Unsupported roster version {} (expected {})",
                self.version, ROSTER_VERSION
            ))
            .into());
        }

        let mut seen = HashSet::new();
        for member in &self.members {
            let key = member.nickname.trim().to_lowercase();
            if key.is_empty() {
                return Err(RelayError::Roster("Member nickname cannot be empty".to_string()).into());
            }
            if !seen.insert(key) {
                return Err(RelayError::Roster(format!(
                    "Duplicate nickname: {}",
                    member.nickname
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Find the days of a schedule matching the requested dates and nicknames
    ///
    /// An empty `dates` or `nicknames` filter matches everything. Nicknames
    /// compare case-insensitively; numeric day labels compare by value, so
    /// `"05"` matches `"5"`. Members left with no matching days are omitted.
    pub fn lookup(
        &self,
        kind: ScheduleKind,
        dates: &[String],
        nicknames: &[String],
    ) -> Vec<ScheduleEntry> {
        let wanted_dates: HashSet<String> = dates.iter().map(|d| normalize_date(d)).collect();
        let wanted_names: HashSet<String> = nicknames
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();

        self.members
            .iter()
            .filter(|m| {
                wanted_names.is_empty() || wanted_names.contains(&m.nickname.trim().to_lowercase())
            })
            .map(|m| ScheduleEntry {
                nickname: m.nickname.clone(),
                dates: m
                    .dates(kind)
                    .iter()
                    .filter(|d| wanted_dates.is_empty() || wanted_dates.contains(&normalize_date(d)))
                    .cloned()
                    .collect(),
            })
            .filter(|entry| !entry.dates.is_empty())
            .collect()
    }
}
