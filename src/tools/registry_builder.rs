//! Startup construction of the tool registry
//!
//! The registry is built once, validated, and then shared read-only with the
//! run driver. Every tool the assistant may call is registered here.

use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::error::Result;
use crate::locales::Lang;
use crate::tools::calendar::{Clock, CurrentDateTool, CurrentWorkWeekTool, SystemClock};
use crate::tools::roster::{Roster, ScheduleKind};
use crate::tools::schedule::ScheduleTool;
use crate::tools::{ToolExecutor, ToolRegistry};

/// Builder for the assistant's tool registry
///
/// # Examples
///
/// ```
/// use assistant_relay::tools::{Roster, ToolRegistryBuilder};
/// use std::sync::Arc;
///
/// let roster = Roster::from_yaml_str("version: 1\nmembers: []\n").unwrap();
/// let registry = ToolRegistryBuilder::new(Arc::new(roster)).build().unwrap();
/// assert_eq!(registry.len(), 5);
/// ```
pub struct ToolRegistryBuilder {
    /// Roster injected into the schedule tools
    roster: Arc<Roster>,
    /// Clock injected into the date tools
    clock: Arc<dyn Clock>,
    /// Language of the "no data" fallback
    lang: Lang,
}

impl ToolRegistryBuilder {
    /// Create a builder over `roster` using the wall clock at UTC+7
    ///
    /// # Arguments
    ///
    /// * `roster` - Team roster shared by the schedule tools
    ///
    /// # Returns
    ///
    /// Returns a new ToolRegistryBuilder instance
    pub fn new(roster: Arc<Roster>) -> Self {
        Self {
            roster,
            clock: Arc::new(SystemClock::with_offset_hours(
                ToolsConfig::default().utc_offset_hours,
            )),
            lang: Lang::default(),
        }
    }

    /// Replace the clock the date tools read
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the language of tool fallback messages
    pub fn with_lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Register every tool and validate the result
    ///
    /// # Errors
    ///
    /// Returns error if two tools share a name or a tool is registered under
    /// a name other than its own
    pub fn build(&self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();

        let tools: Vec<Arc<dyn ToolExecutor>> = vec![
            Arc::new(CurrentDateTool::new(Arc::clone(&self.clock))),
            Arc::new(CurrentWorkWeekTool::new(Arc::clone(&self.clock))),
            Arc::new(ScheduleTool::new(
                ScheduleKind::Wfa,
                Arc::clone(&self.roster),
                self.lang,
            )),
            Arc::new(ScheduleTool::new(
                ScheduleKind::Wfo,
                Arc::clone(&self.roster),
                self.lang,
            )),
            Arc::new(ScheduleTool::new(
                ScheduleKind::Leave,
                Arc::clone(&self.roster),
                self.lang,
            )),
        ];
        for tool in tools {
            registry.register(tool)?;
        }

        registry.validate()?;
        tracing::debug!("Built tool registry: {:?}", registry.names());
        Ok(registry)
    }
}

/// Load the roster named by configuration and build the registry
///
/// # Errors
///
/// Returns error if the roster cannot be loaded or the registry fails
/// validation
pub fn build_registry(config: &ToolsConfig, lang: Lang) -> Result<ToolRegistry> {
    let roster = Roster::load(&config.roster_path)?;
    ToolRegistryBuilder::new(Arc::new(roster))
        .with_clock(Arc::new(SystemClock::with_offset_hours(
            config.utc_offset_hours,
        )))
        .with_lang(lang)
        .build()
}
