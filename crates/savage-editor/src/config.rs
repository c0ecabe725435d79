use std::num::NonZeroUsize;

use anyhow::Context;
use savage_undo::HistoryConfig;

pub const CAPACITY_VAR: &str = "SAVAGE_HISTORY_CAPACITY";
pub const PROJECT_NAME_VAR: &str = "SAVAGE_PROJECT_NAME";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub project_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            project_name: "Untitled".into(),
        }
    }
}

impl EditorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `0` or an unset capacity means unbounded.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(CAPACITY_VAR) {
            let capacity: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{CAPACITY_VAR} must be a number, got {raw:?}"))?;
            config.history.capacity = NonZeroUsize::new(capacity);
        }

        if let Some(name) = lookup(PROJECT_NAME_VAR) {
            let name = name.trim();
            if !name.is_empty() {
                config.project_name = name.to_string();
            }
        }

        log::debug!("editor config: {config:?}");
        Ok(config)
    }
}
