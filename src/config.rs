//! Engine configuration: defaults, `.archscope.yaml`, then environment.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::layout::LayoutSpacing;

/// Project-level configuration file name.
pub const CONFIG_FILE: &str = ".archscope.yaml";

/// Group used for files no grouping strategy could place.
pub const DEFAULT_GROUP: &str = "Core/Utilities";

/// Tunables of the graph engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Model used for inference requests.
    pub model: String,
    /// Token cap for inference responses.
    pub max_tokens: u32,
    /// Maximum number of steps in the heuristic process flow.
    pub flow_step_cap: usize,
    /// Group assigned to files without one.
    pub default_group: String,
    /// API key of the inference collaborator; `None` means inference is absent.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Layout spacing.
    pub spacing: LayoutSpacing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 4096,
            flow_step_cap: 5,
            default_group: DEFAULT_GROUP.into(),
            api_key: None,
            spacing: LayoutSpacing::default(),
        }
    }
}

impl EngineConfig {
    /// Loads `.archscope.yaml` from `root` (if present) and applies the
    /// process environment on top, after reading `.env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed, or an
    /// environment override is malformed.
    pub fn load(root: &Path) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = root.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| EngineError::Config(format!("failed to read {}: {e}", path.display())))?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Parses a YAML document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| EngineError::Config(format!("invalid config: {e}")))
    }

    /// Applies `ARCHSCOPE_*` and `ANTHROPIC_API_KEY` overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override does not parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(model) = lookup("ARCHSCOPE_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("ARCHSCOPE_MAX_TOKENS") {
            self.max_tokens = raw
                .parse()
                .map_err(|e| EngineError::Config(format!("ARCHSCOPE_MAX_TOKENS={raw}: {e}")))?;
        }
        if let Some(raw) = lookup("ARCHSCOPE_FLOW_STEPS") {
            self.flow_step_cap = raw
                .parse()
                .map_err(|e| EngineError::Config(format!("ARCHSCOPE_FLOW_STEPS={raw}: {e}")))?;
        }
        if let Some(key) = lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        Ok(())
    }

    /// Whether an inference collaborator is configured.
    #[must_use]
    pub fn inference_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}
