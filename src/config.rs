// ⚙️ Application config - acting user, active filters, monthly targets
//
// Loaded from a JSON file. `.env` and two environment variables can point at
// the file and override the acting user.

use crate::aggregate::MonthlyTargets;
use crate::error::Result;
use crate::filter::FilterConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub const CONFIG_PATH_VAR: &str = "TARGET_REPORT_CONFIG";
pub const USER_VAR: &str = "TARGET_REPORT_USER";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Stamped as `created_by` on import; imports are refused without one
    pub acting_user: Option<String>,
    pub filter: FilterConfig,
    /// Revenue target per month number (1-12)
    pub monthly_targets: MonthlyTargets,
}

impl AppConfig {
    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: AppConfig = serde_json::from_str(&content)?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// `.env` + environment. A missing config file falls back to defaults.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env loaded: {}", e);
        }
        Self::from_vars(env::var(CONFIG_PATH_VAR).ok(), env::var(USER_VAR).ok())
    }

    fn from_vars(config_path: Option<String>, user: Option<String>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) if Path::new(&path).exists() => Self::from_file(&path)?,
            Some(path) => {
                warn!("Config file {} not found, using defaults", path);
                AppConfig::default()
            }
            None => AppConfig::default(),
        };

        if let Some(user) = user.filter(|u| !u.trim().is_empty()) {
            config.acting_user = Some(user.trim().to_string());
        }
        Ok(config)
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.acting_user = Some(user.to_string());
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_target(mut self, month: u32, amount: f64) -> Self {
        self.monthly_targets.insert(month, amount);
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
