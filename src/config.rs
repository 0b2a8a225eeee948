use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CycleError, Result};
use crate::logging::LogConfig;

const MAX_CYCLE_LENGTH: u32 = 100;

/// User-configured defaults for the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Cycle length used until at least one valid cycle has been observed.
    pub default_cycle_length: u32,
    pub period_length: u32,
    /// Last period start given during onboarding, used as the anchor when
    /// no start can be inferred from the logs.
    pub fallback_anchor: Option<NaiveDate>,
    /// Number of symptoms and moods surfaced by insights.
    pub top_symptoms: usize,
    pub show_fertility: bool,
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_cycle_length: 28,
            period_length: 5,
            fallback_anchor: None,
            top_symptoms: 3,
            show_fertility: false,
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// `<config dir>/cykel/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or(CycleError::NoConfigDir)?
            .join("cykel")
            .join("config.toml"))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CycleError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Load from the default location, or fall back to defaults when no
    /// config file has been written yet.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path()?;
        match Self::load(&path) {
            Err(CycleError::ConfigNotFound { .. }) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_cycle_length == 0 {
            return Err(CycleError::InvalidConfig(
                "default_cycle_length must be at least 1".into(),
            ));
        }
        if self.period_length == 0 {
            return Err(CycleError::InvalidConfig(
                "period_length must be at least 1".into(),
            ));
        }
        if self.period_length > self.default_cycle_length {
            return Err(CycleError::InvalidConfig(format!(
                "period_length ({}) exceeds default_cycle_length ({})",
                self.period_length, self.default_cycle_length
            )));
        }
        if self.top_symptoms == 0 {
            return Err(CycleError::InvalidConfig(
                "top_symptoms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Pull user-entered lengths back into a usable range.
    pub fn clamped(mut self) -> Self {
        self.default_cycle_length = self.default_cycle_length.clamp(1, MAX_CYCLE_LENGTH);
        self.period_length = self.period_length.clamp(1, self.default_cycle_length);
        self.top_symptoms = self.top_symptoms.max(1);
        self
    }

    pub(crate) fn cycle_length_days(&self) -> i64 {
        i64::from(self.default_cycle_length)
    }

    pub(crate) fn period_length_days(&self) -> i64 {
        i64::from(self.period_length)
    }
}
