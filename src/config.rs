use crate::error::{CrossError, Result};
use crate::rules::MarkerSet;
use crate::solvers::beam_search::Config;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Generation bound above which pair enumeration gets expensive.
pub const GENERATIONS_WARN_ABOVE: usize = 5;

/// Everything a planning run reads from the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub max_generations: usize,
    pub search: Config,
    pub markers: MarkerSet,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_generations: 3,
            search: Config::default(),
            markers: MarkerSet::default(),
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_generations == 0 {
            return Err(CrossError::Configuration(
                "max_generations must be at least 1".to_owned(),
            ));
        }
        if self.max_generations > GENERATIONS_WARN_ABOVE {
            warn!(
                "max_generations = {} is large, the search may take a long time",
                self.max_generations
            );
        }
        if self.markers.lethal.iter().chain(&self.markers.balancers).any(|m| m.is_empty()) {
            return Err(CrossError::Configuration(
                "marker names must not be empty".to_owned(),
            ));
        }
        self.search.validate()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: PlannerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CrossError::Configuration(format!("Failed to serialize: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
