/// run settings for brushtrace
/// these can be read from a JSON file and overridden from the command line
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::greedy::GreedyConfig;
use crate::tabu::TabuConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// seed for the single random source shared by both phases
    pub seed: u64,
    pub greedy: GreedyConfig,
    pub tabu: TabuConfig,
    /// skip refinement and keep the greedy solution
    pub tabu_enabled: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            seed: 12345,
            greedy: GreedyConfig::default(),
            tabu: TabuConfig::default(),
            tabu_enabled: true,
        }
    }
}

impl RunSettings {
    pub fn validate(&self) -> Result<()> {
        self.greedy.validate()?;
        if self.tabu_enabled {
            self.tabu.validate()?;
        }
        Ok(())
    }

    /// save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// load settings from a JSON file. missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// load settings, or fall back to defaults if the file is missing or malformed
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(Error::Io { source, .. }) => {
                warn!("cannot read {}: {}. using defaults.", path.display(), source);
                Self::default()
            }
            Err(e) => {
                warn!("failed to parse {}: {}. using defaults.", path.display(), e);
                Self::default()
            }
        }
    }
}
