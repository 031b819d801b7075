//! Trigger table configuration.
//!
//! Maps a prompt label to the run length that must sustain and the action to
//! perform. Supplied as a YAML file so new labels and actions need no code
//! change.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::debounce::TriggerRule;
use crate::dispatch::Action;
use crate::error::{ClipwatchError, Result};

/// Label-to-rule table consumed by [`crate::debounce::DebounceEngine`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub triggers: HashMap<String, TriggerRule>,
}

impl TriggerConfig {
    /// Read a trigger table from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ClipwatchError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&raw).map_err(|e| {
            ClipwatchError::Config(format!("invalid trigger table {}: {}", path.display(), e))
        })
    }

    /// Write the table to a YAML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Look up the rule for a label, if one is configured.
    pub fn rule(&self, label: &str) -> Option<&TriggerRule> {
        self.triggers.get(label)
    }

    /// Baby-monitor style starter table: a sustained-state label with a long
    /// run and an event-style label with a short one.
    pub fn example() -> Self {
        let mut triggers = HashMap::new();
        triggers.insert(
            "crying baby".to_string(),
            TriggerRule {
                run_length: 110,
                action: Action::Message {
                    text: "Baby is crying".to_string(),
                },
            },
        );
        triggers.insert(
            "awake baby".to_string(),
            TriggerRule {
                run_length: 30,
                action: Action::Sound {
                    path: PathBuf::from("lullaby.mp3"),
                },
            },
        );
        Self { triggers }
    }
}
