//! Run-length debouncing of per-frame label decisions.
//!
//! One frame's best match for a tracked entity is a noisy signal; an action
//! should fire only after the same label sustains for its configured run
//! length, and exactly once per sustained run. The engine here is pure state,
//! no I/O: it returns the event to fire and the caller hands it to a
//! [`crate::dispatch::DispatchQueue`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TriggerConfig;
use crate::dispatch::Action;

/// Stable tracker id for a detected entity, assigned upstream.
pub type EntityId = u64;

/// How long a label must sustain, and what to do when it does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRule {
    /// Consecutive qualifying frames required before firing.
    pub run_length: u32,
    pub action: Action,
}

/// A debounced, one-shot detection ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerEvent {
    pub entity: EntityId,
    pub label: String,
    pub action: Action,
    pub fired_at: DateTime<Utc>,
}

/// Current run for one entity. The reset-on-interruption rule means at most
/// one label can be accumulating per entity at any time.
#[derive(Debug)]
struct Run {
    label: String,
    count: u32,
    latched: bool,
}

/// Per-entity hysteresis state machine over best-match labels.
pub struct DebounceEngine {
    rules: HashMap<String, TriggerRule>,
    runs: HashMap<EntityId, Run>,
}

impl DebounceEngine {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            rules: config.triggers,
            runs: HashMap::new(),
        }
    }

    /// Feed one frame's best match for `entity` (`None` when nothing
    /// matched). Returns the event to dispatch when a run reaches its
    /// configured length; at most once per run.
    ///
    /// Labels without a configured rule are ignored, and like any
    /// non-qualifying observation they reset the entity's current run.
    pub fn observe(&mut self, entity: EntityId, label: Option<&str>) -> Option<TriggerEvent> {
        let Some(label) = label else {
            self.runs.remove(&entity);
            return None;
        };
        let Some(rule) = self.rules.get(label) else {
            self.runs.remove(&entity);
            return None;
        };

        let run = self.runs.entry(entity).or_insert_with(|| Run {
            label: label.to_string(),
            count: 0,
            latched: false,
        });
        if run.label != label {
            // Interruption by another label: the new run starts from zero.
            *run = Run {
                label: label.to_string(),
                count: 0,
                latched: false,
            };
        }

        run.count += 1;
        if run.count >= rule.run_length && !run.latched {
            run.latched = true;
            // The next firing needs a full fresh run.
            run.count = 0;
            return Some(TriggerEvent {
                entity,
                label: label.to_string(),
                action: rule.action.clone(),
                fired_at: Utc::now(),
            });
        }
        None
    }

    /// Drop all state for an entity the upstream tracker has retired.
    pub fn forget(&mut self, entity: EntityId) {
        self.runs.remove(&entity);
    }

    /// Drop all per-entity state, e.g. on stream restart.
    pub fn reset(&mut self) {
        self.runs.clear();
    }
}
