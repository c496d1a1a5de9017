use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::sensor::SensorType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub sensor_type: SensorType,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: String,
}

impl Constraint {
    pub fn unbounded(sensor_type: SensorType) -> Self {
        Self { sensor_type, min: None, max: None, unit: sensor_type.unit().to_string() }
    }

    pub fn has_any_bound(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn has_both_bounds(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }
}

/// Operator limits keyed by channel. Entries are mutated in place and never removed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintSet {
    entries: BTreeMap<SensorType, Constraint>,
}

impl ConstraintSet {
    /// One unbounded entry per channel, as a fresh session starts with.
    pub fn seeded() -> Self {
        let entries = SensorType::ALL
            .into_iter()
            .map(|sensor| (sensor, Constraint::unbounded(sensor)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, sensor: SensorType) -> Option<&Constraint> {
        self.entries.get(&sensor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrites only the supplied bounds, creating the entry on first use.
    pub fn set(&mut self, sensor: SensorType, min: Option<f64>, max: Option<f64>) -> &Constraint {
        let entry = self.entries.entry(sensor).or_insert_with(|| Constraint::unbounded(sensor));
        if let Some(min) = min {
            entry.min = Some(min);
        }
        if let Some(max) = max {
            entry.max = Some(max);
        }
        entry
    }

    /// Resets both bounds, keeping the unit. Returns `false` if the channel has no entry.
    pub fn clear(&mut self, sensor: SensorType) -> bool {
        match self.entries.get_mut(&sensor) {
            Some(entry) => {
                entry.min = None;
                entry.max = None;
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.min = None;
            entry.max = None;
        }
    }

    pub fn configured_count(&self) -> usize {
        self.entries.values().filter(|constraint| constraint.has_any_bound()).count()
    }

    /// Every recognized channel has an entry with at least one bound.
    pub fn all_channels_configured(&self) -> bool {
        SensorType::ALL
            .iter()
            .all(|sensor| self.get(*sensor).map(Constraint::has_any_bound).unwrap_or(false))
    }

    /// Every entry present in the set carries both bounds.
    pub fn all_present_fully_bounded(&self) -> bool {
        self.entries.values().all(Constraint::has_both_bounds)
    }
}
