use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::sensor::{SensorStatus, SensorType};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_type: SensorType,
    /// `None` when the sensor could not produce a value (offline).
    pub value: Option<f64>,
    pub unit: String,
    pub timestamp: String,
    pub status: SensorStatus,
}

impl Reading {
    pub fn online(sensor_type: SensorType, value: f64, timestamp: impl Into<String>) -> Self {
        Self {
            sensor_type,
            value: Some(value),
            unit: sensor_type.unit().to_string(),
            timestamp: timestamp.into(),
            status: SensorStatus::Online,
        }
    }

    pub fn offline(sensor_type: SensorType, timestamp: impl Into<String>) -> Self {
        Self {
            sensor_type,
            value: None,
            unit: sensor_type.unit().to_string(),
            timestamp: timestamp.into(),
            status: SensorStatus::Offline,
        }
    }
}

/// One collection across all channels. Immutable once appended to the log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingEntry {
    pub collection_id: String,
    pub timestamp: String,
    pub readings: BTreeMap<SensorType, Reading>,
}

impl ReadingEntry {
    pub fn collection_id_for(prior_count: usize) -> String {
        format!("reading_{}", prior_count + 1)
    }

    pub fn value_of(&self, sensor: SensorType) -> Option<f64> {
        self.readings.get(&sensor).and_then(|reading| reading.value)
    }
}
