use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// One of the three monitored channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    FeederRate,
    Vibration,
}

impl SensorType {
    pub const ALL: [SensorType; 3] = [Self::Temperature, Self::FeederRate, Self::Vibration];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::FeederRate => "feeder_rate",
            Self::Vibration => "vibration",
        }
    }

    /// Human label used at the start of alert text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::FeederRate => "Feeder Rate",
            Self::Vibration => "Vibration",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::FeederRate => "kg/h",
            Self::Vibration => "mm/s",
        }
    }

    /// Plausible span for synthesized values.
    pub fn synthetic_range(&self) -> RangeInclusive<f64> {
        match self {
            Self::Temperature => 900.0..=1300.0,
            Self::FeederRate => 30.0..=180.0,
            Self::Vibration => 5.0..=25.0,
        }
    }

    pub fn valid_names() -> String {
        Self::ALL.iter().map(SensorType::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "temperature" => Ok(Self::Temperature),
            "feeder_rate" => Ok(Self::FeederRate),
            "vibration" => Ok(Self::Vibration),
            _ => Err(DomainError::InvalidSensorType { value: value.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Online,
    Offline,
}
