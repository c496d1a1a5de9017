use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::InteractionAction;
use crate::domain::sensor::SensorType;
use crate::domain::session::SessionState;
use crate::domain::timestamp_now;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintUpdate {
    pub sensor_type: SensorType,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub unit: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearOutcome {
    pub sensor_type: Option<String>,
    pub message: String,
    pub timestamp: String,
}

pub fn set_constraint(
    state: &mut SessionState,
    sensor_type: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<ConstraintUpdate, DomainError> {
    let sensor = sensor_type.parse::<SensorType>()?;
    let timestamp = timestamp_now();

    let stored = state.constraints.set(sensor, min, max).clone();
    if stored.is_inverted() {
        warn!(
            event_name = "constraints.inverted_bounds",
            sensor_type = sensor.as_str(),
            min = ?stored.min,
            max = ?stored.max,
            "minimum exceeds maximum; every reading will violate this constraint"
        );
    }

    state.interaction_history.record(
        InteractionAction::ConstraintSet { sensor_type: sensor, min_value: min, max_value: max },
        timestamp.clone(),
    );

    let message = format!(
        "Constraint set for {sensor}: min={}, max={}",
        format_bound(stored.min),
        format_bound(stored.max)
    );
    info!(event_name = "constraints.set", sensor_type = sensor.as_str(), "{message}");

    Ok(ConstraintUpdate {
        sensor_type: sensor,
        min_value: stored.min,
        max_value: stored.max,
        unit: stored.unit,
        message,
        timestamp,
    })
}

/// Clears one channel by name, or every present channel when `sensor_type` is `None`.
pub fn clear_constraints(
    state: &mut SessionState,
    sensor_type: Option<&str>,
) -> Result<ClearOutcome, DomainError> {
    let timestamp = timestamp_now();

    let message = match sensor_type {
        Some(name) => {
            let cleared = name
                .parse::<SensorType>()
                .map(|sensor| state.constraints.clear(sensor))
                .unwrap_or(false);
            if !cleared {
                return Err(DomainError::NotFound { sensor_type: name.to_string() });
            }
            format!("Cleared constraints for {}", name.trim().to_ascii_lowercase())
        }
        None => {
            state.constraints.clear_all();
            "Cleared all sensor constraints".to_string()
        }
    };

    let sensor_type = sensor_type.map(|name| name.trim().to_ascii_lowercase());
    state.interaction_history.record(
        InteractionAction::ConstraintsCleared { sensor_type: sensor_type.clone() },
        timestamp.clone(),
    );
    info!(event_name = "constraints.cleared", sensor_type = ?sensor_type, "{message}");

    Ok(ClearOutcome { sensor_type, message, timestamp })
}

pub(crate) fn format_bound(bound: Option<f64>) -> String {
    bound.map(|value| value.to_string()).unwrap_or_else(|| "None".to_string())
}
