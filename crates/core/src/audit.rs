use serde::{Deserialize, Serialize};

use crate::domain::analysis::OverallStatus;
use crate::domain::sensor::SensorType;
use crate::domain::session::MonitoringStatus;

/// What a history record describes. Serialized with an `action` tag so the
/// flattened record reads like `{"action": "constraint_set", ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InteractionAction {
    UserQuery {
        text: String,
    },
    ConstraintSet {
        sensor_type: SensorType,
        min_value: Option<f64>,
        max_value: Option<f64>,
    },
    ConstraintsCleared {
        sensor_type: Option<String>,
    },
    ReadingsCollected {
        collection_id: String,
    },
    AnalysisPerformed {
        reading_id: String,
        overall_status: OverallStatus,
        alerts_count: usize,
    },
    MonitoringStatusChanged {
        status: MonitoringStatus,
    },
}

impl InteractionAction {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::UserQuery { .. } => "user_query",
            Self::ConstraintSet { .. } => "constraint_set",
            Self::ConstraintsCleared { .. } => "constraints_cleared",
            Self::ReadingsCollected { .. } => "readings_collected",
            Self::AnalysisPerformed { .. } => "analysis_performed",
            Self::MonitoringStatusChanged { .. } => "monitoring_status_changed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionEntry {
    #[serde(flatten)]
    pub action: InteractionAction,
    pub timestamp: String,
}

/// Append-only audit trail for one session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionHistory {
    entries: Vec<InteractionEntry>,
}

impl InteractionHistory {
    pub fn record(&mut self, action: InteractionAction, timestamp: impl Into<String>) {
        self.entries.push(InteractionEntry { action, timestamp: timestamp.into() });
    }

    pub fn entries(&self) -> &[InteractionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&InteractionEntry> {
        self.entries.last()
    }
}
