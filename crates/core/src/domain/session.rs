use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::InteractionHistory;
use crate::domain::analysis::AnalysisResult;
use crate::domain::constraint::ConstraintSet;
use crate::domain::reading::ReadingEntry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringStatus {
    #[default]
    Inactive,
    Active,
}

impl MonitoringStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
        }
    }
}

/// Identity supplied by the surrounding front-end. Read-only to the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub app_name: String,
    pub user_id: String,
    pub user_name: String,
}

impl SessionContext {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new("Sensor Monitoring", "operator_001", "System Operator")
    }
}

/// Everything one interactive session accumulates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_name: String,
    pub constraints: ConstraintSet,
    pub sensor_readings: Vec<ReadingEntry>,
    pub analysis_results: Vec<AnalysisResult>,
    pub interaction_history: InteractionHistory,
    pub monitoring_status: MonitoringStatus,
}

impl SessionState {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            constraints: ConstraintSet::seeded(),
            sensor_readings: Vec::new(),
            analysis_results: Vec::new(),
            interaction_history: InteractionHistory::default(),
            monitoring_status: MonitoringStatus::Inactive,
        }
    }

    pub fn latest_reading(&self) -> Option<&ReadingEntry> {
        self.sensor_readings.last()
    }

    pub fn latest_analysis(&self) -> Option<&AnalysisResult> {
        self.analysis_results.last()
    }
}
