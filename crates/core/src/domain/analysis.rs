use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::sensor::{SensorStatus, SensorType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintStatus {
    NoConstraints,
    SensorOffline,
    Normal,
    Violation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Normal,
    Alert,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Alert => "alert",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorAnalysis {
    pub value: Option<f64>,
    pub unit: String,
    pub sensor_status: SensorStatus,
    pub constraint_status: ConstraintStatus,
    pub violations: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub reading_id: String,
    pub timestamp: String,
    pub analysis_timestamp: String,
    pub sensor_analyses: BTreeMap<SensorType, SensorAnalysis>,
    pub overall_status: OverallStatus,
    pub alerts: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    pub fn is_alert(&self) -> bool {
        self.overall_status == OverallStatus::Alert
    }

    pub fn violation_count(&self) -> usize {
        self.sensor_analyses.values().map(|analysis| analysis.violations.len()).sum()
    }
}
