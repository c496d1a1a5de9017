use serde::{Deserialize, Serialize};

use crate::domain::analysis::AnalysisResult;
use crate::domain::reading::ReadingEntry;
use crate::errors::DomainError;
use crate::monitoring::{ClearOutcome, ConstraintUpdate, MonitoringChange, Report};

/// One operator intent after routing. Sensor and report names stay raw so
/// that validation errors surface from the operation itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    SetConstraint { sensor_type: String, min: Option<f64>, max: Option<f64> },
    ClearConstraints { sensor_type: Option<String> },
    CollectReading,
    AnalyzeReadings { reading_id: Option<String> },
    GenerateReport { report_type: String },
    StartMonitoring,
    StopMonitoring,
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetConstraint { .. } => "set_constraint",
            Self::ClearConstraints { .. } => "clear_constraints",
            Self::CollectReading => "collect_sensor_reading",
            Self::AnalyzeReadings { .. } => "analyze_readings",
            Self::GenerateReport { .. } => "generate_report",
            Self::StartMonitoring => "start_monitoring",
            Self::StopMonitoring => "stop_monitoring",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationOutput {
    ConstraintSet(ConstraintUpdate),
    ConstraintsCleared(ClearOutcome),
    ReadingCollected(ReadingEntry),
    AnalysisCompleted(AnalysisResult),
    ReportGenerated(Report),
    MonitoringChanged(MonitoringChange),
}

impl OperationOutput {
    pub fn message(&self) -> String {
        match self {
            Self::ConstraintSet(update) => update.message.clone(),
            Self::ConstraintsCleared(outcome) => outcome.message.clone(),
            Self::ReadingCollected(_) => "Synthetic sensor readings collected.".to_string(),
            Self::AnalysisCompleted(result) => {
                format!("Analysis completed for reading {}", result.reading_id)
            }
            Self::ReportGenerated(report) => report.message(),
            Self::MonitoringChanged(change) => change.message.clone(),
        }
    }
}

/// Follow-up steps the orchestrator chains after an operator action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoTrigger {
    /// Every channel has at least one bound and nothing has been collected yet.
    CollectReadings,
    /// Every configured channel has both bounds and a collection exists.
    AnalyzeLatest,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AutoStep {
    pub trigger: AutoTrigger,
    pub result: Result<OperationOutput, DomainError>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandOutcome {
    pub command: SessionCommand,
    pub result: Result<OperationOutput, DomainError>,
}

/// Everything one operator turn produced: the routed commands in order,
/// followed by whatever the trigger rules chained afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurnOutcome {
    pub outcomes: Vec<CommandOutcome>,
    pub auto_steps: Vec<AutoStep>,
}

impl TurnOutcome {
    pub fn first_result(&self) -> Option<&Result<OperationOutput, DomainError>> {
        self.outcomes.first().map(|outcome| &outcome.result)
    }

    pub fn triggered(&self, trigger: AutoTrigger) -> bool {
        self.auto_steps.iter().any(|step| step.trigger == trigger)
    }
}
