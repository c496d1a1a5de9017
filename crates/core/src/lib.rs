//! Sensor constraint monitoring core.
//!
//! Holds operator-configured limits for the three monitored channels,
//! collects readings, evaluates them against the limits and derives reports.
//! [`flows::SessionOrchestrator`] owns the per-session state and chains
//! collection and analysis once the configured limits allow it.

pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod monitoring;

pub use audit::{InteractionAction, InteractionEntry, InteractionHistory};
pub use domain::analysis::{AnalysisResult, ConstraintStatus, OverallStatus, SensorAnalysis};
pub use domain::constraint::{Constraint, ConstraintSet};
pub use domain::reading::{Reading, ReadingEntry};
pub use domain::sensor::{SensorStatus, SensorType};
pub use domain::session::{MonitoringStatus, SessionContext, SessionState};
pub use errors::DomainError;
pub use flows::{
    AutoStep, AutoTrigger, CommandOutcome, OperationOutput, SessionCommand, SessionOrchestrator,
    TurnOutcome,
};
pub use monitoring::{
    ReadingSource, Report, ReportBody, ReportBuilder, ReportType, ScriptedReadingSource,
    SyntheticReadingSource,
};
