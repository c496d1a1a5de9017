pub mod analyzer;
pub mod constraints;
pub mod readings;
pub mod reports;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::InteractionAction;
use crate::domain::session::{MonitoringStatus, SessionState};
use crate::domain::timestamp_now;

pub use analyzer::analyze_readings;
pub use constraints::{clear_constraints, set_constraint, ClearOutcome, ConstraintUpdate};
pub use readings::{collect_reading, ReadingSource, ScriptedReadingSource, SyntheticReadingSource};
pub use reports::{generate_report, Report, ReportBody, ReportBuilder, ReportType};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringChange {
    pub previous: MonitoringStatus,
    pub current: MonitoringStatus,
    pub message: String,
    pub timestamp: String,
}

/// Switches monitoring mode. Re-applying the current status is allowed and still recorded.
pub fn set_monitoring_status(
    state: &mut SessionState,
    status: MonitoringStatus,
) -> MonitoringChange {
    let timestamp = timestamp_now();
    let previous = std::mem::replace(&mut state.monitoring_status, status);
    state
        .interaction_history
        .record(InteractionAction::MonitoringStatusChanged { status }, timestamp.clone());

    let message = if previous == status {
        format!("Monitoring already {}", status.as_str())
    } else {
        format!("Monitoring {}", status.as_str())
    };
    info!(
        event_name = "monitoring.status_changed",
        previous = previous.as_str(),
        current = status.as_str(),
        "{message}"
    );

    MonitoringChange { previous, current: status, message, timestamp }
}

#[cfg(test)]
mod tests {
    use super::set_monitoring_status;
    use crate::domain::session::{MonitoringStatus, SessionState};

    #[test]
    fn toggling_monitoring_records_history() {
        let mut state = SessionState::new("System Operator");

        let started = set_monitoring_status(&mut state, MonitoringStatus::Active);
        let repeated = set_monitoring_status(&mut state, MonitoringStatus::Active);
        let stopped = set_monitoring_status(&mut state, MonitoringStatus::Inactive);

        assert_eq!(started.message, "Monitoring active");
        assert_eq!(repeated.message, "Monitoring already active");
        assert_eq!(stopped.previous, MonitoringStatus::Active);
        assert_eq!(state.monitoring_status, MonitoringStatus::Inactive);
        assert_eq!(state.interaction_history.len(), 3);
    }
}
