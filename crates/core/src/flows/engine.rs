use tracing::{info, warn};

use crate::audit::InteractionAction;
use crate::domain::constraint::ConstraintSet;
use crate::domain::session::{MonitoringStatus, SessionContext, SessionState};
use crate::domain::timestamp_now;
use crate::errors::DomainError;
use crate::flows::states::{
    AutoStep, AutoTrigger, CommandOutcome, OperationOutput, SessionCommand, TurnOutcome,
};
use crate::monitoring::{
    analyze_readings, clear_constraints, collect_reading, set_constraint, set_monitoring_status,
    ReadingSource, ReportBuilder, ReportType, SyntheticReadingSource,
};

/// Rule 1: each recognized channel has an entry with at least one bound.
pub fn all_constraints_configured(constraints: &ConstraintSet) -> bool {
    constraints.all_channels_configured()
}

/// Rule 2: each channel present in the store has both bounds, and at least one
/// collection exists. Stricter per channel than rule 1, but only over present
/// entries.
pub fn constraints_and_readings_ready(state: &SessionState) -> bool {
    state.constraints.all_present_fully_bounded() && !state.sensor_readings.is_empty()
}

/// Owns one session's state and sequences operator commands plus the
/// follow-up steps they trigger. Not shared across sessions.
pub struct SessionOrchestrator {
    context: SessionContext,
    state: SessionState,
    source: Box<dyn ReadingSource>,
    reports: ReportBuilder,
}

impl SessionOrchestrator {
    pub fn new(context: SessionContext, source: Box<dyn ReadingSource>) -> Self {
        let state = SessionState::new(context.user_name.clone());
        Self { context, state, source, reports: ReportBuilder::default() }
    }

    pub fn with_report_builder(mut self, reports: ReportBuilder) -> Self {
        self.reports = reports;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn record_user_query(&mut self, text: &str) {
        self.state
            .interaction_history
            .record(InteractionAction::UserQuery { text: text.to_string() }, timestamp_now());
    }

    /// Applies one command, then re-evaluates both trigger rules.
    pub fn handle(&mut self, command: SessionCommand) -> TurnOutcome {
        self.handle_turn(vec![command])
    }

    /// Applies every command routed from one operator message in order, then
    /// re-evaluates the trigger rules once. Failed commands do not stop the
    /// remaining ones, and an empty turn still evaluates the rules.
    pub fn handle_turn(&mut self, commands: Vec<SessionCommand>) -> TurnOutcome {
        let mut outcomes = Vec::with_capacity(commands.len());
        for command in commands {
            let result = self.execute(&command);
            if let Err(error) = &result {
                warn!(
                    event_name = "session.command_failed",
                    session_id = self.context.session_id.as_str(),
                    command = command.name(),
                    error_code = error.code(),
                    "{error}"
                );
            }
            outcomes.push(CommandOutcome { command, result });
        }

        let auto_steps = self.run_auto_triggers();
        TurnOutcome { outcomes, auto_steps }
    }

    fn run_auto_triggers(&mut self) -> Vec<AutoStep> {
        let mut steps = Vec::new();

        if all_constraints_configured(&self.state.constraints)
            && self.state.sensor_readings.is_empty()
        {
            info!(
                event_name = "session.auto_trigger",
                session_id = self.context.session_id.as_str(),
                trigger = "collect_readings",
                "all constraints set, collecting sensor readings"
            );
            let entry = collect_reading(&mut self.state, self.source.as_mut());
            steps.push(AutoStep {
                trigger: AutoTrigger::CollectReadings,
                result: Ok(OperationOutput::ReadingCollected(entry)),
            });
        }

        if constraints_and_readings_ready(&self.state) {
            info!(
                event_name = "session.auto_trigger",
                session_id = self.context.session_id.as_str(),
                trigger = "analyze_latest",
                "constraints and readings present, analyzing latest collection"
            );
            let result =
                analyze_readings(&mut self.state, None).map(OperationOutput::AnalysisCompleted);
            steps.push(AutoStep { trigger: AutoTrigger::AnalyzeLatest, result });
        }

        steps
    }

    fn execute(&mut self, command: &SessionCommand) -> Result<OperationOutput, DomainError> {
        match command {
            SessionCommand::SetConstraint { sensor_type, min, max } => {
                set_constraint(&mut self.state, sensor_type, *min, *max)
                    .map(OperationOutput::ConstraintSet)
            }
            SessionCommand::ClearConstraints { sensor_type } => {
                clear_constraints(&mut self.state, sensor_type.as_deref())
                    .map(OperationOutput::ConstraintsCleared)
            }
            SessionCommand::CollectReading => Ok(OperationOutput::ReadingCollected(
                collect_reading(&mut self.state, self.source.as_mut()),
            )),
            SessionCommand::AnalyzeReadings { reading_id } => {
                analyze_readings(&mut self.state, reading_id.as_deref())
                    .map(OperationOutput::AnalysisCompleted)
            }
            SessionCommand::GenerateReport { report_type } => {
                let report_type = report_type.parse::<ReportType>()?;
                Ok(OperationOutput::ReportGenerated(self.reports.build(&self.state, report_type)))
            }
            SessionCommand::StartMonitoring => Ok(OperationOutput::MonitoringChanged(
                set_monitoring_status(&mut self.state, MonitoringStatus::Active),
            )),
            SessionCommand::StopMonitoring => Ok(OperationOutput::MonitoringChanged(
                set_monitoring_status(&mut self.state, MonitoringStatus::Inactive),
            )),
        }
    }
}

impl Default for SessionOrchestrator {
    fn default() -> Self {
        Self::new(SessionContext::default(), Box::new(SyntheticReadingSource::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::{all_constraints_configured, constraints_and_readings_ready, SessionOrchestrator};
    use crate::domain::analysis::OverallStatus;
    use crate::domain::sensor::SensorType;
    use crate::domain::session::{SessionContext, SessionState};
    use crate::errors::DomainError;
    use crate::flows::states::{AutoTrigger, OperationOutput, SessionCommand};
    use crate::monitoring::ScriptedReadingSource;

    fn orchestrator() -> SessionOrchestrator {
        let source = ScriptedReadingSource::new().with_frame([
            (SensorType::Temperature, Some(1250.0)),
            (SensorType::FeederRate, Some(100.0)),
            (SensorType::Vibration, Some(15.0)),
        ]);
        SessionOrchestrator::new(SessionContext::default(), Box::new(source))
    }

    fn set(sensor: &str, min: Option<f64>, max: Option<f64>) -> SessionCommand {
        SessionCommand::SetConstraint { sensor_type: sensor.to_string(), min, max }
    }

    #[test]
    fn fully_bounded_channels_chain_collection_and_analysis() {
        let mut session = orchestrator();

        let first = session.handle(set("temperature", Some(1000.0), Some(1200.0)));
        let second = session.handle(set("feeder_rate", Some(50.0), Some(150.0)));
        assert!(first.auto_steps.is_empty());
        assert!(second.auto_steps.is_empty());

        let third = session.handle(set("vibration", Some(10.0), Some(20.0)));
        assert!(third.triggered(AutoTrigger::CollectReadings));
        assert!(third.triggered(AutoTrigger::AnalyzeLatest));

        let state = session.state();
        assert_eq!(state.sensor_readings.len(), 1);
        assert_eq!(state.analysis_results.len(), 1);
        assert_eq!(
            state.latest_analysis().map(|analysis| analysis.overall_status),
            Some(OverallStatus::Alert)
        );
    }

    #[test]
    fn readiness_rule_reanalyzes_on_every_later_turn() {
        let mut session = orchestrator();
        session.handle(set("temperature", Some(1000.0), Some(1200.0)));
        session.handle(set("feeder_rate", Some(50.0), Some(150.0)));
        session.handle(set("vibration", Some(10.0), Some(20.0)));
        assert!(constraints_and_readings_ready(session.state()));

        let turn =
            session.handle(SessionCommand::GenerateReport { report_type: "summary".to_string() });

        assert!(matches!(turn.first_result(), Some(Ok(OperationOutput::ReportGenerated(_)))));
        assert_eq!(turn.auto_steps.len(), 1);
        assert_eq!(turn.auto_steps[0].trigger, AutoTrigger::AnalyzeLatest);
        assert_eq!(session.state().analysis_results.len(), 2);
        assert_eq!(session.state().sensor_readings.len(), 1);
    }

    #[test]
    fn single_bounds_collect_but_do_not_analyze() {
        let mut session = orchestrator();
        session.handle(set("temperature", Some(1000.0), None));
        session.handle(set("feeder_rate", None, Some(150.0)));

        let turn = session.handle(set("vibration", Some(10.0), None));

        assert!(turn.triggered(AutoTrigger::CollectReadings));
        assert!(!turn.triggered(AutoTrigger::AnalyzeLatest));
        assert!(all_constraints_configured(&session.state().constraints));
        assert!(session.state().analysis_results.is_empty());
    }

    #[test]
    fn collection_is_not_repeated_once_readings_exist() {
        let mut session = orchestrator();
        session.handle(set("temperature", Some(1000.0), None));
        session.handle(set("feeder_rate", Some(50.0), None));
        session.handle(set("vibration", Some(10.0), None));

        let turn = session.handle(set("vibration", None, Some(20.0)));

        assert!(!turn.triggered(AutoTrigger::CollectReadings));
        assert_eq!(session.state().sensor_readings.len(), 1);
    }

    #[test]
    fn failed_command_still_evaluates_triggers() {
        let mut session = orchestrator();
        session.handle(set("temperature", Some(1000.0), Some(1200.0)));
        session.handle(set("feeder_rate", Some(50.0), Some(150.0)));
        session.handle(set("vibration", Some(10.0), Some(20.0)));

        let turn = session.handle(set("pressure", Some(1.0), Some(2.0)));

        assert_eq!(
            turn.first_result(),
            Some(&Err(DomainError::InvalidSensorType { value: "pressure".to_string() }))
        );
        assert!(turn.triggered(AutoTrigger::AnalyzeLatest));
    }

    #[test]
    fn explicit_analysis_without_readings_reports_no_readings() {
        let mut session = orchestrator();

        let turn = session.handle(SessionCommand::AnalyzeReadings { reading_id: None });

        assert_eq!(turn.first_result(), Some(&Err(DomainError::NoReadings)));
        assert!(turn.auto_steps.is_empty());
        assert!(session.state().analysis_results.is_empty());
    }

    #[test]
    fn unknown_report_type_is_an_explicit_error() {
        let mut session = orchestrator();

        let turn =
            session.handle(SessionCommand::GenerateReport { report_type: "weekly".to_string() });

        assert_eq!(
            turn.first_result(),
            Some(&Err(DomainError::InvalidReportType { value: "weekly".to_string() }))
        );
    }

    #[test]
    fn manual_collection_on_fresh_session_does_not_analyze() {
        let mut session = orchestrator();

        let turn = session.handle(SessionCommand::CollectReading);

        assert!(turn.auto_steps.is_empty());
        let Some(Ok(OperationOutput::ReadingCollected(entry))) = turn.first_result() else {
            panic!("expected a collection");
        };
        assert_eq!(entry.collection_id, "reading_1");
    }

    #[test]
    fn user_queries_and_monitoring_changes_are_recorded() {
        let mut session = orchestrator();
        session.record_user_query("start monitoring please");
        session.handle(SessionCommand::StartMonitoring);

        let state: SessionState = session.into_state();
        assert_eq!(state.interaction_history.len(), 2);
        assert_eq!(state.monitoring_status.as_str(), "active");
    }

    #[test]
    fn one_message_setting_every_channel_chains_once() {
        let mut session = orchestrator();

        let turn = session.handle_turn(vec![
            set("temperature", Some(1000.0), Some(1200.0)),
            set("feeder_rate", Some(50.0), Some(150.0)),
            set("vibration", Some(10.0), Some(20.0)),
        ]);

        assert_eq!(turn.outcomes.len(), 3);
        assert!(turn.outcomes.iter().all(|outcome| outcome.result.is_ok()));
        assert_eq!(turn.auto_steps.len(), 2);
        assert_eq!(session.state().sensor_readings.len(), 1);
        assert_eq!(session.state().analysis_results.len(), 1);
    }

    #[test]
    fn empty_turn_only_evaluates_triggers() {
        let mut session = orchestrator();
        session.handle(set("temperature", Some(1000.0), Some(1200.0)));
        session.handle(SessionCommand::CollectReading);
        assert_eq!(session.state().analysis_results.len(), 0);

        session.handle(SessionCommand::ClearConstraints { sensor_type: None });
        let turn = session.handle_turn(Vec::new());

        assert!(turn.outcomes.is_empty());
        assert!(turn.auto_steps.is_empty());
    }
}
