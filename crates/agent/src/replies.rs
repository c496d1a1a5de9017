use sensorwatch_core::{
    AnalysisResult, AutoStep, AutoTrigger, DomainError, OperationOutput, ReadingEntry,
    SensorStatus, TurnOutcome,
};

pub const AUTO_COLLECT_NOTICE: &str = "All constraints set! Auto-collecting sensor readings...";
pub const AUTO_ANALYZE_NOTICE: &str = "Auto-triggering sensor data analysis...";

/// Text sent back to the operator for one message, plus the structured turn.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentReply {
    pub text: String,
    pub turn: TurnOutcome,
}

/// Accumulates reply sections; sections are separated by a blank line.
#[derive(Default)]
pub struct ReplyBuilder {
    sections: Vec<String>,
}

impl ReplyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.sections.push(text);
        }
        self
    }

    pub fn result(self, result: &Result<OperationOutput, DomainError>) -> Self {
        match result {
            Ok(output) => self.section(render_output(output)),
            Err(error) => self.section(format!("Error: {error}")),
        }
    }

    pub fn auto_step(self, step: &AutoStep) -> Self {
        let notice = match step.trigger {
            AutoTrigger::CollectReadings => AUTO_COLLECT_NOTICE,
            AutoTrigger::AnalyzeLatest => AUTO_ANALYZE_NOTICE,
        };
        self.section(notice).result(&step.result)
    }

    pub fn turn(self, turn: &TurnOutcome) -> Self {
        let builder =
            turn.outcomes.iter().fold(self, |builder, outcome| builder.result(&outcome.result));
        turn.auto_steps.iter().fold(builder, ReplyBuilder::auto_step)
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

pub fn render_output(output: &OperationOutput) -> String {
    match output {
        OperationOutput::ReadingCollected(entry) => render_reading(entry),
        OperationOutput::AnalysisCompleted(result) => render_analysis(result),
        OperationOutput::ReportGenerated(report) => match serde_json::to_string_pretty(report) {
            Ok(body) => format!("{}\n{body}", report.message()),
            Err(_) => report.message(),
        },
        other => other.message(),
    }
}

fn render_reading(entry: &ReadingEntry) -> String {
    let mut lines = vec![format!("Collected {} at {}", entry.collection_id, entry.timestamp)];
    for reading in entry.readings.values() {
        let line = match (reading.status, reading.value) {
            (SensorStatus::Online, Some(value)) => {
                format!("  {}: {value}{}", reading.sensor_type.label(), reading.unit)
            }
            _ => format!("  {}: offline", reading.sensor_type.label()),
        };
        lines.push(line);
    }
    lines.join("\n")
}

fn render_analysis(result: &AnalysisResult) -> String {
    let mut lines = vec![format!(
        "Analysis of {}: {}",
        result.reading_id,
        result.overall_status.as_str().to_uppercase()
    )];
    for alert in &result.alerts {
        lines.push(format!("  ! {alert}"));
    }
    for recommendation in &result.recommendations {
        lines.push(format!("  > {recommendation}"));
    }
    lines.join("\n")
}
