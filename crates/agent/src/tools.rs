use std::collections::BTreeMap;

use sensorwatch_core::{
    AutoStep, DomainError, OperationOutput, SessionCommand, SessionOrchestrator, TurnOutcome,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid input for `{tool}`: {message}")]
    InvalidInput { tool: &'static str, message: String },
    #[error("failed to serialize tool output: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A named entry point the dispatch layer can call with a JSON object.
/// Tools only translate input into a [`SessionCommand`]; the registry runs it.
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn command(&self, input: &Value) -> Result<SessionCommand, ToolError>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with every session operation registered.
    pub fn with_session_tools() -> Self {
        let mut registry = Self::default();
        registry.register(SetConstraintTool);
        registry.register(ClearConstraintsTool);
        registry.register(CollectSensorReadingTool);
        registry.register(AnalyzeReadingsTool);
        registry.register(GenerateReportTool);
        registry.register(StartMonitoringTool);
        registry.register(StopMonitoringTool);
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name(), Box::new(tool));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        self.tools.values().map(|tool| (tool.name(), tool.description())).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs one tool against a session and wraps the outcome, including any
    /// chained steps, in a `{status, message, ...}` envelope. Domain failures
    /// come back as `status: "error"` envelopes, not as `Err`.
    pub fn dispatch(
        &self,
        session: &mut SessionOrchestrator,
        name: &str,
        input: Value,
    ) -> Result<Value, ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let command = tool.command(&input)?;
        debug!(
            event_name = "agent.tool_dispatch",
            session_id = session.context().session_id.as_str(),
            tool = tool.name(),
            "dispatching tool"
        );

        let turn = session.handle(command);
        turn_envelope(&turn)
    }
}

pub fn turn_envelope(turn: &TurnOutcome) -> Result<Value, ToolError> {
    let mut envelope = match turn.first_result() {
        Some(result) => result_envelope(result)?,
        None => {
            let mut envelope = Map::new();
            envelope.insert("status".to_string(), json!("success"));
            envelope.insert("message".to_string(), json!("No operation requested"));
            envelope
        }
    };

    let auto_steps = turn.auto_steps.iter().map(step_envelope).collect::<Result<Vec<_>, _>>()?;
    envelope.insert("auto_steps".to_string(), Value::Array(auto_steps));
    Ok(Value::Object(envelope))
}

fn step_envelope(step: &AutoStep) -> Result<Value, ToolError> {
    let mut envelope = result_envelope(&step.result)?;
    envelope.insert("trigger".to_string(), serde_json::to_value(step.trigger)?);
    Ok(Value::Object(envelope))
}

fn result_envelope(
    result: &Result<OperationOutput, DomainError>,
) -> Result<Map<String, Value>, ToolError> {
    let mut envelope = Map::new();
    match result {
        Ok(output) => {
            envelope.insert("status".to_string(), json!("success"));
            envelope.insert("message".to_string(), json!(output.message()));
            envelope.insert("result".to_string(), serde_json::to_value(output)?);
        }
        Err(error) => {
            envelope.insert("status".to_string(), json!("error"));
            envelope.insert("message".to_string(), json!(error.to_string()));
            envelope.insert("error_code".to_string(), json!(error.code()));
        }
    }
    Ok(envelope)
}

fn parse_input<T>(tool: &'static str, input: &Value) -> Result<T, ToolError>
where
    T: DeserializeOwned,
{
    let input = match input {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(input)
        .map_err(|error| ToolError::InvalidInput { tool, message: error.to_string() })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SetConstraintInput {
    sensor_type: String,
    #[serde(default)]
    min_value: Option<f64>,
    #[serde(default)]
    max_value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClearConstraintsInput {
    #[serde(default)]
    sensor_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalyzeReadingsInput {
    #[serde(default)]
    reading_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GenerateReportInput {
    #[serde(default = "default_report_type")]
    report_type: String,
}

fn default_report_type() -> String {
    "summary".to_string()
}

pub struct SetConstraintTool;

impl Tool for SetConstraintTool {
    fn name(&self) -> &'static str {
        "set_constraint"
    }

    fn description(&self) -> &'static str {
        "Set min and/or max limits for temperature, feeder_rate or vibration"
    }

    fn command(&self, input: &Value) -> Result<SessionCommand, ToolError> {
        let input: SetConstraintInput = parse_input(self.name(), input)?;
        Ok(SessionCommand::SetConstraint {
            sensor_type: input.sensor_type,
            min: input.min_value,
            max: input.max_value,
        })
    }
}

pub struct ClearConstraintsTool;

impl Tool for ClearConstraintsTool {
    fn name(&self) -> &'static str {
        "clear_constraints"
    }

    fn description(&self) -> &'static str {
        "Clear limits for one channel, or for every channel when none is given"
    }

    fn command(&self, input: &Value) -> Result<SessionCommand, ToolError> {
        let input: ClearConstraintsInput = parse_input(self.name(), input)?;
        Ok(SessionCommand::ClearConstraints { sensor_type: input.sensor_type })
    }
}

pub struct CollectSensorReadingTool;

impl Tool for CollectSensorReadingTool {
    fn name(&self) -> &'static str {
        "collect_sensor_reading"
    }

    fn description(&self) -> &'static str {
        "Collect one reading for every channel"
    }

    fn command(&self, _input: &Value) -> Result<SessionCommand, ToolError> {
        Ok(SessionCommand::CollectReading)
    }
}

pub struct AnalyzeReadingsTool;

impl Tool for AnalyzeReadingsTool {
    fn name(&self) -> &'static str {
        "analyze_readings"
    }

    fn description(&self) -> &'static str {
        "Compare a collection (latest by default) against the configured limits"
    }

    fn command(&self, input: &Value) -> Result<SessionCommand, ToolError> {
        let input: AnalyzeReadingsInput = parse_input(self.name(), input)?;
        Ok(SessionCommand::AnalyzeReadings { reading_id: input.reading_id })
    }
}

pub struct GenerateReportTool;

impl Tool for GenerateReportTool {
    fn name(&self) -> &'static str {
        "generate_report"
    }

    fn description(&self) -> &'static str {
        "Build a summary, detailed or alerts report"
    }

    fn command(&self, input: &Value) -> Result<SessionCommand, ToolError> {
        let input: GenerateReportInput = parse_input(self.name(), input)?;
        Ok(SessionCommand::GenerateReport { report_type: input.report_type })
    }
}

pub struct StartMonitoringTool;

impl Tool for StartMonitoringTool {
    fn name(&self) -> &'static str {
        "start_monitoring"
    }

    fn description(&self) -> &'static str {
        "Switch monitoring mode on"
    }

    fn command(&self, _input: &Value) -> Result<SessionCommand, ToolError> {
        Ok(SessionCommand::StartMonitoring)
    }
}

pub struct StopMonitoringTool;

impl Tool for StopMonitoringTool {
    fn name(&self) -> &'static str {
        "stop_monitoring"
    }

    fn description(&self) -> &'static str {
        "Switch monitoring mode off"
    }

    fn command(&self, _input: &Value) -> Result<SessionCommand, ToolError> {
        Ok(SessionCommand::StopMonitoring)
    }
}
