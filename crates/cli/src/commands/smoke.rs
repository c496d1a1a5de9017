use std::path::PathBuf;
use std::time::Instant;

use sensorwatch_agent::AgentRuntime;
use sensorwatch_core::config::{AppConfig, LoadOptions};
use sensorwatch_core::{ScriptedReadingSource, SensorType};
use serde::Serialize;
use serde_json::json;

use crate::commands::CommandResult;

const CONFIGURE_ALL: &str = "set temperature between 1000 and 1200, feeder rate between 50 and 150, \
                             vibration between 10 and 20";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

const SESSION_CHECKS: [&str; 4] =
    ["constraint_chain", "tool_dispatch", "invalid_sensor_rejection", "session_close"];

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let options = LoadOptions { config_path, ..Default::default() };
    let config = match timed_check(|| AppConfig::load(options)) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.extend(SESSION_CHECKS.into_iter().map(skipped));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "constraint_chain",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.extend(SESSION_CHECKS.into_iter().skip(1).map(skipped));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    runtime.block_on(session_checks(AgentRuntime::new(config), &mut checks));
    finalize_report(checks, elapsed_since(started))
}

/// Drives one scripted session whose first collection breaches the
/// temperature and feeder rate limits.
async fn session_checks(agent: AgentRuntime, checks: &mut Vec<SmokeCheck>) {
    let source = ScriptedReadingSource::new().with_frame([
        (SensorType::Temperature, Some(1250.0)),
        (SensorType::FeederRate, Some(160.0)),
        (SensorType::Vibration, Some(12.0)),
    ]);
    let session_id = agent.open_session_with_source(Box::new(source)).await;

    let chain_started = Instant::now();
    let chain = match agent.handle_message(&session_id, CONFIGURE_ALL).await {
        Ok(_) => match agent.session_state(&session_id).await {
            Ok(state) => {
                let alert = state.latest_analysis().is_some_and(|analysis| analysis.is_alert());
                if state.sensor_readings.len() == 1 && state.analysis_results.len() == 1 && alert {
                    Ok("constraints set, readings collected and analyzed with alerts".to_string())
                } else {
                    Err(format!(
                        "expected 1 collection and 1 alerting analysis, found {} and {}",
                        state.sensor_readings.len(),
                        state.analysis_results.len()
                    ))
                }
            }
            Err(error) => Err(error.to_string()),
        },
        Err(error) => Err(error.to_string()),
    };
    checks.push(check_from("constraint_chain", chain_started, chain));

    let tool_started = Instant::now();
    let tool = match agent
        .call_tool(&session_id, "generate_report", json!({"report_type": "alerts"}))
        .await
    {
        Ok(output) => {
            let alerts = output["result"]["active_alerts"].as_array().map_or(0, Vec::len);
            if output["status"] == "success" && alerts == 2 {
                Ok(format!("alerts report lists {alerts} active alerts"))
            } else {
                Err(format!("unexpected alerts report envelope: {output}"))
            }
        }
        Err(error) => Err(error.to_string()),
    };
    checks.push(check_from("tool_dispatch", tool_started, tool));

    let invalid_started = Instant::now();
    let invalid = match agent.handle_message(&session_id, "set pressure between 1 and 2").await {
        Ok(reply) => match reply.turn.first_result() {
            Some(Err(error)) if error.code() == "invalid_sensor_type" => {
                Ok("unknown channel rejected".to_string())
            }
            other => Err(format!("expected invalid_sensor_type, got {other:?}")),
        },
        Err(error) => Err(error.to_string()),
    };
    checks.push(check_from("invalid_sensor_rejection", invalid_started, invalid));

    let close_started = Instant::now();
    let close = match agent.close_session(&session_id).await {
        Ok(state) => serde_json::to_string(&state)
            .map(|dump| format!("final state serialized ({} bytes)", dump.len()))
            .map_err(|error| error.to_string()),
        Err(error) => Err(error.to_string()),
    };
    checks.push(check_from("session_close", close_started, close));
}

fn check_from(name: &'static str, started: Instant, result: Result<String, String>) -> SmokeCheck {
    let (status, message) = match result {
        Ok(message) => (SmokeStatus::Pass, message),
        Err(message) => (SmokeStatus::Fail, message),
    };
    SmokeCheck { name, status, elapsed_ms: elapsed_since(started), message }
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((elapsed_since(started), value)),
        Err(error) => Err((elapsed_since(started), error)),
    }
}

fn elapsed_since(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
