use std::path::PathBuf;

use anyhow::Result;
use sensorwatch_agent::conversation::HELP_TEXT;
use sensorwatch_agent::AgentRuntime;
use sensorwatch_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use sensorwatch_core::SessionState;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::commands::CommandResult;

pub fn run(config_path: Option<PathBuf>, overrides: ConfigOverrides) -> CommandResult {
    let config = match AppConfig::load(LoadOptions { config_path, require_file: false, overrides })
    {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("session", "config_validation", error.to_string(), 2)
        }
    };
    crate::init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "session",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        }
    };

    let agent = AgentRuntime::new(config);
    let outcome = runtime.block_on(async {
        let session_id = agent.open_session().await;
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();

        tokio::select! {
            state = drive(&agent, &session_id, input, &mut output) => state,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(
                    event_name = "cli.session_interrupted",
                    session_id = session_id.as_str(),
                    "interrupt received, ending session"
                );
                agent.close_session(&session_id).await
            }
        }
    });

    match outcome.and_then(|state| render_final_state(&state)) {
        Ok(rendered) => CommandResult { exit_code: 0, output: rendered },
        Err(error) => CommandResult::failure("session", "io", error.to_string(), 4),
    }
}

/// Reads operator lines until `exit`, `quit` or end of input, writing each
/// reply as it is produced. Closes the session and returns its final state.
pub async fn drive<R, W>(
    agent: &AgentRuntime,
    session_id: &str,
    input: R,
    output: &mut W,
) -> Result<SessionState>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let banner = format!(
        "Created new sensor monitoring session: {session_id}\n\n\
         Welcome to Sensor Monitoring System!\n{HELP_TEXT}\n\
         Type 'exit' or 'quit' to end the session.\n\n"
    );
    output.write_all(banner.as_bytes()).await?;

    let mut lines = input.lines();
    loop {
        output.write_all(b"Operator: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            output.write_all(b"Ending monitoring session. Goodbye!\n").await?;
            break;
        }

        let reply = agent.handle_message(session_id, line).await?;
        output.write_all(format!("{}\n\n", reply.text).as_bytes()).await?;
    }
    output.flush().await?;

    agent.close_session(session_id).await
}

pub fn render_final_state(state: &SessionState) -> Result<String> {
    Ok(format!("\nFinal Session State:\n{}", serde_json::to_string_pretty(state)?))
}
