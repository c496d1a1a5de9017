use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use sensorwatch_core::config::AppConfig;
use sensorwatch_core::{ReadingSource, SessionOrchestrator, SessionState};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::conversation::{IntentRouter, KeywordIntentRouter, RoutedIntent, HELP_TEXT};
use crate::replies::{AgentReply, ReplyBuilder};
use crate::tools::ToolRegistry;

type SessionHandle = Arc<Mutex<SessionOrchestrator>>;

/// Hosts any number of independent sessions. Each session sits behind its
/// own mutex, so one session's turns run one at a time while different
/// sessions never share state.
pub struct AgentRuntime {
    router: Box<dyn IntentRouter>,
    tools: ToolRegistry,
    config: AppConfig,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl AgentRuntime {
    pub fn new(config: AppConfig) -> Self {
        Self::with_router(config, Box::new(KeywordIntentRouter::new()))
    }

    pub fn with_router(config: AppConfig, router: Box<dyn IntentRouter>) -> Self {
        Self {
            router,
            tools: ToolRegistry::with_session_tools(),
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Opens a session fed by the configured synthetic source.
    pub async fn open_session(&self) -> String {
        let source = Box::new(self.config.reading_source());
        self.open_session_with_source(source).await
    }

    pub async fn open_session_with_source(&self, source: Box<dyn ReadingSource>) -> String {
        let orchestrator = SessionOrchestrator::new(self.config.session_context(), source)
            .with_report_builder(self.config.report_builder());
        let session_id = orchestrator.context().session_id.clone();

        info!(
            event_name = "agent.session_opened",
            session_id = session_id.as_str(),
            user_id = orchestrator.context().user_id.as_str(),
            "session opened"
        );
        let handle = Arc::new(Mutex::new(orchestrator));
        self.sessions.write().await.insert(session_id.clone(), handle);
        session_id
    }

    /// One operator message: record it, route it, apply the commands and the
    /// trigger rules, render the reply.
    pub async fn handle_message(&self, session_id: &str, text: &str) -> Result<AgentReply> {
        let session = self.session(session_id).await?;
        let intent = self.router.route(text).await?;

        let mut session = session.lock().await;
        session.record_user_query(text);

        let (turn, preface) = match intent {
            RoutedIntent::Commands(commands) => (session.handle_turn(commands), None),
            RoutedIntent::Help => (session.handle_turn(Vec::new()), Some(HELP_TEXT.to_string())),
            RoutedIntent::Unrecognized { clarification } => {
                (session.handle_turn(Vec::new()), Some(clarification))
            }
        };

        let mut reply = ReplyBuilder::new();
        if let Some(preface) = preface {
            reply = reply.section(preface);
        }
        let text = reply.turn(&turn).build();

        Ok(AgentReply { text, turn })
    }

    pub async fn call_tool(&self, session_id: &str, tool: &str, input: Value) -> Result<Value> {
        let session = self.session(session_id).await?;
        let mut session = session.lock().await;
        Ok(self.tools.dispatch(&mut session, tool, input)?)
    }

    pub async fn session_state(&self, session_id: &str) -> Result<SessionState> {
        let session = self.session(session_id).await?;
        let state = session.lock().await.state().clone();
        Ok(state)
    }

    /// Removes the session and hands back its final state.
    pub async fn close_session(&self, session_id: &str) -> Result<SessionState> {
        let session = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| anyhow!("unknown session `{session_id}`"))?;
        let state = session.lock().await.state().clone();

        info!(
            event_name = "agent.session_closed",
            session_id,
            readings = state.sensor_readings.len(),
            analyses = state.analysis_results.len(),
            "session closed"
        );
        Ok(state)
    }

    async fn session(&self, session_id: &str) -> Result<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown session `{session_id}`"))
    }
}
