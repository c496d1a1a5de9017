use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::session::SessionContext;
use crate::monitoring::{ReportBuilder, SyntheticReadingSource};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub readings: ReadingsConfig,
    pub reports: ReportsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub app_name: String,
    pub user_id: String,
    pub user_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReadingsConfig {
    pub seed: Option<u64>,
    pub offline_probability: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportsConfig {
    pub alert_history_limit: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub user_name: Option<String>,
    pub reading_seed: Option<u64>,
    pub offline_probability: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                app_name: "Sensor Monitoring".to_string(),
                user_id: "operator_001".to_string(),
                user_name: "System Operator".to_string(),
            },
            readings: ReadingsConfig { seed: None, offline_probability: 0.0 },
            reports: ReportsConfig {
                alert_history_limit: crate::monitoring::reports::DEFAULT_ALERT_HISTORY_LIMIT,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("sensorwatch.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(
            self.session.app_name.clone(),
            self.session.user_id.clone(),
            self.session.user_name.clone(),
        )
    }

    pub fn reading_source(&self) -> SyntheticReadingSource {
        SyntheticReadingSource::new(self.readings.seed)
            .with_offline_probability(self.readings.offline_probability)
    }

    pub fn report_builder(&self) -> ReportBuilder {
        ReportBuilder::new(self.reports.alert_history_limit)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(session) = patch.session {
            if let Some(app_name) = session.app_name {
                self.session.app_name = app_name;
            }
            if let Some(user_id) = session.user_id {
                self.session.user_id = user_id;
            }
            if let Some(user_name) = session.user_name {
                self.session.user_name = user_name;
            }
        }

        if let Some(readings) = patch.readings {
            if let Some(seed) = readings.seed {
                self.readings.seed = Some(seed);
            }
            if let Some(offline_probability) = readings.offline_probability {
                self.readings.offline_probability = offline_probability;
            }
        }

        if let Some(reports) = patch.reports {
            if let Some(alert_history_limit) = reports.alert_history_limit {
                self.reports.alert_history_limit = alert_history_limit;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SENSORWATCH_SESSION_APP_NAME") {
            self.session.app_name = value;
        }
        if let Some(value) = read_env("SENSORWATCH_SESSION_USER_ID") {
            self.session.user_id = value;
        }
        if let Some(value) = read_env("SENSORWATCH_SESSION_USER_NAME") {
            self.session.user_name = value;
        }

        if let Some(value) = read_env("SENSORWATCH_READINGS_SEED") {
            self.readings.seed = Some(parse_u64("SENSORWATCH_READINGS_SEED", &value)?);
        }
        if let Some(value) = read_env("SENSORWATCH_READINGS_OFFLINE_PROBABILITY") {
            self.readings.offline_probability =
                parse_f64("SENSORWATCH_READINGS_OFFLINE_PROBABILITY", &value)?;
        }

        if let Some(value) = read_env("SENSORWATCH_REPORTS_ALERT_HISTORY_LIMIT") {
            self.reports.alert_history_limit =
                parse_usize("SENSORWATCH_REPORTS_ALERT_HISTORY_LIMIT", &value)?;
        }

        let log_level =
            read_env("SENSORWATCH_LOGGING_LEVEL").or_else(|| read_env("SENSORWATCH_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SENSORWATCH_LOGGING_FORMAT").or_else(|| read_env("SENSORWATCH_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(user_name) = overrides.user_name {
            self.session.user_name = user_name;
        }
        if let Some(seed) = overrides.reading_seed {
            self.readings.seed = Some(seed);
        }
        if let Some(offline_probability) = overrides.offline_probability {
            self.readings.offline_probability = offline_probability;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_session(&self.session)?;
        validate_readings(&self.readings)?;
        validate_reports(&self.reports)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("sensorwatch.toml"), PathBuf::from("config/sensorwatch.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.app_name.trim().is_empty() {
        return Err(ConfigError::Validation("session.app_name must not be empty".to_string()));
    }
    if session.user_id.trim().is_empty() {
        return Err(ConfigError::Validation("session.user_id must not be empty".to_string()));
    }
    if session.user_name.trim().is_empty() {
        return Err(ConfigError::Validation("session.user_name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_readings(readings: &ReadingsConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&readings.offline_probability) {
        return Err(ConfigError::Validation(
            "readings.offline_probability must be in range 0.0..=1.0".to_string(),
        ));
    }
    Ok(())
}

fn validate_reports(reports: &ReportsConfig) -> Result<(), ConfigError> {
    if reports.alert_history_limit == 0 {
        return Err(ConfigError::Validation(
            "reports.alert_history_limit must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    session: Option<SessionPatch>,
    readings: Option<ReadingsPatch>,
    reports: Option<ReportsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    app_name: Option<String>,
    user_id: Option<String>,
    user_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadingsPatch {
    seed: Option<u64>,
    offline_probability: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportsPatch {
    alert_history_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
