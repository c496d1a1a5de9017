use std::env;
use std::fs;
use std::path::Path;

use sensorwatch_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run(config_path: Option<&Path>) -> String {
    let options =
        LoadOptions { config_path: config_path.map(Path::to_path_buf), ..Default::default() };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key_path: "session.app_name",
            env_keys: &["SENSORWATCH_SESSION_APP_NAME"],
            value: config.session.app_name.clone(),
        },
        Field {
            key_path: "session.user_id",
            env_keys: &["SENSORWATCH_SESSION_USER_ID"],
            value: config.session.user_id.clone(),
        },
        Field {
            key_path: "session.user_name",
            env_keys: &["SENSORWATCH_SESSION_USER_NAME"],
            value: config.session.user_name.clone(),
        },
        Field {
            key_path: "readings.seed",
            env_keys: &["SENSORWATCH_READINGS_SEED"],
            value: config
                .readings
                .seed
                .map(|seed| seed.to_string())
                .unwrap_or_else(|| "<entropy>".to_string()),
        },
        Field {
            key_path: "readings.offline_probability",
            env_keys: &["SENSORWATCH_READINGS_OFFLINE_PROBABILITY"],
            value: config.readings.offline_probability.to_string(),
        },
        Field {
            key_path: "reports.alert_history_limit",
            env_keys: &["SENSORWATCH_REPORTS_ALERT_HISTORY_LIMIT"],
            value: config.reports.alert_history_limit.to_string(),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["SENSORWATCH_LOGGING_LEVEL", "SENSORWATCH_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["SENSORWATCH_LOGGING_FORMAT", "SENSORWATCH_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_in_env = |key: &str| env::var(key).is_ok_and(|value| !value.trim().is_empty());
    if let Some(env_key) = env_keys.iter().copied().find(|key| set_in_env(key)) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
