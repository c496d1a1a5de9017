pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sensorwatch_core::config::{AppConfig, ConfigOverrides, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "sensorwatch",
    about = "Sensor constraint monitoring operator CLI",
    long_about = "Set operating limits for temperature, feeder rate and vibration, collect readings, \
                  analyze them against the limits and generate reports.",
    after_help = "Examples:\n  sensorwatch session\n  sensorwatch session --seed 7 --offline-probability 0.1\n  sensorwatch config\n  sensorwatch smoke"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file path (defaults to ./sensorwatch.toml)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive operator session on stdin; `exit` prints final state")]
    Session {
        #[arg(long, help = "Seed for the synthetic reading generator")]
        seed: Option<u64>,
        #[arg(long, help = "Chance (0.0-1.0) that a channel reports offline on collection")]
        offline_probability: Option<f64>,
        #[arg(long, help = "Operator name recorded in session state")]
        user_name: Option<String>,
        #[arg(long, help = "Log level override (trace|debug|info|warn|error)")]
        log_level: Option<String>,
        #[arg(long, value_parser = parse_log_format, help = "Log format (compact|pretty|json)")]
        log_format: Option<LogFormat>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Run a scripted end-to-end session with per-check timing details")]
    Smoke,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config;

    let result = match cli.command {
        Command::Session { seed, offline_probability, user_name, log_level, log_format } => {
            let overrides = ConfigOverrides {
                log_level,
                log_format,
                user_name,
                reading_seed: seed,
                offline_probability,
            };
            commands::session::run(config_path, overrides)
        }
        Command::Config => commands::CommandResult {
            exit_code: 0,
            output: commands::config::run(config_path.as_deref()),
        },
        Command::Smoke => commands::smoke::run(config_path),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays reserved for the operator dialogue and
/// the final state dump.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse::<LogFormat>().map_err(|error| error.to_string())
}
