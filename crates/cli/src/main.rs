use std::process::ExitCode;

fn main() -> ExitCode {
    sensorwatch_cli::run()
}
