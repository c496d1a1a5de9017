pub mod analysis;
pub mod constraint;
pub mod reading;
pub mod sensor;
pub mod session;

use chrono::Utc;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current wall-clock time in the format every log entry carries.
pub fn timestamp_now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
