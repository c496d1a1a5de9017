use thiserror::Error;

use crate::domain::sensor::SensorType;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid sensor type `{value}`. Must be one of: {}", SensorType::valid_names())]
    InvalidSensorType { value: String },
    #[error("No constraints found for {sensor_type}")]
    NotFound { sensor_type: String },
    #[error("No sensor readings available for analysis")]
    NoReadings,
    #[error("Reading with ID {reading_id} not found")]
    ReadingNotFound { reading_id: String },
    #[error("Invalid report type `{value}`. Must be one of: summary, detailed, alerts")]
    InvalidReportType { value: String },
}

impl DomainError {
    /// Stable machine-readable identifier, used in tool envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSensorType { .. } => "invalid_sensor_type",
            Self::NotFound { .. } => "not_found",
            Self::NoReadings => "no_readings",
            Self::ReadingNotFound { .. } => "reading_not_found",
            Self::InvalidReportType { .. } => "invalid_report_type",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::DomainError;

    #[test]
    fn invalid_sensor_type_lists_recognized_channels() {
        let error = DomainError::InvalidSensorType { value: "pressure".to_string() };

        assert_eq!(
            error.to_string(),
            "Invalid sensor type `pressure`. Must be one of: temperature, feeder_rate, vibration"
        );
        assert_eq!(error.code(), "invalid_sensor_type");
    }

    #[test]
    fn lookup_failures_carry_the_missing_key() {
        let not_found = DomainError::NotFound { sensor_type: "humidity".to_string() };
        let missing_reading = DomainError::ReadingNotFound { reading_id: "reading_9".to_string() };

        assert_eq!(not_found.to_string(), "No constraints found for humidity");
        assert_eq!(missing_reading.to_string(), "Reading with ID reading_9 not found");
        assert_eq!(missing_reading.code(), "reading_not_found");
    }

    #[test]
    fn every_variant_has_a_distinct_code() {
        let codes = [
            DomainError::InvalidSensorType { value: String::new() }.code(),
            DomainError::NotFound { sensor_type: String::new() }.code(),
            DomainError::NoReadings.code(),
            DomainError::ReadingNotFound { reading_id: String::new() }.code(),
            DomainError::InvalidReportType { value: String::new() }.code(),
        ];
        let unique = codes.iter().collect::<std::collections::BTreeSet<_>>();

        assert_eq!(unique.len(), codes.len());
    }
}
