use std::collections::BTreeMap;

use tracing::info;

use crate::audit::InteractionAction;
use crate::domain::analysis::{AnalysisResult, ConstraintStatus, OverallStatus, SensorAnalysis};
use crate::domain::constraint::ConstraintSet;
use crate::domain::reading::{Reading, ReadingEntry};
use crate::domain::sensor::SensorStatus;
use crate::domain::session::SessionState;
use crate::domain::timestamp_now;
use crate::errors::DomainError;

pub const RECOMMEND_CORRECTIVE_ACTION: &str =
    "Review constraint violations and take corrective action";
pub const RECOMMEND_RESTORE_CONNECTIVITY: &str = "Check offline sensors and restore connectivity";
pub const RECOMMEND_ALL_CLEAR: &str = "All readings within acceptable ranges";

/// Compares a collection against the current constraints and appends the
/// result to the analysis log. `reading_id` selects a specific collection;
/// otherwise the most recent one is used.
pub fn analyze_readings(
    state: &mut SessionState,
    reading_id: Option<&str>,
) -> Result<AnalysisResult, DomainError> {
    let target = select_reading(&state.sensor_readings, reading_id)?;
    let analysis_timestamp = timestamp_now();
    let result = evaluate(target, &state.constraints, analysis_timestamp.clone());

    info!(
        event_name = "analysis.completed",
        reading_id = result.reading_id.as_str(),
        overall_status = result.overall_status.as_str(),
        alerts = result.alerts.len(),
        "Analysis completed for reading {}",
        result.reading_id
    );

    state.interaction_history.record(
        InteractionAction::AnalysisPerformed {
            reading_id: result.reading_id.clone(),
            overall_status: result.overall_status,
            alerts_count: result.alerts.len(),
        },
        analysis_timestamp,
    );
    state.analysis_results.push(result.clone());
    Ok(result)
}

fn select_reading<'a>(
    readings: &'a [ReadingEntry],
    reading_id: Option<&str>,
) -> Result<&'a ReadingEntry, DomainError> {
    let latest = readings.last().ok_or(DomainError::NoReadings)?;
    match reading_id {
        Some(id) => readings
            .iter()
            .find(|entry| entry.collection_id == id)
            .ok_or_else(|| DomainError::ReadingNotFound { reading_id: id.to_string() }),
        None => Ok(latest),
    }
}

/// Pure comparison of one collection against a constraint set.
pub fn evaluate(
    entry: &ReadingEntry,
    constraints: &ConstraintSet,
    analysis_timestamp: String,
) -> AnalysisResult {
    let mut overall_status = OverallStatus::Normal;
    let mut alerts = Vec::new();
    let mut sensor_analyses = BTreeMap::new();

    for (sensor, reading) in &entry.readings {
        let mut analysis = SensorAnalysis {
            value: reading.value,
            unit: reading.unit.clone(),
            sensor_status: reading.status,
            constraint_status: ConstraintStatus::NoConstraints,
            violations: Vec::new(),
        };

        let constraint = constraints.get(*sensor);
        match (reading.status, reading.value, constraint) {
            (SensorStatus::Offline, _, _) => {
                alerts.push(format!("{} sensor is offline", sensor.label()));
                analysis.constraint_status = ConstraintStatus::SensorOffline;
            }
            (SensorStatus::Online, Some(value), Some(constraint)) => {
                if let Some(min) = constraint.min.filter(|min| value < *min) {
                    analysis.violations.push(format!("Below minimum ({min})"));
                    alerts.push(format!(
                        "{} reading ({}) is below minimum threshold ({min})",
                        sensor.label(),
                        format_measurement(value, reading)
                    ));
                }
                if let Some(max) = constraint.max.filter(|max| value > *max) {
                    analysis.violations.push(format!("Above maximum ({max})"));
                    alerts.push(format!(
                        "{} reading ({}) is above maximum threshold ({max})",
                        sensor.label(),
                        format_measurement(value, reading)
                    ));
                }

                if analysis.violations.is_empty() {
                    analysis.constraint_status = ConstraintStatus::Normal;
                } else {
                    analysis.constraint_status = ConstraintStatus::Violation;
                    overall_status = OverallStatus::Alert;
                }
            }
            _ => {}
        }

        sensor_analyses.insert(*sensor, analysis);
    }

    let recommendations = recommendations_for(&alerts);

    AnalysisResult {
        reading_id: entry.collection_id.clone(),
        timestamp: entry.timestamp.clone(),
        analysis_timestamp,
        sensor_analyses,
        overall_status,
        alerts,
        recommendations,
    }
}

fn recommendations_for(alerts: &[String]) -> Vec<String> {
    if alerts.is_empty() {
        return vec![RECOMMEND_ALL_CLEAR.to_string()];
    }

    let mut recommendations = vec![RECOMMEND_CORRECTIVE_ACTION.to_string()];
    if alerts.iter().any(|alert| alert.to_lowercase().contains("offline")) {
        recommendations.push(RECOMMEND_RESTORE_CONNECTIVITY.to_string());
    }
    recommendations
}

fn format_measurement(value: f64, reading: &Reading) -> String {
    format!("{value}{}", reading.unit)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        analyze_readings, evaluate, RECOMMEND_ALL_CLEAR, RECOMMEND_CORRECTIVE_ACTION,
        RECOMMEND_RESTORE_CONNECTIVITY,
    };
    use crate::domain::analysis::{ConstraintStatus, OverallStatus};
    use crate::domain::constraint::ConstraintSet;
    use crate::domain::reading::{Reading, ReadingEntry};
    use crate::domain::sensor::SensorType;
    use crate::domain::session::SessionState;
    use crate::errors::DomainError;

    const TS: &str = "2026-03-01 08:00:00";

    fn entry(id: &str, values: &[(SensorType, Option<f64>)]) -> ReadingEntry {
        let readings = values
            .iter()
            .map(|(sensor, value)| {
                let reading = match value {
                    Some(value) => Reading::online(*sensor, *value, TS),
                    None => Reading::offline(*sensor, TS),
                };
                (*sensor, reading)
            })
            .collect::<BTreeMap<_, _>>();
        ReadingEntry { collection_id: id.to_string(), timestamp: TS.to_string(), readings }
    }

    #[test]
    fn reading_above_maximum_is_a_single_violation() {
        let mut constraints = ConstraintSet::seeded();
        constraints.set(SensorType::Temperature, Some(1000.0), Some(1200.0));

        let result = evaluate(
            &entry("reading_1", &[(SensorType::Temperature, Some(1250.0))]),
            &constraints,
            TS.to_string(),
        );

        let temperature = &result.sensor_analyses[&SensorType::Temperature];
        assert_eq!(temperature.constraint_status, ConstraintStatus::Violation);
        assert_eq!(temperature.violations, vec!["Above maximum (1200)".to_string()]);
        assert_eq!(result.overall_status, OverallStatus::Alert);
        assert_eq!(
            result.alerts,
            vec!["Temperature reading (1250°C) is above maximum threshold (1200)".to_string()]
        );
        assert_eq!(result.recommendations, vec![RECOMMEND_CORRECTIVE_ACTION.to_string()]);
    }

    #[test]
    fn inverted_bounds_fire_both_violations() {
        let mut constraints = ConstraintSet::seeded();
        constraints.set(SensorType::Vibration, Some(20.0), Some(10.0));

        let result = evaluate(
            &entry("reading_1", &[(SensorType::Vibration, Some(15.5))]),
            &constraints,
            TS.to_string(),
        );

        let vibration = &result.sensor_analyses[&SensorType::Vibration];
        assert_eq!(
            vibration.violations,
            vec!["Below minimum (20)".to_string(), "Above maximum (10)".to_string()]
        );
        assert_eq!(result.alerts.len(), 2);
        assert_eq!(
            result.alerts[0],
            "Vibration reading (15.5mm/s) is below minimum threshold (20)"
        );
    }

    #[test]
    fn unbounded_channel_is_normal_and_missing_channel_has_no_constraints() {
        let mut constraints = ConstraintSet::default();
        constraints.set(SensorType::FeederRate, None, None);

        let result = evaluate(
            &entry(
                "reading_1",
                &[(SensorType::FeederRate, Some(90.0)), (SensorType::Vibration, Some(12.0))],
            ),
            &constraints,
            TS.to_string(),
        );

        assert_eq!(
            result.sensor_analyses[&SensorType::FeederRate].constraint_status,
            ConstraintStatus::Normal
        );
        assert_eq!(
            result.sensor_analyses[&SensorType::Vibration].constraint_status,
            ConstraintStatus::NoConstraints
        );
        assert_eq!(result.overall_status, OverallStatus::Normal);
        assert_eq!(result.recommendations, vec![RECOMMEND_ALL_CLEAR.to_string()]);
    }

    #[test]
    fn offline_sensor_alerts_without_changing_overall_status() {
        let mut constraints = ConstraintSet::seeded();
        constraints.set(SensorType::FeederRate, Some(50.0), Some(150.0));

        let result = evaluate(
            &entry("reading_1", &[(SensorType::FeederRate, None)]),
            &constraints,
            TS.to_string(),
        );

        let feeder = &result.sensor_analyses[&SensorType::FeederRate];
        assert_eq!(feeder.constraint_status, ConstraintStatus::SensorOffline);
        assert!(feeder.violations.is_empty());
        assert_eq!(result.alerts, vec!["Feeder Rate sensor is offline".to_string()]);
        assert_eq!(result.overall_status, OverallStatus::Normal);
        assert_eq!(
            result.recommendations,
            vec![
                RECOMMEND_CORRECTIVE_ACTION.to_string(),
                RECOMMEND_RESTORE_CONNECTIVITY.to_string()
            ]
        );
    }

    #[test]
    fn empty_log_fails_without_appending() {
        let mut state = SessionState::new("System Operator");

        let error = analyze_readings(&mut state, None).expect_err("no readings");

        assert_eq!(error, DomainError::NoReadings);
        assert!(state.analysis_results.is_empty());
        assert!(state.interaction_history.is_empty());
    }

    #[test]
    fn explicit_reading_id_is_looked_up() {
        let mut state = SessionState::new("System Operator");
        state.constraints.set(SensorType::Temperature, Some(1000.0), Some(1200.0));
        state.sensor_readings.push(entry("reading_1", &[(SensorType::Temperature, Some(950.0))]));
        state.sensor_readings.push(entry("reading_2", &[(SensorType::Temperature, Some(1100.0))]));

        let first = analyze_readings(&mut state, Some("reading_1")).expect("reading_1 exists");
        let latest = analyze_readings(&mut state, None).expect("latest exists");

        assert_eq!(first.reading_id, "reading_1");
        assert_eq!(first.overall_status, OverallStatus::Alert);
        assert_eq!(latest.reading_id, "reading_2");
        assert_eq!(latest.overall_status, OverallStatus::Normal);
        assert_eq!(state.analysis_results.len(), 2);
        assert_eq!(state.interaction_history.len(), 2);
    }

    #[test]
    fn unknown_reading_id_is_rejected() {
        let mut state = SessionState::new("System Operator");
        state.sensor_readings.push(entry("reading_1", &[(SensorType::Vibration, Some(12.0))]));

        let error = analyze_readings(&mut state, Some("reading_7")).expect_err("missing");

        assert_eq!(error, DomainError::ReadingNotFound { reading_id: "reading_7".to_string() });
        assert!(state.analysis_results.is_empty());
    }
}
