use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::analysis::{AnalysisResult, OverallStatus};
use crate::domain::constraint::ConstraintSet;
use crate::domain::reading::Reading;
use crate::domain::sensor::SensorType;
use crate::domain::session::{MonitoringStatus, SessionState};
use crate::domain::timestamp_now;
use crate::errors::DomainError;

pub const DEFAULT_ALERT_HISTORY_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Summary,
    Detailed,
    Alerts,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Detailed => "detailed",
            Self::Alerts => "alerts",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "detailed" => Ok(Self::Detailed),
            "alerts" => Ok(Self::Alerts),
            _ => Err(DomainError::InvalidReportType { value: value.to_string() }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryView {
    pub latest_status: OverallStatus,
    pub current_alerts: usize,
    pub last_reading_time: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportBody {
    Summary {
        summary: Option<SummaryView>,
    },
    Detailed {
        constraints: ConstraintSet,
        latest_readings: Option<BTreeMap<SensorType, Reading>>,
        latest_analysis: Option<AnalysisResult>,
        alert_history: Vec<String>,
    },
    Alerts {
        active_alerts: Vec<String>,
        recommendations: Vec<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub report_type: ReportType,
    pub generated_at: String,
    pub monitoring_status: MonitoringStatus,
    pub constraints_set: usize,
    pub total_readings: usize,
    pub total_analyses: usize,
    #[serde(flatten)]
    pub body: ReportBody,
}

impl Report {
    pub fn message(&self) -> String {
        format!("Generated {} report", self.report_type)
    }
}

/// Read-only views over a session's constraint, reading and analysis logs.
#[derive(Clone, Copy, Debug)]
pub struct ReportBuilder {
    alert_history_limit: usize,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_HISTORY_LIMIT)
    }
}

impl ReportBuilder {
    pub fn new(alert_history_limit: usize) -> Self {
        Self { alert_history_limit }
    }

    pub fn build(&self, state: &SessionState, report_type: ReportType) -> Report {
        let latest_analysis = state.latest_analysis();

        let body = match report_type {
            ReportType::Summary => ReportBody::Summary {
                summary: latest_analysis.map(|analysis| SummaryView {
                    latest_status: analysis.overall_status,
                    current_alerts: analysis.alerts.len(),
                    last_reading_time: analysis.timestamp.clone(),
                }),
            },
            ReportType::Detailed => ReportBody::Detailed {
                constraints: state.constraints.clone(),
                latest_readings: state.latest_reading().map(|entry| entry.readings.clone()),
                latest_analysis: latest_analysis.cloned(),
                alert_history: self.alert_history(&state.analysis_results),
            },
            ReportType::Alerts => ReportBody::Alerts {
                active_alerts: latest_analysis
                    .map(|analysis| analysis.alerts.clone())
                    .unwrap_or_default(),
                recommendations: latest_analysis
                    .map(|analysis| analysis.recommendations.clone())
                    .unwrap_or_default(),
            },
        };

        Report {
            report_type,
            generated_at: timestamp_now(),
            monitoring_status: state.monitoring_status,
            constraints_set: state.constraints.configured_count(),
            total_readings: state.sensor_readings.len(),
            total_analyses: state.analysis_results.len(),
            body,
        }
    }

    /// Trailing window of alerts across every analysis, oldest first.
    fn alert_history(&self, analyses: &[AnalysisResult]) -> Vec<String> {
        let all = analyses.iter().flat_map(|analysis| analysis.alerts.iter()).collect::<Vec<_>>();
        let skip = all.len().saturating_sub(self.alert_history_limit);
        all.into_iter().skip(skip).cloned().collect()
    }
}

pub fn generate_report(state: &SessionState, report_type: ReportType) -> Report {
    ReportBuilder::default().build(state, report_type)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{generate_report, ReportBody, ReportBuilder, ReportType};
    use crate::domain::analysis::{AnalysisResult, OverallStatus};
    use crate::domain::reading::{Reading, ReadingEntry};
    use crate::domain::sensor::SensorType;
    use crate::domain::session::SessionState;
    use crate::errors::DomainError;

    fn analysis(id: usize, alerts: &[&str]) -> AnalysisResult {
        AnalysisResult {
            reading_id: format!("reading_{id}"),
            timestamp: format!("2026-03-01 08:00:{id:02}"),
            analysis_timestamp: "2026-03-01 08:01:00".to_string(),
            sensor_analyses: BTreeMap::new(),
            overall_status: if alerts.is_empty() {
                OverallStatus::Normal
            } else {
                OverallStatus::Alert
            },
            alerts: alerts.iter().map(|alert| (*alert).to_string()).collect(),
            recommendations: vec!["Review constraint violations and take corrective action"
                .to_string()],
        }
    }

    #[test]
    fn report_type_parsing_rejects_unknown_values() {
        assert_eq!("Detailed".parse::<ReportType>(), Ok(ReportType::Detailed));
        assert_eq!(
            "weekly".parse::<ReportType>(),
            Err(DomainError::InvalidReportType { value: "weekly".to_string() })
        );
    }

    #[test]
    fn alerts_report_before_any_analysis_is_empty_not_an_error() {
        let state = SessionState::new("System Operator");
        let report = generate_report(&state, ReportType::Alerts);

        assert_eq!(
            report.body,
            ReportBody::Alerts { active_alerts: Vec::new(), recommendations: Vec::new() }
        );
        assert_eq!(report.total_analyses, 0);
        assert_eq!(report.message(), "Generated alerts report");
    }

    #[test]
    fn summary_reflects_latest_analysis() {
        let mut state = SessionState::new("System Operator");
        state.constraints.set(SensorType::Temperature, Some(1000.0), None);
        state.analysis_results.push(analysis(1, &[]));
        state.analysis_results.push(analysis(2, &["a", "b"]));

        let report = generate_report(&state, ReportType::Summary);

        assert_eq!(report.constraints_set, 1);
        assert_eq!(report.total_analyses, 2);
        let ReportBody::Summary { summary: Some(summary) } = report.body else {
            panic!("expected populated summary body");
        };
        assert_eq!(summary.latest_status, OverallStatus::Alert);
        assert_eq!(summary.current_alerts, 2);
        assert_eq!(summary.last_reading_time, "2026-03-01 08:00:02");
    }

    #[test]
    fn detailed_alert_history_keeps_trailing_window_in_order() {
        let mut state = SessionState::new("System Operator");
        for id in 1..=4 {
            let alerts = [format!("alert {id}a"), format!("alert {id}b"), format!("alert {id}c")];
            let alerts = alerts.iter().map(String::as_str).collect::<Vec<_>>();
            state.analysis_results.push(analysis(id, &alerts));
        }
        state.sensor_readings.push(ReadingEntry {
            collection_id: "reading_1".to_string(),
            timestamp: "t".to_string(),
            readings: [(SensorType::Vibration, Reading::online(SensorType::Vibration, 12.0, "t"))]
                .into_iter()
                .collect(),
        });

        let report = generate_report(&state, ReportType::Detailed);

        let ReportBody::Detailed { alert_history, latest_readings, latest_analysis, .. } =
            report.body
        else {
            panic!("expected detailed body");
        };
        assert_eq!(alert_history.len(), 10);
        assert_eq!(alert_history.first().map(String::as_str), Some("alert 1c"));
        assert_eq!(alert_history.last().map(String::as_str), Some("alert 4c"));
        assert_eq!(
            latest_readings.and_then(|readings| readings[&SensorType::Vibration].value),
            Some(12.0)
        );
        assert_eq!(latest_analysis.map(|analysis| analysis.reading_id), Some("reading_4".into()));
    }

    #[test]
    fn alert_history_limit_is_configurable() {
        let mut state = SessionState::new("System Operator");
        state.analysis_results.push(analysis(1, &["x", "y", "z"]));

        let report = ReportBuilder::new(2).build(&state, ReportType::Detailed);

        let ReportBody::Detailed { alert_history, .. } = report.body else {
            panic!("expected detailed body");
        };
        assert_eq!(alert_history, vec!["y".to_string(), "z".to_string()]);
    }

    #[test]
    fn repeated_reports_differ_only_in_generation_time() {
        let mut state = SessionState::new("System Operator");
        state.analysis_results.push(analysis(1, &["x"]));

        let mut first = generate_report(&state, ReportType::Detailed);
        let mut second = generate_report(&state, ReportType::Detailed);
        first.generated_at.clear();
        second.generated_at.clear();

        assert_eq!(first, second);
    }

    #[test]
    fn body_fields_are_flattened_into_the_report() {
        let state = SessionState::new("System Operator");
        let value =
            serde_json::to_value(generate_report(&state, ReportType::Alerts)).expect("serialize");

        assert_eq!(value["report_type"], "alerts");
        assert_eq!(value["monitoring_status"], "inactive");
        assert!(value["active_alerts"].as_array().is_some_and(Vec::is_empty));
    }
}
