use anyhow::Result;
use async_trait::async_trait;
use sensorwatch_core::domain::sensor::SensorType;
use sensorwatch_core::SessionCommand;

/// What an operator message resolved to before anything touches session state.
#[derive(Clone, Debug, PartialEq)]
pub enum RoutedIntent {
    Commands(Vec<SessionCommand>),
    Help,
    Unrecognized { clarification: String },
}

/// Turns free operator text into session commands. Implementations never
/// touch session state; the orchestrator applies whatever they return.
#[async_trait]
pub trait IntentRouter: Send + Sync {
    async fn route(&self, text: &str) -> Result<RoutedIntent>;
}

pub const HELP_TEXT: &str = "Available commands:\n\
- Set constraints for temperature, feeder_rate, or vibration \
(e.g. `set temperature between 1000 and 1200, vibration max 20`)\n\
- Clear constraints (`clear constraints` or `clear temperature constraints`)\n\
- Request sensor readings (`collect readings`)\n\
- Analyze readings against constraints (`analyze` or `analyze reading_2`)\n\
- Generate monitoring reports (`report summary|detailed|alerts`)\n\
- Start or stop monitoring mode";

const CLARIFICATION: &str =
    "I couldn't map that to a monitoring action. Try `set temperature between 1000 and 1200`, \
`collect readings`, `analyze`, or `report alerts`. Type `help` for the full list.";

/// Deterministic keyword router. Handles the phrasing operators actually use
/// at the console without any model in the loop.
#[derive(Clone, Debug, Default)]
pub struct KeywordIntentRouter;

impl KeywordIntentRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route_text(&self, text: &str) -> RoutedIntent {
        let tokens = tokenize(&normalize_text(text));
        if tokens.is_empty() {
            return RoutedIntent::Help;
        }

        let mut commands = Vec::new();

        let clearing = tokens.iter().any(|token| is_clear_verb(token));
        if clearing {
            commands.push(SessionCommand::ClearConstraints { sensor_type: clear_target(&tokens) });
        } else {
            commands.extend(extract_constraint_updates(&tokens));
        }

        let reporting = tokens.iter().any(|token| is_report_word(token));
        let analyzing = wants_analysis(&tokens);

        if wants_collection(&tokens) {
            commands.push(SessionCommand::CollectReading);
        }
        if analyzing {
            commands.push(SessionCommand::AnalyzeReadings { reading_id: reading_id(&tokens) });
        }
        if reporting {
            commands.push(SessionCommand::GenerateReport { report_type: report_type(&tokens) });
        }
        if let Some(command) = monitoring_change(&tokens) {
            commands.push(command);
        }

        if !commands.is_empty() {
            return RoutedIntent::Commands(commands);
        }

        if is_help_request(&tokens) {
            RoutedIntent::Help
        } else {
            RoutedIntent::Unrecognized { clarification: CLARIFICATION.to_string() }
        }
    }
}

#[async_trait]
impl IntentRouter for KeywordIntentRouter {
    async fn route(&self, text: &str) -> Result<RoutedIntent> {
        Ok(self.route_text(text))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BoundHint {
    Min,
    Max,
    RangeStart,
    RangeEnd,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Bounds {
    min: Option<f64>,
    max: Option<f64>,
}

impl Bounds {
    fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .replace("feeder rate", "feeder_rate")
        .replace("feeder-rate", "feeder_rate")
        .replace("feed rate", "feeder_rate")
        .replace("at least", "min")
        .replace("at most", "max")
        .replace("up to", "max")
        .replace("no more than", "max")
        .replace("no less than", "min")
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let separators = |character: char| {
        character.is_whitespace()
            || matches!(character, ',' | ';' | ':' | '=' | '(' | ')' | '!' | '?')
    };
    for raw in text.split(separators) {
        let raw = raw.trim_matches(|character: char| character == '.' || character == '\'');
        if raw.is_empty() {
            continue;
        }

        // `10-20` and `10..20` are ranges; a leading `-` is a sign.
        let range_split = raw
            .char_indices()
            .skip(1)
            .find(|(_, character)| *character == '-')
            .map(|(index, _)| (&raw[..index], &raw[index + 1..]))
            .or_else(|| raw.split_once(".."));
        match range_split {
            Some((start, end)) if parse_number(start).is_some() && parse_number(end).is_some() => {
                tokens.push(start.to_string());
                tokens.push("to".to_string());
                tokens.push(end.to_string());
            }
            _ => tokens.push(raw.to_string()),
        }
    }
    tokens
}

/// Accepts unit suffixes such as `1200c`, `150kg/h`, `20mm/s`.
fn parse_number(token: &str) -> Option<f64> {
    let first = token.chars().next()?;
    if !(first.is_ascii_digit() || first == '-' || first == '+' || first == '.') {
        return None;
    }
    let end = token
        .char_indices()
        .skip(1)
        .find(|(_, character)| !(character.is_ascii_digit() || *character == '.'))
        .map(|(index, _)| index)
        .unwrap_or(token.len());
    token[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

fn sensor_alias(token: &str) -> Option<SensorType> {
    match token {
        "temperature" | "temp" | "temperatures" => Some(SensorType::Temperature),
        "feeder_rate" | "feeder" | "feed" | "feedrate" => Some(SensorType::FeederRate),
        "vibration" | "vibrations" | "vib" => Some(SensorType::Vibration),
        _ => None,
    }
}

fn bound_hint(token: &str) -> Option<BoundHint> {
    match token {
        "min" | "minimum" | "above" | "over" | "exceeding" | "greater" => Some(BoundHint::Min),
        "max" | "maximum" | "below" | "under" | "less" => Some(BoundHint::Max),
        "between" | "from" | "range" => Some(BoundHint::RangeStart),
        "and" | "to" | "through" | "thru" => Some(BoundHint::RangeEnd),
        _ => None,
    }
}

fn is_filler(token: &str) -> bool {
    matches!(
        token,
        "the" | "a" | "an" | "for" | "of" | "on" | "all" | "my" | "please" | "sensor" | "sensors"
            | "constraint" | "constraints" | "limit" | "limits" | "threshold" | "thresholds"
            | "range" | "ranges" | "bound" | "bounds" | "value" | "values" | "set" | "configure"
            | "me" | "give" | "generate" | "create" | "show" | "new" | "monitoring" | "status"
            | "full" | "current" | "latest"
    )
}

fn parse_bounds(segment: &[String]) -> Bounds {
    let mut bounds = Bounds::default();
    let mut hint: Option<BoundHint> = None;
    let mut range_start: Option<f64> = None;
    // `to 20` with nothing before it: an upper bound unless a range follows.
    let mut dangling_end: Option<f64> = None;

    for token in segment {
        if let Some(value) = parse_number(token) {
            match hint {
                Some(BoundHint::Min) => bounds.min = Some(value),
                Some(BoundHint::Max) => bounds.max = Some(value),
                Some(BoundHint::RangeEnd) => match range_start.take() {
                    Some(start) => {
                        bounds.min = Some(start);
                        bounds.max = Some(value);
                        dangling_end = None;
                    }
                    None => {
                        range_start = Some(value);
                        dangling_end = Some(value);
                    }
                },
                Some(BoundHint::RangeStart) | None => {
                    range_start = Some(value);
                    dangling_end = None;
                }
            }
            hint = None;
            continue;
        }
        if let Some(next) = bound_hint(token) {
            hint = Some(next);
        }
    }

    if let (Some(value), None) = (dangling_end.filter(|_| range_start.is_some()), bounds.max) {
        bounds.max = Some(value);
    }

    bounds
}

fn extract_constraint_updates(tokens: &[String]) -> Vec<SessionCommand> {
    let mentions = tokens
        .iter()
        .enumerate()
        .filter_map(|(index, token)| sensor_alias(token).map(|sensor| (index, sensor)))
        .collect::<Vec<_>>();

    let mut commands = Vec::new();

    let prefix_end = mentions.first().map(|(index, _)| *index).unwrap_or(tokens.len());
    if let Some(name) = unknown_sensor_name(&tokens[..prefix_end]) {
        let bounds = parse_bounds(&tokens[..prefix_end]);
        if !bounds.is_empty() {
            commands.push(SessionCommand::SetConstraint {
                sensor_type: name,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }

    for (position, (index, sensor)) in mentions.iter().enumerate() {
        let end = mentions.get(position + 1).map(|(next, _)| *next).unwrap_or(tokens.len());
        let bounds = parse_bounds(&tokens[index + 1..end]);
        if bounds.is_empty() {
            continue;
        }
        commands.push(SessionCommand::SetConstraint {
            sensor_type: sensor.as_str().to_string(),
            min: bounds.min,
            max: bounds.max,
        });
    }

    commands
}

/// `set pressure between 1 and 2` names a channel the store does not know;
/// pass it through so the operation reports the invalid type.
fn unknown_sensor_name(prefix: &[String]) -> Option<String> {
    let start = prefix.iter().position(|token| token == "set" || token == "configure")?;
    prefix[start + 1..]
        .iter()
        .find(|token| !is_filler(token))
        .filter(|token| {
            bound_hint(token).is_none()
                && parse_number(token).is_none()
                && token.chars().all(|character| character.is_alphanumeric() || character == '_')
        })
        .cloned()
}

fn clear_target(tokens: &[String]) -> Option<String> {
    if let Some(sensor) = tokens.iter().find_map(|token| sensor_alias(token)) {
        return Some(sensor.as_str().to_string());
    }

    let verb = tokens.iter().position(|token| is_clear_verb(token))?;
    let after_for = tokens[verb + 1..].iter().position(|token| token == "for")?;
    tokens[verb + 1 + after_for + 1..].iter().find(|token| !is_filler(token)).cloned()
}

fn wants_collection(tokens: &[String]) -> bool {
    let verb = tokens.iter().any(|token| {
        matches!(
            token.as_str(),
            "collect" | "gather" | "fetch" | "take" | "get" | "request" | "measure" | "poll"
        )
    });
    let object = tokens.iter().any(|token| {
        matches!(
            token.as_str(),
            "reading" | "readings" | "data" | "measurement" | "measurements" | "samples"
        )
    });
    tokens.iter().any(|token| token == "collect") || (verb && object)
}

/// Any `analy*` word asks for analysis unless it only names a report,
/// as in `analysis report`.
fn wants_analysis(tokens: &[String]) -> bool {
    tokens.iter().enumerate().any(|(index, token)| {
        token.starts_with("analy")
            && !tokens.get(index + 1).is_some_and(|next| is_report_word(next))
    })
}

fn is_report_word(token: &str) -> bool {
    token == "report" || token == "reports"
}

fn reading_id(tokens: &[String]) -> Option<String> {
    if let Some(token) = tokens.iter().find(|token| token.starts_with("reading_")) {
        return Some(token.clone());
    }
    tokens.windows(2).find_map(|window| match window {
        [word, number] if word == "reading" => {
            number.parse::<u32>().ok().map(|number| format!("reading_{number}"))
        }
        _ => None,
    })
}

fn report_type(tokens: &[String]) -> String {
    for token in tokens {
        match token.as_str() {
            "summary" => return "summary".to_string(),
            "detailed" | "detail" | "details" | "full" => return "detailed".to_string(),
            "alerts" | "alert" => return "alerts".to_string(),
            _ => {}
        }
    }

    let named = tokens.windows(2).find_map(|window| match window {
        [word, report] if is_report_word(report) && !is_filler(word) => {
            Some(word.clone())
        }
        _ => None,
    });
    named.unwrap_or_else(|| "summary".to_string())
}

fn monitoring_change(tokens: &[String]) -> Option<SessionCommand> {
    if !tokens.iter().any(|token| token.starts_with("monitor")) {
        return None;
    }
    let starts = tokens.iter().any(|token| {
        matches!(token.as_str(), "start" | "begin" | "enable" | "resume" | "activate")
    });
    let stops = tokens.iter().any(|token| {
        matches!(token.as_str(), "stop" | "end" | "pause" | "disable" | "halt" | "deactivate")
    });

    match (starts, stops) {
        (true, false) => Some(SessionCommand::StartMonitoring),
        (false, true) => Some(SessionCommand::StopMonitoring),
        _ => None,
    }
}

fn is_clear_verb(token: &str) -> bool {
    matches!(token, "clear" | "reset" | "remove")
}

fn is_help_request(tokens: &[String]) -> bool {
    let joined = tokens.join(" ");
    tokens.iter().any(|token| token == "help" || token == "commands")
        || joined.contains("what can you do")
}

#[cfg(test)]
mod tests {
    use sensorwatch_core::SessionCommand;

    use super::{IntentRouter, KeywordIntentRouter, RoutedIntent};

    fn commands(text: &str) -> Vec<SessionCommand> {
        match KeywordIntentRouter::new().route_text(text) {
            RoutedIntent::Commands(commands) => commands,
            other => panic!("expected commands for `{text}`, got {other:?}"),
        }
    }

    fn set(sensor: &str, min: Option<f64>, max: Option<f64>) -> SessionCommand {
        SessionCommand::SetConstraint { sensor_type: sensor.to_string(), min, max }
    }

    #[test]
    fn routes_every_channel_from_one_sentence() {
        let routed = commands(
            "set temperature between 1000 and 1200, feeder rate between 50 and 150, \
             vibration between 10 and 20",
        );

        assert_eq!(
            routed,
            vec![
                set("temperature", Some(1000.0), Some(1200.0)),
                set("feeder_rate", Some(50.0), Some(150.0)),
                set("vibration", Some(10.0), Some(20.0)),
            ]
        );
    }

    #[test]
    fn single_sided_bounds_leave_the_other_side_unset() {
        assert_eq!(commands("set vibration max 20"), vec![set("vibration", None, Some(20.0))]);
        assert_eq!(
            commands("temperature at least 950"),
            vec![set("temperature", Some(950.0), None)]
        );
        assert_eq!(
            commands("feeder rate min 40 max 160"),
            vec![set("feeder_rate", Some(40.0), Some(160.0))]
        );
    }

    #[test]
    fn dash_ranges_and_unit_suffixes_are_understood() {
        assert_eq!(
            commands("temp 1000-1200c; vibration 5.5 to 20mm/s"),
            vec![
                set("temperature", Some(1000.0), Some(1200.0)),
                set("vibration", Some(5.5), Some(20.0)),
            ]
        );
    }

    #[test]
    fn unknown_channel_is_passed_through_for_validation() {
        assert_eq!(
            commands("set pressure between 1 and 2"),
            vec![set("pressure", Some(1.0), Some(2.0))]
        );
    }

    #[test]
    fn clear_requests_target_one_channel_or_all() {
        assert_eq!(
            commands("clear all constraints"),
            vec![SessionCommand::ClearConstraints { sensor_type: None }]
        );
        assert_eq!(
            commands("reset the temperature limits"),
            vec![SessionCommand::ClearConstraints { sensor_type: Some("temperature".to_string()) }]
        );
        assert_eq!(
            commands("clear constraints for pressure"),
            vec![SessionCommand::ClearConstraints { sensor_type: Some("pressure".to_string()) }]
        );
    }

    #[test]
    fn collection_analysis_and_reports_route_to_their_commands() {
        assert_eq!(
            commands("Collect current sensor readings"),
            vec![SessionCommand::CollectReading]
        );
        assert_eq!(
            commands("Analyze the latest readings"),
            vec![SessionCommand::AnalyzeReadings { reading_id: None }]
        );
        assert_eq!(
            commands("analyze reading 2"),
            vec![SessionCommand::AnalyzeReadings { reading_id: Some("reading_2".to_string()) }]
        );
        assert_eq!(
            commands("give me an alerts report"),
            vec![SessionCommand::GenerateReport { report_type: "alerts".to_string() }]
        );
        assert_eq!(
            commands("generate report"),
            vec![SessionCommand::GenerateReport { report_type: "summary".to_string() }]
        );
        assert_eq!(
            commands("weekly report"),
            vec![SessionCommand::GenerateReport { report_type: "weekly".to_string() }]
        );
    }

    #[test]
    fn combined_requests_keep_every_step_in_order() {
        assert_eq!(
            commands("collect readings and analyze them"),
            vec![
                SessionCommand::CollectReading,
                SessionCommand::AnalyzeReadings { reading_id: None },
            ]
        );
        assert_eq!(
            commands("analyze the readings and give me an alerts report"),
            vec![
                SessionCommand::AnalyzeReadings { reading_id: None },
                SessionCommand::GenerateReport { report_type: "alerts".to_string() },
            ]
        );
    }

    #[test]
    fn analysis_named_as_report_subject_is_only_a_report() {
        assert_eq!(
            commands("analysis report"),
            vec![SessionCommand::GenerateReport { report_type: "analysis".to_string() }]
        );
    }

    #[test]
    fn to_introduces_ranges_and_upper_bounds() {
        assert_eq!(
            commands("set temperature to 1000-1200"),
            vec![set("temperature", Some(1000.0), Some(1200.0))]
        );
        assert_eq!(commands("vibration to 20"), vec![set("vibration", None, Some(20.0))]);
        assert_eq!(
            commands("set temperature to 1000 and vibration from 5 to 20"),
            vec![
                set("temperature", None, Some(1000.0)),
                set("vibration", Some(5.0), Some(20.0)),
            ]
        );
    }

    #[test]
    fn monitoring_mode_toggles() {
        assert_eq!(commands("start monitoring"), vec![SessionCommand::StartMonitoring]);
        assert_eq!(commands("please stop monitoring"), vec![SessionCommand::StopMonitoring]);
    }

    #[test]
    fn help_and_unknown_text_do_not_produce_commands() {
        let router = KeywordIntentRouter::new();
        assert_eq!(router.route_text("help"), RoutedIntent::Help);
        assert_eq!(router.route_text("   "), RoutedIntent::Help);
        assert!(matches!(
            router.route_text("how is the weather"),
            RoutedIntent::Unrecognized { .. }
        ));
    }

    #[tokio::test]
    async fn async_route_matches_sync_routing() {
        let router = KeywordIntentRouter::new();
        let routed = router.route("collect readings").await.expect("routing succeeds");
        assert_eq!(routed, RoutedIntent::Commands(vec![SessionCommand::CollectReading]));
    }
}
