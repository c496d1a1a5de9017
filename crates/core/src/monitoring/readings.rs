use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::audit::InteractionAction;
use crate::domain::reading::{Reading, ReadingEntry};
use crate::domain::sensor::{SensorStatus, SensorType};
use crate::domain::session::SessionState;
use crate::domain::timestamp_now;

/// Produces one reading per channel for a collection.
///
/// The synthetic source stands in for sensor acquisition; a hardware adapter
/// implements the same trait and may legitimately report channels offline.
pub trait ReadingSource: Send {
    fn collect(&mut self, timestamp: &str) -> BTreeMap<SensorType, Reading>;
}

pub struct SyntheticReadingSource {
    rng: StdRng,
    offline_probability: f64,
}

impl SyntheticReadingSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, offline_probability: 0.0 }
    }

    /// Each channel independently reports offline with probability `probability`.
    pub fn with_offline_probability(mut self, probability: f64) -> Self {
        self.offline_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn sample(&mut self, sensor: SensorType, timestamp: &str) -> Reading {
        if self.offline_probability > 0.0 && self.rng.gen_bool(self.offline_probability) {
            return Reading::offline(sensor, timestamp);
        }
        let raw = self.rng.gen_range(sensor.synthetic_range());
        Reading::online(sensor, round_to_cents(raw), timestamp)
    }
}

impl Default for SyntheticReadingSource {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ReadingSource for SyntheticReadingSource {
    fn collect(&mut self, timestamp: &str) -> BTreeMap<SensorType, Reading> {
        SensorType::ALL.into_iter().map(|sensor| (sensor, self.sample(sensor, timestamp))).collect()
    }
}

/// Replays queued frames in order. A `None` value marks the channel offline
/// and a channel the frame leaves out reports the midpoint of its synthetic
/// range. Once the queue drains the last frame repeats; with no frames at all
/// every channel reports its midpoint.
#[derive(Clone, Debug, Default)]
pub struct ScriptedReadingSource {
    frames: VecDeque<BTreeMap<SensorType, Option<f64>>>,
    last: Option<BTreeMap<SensorType, Option<f64>>>,
}

impl ScriptedReadingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame<I>(mut self, frame: I) -> Self
    where
        I: IntoIterator<Item = (SensorType, Option<f64>)>,
    {
        self.push_frame(frame);
        self
    }

    pub fn push_frame<I>(&mut self, frame: I)
    where
        I: IntoIterator<Item = (SensorType, Option<f64>)>,
    {
        self.frames.push_back(frame.into_iter().collect());
    }

    fn next_frame(&mut self) -> BTreeMap<SensorType, Option<f64>> {
        if let Some(frame) = self.frames.pop_front() {
            self.last = Some(frame.clone());
            return frame;
        }
        self.last.clone().unwrap_or_default()
    }
}

impl ReadingSource for ScriptedReadingSource {
    fn collect(&mut self, timestamp: &str) -> BTreeMap<SensorType, Reading> {
        let frame = self.next_frame();
        SensorType::ALL
            .into_iter()
            .map(|sensor| {
                let value = frame.get(&sensor).copied().unwrap_or_else(|| Some(midpoint(sensor)));
                let reading = match value {
                    Some(value) => Reading::online(sensor, value, timestamp),
                    None => Reading::offline(sensor, timestamp),
                };
                (sensor, reading)
            })
            .collect()
    }
}

/// Appends one collection to the reading log and returns it.
pub fn collect_reading(state: &mut SessionState, source: &mut dyn ReadingSource) -> ReadingEntry {
    let timestamp = timestamp_now();
    let readings = source.collect(&timestamp);
    let entry = ReadingEntry {
        collection_id: ReadingEntry::collection_id_for(state.sensor_readings.len()),
        timestamp: timestamp.clone(),
        readings,
    };

    let offline = entry
        .readings
        .values()
        .filter(|reading| reading.status == SensorStatus::Offline)
        .count();
    for reading in entry.readings.values() {
        debug!(
            event_name = "readings.sample",
            sensor_type = reading.sensor_type.as_str(),
            value = ?reading.value,
            status = ?reading.status,
            "sensor sampled"
        );
    }
    info!(
        event_name = "readings.collected",
        collection_id = entry.collection_id.as_str(),
        offline_channels = offline,
        "sensor readings collected"
    );

    state.sensor_readings.push(entry.clone());
    state.interaction_history.record(
        InteractionAction::ReadingsCollected { collection_id: entry.collection_id.clone() },
        timestamp,
    );
    entry
}

fn midpoint(sensor: SensorType) -> f64 {
    let range = sensor.synthetic_range();
    (range.start() + range.end()) / 2.0
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
