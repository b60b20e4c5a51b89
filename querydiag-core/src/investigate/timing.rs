//! Wall-clock timing of investigation phases

use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

/// Run `f` and measure how long it took
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

/// Milliseconds with microsecond resolution, e.g. `12.345`
pub fn format_millis(duration: Duration) -> String {
    format!("{:.3}", millis(duration))
}

fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(millis(*duration))
}

/// The four sequential, non-overlapping phases of running a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTimings {
    /// Executing the query
    #[serde(rename = "execute_ms", serialize_with = "serialize_millis")]
    pub execute: Duration,

    /// Obtaining the row iterator
    #[serde(rename = "get_rows_ms", serialize_with = "serialize_millis")]
    pub get_rows: Duration,

    /// Reading the first page of rows
    #[serde(rename = "first_page_ms", serialize_with = "serialize_millis")]
    pub first_page: Duration,

    /// Reading the remaining rows
    #[serde(rename = "remaining_ms", serialize_with = "serialize_millis")]
    pub remaining: Duration,
}

impl PhaseTimings {
    /// Sum of all phases
    pub fn total(&self) -> Duration {
        self.execute + self.get_rows + self.first_page + self.remaining
    }
}
