use chrono::{DateTime, Local};

use super::status::{markers, result_tone};
use crate::types::{Build, Job};

/// Milliseconds as seconds with three decimals, e.g. `12.345s`.
pub fn format_duration(millis: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let seconds = millis as f64 / 1000.0;
    format!("{seconds:.3}s")
}

/// Epoch milliseconds as local wall-clock time.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_build(job: &Job, build: &Build) -> String {
    let entry = job.for_build(build);
    let line = format!(
        "#{:<6} {}  {:>12} {}",
        build.number,
        format_timestamp(build.timestamp),
        format_duration(build.duration),
        markers(&entry)
    );
    result_tone(build.result.as_deref())
        .paint(line.trim_end())
        .to_string()
}

pub fn render_history(job: &Job, builds: &[Build]) -> String {
    if builds.is_empty() {
        return format!("{} has no builds\n", job.name);
    }

    builds
        .iter()
        .map(|build| render_build(job, build) + "\n")
        .collect()
}
