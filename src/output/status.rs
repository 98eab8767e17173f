use log::warn;

use super::styling::{blue, bright_green, bright_red, bright_yellow, dim};
use crate::types::{Job, BUILDING_SUFFIX};

/// Display style of a job or build state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    /// Jenkins' own blue for success when stoplight mode is off
    Neutral,
    Failure,
    Unstable,
    Muted,
}

impl Tone {
    pub fn paint(self, text: impl std::fmt::Display) -> console::StyledObject<String> {
        match self {
            Self::Success => bright_green(text),
            Self::Neutral => blue(text),
            Self::Failure => bright_red(text),
            Self::Unstable => bright_yellow(text),
            Self::Muted => dim(text),
        }
    }
}

/// Tone for a job color. Stoplight mode shows success green instead of blue.
pub fn color_tone(color: &str, stoplight: bool) -> Tone {
    match color.strip_suffix(BUILDING_SUFFIX).unwrap_or(color) {
        "blue" if stoplight => Tone::Success,
        "blue" => Tone::Neutral,
        "red" | "aborted" => Tone::Failure,
        "yellow" => Tone::Unstable,
        "disabled" | "grey" | "notbuilt" | "" => Tone::Muted,
        other => {
            warn!("Unrecognized job color '{other}'");
            Tone::Muted
        }
    }
}

/// Tone for a build result. `None` is a build still running.
pub fn result_tone(result: Option<&str>) -> Tone {
    match result {
        Some("SUCCESS") => Tone::Success,
        Some("ABORTED" | "FAILURE") => Tone::Failure,
        None => Tone::Muted,
        Some(other) => {
            warn!("Unrecognized build result '{other}'");
            Tone::Muted
        }
    }
}

/// `*` while building, `?` if the last build was aborted, `+` while queued.
pub fn markers(job: &Job) -> String {
    let mut markers = String::new();
    if job.is_building() {
        markers.push('*');
    }
    if job.last_build_aborted() {
        markers.push('?');
    }
    if job.in_queue {
        markers.push('+');
    }
    markers
}

pub fn render_job(job: &Job, stoplight: bool) -> String {
    format!(
        "{}{}",
        color_tone(&job.color, stoplight).paint(&job.name),
        markers(job)
    )
}

pub fn render_jobs(jobs: &[Job], stoplight: bool) -> String {
    jobs.iter()
        .map(|job| render_job(job, stoplight) + "\n")
        .collect()
}
