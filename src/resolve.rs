use std::collections::HashSet;

use log::debug;
use regex::Regex;

use crate::error::{JenkinsError, Result};
use crate::types::Job;

/// Drops jobs whose name was already seen, keeping the first occurrence.
pub fn dedup_by_name(jobs: impl IntoIterator<Item = Job>) -> Vec<Job> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| seen.insert(job.name.clone()))
        .collect()
}

enum Matcher {
    Regex(Regex),
    Literal(String),
}

/// Filter expression applied to job names.
///
/// The expression is a regular expression matched anywhere in the name. An
/// expression that does not compile (e.g. `build(`) is matched as a plain
/// substring instead.
pub struct JobFilter {
    pattern: String,
    matcher: Matcher,
}

impl JobFilter {
    pub fn new(pattern: Option<&str>) -> Self {
        let pattern = pattern.unwrap_or_default().to_string();
        let matcher = match Regex::new(&pattern) {
            Ok(regex) => Matcher::Regex(regex),
            Err(e) => {
                debug!("Pattern '{pattern}' is not a regex ({e}), matching literally");
                Matcher::Literal(pattern.clone())
            }
        };
        Self { pattern, matcher }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(regex) => regex.is_match(name),
            Matcher::Literal(text) => name.contains(text.as_str()),
        }
    }

    pub fn is_exact(&self, name: &str) -> bool {
        name == self.pattern
    }
}

/// Selects the jobs matching `filter`.
///
/// A job named exactly like the pattern wins over pattern matches, even when
/// the pattern read as a regex would not match that name. An empty selection
/// is an error.
pub fn select(jobs: &[Job], filter: &JobFilter) -> Result<Vec<Job>> {
    let exact: Vec<Job> = jobs
        .iter()
        .filter(|job| filter.is_exact(&job.name))
        .cloned()
        .collect();

    let selected = if exact.is_empty() {
        jobs.iter()
            .filter(|job| filter.is_match(&job.name))
            .cloned()
            .collect()
    } else {
        exact
    };

    if selected.is_empty() {
        return Err(JenkinsError::NoMatches(filter.pattern().to_string()));
    }

    Ok(selected)
}

/// Returns the only job of `jobs`, or an ambiguity error naming `command`.
pub fn single(jobs: Vec<Job>, command: &str) -> Result<Job> {
    if jobs.len() > 1 {
        return Err(JenkinsError::Ambiguous {
            command: command.to_string(),
            matches: jobs.into_iter().map(|job| job.name).collect(),
        });
    }

    jobs.into_iter()
        .next()
        .ok_or_else(|| JenkinsError::NoMatches(String::new()))
}
