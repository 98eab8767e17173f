use std::sync::OnceLock;

use indexmap::IndexMap;
use log::warn;
use regex::Regex;

use crate::types::{Job, QueueItem};

/// Host key used when an item waits for any executor.
pub const ANY_EXECUTOR: &str = "(any)";

/// Pending builds grouped by why they are waiting.
///
/// Host groupings keep the order in which hosts first appear in the queue.
#[derive(Debug, Default)]
pub struct QueueSnapshot {
    pub blocked: IndexMap<String, Vec<Job>>,
    pub stuck: IndexMap<String, Vec<Job>>,
    pub running: Vec<Job>,
    pub quieted: Vec<Job>,
}

#[derive(Debug, PartialEq)]
enum Reason {
    Executor(String),
    Offline(String),
    Running,
    Quiet,
}

struct ReasonPatterns {
    executor: Regex,
    offline: Regex,
    running: Regex,
    quiet: Regex,
}

fn patterns() -> &'static ReasonPatterns {
    static PATTERNS: OnceLock<ReasonPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ReasonPatterns {
        executor: Regex::new(r"^Waiting for next available executor(?: on (.+?))?\.?$")
            .expect("static regex"),
        offline: Regex::new(
            r"^(?:All nodes of label (.+) are offline|There are no nodes with the label (.+)|(.+) is offline)\.?$",
        )
        .expect("static regex"),
        running: Regex::new(r"^Build #\d+ is already in progress").expect("static regex"),
        quiet: Regex::new(r"^In the quiet period").expect("static regex"),
    })
}

fn host_name(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '‘' | '’' | '\'' | '"'))
        .to_string()
}

fn classify(why: &str) -> Option<Reason> {
    let patterns = patterns();
    let why = why.trim();

    if let Some(caps) = patterns.executor.captures(why) {
        let host = caps
            .get(1)
            .map_or_else(|| ANY_EXECUTOR.to_string(), |m| host_name(m.as_str()));
        return Some(Reason::Executor(host));
    }
    if let Some(caps) = patterns.offline.captures(why) {
        let host = (1..=3).find_map(|i| caps.get(i))?;
        return Some(Reason::Offline(host_name(host.as_str())));
    }
    if patterns.running.is_match(why) {
        return Some(Reason::Running);
    }
    if patterns.quiet.is_match(why) {
        return Some(Reason::Quiet);
    }
    None
}

impl QueueSnapshot {
    /// Groups queue items by their waiting reason.
    ///
    /// Reason text is free-form upstream, so an item whose reason is missing
    /// or not recognised is logged and left out.
    pub fn from_items(items: Vec<QueueItem>) -> Self {
        let mut snapshot = Self::default();

        for item in items {
            let why = item.why.as_deref().unwrap_or_default();
            match classify(why) {
                Some(Reason::Executor(host)) if item.stuck => {
                    snapshot.stuck.entry(host).or_default().push(item.task);
                }
                Some(Reason::Executor(host)) => {
                    snapshot.blocked.entry(host).or_default().push(item.task);
                }
                Some(Reason::Offline(host)) => {
                    snapshot.stuck.entry(host).or_default().push(item.task);
                }
                Some(Reason::Running) => snapshot.running.push(item.task),
                Some(Reason::Quiet) => snapshot.quieted.push(item.task),
                None => warn!(
                    "Skipping queue item '{}' with unrecognized reason: {why:?}",
                    item.task.name
                ),
            }
        }

        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
            && self.stuck.is_empty()
            && self.running.is_empty()
            && self.quieted.is_empty()
    }
}
