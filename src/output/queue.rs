use std::fmt::Write;

use indexmap::IndexMap;

use super::status::render_job;
use super::styling::bright;
use crate::queue::QueueSnapshot;
use crate::types::Job;

/// Widest host header printed before it is elided.
pub const HOST_WIDTH: usize = 40;

const ELLIPSIS: &str = "...";

/// Shortens `text` to `width` characters by cutting out its middle, so both
/// the start and the end stay visible.
pub fn elide_middle(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    if width <= ELLIPSIS.len() {
        return text.chars().take(width).collect();
    }

    let keep = width - ELLIPSIS.len();
    let head = keep - keep / 2;
    let tail = keep / 2;

    let start: String = text.chars().take(head).collect();
    let end: String = text.chars().skip(len - tail).collect();
    format!("{start}{ELLIPSIS}{end}")
}

fn push_jobs(out: &mut String, jobs: &[Job], indent: &str, stoplight: bool) {
    for job in jobs {
        let _ = writeln!(out, "{indent}{}", render_job(job, stoplight));
    }
}

fn push_hosts(out: &mut String, title: &str, hosts: &IndexMap<String, Vec<Job>>, stoplight: bool) {
    if hosts.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}", bright(title).underlined());
    for (host, jobs) in hosts {
        let _ = writeln!(out, "  {}", bright(elide_middle(host, HOST_WIDTH)));
        push_jobs(out, jobs, "    ", stoplight);
    }
}

fn push_list(out: &mut String, title: &str, jobs: &[Job], stoplight: bool) {
    if jobs.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}", bright(title).underlined());
    push_jobs(out, jobs, "  ", stoplight);
}

/// Renders the queue in fixed section order: blocked, stuck (only when
/// `show_stuck`), running, quieted. Empty sections are left out.
pub fn render_queue(snapshot: &QueueSnapshot, show_stuck: bool, stoplight: bool) -> String {
    let mut out = String::new();

    push_hosts(&mut out, "Blocked", &snapshot.blocked, stoplight);
    if show_stuck {
        push_hosts(&mut out, "Stuck", &snapshot.stuck, stoplight);
    }
    push_list(&mut out, "Already running", &snapshot.running, stoplight);
    push_list(&mut out, "Quiet period", &snapshot.quieted, stoplight);

    if out.is_empty() {
        out.push_str("Build queue is empty\n");
    }
    out
}
