use std::io::{BufRead, Write};

use log::{debug, info};

use crate::client::{Action, ActionOutcome, JenkinsClient, ProgressiveLog};
use crate::config::Settings;
use crate::error::Result;
use crate::output::{self, bright_green, bright_red, FetchProgress};
use crate::queue::QueueSnapshot;
use crate::resolve::{self, JobFilter};
use crate::tail::LogTail;
use crate::types::Job;

/// State of one invocation: the client, the settings, and the job catalog
/// once it has been fetched.
pub struct RunContext {
    client: JenkinsClient,
    settings: Settings,
    catalog: Option<Vec<Job>>,
}

impl RunContext {
    pub fn new(client: JenkinsClient, settings: Settings) -> Self {
        Self {
            client,
            settings,
            catalog: None,
        }
    }

    /// Configured jobs and views, fetched on first use and reused afterwards.
    async fn catalog(&mut self) -> Result<&[Job]> {
        if self.catalog.is_none() {
            let progress = FetchProgress::start("Fetching jobs");
            let fetched = self
                .client
                .fetch_catalog(&self.settings.jobs, &self.settings.views)
                .await;
            progress.finish();
            self.catalog = Some(fetched?);
        }
        Ok(self.catalog.as_deref().unwrap_or_default())
    }

    pub async fn resolve(&mut self, pattern: Option<&str>) -> Result<Vec<Job>> {
        let filter = JobFilter::new(pattern);
        let catalog = self.catalog().await?;
        resolve::select(catalog, &filter)
    }

    pub async fn resolve_single(&mut self, command: &str, pattern: &str) -> Result<Job> {
        let jobs = self.resolve(Some(pattern)).await?;
        resolve::single(jobs, command)
    }
}

pub async fn list(ctx: &mut RunContext, pattern: Option<&str>, out: &mut impl Write) -> Result<()> {
    let jobs = ctx.resolve(pattern).await?;
    write!(out, "{}", output::render_jobs(&jobs, ctx.settings.stoplight))?;
    Ok(())
}

/// Applies `action` to every job matching `pattern`.
///
/// More than one match needs confirmation unless auto-confirm is set; a
/// declined prompt ends the command successfully without touching any job.
/// A failing job is reported and the remaining jobs still run.
///
/// `input` is released before the first request, so a login prompt can read
/// stdin again.
pub async fn act(
    ctx: &mut RunContext,
    action: Action,
    pattern: &str,
    mut input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let jobs = ctx.resolve(Some(pattern)).await?;

    let confirmed = jobs.len() <= 1
        || ctx.settings.auto_confirm
        || output::confirm(action.name(), &jobs, &mut input, out)?;
    drop(input);

    if !confirmed {
        info!("{action} cancelled");
        return Ok(());
    }

    for job in &jobs {
        match ctx.client.perform(action, job).await {
            Ok(outcome) => {
                if outcome == ActionOutcome::NotRunning {
                    debug!("'{}' was not running", job.name);
                }
                writeln!(out, "{}: {}", job.name, bright_green("OK"))?;
            }
            Err(e) => writeln!(out, "{}: {} {e}", job.name, bright_red("ERROR:"))?,
        }
    }

    Ok(())
}

/// Streams the console log of the last build of the single job matching
/// `pattern` until the build is done.
pub async fn tail(ctx: &mut RunContext, pattern: &str, out: &mut impl Write) -> Result<()> {
    let job = ctx.resolve_single("tail", pattern).await?;
    let build = ctx.client.last_build(&job).await?;
    info!("Tailing {} #{}", job.name, build.number);

    let mut tail = LogTail::new(ProgressiveLog::new(&ctx.client, &build)?);
    while let Some(text) = tail.next_chunk().await? {
        write!(out, "{text}")?;
        out.flush()?;
    }
    debug!("{} #{} finished after {} bytes", job.name, build.number, tail.offset());

    Ok(())
}

pub async fn history(
    ctx: &mut RunContext,
    pattern: &str,
    limit: usize,
    out: &mut impl Write,
) -> Result<()> {
    let job = ctx.resolve_single("history", pattern).await?;
    let builds = ctx.client.fetch_history(&job, limit).await?;
    write!(out, "{}", output::render_history(&job, &builds))?;
    Ok(())
}

pub async fn queue(ctx: &mut RunContext, out: &mut impl Write) -> Result<()> {
    let items = ctx.client.fetch_queue().await?;
    let snapshot = QueueSnapshot::from_items(items);
    if snapshot.is_empty() {
        debug!("No queue item has a recognized reason");
    }
    write!(
        out,
        "{}",
        output::render_queue(&snapshot, ctx.settings.show_stuck, ctx.settings.stoplight)
    )?;
    Ok(())
}
