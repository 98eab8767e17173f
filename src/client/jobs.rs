use log::{debug, info};

use super::core::{child_url, JenkinsClient};
use crate::error::{JenkinsError, Result};
use crate::resolve::dedup_by_name;
use crate::types::{Build, BuildHistory, BuildRef, Job, JobListing, Queue, QueueItem, JOB_TREE};

/// Most builds the history endpoint is asked for by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

fn listing_tree() -> String {
    format!("jobs[{JOB_TREE}],views[name]")
}

/// View names along a nested view path.
///
/// Both `parent/child` and `parent/view/child` are accepted. `view` counts
/// as a separator only between two names, so a view called `view` can still
/// be addressed.
fn view_names(path: &str) -> Vec<&str> {
    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();

    let mut names = Vec::with_capacity(parts.len());
    let mut i = 0;
    while i < parts.len() {
        if !names.is_empty() && parts[i] == "view" && i + 1 < parts.len() {
            i += 1;
        }
        names.push(parts[i]);
        i += 1;
    }
    names
}

/// URL path segments of a nested view, `view/<a>/view/<b>/...`.
fn view_segments<S: AsRef<str>>(names: &[S]) -> Vec<&str> {
    names.iter().flat_map(|name| ["view", name.as_ref()]).collect()
}

impl JenkinsClient {
    pub async fn fetch_job(&self, name: &str) -> Result<Job> {
        let url = self.api_url(&["job", name], JOB_TREE)?;
        self.get_json(url).await
    }

    /// Every job listed on the server's front page.
    pub async fn fetch_all_jobs(&self) -> Result<Vec<Job>> {
        let url = self.api_url(&[], &format!("jobs[{JOB_TREE}]"))?;
        let listing: JobListing = self.get_json(url).await?;
        Ok(listing.jobs)
    }

    /// Jobs of a view and, depth first, of every view nested in it.
    ///
    /// Nested views are addressed by their `parent/view/child` path.
    pub async fn fetch_view_jobs(&self, view: &str) -> Result<Vec<Job>> {
        let tree = listing_tree();
        let mut jobs = Vec::new();
        let mut pending: Vec<Vec<String>> = vec![view_names(view)
            .into_iter()
            .map(str::to_string)
            .collect()];

        while let Some(names) = pending.pop() {
            if names.is_empty() {
                continue;
            }
            let path = names.join("/view/");
            let mut segments = view_segments(&names);
            segments.extend(["api", "json"]);
            let mut url = self.endpoint(&segments)?;
            url.query_pairs_mut().append_pair("tree", &tree);

            let listing: JobListing = self.get_json(url).await?;
            debug!(
                "View '{path}' has {} jobs and {} nested views",
                listing.jobs.len(),
                listing.views.len()
            );

            jobs.extend(listing.jobs);
            pending.extend(listing.views.into_iter().rev().map(|child| {
                let mut child_names = names.clone();
                child_names.push(child.name);
                child_names
            }));
        }

        Ok(jobs)
    }

    /// Jobs named explicitly followed by the jobs of the named views,
    /// de-duplicated by name. With neither, every job on the server.
    pub async fn fetch_catalog(&self, jobs: &[String], views: &[String]) -> Result<Vec<Job>> {
        if jobs.is_empty() && views.is_empty() {
            return self.fetch_all_jobs().await;
        }

        let mut catalog = Vec::new();
        for name in jobs {
            catalog.push(self.fetch_job(name).await?);
        }
        for view in views {
            catalog.extend(self.fetch_view_jobs(view).await?);
        }

        let catalog = dedup_by_name(catalog);
        info!("Fetched {} jobs", catalog.len());
        Ok(catalog)
    }

    /// Most recent build of `job`, fetching the job detail if the listing
    /// did not include it.
    pub async fn last_build(&self, job: &Job) -> Result<BuildRef> {
        if let Some(build) = &job.last_build {
            return Ok(build.clone());
        }

        debug!("Fetching last build of '{}'", job.name);
        self.fetch_job(&job.name)
            .await?
            .last_build
            .ok_or_else(|| JenkinsError::NeverBuilt(job.name.clone()))
    }

    /// Up to `limit` most recent builds of `job`, newest first.
    pub async fn fetch_history(&self, job: &Job, limit: usize) -> Result<Vec<Build>> {
        let mut url = child_url(&job.url, "api/json")?;
        url.query_pairs_mut().append_pair(
            "tree",
            &format!("builds[number,url,result,building,timestamp,duration]{{0,{limit}}}"),
        );

        let history: BuildHistory = self.get_json(url).await?;
        Ok(history.builds)
    }

    pub async fn fetch_queue(&self) -> Result<Vec<QueueItem>> {
        let url = self.api_url(&["queue"], "items[why,stuck,task[name,url,color]]")?;
        let queue: Queue = self.get_json(url).await?;
        Ok(queue.items)
    }
}
