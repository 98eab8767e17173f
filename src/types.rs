use serde::{Deserialize, Serialize};

/// Suffix Jenkins appends to a job color while a build is running.
pub const BUILDING_SUFFIX: &str = "_anime";

/// `tree` query selecting the job fields this client reads.
pub const JOB_TREE: &str = "name,url,color,inQueue,lastBuild[number,url,timestamp,duration]";

/// A Jenkins job.
///
/// Built directly from one JSON object of the job, view or root listing
/// endpoints. `last_build` is absent in listings that omit it and for jobs
/// that have never been built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job name
    pub name: String,
    /// Absolute URL of the job page, with trailing slash
    pub url: String,
    /// Status color (e.g. "blue", "red_anime", "disabled"); folders have none
    #[serde(default)]
    pub color: String,
    /// Whether a build of this job is waiting in the queue
    #[serde(default)]
    pub in_queue: bool,
    /// Most recent build, if known
    #[serde(default)]
    pub last_build: Option<BuildRef>,
}

/// Reference to a single build of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRef {
    pub number: u64,
    pub url: String,
    /// Start time in milliseconds since the epoch
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration: Option<u64>,
}

/// One entry of a job's build history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    /// "SUCCESS", "FAILURE", "ABORTED", ...; `None` while running
    #[serde(default)]
    pub result: Option<String>,
    pub url: String,
    pub number: u64,
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub duration: u64,
}

impl Job {
    /// Color with the running suffix removed.
    pub fn base_color(&self) -> &str {
        self.color
            .strip_suffix(BUILDING_SUFFIX)
            .unwrap_or(&self.color)
    }

    pub fn is_building(&self) -> bool {
        self.color.ends_with(BUILDING_SUFFIX)
    }

    pub fn last_build_aborted(&self) -> bool {
        self.base_color() == "aborted"
    }

    /// Derives the entry shown for one historical build of this job.
    ///
    /// The build inherits the job's name while its own URL, state and
    /// timing replace the job's.
    pub fn for_build(&self, build: &Build) -> Job {
        let base = match build.result.as_deref() {
            Some("SUCCESS") => "blue",
            Some("FAILURE") => "red",
            Some("ABORTED") => "aborted",
            Some("UNSTABLE") => "yellow",
            _ => "grey",
        };
        let color = if build.building {
            format!("{base}{BUILDING_SUFFIX}")
        } else {
            base.to_string()
        };

        Job {
            color,
            url: build.url.clone(),
            in_queue: false,
            last_build: Some(BuildRef {
                number: build.number,
                url: build.url.clone(),
                timestamp: Some(build.timestamp),
                duration: Some(build.duration),
            }),
            ..self.clone()
        }
    }
}

/// Response of a view or of the root listing.
#[derive(Debug, Default, Deserialize)]
pub struct JobListing {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub views: Vec<ViewRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct BuildHistory {
    #[serde(default)]
    pub builds: Vec<Build>,
}

/// One pending item of the build queue.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueItem {
    pub task: Job,
    /// Human-readable reason the item is waiting
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub stuck: bool,
}

#[derive(Debug, Deserialize)]
pub struct Queue {
    #[serde(default)]
    pub items: Vec<QueueItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crumb {
    pub crumb: String,
    pub crumb_request_field: String,
}

#[cfg(test)]
pub(crate) fn job(name: &str, color: &str) -> Job {
    Job {
        name: name.to_string(),
        url: format!("http://ci.example.com/job/{name}/"),
        color: color.to_string(),
        in_queue: false,
        last_build: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserializes_from_api_object() {
        let json = r#"{
            "_class": "hudson.model.FreeStyleProject",
            "name": "deploy",
            "url": "http://ci.example.com/job/deploy/",
            "color": "red_anime",
            "inQueue": true,
            "lastBuild": {"number": 41, "url": "http://ci.example.com/job/deploy/41/"}
        }"#;

        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.name, "deploy");
        assert!(job.in_queue);
        assert!(job.is_building());
        assert_eq!(job.base_color(), "red");
        assert_eq!(job.last_build.unwrap().number, 41);
    }

    #[test]
    fn test_job_listing_defaults_missing_fields() {
        let listing: JobListing =
            serde_json::from_str(r#"{"jobs": [{"name": "a", "url": "u"}]}"#).unwrap();
        assert_eq!(listing.jobs[0].color, "");
        assert!(!listing.jobs[0].in_queue);
        assert!(listing.views.is_empty());
    }

    #[test]
    fn test_aborted_detection_ignores_running_suffix() {
        assert!(job("a", "aborted_anime").last_build_aborted());
        assert!(!job("a", "blue").last_build_aborted());
    }

    #[test]
    fn test_for_build_overrides_state_but_keeps_name() {
        let parent = Job {
            in_queue: true,
            ..job("deploy", "blue")
        };
        let build = Build {
            result: None,
            url: "http://ci.example.com/job/deploy/7/".to_string(),
            number: 7,
            building: true,
            timestamp: 1_700_000_000_000,
            duration: 0,
        };

        let entry = parent.for_build(&build);
        assert_eq!(entry.name, "deploy");
        assert_eq!(entry.url, build.url);
        assert_eq!(entry.color, "grey_anime");
        assert!(!entry.in_queue);
        assert_eq!(entry.last_build.unwrap().number, 7);
    }

    #[test]
    fn test_for_build_maps_aborted_result() {
        let build = Build {
            result: Some("ABORTED".to_string()),
            url: "u".to_string(),
            number: 3,
            building: false,
            timestamp: 0,
            duration: 1500,
        };
        assert!(job("x", "blue").for_build(&build).last_build_aborted());
    }
}
