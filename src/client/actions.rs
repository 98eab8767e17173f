use std::fmt;

use log::debug;

use super::core::{child_url, JenkinsClient};
use crate::error::Result;
use crate::types::Job;

/// Write operations applied to each resolved job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Enable,
    Disable,
    Wipeout,
}

/// What performing an action amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    /// `stop` on a job with no running build
    NotRunning,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Wipeout => "wipeout",
        }
    }

    /// Endpoint below the job URL; `stop` is sent to the build instead.
    fn endpoint(self) -> &'static str {
        match self {
            Self::Start => "build",
            Self::Stop => "stop",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Wipeout => "doWipeOutWorkspace",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl JenkinsClient {
    pub async fn perform(&mut self, action: Action, job: &Job) -> Result<ActionOutcome> {
        let url = match action {
            Action::Stop => {
                if !job.is_building() {
                    debug!("'{}' is not running, nothing to stop", job.name);
                    return Ok(ActionOutcome::NotRunning);
                }
                let build = self.last_build(job).await?;
                child_url(&build.url, action.endpoint())?
            }
            _ => child_url(&job.url, action.endpoint())?,
        };

        self.post(url).await?;
        Ok(ActionOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::client::SessionStore;
    use crate::error::JenkinsError;
    use crate::types::BuildRef;
    use mockito::{Matcher, Mock, Server, ServerGuard};

    async fn server_without_login() -> (ServerGuard, Vec<Mock>) {
        let mut server = Server::new_async().await;
        let probe = server
            .mock("GET", "/")
            .with_body("<a href=\"/logout\">log out</a>")
            .create_async()
            .await;
        let crumb = server
            .mock("GET", "/crumbIssuer/api/json")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        (server, vec![probe, crumb])
    }

    fn client(server: &ServerGuard) -> JenkinsClient {
        JenkinsClient::new(&server.url(), Credentials::default(), SessionStore::ephemeral())
            .unwrap()
    }

    fn job(server: &ServerGuard, name: &str, color: &str) -> Job {
        Job {
            name: name.to_string(),
            url: format!("{}/job/{name}/", server.url()),
            color: color.to_string(),
            in_queue: false,
            last_build: None,
        }
    }

    #[tokio::test]
    async fn test_action_endpoints() {
        let (mut server, _writes) = server_without_login().await;
        let mut mocks = Vec::new();
        for path in ["build", "enable", "disable", "doWipeOutWorkspace"] {
            mocks.push(
                server
                    .mock("POST", format!("/job/api/{path}").as_str())
                    .with_status(201)
                    .expect(1)
                    .create_async()
                    .await,
            );
        }

        let mut client = client(&server);
        let api = job(&server, "api", "blue");
        for action in [Action::Start, Action::Enable, Action::Disable, Action::Wipeout] {
            assert_eq!(client.perform(action, &api).await.unwrap(), ActionOutcome::Done);
        }

        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_stop_idle_job_makes_no_request() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let any_post = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut client = client(&server);
        let outcome = client
            .perform(Action::Stop, &job(&server, "api", "blue"))
            .await
            .unwrap();

        assert_eq!(outcome, ActionOutcome::NotRunning);
        any.assert_async().await;
        any_post.assert_async().await;
    }

    #[tokio::test]
    async fn test_stop_posts_to_running_build() {
        let (mut server, _writes) = server_without_login().await;
        let stop = server
            .mock("POST", "/job/api/12/stop")
            .expect(1)
            .create_async()
            .await;

        let running = Job {
            last_build: Some(BuildRef {
                number: 12,
                url: format!("{}/job/api/12/", server.url()),
                timestamp: None,
                duration: None,
            }),
            ..job(&server, "api", "red_anime")
        };

        let mut client = client(&server);
        assert_eq!(
            client.perform(Action::Stop, &running).await.unwrap(),
            ActionOutcome::Done
        );
        stop.assert_async().await;
    }

    #[tokio::test]
    async fn test_stop_never_built_job_fails() {
        let (mut server, _writes) = server_without_login().await;
        let _m = server
            .mock("GET", "/job/api/api/json")
            .match_query(Matcher::Any)
            .with_body(format!(
                r#"{{"name": "api", "url": "{}/job/api/", "color": "notbuilt_anime"}}"#,
                server.url()
            ))
            .create_async()
            .await;

        let mut client = client(&server);
        let result = client
            .perform(Action::Stop, &job(&server, "api", "notbuilt_anime"))
            .await;
        assert!(matches!(result, Err(JenkinsError::NeverBuilt(_))));
    }

    #[tokio::test]
    async fn test_failed_post_is_an_error() {
        let (mut server, _writes) = server_without_login().await;
        let _m = server
            .mock("POST", "/job/api/disable")
            .with_status(403)
            .with_body("Forbidden")
            .create_async()
            .await;

        let mut client = client(&server);
        let err = client
            .perform(Action::Disable, &job(&server, "api", "blue"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
