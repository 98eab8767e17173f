use std::sync::Arc;

use log::debug;
use reqwest::cookie::Jar;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::session::SessionStore;
use crate::auth::Credentials;
use crate::error::{JenkinsError, Result};

/// Outcome of the one login attempt a run may make.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum LoginState {
    Pending,
    Ready,
    Failed(String),
}

/// HTTP client for one Jenkins server.
///
/// Reads go straight to the JSON API. Writes authenticate lazily on first
/// use and carry a CSRF crumb when the server issues one.
pub struct JenkinsClient {
    pub(super) client: Client,
    pub(super) base_url: Url,
    pub(super) jar: Arc<Jar>,
    pub(super) session: SessionStore,
    pub(super) credentials: Credentials,
    pub(super) login: LoginState,
    pub(super) crumb: Option<Option<(String, String)>>,
}

impl JenkinsClient {
    pub fn new(base_url: &str, credentials: Credentials, session: SessionStore) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| JenkinsError::Config(format!("Invalid base URI '{base_url}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        if let Some(cookies) = session.load(&base_url) {
            debug!("Restoring stored session for {base_url}");
            for cookie in cookies.split(';').map(str::trim).filter(|c| !c.is_empty()) {
                jar.add_cookie_str(cookie, &base_url);
            }
        }

        let client = Client::builder()
            .user_agent(concat!("jenkins-cli/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| JenkinsError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            jar,
            session,
            credentials,
            login: LoginState::Pending,
            crumb: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Server URL built from path segments, each percent-encoded.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| JenkinsError::Config(format!("Base URI cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// JSON API URL below `segments`, restricted to the fields of `tree`.
    pub(super) fn api_url(&self, segments: &[&str], tree: &str) -> Result<Url> {
        let mut all = segments.to_vec();
        all.extend(["api", "json"]);
        let mut url = self.endpoint(&all)?;
        url.query_pairs_mut().append_pair("tree", tree);
        Ok(url)
    }

    /// Sends `request` and returns the response whatever its status.
    pub(super) async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        debug!("{} {}", request.method(), request.url());

        let response = self.client.execute(request).await?;
        debug!("<- {} {}", response.status(), response.url());
        Ok(response)
    }

    pub(super) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        check_status(self.execute(request).await?).await
    }

    pub(super) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    pub(super) async fn get_text(&self, url: Url) -> Result<String> {
        let response = self.send(self.client.get(url)).await?;
        Ok(response.text().await?)
    }

    /// POSTs to `url` after making sure the session may write.
    pub(super) async fn post(&mut self, url: Url) -> Result<()> {
        self.ensure_login().await?;

        let mut request = self.client.post(url);
        if let Some((field, crumb)) = self.crumb().await? {
            request = request.header(field, crumb);
        }

        self.send(request).await?;
        Ok(())
    }
}

/// Resolves `path` against a URL reported by the server.
///
/// Jenkins reports job and build URLs with a trailing slash; one is added if
/// missing so `path` lands below it rather than replacing the last segment.
pub(super) fn child_url(base: &str, path: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let with_slash = format!("{}/", url.path());
        url.set_path(&with_slash);
    }
    Ok(url.join(path)?)
}

pub(super) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let message = response
        .text()
        .await
        .map(|body| summarize_body(&body))
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    Err(JenkinsError::Api {
        url,
        status: status.as_u16(),
        message,
    })
}

/// First non-blank line of an error body, short enough for a status line.
fn summarize_body(body: &str) -> String {
    const MAX_CHARS: usize = 200;

    let line = body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no response body");
    line.chars().take(MAX_CHARS).collect()
}
