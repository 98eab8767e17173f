use url::Url;

use super::core::{child_url, JenkinsClient};
use crate::error::Result;
use crate::tail::{LogChunk, LogSource};
use crate::types::BuildRef;

const TEXT_SIZE_HEADER: &str = "X-Text-Size";
const MORE_DATA_HEADER: &str = "X-More-Data";

/// Console output of one build, served from a byte offset.
pub struct ProgressiveLog<'a> {
    client: &'a JenkinsClient,
    url: Url,
}

impl<'a> ProgressiveLog<'a> {
    pub fn new(client: &'a JenkinsClient, build: &BuildRef) -> Result<Self> {
        let url = child_url(&build.url, "logText/progressiveText")?;
        Ok(Self { client, url })
    }
}

impl LogSource for ProgressiveLog<'_> {
    async fn fetch(&self, offset: u64) -> Result<LogChunk> {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("start", &offset.to_string());

        let response = self.client.send(self.client.client.get(url)).await?;
        let headers = response.headers();

        let more = headers
            .get(MORE_DATA_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        let reported_size = headers
            .get(TEXT_SIZE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let text = response.text().await?;
        let next_offset = reported_size.unwrap_or(offset + text.len() as u64);

        Ok(LogChunk {
            text,
            more,
            next_offset,
        })
    }
}
