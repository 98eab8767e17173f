use std::time::Duration;

use crate::error::Result;

/// Pause between two polls of a log that has more data coming.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// One increment of a progressively fetched build log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogChunk {
    pub text: String,
    /// Whether upstream has more output to come
    pub more: bool,
    /// Byte offset to resume from on the next poll
    pub next_offset: u64,
}

/// Something that serves a build log from a byte offset.
#[allow(async_fn_in_trait)]
pub trait LogSource {
    async fn fetch(&self, offset: u64) -> Result<LogChunk>;
}

/// Follows a build log until upstream reports no more data.
///
/// Holds its own resume offset and completion state. The first poll starts at
/// offset 0 and every later poll resumes where the previous one ended, after
/// sleeping the poll interval.
pub struct LogTail<S> {
    source: S,
    offset: u64,
    finished: bool,
    polled: bool,
    interval: Duration,
}

impl<S: LogSource> LogTail<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            offset: 0,
            finished: false,
            polled: false,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Fetches the next increment, or `None` once the log is complete.
    pub async fn next_chunk(&mut self) -> Result<Option<String>> {
        if self.finished {
            return Ok(None);
        }
        if self.polled {
            tokio::time::sleep(self.interval).await;
        }

        let chunk = self.source.fetch(self.offset).await?;
        self.polled = true;
        self.offset = chunk.next_offset;
        self.finished = !chunk.more;

        Ok(Some(chunk.text))
    }
}
