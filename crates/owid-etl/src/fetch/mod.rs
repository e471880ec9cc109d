//! Resumable retrieval of source files.
//!
//! Every [`Fetcher`] shares the same resume loop: a body is streamed in
//! chunks, and when the transfer breaks off the request is reissued from
//! the last received byte until the retry budget runs out.

mod http;
mod mock;

use std::io::{ErrorKind, Read};

use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::Result;

pub use http::HttpFetcher;
pub use mock::MockFetcher;

/// Result of a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Bytes received, in order.
    pub bytes: Vec<u8>,
    /// False when the retry budget ran out before the body ended.
    pub complete: bool,
    /// Number of requests issued.
    pub attempts: u32,
}

/// Retrieves the full body behind a URL.
pub trait Fetcher: Send + Sync {
    /// Download `url`.
    ///
    /// Failures of the first request are errors. Interruptions after that
    /// are resumed; an exhausted budget yields an incomplete outcome.
    fn fetch(&self, url: &str) -> Result<FetchOutcome>;
}

/// An opened response body.
pub(crate) struct Body {
    pub(crate) reader: Box<dyn Read + Send>,
    /// True when the body starts at the requested offset rather than at 0.
    pub(crate) resumed: bool,
}

/// A byte source that can be (re)opened at an offset.
pub(crate) trait RangeSource {
    fn open(&self, url: &str, offset: u64) -> Result<Body>;
}

/// Stream `url` from `source`, resuming interrupted transfers.
pub(crate) fn download_resumable(
    source: &impl RangeSource,
    url: &str,
    config: &FetchConfig,
) -> Result<FetchOutcome> {
    let mut bytes: Vec<u8> = Vec::new();
    let mut attempts: u32 = 0;
    let mut buffer = vec![0u8; config.chunk_size.max(1)];

    loop {
        attempts += 1;
        let offset = bytes.len() as u64;

        let body = match source.open(url, offset) {
            Ok(body) => body,
            Err(e) if attempts == 1 => return Err(e),
            Err(e) => {
                warn!(url, attempt = attempts, error = %e, "reconnect failed");
                if attempts > config.max_retries {
                    return Ok(incomplete(url, bytes, attempts));
                }
                continue;
            }
        };

        if offset > 0 && !body.resumed {
            debug!(url, "server ignored range request; restarting from the beginning");
            bytes.clear();
        }

        match read_into(body.reader, &mut bytes, &mut buffer) {
            Ok(()) => {
                debug!(url, bytes = bytes.len(), attempts, "download complete");
                return Ok(FetchOutcome {
                    bytes,
                    complete: true,
                    attempts,
                });
            }
            Err(e) => {
                warn!(
                    url,
                    received = bytes.len(),
                    attempt = attempts,
                    error = %e,
                    "download interrupted; resuming"
                );
                if attempts > config.max_retries {
                    return Ok(incomplete(url, bytes, attempts));
                }
            }
        }
    }
}

fn incomplete(url: &str, bytes: Vec<u8>, attempts: u32) -> FetchOutcome {
    warn!(
        url,
        received = bytes.len(),
        "retry budget exhausted; the download may be incomplete"
    );
    FetchOutcome {
        bytes,
        complete: false,
        attempts,
    }
}

fn read_into(
    mut reader: Box<dyn Read + Send>,
    bytes: &mut Vec<u8>,
    buffer: &mut [u8],
) -> std::io::Result<()> {
    loop {
        match reader.read(buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => bytes.extend_from_slice(&buffer[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
