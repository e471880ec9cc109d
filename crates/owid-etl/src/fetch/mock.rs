//! In-memory fetcher for testing.

use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::Mutex;

use crate::config::FetchConfig;
use crate::error::{EtlError, Result};

use super::{Body, FetchOutcome, Fetcher, RangeSource, download_resumable};

/// Serves registered bodies from memory.
///
/// An interrupted URL breaks off after `bytes_per_attempt` bytes on each of
/// its first `failures` requests, which drives the same resume loop as
/// [`HttpFetcher`](super::HttpFetcher).
pub struct MockFetcher {
    config: FetchConfig,
    bodies: HashMap<String, Vec<u8>>,
    interruptions: Mutex<HashMap<String, Interruption>>,
    requests: Mutex<Vec<(String, u64)>>,
}

#[derive(Debug, Clone, Copy)]
struct Interruption {
    failures: u32,
    bytes_per_attempt: usize,
}

impl MockFetcher {
    /// Create an empty mock fetcher.
    pub fn new() -> Self {
        Self::with_config(FetchConfig::default())
    }

    /// Create with custom retry settings.
    pub fn with_config(config: FetchConfig) -> Self {
        Self {
            config,
            bodies: HashMap::new(),
            interruptions: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Register the body served for `url`.
    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }

    /// Interrupt the first `failures` transfers of `url`.
    pub fn with_interruptions(self, url: impl Into<String>, failures: u32, bytes_per_attempt: usize) -> Self {
        if let Ok(mut map) = self.interruptions.lock() {
            map.insert(
                url.into(),
                Interruption {
                    failures,
                    bytes_per_attempt,
                },
            );
        }
        self
    }

    /// Every request issued so far as `(url, range offset)`.
    pub fn requests(&self) -> Vec<(String, u64)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeSource for MockFetcher {
    fn open(&self, url: &str, offset: u64) -> Result<Body> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((url.to_string(), offset));
        }

        let body = self.bodies.get(url).ok_or_else(|| EtlError::Http {
            url: url.to_string(),
            message: "server returned 404 Not Found".to_string(),
        })?;
        let start = (offset as usize).min(body.len());
        let remaining = body[start..].to_vec();

        let fail_after = match self.interruptions.lock() {
            Ok(mut map) => match map.get_mut(url) {
                Some(i) if i.failures > 0 => {
                    i.failures -= 1;
                    Some(i.bytes_per_attempt)
                }
                _ => None,
            },
            Err(_) => None,
        };

        Ok(Body {
            reader: Box::new(InterruptingReader {
                data: remaining,
                position: 0,
                fail_after,
            }),
            resumed: offset > 0,
        })
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        download_resumable(self, url, &self.config)
    }
}

/// Yields `data`, failing once `fail_after` bytes have been read.
struct InterruptingReader {
    data: Vec<u8>,
    position: usize,
    fail_after: Option<usize>,
}

impl Read for InterruptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = match self.fail_after {
            Some(n) if self.position >= n => {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                ));
            }
            Some(n) => n.min(self.data.len()),
            None => self.data.len(),
        };
        let end = limit.min(self.position + buf.len());
        let n = end - self.position;
        buf[..n].copy_from_slice(&self.data[self.position..end]);
        self.position = end;
        Ok(n)
    }
}
