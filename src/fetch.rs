//! Fragment retrieval
//!
//! Downloads external guide fragments over HTTP(S) with retry support.
//! Each source URL is independent: a download or parse failure drops
//! that one fragment with a warning and the run continues with whatever
//! sources succeeded.

#![allow(dead_code)]

use std::io::Read;
use std::time::Duration;

use tracing::{info, warn};

use crate::epg::{FragmentParser, GuideFragment};

/// Upper bound on concurrently fetched sources
pub const MAX_PARALLEL_FETCHES: usize = 4;

/// Download configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum retry attempts
    pub max_retries: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds
    pub read_timeout_secs: u64,
    /// Chunk size for reading (bytes)
    pub chunk_size: usize,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 2000,
            connect_timeout_secs: 30,
            read_timeout_secs: 120,
            chunk_size: 64 * 1024,
            user_agent: "live-epg/1.0".to_string(),
        }
    }
}

pub struct FragmentFetcher;

impl FragmentFetcher {
    /// Create a configured ureq agent
    fn create_agent(config: &FetchConfig) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.read_timeout_secs)))
            .timeout_connect(Some(Duration::from_secs(config.connect_timeout_secs)))
            .max_idle_connections(4)
            .max_idle_connections_per_host(2)
            .build()
            .new_agent()
    }

    /// Download a fragment body with retry support (HTTP and HTTPS)
    pub fn fetch_bytes(url: &str, config: &FetchConfig) -> Result<Vec<u8>, String> {
        let agent = Self::create_agent(config);
        let mut attempts = 0;

        loop {
            attempts += 1;

            match Self::try_fetch(&agent, url, config) {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    if attempts >= config.max_retries {
                        return Err(format!("Download failed after {} attempts: {}", attempts, e));
                    }
                    std::thread::sleep(Duration::from_millis(config.retry_delay_ms));
                }
            }
        }
    }

    fn try_fetch(agent: &ureq::Agent, url: &str, config: &FetchConfig) -> Result<Vec<u8>, String> {
        let response = agent
            .get(url)
            .header("User-Agent", &config.user_agent)
            .call()
            .map_err(|e| format!("Request failed: {}", e))?;

        let status = response.status();
        if status != 200 && status != 206 {
            return Err(format!("HTTP error: {}", status));
        }

        let mut reader = response.into_body().into_reader();
        let mut buffer = vec![0u8; config.chunk_size];
        let mut body = Vec::new();

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => body.extend_from_slice(&buffer[..n]),
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(format!("Read failed: {}", e)),
            }
        }

        Ok(body)
    }

    /// Fetch and parse every configured fragment source
    ///
    /// Sources are fetched a bounded batch at a time and returned in the
    /// order their URLs were given. Failed sources are simply absent.
    pub fn fetch_fragments(urls: &[String], config: &FetchConfig) -> Vec<GuideFragment> {
        let mut fragments = Vec::new();

        for batch in urls.chunks(MAX_PARALLEL_FETCHES) {
            let results: Vec<Option<GuideFragment>> = std::thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|url| {
                        scope.spawn(move || match Self::fetch_bytes(url, config) {
                            Ok(bytes) => match FragmentParser::parse_bytes(&bytes) {
                                Ok(fragment) => {
                                    info!(
                                        "Fragment {}: {} channels, {} programmes",
                                        url,
                                        fragment.channels.len(),
                                        fragment.programmes.len()
                                    );
                                    Some(fragment)
                                }
                                Err(e) => {
                                    warn!("Fragment {} failed to parse: {}", url, e);
                                    None
                                }
                            },
                            Err(e) => {
                                warn!("Fragment {} failed to download: {}", url, e);
                                None
                            }
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap_or(None)).collect()
            });
            fragments.extend(results.into_iter().flatten());
        }

        fragments
    }
}
