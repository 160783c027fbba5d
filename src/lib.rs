//! Live-event EPG synthesizer
//!
//! Turns a per-date/per-category live event feed into per-channel XMLTV
//! programme timelines, appends externally supplied guide fragments and
//! writes the merged document plus a gzip copy.

pub mod config;
pub mod epg;
pub mod feed;
pub mod fetch;

use thiserror::Error;

/// Errors surfaced past the library boundary
#[derive(Debug, Error)]
pub enum GuideError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
