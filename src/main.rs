//! Live EPG generator
//!
//! Reads the daily schedule feed, synthesizes per-channel guide
//! timelines, merges external fragments and writes the XMLTV document
//! plus its gzip copy.

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::Path;
use std::process::ExitCode;

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};

use live_epg::config::GuideConfig;
use live_epg::epg::{admit, merge, synthesize, write_guide_files};
use live_epg::epg::{AdmissionPolicy, SynthesisReport};
use live_epg::feed::RawFeed;
use live_epg::fetch::{FetchConfig, FragmentFetcher};
use live_epg::GuideError;

fn main() -> ExitCode {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "live_epg=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter.as_str())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Guide generation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), GuideError> {
    let config = GuideConfig::load();
    let now_local = Utc::now().naive_utc() + Duration::hours(config.timezone_offset_hours);

    let feed = match RawFeed::load(Path::new(&config.feed_path)) {
        Ok(feed) => {
            info!("Loaded {} events from {}", feed.event_count(), config.feed_path);
            feed
        }
        Err(e) => {
            warn!(
                "Feed {} unavailable ({}), building an empty guide",
                config.feed_path, e
            );
            RawFeed::default()
        }
    };

    let policy = AdmissionPolicy::from_config(&config);
    let mut report = SynthesisReport::default();
    let days = admit(&feed, now_local, &policy, &mut report);
    let document = synthesize(&days, config.main_duration_hours, &mut report);

    let fragments = FragmentFetcher::fetch_fragments(&config.fragment_urls, &FetchConfig::default());
    let merged = merge(&document, &fragments, config.timezone_offset_hours);

    write_guide_files(&merged, Path::new(&config.output_path))?;

    info!(
        "Admitted {} events, skipped {} ({} zero-length, {} overlapping announcements)",
        report.admitted_events,
        report.skip_count(),
        report.zero_length_announcements,
        report.overlapping_announcements
    );
    for skip in &report.skips {
        debug!("Skipped: {}", skip);
    }

    Ok(())
}
