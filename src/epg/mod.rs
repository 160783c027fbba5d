//! EPG (Electronic Program Guide) module
//!
//! Contains the admission filter, channel identity resolver, timeline
//! synthesizer, fragment parser/merger and the XMLTV writer.

pub mod admission;
pub mod channel_id;
pub mod fragment;
pub mod merge;
pub mod synth;
pub mod writer;

// Re-export public types
pub use admission::{admit, AdmissionPolicy, AdmittedDay};
pub use channel_id::resolve_channel_id;
pub use fragment::{FragmentParser, GuideFragment};
pub use merge::{merge, MergedGuide};
pub use synth::{synthesize, ChannelDeclaration, GuideDocument, ProgrammeBlock};
pub use writer::write_guide_files;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Why an event or date section was left out of the synthesized guide
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// Date heading could not be parsed as a calendar date
    #[error("unparseable date heading '{0}'")]
    BadDateHeading(String),
    /// Date is neither today nor yesterday
    #[error("date {0} is outside the guide window")]
    DateOutOfWindow(NaiveDate),
    /// Category excluded wholesale
    #[error("category '{0}' is excluded")]
    ExcludedCategory(String),
    /// Event record was not an object of the expected shape
    #[error("malformed event record under '{0}'")]
    MalformedEvent(String),
    /// Event time string could not be parsed
    #[error("unparseable time '{time}' for event '{title}'")]
    BadEventTime { title: String, time: String },
    /// Today event started too long before the current moment
    #[error("event '{0}' started too long ago")]
    StaleEvent(String),
    /// Yesterday event outside the 00:00-04:00 carry-over window
    #[error("event '{0}' is outside yesterday's carry-over window")]
    OutsideCarryOver(String),
    /// No channel name matched the keyword list
    #[error("event '{0}' has no matching channels")]
    NoMatchingChannels(String),
}

/// What a synthesis run produced and what it dropped
#[derive(Debug, Clone, Default)]
pub struct SynthesisReport {
    /// Events that contributed programme blocks
    pub admitted_events: usize,
    /// Announcements omitted because they would be zero-length
    pub zero_length_announcements: usize,
    /// Announcements omitted because the computed start passed the stop
    pub overlapping_announcements: usize,
    /// Everything dropped, with the reason
    pub skips: Vec<SkipReason>,
}

impl SynthesisReport {
    pub fn skip(&mut self, reason: SkipReason) {
        self.skips.push(reason);
    }

    pub fn skip_count(&self) -> usize {
        self.skips.len()
    }
}

/// Strip markup-like bracket sequences from feed text
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '<' {
            for inner in chars.by_ref() {
                if inner == '>' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Render a local timestamp in the XMLTV on-the-wire form
pub fn format_xmltv_timestamp(dt: NaiveDateTime, offset_hours: i64) -> String {
    format!("{} {}", dt.format("%Y%m%d%H%M%S"), format_offset(offset_hours))
}

/// Render a whole-hour UTC offset as "+0200"-style text
pub fn format_offset(offset_hours: i64) -> String {
    let sign = if offset_hours < 0 { '-' } else { '+' };
    format!("{}{:02}00", sign, offset_hours.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::RawFeed;
    use chrono::NaiveDate;

    const SCENARIO_FEED: &str = r#"{"Saturday 15 Nov 2025": {"Football": [
        {"time": "18:00", "event": "Team A vs Team B",
         "channels": [{"channel_name": "Italy Sports 1", "channel_id": "1"}]}
    ]}}"#;

    fn scenario_policy() -> AdmissionPolicy {
        AdmissionPolicy {
            keywords: vec!["italy".to_string()],
            timezone_offset_hours: 2,
            grace_window_hours: 2,
        }
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("<span class=\"x\">Roma</span> vs Lazio"), "Roma vs Lazio");
        assert_eq!(clean_text("plain"), "plain");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(2), "+0200");
        assert_eq!(format_offset(0), "+0000");
        assert_eq!(format_offset(-5), "-0500");
    }

    #[test]
    fn test_format_xmltv_timestamp() {
        let dt = NaiveDate::from_ymd_opt(2025, 11, 15)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        assert_eq!(format_xmltv_timestamp(dt, 2), "20251115200000 +0200");
    }

    #[test]
    fn test_pipeline_upcoming_event_renders_both_blocks() {
        let feed = RawFeed::from_json(SCENARIO_FEED).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 11, 15)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        let mut report = SynthesisReport::default();
        let days = admit(&feed, now, &scenario_policy(), &mut report);
        let document = synthesize(&days, 2, &mut report);
        let merged = merge(&document, &[], 2);
        let xml = writer::render(&merged);

        assert!(xml.contains("<channel id=\"teamavsteamb\">"));
        assert!(xml.contains("<display-name>Team A vs Team B</display-name>"));
        assert!(xml.contains(
            "<programme start=\"20251115000000 +0200\" stop=\"20251115200000 +0200\" channel=\"teamavsteamb\">"
        ));
        assert!(xml.contains(
            "<programme start=\"20251115200000 +0200\" stop=\"20251115220000 +0200\" channel=\"teamavsteamb\">"
        ));
        assert!(xml.contains("<title lang=\"it\">Inizia alle 20:00.</title>"));
        assert!(xml.contains("<desc lang=\"it\">Team A vs Team B</desc>"));
        assert_eq!(report.admitted_events, 1);
    }

    #[test]
    fn test_pipeline_event_is_gone_the_next_night() {
        let feed = RawFeed::from_json(SCENARIO_FEED).unwrap();
        // the date section is now yesterday, and 18:00 is far outside
        // the 00:00-04:00 carry-over window
        let now = NaiveDate::from_ymd_opt(2025, 11, 16)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        let mut report = SynthesisReport::default();
        let days = admit(&feed, now, &scenario_policy(), &mut report);

        assert!(days.is_empty());
        assert_eq!(
            report.skips,
            vec![SkipReason::OutsideCarryOver("Team A vs Team B".to_string())]
        );
    }
}
