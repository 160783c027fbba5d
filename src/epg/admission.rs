//! Admission filtering
//!
//! Decides which feed events are live enough to synthesize, given a
//! fixed current moment: today's events within a trailing grace window,
//! plus yesterday's events filed past midnight (00:00-04:00 feed time).

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::warn;

use super::{clean_text, SkipReason, SynthesisReport};
use crate::config::GuideConfig;
use crate::feed::{ChannelRef, RawFeed};

/// Category excluded from the guide regardless of date
const EXCLUDED_CATEGORY: &str = "tv shows";

/// Seconds from midnight up to which a yesterday event is carried over
const CARRY_OVER_SECONDS: u32 = 4 * 3600;

/// Day-window and keyword policy for admitting feed events
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    /// Whole-word markers a channel name must carry
    pub keywords: Vec<String>,
    /// Feed-to-local wall-clock correction, in hours
    pub timezone_offset_hours: i64,
    /// Trailing window after the corrected start, in hours
    pub grace_window_hours: i64,
}

impl AdmissionPolicy {
    pub fn from_config(config: &GuideConfig) -> Self {
        Self {
            keywords: config.keywords.clone(),
            timezone_offset_hours: config.timezone_offset_hours,
            grace_window_hours: config.grace_window_hours,
        }
    }
}

/// An event that passed admission, with its corrected local start
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedEvent {
    pub start_local: NaiveDateTime,
    pub title: String,
    pub description: Option<String>,
    pub channels: Vec<ChannelRef>,
}

/// A category's admitted events; the name is already markup-free
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedCategory {
    pub name: String,
    pub events: Vec<AdmittedEvent>,
}

/// All admitted content for one calendar date
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedDay {
    pub date: NaiveDate,
    pub categories: Vec<AdmittedCategory>,
}

/// Apply the day-window and keyword rules to a feed
pub fn admit(
    feed: &RawFeed,
    now_local: NaiveDateTime,
    policy: &AdmissionPolicy,
    report: &mut SynthesisReport,
) -> Vec<AdmittedDay> {
    let today = now_local.date();
    let yesterday = today - Duration::days(1);
    let grace = Duration::hours(policy.grace_window_hours);
    let offset = Duration::hours(policy.timezone_offset_hours);

    let mut days = Vec::new();
    for day in &feed.days {
        let date = match parse_date_heading(&day.date_key) {
            Some(date) => date,
            None => {
                warn!("Unparseable date heading '{}', section skipped", day.date_key);
                report.skip(SkipReason::BadDateHeading(day.date_key.clone()));
                continue;
            }
        };
        if date != today && date != yesterday {
            report.skip(SkipReason::DateOutOfWindow(date));
            continue;
        }
        let is_yesterday = date == yesterday;

        let mut categories = Vec::new();
        for category in &day.categories {
            let name = clean_text(&category.name).trim().to_string();
            if name.eq_ignore_ascii_case(EXCLUDED_CATEGORY) {
                report.skip(SkipReason::ExcludedCategory(name));
                continue;
            }
            for _ in 0..category.malformed {
                report.skip(SkipReason::MalformedEvent(name.clone()));
            }

            let mut events = Vec::new();
            for event in &category.events {
                let time = match NaiveTime::parse_from_str(&event.time, "%H:%M") {
                    Ok(time) => time,
                    Err(_) => {
                        warn!("Unparseable time '{}' for event '{}'", event.time, event.title);
                        report.skip(SkipReason::BadEventTime {
                            title: event.title.clone(),
                            time: event.time.clone(),
                        });
                        continue;
                    }
                };
                let start_local = date.and_time(time) + offset;

                if is_yesterday {
                    // carry-over is judged on the original feed time, not the corrected one
                    if time.num_seconds_from_midnight() > CARRY_OVER_SECONDS {
                        report.skip(SkipReason::OutsideCarryOver(event.title.clone()));
                        continue;
                    }
                } else if now_local - start_local > grace {
                    report.skip(SkipReason::StaleEvent(event.title.clone()));
                    continue;
                }

                let channels: Vec<ChannelRef> = event
                    .channels
                    .iter()
                    .filter(|ch| channel_matches(&policy.keywords, &ch.channel_name))
                    .cloned()
                    .collect();
                if channels.is_empty() {
                    report.skip(SkipReason::NoMatchingChannels(event.title.clone()));
                    continue;
                }

                events.push(AdmittedEvent {
                    start_local,
                    title: event.title.clone(),
                    description: event.description.clone(),
                    channels,
                });
            }
            if !events.is_empty() {
                categories.push(AdmittedCategory { name, events });
            }
        }
        if !categories.is_empty() {
            days.push(AdmittedDay { date, categories });
        }
    }
    days
}

/// Parse a feed date heading like "Saturday 15th Nov 2025 - Schedule"
pub fn parse_date_heading(heading: &str) -> Option<NaiveDate> {
    let prefix = match heading.find(" - ") {
        Some(i) => &heading[..i],
        None => heading,
    };
    let cleaned = strip_ordinal_suffixes(prefix.trim());

    const FORMATS: [&str; 6] = [
        "%A %d %b %Y",
        "%A %d %B %Y",
        "%a %d %b %Y",
        "%d %b %Y",
        "%d %B %Y",
        "%Y-%m-%d",
    ];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date);
        }
    }
    None
}

/// Drop English ordinal suffixes after day numbers ("15th Nov" -> "15 Nov")
fn strip_ordinal_suffixes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        out.push(c);
        rest = &rest[c.len_utf8()..];
        if c.is_ascii_digit() && !rest.starts_with(|d: char| d.is_ascii_digit()) {
            for suffix in ["st", "nd", "rd", "th"] {
                if rest.starts_with(suffix) {
                    rest = &rest[2..];
                    break;
                }
            }
        }
    }
    out
}

/// Whole-word keyword match against a channel display name
fn channel_matches(keywords: &[String], channel_name: &str) -> bool {
    let cleaned = clean_text(channel_name).to_lowercase();
    cleaned
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| !word.is_empty())
        .any(|word| keywords.iter().any(|k| k == word))
}
