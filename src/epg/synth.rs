//! Timeline synthesis
//!
//! Turns admitted events into per-channel programme blocks. Each event
//! contributes an announcement block covering the gap since the channel's
//! previous block (or since local midnight for the first event of the
//! date) followed by a fixed-length main block. Channels never overlap:
//! the announcement is shortened or dropped rather than crossing the
//! event start.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

use super::admission::AdmittedDay;
use super::channel_id::resolve_channel_id;
use super::{clean_text, SynthesisReport};

/// Description used when the feed omits one
pub const DEFAULT_DESCRIPTION: &str = "Trasmesso in diretta.";

/// Category attached to announcement blocks
pub const ANNOUNCEMENT_CATEGORY: &str = "Annuncio";

/// What role a programme block plays in the channel's timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Announcement,
    Event,
}

/// One scheduled programme on a guide lane
#[derive(Debug, Clone, PartialEq)]
pub struct ProgrammeBlock {
    pub channel_id: String,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub kind: BlockKind,
    pub title: String,
    pub description: String,
    pub category: String,
}

/// One `<channel>` declaration in the output document
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDeclaration {
    pub id: String,
    pub display_name: String,
}

/// The synthesized guide before serialization
#[derive(Debug, Clone, Default)]
pub struct GuideDocument {
    pub channels: Vec<ChannelDeclaration>,
    pub programmes: Vec<ProgrammeBlock>,
}

/// Build the guide timeline from admitted events
pub fn synthesize(
    days: &[AdmittedDay],
    main_duration_hours: i64,
    report: &mut SynthesisReport,
) -> GuideDocument {
    let mut doc = GuideDocument::default();
    let mut declared: HashSet<String> = HashSet::new();

    for day in days {
        // The gap tracker starts fresh on every calendar date.
        let mut last_end: HashMap<String, NaiveDateTime> = HashMap::new();

        for category in &day.categories {
            let mut events = category.events.clone();
            // Stable sort: events sharing a start keep their feed order.
            events.sort_by_key(|e| e.start_local);

            for event in &events {
                let title = clean_text(&event.title).replace('&', "and");
                let channel_id = resolve_channel_id(&title);
                let description = event
                    .description
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

                if declared.insert(channel_id.clone()) {
                    doc.channels.push(ChannelDeclaration {
                        id: channel_id.clone(),
                        display_name: title.clone(),
                    });
                }

                let start = event.start_local;
                let stop = start + Duration::hours(main_duration_hours);
                let midnight = start.date().and_time(NaiveTime::MIN);

                let announcement_start = match last_end.get(&channel_id) {
                    Some(prev_end) if *prev_end < start => *prev_end,
                    Some(prev_end) => {
                        info!(
                            "Channel '{}': previous block ends at {} after next start {}, \
                             anchoring announcement to midnight",
                            channel_id, prev_end, start
                        );
                        midnight
                    }
                    None => midnight,
                };

                if announcement_start < start {
                    doc.programmes.push(ProgrammeBlock {
                        channel_id: channel_id.clone(),
                        start: announcement_start,
                        stop: start,
                        kind: BlockKind::Announcement,
                        title: format!("Inizia alle {}.", start.format("%H:%M")),
                        description: format!("{}.", title),
                        category: ANNOUNCEMENT_CATEGORY.to_string(),
                    });
                } else if announcement_start == start {
                    info!(
                        "Channel '{}': no gap before {}, skipping announcement",
                        channel_id, start
                    );
                    report.zero_length_announcements += 1;
                } else {
                    warn!(
                        "Channel '{}': announcement start {} passes event start {}, dropped",
                        channel_id, announcement_start, start
                    );
                    report.overlapping_announcements += 1;
                }

                doc.programmes.push(ProgrammeBlock {
                    channel_id: channel_id.clone(),
                    start,
                    stop,
                    kind: BlockKind::Event,
                    title: description.clone(),
                    description: title.clone(),
                    category: category.name.clone(),
                });

                last_end.insert(channel_id, stop);
                report.admitted_events += 1;
            }
        }
    }

    doc
}

#[cfg(test)]
#[path = "synth_tests.rs"]
mod tests;
