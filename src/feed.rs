//! Raw schedule feed model
//!
//! The feed is a JSON document mapping date headings to category maps,
//! each category holding an ordered list of event records. Source order
//! is meaningful all the way down, so deserialization goes through map
//! visitors instead of serde_json's unordered maps.

#![allow(dead_code)]

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use tracing::warn;

use crate::GuideError;

/// One channel reference attached to a feed event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelRef {
    /// Human-readable channel name, the only field the synthesizer trusts
    #[serde(default)]
    pub channel_name: String,
    /// Upstream identifier, passed through untouched
    #[serde(default)]
    pub channel_id: String,
}

/// One live event as present in the feed
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedEvent {
    /// Wall-clock start "HH:MM" in the feed's own timezone
    #[serde(default = "default_time")]
    pub time: String,
    /// Event title
    #[serde(rename = "event", default = "default_title")]
    pub title: String,
    /// Optional long description
    #[serde(default)]
    pub description: Option<String>,
    /// Channels broadcasting the event
    #[serde(default)]
    pub channels: Vec<ChannelRef>,
}

fn default_time() -> String {
    "00:00".to_string()
}

fn default_title() -> String {
    "Evento Sconosciuto".to_string()
}

/// A category and its ordered events
#[derive(Debug, Clone, Default)]
pub struct FeedCategory {
    pub name: String,
    pub events: Vec<FeedEvent>,
    /// Count of event records that were not objects of the expected shape
    pub malformed: usize,
}

/// A date heading and its ordered categories
#[derive(Debug, Clone, Default)]
pub struct FeedDay {
    pub date_key: String,
    pub categories: Vec<FeedCategory>,
}

/// The whole feed, in source order
#[derive(Debug, Clone, Default)]
pub struct RawFeed {
    pub days: Vec<FeedDay>,
}

impl RawFeed {
    /// Parse a feed from JSON text
    pub fn from_json(text: &str) -> Result<Self, GuideError> {
        let feed = serde_json::from_str(text)?;
        Ok(feed)
    }

    /// Load a feed from a JSON file
    pub fn load(path: &Path) -> Result<Self, GuideError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Total number of well-formed events across all dates
    pub fn event_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.categories.iter())
            .map(|c| c.events.len())
            .sum()
    }
}

impl<'de> Deserialize<'de> for RawFeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FeedVisitor;

        impl<'de> Visitor<'de> for FeedVisitor {
            type Value = RawFeed;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of date headings to category maps")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut days = Vec::new();
                while let Some((date_key, body)) = map.next_entry::<String, DayBody>()? {
                    days.push(FeedDay {
                        date_key,
                        categories: body.0,
                    });
                }
                Ok(RawFeed { days })
            }
        }

        deserializer.deserialize_map(FeedVisitor)
    }
}

struct DayBody(Vec<FeedCategory>);

impl<'de> Deserialize<'de> for DayBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DayVisitor;

        impl<'de> Visitor<'de> for DayVisitor {
            type Value = DayBody;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category names to event lists")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut categories = Vec::new();
                while let Some((name, list)) = map.next_entry::<String, EventList>()? {
                    categories.push(FeedCategory {
                        name,
                        events: list.events,
                        malformed: list.malformed,
                    });
                }
                Ok(DayBody(categories))
            }
        }

        deserializer.deserialize_map(DayVisitor)
    }
}

struct EventList {
    events: Vec<FeedEvent>,
    malformed: usize,
}

impl<'de> Deserialize<'de> for EventList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EventsVisitor;

        impl<'de> Visitor<'de> for EventsVisitor {
            type Value = EventList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of event records")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut events = Vec::new();
                let mut malformed = 0;
                while let Some(value) = seq.next_element::<serde_json::Value>()? {
                    match serde_json::from_value::<FeedEvent>(value) {
                        Ok(event) => events.push(event),
                        Err(e) => {
                            warn!("Skipping malformed event record: {}", e);
                            malformed += 1;
                        }
                    }
                }
                Ok(EventList { events, malformed })
            }
        }

        deserializer.deserialize_seq(EventsVisitor)
    }
}
