//! Channel identity derived from event titles
//!
//! Guide lanes are keyed by the event title, not by the broadcasting
//! channel's own name: every feed entry for "Roma vs Lazio" lands on the
//! lane `romavslazio` no matter which channel carries it. Two unrelated
//! events sharing a title string therefore collapse onto one lane; the
//! downstream guide consumers group broadcasts through exactly this
//! collision, so the title-based key must not be changed to a
//! channel-name-based one.

use super::clean_text;

/// Fallback id when normalization leaves nothing
pub const UNKNOWN_CHANNEL: &str = "unknownchannel";

/// Derive the stable guide id for an event title
pub fn resolve_channel_id(title: &str) -> String {
    let cleaned = clean_text(title);
    let mut id = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        if c.is_ascii_alphanumeric() || ('\u{00C0}'..='\u{00FF}').contains(&c) {
            for lower in c.to_lowercase() {
                id.push(lower);
            }
        }
    }
    if id.is_empty() {
        UNKNOWN_CHANNEL.to_string()
    } else {
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_basic() {
        assert_eq!(resolve_channel_id("Team A vs Team B"), "teamavsteamb");
        assert_eq!(
            resolve_channel_id("Serie A: Roma - Lazio (1st leg)"),
            "seriearomalazio1stleg"
        );
    }

    #[test]
    fn test_resolve_strips_markup() {
        assert_eq!(resolve_channel_id("<span>Roma</span> vs Lazio"), "romavslazio");
    }

    #[test]
    fn test_resolve_keeps_accented_latin() {
        assert_eq!(resolve_channel_id("Città del Calcio"), "cittàdelcalcio");
        assert_eq!(resolve_channel_id("Fútbol Hoy"), "fútbolhoy");
    }

    #[test]
    fn test_resolve_empty_falls_back() {
        assert_eq!(resolve_channel_id(""), UNKNOWN_CHANNEL);
        assert_eq!(resolve_channel_id("!!! ---"), UNKNOWN_CHANNEL);
        assert_eq!(resolve_channel_id("<span></span>"), UNKNOWN_CHANNEL);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let a = resolve_channel_id("Grand Final 2025");
        let b = resolve_channel_id("Grand Final 2025");
        assert_eq!(a, b);
        assert_eq!(a, "grandfinal2025");
    }
}
