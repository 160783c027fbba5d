//! Fragment merging
//!
//! Joins external guide fragments with the locally synthesized document
//! into one wire-level tree. Fragment nodes come first, in the order the
//! fragments were supplied, then local content. Fragment channel ids get
//! a weaker normalization than locally resolved ids (whitespace removed,
//! lowercased, everything else untouched) so the two populations join on
//! a best-effort basis. Programmes are never deduplicated: two sources
//! describing the same broadcast stay as two entries.

use super::fragment::{GuideFragment, LangText, WireChannel, WireProgramme};
use super::synth::GuideDocument;
use super::format_xmltv_timestamp;

/// Language tag applied to locally synthesized programme children
pub const LOCAL_LANG: &str = "it";

/// The final wire-level tree handed to the serializer
#[derive(Debug, Clone, Default)]
pub struct MergedGuide {
    pub channels: Vec<WireChannel>,
    pub programmes: Vec<WireProgramme>,
}

/// Remove whitespace and lowercase a fragment's channel id attribute
pub fn normalize_wire_id(id: &str) -> String {
    id.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Combine external fragments and the local document
pub fn merge(local: &GuideDocument, fragments: &[GuideFragment], offset_hours: i64) -> MergedGuide {
    let mut merged = MergedGuide::default();

    for fragment in fragments {
        for channel in &fragment.channels {
            let mut channel = channel.clone();
            channel.id = normalize_wire_id(&channel.id);
            merged.channels.push(channel);
        }
        for programme in &fragment.programmes {
            let mut programme = programme.clone();
            programme.channel = normalize_wire_id(&programme.channel);
            merged.programmes.push(programme);
        }
    }

    for declaration in &local.channels {
        merged.channels.push(WireChannel {
            id: declaration.id.clone(),
            display_names: vec![LangText::new(declaration.display_name.clone(), None)],
        });
    }

    for block in &local.programmes {
        merged.programmes.push(WireProgramme {
            start: format_xmltv_timestamp(block.start, offset_hours),
            stop: format_xmltv_timestamp(block.stop, offset_hours),
            channel: block.channel_id.clone(),
            titles: vec![LangText::new(block.title.clone(), Some(LOCAL_LANG))],
            descs: vec![LangText::new(block.description.clone(), Some(LOCAL_LANG))],
            categories: vec![LangText::new(block.category.clone(), Some(LOCAL_LANG))],
        });
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epg::synth::{BlockKind, ChannelDeclaration, ProgrammeBlock};
    use chrono::NaiveDate;

    fn local_doc() -> GuideDocument {
        let start = NaiveDate::from_ymd_opt(2025, 11, 15)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        let stop = NaiveDate::from_ymd_opt(2025, 11, 15)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        GuideDocument {
            channels: vec![ChannelDeclaration {
                id: "romavslazio".to_string(),
                display_name: "Roma vs Lazio".to_string(),
            }],
            programmes: vec![ProgrammeBlock {
                channel_id: "romavslazio".to_string(),
                start,
                stop,
                kind: BlockKind::Event,
                title: "Trasmesso in diretta.".to_string(),
                description: "Roma vs Lazio".to_string(),
                category: "Football".to_string(),
            }],
        }
    }

    fn fragment() -> GuideFragment {
        GuideFragment {
            channels: vec![WireChannel {
                id: "Sky Sport 1".to_string(),
                display_names: vec![LangText::new("Sky Sport Uno", Some("it"))],
            }],
            programmes: vec![WireProgramme {
                start: "20251115180000 +0100".to_string(),
                stop: "20251115200000 +0100".to_string(),
                channel: "Sky Sport 1".to_string(),
                titles: vec![LangText::new("Pre-partita", Some("it"))],
                descs: Vec::new(),
                categories: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_normalize_wire_id() {
        assert_eq!(normalize_wire_id("Sky Sport 1"), "skysport1");
        assert_eq!(normalize_wire_id("RAI.Uno HD"), "rai.unohd");
        assert_eq!(normalize_wire_id(""), "");
    }

    #[test]
    fn test_fragments_precede_local_content() {
        let merged = merge(&local_doc(), &[fragment()], 2);

        assert_eq!(merged.channels.len(), 2);
        assert_eq!(merged.channels[0].id, "skysport1");
        assert_eq!(merged.channels[1].id, "romavslazio");

        assert_eq!(merged.programmes.len(), 2);
        assert_eq!(merged.programmes[0].channel, "skysport1");
        assert_eq!(merged.programmes[1].channel, "romavslazio");
    }

    #[test]
    fn test_fragment_timestamps_kept_verbatim() {
        let merged = merge(&local_doc(), &[fragment()], 2);
        assert_eq!(merged.programmes[0].start, "20251115180000 +0100");
        assert_eq!(merged.programmes[0].stop, "20251115200000 +0100");
    }

    #[test]
    fn test_local_blocks_are_rendered_and_tagged() {
        let merged = merge(&local_doc(), &[], 2);

        let chan = &merged.channels[0];
        assert_eq!(chan.display_names[0].lang, None);

        let prog = &merged.programmes[0];
        assert_eq!(prog.start, "20251115200000 +0200");
        assert_eq!(prog.stop, "20251115220000 +0200");
        assert_eq!(prog.titles[0].lang.as_deref(), Some(LOCAL_LANG));
        assert_eq!(prog.descs[0].lang.as_deref(), Some(LOCAL_LANG));
        assert_eq!(prog.categories[0].lang.as_deref(), Some(LOCAL_LANG));
        assert_eq!(prog.titles[0].text, "Trasmesso in diretta.");
        assert_eq!(prog.descs[0].text, "Roma vs Lazio");
    }

    #[test]
    fn test_duplicate_programmes_not_collapsed() {
        let merged = merge(&local_doc(), &[fragment(), fragment()], 2);
        assert_eq!(merged.programmes.len(), 3);
        assert_eq!(merged.programmes[0], merged.programmes[1]);
    }

    #[test]
    fn test_empty_fragments_and_empty_local() {
        let merged = merge(&GuideDocument::default(), &[], 2);
        assert!(merged.channels.is_empty());
        assert!(merged.programmes.is_empty());
    }
}
