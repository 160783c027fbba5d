//! Tests for the external fragment parser

#[cfg(test)]
mod tests {
    use crate::epg::fragment::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tv>
  <channel id="Sky Sport 1">
    <display-name lang="it">Sky Sport Uno</display-name>
    <display-name>Sky Sport 1</display-name>
  </channel>
  <programme start="20251115200000 +0100" stop="20251115220000 +0100" channel="Sky Sport 1">
    <title lang="it">Roma - Lazio</title>
    <desc lang="it">Serie A, giornata 12.</desc>
    <category lang="it">Calcio</category>
  </programme>
</tv>"#;

    #[test]
    fn test_parse_channels_and_programmes() {
        let fragment = FragmentParser::parse(SAMPLE).unwrap();
        assert_eq!(fragment.channels.len(), 1);
        assert_eq!(fragment.programmes.len(), 1);

        let chan = &fragment.channels[0];
        assert_eq!(chan.id, "Sky Sport 1");
        assert_eq!(chan.display_names.len(), 2);
        assert_eq!(chan.display_names[0].text, "Sky Sport Uno");
        assert_eq!(chan.display_names[0].lang.as_deref(), Some("it"));
        assert_eq!(chan.display_names[1].lang, None);

        let prog = &fragment.programmes[0];
        assert_eq!(prog.start, "20251115200000 +0100");
        assert_eq!(prog.stop, "20251115220000 +0100");
        assert_eq!(prog.channel, "Sky Sport 1");
        assert_eq!(prog.titles[0].text, "Roma - Lazio");
        assert_eq!(prog.descs[0].text, "Serie A, giornata 12.");
        assert_eq!(prog.categories[0].text, "Calcio");
    }

    #[test]
    fn test_parse_decodes_entities() {
        let xml = r#"<tv>
          <programme start="1" stop="2" channel="c">
            <title>Practice &amp; Qualifying &#233;</title>
          </programme>
        </tv>"#;
        let fragment = FragmentParser::parse(xml).unwrap();
        assert_eq!(fragment.programmes[0].titles[0].text, "Practice & Qualifying é");
    }

    #[test]
    fn test_parse_bytes_detects_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let fragment = FragmentParser::parse_bytes(&compressed).unwrap();
        assert_eq!(fragment.channels.len(), 1);
        assert_eq!(fragment.programmes.len(), 1);

        let plain = FragmentParser::parse_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(plain.programmes.len(), 1);
    }

    #[test]
    fn test_parse_empty_document() {
        let fragment = FragmentParser::parse("<tv></tv>").unwrap();
        assert!(fragment.is_empty());
    }

    #[test]
    fn test_unknown_elements_ignored() {
        let xml = r#"<tv>
          <channel id="c1">
            <display-name>One</display-name>
            <icon src="http://example.invalid/icon.png"/>
          </channel>
          <programme start="1" stop="2" channel="c1">
            <title>Show</title>
            <episode-num system="onscreen">S1E1</episode-num>
          </programme>
        </tv>"#;
        let fragment = FragmentParser::parse(xml).unwrap();
        assert_eq!(fragment.channels[0].display_names.len(), 1);
        assert_eq!(fragment.programmes[0].titles.len(), 1);
    }

    #[test]
    fn test_decode_entities_passthrough() {
        let xml = r#"<tv>
          <programme start="1" stop="2" channel="c">
            <title>A &unknown; B</title>
          </programme>
        </tv>"#;
        let fragment = FragmentParser::parse(xml).unwrap();
        assert_eq!(fragment.programmes[0].titles[0].text, "A &unknown; B");
    }
}
