//! External guide fragment parsing
//!
//! Fragments arrive as already-built XMLTV documents from other guide
//! sources. They are parsed into a wire-level model that keeps the
//! original timestamp strings and language tags untouched, so the merger
//! can append their nodes verbatim.

use std::io::BufRead;

use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

/// Element text plus its optional `lang` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangText {
    pub text: String,
    pub lang: Option<String>,
}

impl LangText {
    pub fn new(text: impl Into<String>, lang: Option<&str>) -> Self {
        Self {
            text: text.into(),
            lang: lang.map(|l| l.to_string()),
        }
    }
}

/// A `<channel>` node as found on the wire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WireChannel {
    pub id: String,
    pub display_names: Vec<LangText>,
}

/// A `<programme>` node as found on the wire, timestamps kept as text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WireProgramme {
    pub start: String,
    pub stop: String,
    pub channel: String,
    pub titles: Vec<LangText>,
    pub descs: Vec<LangText>,
    pub categories: Vec<LangText>,
}

/// One parsed external guide document
#[derive(Debug, Clone, Default)]
pub struct GuideFragment {
    pub channels: Vec<WireChannel>,
    pub programmes: Vec<WireProgramme>,
}

impl GuideFragment {
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.programmes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Root,
    Channel,
    DisplayName,
    Programme,
    Title,
    Desc,
    Category,
}

pub struct FragmentParser;

impl FragmentParser {
    /// Parse a fragment from XMLTV text
    pub fn parse(xml: &str) -> Result<GuideFragment, String> {
        Self::parse_reader(xml.as_bytes())
    }

    /// Parse a fragment from raw bytes, decompressing gzip transparently
    pub fn parse_bytes(bytes: &[u8]) -> Result<GuideFragment, String> {
        // gzip magic number 1f 8b
        if bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b {
            let decoder = GzDecoder::new(bytes);
            let reader = std::io::BufReader::with_capacity(64 * 1024, decoder);
            Self::parse_reader(reader)
        } else {
            Self::parse_reader(bytes)
        }
    }

    /// Parse a fragment from a streaming reader
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<GuideFragment, String> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        let mut fragment = GuideFragment::default();
        let mut buf = Vec::with_capacity(8192);

        let mut state = ParserState::Root;
        let mut current_channel: Option<WireChannel> = None;
        let mut current_programme: Option<WireProgramme> = None;
        let mut text_buf = String::new();
        let mut text_lang: Option<String> = None;
        let mut error_count = 0usize;

        loop {
            let position = xml_reader.buffer_position();
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    match name.as_ref() {
                        b"channel" => {
                            state = ParserState::Channel;
                            current_channel = Some(WireChannel {
                                id: get_attribute(e, b"id").unwrap_or_default(),
                                display_names: Vec::new(),
                            });
                        }
                        b"programme" => {
                            state = ParserState::Programme;
                            current_programme = Some(WireProgramme {
                                start: get_attribute(e, b"start").unwrap_or_default(),
                                stop: get_attribute(e, b"stop").unwrap_or_default(),
                                channel: get_attribute(e, b"channel").unwrap_or_default(),
                                titles: Vec::new(),
                                descs: Vec::new(),
                                categories: Vec::new(),
                            });
                        }
                        b"display-name" if state == ParserState::Channel => {
                            state = ParserState::DisplayName;
                            text_buf.clear();
                            text_lang = get_attribute(e, b"lang");
                        }
                        b"title" if state == ParserState::Programme => {
                            state = ParserState::Title;
                            text_buf.clear();
                            text_lang = get_attribute(e, b"lang");
                        }
                        b"desc" if state == ParserState::Programme => {
                            state = ParserState::Desc;
                            text_buf.clear();
                            text_lang = get_attribute(e, b"lang");
                        }
                        b"category" if state == ParserState::Programme => {
                            state = ParserState::Category;
                            text_buf.clear();
                            text_lang = get_attribute(e, b"lang");
                        }
                        _ => {}
                    }
                }
                Ok(Event::Text(e)) => {
                    let raw = String::from_utf8_lossy(e.as_ref()).to_string();
                    match state {
                        ParserState::DisplayName
                        | ParserState::Title
                        | ParserState::Desc
                        | ParserState::Category => {
                            text_buf.push_str(&decode_entities(&raw));
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = e.name();
                    match name.as_ref() {
                        b"channel" => {
                            if let Some(channel) = current_channel.take() {
                                fragment.channels.push(channel);
                            }
                            state = ParserState::Root;
                        }
                        b"programme" => {
                            if let Some(programme) = current_programme.take() {
                                fragment.programmes.push(programme);
                            }
                            state = ParserState::Root;
                        }
                        b"display-name" => {
                            if let Some(ref mut chan) = current_channel {
                                chan.display_names.push(LangText {
                                    text: text_buf.trim().to_string(),
                                    lang: text_lang.take(),
                                });
                            }
                            state = ParserState::Channel;
                        }
                        b"title" => {
                            if let Some(ref mut prog) = current_programme {
                                prog.titles.push(LangText {
                                    text: text_buf.trim().to_string(),
                                    lang: text_lang.take(),
                                });
                            }
                            state = ParserState::Programme;
                        }
                        b"desc" => {
                            if let Some(ref mut prog) = current_programme {
                                prog.descs.push(LangText {
                                    text: text_buf.trim().to_string(),
                                    lang: text_lang.take(),
                                });
                            }
                            state = ParserState::Programme;
                        }
                        b"category" => {
                            if let Some(ref mut prog) = current_programme {
                                prog.categories.push(LangText {
                                    text: text_buf.trim().to_string(),
                                    lang: text_lang.take(),
                                });
                            }
                            state = ParserState::Programme;
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(quick_xml::Error::Io(e)) => {
                    // An I/O failure will not clear on retry.
                    return Err(format!("read error at byte {}: {}", position, e));
                }
                Err(e) => {
                    error_count += 1;
                    warn!("XML error at byte {}: {}", position, e);
                    current_channel = None;
                    current_programme = None;
                    state = ParserState::Root;
                    text_buf.clear();
                    text_lang = None;
                }
                _ => {}
            }
            buf.clear();
        }

        if error_count > 0 {
            warn!("Fragment parsed with {} recovered XML errors", error_count);
        }

        Ok(fragment)
    }
}

/// Decode the XML entities the wire format uses into plain characters
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match rest[1..].find(';') {
            Some(end) => {
                let entity = &rest[1..end + 1];
                match decode_one_entity(entity) {
                    Some(c) => out.push(c),
                    None => {
                        out.push('&');
                        out.push_str(entity);
                        out.push(';');
                    }
                }
                rest = &rest[end + 2..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_one_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                num.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Read a decoded attribute value off an element
fn get_attribute(e: &quick_xml::events::BytesStart, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name {
            let raw = String::from_utf8(attr.value.as_ref().to_vec()).ok()?;
            return Some(decode_entities(&raw));
        }
    }
    None
}

#[cfg(test)]
#[path = "fragment_tests.rs"]
mod tests;
