//! XMLTV serialization
//!
//! Renders the merged guide to UTF-8 XMLTV text and writes it to disk
//! twice, once plain and once gzip-compressed with ".gz" appended to the
//! output path.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use quick_xml::escape::escape;
use tracing::info;

use super::fragment::LangText;
use super::merge::MergedGuide;
use crate::GuideError;

/// Render the merged guide as an XMLTV document
pub fn render(guide: &MergedGuide) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<tv>\n");

    for channel in &guide.channels {
        out.push_str("  <channel id=\"");
        out.push_str(&escape(channel.id.as_str()));
        out.push_str("\">\n");
        for name in &channel.display_names {
            push_child(&mut out, "display-name", name);
        }
        out.push_str("  </channel>\n");
    }

    for programme in &guide.programmes {
        out.push_str("  <programme start=\"");
        out.push_str(&escape(programme.start.as_str()));
        out.push_str("\" stop=\"");
        out.push_str(&escape(programme.stop.as_str()));
        out.push_str("\" channel=\"");
        out.push_str(&escape(programme.channel.as_str()));
        out.push_str("\">\n");
        for title in &programme.titles {
            push_child(&mut out, "title", title);
        }
        for desc in &programme.descs {
            push_child(&mut out, "desc", desc);
        }
        for category in &programme.categories {
            push_child(&mut out, "category", category);
        }
        out.push_str("  </programme>\n");
    }

    out.push_str("</tv>\n");
    out
}

fn push_child(out: &mut String, tag: &str, value: &LangText) {
    out.push_str("    <");
    out.push_str(tag);
    if let Some(lang) = &value.lang {
        out.push_str(" lang=\"");
        out.push_str(&escape(lang.as_str()));
        out.push('"');
    }
    out.push('>');
    out.push_str(&escape(value.text.as_str()));
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}

/// Path of the compressed copy for a given output path
pub fn gzip_path(output_path: &Path) -> PathBuf {
    let mut path = OsString::from(output_path.as_os_str());
    path.push(".gz");
    PathBuf::from(path)
}

/// Write the guide document and its gzip copy
pub fn write_guide_files(guide: &MergedGuide, output_path: &Path) -> Result<(), GuideError> {
    let xml = render(guide);

    fs::write(output_path, xml.as_bytes())?;

    let gz = gzip_path(output_path);
    let file = fs::File::create(&gz)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(xml.as_bytes())?;
    encoder.finish()?;

    info!(
        "Wrote {} channels / {} programmes to {} (+ gzip copy)",
        guide.channels.len(),
        guide.programmes.len(),
        output_path.display()
    );
    Ok(())
}
