use std::collections::HashMap;
use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use anyhow::Context as _;
use quick_xml::events::{BytesStart, Event};

use crate::error::PipelineError;
use crate::normalize::{self, Paragraph, ParagraphStyle};

/// Reads a `.txt` or `.docx` course outline into normalized lines.
pub fn read_document(path: &Path) -> anyhow::Result<Vec<String>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "txt" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read text document: {}", path.display()))?;
            Ok(text_lines(&text))
        }
        "docx" => {
            let paragraphs = read_docx_paragraphs(path)
                .with_context(|| format!("read docx document: {}", path.display()))?;
            tracing::debug!(paragraphs = paragraphs.len(), "read docx paragraphs");
            Ok(normalize::normalize_paragraphs(&paragraphs))
        }
        _ => Err(PipelineError::UnsupportedDocument(ext).into()),
    }
}

pub fn text_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines().map(str::to_owned).collect()
}

pub fn read_docx_paragraphs(path: &Path) -> anyhow::Result<Vec<Paragraph>> {
    let file = File::open(path).with_context(|| format!("open: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("open docx zip container")?;

    let styles_xml = match archive.by_name("word/styles.xml") {
        Ok(mut entry) => {
            let mut xml = String::new();
            entry
                .read_to_string(&mut xml)
                .context("read word/styles.xml")?;
            Some(xml)
        }
        Err(zip::result::ZipError::FileNotFound) => None,
        Err(err) => return Err(err).context("open word/styles.xml"),
    };
    let style_names = match styles_xml.as_deref() {
        Some(xml) => parse_style_names(xml).context("parse word/styles.xml")?,
        None => HashMap::new(),
    };

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("docx has no word/document.xml")?
        .read_to_string(&mut document_xml)
        .context("read word/document.xml")?;

    parse_document_paragraphs(&document_xml, &style_names).context("parse word/document.xml")
}

/// Maps `w:styleId` to the human-readable `w:name`, e.g. `Heading1` to
/// `heading 1`.
fn parse_style_names(xml: &str) -> anyhow::Result<HashMap<String, String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"style" => {
                current_id = attr_value(&e, b"styleId")?;
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"name" => {
                if let (Some(id), Some(name)) = (current_id.as_ref(), attr_value(&e, b"val")?) {
                    names.insert(id.clone(), name);
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"style" => current_id = None,
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}

fn parse_document_paragraphs(
    xml: &str,
    style_names: &HashMap<String, String>,
) -> anyhow::Result<Vec<Paragraph>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut style_id: Option<String> = None;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    style_id = None;
                    text.clear();
                }
                b"t" if in_paragraph => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"pStyle" if in_paragraph => style_id = attr_value(&e, b"val")?,
                b"tab" if in_paragraph => text.push('\t'),
                b"br" | b"cr" if in_paragraph => text.push('\n'),
                // An empty self-closing paragraph is still a blank line.
                b"p" => paragraphs.push(Paragraph::new(ParagraphStyle::Body, "")),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                text.push_str(&e.unescape()?);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if in_paragraph => {
                    in_paragraph = false;
                    let style = style_id
                        .as_deref()
                        .map(|id| {
                            let name = style_names.get(id).map(String::as_str).unwrap_or(id);
                            ParagraphStyle::from_style_name(name)
                        })
                        .unwrap_or(ParagraphStyle::Body);
                    paragraphs.push(Paragraph::new(style, std::mem::take(&mut text)));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn attr_value(e: &BytesStart<'_>, local_name: &[u8]) -> anyhow::Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.context("read xml attribute")?;
        if attr.key.local_name().as_ref() == local_name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
