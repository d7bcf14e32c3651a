//! Section extraction from `.docx` files.
//!
//! A section starts at every `Heading 4` paragraph and collects the text and
//! inline images of the paragraphs that follow it, until the next heading of
//! level 1 to 4. Images are written to disk so the channel adapters can upload
//! them by path.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::constants::EMPTY_HEADING_TEXT;
use crate::error::AppError;

/// One unit of content to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    pub(crate) text: String,
    pub(crate) images: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum HeadingMode {
    /// Sections carry only their own heading and body.
    #[default]
    Heading4,
    /// Sections are prefixed with the Heading 1 they appear under.
    Heading1Prefix,
}

#[derive(Debug, Clone)]
pub(crate) struct ExtractOptions {
    pub(crate) mode: HeadingMode,
    pub(crate) image_dir: PathBuf,
}

/// A top-level body paragraph as far as section extraction cares.
#[derive(Debug, Default)]
struct Paragraph {
    style_id: Option<String>,
    text: String,
    image_rel_ids: Vec<String>,
}

pub(crate) fn extract_sections(
    path: &Path,
    options: &ExtractOptions,
) -> Result<Vec<Section>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Document(format!("cannot open {}: {e}", path.display())))?;
    let mut archive = ZipArchive::new(file)?;

    let document_xml = read_entry(&mut archive, "word/document.xml")?
        .ok_or_else(|| AppError::Document("missing word/document.xml".to_string()))?;
    let style_names = match read_entry(&mut archive, "word/styles.xml")? {
        Some(xml) => parse_style_names(&xml)?,
        None => HashMap::new(),
    };
    let relationships = match read_entry(&mut archive, "word/_rels/document.xml.rels")? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };
    let paragraphs = parse_paragraphs(&document_xml)?;
    debug!(paragraphs = paragraphs.len(), styles = style_names.len(), "Parsed document");

    std::fs::create_dir_all(&options.image_dir)?;

    let mut collector = SectionCollector::new(options.mode);
    let mut image_counter = 0usize;

    for para in paragraphs {
        let style_name = para
            .style_id
            .as_deref()
            .map(|id| style_names.get(id).map(String::as_str).unwrap_or(id));
        match style_name.and_then(heading_level) {
            Some(1) => collector.heading1(&para.text),
            Some(2 | 3) => collector.close(),
            Some(4) => collector.heading4(&para.text),
            _ if collector.is_collecting() => {
                collector.body_text(&para.text);
                for rel_id in &para.image_rel_ids {
                    let Some(target) = relationships.get(rel_id) else {
                        warn!(rel_id = %rel_id, "Image relationship not found, skipping");
                        continue;
                    };
                    let saved = save_image(&mut archive, target, &options.image_dir, image_counter)?;
                    image_counter += 1;
                    collector.image(saved);
                }
            }
            _ => {}
        }
    }

    let sections = collector.finish();
    info!(
        sections = sections.len(),
        images = image_counter,
        path = %path.display(),
        "Extracted document content"
    );
    Ok(sections)
}

/// Section state machine, fed one paragraph at a time.
struct SectionCollector {
    mode: HeadingMode,
    heading1: String,
    current: Option<OpenSection>,
    sections: Vec<Section>,
}

struct OpenSection {
    heading1: String,
    content: String,
    images: Vec<PathBuf>,
}

impl SectionCollector {
    fn new(mode: HeadingMode) -> Self {
        Self {
            mode,
            heading1: String::new(),
            current: None,
            sections: Vec::new(),
        }
    }

    fn is_collecting(&self) -> bool {
        self.current.is_some()
    }

    fn heading1(&mut self, text: &str) {
        self.close();
        self.heading1 = text.trim().to_string();
    }

    fn heading4(&mut self, text: &str) {
        self.close();
        let text = text.trim();
        self.current = Some(OpenSection {
            heading1: self.heading1.clone(),
            content: if text.is_empty() {
                EMPTY_HEADING_TEXT.to_string()
            } else {
                text.to_string()
            },
            images: Vec::new(),
        });
    }

    fn body_text(&mut self, text: &str) {
        let text = text.trim();
        if let (Some(open), false) = (self.current.as_mut(), text.is_empty()) {
            open.content.push('\n');
            open.content.push_str(text);
        }
    }

    fn image(&mut self, path: PathBuf) {
        if let Some(open) = self.current.as_mut() {
            open.images.push(path);
        }
    }

    fn close(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        let content = open.content.trim();
        let text = match self.mode {
            HeadingMode::Heading1Prefix if !open.heading1.is_empty() => {
                format!("{}\n\n{content}", open.heading1)
            }
            _ => content.to_string(),
        };
        self.sections.push(Section {
            text,
            images: open.images,
        });
    }

    fn finish(mut self) -> Vec<Section> {
        self.close();
        self.sections
    }
}

/// Heading level from a style name (`Heading 4`, `heading 4`) or id (`Heading4`).
fn heading_level(style: &str) -> Option<u8> {
    let lower = style.trim().to_ascii_lowercase();
    let rest = lower.strip_prefix("heading")?.trim();
    match rest.parse::<u8>() {
        Ok(level @ 1..=9) => Some(level),
        _ => None,
    }
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<Vec<u8>>, AppError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

fn save_image(
    archive: &mut ZipArchive<File>,
    target: &str,
    image_dir: &Path,
    index: usize,
) -> Result<PathBuf, AppError> {
    let entry_name = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{target}"),
    };
    let bytes = read_entry(archive, &entry_name)?
        .ok_or_else(|| AppError::Document(format!("image {entry_name} missing from archive")))?;
    let ext = Path::new(target)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    let out = image_dir.join(format!("image_{index}.{ext}"));
    std::fs::write(&out, bytes)?;
    debug!(source = %entry_name, dest = %out.display(), "Saved image");
    Ok(out)
}

fn attr(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Style id to display name from `word/styles.xml`.
fn parse_style_names(xml: &[u8]) -> Result<HashMap<String, String>, AppError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"style" => {
                current_id = attr(e, b"styleId");
            }
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"name" => {
                if let (Some(id), Some(name)) = (current_id.as_ref(), attr(e, b"val")) {
                    names.insert(id.clone(), name);
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"style" => current_id = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}

/// Internal relationship id to target from `word/_rels/document.xml.rels`.
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, AppError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut rels = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let external = attr(e, b"TargetMode").is_some_and(|m| m == "External");
                if let (Some(id), Some(target), false) =
                    (attr(e, b"Id"), attr(e, b"Target"), external)
                {
                    rels.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Top-level body paragraphs of `word/document.xml`, in order.
///
/// Table paragraphs are skipped and text nested inside drawings (text boxes)
/// is not part of the outer paragraph's text.
fn parse_paragraphs(xml: &[u8]) -> Result<Vec<Paragraph>, AppError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current: Option<Paragraph> = None;
    let mut p_depth = 0u32;
    let mut tbl_depth = 0u32;
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"tbl" => tbl_depth += 1,
                b"p" => {
                    p_depth += 1;
                    if p_depth == 1 && tbl_depth == 0 {
                        current = Some(Paragraph::default());
                    }
                }
                b"t" if p_depth == 1 => in_text = true,
                b"pStyle" | b"blip" => on_paragraph_prop(&mut current, e, p_depth),
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"tab" if p_depth == 1 => push_text(&mut current, "\t"),
                b"br" | b"cr" if p_depth == 1 => push_text(&mut current, "\n"),
                b"pStyle" | b"blip" => on_paragraph_prop(&mut current, e, p_depth),
                _ => {}
            },
            Event::Text(ref e) if in_text => {
                let text = e.unescape()?;
                push_text(&mut current, &text);
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"tbl" => tbl_depth = tbl_depth.saturating_sub(1),
                b"t" => in_text = false,
                b"p" => {
                    if p_depth == 1 {
                        if let Some(para) = current.take() {
                            paragraphs.push(para);
                        }
                    }
                    p_depth = p_depth.saturating_sub(1);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn on_paragraph_prop(current: &mut Option<Paragraph>, e: &BytesStart, p_depth: u32) {
    let Some(para) = current.as_mut() else {
        return;
    };
    match e.local_name().as_ref() {
        b"pStyle" if p_depth == 1 => para.style_id = attr(e, b"val"),
        b"blip" => {
            if let Some(rel_id) = attr(e, b"embed") {
                para.image_rel_ids.push(rel_id);
            }
        }
        _ => {}
    }
}

fn push_text(current: &mut Option<Paragraph>, text: &str) {
    if let Some(para) = current.as_mut() {
        para.text.push_str(text);
    }
}
