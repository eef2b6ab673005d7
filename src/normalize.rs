//! Flattens a styled document into the plain-text heading conventions so
//! the splitting stages never see the source format.

use std::sync::LazyLock;

use regex::Regex;

use crate::heading::{self, Heading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Heading(u8),
    Body,
}

impl ParagraphStyle {
    /// Parses a style name (`Heading 2`) or id (`Heading2`).
    pub fn from_style_name(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        let Some(rest) = lower.strip_prefix("heading") else {
            return Self::Body;
        };
        match rest.trim().parse::<u8>() {
            Ok(level) if level >= 1 => Self::Heading(level),
            _ => Self::Body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub text: String,
}

impl Paragraph {
    pub fn new(style: ParagraphStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }
}

/// Heading 2 titles starting with one of these are section markers, not
/// chapters.
const SECTION_NAME_PREFIXES: &[&str] = &[
    "overview",
    "instructions",
    "sample prompt",
    "sample script",
    "sample voice",
    "key learning",
    "activity",
];

const KEYCAP_TEN: char = '\u{1F51F}';

static KEYCAP_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d)\u{FE0F}?\u{20E3}").expect("keycap pattern is valid"));

static LEADING_DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^a-zA-Z0-9]+").expect("decoration pattern is valid"));

static FINAL_STRUCTURED_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[:\-\u{2013}\u{2014}]+\s*Final Structured Module\s*$")
        .expect("suffix pattern is valid")
});

pub fn normalize_paragraphs(paragraphs: &[Paragraph]) -> Vec<String> {
    let mut lines = Vec::with_capacity(paragraphs.len());
    let mut module_counter = 0u32;
    let mut chapter_counter = 0u32;

    for paragraph in paragraphs {
        let text = paragraph.text.trim();
        if text.is_empty() {
            lines.push(String::new());
            continue;
        }

        match heading::classify(text) {
            Heading::Module { number, .. } => {
                module_counter = number;
                chapter_counter = 0;
                lines.push(text.to_owned());
                continue;
            }
            Heading::Chapter { number, .. } => {
                chapter_counter = number;
                lines.push(text.to_owned());
                continue;
            }
            Heading::Section { .. } | Heading::Plain => {}
        }

        match paragraph.style {
            ParagraphStyle::Heading(1) => {
                let (number, title) = clean_heading(text);
                match number {
                    None => {
                        module_counter = module_counter.saturating_add(1);
                        chapter_counter = 0;
                        lines.push(format!("Module {module_counter}: {title}"));
                    }
                    Some(number) => {
                        chapter_counter = number;
                        lines.push(format!("Chapter {number}: {title}"));
                    }
                }
            }
            ParagraphStyle::Heading(2) => {
                let (number, title) = clean_heading(text);
                if is_section_name(&title) {
                    lines.push(format!("### {title}"));
                } else {
                    chapter_counter = number.unwrap_or(chapter_counter.saturating_add(1));
                    lines.push(format!("Chapter {chapter_counter}: {title}"));
                }
            }
            ParagraphStyle::Heading(3 | 4) => {
                lines.push(format!("### {}", heading::clean_title(text)));
            }
            ParagraphStyle::Heading(_) | ParagraphStyle::Body => {
                lines.extend(text.lines().map(str::to_owned));
            }
        }
    }

    lines
}

fn is_section_name(title: &str) -> bool {
    let lower = title.trim().to_lowercase();
    SECTION_NAME_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Strips emoji and bullet decoration from a heading and collapses its
/// whitespace, returning the number encoded by a leading keycap sequence if
/// there was one.
pub fn clean_heading(text: &str) -> (Option<u32>, String) {
    let mut rest = text.trim();
    let mut number = None;

    if let Some(after) = rest.strip_prefix(KEYCAP_TEN) {
        number = Some(10);
        rest = after;
    } else {
        let mut digits = String::new();
        while let Some(caps) = KEYCAP_DIGIT.captures(rest) {
            digits.push_str(&caps[1]);
            rest = &rest[caps[0].len()..];
        }
        if !digits.is_empty() {
            number = digits.parse().ok();
        }
    }

    let rest = LEADING_DECORATION.replace(rest, "");
    let rest = FINAL_STRUCTURED_SUFFIX.replace(&rest, "");
    let title = rest.trim();
    if title.is_empty() {
        // All decoration; keep the raw text so the heading still has a title.
        return (number, heading::clean_title(text));
    }
    (number, heading::clean_title(title))
}
