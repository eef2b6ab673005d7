//! Line classification for the plain-text heading conventions:
//! `Module N: Title`, `Chapter N: Title` and `### Section`.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heading {
    Module { number: u32, title: String },
    Chapter { number: u32, title: String },
    Section { title: String },
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadingKind {
    Module,
    Chapter,
    Section,
}

struct HeadingRule {
    kind: HeadingKind,
    pattern: Regex,
}

// Separator set shared by the numbered rules: ':' '-' en dash, em dash.
const NUMBERED_SEPARATORS: &str = r"[:\-\u{2013}\u{2014}]";

/// Evaluated top-down against the stripped line; first match wins.
static RULES: LazyLock<Vec<HeadingRule>> = LazyLock::new(|| {
    let numbered = |keyword: &str| {
        Regex::new(&format!(
            r"(?i)^{keyword}\s+(\d+)\s*{NUMBERED_SEPARATORS}\s*(.+)$"
        ))
        .expect("numbered heading pattern is valid")
    };
    vec![
        HeadingRule {
            kind: HeadingKind::Module,
            pattern: numbered("module"),
        },
        HeadingRule {
            kind: HeadingKind::Chapter,
            pattern: numbered("chapter"),
        },
        HeadingRule {
            kind: HeadingKind::Section,
            pattern: Regex::new(r"^###\s+(.+)$").expect("section heading pattern is valid"),
        },
    ]
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

pub fn classify(line: &str) -> Heading {
    let line = line.trim();
    for rule in RULES.iter() {
        let Some(caps) = rule.pattern.captures(line) else {
            continue;
        };
        match rule.kind {
            HeadingKind::Section => {
                let title = clean_title(&caps[1]);
                if title.is_empty() {
                    continue;
                }
                return Heading::Section { title };
            }
            HeadingKind::Module | HeadingKind::Chapter => {
                // A number too large for u32 is not a heading we can order by.
                let Ok(number) = caps[1].parse::<u32>() else {
                    continue;
                };
                let title = clean_title(&caps[2]);
                if title.is_empty() {
                    continue;
                }
                return if rule.kind == HeadingKind::Module {
                    Heading::Module { number, title }
                } else {
                    Heading::Chapter { number, title }
                };
            }
        }
    }
    Heading::Plain
}

/// Trims and collapses internal whitespace runs to a single space.
pub fn clean_title(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

impl Heading {
    pub fn is_module(&self) -> bool {
        matches!(self, Self::Module { .. })
    }

    pub fn is_chapter(&self) -> bool {
        matches!(self, Self::Chapter { .. })
    }

    pub fn is_section(&self) -> bool {
        matches!(self, Self::Section { .. })
    }
}
