//! URL-safe identifiers derived from titles.
//!
//! Slugs are ASCII only: text is NFKD-decomposed so accented letters fold to
//! their base letter, remaining non-ASCII code points are dropped, and the
//! result matches `^[a-z0-9]+(-[a-z0-9]+)*$` or is empty.

use std::collections::{HashMap, HashSet};

use unicode_normalization::UnicodeNormalization as _;

/// Converts a title into a slug. Returns an empty string when the title has
/// no ASCII alphanumerics.
pub fn slugify(text: &str) -> String {
    let folded = text
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;
    for ch in folded.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch.is_ascii_whitespace() || ch == '_' || ch == '-' {
            pending_hyphen = true;
        }
        // Punctuation is removed without acting as a separator.
    }
    slug
}

/// Per-scope deduplication: the first occurrence of a base slug is kept as
/// is, later ones get `-2`, `-3`, ... in order of appearance. A suffixed slug
/// that collides with one already handed out moves on to the next counter.
#[derive(Debug, Default)]
pub struct SlugDeduper {
    counts: HashMap<String, usize>,
    used: HashSet<String>,
}

impl SlugDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dedupe(&mut self, base: String) -> String {
        let count = self.counts.entry(base.clone()).or_insert(0);
        let mut candidate = base.clone();
        loop {
            *count += 1;
            if *count > 1 {
                candidate = format!("{base}-{count}");
            }
            if !self.used.contains(&candidate) {
                break;
            }
        }
        self.used.insert(candidate.clone());
        candidate
    }

    pub fn slugify(&mut self, title: &str) -> String {
        self.dedupe(slugify(title))
    }

    /// Like [`SlugDeduper::slugify`], but a title with no ASCII alphanumerics
    /// uses `fallback` as its base slug.
    pub fn slugify_or(&mut self, title: &str, fallback: &str) -> String {
        let base = slugify(title);
        if base.is_empty() {
            self.dedupe(fallback.to_owned())
        } else {
            self.dedupe(base)
        }
    }
}

/// Chapter slugs must be unique across the whole database, so the
/// module-scoped slug is suffixed with the module number and course slug.
pub fn chapter_slug(deduped: &str, module_number: u32, course_slug: &str) -> String {
    format!("{deduped}-m{module_number}-{course_slug}")
}

fn is_slug_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(is_slug_byte))
}
