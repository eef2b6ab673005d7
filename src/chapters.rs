//! Stage 2 parsing: chapter segmentation inside one module block.

use crate::heading::{self, Heading};
use crate::sections::{self, Section, Sections};
use crate::slug::{self, SlugDeduper};

pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Sections consulted, in order, for a chapter description.
const DESCRIPTION_SOURCES: [Section; 3] =
    [Section::Overview, Section::Instructions, Section::PromptText];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChapter {
    pub number: u32,
    pub title: String,
    /// Globally unique: `{module-scoped slug}-m{module}-{course}`.
    pub slug: String,
    pub description: String,
    pub sections: Sections,
}

pub fn parse_chapters(body: &str, module_number: u32, course_slug: &str) -> Vec<ParsedChapter> {
    let lines = body.lines().collect::<Vec<_>>();
    let starts = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| match heading::classify(line) {
            Heading::Chapter { number, title } => Some((idx, number, title)),
            _ => None,
        })
        .collect::<Vec<_>>();

    let mut deduper = SlugDeduper::new();
    starts
        .iter()
        .enumerate()
        .map(|(i, (start, number, title))| {
            let end = starts.get(i + 1).map_or(lines.len(), |next| next.0);
            let sections = sections::classify_lines(lines[start + 1..end].iter().copied());
            let scoped = deduper.slugify_or(title, &format!("chapter-{number}"));
            ParsedChapter {
                number: *number,
                title: title.clone(),
                slug: slug::chapter_slug(&scoped, module_number, course_slug),
                description: chapter_description(&sections),
                sections,
            }
        })
        .collect()
}

pub fn chapter_description(sections: &Sections) -> String {
    DESCRIPTION_SOURCES
        .iter()
        .find_map(|section| sections.get(*section).first())
        .map(|line| truncate_description(line, DESCRIPTION_MAX_CHARS))
        .unwrap_or_default()
}

/// First meaningful line of the text that precedes the first chapter
/// heading, skipping blanks and `###` markers.
pub fn module_description(body: &str) -> String {
    body.lines()
        .take_while(|line| !heading::classify(line).is_chapter())
        .filter(|line| !heading::classify(line).is_section())
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_description(line, DESCRIPTION_MAX_CHARS))
        .unwrap_or_default()
}

/// Shortens `text` to at most `max_chars` characters, cutting at the last
/// word boundary that leaves room for a trailing `...`.
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let budget = max_chars.saturating_sub(ELLIPSIS.len());
    let cut = text
        .char_indices()
        .nth(budget)
        .map_or(text.len(), |(byte, _)| byte);
    let head = &text[..cut];

    // Prefer the last space; a single unbroken word is cut mid-word.
    let head = if text[cut..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(space) if space > 0 => &head[..space],
            _ => head,
        }
    };
    format!("{}{ELLIPSIS}", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_example_chapter() {
        let body = "Chapter 1: Getting Started\n### Overview\nWelcome to the course.\n### Instructions\nDo the first exercise.";
        let chapters = parse_chapters(body, 1, "demo");

        assert_eq!(chapters.len(), 1);
        let ch = &chapters[0];
        assert_eq!(ch.title, "Getting Started");
        assert_eq!(ch.slug, "getting-started-m1-demo");
        assert_eq!(ch.sections.overview, vec!["Welcome to the course."]);
        assert_eq!(ch.sections.instructions, vec!["Do the first exercise."]);
        assert_eq!(ch.description, "Welcome to the course.");
    }

    #[test]
    fn module_without_chapters_yields_none() {
        assert!(parse_chapters("Just a standalone page.\n### Overview\nMore.", 2, "c").is_empty());
        assert!(parse_chapters("", 2, "c").is_empty());
    }

    #[test]
    fn text_before_first_chapter_is_not_chapter_content() {
        let body = "Module intro line.\nChapter 1: A\na body\nChapter 2: B\nb body";
        let chapters = parse_chapters(body, 1, "c");
        assert_eq!(chapters[0].sections.overview, vec!["a body"]);
        assert_eq!(chapters[1].sections.overview, vec!["b body"]);
        assert_eq!(module_description(body), "Module intro line.");
    }

    #[test]
    fn duplicate_chapter_titles_dedupe_within_module() {
        let body = "Chapter 1: Practice\nx\nChapter 2: Practice\ny\nChapter 3: Practice";
        let slugs = parse_chapters(body, 4, "ai")
            .into_iter()
            .map(|c| c.slug)
            .collect::<Vec<_>>();
        assert_eq!(
            slugs,
            vec!["practice-m4-ai", "practice-2-m4-ai", "practice-3-m4-ai"]
        );
    }

    #[test]
    fn chapter_slugs_stay_unique_when_a_title_matches_a_suffix() {
        let body = "Chapter 1: Practice\nx\nChapter 2: Practice\ny\nChapter 3: Practice 2";
        let slugs = parse_chapters(body, 1, "c")
            .into_iter()
            .map(|c| c.slug)
            .collect::<Vec<_>>();
        assert_eq!(
            slugs,
            vec!["practice-m1-c", "practice-2-m1-c", "practice-2-2-m1-c"]
        );
    }

    #[test]
    fn chapter_without_ascii_title_uses_its_number() {
        let chapters = parse_chapters("Chapter 4: \u{2728}\u{2728}\nbody", 2, "c");
        assert_eq!(chapters[0].slug, "chapter-4-m2-c");
        assert!(slug::is_valid_slug(&chapters[0].slug));
    }

    #[test]
    fn description_falls_back_through_sections() {
        let body = "Chapter 1: A\n### Key Learnings\nIgnored.\n### Sample Prompt\nTry this prompt.";
        let chapters = parse_chapters(body, 1, "c");
        assert_eq!(chapters[0].description, "Try this prompt.");

        let chapters = parse_chapters("Chapter 1: A\n### Activity\nOnly activity.", 1, "c");
        assert_eq!(chapters[0].description, "");
    }

    #[test]
    fn long_description_is_cut_at_a_word_boundary() {
        let words = std::iter::repeat("abcdefgh").take(28).collect::<Vec<_>>().join(" ");
        let line = format!("{words} tail");
        assert_eq!(line.chars().count(), 256);

        let desc = truncate_description(&line, 200);
        assert!(desc.chars().count() <= 200, "len {}", desc.chars().count());
        assert!(desc.ends_with("..."));
        let stem = desc.trim_end_matches("...");
        assert!(line.starts_with(stem));
        assert_eq!(line.as_bytes()[stem.len()], b' ', "cut must land on a space");
    }

    #[test]
    fn whole_word_ending_at_the_budget_is_kept() {
        let line = format!("{} tail end", "a".repeat(197));
        assert_eq!(truncate_description(&line, 200), format!("{}...", "a".repeat(197)));

        let line = format!("{} {} more words", "b".repeat(100), "c".repeat(96));
        let desc = truncate_description(&line, 200);
        assert_eq!(desc, format!("{} {}...", "b".repeat(100), "c".repeat(96)));
    }

    #[test]
    fn short_description_is_untouched_and_unbroken_words_are_cut() {
        assert_eq!(truncate_description("short", 200), "short");
        let blob = "x".repeat(250);
        let desc = truncate_description(&blob, 200);
        assert_eq!(desc.chars().count(), 200);
        assert!(desc.ends_with("..."));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let line = "é".repeat(300);
        let desc = truncate_description(&line, 200);
        assert_eq!(desc.chars().count(), 200);
    }

    #[test]
    fn module_description_skips_markers_and_blanks() {
        assert_eq!(module_description("\n### Overview\n\n  First real line  \nsecond"), "First real line");
        assert_eq!(module_description("Chapter 1: A\nbody"), "");
    }
}
