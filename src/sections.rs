//! Classification of chapter lines into the fixed content sections.

use crate::heading::{self, Heading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Overview,
    Instructions,
    PromptText,
    KeyLearnings,
    ActivityText,
}

/// `### Name` prefix rules, longest prefix first; first match wins.
/// Anything unmatched lands in [`Section::Overview`].
const SECTION_RULES: &[(&str, Section)] = &[
    ("key learning", Section::KeyLearnings),
    ("instruction", Section::Instructions),
    ("overview", Section::Overview),
    ("activity", Section::ActivityText),
    ("sample", Section::PromptText),
    ("prompt", Section::PromptText),
];

impl Section {
    pub const ALL: [Self; 5] = [
        Self::Overview,
        Self::Instructions,
        Self::PromptText,
        Self::KeyLearnings,
        Self::ActivityText,
    ];

    pub fn from_heading(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        SECTION_RULES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map_or(Self::Overview, |(_, section)| *section)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub overview: Vec<String>,
    pub instructions: Vec<String>,
    pub prompt_text: Vec<String>,
    pub key_learnings: Vec<String>,
    pub activity_text: Vec<String>,
}

impl Sections {
    pub fn get(&self, section: Section) -> &[String] {
        match section {
            Section::Overview => &self.overview,
            Section::Instructions => &self.instructions,
            Section::PromptText => &self.prompt_text,
            Section::KeyLearnings => &self.key_learnings,
            Section::ActivityText => &self.activity_text,
        }
    }

    fn get_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Overview => &mut self.overview,
            Section::Instructions => &mut self.instructions,
            Section::PromptText => &mut self.prompt_text,
            Section::KeyLearnings => &mut self.key_learnings,
            Section::ActivityText => &mut self.activity_text,
        }
    }

    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| self.get(*s).is_empty())
    }
}

/// Routes each non-blank line to the section selected by the latest
/// `### Name` marker (initially overview). Lines are trimmed; blank lines
/// are dropped.
pub fn classify_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Sections {
    let mut sections = Sections::default();
    let mut current = Section::Overview;

    for line in lines {
        if let Heading::Section { title } = heading::classify(line) {
            current = Section::from_heading(&title);
            continue;
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            sections.get_mut(current).push(trimmed.to_owned());
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_names_map_by_prefix() {
        assert_eq!(Section::from_heading("Overview of the topic"), Section::Overview);
        assert_eq!(Section::from_heading("INSTRUCTIONS"), Section::Instructions);
        assert_eq!(Section::from_heading("Instruction steps"), Section::Instructions);
        assert_eq!(Section::from_heading("Sample Script"), Section::PromptText);
        assert_eq!(Section::from_heading("Prompt to try"), Section::PromptText);
        assert_eq!(Section::from_heading("Key Learnings"), Section::KeyLearnings);
        assert_eq!(Section::from_heading("Activity: build a bot"), Section::ActivityText);
    }

    #[test]
    fn unknown_heading_falls_back_to_overview() {
        assert_eq!(Section::from_heading("Fun facts"), Section::Overview);
        assert_eq!(Section::from_heading("Key points"), Section::Overview);
    }

    #[test]
    fn unmarked_chapter_is_all_overview() {
        let sections = classify_lines(["First.", "", "  Second.  ", "Third."]);
        assert_eq!(sections.overview, vec!["First.", "Second.", "Third."]);
        assert!(sections.instructions.is_empty());
    }

    #[test]
    fn instructions_only_chapter_leaves_overview_empty() {
        let sections = classify_lines(["### Instructions", "Do this.", "", "Then that."]);
        assert!(sections.overview.is_empty());
        assert_eq!(sections.instructions, vec!["Do this.", "Then that."]);
    }

    #[test]
    fn markers_switch_sections_and_order_is_preserved() {
        let sections = classify_lines([
            "Lead-in.",
            "### Sample Prompt",
            "Write a poem.",
            "### Mystery",
            "Back to overview.",
            "### Key Learnings",
            "Prompts matter.",
            "### Activity",
            "Try it.",
            "### Overview",
            "Closing.",
        ]);
        assert_eq!(
            sections.overview,
            vec!["Lead-in.", "Back to overview.", "Closing."]
        );
        assert_eq!(sections.prompt_text, vec!["Write a poem."]);
        assert_eq!(sections.key_learnings, vec!["Prompts matter."]);
        assert_eq!(sections.activity_text, vec!["Try it."]);
        assert!(!sections.is_empty());
        assert!(Sections::default().is_empty());
    }
}
