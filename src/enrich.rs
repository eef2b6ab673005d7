//! Optional AI enrichment of assembled chapters.
//!
//! Every failure is contained per chapter: it is logged and the
//! mechanically parsed content stays in place.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::formats::{ChapterRecord, CourseJson};

/// What the enricher sees of one chapter.
#[derive(Debug, Clone)]
pub struct ChapterInput<'a> {
    pub module_title: &'a str,
    pub chapter_title: &'a str,
    /// Overview paragraphs joined by blank lines.
    pub body: String,
}

/// Replacement content; absent or empty fields leave the chapter as is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Enrichment {
    pub description: Option<String>,
    pub overview: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub prompt_text: Option<Vec<String>>,
    pub key_learnings: Option<Vec<String>>,
}

#[async_trait]
pub trait ChapterEnricher: Send + Sync {
    async fn enrich(&self, chapter: &ChapterInput<'_>) -> anyhow::Result<Enrichment>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub enriched: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub async fn enrich_course(
    course: &mut CourseJson,
    enricher: &dyn ChapterEnricher,
    delay: Duration,
) -> EnrichStats {
    let mut stats = EnrichStats::default();
    let mut calls = 0usize;

    for module in &mut course.modules {
        for chapter in &mut module.chapters {
            let overview = &chapter.content_data.languages.en.overview;
            if overview.iter().all(|p| p.trim().is_empty()) {
                tracing::debug!(chapter = %chapter.slug, "no overview; skipping enrichment");
                stats.skipped += 1;
                continue;
            }

            if calls > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            calls += 1;

            let outcome = {
                let input = ChapterInput {
                    module_title: &module.title,
                    chapter_title: &chapter.title,
                    body: overview.join("\n\n"),
                };
                enricher.enrich(&input).await
            };
            match outcome {
                Ok(enrichment) => {
                    apply_enrichment(chapter, enrichment, &timestamp_now());
                    stats.enriched += 1;
                    tracing::info!(chapter = %chapter.slug, "enriched");
                }
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(
                        chapter = %chapter.slug,
                        error = %format!("{err:#}"),
                        "enrichment failed; keeping parsed content"
                    );
                }
            }
        }
    }

    stats
}

pub fn apply_enrichment(chapter: &mut ChapterRecord, enrichment: Enrichment, updated_at: &str) {
    let en = &mut chapter.content_data.languages.en;
    for (slot, value) in [
        (&mut en.overview, enrichment.overview),
        (&mut en.instructions, enrichment.instructions),
        (&mut en.prompt_text, enrichment.prompt_text),
        (&mut en.key_learnings, enrichment.key_learnings),
    ] {
        if let Some(lines) = value.filter(|lines| !lines.is_empty()) {
            *slot = lines;
        }
    }
    if let Some(description) = enrichment.description.filter(|d| !d.trim().is_empty()) {
        chapter.description = description;
    }

    let metadata = &mut chapter.content_data.metadata;
    metadata.ai_generated = true;
    metadata.last_ai_update = Some(updated_at.to_owned());
}

fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::formats::{ContentData, ModuleRecord};

    struct FakeEnricher {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl FakeEnricher {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl ChapterEnricher for FakeEnricher {
        async fn enrich(&self, chapter: &ChapterInput<'_>) -> anyhow::Result<Enrichment> {
            self.seen
                .lock()
                .expect("lock")
                .push(format!("{}/{}", chapter.module_title, chapter.chapter_title));
            if self.fail_on == Some(chapter.chapter_title) {
                anyhow::bail!("service unavailable");
            }
            Ok(Enrichment {
                description: Some(format!("About {}", chapter.chapter_title)),
                overview: Some(vec![chapter.body.to_uppercase()]),
                instructions: Some(Vec::new()),
                prompt_text: None,
                key_learnings: Some(vec!["Takeaway".to_owned()]),
            })
        }
    }

    fn chapter(title: &str, overview: &[&str], instructions: &[&str]) -> ChapterRecord {
        let mut data = ContentData::default();
        data.languages.en.overview = overview.iter().map(|s| s.to_string()).collect();
        data.languages.en.instructions = instructions.iter().map(|s| s.to_string()).collect();
        ChapterRecord::new(
            title.to_owned(),
            format!("{}-m1-c", title.to_lowercase()),
            "parsed".to_owned(),
            1,
            data,
        )
    }

    fn course(chapters: Vec<ChapterRecord>) -> CourseJson {
        let mut module = ModuleRecord::new("Basics".to_owned(), "basics".to_owned(), 1, 1);
        module.chapters = chapters;
        CourseJson {
            course_title: "C".to_owned(),
            course_slug: "c".to_owned(),
            course_description: String::new(),
            modules: vec![module],
        }
    }

    #[tokio::test]
    async fn successful_enrichment_replaces_only_non_empty_fields() {
        let mut course = course(vec![chapter("A", &["one", "two"], &["keep me"])]);
        let enricher = FakeEnricher::new(None);

        let stats = enrich_course(&mut course, &enricher, Duration::ZERO).await;
        assert_eq!(stats.enriched, 1);

        let ch = &course.modules[0].chapters[0];
        assert_eq!(ch.description, "About A");
        assert_eq!(ch.content_data.languages.en.overview, vec!["ONE\n\nTWO"]);
        assert_eq!(ch.content_data.languages.en.instructions, vec!["keep me"]);
        assert!(ch.content_data.languages.en.prompt_text.is_empty());
        assert_eq!(ch.content_data.languages.en.key_learnings, vec!["Takeaway"]);
        assert!(ch.content_data.metadata.ai_generated);
        assert!(ch.content_data.metadata.last_ai_update.is_some());
    }

    #[tokio::test]
    async fn failures_and_empty_overviews_leave_parsed_content() {
        let mut course = course(vec![
            chapter("Broken", &["text"], &[]),
            chapter("Empty", &[], &["steps only"]),
            chapter("Fine", &["text"], &[]),
        ]);
        let enricher = FakeEnricher::new(Some("Broken"));

        let stats = enrich_course(&mut course, &enricher, Duration::from_millis(1)).await;
        assert_eq!(
            stats,
            EnrichStats {
                enriched: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(
            *enricher.seen.lock().expect("lock"),
            vec!["Basics/Broken", "Basics/Fine"]
        );

        let chapters = &course.modules[0].chapters;
        assert_eq!(chapters[0].description, "parsed");
        assert_eq!(chapters[0].content_data.languages.en.overview, vec!["text"]);
        assert!(!chapters[0].content_data.metadata.ai_generated);
        assert!(!chapters[1].content_data.metadata.ai_generated);
        assert!(chapters[2].content_data.metadata.ai_generated);
    }

    #[test]
    fn blank_description_is_ignored() {
        let mut ch = chapter("A", &["x"], &[]);
        apply_enrichment(
            &mut ch,
            Enrichment {
                description: Some("   ".to_owned()),
                ..Enrichment::default()
            },
            "2024-01-01T00:00:00",
        );
        assert_eq!(ch.description, "parsed");
        assert_eq!(
            ch.content_data.metadata.last_ai_update.as_deref(),
            Some("2024-01-01T00:00:00")
        );
    }
}
