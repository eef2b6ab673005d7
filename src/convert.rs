//! Stage 2: module files to the structured course JSON.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;

use crate::artifacts;
use crate::chapters::{self, ParsedChapter};
use crate::cli::ConvertArgs;
use crate::enrich::{self, ChapterEnricher};
use crate::error::PipelineError;
use crate::formats::{ChapterRecord, ContentData, CourseJson, CourseMeta, ModuleMeta, ModuleRecord};
use crate::heading;
use crate::openai::{OpenAiConfig, OpenAiEnricher};
use crate::registry::{self, CourseRegistry};
use crate::workspace::Workspace;

/// Builds one module record from its Stage 1 metadata and text body.
pub fn assemble_module(meta: &ModuleMeta, body: &str, course_slug: &str) -> ModuleRecord {
    let mut module = ModuleRecord::new(
        meta.title.clone(),
        meta.slug.clone(),
        meta.order_index,
        meta.number,
    );
    module.description = chapters::module_description(body);
    module.chapters = chapters::parse_chapters(body, meta.number, course_slug)
        .into_iter()
        .enumerate()
        .map(|(idx, chapter)| assemble_chapter(chapter, idx + 1, meta.number))
        .collect();
    module
}

fn assemble_chapter(chapter: ParsedChapter, position: usize, module_number: u32) -> ChapterRecord {
    let mut content = ContentData {
        module_number,
        ..ContentData::default()
    };
    let en = &mut content.languages.en;
    en.chapter_title = chapter.title.clone();
    en.overview = chapter.sections.overview;
    en.instructions = chapter.sections.instructions;
    en.prompt_text = chapter.sections.prompt_text;
    en.key_learnings = chapter.sections.key_learnings;
    en.activity_text = chapter.sections.activity_text;

    ChapterRecord::new(
        chapter.title,
        chapter.slug,
        chapter.description,
        u32::try_from(position).unwrap_or(u32::MAX),
        content,
    )
}

/// Module file text without its leading `Module N: Title` line.
fn module_body(text: &str) -> &str {
    let text = text.trim_start_matches('\u{feff}');
    match text.split_once('\n') {
        Some((first, rest)) if heading::classify(first).is_module() => rest,
        None if heading::classify(text).is_module() => "",
        _ => text,
    }
}

pub fn assemble_course(meta: &CourseMeta, workspace: &Workspace) -> anyhow::Result<CourseJson> {
    let dir = workspace.modules_dir(&meta.course_slug);
    let mut modules = Vec::with_capacity(meta.modules.len());

    for module_meta in &meta.modules {
        let path = dir.join(&module_meta.file);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::MissingModules(meta.course_slug.clone()))
                    .with_context(|| format!("module file missing: {}", path.display()));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read module file: {}", path.display()));
            }
        };

        let module = assemble_module(module_meta, module_body(&text), &meta.course_slug);
        tracing::info!(
            module = module.module_number,
            title = %module.title,
            chapters = module.chapters.len(),
            "module parsed"
        );
        if module.chapters.is_empty() {
            tracing::warn!(module = module.module_number, "module has no chapter headings");
        }
        modules.push(module);
    }

    Ok(CourseJson {
        course_title: meta.course_name.clone(),
        course_slug: meta.course_slug.clone(),
        course_description: meta.course_description.clone(),
        modules,
    })
}

/// Credentials are resolved before any file is read so a misconfigured
/// environment fails without side effects.
pub fn enricher_for(args: &ConvertArgs) -> anyhow::Result<Option<Box<dyn ChapterEnricher>>> {
    if !args.enrich.ai {
        return Ok(None);
    }
    let config = OpenAiConfig::from_env()?;
    tracing::info!(model = %config.model, "AI enrichment enabled");
    Ok(Some(Box::new(OpenAiEnricher::new(config)?)))
}

pub async fn run(
    args: &ConvertArgs,
    registry: &dyn CourseRegistry,
    workspace: &Workspace,
) -> anyhow::Result<PathBuf> {
    let enricher = enricher_for(args)?;
    convert_with(args, enricher.as_deref(), registry, workspace).await
}

pub async fn convert_with(
    args: &ConvertArgs,
    enricher: Option<&dyn ChapterEnricher>,
    registry: &dyn CourseRegistry,
    workspace: &Workspace,
) -> anyhow::Result<PathBuf> {
    let course = registry::require_course(registry, &args.course)?;

    let meta_path = workspace.course_meta_path(&course.slug);
    let meta: CourseMeta = artifacts::read_yaml(&meta_path)?
        .ok_or_else(|| PipelineError::MissingModules(course.slug.clone()))?;
    if meta.modules.is_empty() {
        return Err(PipelineError::MissingModules(course.slug.clone()).into());
    }

    let mut json = assemble_course(&meta, workspace)?;

    if let Some(enricher) = enricher {
        let delay = Duration::from_millis(args.enrich.ai_delay_ms);
        let stats = enrich::enrich_course(&mut json, enricher, delay).await;
        tracing::info!(
            enriched = stats.enriched,
            failed = stats.failed,
            skipped = stats.skipped,
            "AI enrichment finished"
        );
    }

    let out = workspace.json_path(&course.slug);
    artifacts::write_json_atomic(&out, &json)
        .with_context(|| format!("write course json: {}", out.display()))?;

    let chapters = json.modules.iter().map(|m| m.chapters.len()).sum::<usize>();
    tracing::info!(
        course = %course.slug,
        modules = json.modules.len(),
        chapters,
        out = %out.display(),
        "stage 2 complete"
    );
    Ok(out)
}
