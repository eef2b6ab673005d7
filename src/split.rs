//! Stage 1: find module boundaries and carve the outline into module blocks.

use std::path::PathBuf;

use anyhow::Context as _;

use crate::artifacts;
use crate::cli::SplitArgs;
use crate::document;
use crate::error::PipelineError;
use crate::formats::{CourseEntry, CourseMeta, ModuleMeta};
use crate::heading::{self, Heading};
use crate::registry::{self, CourseRegistry};
use crate::slug::{self, SlugDeduper};
use crate::workspace::{self, Workspace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCourse {
    /// Trimmed text preceding the first module heading.
    pub description: String,
    pub modules: Vec<ModuleBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBlock {
    pub number: u32,
    pub title: String,
    pub slug: String,
    /// Lines between this heading and the next one, joined and trimmed.
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseHeader {
    pub title: Option<String>,
    pub slug: Option<String>,
}

/// Reads the optional `Course:` / `Slug:` header and returns it together
/// with the number of leading lines it occupies.
pub fn parse_course_header(lines: &[String]) -> (CourseHeader, usize) {
    let mut header = CourseHeader::default();
    let mut consumed = 0;

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            break;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "course" if header.title.is_none() && !value.is_empty() => {
                header.title = Some(heading::clean_title(value));
            }
            "slug" if header.slug.is_none() && !value.is_empty() => {
                header.slug = Some(value.to_owned());
            }
            _ => break,
        }
        consumed = idx + 1;
    }

    (header, consumed)
}

pub fn split_modules(lines: &[String]) -> Result<SplitCourse, PipelineError> {
    if lines.iter().all(|l| l.trim().is_empty()) {
        return Err(PipelineError::EmptyDocument);
    }

    let starts = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| match heading::classify(line) {
            Heading::Module { number, title } => Some((idx, number, title)),
            _ => None,
        })
        .collect::<Vec<_>>();

    let Some(&(first_start, _, _)) = starts.first() else {
        return Err(PipelineError::NoModuleHeadings);
    };

    let description = lines[..first_start].join("\n").trim().to_owned();

    let mut deduper = SlugDeduper::new();
    let modules = starts
        .iter()
        .enumerate()
        .map(|(i, (start, number, title))| {
            let end = starts.get(i + 1).map_or(lines.len(), |next| next.0);
            ModuleBlock {
                number: *number,
                title: title.clone(),
                slug: deduper.slugify_or(title, &format!("module-{number}")),
                content: lines[start + 1..end].join("\n").trim().to_owned(),
            }
        })
        .collect();

    Ok(SplitCourse {
        description,
        modules,
    })
}

/// Picks the course for this run: an explicit slug must be registered; a
/// header-declared course is registered on first sight.
fn resolve_course(
    registry: &dyn CourseRegistry,
    explicit_slug: Option<&str>,
    header: &CourseHeader,
) -> anyhow::Result<CourseEntry> {
    if let Some(slug) = explicit_slug {
        return registry::require_course(registry, slug);
    }

    let title = header
        .title
        .as_deref()
        .ok_or(PipelineError::MissingCourseHeader)?;
    let slug = header
        .slug
        .clone()
        .unwrap_or_else(|| slug::slugify(title));
    if !slug::is_valid_slug(&slug) {
        return Err(PipelineError::InvalidCourseSlug(slug).into());
    }

    if let Some(existing) = registry.lookup(&slug)? {
        return Ok(existing);
    }

    let entry = registry::new_entry(title, &slug);
    registry.insert(entry.clone())?;
    tracing::info!(course = %slug, name = %title, "registered course from document header");
    Ok(entry)
}

/// Runs Stage 1 and returns the resolved course slug.
pub fn run(
    args: &SplitArgs,
    registry: &dyn CourseRegistry,
    workspace: &Workspace,
) -> anyhow::Result<String> {
    let input = PathBuf::from(&args.file);
    let lines = document::read_document(&input)?;

    let (header, header_len) = parse_course_header(&lines);
    let split = split_modules(&lines[header_len..])?;
    let course = resolve_course(registry, args.course.as_deref(), &header)?;

    let out_dir = workspace.modules_dir(&course.slug);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create modules dir: {}", out_dir.display()))?;
    remove_stale_module_files(&out_dir)?;

    let mut metas = Vec::with_capacity(split.modules.len());
    for (idx, module) in split.modules.iter().enumerate() {
        let order_index = u32::try_from(idx + 1).context("module count exceeds u32")?;
        let file = workspace::module_file_name(order_index, &module.slug, "txt");
        let path = out_dir.join(&file);
        let body = format!("Module {}: {}\n\n{}", module.number, module.title, module.content);
        artifacts::write_atomic(&path, body.as_bytes())
            .with_context(|| format!("write module file: {}", path.display()))?;

        if module.content.is_empty() {
            tracing::warn!(
                module = module.number,
                title = %module.title,
                "module has no content"
            );
        }
        tracing::info!(module = module.number, title = %module.title, file = %file, "module");

        metas.push(ModuleMeta {
            order_index,
            number: module.number,
            title: module.title.clone(),
            slug: module.slug.clone(),
            file,
        });
    }

    let meta = CourseMeta {
        course_name: course.name.clone(),
        course_slug: course.slug.clone(),
        course_description: split.description,
        modules: metas,
    };
    let meta_path = workspace.course_meta_path(&course.slug);
    artifacts::write_yaml_atomic(&meta_path, &meta)
        .with_context(|| format!("write course meta: {}", meta_path.display()))?;

    tracing::info!(
        course = %course.slug,
        modules = meta.modules.len(),
        out = %out_dir.display(),
        "stage 1 complete"
    );
    Ok(course.slug)
}

fn remove_stale_module_files(dir: &std::path::Path) -> anyhow::Result<()> {
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read modules dir: {}", dir.display()))?
    {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("module_") && name.ends_with(".txt") {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove stale module file: {}", path.display()))?;
        }
    }
    Ok(())
}
