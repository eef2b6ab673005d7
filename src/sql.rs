//! Stage 3: course JSON to idempotent PostgreSQL.
//!
//! Every module becomes one PL/pgSQL `DO` block that inserts the module and
//! its chapters only when no row with the same `(slug, parent id)` exists,
//! so the script can be re-applied to a populated database.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::artifacts;
use crate::cli::GenerateSqlArgs;
use crate::error::PipelineError;
use crate::formats::{ChapterRecord, CourseJson, ModuleRecord};
use crate::registry::{self, CourseRegistry};
use crate::workspace::{self, Workspace};

pub const FULL_SQL_FILE: &str = "full.sql";

const RULE: &str = "-- =============================================================";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScript {
    /// Header, `BEGIN;`, every module block, `COMMIT;`.
    pub full: String,
    /// One standalone block per module, in course order.
    pub modules: Vec<String>,
}

pub fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_opt_str(value: &str) -> String {
    if value.is_empty() {
        "NULL".to_owned()
    } else {
        quote_str(value)
    }
}

fn sql_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn sql_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "NULL".to_owned(), |v| v.to_string())
}

fn jsonb_literal<T: serde::Serialize>(value: &T) -> anyhow::Result<String> {
    let json = serde_json::to_string(value).context("serialize content_data")?;
    Ok(format!("{}::jsonb", quote_str(&json)))
}

/// Picks a dollar-quote tag that does not occur in `body`.
pub fn dollar_tag(body: &str) -> String {
    let mut tag = "$cf$".to_owned();
    let mut n = 1;
    while body.contains(&tag) {
        tag = format!("$cf{n}$");
        n += 1;
    }
    tag
}

pub fn validate_course(course: &CourseJson) -> Result<(), PipelineError> {
    if course.modules.is_empty() {
        return Err(PipelineError::EmptyCourseJson);
    }
    for (idx, module) in course.modules.iter().enumerate() {
        if module.title.trim().is_empty() || module.slug.trim().is_empty() {
            return Err(PipelineError::InvalidCourseJson(format!(
                "module #{} is missing a title or slug",
                idx + 1
            )));
        }
        if let Some(chapter) = module
            .chapters
            .iter()
            .find(|c| c.title.trim().is_empty() || c.slug.trim().is_empty())
        {
            return Err(PipelineError::InvalidCourseJson(format!(
                "module '{}' has a chapter without title or slug ({:?})",
                module.slug, chapter.slug
            )));
        }
    }
    Ok(())
}

fn chapter_statement(chapter: &ChapterRecord) -> anyhow::Result<Vec<String>> {
    Ok(vec![
        String::new(),
        format!("  -- Chapter: {}", single_line(&chapter.title)),
        "  IF NOT EXISTS (".to_owned(),
        format!(
            "    SELECT 1 FROM course_chapter WHERE slug = {} AND module_id = _module_id",
            quote_str(&chapter.slug)
        ),
        "  ) THEN".to_owned(),
        "    INSERT INTO course_chapter".to_owned(),
        "      (module_id, title, slug, description, chapter_type, order_index,".to_owned(),
        "       is_published, is_free, is_preview, estimated_duration_minutes,".to_owned(),
        "       content_data, requires_activity, min_activities_required, created_at, updated_at)"
            .to_owned(),
        "    VALUES (".to_owned(),
        "      _module_id,".to_owned(),
        format!("      {},", quote_str(&chapter.title)),
        format!("      {},", quote_str(&chapter.slug)),
        format!("      {},", quote_opt_str(&chapter.description)),
        format!("      {},", quote_str(&chapter.chapter_type)),
        format!("      {},", chapter.order_index),
        format!("      {},", sql_bool(chapter.is_published)),
        format!("      {},", sql_bool(chapter.is_free)),
        format!("      {},", sql_bool(chapter.is_preview)),
        format!("      {},", sql_opt(chapter.estimated_duration_minutes)),
        format!("      {},", jsonb_literal(&chapter.content_data)?),
        format!("      {},", sql_bool(chapter.requires_activity)),
        format!("      {},", chapter.min_activities_required),
        "      NOW(), NOW()".to_owned(),
        "    );".to_owned(),
        "  END IF;".to_owned(),
    ])
}

pub fn module_block(module: &ModuleRecord, course_slug: &str) -> anyhow::Result<String> {
    let mut body = vec![
        "DECLARE".to_owned(),
        "  _course_id INT;".to_owned(),
        "  _module_id INT;".to_owned(),
        "BEGIN".to_owned(),
        format!(
            "  SELECT id INTO _course_id FROM course WHERE slug = {};",
            quote_str(course_slug)
        ),
        "  IF _course_id IS NULL THEN".to_owned(),
        format!(
            "    RAISE EXCEPTION 'course % does not exist', {};",
            quote_str(course_slug)
        ),
        "  END IF;".to_owned(),
        String::new(),
        "  SELECT id INTO _module_id FROM course_module".to_owned(),
        format!(
            "    WHERE slug = {} AND course_id = _course_id;",
            quote_str(&module.slug)
        ),
        String::new(),
        "  IF _module_id IS NULL THEN".to_owned(),
        "    INSERT INTO course_module".to_owned(),
        "      (course_id, title, slug, description, order_index,".to_owned(),
        "       is_published, is_preview, estimated_duration_hours, created_at, updated_at)"
            .to_owned(),
        "    VALUES (".to_owned(),
        "      _course_id,".to_owned(),
        format!("      {},", quote_str(&module.title)),
        format!("      {},", quote_str(&module.slug)),
        format!("      {},", quote_str(&module.description)),
        format!("      {},", module.order_index),
        format!("      {},", sql_bool(module.is_published)),
        format!("      {},", sql_bool(module.is_preview)),
        format!("      {},", sql_opt(module.estimated_duration_hours)),
        "      NOW(), NOW()".to_owned(),
        "    ) RETURNING id INTO _module_id;".to_owned(),
        "  END IF;".to_owned(),
    ];
    for chapter in &module.chapters {
        body.extend(chapter_statement(chapter)?);
    }
    body.push(String::new());
    let body = body.join("\n");

    let tag = dollar_tag(&body);
    Ok(format!(
        "-- Module {}: {} ({} chapter(s))\nDO {tag}\n{body}\nEND {tag};",
        module.order_index,
        single_line(&module.title),
        module.chapters.len()
    ))
}

/// Comments end at a newline; keep titles on one line.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn emit_course_sql(
    course: &CourseJson,
    course_slug: &str,
    generated_at: &str,
) -> anyhow::Result<SqlScript> {
    validate_course(course)?;

    let modules = course
        .modules
        .iter()
        .map(|module| module_block(module, course_slug))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let chapters = course.modules.iter().map(|m| m.chapters.len()).sum::<usize>();

    let header = [
        RULE.to_owned(),
        "-- Course Content Import -- Idempotent (IF NOT EXISTS)".to_owned(),
        format!("-- Course:      {}", single_line(&course.course_title)),
        format!("-- Course slug: {course_slug}"),
        format!("-- Modules:     {}", course.modules.len()),
        format!("-- Chapters:    {chapters}"),
        format!("-- Generated:   {generated_at}"),
        RULE.to_owned(),
        String::new(),
        "BEGIN;".to_owned(),
        String::new(),
    ]
    .join("\n");

    let full = format!("{header}\n{}\n\nCOMMIT;\n", modules.join("\n\n"));
    Ok(SqlScript { full, modules })
}

fn load_course_json(path: &Path, course_slug: &str) -> anyhow::Result<CourseJson> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::MissingCourseJson(course_slug.to_owned()).into());
        }
        Err(err) => return Err(err).with_context(|| format!("read: {}", path.display())),
    };
    serde_json::from_str(&raw).map_err(|err| PipelineError::InvalidCourseJson(err.to_string()).into())
}

fn remove_stale_sql_files(dir: &Path) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("read sql dir: {}", dir.display()))? {
        let path = entry?.path();
        let is_module_sql = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with("module_") && name.ends_with(".sql"));
        if is_module_sql {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove stale sql file: {}", path.display()))?;
        }
    }
    Ok(())
}

pub fn run(
    args: &GenerateSqlArgs,
    registry: &dyn CourseRegistry,
    workspace: &Workspace,
) -> anyhow::Result<PathBuf> {
    let course = registry::require_course(registry, &args.course)?;
    let json = load_course_json(&workspace.json_path(&course.slug), &course.slug)?;

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let script = emit_course_sql(&json, &course.slug, &generated_at)?;

    let out_dir = workspace.sql_dir(&course.slug);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create sql dir: {}", out_dir.display()))?;
    remove_stale_sql_files(&out_dir)?;

    let full_path = out_dir.join(FULL_SQL_FILE);
    artifacts::write_atomic(&full_path, script.full.as_bytes())
        .with_context(|| format!("write sql: {}", full_path.display()))?;

    for (module, block) in json.modules.iter().zip(&script.modules) {
        let path = out_dir.join(workspace::module_file_name(module.order_index, &module.slug, "sql"));
        artifacts::write_atomic(&path, format!("{block}\n").as_bytes())
            .with_context(|| format!("write sql: {}", path.display()))?;
    }

    let chapters = json.modules.iter().map(|m| m.chapters.len()).sum::<usize>();
    tracing::info!(
        course = %course.slug,
        modules = json.modules.len(),
        chapters,
        out = %full_path.display(),
        "stage 3 complete"
    );
    Ok(full_path)
}
