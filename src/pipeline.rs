use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::{ConvertArgs, GenerateSqlArgs, RunArgs, SplitArgs};
use crate::registry::CourseRegistry;
use crate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub course_slug: String,
    pub json: PathBuf,
    pub sql: PathBuf,
}

/// Split, convert and emit SQL for one outline. Stops at the first failing
/// stage; artifacts from earlier stages are left in place.
pub async fn run(
    args: &RunArgs,
    registry: &dyn CourseRegistry,
    workspace: &Workspace,
) -> anyhow::Result<PipelineOutput> {
    let enricher = crate::convert::enricher_for(&ConvertArgs {
        course: args.course.clone().unwrap_or_default(),
        enrich: args.enrich.clone(),
    })?;

    tracing::info!(file = %args.file, "run: split");
    let course_slug = crate::split::run(
        &SplitArgs {
            file: args.file.clone(),
            course: args.course.clone(),
        },
        registry,
        workspace,
    )
    .context("split")?;

    tracing::info!(course = %course_slug, "run: convert");
    let json = crate::convert::convert_with(
        &ConvertArgs {
            course: course_slug.clone(),
            enrich: args.enrich.clone(),
        },
        enricher.as_deref(),
        registry,
        workspace,
    )
    .await
    .context("convert")?;

    tracing::info!(course = %course_slug, "run: generate-sql");
    let sql = crate::sql::run(
        &GenerateSqlArgs {
            course: course_slug.clone(),
        },
        registry,
        workspace,
    )
    .context("generate-sql")?;

    Ok(PipelineOutput {
        course_slug,
        json,
        sql,
    })
}
