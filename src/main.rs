use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use courseforge::cli::{Cli, Command, CourseCommand};
use courseforge::registry::{self, CourseRegistry as _, JsonFileRegistry};
use courseforge::workspace::Workspace;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = courseforge::logging::init(cli.verbose).context("init logging") {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main(cli).await {
        eprintln!("{err:#}");
        return courseforge::error::exit_code_for(&err);
    }

    ExitCode::SUCCESS
}

async fn try_main(cli: Cli) -> anyhow::Result<()> {
    tracing::debug!(?cli, "parsed cli");

    let registry = JsonFileRegistry::new(&cli.registry);
    let workspace = Workspace::new(&cli.workspace);

    match cli.command {
        Command::Course {
            command: CourseCommand::Add(args),
        } => {
            let entry = registry::add_course(&registry, &args.name, args.slug.as_deref())
                .context("course add")?;
            println!("Added course '{}' ({})", entry.name, entry.slug);
        }
        Command::Course {
            command: CourseCommand::List,
        } => {
            let courses = registry.list().context("course list")?;
            if courses.is_empty() {
                println!("No courses registered.");
            }
            for course in courses {
                println!(
                    "{:<32} {:<40} {}",
                    course.slug,
                    course.name,
                    course.created_at.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Course {
            command: CourseCommand::Remove(args),
        } => {
            let removed = registry.delete(&args.slug).context("course remove")?;
            let paths = workspace
                .remove_course_artifacts(&removed.slug)
                .context("course remove")?;
            for path in &paths {
                tracing::info!(path = %path.display(), "removed artifact");
            }
            println!("Removed course '{}' ({})", removed.name, removed.slug);
        }
        Command::Split(args) => {
            courseforge::split::run(&args, &registry, &workspace).context("split")?;
        }
        Command::Convert(args) => {
            courseforge::convert::run(&args, &registry, &workspace)
                .await
                .context("convert")?;
        }
        Command::GenerateSql(args) => {
            courseforge::sql::run(&args, &registry, &workspace).context("generate-sql")?;
        }
        Command::Run(args) => {
            let out = courseforge::pipeline::run(&args, &registry, &workspace)
                .await
                .context("run")?;
            println!("{}", out.sql.display());
        }
    }

    Ok(())
}
