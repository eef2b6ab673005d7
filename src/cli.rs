use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Course registry file.
    #[arg(long, global = true, default_value = "courses.json")]
    pub registry: String,

    /// Artifact root (`1_modules/`, `2_json/`, `3_sql/`).
    #[arg(long, global = true, default_value = "output")]
    pub workspace: String,

    /// Raise log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Course {
        #[command(subcommand)]
        command: CourseCommand,
    },
    /// Stage 1: split a .txt/.docx outline into per-module files.
    Split(SplitArgs),
    /// Stage 2: module files to structured course JSON.
    Convert(ConvertArgs),
    /// Stage 3: course JSON to idempotent PostgreSQL.
    GenerateSql(GenerateSqlArgs),
    /// Run split, convert and generate-sql in sequence.
    Run(RunArgs),
}

#[derive(Debug, Subcommand)]
pub enum CourseCommand {
    /// Register a new course.
    Add(CourseAddArgs),
    /// List registered courses.
    List,
    /// Remove a course and delete its artifacts.
    Remove(CourseRemoveArgs),
}

#[derive(Debug, Args)]
pub struct CourseAddArgs {
    /// Display name of the course.
    #[arg(long)]
    pub name: String,

    /// Course slug (default: derived from the name).
    #[arg(long)]
    pub slug: Option<String>,
}

#[derive(Debug, Args)]
pub struct CourseRemoveArgs {
    #[arg(long)]
    pub slug: String,
}

#[derive(Debug, Clone, Args)]
pub struct SplitArgs {
    /// Input outline (.txt or .docx).
    pub file: String,

    /// Registered course slug (default: taken from the document's `Course:` header).
    #[arg(long)]
    pub course: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EnrichArgs {
    /// Enrich chapter sections with OpenAI (requires OPENAI_API_KEY).
    #[arg(long)]
    pub ai: bool,

    /// Delay between enrichment calls.
    #[arg(long, default_value_t = 500)]
    pub ai_delay_ms: u64,
}

#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    #[arg(long)]
    pub course: String,

    #[command(flatten)]
    pub enrich: EnrichArgs,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateSqlArgs {
    #[arg(long)]
    pub course: String,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Input outline (.txt or .docx).
    pub file: String,

    /// Registered course slug (default: taken from the document's `Course:` header).
    #[arg(long)]
    pub course: Option<String>,

    #[command(flatten)]
    pub enrich: EnrichArgs,
}
