use std::process::ExitCode;

/// Failures that halt the pipeline with a user-facing message.
///
/// Enrichment failures never appear here; they are caught per chapter and
/// logged.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("document is empty - nothing to process")]
    EmptyDocument,

    #[error(
        "no module headings found; expected 'Module N: Title' (separators: ':' '-' '\u{2013}' '\u{2014}')"
    )]
    NoModuleHeadings,

    #[error("unsupported document type: {0:?} (expected .txt or .docx)")]
    UnsupportedDocument(String),

    #[error("document has no 'Course: <title>' header; pass --course <slug> instead")]
    MissingCourseHeader,

    #[error("course '{0}' not found in registry; add it with `courseforge course add`")]
    UnknownCourse(String),

    #[error("course with slug '{0}' already exists")]
    DuplicateCourse(String),

    #[error("course name must not be empty")]
    EmptyCourseName,

    #[error("course slug {0:?} is not a valid slug")]
    InvalidCourseSlug(String),

    #[error("no module files for course '{0}'; run `courseforge split` first")]
    MissingModules(String),

    #[error("no course JSON for '{0}'; run `courseforge convert` first")]
    MissingCourseJson(String),

    #[error("course JSON contains no modules - nothing to generate")]
    EmptyCourseJson,

    #[error("invalid course JSON: {0}")]
    InvalidCourseJson(String),

    #[error("{0} is not set; export it before using --ai")]
    MissingCredential(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserInput,
    Environment,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential(_) => ErrorKind::Environment,
            _ => ErrorKind::UserInput,
        }
    }
}

/// Maps an error chain to the process exit code: 2 for bad input, 3 for a
/// misconfigured environment, 1 for everything else (I/O, network, bugs).
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<PipelineError>())
        .map(PipelineError::kind);
    match kind {
        Some(ErrorKind::UserInput) => ExitCode::from(2),
        Some(ErrorKind::Environment) => ExitCode::from(3),
        None => ExitCode::FAILURE,
    }
}
