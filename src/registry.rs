//! Course registry: the list of courses the pipeline may onboard.
//!
//! Mutations are whole-file read-modify-write with no locking; callers
//! serialize them (onboarding is operator-driven).

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::artifacts;
use crate::error::PipelineError;
use crate::formats::CourseEntry;
use crate::slug;

pub trait CourseRegistry {
    fn list(&self) -> anyhow::Result<Vec<CourseEntry>>;

    fn lookup(&self, slug: &str) -> anyhow::Result<Option<CourseEntry>> {
        Ok(self.list()?.into_iter().find(|c| c.slug == slug))
    }

    /// Fails with [`PipelineError::DuplicateCourse`] if the slug is taken.
    fn insert(&self, entry: CourseEntry) -> anyhow::Result<()>;

    /// Fails with [`PipelineError::UnknownCourse`] if the slug is absent.
    fn delete(&self, slug: &str) -> anyhow::Result<CourseEntry>;
}

/// Looks up a course, turning "not found" into a user-facing error.
pub fn require_course(registry: &dyn CourseRegistry, slug: &str) -> anyhow::Result<CourseEntry> {
    registry
        .lookup(slug)?
        .ok_or_else(|| PipelineError::UnknownCourse(slug.to_owned()).into())
}

#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<Vec<CourseEntry>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read registry: {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("parse registry: {}", self.path.display()))
    }

    fn save(&self, courses: &[CourseEntry]) -> anyhow::Result<()> {
        artifacts::write_json_atomic(&self.path, &courses)
            .with_context(|| format!("write registry: {}", self.path.display()))
    }
}

impl CourseRegistry for JsonFileRegistry {
    fn list(&self) -> anyhow::Result<Vec<CourseEntry>> {
        self.load()
    }

    fn insert(&self, entry: CourseEntry) -> anyhow::Result<()> {
        let mut courses = self.load()?;
        insert_entry(&mut courses, entry)?;
        self.save(&courses)
    }

    fn delete(&self, slug: &str) -> anyhow::Result<CourseEntry> {
        let mut courses = self.load()?;
        let removed = remove_entry(&mut courses, slug)?;
        self.save(&courses)?;
        Ok(removed)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    courses: RefCell<Vec<CourseEntry>>,
}

impl InMemoryRegistry {
    pub fn new(courses: Vec<CourseEntry>) -> Self {
        Self {
            courses: RefCell::new(courses),
        }
    }
}

impl CourseRegistry for InMemoryRegistry {
    fn list(&self) -> anyhow::Result<Vec<CourseEntry>> {
        Ok(self.courses.borrow().clone())
    }

    fn insert(&self, entry: CourseEntry) -> anyhow::Result<()> {
        insert_entry(&mut self.courses.borrow_mut(), entry)
    }

    fn delete(&self, slug: &str) -> anyhow::Result<CourseEntry> {
        remove_entry(&mut self.courses.borrow_mut(), slug)
    }
}

fn insert_entry(courses: &mut Vec<CourseEntry>, entry: CourseEntry) -> anyhow::Result<()> {
    if courses.iter().any(|c| c.slug == entry.slug) {
        return Err(PipelineError::DuplicateCourse(entry.slug).into());
    }
    courses.push(entry);
    Ok(())
}

fn remove_entry(courses: &mut Vec<CourseEntry>, slug: &str) -> anyhow::Result<CourseEntry> {
    let idx = courses
        .iter()
        .position(|c| c.slug == slug)
        .ok_or_else(|| PipelineError::UnknownCourse(slug.to_owned()))?;
    Ok(courses.remove(idx))
}

/// Registers a course; the slug defaults to the slugified name.
pub fn add_course(
    registry: &dyn CourseRegistry,
    name: &str,
    explicit_slug: Option<&str>,
) -> anyhow::Result<CourseEntry> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PipelineError::EmptyCourseName.into());
    }
    let course_slug = explicit_slug.map_or_else(|| slug::slugify(name), |s| s.trim().to_owned());
    if !slug::is_valid_slug(&course_slug) {
        return Err(PipelineError::InvalidCourseSlug(course_slug).into());
    }

    let entry = new_entry(name, &course_slug);
    registry.insert(entry.clone())?;
    Ok(entry)
}

pub fn new_entry(name: &str, slug: &str) -> CourseEntry {
    CourseEntry {
        name: name.to_owned(),
        slug: slug.to_owned(),
        created_at: Some(
            chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
        ),
    }
}
