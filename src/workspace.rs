use std::path::PathBuf;

use anyhow::Context as _;

pub const COURSE_META_FILE: &str = "_course.yaml";

/// Artifact layout under the workspace root:
/// `1_modules/<slug>/`, `2_json/<slug>.json`, `3_sql/<slug>/`.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn modules_dir(&self, course_slug: &str) -> PathBuf {
        self.root.join("1_modules").join(course_slug)
    }

    pub fn course_meta_path(&self, course_slug: &str) -> PathBuf {
        self.modules_dir(course_slug).join(COURSE_META_FILE)
    }

    pub fn json_path(&self, course_slug: &str) -> PathBuf {
        self.root.join("2_json").join(format!("{course_slug}.json"))
    }

    pub fn sql_dir(&self, course_slug: &str) -> PathBuf {
        self.root.join("3_sql").join(course_slug)
    }

    /// Deletes every artifact of a course, returning the paths removed.
    pub fn remove_course_artifacts(&self, course_slug: &str) -> anyhow::Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        for dir in [self.modules_dir(course_slug), self.sql_dir(course_slug)] {
            if dir.exists() {
                std::fs::remove_dir_all(&dir)
                    .with_context(|| format!("remove dir: {}", dir.display()))?;
                removed.push(dir);
            }
        }

        let json = self.json_path(course_slug);
        if json.exists() {
            std::fs::remove_file(&json)
                .with_context(|| format!("remove file: {}", json.display()))?;
            removed.push(json);
        }

        Ok(removed)
    }
}

pub fn module_file_name(order_index: u32, module_slug: &str, ext: &str) -> String {
    format!("module_{order_index:02}_{module_slug}.{ext}")
}
