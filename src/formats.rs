use serde::{Deserialize, Serialize};

pub const CONTENT_VERSION: &str = "2.0";
pub const DEFAULT_CHAPTER_TYPE: &str = "lesson";

/// Stage 1 metadata written next to the module files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseMeta {
    pub course_name: String,
    pub course_slug: String,
    #[serde(default)]
    pub course_description: String,
    pub modules: Vec<ModuleMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMeta {
    pub order_index: u32,
    pub number: u32,
    pub title: String,
    pub slug: String,
    pub file: String,
}

/// Stage 2 output: one document per course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseJson {
    pub course_title: String,
    pub course_slug: String,
    #[serde(default)]
    pub course_description: String,
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Declaration position, 1-based.
    #[serde(default = "ModuleRecord::default_order_index")]
    pub order_index: u32,
    /// Number as written in the source heading; may skip or repeat.
    #[serde(default)]
    pub module_number: u32,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default)]
    pub estimated_duration_hours: Option<f64>,
    #[serde(default)]
    pub chapters: Vec<ChapterRecord>,
}

impl ModuleRecord {
    pub fn default_order_index() -> u32 {
        1
    }

    pub fn new(title: String, slug: String, order_index: u32, module_number: u32) -> Self {
        Self {
            title,
            slug,
            description: String::new(),
            order_index,
            module_number,
            is_published: true,
            is_preview: false,
            estimated_duration_hours: None,
            chapters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "ChapterRecord::default_chapter_type")]
    pub chapter_type: String,
    #[serde(default)]
    pub order_index: u32,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    #[serde(default)]
    pub content_data: ContentData,
    #[serde(default = "default_true")]
    pub requires_activity: bool,
    #[serde(default = "ChapterRecord::default_min_activities_required")]
    pub min_activities_required: u32,
}

impl ChapterRecord {
    pub fn default_chapter_type() -> String {
        DEFAULT_CHAPTER_TYPE.to_owned()
    }

    pub fn default_min_activities_required() -> u32 {
        1
    }

    pub fn new(
        title: String,
        slug: String,
        description: String,
        order_index: u32,
        content_data: ContentData,
    ) -> Self {
        Self {
            title,
            slug,
            description,
            chapter_type: Self::default_chapter_type(),
            order_index,
            is_published: true,
            is_free: false,
            is_preview: false,
            estimated_duration_minutes: None,
            content_data,
            requires_activity: true,
            min_activities_required: Self::default_min_activities_required(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentData {
    #[serde(default = "ContentData::default_version")]
    pub version: String,
    #[serde(default)]
    pub module_number: u32,
    #[serde(default)]
    pub ppt_link: Vec<String>,
    #[serde(default)]
    pub pdf_link: String,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    #[serde(default)]
    pub languages: Languages,
    #[serde(default)]
    pub metadata: ContentMetadata,
}

impl ContentData {
    pub fn default_version() -> String {
        CONTENT_VERSION.to_owned()
    }
}

impl Default for ContentData {
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            module_number: 0,
            ppt_link: Vec::new(),
            pdf_link: String::new(),
            gallery_images: Vec::new(),
            languages: Languages::default(),
            metadata: ContentMetadata::default(),
        }
    }
}

/// Only `en` is filled by the pipeline; `hi` and `mr` are placeholders
/// for translations added later in the LMS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Languages {
    #[serde(default)]
    pub en: LanguageContent,
    #[serde(default)]
    pub hi: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub mr: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageContent {
    pub chapter_title: String,
    pub overview: Vec<String>,
    pub video_link: String,
    pub instructions: Vec<String>,
    pub prompt_text: Vec<String>,
    pub prompts: Vec<serde_json::Value>,
    pub activity_text: Vec<String>,
    pub activity_prompts: Vec<serde_json::Value>,
    pub key_learnings: Vec<String>,
    pub features: Vec<serde_json::Value>,
    pub resources: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentMetadata {
    pub ai_generated: bool,
    pub last_ai_update: Option<String>,
    pub content_quality_score: Option<f64>,
}

/// One entry of the course registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEntry {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_true() -> bool {
    true
}
