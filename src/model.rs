use serde::{Deserialize, Serialize};

/// Closed enum values for `resources.type`. Anything else is normalized or
/// inferred during transform, never stored.
pub const RESOURCE_TYPES: [&str; 4] = ["Article", "Blog", "Paper", "Website"];

/// Closed enum values for `resources.status`.
pub const RESOURCE_STATUSES: [&str; 4] = ["Core", "Maybe", "Supplementary", "Optional"];

/// The single course status the store currently accepts. Every source value
/// collapses to this; the transform documents it as the default-only policy.
pub const COURSE_STATUS_ACTIVE: &str = "Active";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnit {
    pub course_id: i64,
    pub title: String,
    pub order: i64,
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChunk {
    pub unit_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub order: i64,
    pub time_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub chunk_id: i64,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub year: Option<i64>,
    pub resource_type: String,
    pub time_minutes: Option<i64>,
    pub description: Option<String>,
    pub order: i64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub chunk_id: i64,
    pub title: String,
    pub content: String,
    pub exercise_type: String,
    pub time_minutes: Option<i64>,
    pub order: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub courses: i64,
    pub units: i64,
    pub chunks: i64,
    pub resources: i64,
    pub exercises: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileEntry {
    pub table: String,
    pub filename: String,
    pub rows: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedCounts {
    pub courses_inserted: usize,
    pub units_inserted: usize,
    pub chunks_inserted: usize,
    pub resources_inserted: usize,
    pub exercises_inserted: usize,
    pub exercises_skipped_unresolved: usize,
    pub rows_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPaths {
    pub csv_dir: String,
    pub manifest_dir: String,
    pub db_path: String,
    pub report_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub cleared_existing: bool,
    pub paths: SeedPaths,
    pub counts: SeedCounts,
    pub table_counts: TableCounts,
    pub source_files: Vec<SourceFileEntry>,
    pub errors: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OrphanCounts {
    pub units: usize,
    pub chunks: usize,
    pub resources: usize,
    pub exercises: usize,
}

impl OrphanCounts {
    pub fn total(&self) -> usize {
        self.units + self.chunks + self.resources + self.exercises
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub manifest_version: u32,
    pub generated_at: String,
    pub db_path: String,
    pub status: String,
    pub table_counts: TableCounts,
    pub orphans: OrphanCounts,
    pub findings: Vec<String>,
}
