use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::cli::SeedArgs;
use crate::model::{SeedCounts, SeedPaths, SeedRunManifest, SourceFileEntry};
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

use super::csv_read::{RawRow, field, read_table};
use super::resolve::ResolutionMaps;
use super::store::{DB_SCHEMA_VERSION, SeedStore};
use super::transform::{
    transform_chunk, transform_course, transform_exercise, transform_resource, transform_unit,
};

pub fn run(args: SeedArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("seed-{}", utc_compact_string(started_ts));

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("courses.sqlite"));
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("seed_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(
        csv_dir = %args.csv_dir.display(),
        db_path = %db_path.display(),
        run_id = %run_id,
        "starting seed run"
    );

    let tables = load_tables(&args.csv_dir)?;

    let store = SeedStore::open(&db_path)?;
    store.ensure_schema()?;

    if args.no_clear {
        info!("appending to existing data, clear step skipped");
    } else {
        store.clear_all()?;
        info!("cleared existing data");
    }

    let mut stats = SeedStats::default();
    let mut maps = ResolutionMaps::default();

    seed_courses(&store, &tables.courses, &mut maps, &mut stats);
    seed_units(&store, &tables.units, &mut maps, &mut stats);
    seed_chunks(&store, &tables.chunks, &mut maps, &mut stats);
    seed_resources(&store, &tables.resources, &maps, &mut stats);
    seed_exercises(&store, &tables.exercises, &maps, &mut stats);

    let table_counts = store.count_all()?;
    store.record_seed_run(&run_id)?;

    let manifest = SeedRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        cleared_existing: !args.no_clear,
        paths: SeedPaths {
            csv_dir: args.csv_dir.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            db_path: db_path.display().to_string(),
            report_path: report_path.display().to_string(),
        },
        counts: stats.counts.clone(),
        table_counts,
        source_files: tables.files,
        errors: stats.errors.clone(),
        notes: vec![
            "Row-level failures are recorded above and never abort the run.".to_string(),
            "Exercises without a resolvable chunk are skipped and counted separately."
                .to_string(),
        ],
    };

    write_json_pretty(&report_path, &manifest)?;
    info!(path = %report_path.display(), "wrote seed run report");

    info!(
        courses = stats.counts.courses_inserted,
        units = stats.counts.units_inserted,
        chunks = stats.counts.chunks_inserted,
        resources = stats.counts.resources_inserted,
        exercises = stats.counts.exercises_inserted,
        exercises_skipped = stats.counts.exercises_skipped_unresolved,
        "seed run completed"
    );

    if stats.errors.is_empty() {
        info!("no row-level errors");
    } else {
        warn!(count = stats.errors.len(), "row-level errors recorded");
        for message in &stats.errors {
            warn!(error = %message, "row skipped");
        }
    }

    Ok(())
}

struct SourceTables {
    courses: Vec<RawRow>,
    units: Vec<RawRow>,
    chunks: Vec<RawRow>,
    resources: Vec<RawRow>,
    exercises: Vec<RawRow>,
    files: Vec<SourceFileEntry>,
}

fn load_tables(csv_dir: &Path) -> Result<SourceTables> {
    let mut files = Vec::new();

    let courses = load_one(csv_dir, "courses", "Course.csv", &mut files)?;
    let units = load_one(csv_dir, "units", "Unit.csv", &mut files)?;
    let chunks = load_one(csv_dir, "chunks", "Chunk.csv", &mut files)?;
    let exercises = load_one(csv_dir, "exercises", "Exercise.csv", &mut files)?;
    let resources = load_one(csv_dir, "resources", "Chunk-Resource.csv", &mut files)?;

    info!(
        courses = courses.len(),
        units = units.len(),
        chunks = chunks.len(),
        resources = resources.len(),
        exercises = exercises.len(),
        "loaded source tables"
    );

    Ok(SourceTables {
        courses,
        units,
        chunks,
        resources,
        exercises,
        files,
    })
}

fn load_one(
    csv_dir: &Path,
    table: &str,
    filename: &str,
    files: &mut Vec<SourceFileEntry>,
) -> Result<Vec<RawRow>> {
    let path = csv_dir.join(filename);
    let rows =
        read_table(&path).with_context(|| format!("failed to load {table} from {filename}"))?;

    files.push(SourceFileEntry {
        table: table.to_owned(),
        filename: filename.to_owned(),
        rows: rows.len(),
        sha256: sha256_file(&path)?,
    });

    Ok(rows)
}

#[derive(Default)]
pub(super) struct SeedStats {
    pub counts: SeedCounts,
    pub errors: Vec<String>,
}

impl SeedStats {
    fn record_error(&mut self, kind: &str, name: &str, err: &anyhow::Error) {
        let message = format!("failed to seed {kind} '{name}': {err:#}");
        error!(kind = %kind, name = %name, error = %err, "row skipped");
        self.counts.rows_failed += 1;
        self.errors.push(message);
    }
}

pub(super) fn seed_courses(
    store: &SeedStore,
    rows: &[RawRow],
    maps: &mut ResolutionMaps,
    stats: &mut SeedStats,
) {
    info!(rows = rows.len(), "seeding courses");

    for row in rows {
        let record = transform_course(row);
        match store.insert_course(&record) {
            Ok(id) => {
                maps.courses.register(field(row, "Course"), id);
                stats.counts.courses_inserted += 1;
                info!(name = %record.name, id, "inserted course");
            }
            Err(err) => stats.record_error("course", &record.name, &err),
        }
    }
}

pub(super) fn seed_units(
    store: &SeedStore,
    rows: &[RawRow],
    maps: &mut ResolutionMaps,
    stats: &mut SeedStats,
) {
    info!(rows = rows.len(), "seeding units");

    for row in rows {
        let title = field(row, "Topic").trim();
        let course_name = field(row, "Course");

        let Some(course_id) = maps.courses.resolve(course_name) else {
            stats.record_error(
                "unit",
                title,
                &anyhow::anyhow!("course not found: {course_name}"),
            );
            continue;
        };

        let record = transform_unit(row, course_id);
        match store.insert_unit(&record) {
            Ok(id) => {
                // Registered under both the short topic and the combined
                // course-unit label; exports reference either.
                maps.units.register(field(row, "Topic"), id);
                maps.units.register(field(row, "[h] [*] Course-Unit"), id);
                stats.counts.units_inserted += 1;
                info!(title = %record.title, id, "inserted unit");
            }
            Err(err) => stats.record_error("unit", &record.title, &err),
        }
    }
}

pub(super) fn seed_chunks(
    store: &SeedStore,
    rows: &[RawRow],
    maps: &mut ResolutionMaps,
    stats: &mut SeedStats,
) {
    info!(rows = rows.len(), "seeding chunks");

    for row in rows {
        let title = field(row, "Title").trim();
        let unit_name = field(row, "[>] Unit");

        let Some(unit_id) = maps.units.resolve(unit_name) else {
            stats.record_error(
                "chunk",
                title,
                &anyhow::anyhow!("unit not found: {unit_name}"),
            );
            continue;
        };

        let record = transform_chunk(row, unit_id);
        match store.insert_chunk(&record) {
            Ok(id) => {
                maps.chunks.register(field(row, "Title"), id);
                stats.counts.chunks_inserted += 1;
                info!(title = %record.title, id, "inserted chunk");
            }
            Err(err) => stats.record_error("chunk", &record.title, &err),
        }
    }
}

pub(super) fn seed_resources(
    store: &SeedStore,
    rows: &[RawRow],
    maps: &ResolutionMaps,
    stats: &mut SeedStats,
) {
    info!(rows = rows.len(), "seeding resources");

    for row in rows {
        let title = field(row, "[>] Resource name").trim();
        let chunk_name = field(row, "[>] Chunk");

        let Some(chunk_id) = maps.chunks.resolve(chunk_name) else {
            stats.record_error(
                "resource",
                title,
                &anyhow::anyhow!("chunk not found: {chunk_name}"),
            );
            continue;
        };

        let record = transform_resource(row, chunk_id);
        match store.insert_resource(&record) {
            Ok(_) => {
                stats.counts.resources_inserted += 1;
                info!(title = %record.title, "inserted resource");
            }
            Err(err) => stats.record_error("resource", &record.title, &err),
        }
    }
}

pub(super) fn seed_exercises(
    store: &SeedStore,
    rows: &[RawRow],
    maps: &ResolutionMaps,
    stats: &mut SeedStats,
) {
    info!(rows = rows.len(), "seeding exercises");

    for row in rows {
        let title = field(row, "Title").trim();
        let chunk_name = field(row, "[>] Chunk");

        // Unresolved exercises are skipped without an error record; exports
        // routinely carry prompts whose chunk was never published.
        let Some(chunk_id) = maps.chunks.resolve(chunk_name) else {
            info!(title = %title, chunk = %chunk_name, "skipping exercise without resolvable chunk");
            stats.counts.exercises_skipped_unresolved += 1;
            continue;
        };

        let record = transform_exercise(row, chunk_id);
        match store.insert_exercise(&record) {
            Ok(_) => {
                stats.counts.exercises_inserted += 1;
                info!(title = %record.title, "inserted exercise");
            }
            Err(err) => stats.record_error("exercise", &record.title, &err),
        }
    }
}
