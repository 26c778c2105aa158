use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::SeedRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("courses.sqlite"));

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_seed_report(&manifest_dir)? {
        Some(path) => {
            let raw = fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: SeedRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                run_id = %manifest.run_id,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                cleared_existing = manifest.cleared_existing,
                courses = manifest.counts.courses_inserted,
                units = manifest.counts.units_inserted,
                chunks = manifest.counts.chunks_inserted,
                resources = manifest.counts.resources_inserted,
                exercises = manifest.counts.exercises_inserted,
                exercises_skipped = manifest.counts.exercises_skipped_unresolved,
                rows_failed = manifest.counts.rows_failed,
                errors = manifest.errors.len(),
                "latest seed run"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no seed run reports found"),
    }

    if db_path.exists() {
        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", db_path.display()))?;

        let schema_version = metadata_value(&conn, "db_schema_version")
            .unwrap_or_else(|| "unknown".to_string());
        let last_run = metadata_value(&conn, "last_seed_run_id").unwrap_or_default();

        info!(
            path = %db_path.display(),
            schema_version = %schema_version,
            last_seed_run = %last_run,
            courses = table_count(&conn, "courses"),
            units = table_count(&conn, "units"),
            chunks = table_count(&conn, "chunks"),
            resources = table_count(&conn, "resources"),
            exercises = table_count(&conn, "exercises"),
            "store status"
        );
    } else {
        warn!(path = %db_path.display(), "store file missing");
    }

    Ok(())
}

/// Seed report filenames embed a compact UTC timestamp, so the newest run
/// sorts last by name.
fn latest_seed_report(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut reports = Vec::new();
    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();

        let is_seed_report = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("seed_run_") && name.ends_with(".json"))
            .unwrap_or(false);

        if is_seed_report {
            reports.push(path);
        }
    }

    reports.sort();
    Ok(reports.pop())
}

fn metadata_value(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .ok()
}

fn table_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap_or(0)
}
