use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::VerifyArgs;
use crate::model::{OrphanCounts, TableCounts, VerifyReport};
use crate::util::{now_utc_string, write_json_pretty};

struct UnitRow {
    id: i64,
    course_id: i64,
    title: String,
    order: i64,
    duration: Option<i64>,
}

struct ChunkRow {
    id: i64,
    unit_id: i64,
    title: String,
    order: i64,
    time_minutes: Option<i64>,
}

struct ChildRow {
    chunk_id: i64,
    title: String,
    kind: String,
    status: Option<String>,
}

pub fn run(args: VerifyArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("courses.sqlite"));

    let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    info!(path = %db_path.display(), "verifying store integrity");

    let courses: Vec<(i64, String, String, Option<String>)> = {
        let mut statement = conn.prepare(
            "SELECT id, name, slug, description FROM courses ORDER BY id",
        )?;
        let rows = statement.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        rows.collect::<Result<_, _>>()
            .context("failed to load courses")?
    };

    let units: Vec<UnitRow> = {
        let mut statement = conn.prepare(
            "SELECT id, course_id, title, \"order\", duration FROM units ORDER BY id",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(UnitRow {
                id: row.get(0)?,
                course_id: row.get(1)?,
                title: row.get(2)?,
                order: row.get(3)?,
                duration: row.get(4)?,
            })
        })?;
        rows.collect::<Result<_, _>>().context("failed to load units")?
    };

    let chunks: Vec<ChunkRow> = {
        let mut statement = conn.prepare(
            "SELECT id, unit_id, title, \"order\", time_minutes FROM chunks ORDER BY id",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(ChunkRow {
                id: row.get(0)?,
                unit_id: row.get(1)?,
                title: row.get(2)?,
                order: row.get(3)?,
                time_minutes: row.get(4)?,
            })
        })?;
        rows.collect::<Result<_, _>>().context("failed to load chunks")?
    };

    let resources: Vec<ChildRow> = {
        let mut statement =
            conn.prepare("SELECT chunk_id, title, type, status FROM resources ORDER BY id")?;
        let rows = statement.query_map([], |row| {
            Ok(ChildRow {
                chunk_id: row.get(0)?,
                title: row.get(1)?,
                kind: row.get(2)?,
                status: row.get(3)?,
            })
        })?;
        rows.collect::<Result<_, _>>()
            .context("failed to load resources")?
    };

    let exercises: Vec<ChildRow> = {
        let mut statement =
            conn.prepare("SELECT chunk_id, title, type, NULL FROM exercises ORDER BY id")?;
        let rows = statement.query_map([], |row| {
            Ok(ChildRow {
                chunk_id: row.get(0)?,
                title: row.get(1)?,
                kind: row.get(2)?,
                status: row.get(3)?,
            })
        })?;
        rows.collect::<Result<_, _>>()
            .context("failed to load exercises")?
    };

    let table_counts = TableCounts {
        courses: courses.len() as i64,
        units: units.len() as i64,
        chunks: chunks.len() as i64,
        resources: resources.len() as i64,
        exercises: exercises.len() as i64,
    };

    info!(
        courses = table_counts.courses,
        units = table_counts.units,
        chunks = table_counts.chunks,
        resources = table_counts.resources,
        exercises = table_counts.exercises,
        "loaded all tables"
    );

    // Every table must hold at least one row after a seed run.
    let empty_tables: Vec<&str> = [
        ("courses", table_counts.courses),
        ("units", table_counts.units),
        ("chunks", table_counts.chunks),
        ("resources", table_counts.resources),
        ("exercises", table_counts.exercises),
    ]
    .iter()
    .filter(|(_, count)| *count == 0)
    .map(|(name, _)| *name)
    .collect();

    if !empty_tables.is_empty() {
        bail!("empty tables after seeding: {}", empty_tables.join(", "));
    }

    let course_ids: HashSet<i64> = courses.iter().map(|(id, ..)| *id).collect();
    let unit_ids: HashSet<i64> = units.iter().map(|unit| unit.id).collect();
    let chunk_ids: HashSet<i64> = chunks.iter().map(|chunk| chunk.id).collect();

    let mut orphans = OrphanCounts::default();
    let mut findings = Vec::new();

    for unit in &units {
        if !course_ids.contains(&unit.course_id) {
            orphans.units += 1;
            report_orphan(&mut findings, "unit", &unit.title, unit.course_id);
        }
    }
    for chunk in &chunks {
        if !unit_ids.contains(&chunk.unit_id) {
            orphans.chunks += 1;
            report_orphan(&mut findings, "chunk", &chunk.title, chunk.unit_id);
        }
    }
    for resource in &resources {
        if !chunk_ids.contains(&resource.chunk_id) {
            orphans.resources += 1;
            report_orphan(&mut findings, "resource", &resource.title, resource.chunk_id);
        }
    }
    for exercise in &exercises {
        if !chunk_ids.contains(&exercise.chunk_id) {
            orphans.exercises += 1;
            report_orphan(&mut findings, "exercise", &exercise.title, exercise.chunk_id);
        }
    }

    if orphans.total() == 0 {
        info!("all parent references resolve, no orphaned rows");
    } else {
        warn!(
            units = orphans.units,
            chunks = orphans.chunks,
            resources = orphans.resources,
            exercises = orphans.exercises,
            "orphaned rows found"
        );
    }

    sample_drilldown(&courses, &units, &chunks, &resources, &exercises);

    if let Some(report_path) = &args.report_path {
        let report = VerifyReport {
            manifest_version: 1,
            generated_at: now_utc_string(),
            db_path: db_path.display().to_string(),
            status: if orphans.total() == 0 {
                "ok".to_string()
            } else {
                "orphans_found".to_string()
            },
            table_counts,
            orphans,
            findings,
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote verification report");
    }

    info!("verification completed");
    Ok(())
}

fn report_orphan(findings: &mut Vec<String>, kind: &str, title: &str, parent_id: i64) {
    let message = format!("orphaned {kind} '{title}' references missing parent {parent_id}");
    warn!(kind = %kind, title = %title, parent_id, "orphaned row");
    findings.push(message);
}

/// Walks the first course down to its leaf rows so a human can eyeball one
/// complete branch of the hierarchy.
fn sample_drilldown(
    courses: &[(i64, String, String, Option<String>)],
    units: &[UnitRow],
    chunks: &[ChunkRow],
    resources: &[ChildRow],
    exercises: &[ChildRow],
) {
    let Some((course_id, name, slug, description)) = courses.first() else {
        return;
    };

    info!(
        name = %name,
        slug = %slug,
        description = %description.as_deref().unwrap_or("(none)"),
        "sample course"
    );

    let course_units: Vec<&UnitRow> = units
        .iter()
        .filter(|unit| unit.course_id == *course_id)
        .collect();
    info!(count = course_units.len(), "units in sample course");

    let Some(unit) = course_units.first() else {
        return;
    };
    info!(
        title = %unit.title,
        order = unit.order,
        duration = unit.duration.unwrap_or_default(),
        "sample unit"
    );

    let unit_chunks: Vec<&ChunkRow> = chunks
        .iter()
        .filter(|chunk| chunk.unit_id == unit.id)
        .collect();
    info!(count = unit_chunks.len(), "chunks in sample unit");

    let Some(chunk) = unit_chunks.first() else {
        return;
    };
    info!(
        title = %chunk.title,
        order = chunk.order,
        time_minutes = chunk.time_minutes.unwrap_or_default(),
        "sample chunk"
    );

    let chunk_resources: Vec<&ChildRow> = resources
        .iter()
        .filter(|resource| resource.chunk_id == chunk.id)
        .collect();
    let chunk_exercises: Vec<&ChildRow> = exercises
        .iter()
        .filter(|exercise| exercise.chunk_id == chunk.id)
        .collect();
    info!(
        resources = chunk_resources.len(),
        exercises = chunk_exercises.len(),
        "attachments on sample chunk"
    );

    if let Some(resource) = chunk_resources.first() {
        info!(
            title = %resource.title,
            resource_type = %resource.kind,
            status = %resource.status.as_deref().unwrap_or_default(),
            "sample resource"
        );
    }
    if let Some(exercise) = chunk_exercises.first() {
        info!(title = %exercise.title, exercise_type = %exercise.kind, "sample exercise");
    }
}
