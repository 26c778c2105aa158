use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::Serialize;
use tracing::info;

use crate::cli::ShowArgs;

#[derive(Debug, Serialize)]
struct CourseSummary {
    id: i64,
    name: String,
    slug: String,
    status: String,
    description: Option<String>,
    unit_count: i64,
}

#[derive(Debug, Serialize)]
struct CourseDetail {
    id: i64,
    name: String,
    slug: String,
    status: String,
    description: Option<String>,
    units: Vec<UnitDetail>,
}

#[derive(Debug, Serialize)]
struct UnitDetail {
    id: i64,
    title: String,
    order: i64,
    duration: Option<i64>,
    chunks: Vec<ChunkDetail>,
}

#[derive(Debug, Serialize)]
struct ChunkDetail {
    id: i64,
    title: String,
    order: i64,
    time_minutes: Option<i64>,
    resources: Vec<ResourceDetail>,
    exercises: Vec<ExerciseDetail>,
}

#[derive(Debug, Serialize)]
struct ResourceDetail {
    id: i64,
    title: String,
    url: String,
    author: Option<String>,
    year: Option<i64>,
    #[serde(rename = "type")]
    resource_type: String,
    status: String,
    time_minutes: Option<i64>,
    order: i64,
}

#[derive(Debug, Serialize)]
struct ExerciseDetail {
    id: i64,
    title: String,
    #[serde(rename = "type")]
    exercise_type: String,
    time_minutes: Option<i64>,
    order: i64,
}

pub fn run(args: ShowArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("courses.sqlite"));

    let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    match &args.course {
        Some(slug) => show_course(&conn, slug, args.json),
        None => list_courses(&conn, args.json),
    }
}

fn list_courses(conn: &Connection, json: bool) -> Result<()> {
    let mut statement = conn.prepare(
        "SELECT c.id, c.name, c.slug, c.status, c.description,
                (SELECT COUNT(*) FROM units u WHERE u.course_id = c.id)
         FROM courses c ORDER BY c.name",
    )?;
    let courses: Vec<CourseSummary> = statement
        .query_map([], |row| {
            Ok(CourseSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
                status: row.get(3)?,
                description: row.get(4)?,
                unit_count: row.get(5)?,
            })
        })?
        .collect::<Result<_, _>>()
        .context("failed to list courses")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&courses)?);
        return Ok(());
    }

    info!(count = courses.len(), "courses");
    for course in &courses {
        info!(
            id = course.id,
            name = %course.name,
            slug = %course.slug,
            status = %course.status,
            units = course.unit_count,
            "course"
        );
    }

    Ok(())
}

fn show_course(conn: &Connection, slug: &str, json: bool) -> Result<()> {
    let course = conn
        .query_row(
            "SELECT id, name, slug, status, description FROM courses WHERE slug = ?1",
            [slug],
            |row| {
                Ok(CourseDetail {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                    status: row.get(3)?,
                    description: row.get(4)?,
                    units: Vec::new(),
                })
            },
        )
        .optional()
        .with_context(|| format!("failed to load course '{slug}'"))?;

    let Some(mut course) = course else {
        bail!("no course with slug '{slug}'");
    };

    course.units = load_units(conn, course.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&course)?);
        return Ok(());
    }

    info!(name = %course.name, slug = %course.slug, units = course.units.len(), "course");
    for unit in &course.units {
        info!(title = %unit.title, order = unit.order, chunks = unit.chunks.len(), "unit");
        for chunk in &unit.chunks {
            info!(
                title = %chunk.title,
                order = chunk.order,
                resources = chunk.resources.len(),
                exercises = chunk.exercises.len(),
                "chunk"
            );
        }
    }

    Ok(())
}

fn load_units(conn: &Connection, course_id: i64) -> Result<Vec<UnitDetail>> {
    let mut statement = conn.prepare(
        "SELECT id, title, \"order\", duration FROM units
         WHERE course_id = ?1 ORDER BY \"order\", id",
    )?;
    let mut units: Vec<UnitDetail> = statement
        .query_map([course_id], |row| {
            Ok(UnitDetail {
                id: row.get(0)?,
                title: row.get(1)?,
                order: row.get(2)?,
                duration: row.get(3)?,
                chunks: Vec::new(),
            })
        })?
        .collect::<Result<_, _>>()
        .context("failed to load units")?;

    for unit in &mut units {
        unit.chunks = load_chunks(conn, unit.id)?;
    }

    Ok(units)
}

fn load_chunks(conn: &Connection, unit_id: i64) -> Result<Vec<ChunkDetail>> {
    let mut statement = conn.prepare(
        "SELECT id, title, \"order\", time_minutes FROM chunks
         WHERE unit_id = ?1 ORDER BY \"order\", id",
    )?;
    let mut chunks: Vec<ChunkDetail> = statement
        .query_map([unit_id], |row| {
            Ok(ChunkDetail {
                id: row.get(0)?,
                title: row.get(1)?,
                order: row.get(2)?,
                time_minutes: row.get(3)?,
                resources: Vec::new(),
                exercises: Vec::new(),
            })
        })?
        .collect::<Result<_, _>>()
        .context("failed to load chunks")?;

    for chunk in &mut chunks {
        chunk.resources = load_resources(conn, chunk.id)?;
        chunk.exercises = load_exercises(conn, chunk.id)?;
    }

    Ok(chunks)
}

fn load_resources(conn: &Connection, chunk_id: i64) -> Result<Vec<ResourceDetail>> {
    let mut statement = conn.prepare(
        "SELECT id, title, url, author, year, type, status, time_minutes, \"order\"
         FROM resources WHERE chunk_id = ?1 ORDER BY \"order\", id",
    )?;
    let resources = statement
        .query_map(params![chunk_id], |row| {
            Ok(ResourceDetail {
                id: row.get(0)?,
                title: row.get(1)?,
                url: row.get(2)?,
                author: row.get(3)?,
                year: row.get(4)?,
                resource_type: row.get(5)?,
                status: row.get(6)?,
                time_minutes: row.get(7)?,
                order: row.get(8)?,
            })
        })?
        .collect::<Result<_, _>>()
        .context("failed to load resources")?;

    Ok(resources)
}

fn load_exercises(conn: &Connection, chunk_id: i64) -> Result<Vec<ExerciseDetail>> {
    let mut statement = conn.prepare(
        "SELECT id, title, type, time_minutes, \"order\"
         FROM exercises WHERE chunk_id = ?1 ORDER BY \"order\", id",
    )?;
    let exercises = statement
        .query_map(params![chunk_id], |row| {
            Ok(ExerciseDetail {
                id: row.get(0)?,
                title: row.get(1)?,
                exercise_type: row.get(2)?,
                time_minutes: row.get(3)?,
                order: row.get(4)?,
            })
        })?
        .collect::<Result<_, _>>()
        .context("failed to load exercises")?;

    Ok(exercises)
}
