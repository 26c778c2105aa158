use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::model::{NewChunk, NewCourse, NewExercise, NewResource, NewUnit, TableCounts};
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "1.0.0";

/// Tables in parent-to-child dependency order. Deletes walk it in reverse.
const TABLES: [&str; 5] = ["courses", "units", "chunks", "resources", "exercises"];

/// Scoped wrapper over the relational store used by the seeding run. Row ids
/// are assigned by SQLite at insert time and surfaced via the insert methods.
pub struct SeedStore {
    conn: Connection,
}

impl SeedStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory store")?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("failed to enable foreign keys")?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn ensure_schema(&self) -> Result<()> {
        ensure_schema(&self.conn)
    }

    /// Deletes all seeded rows, children before parents. No-op when the
    /// schema has never been created.
    pub fn clear_all(&self) -> Result<()> {
        let existing: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'courses'",
                [],
                |row| row.get(0),
            )
            .context("failed to inspect schema before clearing")?;

        if existing == 0 {
            return Ok(());
        }

        for table in TABLES.iter().rev() {
            self.conn
                .execute(&format!("DELETE FROM {table}"), [])
                .with_context(|| format!("failed to clear table {table}"))?;
        }

        Ok(())
    }

    pub fn insert_course(&self, course: &NewCourse) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO courses(name, slug, description, status) VALUES(?1, ?2, ?3, ?4)",
                params![course.name, course.slug, course.description, course.status],
            )
            .with_context(|| format!("failed to insert course {}", course.name))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_unit(&self, unit: &NewUnit) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO units(course_id, title, \"order\", duration) VALUES(?1, ?2, ?3, ?4)",
                params![unit.course_id, unit.title, unit.order, unit.duration],
            )
            .with_context(|| format!("failed to insert unit {}", unit.title))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_chunk(&self, chunk: &NewChunk) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO chunks(unit_id, title, content, \"order\", time_minutes)
                 VALUES(?1, ?2, ?3, ?4, ?5)",
                params![
                    chunk.unit_id,
                    chunk.title,
                    chunk.content,
                    chunk.order,
                    chunk.time_minutes
                ],
            )
            .with_context(|| format!("failed to insert chunk {}", chunk.title))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_resource(&self, resource: &NewResource) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO resources(
                   chunk_id, title, url, author, year, type,
                   time_minutes, description, \"order\", status
                 ) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    resource.chunk_id,
                    resource.title,
                    resource.url,
                    resource.author,
                    resource.year,
                    resource.resource_type,
                    resource.time_minutes,
                    resource.description,
                    resource.order,
                    resource.status
                ],
            )
            .with_context(|| format!("failed to insert resource {}", resource.title))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_exercise(&self, exercise: &NewExercise) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO exercises(chunk_id, title, content, type, time_minutes, \"order\")
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    exercise.chunk_id,
                    exercise.title,
                    exercise.content,
                    exercise.exercise_type,
                    exercise.time_minutes,
                    exercise.order
                ],
            )
            .with_context(|| format!("failed to insert exercise {}", exercise.title))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn count_all(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            courses: self.count_table("courses")?,
            units: self.count_table("units")?,
            chunks: self.count_table("chunks")?,
            resources: self.count_table("resources")?,
            exercises: self.count_table("exercises")?,
        })
    }

    fn count_table(&self, table: &str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("failed to count rows in {table}"))
    }

    pub fn record_seed_run(&self, run_id: &str) -> Result<()> {
        upsert_metadata(&self.conn, "last_seed_run_id", run_id)?;
        upsert_metadata(&self.conn, "last_seed_completed_at", &now_utc_string())?;
        Ok(())
    }
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    Ok(())
}

fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS courses (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          slug TEXT NOT NULL UNIQUE,
          description TEXT,
          status TEXT NOT NULL DEFAULT 'Active' CHECK(status IN ('Active')),
          created_at TEXT NOT NULL DEFAULT (datetime('now')),
          updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS units (
          id INTEGER PRIMARY KEY,
          course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
          title TEXT NOT NULL,
          \"order\" INTEGER NOT NULL,
          duration INTEGER,
          created_at TEXT NOT NULL DEFAULT (datetime('now')),
          updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS chunks (
          id INTEGER PRIMARY KEY,
          unit_id INTEGER NOT NULL REFERENCES units(id) ON DELETE CASCADE,
          title TEXT NOT NULL,
          content TEXT,
          \"order\" INTEGER NOT NULL,
          time_minutes INTEGER,
          created_at TEXT NOT NULL DEFAULT (datetime('now')),
          updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS resources (
          id INTEGER PRIMARY KEY,
          chunk_id INTEGER NOT NULL REFERENCES chunks(id) ON DELETE CASCADE,
          title TEXT NOT NULL,
          url TEXT NOT NULL,
          author TEXT,
          year INTEGER,
          type TEXT NOT NULL CHECK(type IN ('Article', 'Blog', 'Paper', 'Website')),
          time_minutes INTEGER,
          description TEXT,
          \"order\" INTEGER NOT NULL,
          status TEXT NOT NULL DEFAULT 'Core'
            CHECK(status IN ('Core', 'Maybe', 'Supplementary', 'Optional')),
          created_at TEXT NOT NULL DEFAULT (datetime('now')),
          updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS exercises (
          id INTEGER PRIMARY KEY,
          chunk_id INTEGER NOT NULL REFERENCES chunks(id) ON DELETE CASCADE,
          title TEXT NOT NULL,
          content TEXT NOT NULL,
          type TEXT NOT NULL,
          time_minutes INTEGER,
          \"order\" INTEGER NOT NULL,
          created_at TEXT NOT NULL DEFAULT (datetime('now')),
          updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_units_course ON units(course_id, \"order\");
        CREATE INDEX IF NOT EXISTS idx_chunks_unit ON chunks(unit_id, \"order\");
        CREATE INDEX IF NOT EXISTS idx_resources_chunk ON resources(chunk_id, \"order\");
        CREATE INDEX IF NOT EXISTS idx_exercises_chunk ON exercises(chunk_id, \"order\");
        ",
    )
    .context("failed to bootstrap schema")?;

    upsert_metadata(conn, "db_schema_version", DB_SCHEMA_VERSION)?;
    upsert_metadata(conn, "db_updated_at", &now_utc_string())?;

    Ok(())
}

fn upsert_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )
    .with_context(|| format!("failed to record metadata key {key}"))?;
    Ok(())
}
