use std::fs;
use std::path::PathBuf;

use super::csv_read::{RawRow, field, read_table};
use super::fields::{clean_text, generate_slug, parse_integer, parse_year, split_and_clean};
use super::resolve::{NameMap, ResolutionMaps};
use super::run::{
    SeedStats, seed_chunks, seed_courses, seed_exercises, seed_resources, seed_units,
};
use super::store::SeedStore;
use super::transform::{
    infer_type_from_url, transform_chunk, transform_course, transform_exercise,
    transform_resource, transform_unit,
};

fn row(pairs: &[(&str, &str)]) -> RawRow {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn temp_csv(name: &str, contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("coursedb-{}-{name}", std::process::id()));
    fs::write(&path, contents).expect("temp csv writes");
    path
}

#[test]
fn parse_integer_handles_blank_junk_and_padding() {
    assert_eq!(parse_integer(""), None);
    assert_eq!(parse_integer("   "), None);
    assert_eq!(parse_integer("abc"), None);
    assert_eq!(parse_integer(" 42 "), Some(42));
}

#[test]
fn parse_year_extracts_first_four_digit_run() {
    assert_eq!(parse_year("Published 2023 edition"), Some(2023));
    assert_eq!(parse_year("2024"), Some(2024));
    assert_eq!(parse_year("circa '98"), None);
    assert_eq!(parse_year(""), None);
}

#[test]
fn clean_text_trims_and_drops_blanks() {
    assert_eq!(clean_text("  hello  "), Some("hello".to_string()));
    assert_eq!(clean_text(""), None);
    assert_eq!(clean_text("   "), None);
}

#[test]
fn generate_slug_collapses_non_alphanumerics() {
    assert_eq!(generate_slug("AGI Strategy!!"), "agi-strategy");
    assert_eq!(generate_slug("  Intro -- to AI  "), "intro-to-ai");
    assert_eq!(generate_slug("???"), "");
}

#[test]
fn split_and_clean_drops_empty_parts() {
    assert_eq!(
        split_and_clean(" a, b ,, c "),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
    assert!(split_and_clean("").is_empty());
    assert!(split_and_clean(" , ,").is_empty());
}

#[test]
fn read_table_strips_bom_and_pads_short_rows() {
    let path = temp_csv(
        "bom.csv",
        b"\xef\xbb\xbfCourse,Status,Course slug\nAGI Strategy,Active,agi-strategy\nShort Row,Active\n,,\n",
    );

    let rows = read_table(&path).expect("table parses");
    fs::remove_file(&path).ok();

    assert_eq!(rows.len(), 2);
    assert_eq!(field(&rows[0], "Course"), "AGI Strategy");
    assert_eq!(field(&rows[1], "Course"), "Short Row");
    // Missing trailing column reads as empty, not as a failure.
    assert_eq!(field(&rows[1], "Course slug"), "");
}

#[test]
fn read_table_ignores_fields_beyond_the_header() {
    let path = temp_csv("wide.csv", b"Course,Status\nA,Active,unexpected,extra\n");

    let rows = read_table(&path).expect("table parses");
    fs::remove_file(&path).ok();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 2);
    assert_eq!(field(&rows[0], "Status"), "Active");
}

#[test]
fn read_table_fails_for_missing_file() {
    let missing = std::env::temp_dir().join("coursedb-definitely-missing.csv");
    let err = read_table(&missing).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn name_map_trims_keys_and_keeps_last_registration() {
    let mut map = NameMap::default();
    map.register(" Racing to a Better Future ", 1);
    map.register("Racing to a Better Future", 7);
    map.register("   ", 9);

    assert_eq!(map.len(), 1);
    assert_eq!(map.resolve("Racing to a Better Future  "), Some(7));
    assert_eq!(map.resolve("unknown"), None);
}

#[test]
fn transform_course_applies_name_and_slug_fallbacks() {
    let record = transform_course(&row(&[("Course", ""), ("Course slug", "")]));
    assert_eq!(record.name, "Untitled Course");
    assert_eq!(record.slug, "untitled-course");
    assert_eq!(record.status, "Active");

    let record = transform_course(&row(&[
        ("Course", "AGI Strategy"),
        ("Course slug", ""),
        ("Short course description", "  Navigate the decade.  "),
    ]));
    assert_eq!(record.slug, "agi-strategy");
    assert_eq!(record.description.as_deref(), Some("Navigate the decade."));
}

#[test]
fn transform_course_collapses_every_status_to_active() {
    for declared in ["Active", "Draft", "archived", ""] {
        let record = transform_course(&row(&[("Course", "X"), ("Status", declared)]));
        assert_eq!(record.status, "Active");
    }
}

#[test]
fn transform_unit_defaults_order_and_nullable_duration() {
    let record = transform_unit(
        &row(&[("Topic", ""), ("Order", "nope"), ("Unit duration (mins)", "")]),
        3,
    );
    assert_eq!(record.course_id, 3);
    assert_eq!(record.title, "Untitled Unit");
    assert_eq!(record.order, 1);
    assert_eq!(record.duration, None);
}

#[test]
fn transform_chunk_reads_decorated_time_header() {
    let record = transform_chunk(
        &row(&[
            ("Title", "Intelligence explosion"),
            ("Content", ""),
            ("Order", "4"),
            ("[*] Time (mins)", "45"),
        ]),
        11,
    );
    assert_eq!(record.unit_id, 11);
    assert_eq!(record.content, None);
    assert_eq!(record.order, 4);
    assert_eq!(record.time_minutes, Some(45));
}

#[test]
fn resource_type_declared_value_wins_over_inference() {
    let record = transform_resource(
        &row(&[
            ("[>] Type", "Website"),
            ("[>] URL", "https://example.com/report.pdf"),
        ]),
        5,
    );
    assert_eq!(record.resource_type, "Website");
}

#[test]
fn resource_type_blank_is_inferred_from_url() {
    let record = transform_resource(
        &row(&[("[>] Type", ""), ("[>] URL", "https://example.com/paper.PDF")]),
        5,
    );
    assert_eq!(record.resource_type, "Paper");

    let record = transform_resource(
        &row(&[("[>] Type", ""), ("[>] URL", "https://medium.com/some-post")]),
        5,
    );
    assert_eq!(record.resource_type, "Blog");
}

#[test]
fn resource_type_unknown_declared_value_defaults_to_article() {
    let record = transform_resource(
        &row(&[("[>] Type", "Podcast"), ("[>] URL", "https://medium.com/x")]),
        5,
    );
    assert_eq!(record.resource_type, "Article");
}

#[test]
fn infer_type_rules_evaluate_first_match_wins() {
    assert_eq!(infer_type_from_url("https://blog.example.com/a.pdf"), "Paper");
    assert_eq!(infer_type_from_url("https://a.substack.com/p/1"), "Blog");
    assert_eq!(infer_type_from_url("https://youtube.com/watch?v=1"), "Website");
    assert_eq!(infer_type_from_url("https://mit.edu/research"), "Article");
    assert_eq!(infer_type_from_url("https://unknown.example"), "Article");
    assert_eq!(infer_type_from_url(""), "Article");
}

#[test]
fn resource_status_exact_match_or_core() {
    let record = transform_resource(&row(&[("Status", "Maybe")]), 5);
    assert_eq!(record.status, "Maybe");

    let record = transform_resource(&row(&[("Status", "core")]), 5);
    assert_eq!(record.status, "Core");

    let record = transform_resource(&row(&[]), 5);
    assert_eq!(record.status, "Core");
    assert_eq!(record.url, "");
}

#[test]
fn transform_exercise_fills_every_default() {
    let record = transform_exercise(&row(&[]), 9);
    assert_eq!(record.chunk_id, 9);
    assert_eq!(record.title, "Untitled Exercise");
    assert_eq!(record.content, "");
    assert_eq!(record.exercise_type, "Free text");
    assert_eq!(record.order, 1);
    assert_eq!(record.time_minutes, None);
}

fn sample_course_rows() -> Vec<RawRow> {
    vec![
        row(&[
            ("Course", "AGI Strategy"),
            ("Course slug", "agi-strategy"),
            ("Short course description", "Navigate the decade."),
        ]),
        row(&[("Course", "AI Safety"), ("Course slug", "ai-safety")]),
        // Duplicate slug violates the unique constraint and must be the
        // only course row that fails.
        row(&[("Course", "AGI Strategy Copy"), ("Course slug", "agi-strategy")]),
    ]
}

fn sample_unit_rows() -> Vec<RawRow> {
    vec![
        row(&[
            ("Topic", "Racing to a Better Future"),
            ("[h] [*] Course-Unit", "AGI Strategy - Unit 1"),
            ("Order", "1"),
            ("Course", "AGI Strategy"),
            ("Unit duration (mins)", "110"),
        ]),
        row(&[
            ("Topic", "Orphan Unit"),
            ("Order", "1"),
            ("Course", "AGI Strategy Copy"),
        ]),
    ]
}

fn seed_sample(store: &SeedStore) -> (ResolutionMaps, SeedStats) {
    let mut maps = ResolutionMaps::default();
    let mut stats = SeedStats::default();

    seed_courses(store, &sample_course_rows(), &mut maps, &mut stats);
    seed_units(store, &sample_unit_rows(), &mut maps, &mut stats);

    let chunk_rows = vec![
        row(&[
            ("Title", "Imagining a better future"),
            ("[>] Unit", "AGI Strategy - Unit 1"),
            ("Order", "1"),
            ("[*] Time (mins)", "50"),
        ]),
        row(&[
            ("Title", "Lost chunk"),
            ("[>] Unit", "Nowhere"),
            ("Order", "2"),
        ]),
    ];
    seed_chunks(store, &chunk_rows, &mut maps, &mut stats);

    let resource_rows = vec![
        row(&[
            ("[>] Resource name", "Seeking Stability"),
            ("[>] URL", "https://www.rand.org/pubs/commentary.pdf"),
            ("[>] Chunk", "Imagining a better future"),
            ("[>] Year", "March 2025"),
            ("Order", "1"),
        ]),
        row(&[
            ("[>] Resource name", "Dangling resource"),
            ("[>] Chunk", "Lost chunk"),
        ]),
    ];
    seed_resources(store, &resource_rows, &maps, &mut stats);

    let exercise_rows = vec![
        row(&[
            ("Title", "What does a better future look like?"),
            ("[h] Text", "Write a short reflection."),
            ("Type", "Free text"),
            ("[>] Chunk", "Imagining a better future"),
            ("Time (mins)", "10"),
        ]),
        row(&[
            ("Title", "Unattached prompt"),
            ("[>] Chunk", "Lost chunk"),
        ]),
    ];
    seed_exercises(store, &exercise_rows, &maps, &mut stats);

    (maps, stats)
}

#[test]
fn seeding_isolates_row_failures_and_cascades_resolution_errors() {
    let store = SeedStore::open_in_memory().expect("store opens");
    store.ensure_schema().expect("schema bootstraps");

    let (maps, stats) = seed_sample(&store);

    // Two courses succeed; the duplicate slug is recorded, not fatal.
    assert_eq!(stats.counts.courses_inserted, 2);
    // The unit pointing at the failed course becomes a resolution error.
    assert_eq!(stats.counts.units_inserted, 1);
    assert_eq!(stats.counts.chunks_inserted, 1);
    // The resource pointing at the never-inserted chunk is a hard error.
    assert_eq!(stats.counts.resources_inserted, 1);
    // The matching exercise is skipped silently, tracked separately.
    assert_eq!(stats.counts.exercises_inserted, 1);
    assert_eq!(stats.counts.exercises_skipped_unresolved, 1);

    // course dup + orphan unit + orphan chunk + orphan resource.
    assert_eq!(stats.errors.len(), 4);
    assert_eq!(stats.counts.rows_failed, 4);
    assert!(
        stats
            .errors
            .iter()
            .any(|e| e.starts_with("failed to seed course 'AGI Strategy Copy'"))
    );
    assert!(stats.errors.iter().any(|e| e.contains("course not found")));
    assert!(stats.errors.iter().any(|e| e.contains("unit not found")));
    assert!(stats.errors.iter().any(|e| e.contains("chunk not found")));

    // Units resolve under both registered aliases.
    assert_eq!(
        maps.units.resolve("Racing to a Better Future"),
        maps.units.resolve("AGI Strategy - Unit 1")
    );

    let counts = store.count_all().expect("counts load");
    assert_eq!(counts.courses, 2);
    assert_eq!(counts.units, 1);
    assert_eq!(counts.chunks, 1);
    assert_eq!(counts.resources, 1);
    assert_eq!(counts.exercises, 1);
}

#[test]
fn inserted_resource_round_trips_the_transform_output() {
    let store = SeedStore::open_in_memory().expect("store opens");
    store.ensure_schema().expect("schema bootstraps");

    seed_sample(&store);

    let (title, url, year, resource_type, status): (String, String, i64, String, String) = store
        .connection()
        .query_row(
            "SELECT title, url, year, type, status FROM resources",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .expect("resource row loads");

    assert_eq!(title, "Seeking Stability");
    assert_eq!(url, "https://www.rand.org/pubs/commentary.pdf");
    // Year extracted from "March 2025"; blank type inferred Paper from the
    // .pdf URL; blank status fell back to Core.
    assert_eq!(year, 2025);
    assert_eq!(resource_type, "Paper");
    assert_eq!(status, "Core");
}

#[test]
fn seeded_children_never_orphan_their_parents() {
    let store = SeedStore::open_in_memory().expect("store opens");
    store.ensure_schema().expect("schema bootstraps");

    seed_sample(&store);

    let orphan_queries = [
        "SELECT COUNT(*) FROM units WHERE course_id NOT IN (SELECT id FROM courses)",
        "SELECT COUNT(*) FROM chunks WHERE unit_id NOT IN (SELECT id FROM units)",
        "SELECT COUNT(*) FROM resources WHERE chunk_id NOT IN (SELECT id FROM chunks)",
        "SELECT COUNT(*) FROM exercises WHERE chunk_id NOT IN (SELECT id FROM chunks)",
    ];

    for sql in orphan_queries {
        let orphans: i64 = store
            .connection()
            .query_row(sql, [], |row| row.get(0))
            .expect("orphan query runs");
        assert_eq!(orphans, 0, "{sql}");
    }
}

#[test]
fn reseeding_with_clear_yields_identical_counts() {
    let store = SeedStore::open_in_memory().expect("store opens");
    store.ensure_schema().expect("schema bootstraps");

    seed_sample(&store);
    let first = store.count_all().expect("counts load");

    store.clear_all().expect("clear succeeds");
    let cleared = store.count_all().expect("counts load");
    assert_eq!(cleared.courses, 0);
    assert_eq!(cleared.exercises, 0);

    seed_sample(&store);
    let second = store.count_all().expect("counts load");

    assert_eq!(first, second);
}

#[test]
fn clear_all_is_a_noop_before_schema_creation() {
    let store = SeedStore::open_in_memory().expect("store opens");
    store.clear_all().expect("clear on empty store succeeds");
}
