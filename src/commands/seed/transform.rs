use crate::model::{
    COURSE_STATUS_ACTIVE, NewChunk, NewCourse, NewExercise, NewResource, NewUnit, RESOURCE_STATUSES,
    RESOURCE_TYPES,
};

use super::csv_read::{RawRow, field};
use super::fields::{clean_text, generate_slug, parse_integer, parse_year};

/// Transformers never fail: missing or malformed source fields degrade to the
/// documented defaults so one messy spreadsheet row cannot abort a stage.

pub fn transform_course(row: &RawRow) -> NewCourse {
    let name = clean_text(field(row, "Course")).unwrap_or_else(|| "Untitled Course".to_owned());
    let slug = clean_text(field(row, "Course slug")).unwrap_or_else(|| generate_slug(&name));

    NewCourse {
        name,
        slug,
        description: clean_text(field(row, "Short course description")),
        // Single-status domain today; every source value collapses to Active.
        status: COURSE_STATUS_ACTIVE.to_owned(),
    }
}

pub fn transform_unit(row: &RawRow, course_id: i64) -> NewUnit {
    NewUnit {
        course_id,
        title: clean_text(field(row, "Topic")).unwrap_or_else(|| "Untitled Unit".to_owned()),
        order: parse_integer(field(row, "Order")).unwrap_or(1),
        duration: parse_integer(field(row, "Unit duration (mins)")),
    }
}

pub fn transform_chunk(row: &RawRow, unit_id: i64) -> NewChunk {
    NewChunk {
        unit_id,
        title: clean_text(field(row, "Title")).unwrap_or_else(|| "Untitled Chunk".to_owned()),
        content: clean_text(field(row, "Content")),
        order: parse_integer(field(row, "Order")).unwrap_or(1),
        time_minutes: parse_integer(field(row, "[*] Time (mins)")),
    }
}

pub fn transform_resource(row: &RawRow, chunk_id: i64) -> NewResource {
    let url = clean_text(field(row, "[>] URL")).unwrap_or_default();

    let resource_type = match clean_text(field(row, "[>] Type")) {
        Some(declared) if RESOURCE_TYPES.contains(&declared.as_str()) => declared,
        // Blank declared type: fall back to URL heuristics.
        None => infer_type_from_url(&url).to_owned(),
        Some(_) => "Article".to_owned(),
    };

    let status = match clean_text(field(row, "Status")) {
        Some(declared) if RESOURCE_STATUSES.contains(&declared.as_str()) => declared,
        _ => "Core".to_owned(),
    };

    NewResource {
        chunk_id,
        title: clean_text(field(row, "[>] Resource name"))
            .unwrap_or_else(|| "Untitled Resource".to_owned()),
        url,
        author: clean_text(field(row, "[>] Authors")),
        year: parse_year(field(row, "[>] Year")),
        resource_type,
        time_minutes: parse_integer(field(row, "Time (mins)")),
        description: clean_text(field(row, "Guide")),
        order: parse_integer(field(row, "Order")).unwrap_or(1),
        status,
    }
}

pub fn transform_exercise(row: &RawRow, chunk_id: i64) -> NewExercise {
    NewExercise {
        chunk_id,
        title: clean_text(field(row, "Title")).unwrap_or_else(|| "Untitled Exercise".to_owned()),
        content: clean_text(field(row, "[h] Text")).unwrap_or_default(),
        exercise_type: clean_text(field(row, "Type")).unwrap_or_else(|| "Free text".to_owned()),
        time_minutes: parse_integer(field(row, "Time (mins)")),
        order: parse_integer(field(row, "Order")).unwrap_or(1),
    }
}

struct UrlTypeRule {
    needles: &'static [&'static str],
    resource_type: &'static str,
}

/// Ordered first-match-wins heuristics for resources whose declared type is
/// blank. Hand-maintained from the domains seen in real exports.
const URL_TYPE_RULES: &[UrlTypeRule] = &[
    UrlTypeRule {
        needles: &[".pdf"],
        resource_type: "Paper",
    },
    UrlTypeRule {
        needles: &[
            "substack.com",
            "blog.",
            "/blog/",
            "medium.com",
            "oneusefulthing.org",
        ],
        resource_type: "Blog",
    },
    UrlTypeRule {
        needles: &["youtube.com", "vimeo.com"],
        resource_type: "Website",
    },
    UrlTypeRule {
        needles: &[
            "openai.com",
            "anthropic.com",
            ".edu",
            "rand.org",
            "cnas.org",
            "futureoflife.org",
        ],
        resource_type: "Article",
    },
];

pub fn infer_type_from_url(url: &str) -> &'static str {
    let lower = url.to_lowercase();

    URL_TYPE_RULES
        .iter()
        .find(|rule| rule.needles.iter().any(|needle| lower.contains(needle)))
        .map(|rule| rule.resource_type)
        .unwrap_or("Article")
}
