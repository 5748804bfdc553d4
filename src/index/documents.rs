use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::index::document::{Document, Scope, Visibility};
use crate::link::normalize_title;

const DOCUMENT_FIELDS: [&str; 7] = [
    "path",
    "title",
    "body",
    "visibility",
    "created_at",
    "updated_at",
    "published_at",
];

/// `d.path, d.title, ...` for splicing into joins.
pub(crate) fn document_columns(alias: &str) -> String {
    DOCUMENT_FIELDS
        .iter()
        .map(|field| format!("{alias}.{field}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn document_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Document> {
    Ok(Document {
        path: row.get(offset)?,
        title: row.get(offset + 1)?,
        body: row.get(offset + 2)?,
        visibility: decode_visibility(&row.get::<_, String>(offset + 3)?),
        created_at: row.get(offset + 4)?,
        updated_at: row.get(offset + 5)?,
        published_at: row.get(offset + 6)?,
    })
}

/// Columns of a LEFT JOIN that found no document are all NULL.
pub(crate) fn optional_document_at(
    row: &Row<'_>,
    offset: usize,
) -> rusqlite::Result<Option<Document>> {
    let path: Option<String> = row.get(offset)?;
    if path.is_none() {
        return Ok(None);
    }
    document_at(row, offset).map(Some)
}

pub fn find_by_path(conn: &Connection, path: &str) -> rusqlite::Result<Option<Document>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM documents d WHERE d.path = ?1",
            document_columns("d")
        ),
        params![path],
        |row| document_at(row, 0),
    )
    .optional()
}

/// Case-insensitive title lookup through the stored `title_key`. Titles are
/// not unique: the most recently updated document wins, ties go to the
/// smallest path.
pub fn find_by_title(
    conn: &Connection,
    title: &str,
    scope: Scope,
) -> rusqlite::Result<Option<Document>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM documents d
             WHERE d.title_key = ?1{}
             ORDER BY d.updated_at DESC, d.path ASC
             LIMIT 1",
            document_columns("d"),
            scope.filter_clause("d")
        ),
        params![normalize_title(title)],
        |row| document_at(row, 0),
    )
    .optional()
}

/// Correlated subquery picking the same document `find_by_title` would for
/// the normalized title in `key_expr`.
pub(crate) fn resolve_title_subquery(key_expr: &str, scope: Scope) -> String {
    format!(
        "SELECT c.path FROM documents c
         WHERE c.title_key = {key_expr}{}
         ORDER BY c.updated_at DESC, c.path ASC
         LIMIT 1",
        scope.filter_clause("c")
    )
}

pub(crate) fn document_exists(conn: &Connection, path: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE path = ?1",
        params![path],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn encode_visibility(visibility: Visibility) -> &'static str {
    visibility.as_str()
}

fn decode_visibility(raw: &str) -> Visibility {
    match raw {
        "public" => Visibility::Public,
        _ => Visibility::Private,
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// A fresh `updated_at` strictly after `previous`, so a compare-and-swap
/// token never repeats even when the clock is coarse.
pub(crate) fn next_timestamp(previous: &str) -> String {
    let now = Utc::now();
    match DateTime::parse_from_rfc3339(previous) {
        Ok(prev) => {
            let prev = prev.with_timezone(&Utc);
            if now > prev {
                format_timestamp(now)
            } else {
                format_timestamp(prev + Duration::nanoseconds(1))
            }
        }
        Err(_) => format_timestamp(now),
    }
}

/// `YYYY/MM/DD/HHMMSS`, the identifier given to documents created without one.
pub fn default_document_path(at: DateTime<Utc>) -> String {
    at.format("%Y/%m/%d/%H%M%S").to_string()
}

/// `YYYYMMDDHHMMSS`, the title given to documents created without one.
pub fn default_title(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}
