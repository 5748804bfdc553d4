use rusqlite::{Connection, Transaction, params};
use tracing::debug;

use crate::link::{LinkExtractor, normalize_title, titles_match};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdge {
    pub src_path: String,
    pub dst_title: String,
    pub position: usize,
}

/// Replaces every outgoing edge of `src_path` with `titles`, in order.
///
/// Only callable with an open transaction: the delete and the inserts become
/// visible together or not at all.
pub fn replace_outgoing_edges(
    tx: &Transaction<'_>,
    src_path: &str,
    titles: &[String],
) -> rusqlite::Result<()> {
    delete_outgoing_edges(tx, src_path)?;
    if titles.is_empty() {
        return Ok(());
    }

    let mut stmt = tx.prepare_cached(
        "INSERT INTO entry_links (src_path, dst_title, dst_key, position)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, title) in titles.iter().enumerate() {
        stmt.execute(params![
            src_path,
            title,
            normalize_title(title),
            position as i64
        ])?;
    }
    Ok(())
}

pub fn delete_outgoing_edges(tx: &Transaction<'_>, src_path: &str) -> rusqlite::Result<usize> {
    tx.execute(
        "DELETE FROM entry_links WHERE src_path = ?1",
        params![src_path],
    )
}

/// Brings the edge index for one document in line with its body.
///
/// References to the document's own title are dropped. Existing edges are
/// cleared even when the body no longer references anything. Returns the
/// titles that were stored.
pub fn sync_document_links(
    tx: &Transaction<'_>,
    path: &str,
    title: &str,
    body: &str,
) -> rusqlite::Result<Vec<String>> {
    sync_document_links_with(LinkExtractor::shared(), tx, path, title, body)
}

pub fn sync_document_links_with(
    extractor: &LinkExtractor,
    tx: &Transaction<'_>,
    path: &str,
    title: &str,
    body: &str,
) -> rusqlite::Result<Vec<String>> {
    let links = extractor
        .extract(body)
        .into_iter()
        .filter(|link| !titles_match(link, title))
        .collect::<Vec<_>>();

    replace_outgoing_edges(tx, path, &links)?;
    debug!(path, edge_count = links.len(), "synchronized outgoing links");
    Ok(links)
}

pub fn outgoing_edges(conn: &Connection, src_path: &str) -> rusqlite::Result<Vec<LinkEdge>> {
    let mut stmt = conn.prepare(
        "SELECT src_path, dst_title, position
         FROM entry_links
         WHERE src_path = ?1
         ORDER BY position ASC",
    )?;

    let mut rows = stmt.query(params![src_path])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(LinkEdge {
            src_path: row.get(0)?,
            dst_title: row.get(1)?,
            position: row.get::<_, i64>(2)? as usize,
        });
    }
    Ok(out)
}

pub fn outgoing_titles(conn: &Connection, src_path: &str) -> rusqlite::Result<Vec<String>> {
    Ok(outgoing_edges(conn, src_path)?
        .into_iter()
        .map(|edge| edge.dst_title)
        .collect())
}

pub fn edge_count(conn: &Connection) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM entry_links", [], |row| row.get(0))?;
    Ok(count as usize)
}
