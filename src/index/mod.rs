pub mod document;
pub mod documents;
pub mod error;
pub mod links;

use std::collections::BTreeMap;
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;
use tracing::{debug, info, warn};

pub use crate::index::document::{Document, Scope, Visibility};
pub use crate::index::error::StoreError;

use crate::index::documents::{
    document_at, document_columns, document_exists, encode_visibility, find_by_path,
    find_by_title, next_timestamp, now_timestamp, resolve_title_subquery,
};
use crate::index::links::{delete_outgoing_edges, sync_document_links};
use crate::link::normalize_title;

const SCHEMA_VERSION: i64 = 1;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Keyset position in the `latest_documents` ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    pub updated_at: String,
    pub path: String,
}

impl PageCursor {
    pub fn after(document: &Document) -> Self {
        Self {
            updated_at: document.updated_at.clone(),
            path: document.path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReindexSummary {
    pub documents: usize,
    pub edges: usize,
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Read-only access for query code; writes go through the methods below.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            ",
        )?;

        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version == 0 {
            self.create_schema_v1()?;
            self.conn
                .execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
        } else if version == SCHEMA_VERSION {
            self.create_schema_v1()?;
        } else {
            return Err(rusqlite::Error::InvalidQuery);
        }
        Ok(())
    }

    fn create_schema_v1(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                path TEXT PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                title_key TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',
                visibility TEXT NOT NULL CHECK (visibility IN ('public', 'private')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                published_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_documents_title_key ON documents(title_key);
            CREATE INDEX IF NOT EXISTS idx_documents_updated_at ON documents(updated_at);

            CREATE TABLE IF NOT EXISTS entry_links (
                src_path TEXT NOT NULL REFERENCES documents(path) ON DELETE CASCADE,
                dst_title TEXT NOT NULL,
                dst_key TEXT NOT NULL,
                position INTEGER NOT NULL,
                UNIQUE(src_path, dst_key)
            );

            CREATE INDEX IF NOT EXISTS idx_entry_links_dst_key ON entry_links(dst_key);
            ",
        )?;
        Ok(())
    }

    /// Takes the write lock up front so two writers serialize instead of
    /// failing on lock upgrade.
    fn write_transaction(&self) -> rusqlite::Result<Transaction<'_>> {
        Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
    }

    pub fn document_by_path(&self, path: &str) -> Result<Document, StoreError> {
        find_by_path(&self.conn, path)?.ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    pub fn document_by_title(&self, title: &str) -> rusqlite::Result<Option<Document>> {
        find_by_title(&self.conn, title, Scope::Admin)
    }

    pub fn create_document(
        &self,
        path: &str,
        title: &str,
        visibility: Visibility,
    ) -> Result<Document, StoreError> {
        validate_path(path)?;
        validate_title(title)?;

        let tx = self.write_transaction()?;
        if document_exists(&tx, path)? {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        let now = now_timestamp();
        let published_at = (visibility == Visibility::Public).then(|| now.clone());
        tx.execute(
            "INSERT INTO documents (path, title, title_key, body, visibility, created_at, updated_at, published_at)
             VALUES (?1, ?2, ?3, '', ?4, ?5, ?5, ?6)",
            params![
                path,
                title,
                normalize_title(title),
                encode_visibility(visibility),
                now,
                published_at
            ],
        )?;
        let document = load_written(&tx, path)?;
        tx.commit()?;
        info!(path, "created document");
        Ok(document)
    }

    /// Writes a new body if `expected_updated_at` still matches, and
    /// re-extracts the document's links in the same transaction.
    pub fn update_body(
        &self,
        path: &str,
        body: &str,
        expected_updated_at: &str,
    ) -> Result<Document, StoreError> {
        let tx = self.write_transaction()?;
        let changed = tx.execute(
            "UPDATE documents SET body = ?1, updated_at = ?2
             WHERE path = ?3 AND updated_at = ?4",
            params![
                body,
                next_timestamp(expected_updated_at),
                path,
                expected_updated_at
            ],
        )?;
        if changed == 0 {
            return Err(missing_or_conflict(&tx, path)?);
        }

        let document = load_written(&tx, path)?;
        sync_document_links(&tx, &document.path, &document.title, &document.body)?;
        tx.commit()?;
        Ok(document)
    }

    /// Same compare-and-swap as `update_body`. Links are re-synced because
    /// the self-link filter depends on the title.
    pub fn update_title(
        &self,
        path: &str,
        title: &str,
        expected_updated_at: &str,
    ) -> Result<Document, StoreError> {
        validate_title(title)?;

        let tx = self.write_transaction()?;
        let changed = tx.execute(
            "UPDATE documents SET title = ?1, title_key = ?2, updated_at = ?3
             WHERE path = ?4 AND updated_at = ?5",
            params![
                title,
                normalize_title(title),
                next_timestamp(expected_updated_at),
                path,
                expected_updated_at
            ],
        )?;
        if changed == 0 {
            return Err(missing_or_conflict(&tx, path)?);
        }

        let document = load_written(&tx, path)?;
        sync_document_links(&tx, &document.path, &document.title, &document.body)?;
        tx.commit()?;
        Ok(document)
    }

    /// `published_at` is stamped the first time a document goes public and
    /// kept from then on. `updated_at` is left alone so open editors keep a
    /// valid token.
    pub fn update_visibility(
        &self,
        path: &str,
        visibility: Visibility,
    ) -> Result<Document, StoreError> {
        let tx = self.write_transaction()?;
        let current =
            find_by_path(&tx, path)?.ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        tx.execute(
            "UPDATE documents SET visibility = ?1 WHERE path = ?2",
            params![encode_visibility(visibility), path],
        )?;
        if current.visibility == Visibility::Private
            && visibility == Visibility::Public
            && current.published_at.is_none()
        {
            tx.execute(
                "UPDATE documents SET published_at = ?1 WHERE path = ?2",
                params![now_timestamp(), path],
            )?;
            info!(path, "document published for the first time");
        }

        let document = load_written(&tx, path)?;
        tx.commit()?;
        Ok(document)
    }

    /// Removes the document together with its outgoing edges. Edges other
    /// documents hold towards its title stay; they are soft references.
    pub fn delete_document(&self, path: &str) -> Result<usize, StoreError> {
        let tx = self.write_transaction()?;
        let removed_edges = delete_outgoing_edges(&tx, path)?;
        let removed = tx.execute("DELETE FROM documents WHERE path = ?1", params![path])?;
        if removed == 0 {
            return Err(StoreError::NotFound(path.to_string()));
        }
        tx.commit()?;
        info!(path, removed_edges, "deleted document");
        Ok(removed_edges)
    }

    /// Create-or-replace without a concurrency token, for bulk import.
    /// Returns the stored document and whether it was newly created.
    pub fn upsert_imported(
        &self,
        path: &str,
        title: &str,
        body: &str,
        visibility: Visibility,
    ) -> Result<(Document, bool), StoreError> {
        validate_path(path)?;
        validate_title(title)?;

        let tx = self.write_transaction()?;
        let created = match find_by_path(&tx, path)? {
            Some(existing) => {
                let published_at = existing.published_at.clone().or_else(|| {
                    (visibility == Visibility::Public).then(now_timestamp)
                });
                tx.execute(
                    "UPDATE documents
                     SET title = ?1, title_key = ?2, body = ?3, visibility = ?4,
                         updated_at = ?5, published_at = ?6
                     WHERE path = ?7",
                    params![
                        title,
                        normalize_title(title),
                        body,
                        encode_visibility(visibility),
                        next_timestamp(&existing.updated_at),
                        published_at,
                        path
                    ],
                )?;
                false
            }
            None => {
                let now = now_timestamp();
                let published_at = (visibility == Visibility::Public).then(|| now.clone());
                tx.execute(
                    "INSERT INTO documents (path, title, title_key, body, visibility, created_at, updated_at, published_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)",
                    params![
                        path,
                        title,
                        normalize_title(title),
                        body,
                        encode_visibility(visibility),
                        now,
                        published_at
                    ],
                )?;
                true
            }
        };

        let document = load_written(&tx, path)?;
        sync_document_links(&tx, &document.path, &document.title, &document.body)?;
        tx.commit()?;
        Ok((document, created))
    }

    /// Newest first, ties by path. `after` is the last row of the previous
    /// page; rows sharing its `updated_at` are not skipped.
    pub fn latest_documents(
        &self,
        limit: usize,
        after: Option<&PageCursor>,
        scope: Scope,
    ) -> rusqlite::Result<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM documents d
             WHERE (?1 IS NULL
                    OR d.updated_at < ?1
                    OR (d.updated_at = ?1 AND d.path > ?2)){}
             ORDER BY d.updated_at DESC, d.path ASC
             LIMIT ?3",
            document_columns("d"),
            scope.filter_clause("d")
        ))?;

        let (updated_at, path) = match after {
            Some(cursor) => (Some(cursor.updated_at.as_str()), Some(cursor.path.as_str())),
            None => (None, None),
        };
        let mut rows = stmt.query(params![updated_at, path, limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(document_at(row, 0)?);
        }
        Ok(out)
    }

    pub fn all_titles(&self) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT title FROM documents ORDER BY title ASC")?;
        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(titles)
    }

    /// Normalized destination title → path of the document it resolves to,
    /// or `None` when nothing carries that title yet.
    pub fn linked_paths(&self, path: &str) -> Result<BTreeMap<String, Option<String>>, StoreError> {
        if !document_exists(&self.conn, path)? {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT l.dst_key, ({})
             FROM entry_links l
             WHERE l.src_path = ?1
             ORDER BY l.position ASC",
            resolve_title_subquery("l.dst_key", Scope::Admin)
        ))?;

        let mut rows = stmt.query(params![path])?;
        let mut out = BTreeMap::new();
        while let Some(row) = rows.next()? {
            out.insert(row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?);
        }
        Ok(out)
    }

    /// Recomputes every document's edges from its body in one transaction.
    pub fn reindex_all(&self) -> Result<ReindexSummary, StoreError> {
        let tx = self.write_transaction()?;
        let documents = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM documents d ORDER BY d.path ASC",
                document_columns("d")
            ))?;
            stmt.query_map([], |row| document_at(row, 0))?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.execute("DELETE FROM entry_links", [])?;
        let mut edges = 0usize;
        for document in &documents {
            edges += sync_document_links(&tx, &document.path, &document.title, &document.body)?
                .len();
        }
        tx.commit()?;

        info!(documents = documents.len(), edges, "rebuilt link index");
        Ok(ReindexSummary {
            documents: documents.len(),
            edges,
        })
    }
}

fn load_written(tx: &Transaction<'_>, path: &str) -> Result<Document, StoreError> {
    find_by_path(tx, path)?.ok_or_else(|| StoreError::NotFound(path.to_string()))
}

/// Explains a compare-and-swap that touched no row.
fn missing_or_conflict(tx: &Transaction<'_>, path: &str) -> Result<StoreError, StoreError> {
    if document_exists(tx, path)? {
        warn!(path, "rejected stale write");
        Ok(StoreError::Conflict(path.to_string()))
    } else {
        debug!(path, "write to missing document");
        Ok(StoreError::NotFound(path.to_string()))
    }
}

fn validate_path(path: &str) -> Result<(), StoreError> {
    if path.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "document path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "title must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::links::{edge_count, outgoing_titles};

    fn write_body(store: &SqliteStore, path: &str, body: &str) -> Document {
        let current = store.document_by_path(path).expect("document exists");
        store
            .update_body(path, body, &current.updated_at)
            .expect("body update")
    }

    fn seeded(store: &SqliteStore, path: &str, title: &str, body: &str) -> Document {
        store
            .create_document(path, title, Visibility::Private)
            .expect("create document");
        write_body(store, path, body)
    }

    #[test]
    fn body_write_replaces_edges_instead_of_merging() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        seeded(&store, "notes/t", "T", "[[A]] and [[B]]");
        assert_eq!(
            outgoing_titles(store.connection(), "notes/t").expect("edges"),
            vec!["A", "B"]
        );

        write_body(&store, "notes/t", "[[B]] then [[C]]");
        assert_eq!(
            outgoing_titles(store.connection(), "notes/t").expect("edges"),
            vec!["B", "C"]
        );
    }

    #[test]
    fn removing_every_link_clears_edges() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        seeded(&store, "notes/t", "T", "[[A]]");
        write_body(&store, "notes/t", "no more links");
        assert!(
            outgoing_titles(store.connection(), "notes/t")
                .expect("edges")
                .is_empty()
        );
    }

    #[test]
    fn self_links_are_not_indexed() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        seeded(&store, "home", "Home", "[[Home]] [[other]] [[HOME]]");
        assert_eq!(
            outgoing_titles(store.connection(), "home").expect("edges"),
            vec!["other"]
        );
    }

    #[test]
    fn retitle_resyncs_self_link_filter() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        let doc = seeded(&store, "p", "Draft", "[[Final]] [[Draft]]");
        assert_eq!(
            outgoing_titles(store.connection(), "p").expect("edges"),
            vec!["Final"]
        );

        store
            .update_title("p", "Final", &doc.updated_at)
            .expect("retitle");
        assert_eq!(
            outgoing_titles(store.connection(), "p").expect("edges"),
            vec!["Draft"]
        );
    }

    #[test]
    fn stale_token_conflicts_and_leaves_edges_untouched() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        let created = store
            .create_document("p", "P", Visibility::Private)
            .expect("create");
        let first = store
            .update_body("p", "[[A]]", &created.updated_at)
            .expect("first write");
        assert_ne!(first.updated_at, created.updated_at);

        let err = store
            .update_body("p", "[[Z]]", &created.updated_at)
            .expect_err("stale token must conflict");
        assert!(matches!(err, StoreError::Conflict(_)));

        let current = store.document_by_path("p").expect("document");
        assert_eq!(current.body, "[[A]]");
        assert_eq!(
            outgoing_titles(store.connection(), "p").expect("edges"),
            vec!["A"]
        );
    }

    #[test]
    fn writes_to_missing_document_report_not_found() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        let err = store
            .update_body("ghost", "[[A]]", "2026-01-01T00:00:00.000000000Z")
            .expect_err("missing document");
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(edge_count(store.connection()).expect("count"), 0);
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        store
            .create_document("p", "P", Visibility::Private)
            .expect("create");
        let err = store
            .create_document("p", "Other", Visibility::Public)
            .expect_err("duplicate path");
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn empty_title_is_invalid() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        let err = store
            .create_document("p", "  ", Visibility::Private)
            .expect_err("empty title");
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn delete_cascades_outgoing_edges_only() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        seeded(&store, "a", "A", "[[B]] [[C]]");
        seeded(&store, "b", "B", "[[A]]");

        let removed = store.delete_document("a").expect("delete");
        assert_eq!(removed, 2);
        assert!(
            outgoing_titles(store.connection(), "a")
                .expect("edges")
                .is_empty()
        );
        assert_eq!(
            outgoing_titles(store.connection(), "b").expect("edges"),
            vec!["A"]
        );
        assert!(matches!(
            store.delete_document("a"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn first_publication_sets_published_at_once() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        let created = store
            .create_document("p", "P", Visibility::Private)
            .expect("create");
        assert!(created.published_at.is_none());

        let published = store
            .update_visibility("p", Visibility::Public)
            .expect("publish");
        let stamp = published.published_at.clone().expect("published_at set");
        assert_eq!(published.updated_at, created.updated_at);

        store
            .update_visibility("p", Visibility::Private)
            .expect("unpublish");
        let republished = store
            .update_visibility("p", Visibility::Public)
            .expect("republish");
        assert_eq!(republished.published_at, Some(stamp));
    }

    #[test]
    fn title_lookup_prefers_most_recent_update() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        seeded(&store, "old", "Shared", "first");
        seeded(&store, "new", "Shared", "second");

        let found = store
            .document_by_title("Shared")
            .expect("lookup")
            .expect("match");
        assert_eq!(found.path, "new");

        write_body(&store, "old", "touched again");
        let found = store
            .document_by_title("Shared")
            .expect("lookup")
            .expect("match");
        assert_eq!(found.path, "old");

        let folded = store
            .document_by_title("SHARED")
            .expect("lookup")
            .expect("case-insensitive match");
        assert_eq!(folded.path, "old");
        assert!(store.document_by_title("Shared ").expect("lookup").is_none());
    }

    #[test]
    fn linked_paths_maps_normalized_titles() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        seeded(&store, "t", "T", "[[Setup]] [[Ghost]]");
        seeded(&store, "s", "Setup", "");

        let map = store.linked_paths("t").expect("linked paths");
        assert_eq!(map.get("setup"), Some(&Some("s".to_string())));
        assert_eq!(map.get("ghost"), Some(&None));
    }

    #[test]
    fn latest_documents_pages_by_updated_at() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        seeded(&store, "a", "A", "1");
        seeded(&store, "b", "B", "2");
        seeded(&store, "c", "C", "3");

        let first_page = store
            .latest_documents(2, None, Scope::Admin)
            .expect("page 1");
        let paths = first_page.iter().map(|d| d.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["c", "b"]);

        let cursor = PageCursor::after(&first_page[1]);
        let second_page = store
            .latest_documents(2, Some(&cursor), Scope::Admin)
            .expect("page 2");
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].path, "a");

        assert!(
            store
                .latest_documents(10, None, Scope::Public)
                .expect("public")
                .is_empty()
        );
    }

    #[test]
    fn paging_keeps_rows_sharing_a_timestamp() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        for path in ["a", "b", "c", "d"] {
            seeded(&store, path, path, "x");
        }
        store
            .connection()
            .execute(
                "UPDATE documents SET updated_at = '2026-01-01T00:00:00.000000000Z'",
                [],
            )
            .expect("collide timestamps");

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = store
                .latest_documents(3, cursor.as_ref(), Scope::Admin)
                .expect("page");
            if page.is_empty() {
                break;
            }
            cursor = page.last().map(PageCursor::after);
            seen.extend(page.into_iter().map(|doc| doc.path));
        }
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn failed_edge_insert_rolls_back_body_write() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        let before = seeded(&store, "p", "P", "[[A]] [[B]]");
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_edges BEFORE INSERT ON entry_links
                 BEGIN SELECT RAISE(ABORT, 'edge insert rejected'); END;",
            )
            .expect("install trigger");

        let err = store
            .update_body("p", "[[C]]", &before.updated_at)
            .expect_err("edge insert must fail");
        assert!(matches!(err, StoreError::Sqlite(_)), "got {err:?}");

        let current = store.document_by_path("p").expect("document");
        assert_eq!(current.body, "[[A]] [[B]]");
        assert_eq!(current.updated_at, before.updated_at);
        assert_eq!(
            outgoing_titles(store.connection(), "p").expect("edges"),
            vec!["A", "B"]
        );
    }

    #[test]
    fn upsert_creates_then_updates_and_syncs_links() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        let (doc, created) = store
            .upsert_imported("notes/a", "A", "[[B]]", Visibility::Public)
            .expect("insert");
        assert!(created);
        assert!(doc.published_at.is_some());

        let (doc, created) = store
            .upsert_imported("notes/a", "A", "[[C]]", Visibility::Public)
            .expect("update");
        assert!(!created);
        assert_eq!(doc.body, "[[C]]");
        assert_eq!(
            outgoing_titles(store.connection(), "notes/a").expect("edges"),
            vec!["C"]
        );
    }

    #[test]
    fn reindex_rebuilds_edges_from_bodies() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        seeded(&store, "a", "A", "[[B]] [[C]]");
        seeded(&store, "b", "B", "[[A]]");
        store
            .connection()
            .execute("DELETE FROM entry_links", [])
            .expect("wipe edges");

        let summary = store.reindex_all().expect("reindex");
        assert_eq!(summary, ReindexSummary { documents: 2, edges: 3 });
        assert_eq!(
            outgoing_titles(store.connection(), "a").expect("edges"),
            vec!["B", "C"]
        );
    }

    #[test]
    fn all_titles_are_distinct_and_sorted() {
        let store = SqliteStore::open_in_memory().expect("in-memory sqlite");
        for (path, title) in [("1", "beta"), ("2", "Alpha"), ("3", "beta")] {
            store
                .create_document(path, title, Visibility::Private)
                .expect("create");
        }
        assert_eq!(store.all_titles().expect("titles"), vec!["Alpha", "beta"]);
    }
}
