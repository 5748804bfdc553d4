use std::collections::{HashMap, HashSet};

use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;
use tracing::debug;

use crate::index::documents::{
    document_at, document_columns, find_by_path, optional_document_at, resolve_title_subquery,
};
use crate::index::{Document, Scope, StoreError, Visibility};
use crate::link::normalize_title;

/// One outgoing edge of the target, with the document its title resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardLink {
    pub dst_title: String,
    pub document: Option<Document>,
}

/// A document sharing one of the target's destination titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingLink {
    pub dst_key: String,
    pub document: Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwoHopGroup {
    pub src: ForwardLink,
    pub links: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LinkPallet {
    /// Referenced titles with no (non-empty) page behind them yet.
    pub new_links: Vec<String>,
    /// Directly related documents, unique by path.
    pub links: Vec<Document>,
    pub twohops: Vec<TwoHopGroup>,
}

/// Computes the link pallet for `path`.
///
/// The three reads share one read transaction so they observe a single
/// committed state of the edge index. When `conn` is already inside a
/// transaction (a `&Transaction` derefs to `&Connection`) the reads join it
/// and the caller keeps ownership of commit or rollback.
pub fn link_pallet(conn: &Connection, path: &str, scope: Scope) -> Result<LinkPallet, StoreError> {
    let tx = if conn.is_autocommit() {
        Some(conn.unchecked_transaction()?)
    } else {
        None
    };
    let target = find_by_path(conn, path)?
        .filter(|doc| scope == Scope::Admin || doc.visibility == Visibility::Public)
        .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

    let forward = forward_links(conn, &target.path, scope)?;
    let backlinks = backlinks(conn, &target.path, &target.title, scope)?;
    let keys = forward
        .iter()
        .map(|link| normalize_title(&link.dst_title))
        .collect::<Vec<_>>();
    let siblings = sibling_links(conn, &target.path, &keys, scope)?;
    if let Some(tx) = tx {
        tx.commit()?;
    }

    let pallet = assemble_pallet(&target.path, forward, backlinks, siblings);
    debug!(
        path = %target.path,
        new_links = pallet.new_links.len(),
        links = pallet.links.len(),
        twohops = pallet.twohops.len(),
        "assembled link pallet"
    );
    Ok(pallet)
}

/// Outgoing edges of `src_path` in extraction order, each resolved through
/// `title_key` to at most one document.
pub fn forward_links(
    conn: &Connection,
    src_path: &str,
    scope: Scope,
) -> rusqlite::Result<Vec<ForwardLink>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT l.dst_title, {}
         FROM entry_links l
         LEFT JOIN documents d ON d.path = ({})
         WHERE l.src_path = ?1
         ORDER BY l.position ASC",
        document_columns("d"),
        resolve_title_subquery("l.dst_key", scope)
    ))?;

    let mut rows = stmt.query(params![src_path])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(ForwardLink {
            dst_title: row.get(0)?,
            document: optional_document_at(row, 1)?,
        });
    }
    Ok(out)
}

/// Documents other than the target with an edge naming `title`, compared
/// case-insensitively.
pub fn backlinks(
    conn: &Connection,
    target_path: &str,
    title: &str,
    scope: Scope,
) -> rusqlite::Result<Vec<Document>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}
         FROM entry_links l
         INNER JOIN documents d ON d.path = l.src_path
         WHERE l.dst_key = ?1 AND d.path != ?2{}
         ORDER BY d.updated_at DESC, d.path ASC",
        document_columns("d"),
        scope.filter_clause("d")
    ))?;

    let mut rows = stmt.query(params![normalize_title(title), target_path])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(document_at(row, 0)?);
    }
    Ok(out)
}

/// Documents other than the target linking to any of `dst_keys`
/// (normalized titles), tagged with the key they share.
pub fn sibling_links(
    conn: &Connection,
    target_path: &str,
    dst_keys: &[String],
    scope: Scope,
) -> rusqlite::Result<Vec<SiblingLink>> {
    if dst_keys.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (0..dst_keys.len())
        .map(|idx| format!("?{}", idx + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT l.dst_key, {}
         FROM entry_links l
         INNER JOIN documents d ON d.path = l.src_path
         WHERE d.path != ?1 AND l.dst_key IN ({placeholders}){}
         ORDER BY l.dst_key ASC, d.updated_at DESC, d.path ASC",
        document_columns("d"),
        scope.filter_clause("d")
    ))?;

    let args = std::iter::once(target_path).chain(dst_keys.iter().map(String::as_str));
    let mut rows = stmt.query(params_from_iter(args))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(SiblingLink {
            dst_key: row.get(0)?,
            document: document_at(row, 1)?,
        });
    }
    Ok(out)
}

/// Folds the three reads into a pallet.
///
/// A forward row whose title other documents also link to becomes a two-hop
/// group; otherwise a resolved, non-empty page is a related document and
/// anything else is a new-link candidate. Backlinks fill in the related
/// documents not already shown. The target never appears.
pub fn assemble_pallet(
    target_path: &str,
    forward: Vec<ForwardLink>,
    backlinks: Vec<Document>,
    siblings: Vec<SiblingLink>,
) -> LinkPallet {
    let mut siblings_by_key: HashMap<String, Vec<Document>> = HashMap::new();
    for sibling in siblings {
        siblings_by_key
            .entry(sibling.dst_key)
            .or_default()
            .push(sibling.document);
    }

    let mut seen = HashSet::from([target_path.to_string()]);
    let mut related = RelatedDocuments::default();
    let mut new_links = NewLinks::default();
    let mut twohops = Vec::new();

    for link in forward {
        if let Some(document) = &link.document {
            seen.insert(document.path.clone());
        }

        if let Some(group) = siblings_by_key.remove(&normalize_title(&link.dst_title)) {
            for document in &group {
                seen.insert(document.path.clone());
            }
            twohops.push(TwoHopGroup {
                src: link,
                links: group,
            });
            continue;
        }

        match link.document {
            Some(document) if !document.body.is_empty() => related.push(document),
            _ => new_links.push(link.dst_title),
        }
    }

    for document in backlinks {
        if seen.insert(document.path.clone()) {
            related.push(document);
        }
    }

    LinkPallet {
        new_links: new_links.titles,
        links: related.documents,
        twohops,
    }
}

#[derive(Default)]
struct RelatedDocuments {
    paths: HashSet<String>,
    documents: Vec<Document>,
}

impl RelatedDocuments {
    fn push(&mut self, document: Document) {
        if self.paths.insert(document.path.clone()) {
            self.documents.push(document);
        }
    }
}

#[derive(Default)]
struct NewLinks {
    keys: HashSet<String>,
    titles: Vec<String>,
}

impl NewLinks {
    fn push(&mut self, title: String) {
        if self.keys.insert(normalize_title(&title)) {
            self.titles.push(title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, title: &str, body: &str) -> Document {
        Document {
            path: path.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            visibility: Visibility::Public,
            created_at: "2026-02-22T00:00:00.000000000Z".to_string(),
            updated_at: "2026-02-22T00:00:00.000000000Z".to_string(),
            published_at: None,
        }
    }

    fn forward(title: &str, document: Option<Document>) -> ForwardLink {
        ForwardLink {
            dst_title: title.to_string(),
            document,
        }
    }

    fn sibling(key: &str, document: Document) -> SiblingLink {
        SiblingLink {
            dst_key: key.to_string(),
            document,
        }
    }

    fn paths(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.path.as_str()).collect()
    }

    #[test]
    fn shared_destination_becomes_two_hop_group() {
        let p = doc("p", "P", "[[X]]");
        let q = doc("q", "Q", "[[x]]");
        let pallet = assemble_pallet(
            "t",
            vec![forward("X", Some(doc("x", "X", "body")))],
            vec![p.clone()],
            vec![sibling("x", p), sibling("x", q)],
        );

        assert_eq!(pallet.twohops.len(), 1);
        assert_eq!(pallet.twohops[0].src.dst_title, "X");
        assert_eq!(paths(&pallet.twohops[0].links), vec!["p", "q"]);
        assert!(pallet.links.is_empty(), "siblings must not repeat as related");
        assert!(pallet.new_links.is_empty());
    }

    #[test]
    fn unresolved_or_empty_targets_are_new_link_candidates() {
        let pallet = assemble_pallet(
            "t",
            vec![
                forward("Ghost", None),
                forward("Stub", Some(doc("stub", "Stub", ""))),
                forward("ghost", None),
            ],
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(pallet.new_links, vec!["Ghost", "Stub"]);
        assert!(pallet.links.is_empty());
        assert!(pallet.twohops.is_empty());
    }

    #[test]
    fn forward_and_backlink_to_same_document_appear_once() {
        let r = doc("r", "R", "see [[T]]");
        let pallet = assemble_pallet(
            "t",
            vec![forward("R", Some(r.clone()))],
            vec![r],
            Vec::new(),
        );
        assert_eq!(paths(&pallet.links), vec!["r"]);
    }

    #[test]
    fn backlinks_fill_related_without_forward_links() {
        let pallet = assemble_pallet(
            "t",
            Vec::new(),
            vec![doc("a", "A", "[[T]]"), doc("b", "B", "[[T]]")],
            Vec::new(),
        );
        assert_eq!(paths(&pallet.links), vec!["a", "b"]);
        assert!(pallet.twohops.is_empty());
        assert!(pallet.new_links.is_empty());
    }

    #[test]
    fn target_never_listed_as_backlink() {
        let pallet = assemble_pallet("t", Vec::new(), vec![doc("t", "T", "x")], Vec::new());
        assert!(pallet.links.is_empty());
    }

    #[test]
    fn unresolved_anchor_with_siblings_groups_instead_of_new_link() {
        let b = doc("b", "Other", "[[FAQ]]");
        let pallet = assemble_pallet(
            "t",
            vec![forward("FAQ", None)],
            Vec::new(),
            vec![sibling("faq", b)],
        );
        assert!(pallet.new_links.is_empty());
        assert_eq!(pallet.twohops.len(), 1);
        assert!(pallet.twohops[0].src.document.is_none());
        assert_eq!(paths(&pallet.twohops[0].links), vec!["b"]);
    }

    #[test]
    fn sibling_backlink_is_suppressed_from_related() {
        let s = doc("s", "S", "[[X]] [[T]]");
        let pallet = assemble_pallet(
            "t",
            vec![forward("X", None)],
            vec![s.clone()],
            vec![sibling("x", s)],
        );
        assert!(pallet.links.is_empty());
        assert_eq!(pallet.twohops.len(), 1);
    }
}
