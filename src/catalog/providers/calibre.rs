//! Calibre local-library catalog provider.
//!
//! Reads a Calibre library's `metadata.db` directly with SQLite, opened
//! read-only so a concurrently running Calibre instance is never disturbed.
//! Covers come from the `cover.jpg` files Calibre keeps next to each book.
//!
//! Connections are opened per query, which is cheap for a local file and
//! avoids holding a rusqlite handle across awaits.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use loreforge_common::{CatalogRecord, CoverRef, CoverSource, Error, FieldValue, Result};

use crate::catalog::provider::CatalogProvider;

const SEARCH_SQL: &str = "\
    SELECT b.id, b.title, b.path, b.has_cover, b.pubdate,
           (SELECT GROUP_CONCAT(a.name, ' & ')
              FROM books_authors_link bal
              JOIN authors a ON a.id = bal.author
             WHERE bal.book = b.id) AS authors,
           (SELECT s.name
              FROM books_series_link bsl
              JOIN series s ON s.id = bsl.series
             WHERE bsl.book = b.id) AS series,
           (SELECT c.text
              FROM comments c
             WHERE c.book = b.id) AS comments
      FROM books b
     WHERE b.title LIKE ?1 ESCAPE '\\'
     ORDER BY b.sort
     LIMIT ?2";

const FETCH_SQL: &str = "\
    SELECT b.id, b.title, b.path, b.has_cover, b.pubdate,
           (SELECT GROUP_CONCAT(a.name, ' & ')
              FROM books_authors_link bal
              JOIN authors a ON a.id = bal.author
             WHERE bal.book = b.id) AS authors,
           (SELECT s.name
              FROM books_series_link bsl
              JOIN series s ON s.id = bsl.series
             WHERE bsl.book = b.id) AS series,
           (SELECT c.text
              FROM comments c
             WHERE c.book = b.id) AS comments
      FROM books b
     WHERE b.id = ?1";

/// One row out of Calibre's `books` table with its joined detail.
struct CalibreBook {
    id: i64,
    title: String,
    rel_path: String,
    has_cover: bool,
    pubdate: Option<String>,
    authors: Option<String>,
    series: Option<String>,
    comments: Option<String>,
}

/// Catalog provider backed by a local Calibre library.
pub struct CalibreProvider {
    library_path: PathBuf,
}

impl CalibreProvider {
    pub fn new(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.library_path.join("metadata.db")
    }

    fn open(&self) -> Result<Connection> {
        Connection::open_with_flags(
            self.db_path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::provider_unavailable("calibre", format!("cannot open library: {e}")))
    }

    fn to_record(&self, book: CalibreBook) -> CatalogRecord {
        let mut fields: BTreeMap<String, FieldValue> = BTreeMap::new();
        fields.insert("calibre_id".into(), FieldValue::Integer(book.id));

        if let Some(authors) = book.authors {
            fields.insert("author".into(), FieldValue::Text(authors));
        }
        if let Some(series) = book.series {
            fields.insert("series".into(), FieldValue::Text(series));
        }
        // Calibre stores pubdate as "YYYY-MM-DD HH:MM:SS+00:00"; keep the
        // date part.
        if let Some(pubdate) = book.pubdate {
            let date = pubdate
                .split_whitespace()
                .next()
                .unwrap_or(&pubdate)
                .to_string();
            if date.starts_with(|c: char| c.is_ascii_digit()) {
                fields.insert("release_date".into(), FieldValue::Text(date));
            }
        }

        let cover = if book.has_cover {
            Some(CoverRef::Path(
                self.library_path.join(&book.rel_path).join("cover.jpg"),
            ))
        } else {
            None
        };

        CatalogRecord {
            provider: "calibre".to_string(),
            external_id: book.id.to_string(),
            title: book.title,
            summary: book.comments.map(strip_html),
            cover,
            fields,
        }
    }
}

fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<CalibreBook> {
    Ok(CalibreBook {
        id: row.get(0)?,
        title: row.get(1)?,
        rel_path: row.get(2)?,
        has_cover: row.get(3)?,
        pubdate: row.get(4)?,
        authors: row.get(5)?,
        series: row.get(6)?,
        comments: row.get(7)?,
    })
}

/// Substring pattern for the title search, with `LIKE` wildcards in the
/// user's title escaped so they match literally.
fn like_pattern(title: &str) -> String {
    let mut escaped = String::with_capacity(title.len() + 2);
    escaped.push('%');
    for c in title.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Calibre comments are stored as HTML; strip tags for the plain-text
/// summary. Good enough for `<p>` / `<br>` markup, which is what Calibre
/// itself produces.
fn strip_html(html: String) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[async_trait]
impl CatalogProvider for CalibreProvider {
    fn name(&self) -> &'static str {
        "calibre"
    }

    fn is_available(&self) -> bool {
        self.db_path().is_file()
    }

    async fn search(&self, title: &str, limit: usize) -> Result<Vec<CatalogRecord>> {
        debug!(title, limit, "Calibre search");
        let conn = self.open()?;
        let pattern = like_pattern(title);

        let books = {
            let mut stmt = conn
                .prepare(SEARCH_SQL)
                .map_err(|e| Error::provider_unavailable("calibre", e.to_string()))?;
            let rows = stmt
                .query_map(rusqlite::params![pattern, limit as i64], row_to_book)
                .map_err(|e| Error::provider_unavailable("calibre", e.to_string()))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| Error::provider_unavailable("calibre", e.to_string()))?
        };

        Ok(books.into_iter().map(|b| self.to_record(b)).collect())
    }

    async fn fetch_by_id(&self, external_id: &str) -> Result<CatalogRecord> {
        let id: i64 = external_id
            .parse()
            .map_err(|_| Error::invalid_input(format!("not a Calibre book id: '{external_id}'")))?;

        let conn = self.open()?;
        let book = conn
            .query_row(FETCH_SQL, rusqlite::params![id], row_to_book)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    Error::invalid_input(format!("Calibre has no book with id {id}"))
                }
                e => Error::provider_unavailable("calibre", e.to_string()),
            })?;

        Ok(self.to_record(book))
    }

    fn resolve_cover(&self, cover: &CoverRef) -> Option<CoverSource> {
        match cover {
            CoverRef::Path(path) if path.is_file() => Some(CoverSource::File(path.clone())),
            _ => None,
        }
    }
}
