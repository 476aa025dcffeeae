//! Document store abstraction and its filesystem implementation.
//!
//! A vault is a directory tree of markdown documents with structured
//! headers. The orchestrator only talks to the [`VaultStore`] trait so tests
//! can substitute an in-memory store, and a future remote vault transport
//! can slot in behind the same seam.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use loreforge_common::{Error, Result, Slug};

use crate::frontmatter::{self, Frontmatter};

/// A parsed vault document: structured header plus markdown body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Document {
    /// Parse a document from its on-disk text.
    ///
    /// Text without a leading `---` fence is treated as all body with an
    /// empty header. Windows-edited notes arrive with CRLF endings; those
    /// are normalized to LF before fence matching so the header is still
    /// recognized.
    pub fn from_text(text: &str) -> Self {
        let normalized;
        let text = if text.contains("\r\n") {
            normalized = text.replace("\r\n", "\n");
            normalized.as_str()
        } else {
            text
        };
        let Some(rest) = text.strip_prefix("---\n") else {
            return Self {
                frontmatter: Frontmatter::new(),
                body: text.to_string(),
            };
        };
        if let Some(body) = rest.strip_prefix("---\n") {
            return Self {
                frontmatter: Frontmatter::new(),
                body: body.trim_start_matches('\n').to_string(),
            };
        }
        let Some((header, body)) = rest.split_once("\n---\n") else {
            return Self {
                frontmatter: Frontmatter::new(),
                body: text.to_string(),
            };
        };
        Self {
            frontmatter: frontmatter::parse(header),
            body: body.trim_start_matches('\n').to_string(),
        }
    }

    /// Render the document to its on-disk text.
    pub fn to_text(&self) -> String {
        format!(
            "---\n{}---\n\n{}",
            frontmatter::render(&self.frontmatter),
            self.body
        )
    }
}

/// Capability contract for the document store.
///
/// Paths are vault-relative, forward-slash strings (`Gaming/Games/x.md`).
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Read a document, `None` if it does not exist.
    async fn read(&self, path: &str) -> Result<Option<Document>>;

    /// Write a document, creating parent directories as needed. Failure is
    /// [`Error::Persistence`].
    async fn write(&self, path: &str, document: &Document) -> Result<()>;

    /// Find the path of an existing document whose file stem equals `slug`.
    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<String>>;
}

/// Filesystem vault rooted at a directory.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl VaultStore for FsVault {
    async fn read(&self, path: &str) -> Result<Option<Document>> {
        let full = self.absolute(path);
        match std::fs::read_to_string(&full) {
            Ok(text) => Ok(Some(Document::from_text(&text))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::persistence(path, e.to_string())),
        }
    }

    async fn write(&self, path: &str, document: &Document) -> Result<()> {
        let full = self.absolute(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::persistence(path, e.to_string()))?;
        }
        std::fs::write(&full, document.to_text())
            .map_err(|e| Error::persistence(path, e.to_string()))?;
        debug!(path, "wrote document");
        Ok(())
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<String>> {
        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            if path.file_stem().and_then(|s| s.to_str()) == Some(slug.as_str()) {
                let relative = path
                    .strip_prefix(&self.root)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .replace('\\', "/");
                return Ok(Some(relative));
            }
        }
        Ok(None)
    }
}
