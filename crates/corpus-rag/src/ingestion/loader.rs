//! Corpus loading from a folder tree

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::{Error, Result};
use crate::types::Document;

/// Reads every file under a root folder as a text document.
///
/// Loading is fail-fast: the first unreadable entry or non-UTF-8 file
/// aborts the whole load, so an index is never built from a partial corpus.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    /// Root folder
    root: PathBuf,
    /// Lowercased extensions to keep (empty = all files)
    extensions: Vec<String>,
    /// Follow symbolic links
    follow_links: bool,
}

impl CorpusLoader {
    /// Create a loader for `root` that reads every file
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: Vec::new(),
            follow_links: false,
        }
    }

    /// Create a loader from configuration
    pub fn from_config(config: &CorpusConfig) -> Self {
        Self::new(&config.source_dir)
            .with_extensions(&config.extensions)
            .follow_links(config.follow_links)
    }

    /// Restrict loading to files with one of these extensions
    pub fn with_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Follow symbolic links while walking
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Root folder
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load all documents in traversal order
    pub fn load(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(Error::ingest(&self.root, "corpus folder does not exist"));
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                Error::ingest(path, e.to_string())
            })?;

            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }

            let path = entry.path();
            let content = std::fs::read_to_string(path).map_err(|e| Error::ingest(path, e.to_string()))?;

            tracing::debug!("Loaded {} ({} bytes)", path.display(), content.len());
            documents.push(Document::from_path(content, path));
        }

        tracing::info!("Loaded {} documents from {}", documents.len(), self.root.display());

        Ok(documents)
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .map_or(false, |ext| self.extensions.contains(&ext))
    }
}
