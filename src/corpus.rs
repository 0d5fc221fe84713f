//! Discovery of prose files under a corpus root.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::error::Result;

/// Directories that never hold documentation worth linking.
const SKIPPED_DIRS: [&str; 6] = ["node_modules", ".git", "target", "vendor", "venv", "__pycache__"];

/// A prose file found in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the root, `/`-separated. Stable across platforms.
    pub id: String,
    pub path: PathBuf,
}

pub struct CorpusWalker {
    root: PathBuf,
    extensions: HashSet<String>,
    excludes: GlobSet,
}

impl CorpusWalker {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String], exclude: &[String]) -> Result<Self> {
        let extensions = extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in exclude {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            root: root.into(),
            extensions,
            excludes: builder.build()?,
        })
    }

    /// Every matching file, sorted by id.
    pub fn files(&self) -> Result<Vec<SourceFile>> {
        let mut builder = WalkBuilder::new(&self.root);
        builder.hidden(true).git_ignore(true).git_global(true);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();

            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .unwrap_or_default();
            if !self.extensions.contains(&ext) {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let id = document_id(relative);
            if self.is_excluded(relative, &id) {
                continue;
            }

            files.push(SourceFile {
                id,
                path: path.to_path_buf(),
            });
        }

        files.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(files)
    }

    fn is_excluded(&self, relative: &Path, id: &str) -> bool {
        let in_skipped_dir = relative.components().any(|c| match c {
            Component::Normal(name) => SKIPPED_DIRS.iter().any(|d| name == *d),
            _ => false,
        });
        in_skipped_dir || self.excludes.is_match(id)
    }
}

/// `/`-joined normal components of a root-relative path.
pub fn document_id(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
