use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// One scanned file. Never modified after the scan.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Read a single file, logging and returning `None` if it cannot be read.
pub fn read_source(path: &Path) -> Option<SourceFile> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(SourceFile::new(clean_path(path), content)),
        Err(e) => {
            warn!("Skipping unreadable file {}: {}", path.display(), e);
            None
        }
    }
}

/// Find and read every file under `root` whose extension is in `extensions`,
/// skipping any directory named in `ignore_dirs`.
///
/// The walk keeps its own stack, so deep trees cannot overflow the call stack.
/// Unreadable files and directories are skipped with a warning. Output order
/// is whatever the walk produces.
pub fn find_files(root: &Path, extensions: &[String], ignore_dirs: &[String]) -> Vec<SourceFile> {
    let root = absolute_clean(root);
    let mut files = Vec::new();

    let walker = WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !ignore_dirs
                    .iter()
                    .any(|ignored| entry.file_name().to_string_lossy() == ignored.as_str())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let matches_extension = path.extension().is_some_and(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(&ext))
        });
        if !matches_extension {
            continue;
        }

        if let Some(file) = read_source(path) {
            files.push(file);
        }
    }

    debug!("Scanned {} files under {}", files.len(), root.display());
    files
}

/// Lexically remove `.` and `..` components. Does not touch the filesystem.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Absolute, lexically cleaned form of `path`.
pub fn absolute_clean(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    clean_path(&absolute)
}

/// Scanned files keyed by cleaned path, with on-demand reads for files the
/// scan did not cover.
#[derive(Debug, Default)]
pub struct SourceIndex {
    files: HashMap<PathBuf, SourceFile>,
}

impl SourceIndex {
    pub fn new(files: impl IntoIterator<Item = SourceFile>) -> Self {
        let files = files
            .into_iter()
            .map(|file| (clean_path(&file.path), file))
            .collect();
        Self { files }
    }

    pub fn get(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(&clean_path(path))
    }

    /// Indexed file if present, otherwise read it from disk.
    pub fn load(&self, path: &Path) -> Option<Cow<'_, SourceFile>> {
        match self.get(path) {
            Some(file) => Some(Cow::Borrowed(file)),
            None => read_source(path).map(Cow::Owned),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }
}
