//! Per-file import tables.
//!
//! Maps each local binding introduced by an `import` or `require` of a
//! relative specifier to the file it resolves to. Package imports never
//! resolve and are left out.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::file_finder::{SourceFile, clean_path};

/// Extensions tried, in order, when a specifier has none that resolves.
pub const RESOLVE_EXTENSIONS: [&str; 4] = ["ts", "js", "cjs", "mjs"];

fn es_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*import\s+(?:type\s+)?([^;'"]+?)\s+from\s+['"]([^'"]+)['"]"#).unwrap()
    })
}

fn require_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\b(?:const|let|var|import)\s+([A-Za-z_$][A-Za-z0-9_$]*|\{[^}]*\})\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        )
        .unwrap()
    })
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap())
}

pub fn is_identifier(token: &str) -> bool {
    identifier_regex().is_match(token)
}

/// `localIdentifier → resolved file` for one source file.
#[derive(Debug, Default, Clone)]
pub struct ImportTable {
    entries: HashMap<String, PathBuf>,
}

impl ImportTable {
    pub fn build(file: &SourceFile) -> Self {
        let mut table = ImportTable::default();

        for caps in es_import_regex().captures_iter(&file.content) {
            table.add_bindings(&file.path, &caps[2], es_import_bindings(&caps[1]));
        }
        for caps in require_regex().captures_iter(&file.content) {
            table.add_bindings(&file.path, &caps[2], require_bindings(&caps[1]));
        }

        debug!(
            "Import table for {}: {} local bindings",
            file.path.display(),
            table.entries.len()
        );
        table
    }

    fn add_bindings(&mut self, from_file: &Path, specifier: &str, names: Vec<String>) {
        if names.is_empty() {
            return;
        }
        let Some(target) = resolve_import(from_file, specifier) else {
            return;
        };
        for name in names {
            self.entries.insert(name, target.clone());
        }
    }

    pub fn resolve(&self, identifier: &str) -> Option<&Path> {
        self.entries.get(identifier).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Local names bound by an ES import clause such as
/// `Default, { a, b as c }` or `* as ns`.
fn es_import_bindings(clause: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut outside_braces = clause.to_string();

    if let (Some(open), Some(close)) = (clause.find('{'), clause.rfind('}')) {
        if open < close {
            for binding in clause[open + 1..close].split(',') {
                let binding = binding.trim();
                let binding = binding.strip_prefix("type ").unwrap_or(binding).trim();
                let local = binding.rsplit(" as ").next().unwrap_or(binding).trim();
                if is_identifier(local) {
                    names.push(local.to_string());
                }
            }
            outside_braces = format!("{}{}", &clause[..open], &clause[close + 1..]);
        }
    }

    for part in outside_braces.split(',') {
        let part = part.trim();
        let local = match part.strip_prefix('*') {
            Some(rest) => rest.trim().strip_prefix("as").unwrap_or("").trim(),
            None => part,
        };
        if is_identifier(local) {
            names.push(local.to_string());
        }
    }

    names
}

/// Local names bound by `const X = require(...)` or
/// `const { a, b: c } = require(...)`.
fn require_bindings(binding: &str) -> Vec<String> {
    let binding = binding.trim();
    let Some(inner) = binding
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return if is_identifier(binding) {
            vec![binding.to_string()]
        } else {
            Vec::new()
        };
    };

    inner
        .split(',')
        .filter_map(|binding| {
            let local = binding.rsplit(':').next().unwrap_or(binding);
            let local = local.split('=').next().unwrap_or(local).trim();
            is_identifier(local).then(|| local.to_string())
        })
        .collect()
}

/// Resolve a relative import specifier from `from_file`.
///
/// Tries the literal path, then the path with each of
/// [`RESOLVE_EXTENSIONS`] appended, then `index.<ext>` inside it. The first
/// regular file wins. Returns `None` for non-relative specifiers and for
/// anything that does not exist.
pub fn resolve_import(from_file: &Path, specifier: &str) -> Option<PathBuf> {
    let is_relative = specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../");
    if !is_relative {
        return None;
    }

    let base = clean_path(&from_file.parent()?.join(specifier));

    let with_extensions = RESOLVE_EXTENSIONS.iter().map(|ext| {
        let mut name = OsString::from(base.as_os_str());
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    });
    let as_directory = RESOLVE_EXTENSIONS
        .iter()
        .map(|ext| base.join(format!("index.{}", ext)));

    std::iter::once(base.clone())
        .chain(with_extensions)
        .chain(as_directory)
        .find(|candidate| candidate.is_file())
}
