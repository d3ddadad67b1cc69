use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::endpoint_set::{EndpointSet, SourceLocation};
use crate::extractor::{LineIndex, extract_backend};
use crate::file_finder::{SourceFile, SourceIndex, clean_path};
use crate::imports::{ImportTable, is_identifier};
use crate::path_normalizer::{CanonicalPath, PathNormalizer};

/// `parent_file` attaches `child_file` under `mount_path`. `effective_prefix`
/// is the full prefix the child's routes are reachable under on this visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEdge {
    pub parent_file: PathBuf,
    pub mount_path: CanonicalPath,
    pub effective_prefix: CanonicalPath,
    pub child_file: PathBuf,
    pub line: usize,
}

/// A `<ident>.use('<path>', ..., target)` statement before import resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountStatement {
    pub mount_path: String,
    pub target: String,
    pub line: usize,
}

fn mount_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"[A-Za-z_$][A-Za-z0-9_$]*\s*\.\s*use\s*\(\s*(?:'([^'\n]*)'|"([^"\n]*)"|`([^`]*)`)\s*,"#,
        )
        .unwrap()
    })
}

/// Split call arguments at top-level commas, starting just after an opening
/// parenthesis or argument separator and stopping at the matching `)`.
///
/// Tracks `()[]{}` nesting and skips over string literals. Returns `None` if
/// the call is never closed or the brackets do not balance.
pub fn split_call_arguments(text: &str) -> Option<Vec<&str>> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut start = 0usize;

    for (idx, c) in text.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => in_string = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => {
                args.push(&text[start..idx]);
                return Some(args);
            }
            ')' | ']' | '}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                args.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    None
}

/// The module reference of a mount call: its last non-empty argument, if that
/// argument is a bare identifier. Anything else (calls, member access,
/// inline functions) is rejected rather than guessed at.
pub fn mount_target<'a>(args: &[&'a str]) -> Option<&'a str> {
    let last = args.iter().rev().map(|arg| arg.trim()).find(|arg| !arg.is_empty())?;
    is_identifier(last).then_some(last)
}

/// Every mount statement in `file` whose target is a bare identifier.
pub fn find_mount_statements(file: &SourceFile) -> Vec<MountStatement> {
    let lines = LineIndex::new(&file.content);
    let re = mount_call_regex();
    let mut statements = Vec::new();

    for caps in re.captures_iter(&file.content) {
        let Some(mount_path) = caps.get(1).or(caps.get(2)).or(caps.get(3)) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let line = lines.line_of(whole.start());

        let Some(args) = split_call_arguments(&file.content[whole.end()..]) else {
            debug!("{}:{}: unterminated use() call", file.path.display(), line);
            continue;
        };
        let Some(target) = mount_target(&args) else {
            debug!(
                "{}:{}: mount target is not a bare identifier, skipping",
                file.path.display(),
                line
            );
            continue;
        };

        statements.push(MountStatement {
            mount_path: mount_path.as_str().to_string(),
            target: target.to_string(),
            line,
        });
    }

    statements
}

/// Outcome of resolving the mount graph from one entry file.
#[derive(Debug, Clone, Default)]
pub struct MountResolution {
    /// Prefix-qualified backend endpoints.
    pub endpoints: EndpointSet,
    pub edges: Vec<MountEdge>,
    /// Number of `(prefix, file)` pairs traversed.
    pub visits: usize,
}

struct Visit {
    prefix: CanonicalPath,
    file: PathBuf,
    ancestors: Vec<PathBuf>,
}

/// Walks router mounts breadth-first from an entry file, attributing each
/// reachable file's routes to the prefix it is mounted under.
///
/// A file mounted under two prefixes is visited once per prefix. A file is
/// never re-entered from one of its own descendants, so cyclic mounts
/// terminate. All traversal state lives in this call.
pub struct MountGraphResolver<'a> {
    sources: &'a SourceIndex,
    normalizer: &'a PathNormalizer,
}

impl<'a> MountGraphResolver<'a> {
    pub fn new(sources: &'a SourceIndex, normalizer: &'a PathNormalizer) -> Self {
        Self {
            sources,
            normalizer,
        }
    }

    pub fn resolve(&self, entry_file: &Path) -> MountResolution {
        let mut resolution = MountResolution::default();
        let Some(root) = self.normalizer.normalize("/") else {
            return resolution;
        };

        let mut queue = VecDeque::from([Visit {
            prefix: root,
            file: clean_path(entry_file),
            ancestors: Vec::new(),
        }]);
        let mut visited: HashSet<(CanonicalPath, PathBuf)> = HashSet::new();

        while let Some(visit) = queue.pop_front() {
            if !visited.insert((visit.prefix.clone(), visit.file.clone())) {
                continue;
            }
            let Some(source) = self.sources.load(&visit.file) else {
                warn!(
                    "Mount graph: cannot read {}, skipping",
                    visit.file.display()
                );
                continue;
            };
            resolution.visits += 1;
            debug!(
                "Mount graph: visiting {} under {}",
                visit.file.display(),
                visit.prefix
            );

            for raw in extract_backend(&source) {
                if let Some(path) = self.normalizer.join(visit.prefix.as_str(), &raw.raw_path) {
                    resolution
                        .endpoints
                        .insert(path, raw.http_method, Some(SourceLocation::of(&raw)));
                }
            }

            let imports = ImportTable::build(&source);
            for statement in find_mount_statements(&source) {
                let Some(child) = imports.resolve(&statement.target) else {
                    debug!(
                        "Mount graph: {} is not a local import of {}",
                        statement.target,
                        visit.file.display()
                    );
                    continue;
                };
                let child = child.to_path_buf();
                if child == visit.file || visit.ancestors.contains(&child) {
                    debug!("Mount graph: cyclic mount of {}", child.display());
                    continue;
                }
                let (Some(mount_path), Some(child_prefix)) = (
                    self.normalizer.normalize(&statement.mount_path),
                    self.normalizer
                        .join(visit.prefix.as_str(), &statement.mount_path),
                ) else {
                    continue;
                };

                resolution.edges.push(MountEdge {
                    parent_file: visit.file.clone(),
                    mount_path,
                    effective_prefix: child_prefix.clone(),
                    child_file: child.clone(),
                    line: statement.line,
                });

                let mut ancestors = visit.ancestors.clone();
                ancestors.push(visit.file.clone());
                queue.push_back(Visit {
                    prefix: child_prefix,
                    file: child,
                    ancestors,
                });
            }
        }

        resolution
    }
}
