use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::endpoint_set::{EndpointSet, SourceLocation};
use crate::extractor::HttpMethod;
use crate::path_normalizer::CanonicalPath;
use crate::suggest::suggest;

/// A referenced path with no counterpart in the candidate set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub canonical_path: CanonicalPath,
    /// Methods the references used. Informational only.
    pub methods: Vec<HttpMethod>,
    /// Sorted, deduplicated.
    pub referencing_files: Vec<PathBuf>,
    /// Every `file:line` site, sorted.
    pub references: Vec<SourceLocation>,
    pub suggestions: Vec<CanonicalPath>,
}

/// Every path in `referenced` that `available` lacks, in path order.
///
/// Methods are not compared: a path counts as matched if it exists at all.
pub fn diff(referenced: &EndpointSet, available: &EndpointSet) -> Vec<DiffEntry> {
    referenced
        .iter()
        .filter(|(path, _)| !available.contains(path))
        .map(|(path, entry)| {
            let referencing_files: BTreeSet<PathBuf> =
                entry.sites.iter().map(|site| site.file.clone()).collect();

            DiffEntry {
                canonical_path: path.clone(),
                methods: entry.methods.iter().copied().collect(),
                referencing_files: referencing_files.into_iter().collect(),
                references: entry.sites.iter().cloned().collect(),
                suggestions: Vec::new(),
            }
        })
        .collect()
}

/// [`diff`], with up to `limit` suggestions from `available` on each entry.
pub fn diff_with_suggestions(
    referenced: &EndpointSet,
    available: &EndpointSet,
    limit: usize,
) -> Vec<DiffEntry> {
    let mut entries = diff(referenced, available);
    for entry in &mut entries {
        entry.suggestions = suggest(&entry.canonical_path, available.paths(), limit);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::RawEndpoint;
    use crate::path_normalizer::PathNormalizer;

    fn raw(method: Option<HttpMethod>, path: &str, file: &str, line: usize) -> RawEndpoint {
        RawEndpoint {
            http_method: method,
            raw_path: path.to_string(),
            source_file: PathBuf::from(file),
            line,
        }
    }

    #[test]
    fn test_only_unmatched_paths_are_reported() {
        let normalizer = PathNormalizer::default();
        let frontend = EndpointSet::from_raw(
            &normalizer,
            &[
                raw(Some(HttpMethod::Get), "/api/tasks", "b.ts", 4),
                raw(Some(HttpMethod::Get), "/api/users/${id}", "a.ts", 2),
            ],
        );
        let backend = EndpointSet::from_raw(
            &normalizer,
            &[raw(Some(HttpMethod::Get), "/users/:id", "server.ts", 10)],
        );

        let entries = diff(&frontend, &backend);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].canonical_path.as_str(), "/tasks");
        assert!(entries[0].suggestions.is_empty());
    }

    #[test]
    fn test_methods_do_not_gate_matching() {
        let normalizer = PathNormalizer::default();
        let frontend = EndpointSet::from_raw(
            &normalizer,
            &[raw(Some(HttpMethod::Delete), "/users/1", "a.ts", 1)],
        );
        let backend = EndpointSet::from_raw(
            &normalizer,
            &[raw(Some(HttpMethod::Get), "/users/1", "server.ts", 1)],
        );
        assert!(diff(&frontend, &backend).is_empty());
    }

    #[test]
    fn test_referencing_files_sorted_and_deduplicated() {
        let normalizer = PathNormalizer::default();
        let frontend = EndpointSet::from_raw(
            &normalizer,
            &[
                raw(Some(HttpMethod::Post), "/orders", "src/z.ts", 8),
                raw(Some(HttpMethod::Get), "/orders", "src/a.ts", 3),
                raw(None, "/orders?page=2", "src/z.ts", 1),
            ],
        );
        let entries = diff(&frontend, &EndpointSet::new());

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(
            entry.referencing_files,
            vec![PathBuf::from("src/a.ts"), PathBuf::from("src/z.ts")]
        );
        assert_eq!(entry.references.len(), 3);
        assert_eq!(entry.references[0].file, PathBuf::from("src/a.ts"));
        assert_eq!(entry.methods, vec![HttpMethod::Get, HttpMethod::Post]);
    }

    #[test]
    fn test_suggestions_attached() {
        let normalizer = PathNormalizer::default();
        let frontend: EndpointSet = ["/task"].iter().filter_map(|p| normalizer.normalize(p)).collect();
        let backend: EndpointSet = ["/tasks", "/user-tasks", "/completely-unrelated"]
            .iter()
            .filter_map(|p| normalizer.normalize(p))
            .collect();

        let entries = diff_with_suggestions(&frontend, &backend, 3);
        assert_eq!(entries.len(), 1);
        let suggested: Vec<&str> = entries[0].suggestions.iter().map(|p| p.as_str()).collect();
        assert_eq!(suggested, vec!["/tasks", "/user-tasks"]);
    }
}
