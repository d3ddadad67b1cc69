use std::path::Path;

use crate::analyzer::DiffEntry;
use crate::engine::AlignmentReport;
use crate::error::Result;

pub struct FormattedOutput {
    pub content: String,
}

impl FormattedOutput {
    /// Markdown report, with file paths shown relative to `base` when they
    /// live under it.
    pub fn markdown(report: &AlignmentReport, base: Option<&Path>) -> Self {
        Self {
            content: format_markdown(report, base),
        }
    }

    pub fn json(report: &AlignmentReport) -> Result<Self> {
        Ok(Self {
            content: serde_json::to_string_pretty(report)?,
        })
    }
}

fn display_path(path: &Path, base: Option<&Path>) -> String {
    base.and_then(|base| path.strip_prefix(base).ok())
        .unwrap_or(path)
        .display()
        .to_string()
}

pub fn format_markdown(report: &AlignmentReport, base: Option<&Path>) -> String {
    let stats = &report.stats;
    let mut output = String::new();

    output.push_str("# Endpoint Alignment Report\n\n");
    output.push_str(&format!(
        "Generated {}.\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str("## Summary\n\n");
    output.push_str("| | Count |\n|---|---:|\n");
    let rows = [
        ("Backend files scanned", stats.backend_files),
        ("Frontend files scanned", stats.frontend_files),
        ("Backend route sites", stats.backend_sites),
        ("Backend paths (flat scan)", stats.flat_backend_paths),
        ("Backend paths (mount graph)", stats.mounted_backend_paths),
        ("Backend paths (merged)", stats.backend_paths),
        ("Mount edges", stats.mount_edges),
        ("Frontend API call sites", stats.frontend_call_sites),
        ("Frontend API paths", stats.frontend_call_paths),
        ("Navigation sites", stats.navigation_sites),
        ("Navigation paths", stats.navigation_paths),
        ("Frontend routes", stats.frontend_routes),
        ("Unmatched API paths", report.unmatched_api_calls.len()),
        ("Unmatched navigation targets", report.unmatched_navigation.len()),
    ];
    for (label, count) in rows {
        output.push_str(&format!("| {} | {} |\n", label, count));
    }
    output.push('\n');

    output.push_str(&format!(
        "Backend: `{}` (entry `{}`)  \nFrontend: `{}`\n\n",
        display_path(&report.backend_root, base),
        display_path(&report.entry_file, base),
        display_path(&report.frontend_root, base)
    ));

    output.push_str("## Frontend API calls without a backend route\n\n");
    output.push_str(&format_entries(&report.unmatched_api_calls, base));

    output.push_str("## Navigation targets missing from the route table\n\n");
    output.push_str(&format_entries(&report.unmatched_navigation, base));

    if !report.mount_edges.is_empty() {
        output.push_str("## Resolved router mounts\n\n");
        for edge in &report.mount_edges {
            output.push_str(&format!(
                "- `{}` mounted at `{}` (full prefix `{}`) from {}:{}\n",
                display_path(&edge.child_file, base),
                edge.mount_path,
                edge.effective_prefix,
                display_path(&edge.parent_file, base),
                edge.line
            ));
        }
        output.push('\n');
    }

    output
}

fn format_entries(entries: &[DiffEntry], base: Option<&Path>) -> String {
    if entries.is_empty() {
        return "None found.\n\n".to_string();
    }

    let mut output = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let methods = if entry.methods.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = entry.methods.iter().map(|m| m.as_str()).collect();
            format!(" ({})", names.join(", "))
        };
        output.push_str(&format!(
            "{}. `{}`{}\n",
            i + 1,
            entry.canonical_path,
            methods
        ));

        for reference in &entry.references {
            output.push_str(&format!(
                "   - {}:{}\n",
                display_path(&reference.file, base),
                reference.line
            ));
        }

        if entry.suggestions.is_empty() {
            output.push_str("   - Suggestions: none\n");
        } else {
            let suggestions: Vec<String> = entry
                .suggestions
                .iter()
                .map(|s| format!("`{}`", s))
                .collect();
            output.push_str(&format!("   - Suggestions: {}\n", suggestions.join(", ")));
        }
    }
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint_set::SourceLocation;
    use crate::engine::ScanStats;
    use crate::extractor::HttpMethod;
    use crate::mount_graph::MountEdge;
    use crate::path_normalizer::PathNormalizer;
    use chrono::Utc;
    use std::path::PathBuf;

    fn report() -> AlignmentReport {
        let normalizer = PathNormalizer::default();
        AlignmentReport {
            generated_at: Utc::now(),
            backend_root: PathBuf::from("/repo/server/src"),
            frontend_root: PathBuf::from("/repo/client/src"),
            entry_file: PathBuf::from("/repo/server/src/routes/index.ts"),
            stats: ScanStats {
                backend_files: 4,
                frontend_files: 7,
                ..ScanStats::default()
            },
            mount_edges: Vec::new(),
            unmatched_api_calls: vec![DiffEntry {
                canonical_path: normalizer.normalize("/task").unwrap(),
                methods: vec![HttpMethod::Get],
                referencing_files: vec![PathBuf::from("/repo/client/src/api/task.ts")],
                references: vec![SourceLocation {
                    file: PathBuf::from("/repo/client/src/api/task.ts"),
                    line: 12,
                }],
                suggestions: vec![normalizer.normalize("/tasks").unwrap()],
            }],
            unmatched_navigation: Vec::new(),
        }
    }

    #[test]
    fn test_markdown_lists_entries_with_provenance() {
        let output = format_markdown(&report(), Some(Path::new("/repo")));

        assert!(output.contains("| Backend files scanned | 4 |"));
        assert!(output.contains("| Unmatched API paths | 1 |"));
        assert!(output.contains("1. `/task` (GET)"));
        assert!(output.contains("   - client/src/api/task.ts:12"));
        assert!(output.contains("   - Suggestions: `/tasks`"));
        assert!(output.contains("## Navigation targets missing from the route table\n\nNone found."));
        assert!(!output.contains("Resolved router mounts"));
    }

    #[test]
    fn test_markdown_lines_and_mount_appendix() {
        let normalizer = PathNormalizer::default();
        let mut report = report();
        report.mount_edges = vec![MountEdge {
            parent_file: PathBuf::from("/repo/server/src/routes/index.ts"),
            mount_path: normalizer.normalize("/tasks").unwrap(),
            effective_prefix: normalizer.normalize("/tasks").unwrap(),
            child_file: PathBuf::from("/repo/server/src/routes/tasks.ts"),
            line: 4,
        }];

        let output = format_markdown(&report, Some(Path::new("/repo")));

        assert!(output.contains(
            "Backend: `server/src` (entry `server/src/routes/index.ts`)  \nFrontend: `client/src`\n\n"
        ));
        assert!(output.contains(
            "1. `/task` (GET)\n   - client/src/api/task.ts:12\n   - Suggestions: `/tasks`\n\n"
        ));
        assert!(output.contains(
            "## Resolved router mounts\n\n- `server/src/routes/tasks.ts` mounted at `/tasks` (full prefix `/tasks`) from server/src/routes/index.ts:4\n"
        ));
        assert!(output.lines().any(|line| line.starts_with("Generated ")));
    }

    #[test]
    fn test_json_round_trips_report_fields() {
        let output = FormattedOutput::json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output.content).unwrap();

        assert_eq!(value["stats"]["frontendFiles"], 7);
        assert_eq!(value["unmatchedApiCalls"][0]["canonicalPath"], "/task");
        assert_eq!(value["unmatchedApiCalls"][0]["methods"][0], "GET");
        assert_eq!(value["unmatchedApiCalls"][0]["suggestions"][0], "/tasks");
    }
}
