use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analyzer::{DiffEntry, diff_with_suggestions};
use crate::config::Config;
use crate::endpoint_set::EndpointSet;
use crate::extractor::{
    RawEndpoint, extract_backend, extract_frontend_calls, extract_frontend_nav,
    extract_frontend_routes,
};
use crate::file_finder::{SourceFile, SourceIndex, absolute_clean, find_files};
use crate::mount_graph::{MountEdge, MountGraphResolver, MountResolution};
use crate::path_normalizer::PathNormalizer;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub backend_files: usize,
    pub frontend_files: usize,
    /// Route registration sites found by the flat scan.
    pub backend_sites: usize,
    /// Distinct backend paths from the flat scan alone.
    pub flat_backend_paths: usize,
    /// Distinct prefix-qualified paths from the mount graph alone.
    pub mounted_backend_paths: usize,
    /// Distinct backend paths after merging both.
    pub backend_paths: usize,
    pub mount_edges: usize,
    pub frontend_call_sites: usize,
    pub frontend_call_paths: usize,
    pub navigation_sites: usize,
    pub navigation_paths: usize,
    pub frontend_routes: usize,
}

/// Everything the report renderers need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    pub generated_at: DateTime<Utc>,
    pub backend_root: PathBuf,
    pub frontend_root: PathBuf,
    pub entry_file: PathBuf,
    pub stats: ScanStats,
    pub mount_edges: Vec<MountEdge>,
    /// Frontend API paths with no backend route.
    pub unmatched_api_calls: Vec<DiffEntry>,
    /// Navigation targets missing from the frontend route table.
    pub unmatched_navigation: Vec<DiffEntry>,
}

/// Scan both trees named by `config` and compare them.
pub fn run_alignment(config: &Config) -> AlignmentReport {
    info!(
        "Scanning backend {} and frontend {}",
        config.backend_root.display(),
        config.frontend_root.display()
    );
    let backend_files = find_files(
        &config.backend_root,
        &config.backend_extensions,
        &config.ignore_dirs,
    );
    let frontend_files = find_files(
        &config.frontend_root,
        &config.frontend_extensions,
        &config.ignore_dirs,
    );

    analyze_sources(backend_files, frontend_files, config)
}

/// Compare already-read sources. `config` supplies the roots, entry file,
/// normalization prefixes, route-table directories and suggestion limit.
pub fn analyze_sources(
    backend_files: Vec<SourceFile>,
    frontend_files: Vec<SourceFile>,
    config: &Config,
) -> AlignmentReport {
    let normalizer = PathNormalizer::from_config(config);
    let backend_root = absolute_clean(&config.backend_root);
    let frontend_root = absolute_clean(&config.frontend_root);
    let entry_file = absolute_clean(&config.entry_file);

    let backend = SourceIndex::new(backend_files);
    if backend.is_empty() {
        warn!("No backend files found under {}", backend_root.display());
    }
    let mut stats = ScanStats {
        backend_files: backend.len(),
        frontend_files: frontend_files.len(),
        ..ScanStats::default()
    };

    // 1. Flat scan of every backend file
    let backend_sites: Vec<RawEndpoint> = backend.iter().flat_map(extract_backend).collect();
    let mut backend_endpoints = EndpointSet::from_raw(&normalizer, &backend_sites);
    stats.backend_sites = backend_sites.len();
    stats.flat_backend_paths = backend_endpoints.len();

    // 2. Prefix-aware resolution from the entry file, merged with the flat scan
    let resolution = if backend.get(&entry_file).is_some() || entry_file.is_file() {
        MountGraphResolver::new(&backend, &normalizer).resolve(&entry_file)
    } else {
        warn!(
            "Entry file {} not found, using the flat backend scan only",
            entry_file.display()
        );
        MountResolution::default()
    };
    stats.mounted_backend_paths = resolution.endpoints.len();
    stats.mount_edges = resolution.edges.len();
    backend_endpoints.union(resolution.endpoints);
    stats.backend_paths = backend_endpoints.len();
    info!(
        "Backend: {} paths ({} flat, {} via {} mount edges)",
        stats.backend_paths,
        stats.flat_backend_paths,
        stats.mounted_backend_paths,
        stats.mount_edges
    );

    // 3. Frontend calls, navigation targets and route table
    let call_sites: Vec<RawEndpoint> = frontend_files
        .iter()
        .flat_map(extract_frontend_calls)
        .collect();
    let nav_sites: Vec<RawEndpoint> = frontend_files
        .iter()
        .flat_map(extract_frontend_nav)
        .collect();
    let route_sites: Vec<RawEndpoint> =
        route_table_files(&frontend_files, &frontend_root, &config.route_table_dirs)
            .into_iter()
            .flat_map(extract_frontend_routes)
            .collect();

    let frontend_calls = EndpointSet::from_raw(&normalizer, &call_sites);
    let navigation = EndpointSet::from_raw(&normalizer, &nav_sites);
    let frontend_routes = EndpointSet::from_raw(&normalizer, &route_sites);

    stats.frontend_call_sites = call_sites.len();
    stats.frontend_call_paths = frontend_calls.len();
    stats.navigation_sites = nav_sites.len();
    stats.navigation_paths = navigation.len();
    stats.frontend_routes = frontend_routes.len();

    // 4. Diff each reference set against its candidates
    let unmatched_api_calls =
        diff_with_suggestions(&frontend_calls, &backend_endpoints, config.suggestion_limit);
    let unmatched_navigation =
        diff_with_suggestions(&navigation, &frontend_routes, config.suggestion_limit);
    info!(
        "{} unmatched API paths, {} unmatched navigation targets",
        unmatched_api_calls.len(),
        unmatched_navigation.len()
    );

    AlignmentReport {
        generated_at: Utc::now(),
        backend_root,
        frontend_root,
        entry_file,
        stats,
        mount_edges: resolution.edges,
        unmatched_api_calls,
        unmatched_navigation,
    }
}

/// Files living under one of `dirs` (relative to `root`). Falls back to every
/// file when none do, so projects without a router directory still get a
/// route table.
fn route_table_files<'a>(
    files: &'a [SourceFile],
    root: &Path,
    dirs: &[String],
) -> Vec<&'a SourceFile> {
    let in_route_dir = |file: &SourceFile| {
        let relative = file.path.strip_prefix(root).unwrap_or(&file.path);
        relative.components().any(|component| {
            matches!(
                component,
                Component::Normal(name) if dirs.iter().any(|dir| name == dir.as_str())
            )
        })
    };

    let selected: Vec<&SourceFile> = files.iter().filter(|file| in_route_dir(file)).collect();
    if selected.is_empty() {
        files.iter().collect()
    } else {
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            backend_root: PathBuf::from("/srv/server/src"),
            frontend_root: PathBuf::from("/srv/client/src"),
            entry_file: PathBuf::from("/srv/server/src/routes/index.ts"),
            ..Config::default()
        }
    }

    #[test]
    fn test_route_table_files_prefers_router_dirs() {
        let files = vec![
            SourceFile::new("/srv/client/src/router/index.ts", "{ path: '/a' }"),
            SourceFile::new("/srv/client/src/pages/A.vue", "router.push({ path: '/b' })"),
        ];
        let root = PathBuf::from("/srv/client/src");
        let dirs = Config::default().route_table_dirs;

        let selected = route_table_files(&files, &root, &dirs);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path, PathBuf::from("/srv/client/src/router/index.ts"));

        let fallback = route_table_files(&files[1..], &root, &dirs);
        assert_eq!(fallback.len(), 1);
    }

    #[test]
    fn test_navigation_to_nested_child_route_is_matched() {
        let frontend = vec![
            SourceFile::new(
                "/srv/client/src/router/index.ts",
                "export default [{ path: '/mobile/centers', children: [{ path: 'activity-center' }] }]\n",
            ),
            SourceFile::new(
                "/srv/client/src/pages/Home.vue",
                "router.push('/mobile/centers/activity-center')\nrouter.push('/mobile/centers/missing')\n",
            ),
        ];

        let report = analyze_sources(Vec::new(), frontend, &config());

        assert_eq!(report.stats.frontend_routes, 2);
        let nav: Vec<&str> = report
            .unmatched_navigation
            .iter()
            .map(|e| e.canonical_path.as_str())
            .collect();
        assert_eq!(nav, vec!["/mobile/centers/missing"]);
    }

    #[test]
    fn test_analyze_in_memory_sources_without_entry_file() {
        let backend = vec![SourceFile::new(
            "/srv/server/src/routes/tasks.ts",
            "router.get('/tasks', list);\nrouter.get('/tasks/:id', show);\n",
        )];
        let frontend = vec![
            SourceFile::new(
                "/srv/client/src/api/tasks.ts",
                "request.get('/api/tasks')\nrequest.get(`/api/tasks/${id}`)\nrequest.get('/api/task-stats')\n",
            ),
            SourceFile::new(
                "/srv/client/src/router/index.ts",
                "export default [{ path: '/tasks', component: Tasks }]\n",
            ),
            SourceFile::new(
                "/srv/client/src/pages/Home.vue",
                "router.push('/tasks')\nrouter.push('/reports')\n",
            ),
        ];

        let report = analyze_sources(backend, frontend, &config());

        assert_eq!(report.stats.backend_files, 1);
        assert_eq!(report.stats.frontend_files, 3);
        assert_eq!(report.stats.backend_paths, 2);
        assert_eq!(report.stats.mounted_backend_paths, 0);
        assert_eq!(report.stats.frontend_routes, 1);

        let api: Vec<&str> = report
            .unmatched_api_calls
            .iter()
            .map(|e| e.canonical_path.as_str())
            .collect();
        assert_eq!(api, vec!["/task-stats"]);

        let nav: Vec<&str> = report
            .unmatched_navigation
            .iter()
            .map(|e| e.canonical_path.as_str())
            .collect();
        assert_eq!(nav, vec!["/reports"]);
    }
}
