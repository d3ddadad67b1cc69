//! End-to-end properties of the alignment pipeline
//!
//! Normalization equivalences, diff correctness, suggestion ranking, and the
//! union of the flat scan with mount-graph resolution, all driven through the
//! public API.

use endpoint_align::analyzer::diff;
use endpoint_align::endpoint_set::EndpointSet;
use endpoint_align::file_finder::find_files;
use endpoint_align::path_normalizer::{CanonicalPath, PathNormalizer};
use endpoint_align::suggest::suggest;
use endpoint_align::{Config, run_alignment};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn canonical(raw: &str) -> CanonicalPath {
    PathNormalizer::default()
        .normalize(raw)
        .expect("fixture path should normalize")
}

fn set(raws: &[&str]) -> EndpointSet {
    raws.iter().map(|raw| canonical(raw)).collect()
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create fixture dir");
    fs::write(path, content).expect("Failed to write fixture file");
}

#[test]
fn test_normalizing_a_canonical_path_is_a_no_op() {
    let normalizer = PathNormalizer::default();
    let once = normalizer.normalize("/api/users/123/").unwrap();
    assert_eq!(once.as_str(), "/users/:param");
    assert_eq!(normalizer.normalize(once.as_str()).unwrap(), once);

    let param = normalizer.normalize("/users/:param").unwrap();
    assert_eq!(normalizer.normalize(param.as_str()).unwrap(), param);
}

#[test]
fn test_parameter_syntaxes_are_equivalent() {
    assert_eq!(canonical("/users/${id}"), canonical("/users/:id"));
    assert_eq!(canonical("/users/:id"), canonical("/users/:param"));
}

#[test]
fn test_api_prefix_is_equivalent_to_none() {
    assert_eq!(canonical("/api/tasks"), canonical("/tasks"));
    assert_eq!(canonical("/api"), canonical("/"));
}

#[test]
fn test_diff_returns_exactly_the_missing_path() {
    let frontend = set(&["/tasks", "/users/:param"]);
    let backend = set(&["/users/:param"]);

    let entries = diff(&frontend, &backend);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].canonical_path, canonical("/tasks"));
}

#[test]
fn test_related_suggestions_rank_above_unrelated() {
    let candidates = set(&["/tasks", "/user-tasks", "/completely-unrelated"]);
    let ranked = suggest(&canonical("/task"), candidates.paths(), 3);

    assert!(!ranked.is_empty());
    let unrelated = canonical("/completely-unrelated");
    if let Some(position) = ranked.iter().position(|p| *p == unrelated) {
        assert!(position > 0);
    }
    assert!(ranked.contains(&canonical("/tasks")) || ranked.contains(&canonical("/user-tasks")));
}

#[test]
fn test_scan_skips_unreadable_files_and_returns_the_rest() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path();
    write(root, "a.ts", "router.get('/a', h);");
    write(root, "nested/b.ts", "router.get('/b', h);");
    fs::write(root.join("broken.ts"), [0xc3, 0x28, 0xff]).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        write(root, "locked.ts", "router.get('/locked', h);");
        fs::set_permissions(root.join("locked.ts"), fs::Permissions::from_mode(0o000)).unwrap();
    }

    let extensions = vec!["ts".to_string()];
    let files = find_files(root, &extensions, &[]);
    let contents: Vec<&str> = files.iter().map(|f| f.content.as_str()).collect();

    assert!(contents.contains(&"router.get('/a', h);"));
    assert!(contents.contains(&"router.get('/b', h);"));
    assert!(files.iter().all(|f| !f.path.ends_with("broken.ts")));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(root.join("locked.ts"), fs::Permissions::from_mode(0o644)).unwrap();
    }
}

#[test]
fn test_flat_scan_and_mount_graph_are_unioned() {
    // Given: a helper-registered route the mount graph cannot see, and a
    // mounted router whose routes only make sense with their prefix
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path();
    write(
        root,
        "server/src/routes/index.ts",
        "import orders from './orders';\nrouter.use('/shop', orders);\n",
    );
    write(
        root,
        "server/src/routes/orders.ts",
        "router.get('/orders', list);\nrouter.get('/orders/:id', show);\n",
    );
    write(
        root,
        "server/src/helpers/register.ts",
        "export function register(app) {\n  app.get('/api/metrics', metrics);\n}\n",
    );
    write(
        root,
        "client/src/api/shop.ts",
        "export const list = () => request.get('/api/shop/orders')\n\
         export const one = (id) => request.get(`/api/shop/orders/${id}`)\n\
         export const metrics = () => request({ url: '/api/metrics' })\n\
         export const broken = () => request.get('/api/shop/order-history')\n",
    );
    write(
        root,
        "client/src/router/index.ts",
        "export default [{ path: '/shop', component: Shop }]\n",
    );
    write(
        root,
        "client/src/views/Shop.vue",
        "<router-link to=\"/shop\">Shop</router-link>\n<router-link to=\"/cart\">Cart</router-link>\n",
    );

    let config = Config {
        backend_root: root.join("server/src"),
        frontend_root: root.join("client/src"),
        entry_file: root.join("server/src/routes/index.ts"),
        ..Config::default()
    };

    // When: running the whole pipeline
    let report = run_alignment(&config);

    // Then: prefixed routes and the helper route both count as existing
    assert_eq!(report.stats.backend_files, 3);
    assert_eq!(report.stats.frontend_files, 3);
    assert_eq!(report.stats.mount_edges, 1);
    assert_eq!(report.stats.mounted_backend_paths, 2);

    let unmatched: Vec<&str> = report
        .unmatched_api_calls
        .iter()
        .map(|e| e.canonical_path.as_str())
        .collect();
    assert_eq!(unmatched, vec!["/shop/order-history"]);

    let entry = &report.unmatched_api_calls[0];
    assert_eq!(entry.references.len(), 1);
    assert_eq!(entry.references[0].line, 4);
    assert!(entry.suggestions.contains(&canonical("/shop/orders")));

    let nav: Vec<&str> = report
        .unmatched_navigation
        .iter()
        .map(|e| e.canonical_path.as_str())
        .collect();
    assert_eq!(nav, vec!["/cart"]);
}
