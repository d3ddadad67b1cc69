use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AlignError, Result};

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "endpoint-align.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub backend_root: PathBuf,
    pub frontend_root: PathBuf,
    /// Seed file for mount-graph resolution.
    pub entry_file: PathBuf,
    pub output: PathBuf,
    pub ignore_dirs: Vec<String>,
    pub backend_extensions: Vec<String>,
    pub frontend_extensions: Vec<String>,
    /// Leading path prefixes collapsed to `/` during normalization.
    pub strip_prefixes: Vec<String>,
    pub suggestion_limit: usize,
    /// Directory names whose files hold the frontend route table.
    pub route_table_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_root: PathBuf::from("server/src"),
            frontend_root: PathBuf::from("client/src"),
            entry_file: PathBuf::from("server/src/routes/index.ts"),
            output: PathBuf::from("endpoint-alignment-report.md"),
            ignore_dirs: to_strings(&[
                "node_modules",
                "dist",
                "build",
                ".git",
                ".svn",
                ".hg",
                ".next",
                ".nuxt",
                "coverage",
                ".cache",
                "out",
                "dist_test",
            ]),
            backend_extensions: to_strings(&["ts", "js", "cjs", "mjs"]),
            frontend_extensions: to_strings(&["ts", "tsx", "js", "jsx", "vue", "mjs"]),
            strip_prefixes: to_strings(&["/api"]),
            suggestion_limit: 3,
            route_table_dirs: to_strings(&["router", "routes"]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Read a config file. Keys missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AlignError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| AlignError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `explicit` if given, otherwise `endpoint-align.json` from `dir` if
    /// it exists, otherwise the defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading config from {}", path.display());
            return Self::from_file(path);
        }

        let implicit = dir.join(CONFIG_FILE_NAME);
        if implicit.is_file() {
            debug!("Loading config from {}", implicit.display());
            Self::from_file(&implicit)
        } else {
            Ok(Self::default())
        }
    }
}
