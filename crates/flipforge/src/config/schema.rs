use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Root for private per-document storage (sources and page images).
    pub data_root: String,
    /// Root for published flipbooks, served publicly under the published slug.
    pub publish_root: String,
    /// Directory holding the static viewer shell (app.js, app.css).
    /// Resolved once at startup; no fallback search is performed.
    pub viewer_assets: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// SQLite database file. Defaults to the per-user data directory.
    #[serde(default)]
    pub database_path: Option<String>,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

impl Config {
    pub fn data_root(&self) -> PathBuf {
        PathBuf::from(&self.data_root)
    }

    pub fn publish_root(&self) -> PathBuf {
        PathBuf::from(&self.publish_root)
    }

    pub fn viewer_assets(&self) -> PathBuf {
        PathBuf::from(&self.viewer_assets)
    }
}
