use std::path::PathBuf;

use crate::config::Config;

pub struct PipelineConfig {
    pub data_root: PathBuf,
    pub publish_root: PathBuf,
    pub viewer_assets: PathBuf,
    pub worker_count: usize,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_root: config.data_root(),
            publish_root: config.publish_root(),
            viewer_assets: config.viewer_assets(),
            worker_count: config.worker_count,
        }
    }
}
