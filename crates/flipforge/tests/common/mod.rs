//! Test harness for isolated test execution.
//!
//! `TestHarness` provides a complete isolated environment: temporary data,
//! publish and viewer directories, an in-memory database, and constructors
//! for the pipeline components under test.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use flipforge::db::{document_repo, Database, DocumentRow};
use flipforge::manifest::{PageEntry, PageManifest};
use flipforge::publisher::{Publisher, VIEWER_ASSET_FILES};
use flipforge::{Ingestor, Pipeline, PipelineConfig};

pub struct TestHarness {
    temp_dir: TempDir,
    pub data_root: PathBuf,
    pub publish_root: PathBuf,
    pub viewer_dir: PathBuf,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let data_root = base.join("data");
        let publish_root = base.join("public");
        let viewer_dir = base.join("viewer");

        std::fs::create_dir_all(&data_root).expect("Failed to create data dir");
        std::fs::create_dir_all(&publish_root).expect("Failed to create publish dir");
        std::fs::create_dir_all(&viewer_dir).expect("Failed to create viewer dir");

        for file in VIEWER_ASSET_FILES {
            std::fs::write(viewer_dir.join(file), format!("/* {} */", file))
                .expect("Failed to write viewer asset");
        }

        let db = Database::open_in_memory().expect("Failed to open database");

        Self {
            temp_dir,
            data_root,
            publish_root,
            viewer_dir,
            db,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn pipeline_config(&self) -> Arc<PipelineConfig> {
        Arc::new(PipelineConfig {
            data_root: self.data_root.clone(),
            publish_root: self.publish_root.clone(),
            viewer_assets: self.viewer_dir.clone(),
            worker_count: 1,
        })
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::from_config(self.db.clone(), self.pipeline_config())
    }

    pub fn publisher(&self) -> Publisher {
        Publisher::from_config(self.db.clone(), self.pipeline_config())
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            self.db.clone(),
            flipforge::storage::PageStore::new(&self.data_root),
        )
    }

    /// Writes a file into the harness temp dir and returns its path.
    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Inserts a ready document with `page_count` stored page images and a
    /// matching manifest, bypassing the conversion pipeline.
    pub fn insert_ready_document(&self, id: &str, owner_id: &str, page_count: u32) {
        let pages_dir = self
            .data_root
            .join("documents")
            .join(owner_id)
            .join(id)
            .join("pages");
        std::fs::create_dir_all(&pages_dir).expect("Failed to create pages dir");

        let mut manifest = PageManifest::new();
        for n in 1..=page_count {
            let file = format!("page-{:03}.jpg", n);
            std::fs::write(pages_dir.join(&file), b"jpeg").expect("Failed to write page");
            manifest.push(PageEntry {
                page_number: n,
                file,
                width: 1240,
                height: 1754,
            });
        }

        let doc = DocumentRow {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            title: format!("Document {}", id),
            slug: format!("document-{}", id),
            source_path: Some(format!("/data/documents/{}/{}/source.pdf", owner_id, id)),
            status: "ready".to_string(),
            error: None,
            total_pages: page_count,
            pages_json: Some(manifest.to_json().expect("manifest json")),
            is_published: false,
            published_slug: None,
            published_at: None,
            processing_started_at: None,
            processing_completed_at: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            byte_size: None,
        };
        document_repo::insert(&self.db, &doc).expect("Failed to insert document");
    }
}

/// Writes a solid-color JPEG of the given dimensions, for feeding the
/// splitter without a real PDF render.
pub fn write_raster_image(path: &Path, width: u32, height: u32) {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    img.save(path).expect("Failed to write raster image");
}
