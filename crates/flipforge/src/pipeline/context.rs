use std::path::PathBuf;

use crate::db::DocumentRow;
use crate::rasterizer::RasterPage;
use crate::splitter::EmittedPage;
use crate::worker::job::Job;

pub struct PipelineContext {
    // Input
    pub job: Job,

    // Step 1 result — guaranteed Some after step_load_document
    pub document: Option<DocumentRow>,

    // Scratch directory for pdftoppm output, removed after the run
    pub workdir: Option<PathBuf>,

    // Step 2 result — ordered by PDF page number
    pub rasters: Vec<RasterPage>,

    // Step 3 result — ordered by flipbook page number
    pub pages: Vec<EmittedPage>,

    // Step 4 result
    pub total_pages: u32,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            document: None,
            workdir: None,
            rasters: Vec::new(),
            pages: Vec::new(),
            total_pages: 0,
        }
    }
}
