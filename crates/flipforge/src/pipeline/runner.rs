use std::sync::Arc;

use chrono::Utc;
use tracing::{info_span, warn};

use crate::broadcast::job_progress::JobPhase;
use crate::db::{document_repo, page_repo, Database};
use crate::manifest::{PageEntry, PageManifest};
use crate::rasterizer::Rasterizer;
use crate::splitter::SpreadSplitter;
use crate::storage::PageStore;
use crate::worker::job::JobResult;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};

/// Runs the conversion for a single document: load, rasterize, split,
/// persist, finalize. The document only becomes `ready` after every page
/// is on disk and in the pages table; any failure marks it `error` with
/// the failure message stored verbatim.
pub struct Pipeline {
    db: Database,
    store: PageStore,
    rasterizer: Rasterizer,
    splitter: SpreadSplitter,
}

impl Pipeline {
    pub fn from_config(db: Database, config: Arc<PipelineConfig>) -> Self {
        Self {
            db,
            store: PageStore::new(&config.data_root),
            rasterizer: Rasterizer::new(),
            splitter: SpreadSplitter::new(),
        }
    }

    /// Run the full conversion for a single document.
    /// Returns a (JobResult, PipelineContext) pair.
    pub fn run(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> (JobResult, PipelineContext) {
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.job.id,
            document_id = %ctx.job.document_id,
        )
        .entered();

        // Step 1: Load document, reset any previous conversion
        {
            let _step = info_span!("load_document").entered();
            if let Err(e) = self.step_load_document(&mut ctx) {
                return self.fail(ctx, progress, e);
            }
        }

        // Step 2: Rasterize
        {
            let _step = info_span!("rasterize").entered();
            progress.report(ProgressEvent::Phase {
                phase: JobPhase::Rasterizing,
                message: "Rendering PDF pages...".to_string(),
            });
            if let Err(e) = self.step_rasterize(&mut ctx) {
                return self.fail(ctx, progress, e);
            }
        }

        // Step 3: Split spreads
        {
            let _step = info_span!("split").entered();
            progress.report(ProgressEvent::Phase {
                phase: JobPhase::Splitting,
                message: "Detecting and splitting spreads...".to_string(),
            });
            if let Err(e) = self.step_split(&mut ctx) {
                return self.fail(ctx, progress, e);
            }
        }

        // Step 4: Persist pages
        {
            let _step = info_span!("persist").entered();
            progress.report(ProgressEvent::Phase {
                phase: JobPhase::Persisting,
                message: "Storing page images...".to_string(),
            });
            if let Err(e) = self.step_persist(&mut ctx) {
                return self.fail(ctx, progress, e);
            }
        }

        // Step 5: Finalize — manifest blob and ready status
        {
            let _step = info_span!("finalize").entered();
            if let Err(e) = self.step_finalize(&mut ctx) {
                return self.fail(ctx, progress, e);
            }
        }

        self.cleanup_workdir(&ctx);

        progress.report(ProgressEvent::Completed {
            total_pages: Some(ctx.total_pages),
            published_slug: None,
        });

        let result = JobResult::converted(&ctx.job, ctx.total_pages);
        (result, ctx)
    }

    fn fail(
        &self,
        ctx: PipelineContext,
        progress: &dyn ProgressReporter,
        error: PipelineError,
    ) -> (JobResult, PipelineContext) {
        let message = error.to_string();
        self.cleanup_workdir(&ctx);

        // Record the failure on the document itself. Load failures mean
        // there may be no row to update.
        if ctx.document.is_some() {
            let now = Utc::now().to_rfc3339();
            if let Err(e) =
                document_repo::mark_error(&self.db, &ctx.job.document_id, &message, &now)
            {
                warn!("Failed to record error for {}: {}", ctx.job.document_id, e);
            }
        }

        progress.report(ProgressEvent::Failed {
            error: message.clone(),
        });
        (JobResult::failure(&ctx.job, message), ctx)
    }

    fn step_load_document(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let doc = document_repo::find_by_id(&self.db, &ctx.job.document_id)?
            .ok_or_else(|| PipelineError::DocumentNotFound(ctx.job.document_id.clone()))?;

        // The row goes into the context before any further checks, so
        // failures from here on are recorded on the document.
        let doc = ctx.document.insert(doc);

        if doc.source_path.is_none() {
            return Err(PipelineError::MissingSource(doc.id.clone()));
        }

        let now = Utc::now().to_rfc3339();
        document_repo::mark_processing(&self.db, &doc.id, &now)?;

        // Reprocessing starts clean: old page rows and files are removed
        // before any new ones are written.
        page_repo::delete_by_document(&self.db, &doc.id)?;
        self.store.remove_pages(&doc.owner_id, &doc.id)?;

        Ok(())
    }

    fn step_rasterize(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let doc = ctx.document.as_ref().expect("step 1 completed");
        let source = std::path::PathBuf::from(
            doc.source_path.as_ref().expect("checked in step 1"),
        );

        let workdir = std::env::temp_dir().join(format!("flipforge-job-{}", ctx.job.id));
        std::fs::create_dir_all(&workdir).map_err(|e| {
            PipelineError::Storage(crate::error::StorageError::CreateDirectory {
                path: workdir.clone(),
                source: e,
            })
        })?;
        ctx.workdir = Some(workdir.clone());

        ctx.rasters = self.rasterizer.rasterize(&source, &workdir)?;
        Ok(())
    }

    fn step_split(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        ctx.pages = self.splitter.split_all(&ctx.rasters)?;
        Ok(())
    }

    fn step_persist(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let doc = ctx.document.as_ref().expect("step 1 completed");

        for page in &ctx.pages {
            self.store
                .store_page(&page.data, &doc.owner_id, &doc.id, &page.file)?;
            page_repo::insert(
                &self.db,
                &doc.id,
                page.page_number,
                &page.file,
                page.width,
                page.height,
            )?;
        }

        ctx.total_pages = ctx.pages.len() as u32;
        Ok(())
    }

    fn step_finalize(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let doc = ctx.document.as_ref().expect("step 1 completed");

        let mut manifest = PageManifest::new();
        for page in &ctx.pages {
            manifest.push(PageEntry {
                page_number: page.page_number,
                file: page.file.clone(),
                width: page.width,
                height: page.height,
            });
        }
        let pages_json = manifest.to_json()?;

        let now = Utc::now().to_rfc3339();
        document_repo::mark_ready(&self.db, &doc.id, ctx.total_pages, &pages_json, &now)?;
        Ok(())
    }

    fn cleanup_workdir(&self, ctx: &PipelineContext) {
        if let Some(ref workdir) = ctx.workdir {
            if let Err(e) = std::fs::remove_dir_all(workdir) {
                warn!("Failed to remove workdir {}: {}", workdir.display(), e);
            }
        }
    }
}
