//! Command-line driver for the conversion pipeline.
//!
//! Usage:
//!   flipforge <config.json> ingest <owner-id> <title> <file.pdf>
//!   flipforge <config.json> convert <document-id>
//!   flipforge <config.json> publish <document-id> [slug]
//!   flipforge <config.json> unpublish <document-id>
//!   flipforge <config.json> list <owner-id>
//!
//! `ingest` stores the upload and immediately runs the conversion.

use std::process::ExitCode;
use std::sync::Arc;

use log::info;
use tracing_subscriber::EnvFilter;

use flipforge::db::{self, document_repo, Database};
use flipforge::pipeline::{NoopProgress, Pipeline, PipelineConfig, PipelineContext};
use flipforge::publisher::Publisher;
use flipforge::storage::PageStore;
use flipforge::worker::Job;
use flipforge::{load_config, FlipforgeError, Ingestor};

fn main() -> ExitCode {
    // `log` records from the library are bridged into tracing by the
    // subscriber's log integration.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), FlipforgeError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, command, rest) = match args.as_slice() {
        [config, command, rest @ ..] => (config.clone(), command.clone(), rest.to_vec()),
        _ => {
            print_usage();
            return Ok(());
        }
    };

    let config = load_config(&config_path)?;
    info!("Loaded configuration from {}", config_path);

    let db_path = config
        .database_path
        .as_ref()
        .map(std::path::PathBuf::from)
        .or_else(db::default_database_path)
        .ok_or_else(|| {
            FlipforgeError::Config(flipforge::ConfigError::Validation {
                message: "Could not determine a database path".to_string(),
            })
        })?;
    let db = Database::open(&db_path)?;

    let pipeline_config = Arc::new(PipelineConfig::from_config(&config));

    match (command.as_str(), rest.as_slice()) {
        ("ingest", [owner, title, file]) => {
            let ingestor = Ingestor::new(db.clone(), PageStore::new(&pipeline_config.data_root));
            let doc = ingestor.ingest(owner, title, std::path::Path::new(file))?;
            println!("Ingested document {}", doc.id);
            convert(&db, &pipeline_config, &doc.id)
        }
        ("convert", [document_id]) => convert(&db, &pipeline_config, document_id),
        ("publish", [document_id]) => publish(&db, &pipeline_config, document_id, None),
        ("publish", [document_id, slug]) => {
            publish(&db, &pipeline_config, document_id, Some(slug.as_str()))
        }
        ("unpublish", [document_id]) => {
            let publisher = Publisher::from_config(db, pipeline_config);
            publisher.unpublish(document_id)?;
            println!("Unpublished document {}", document_id);
            Ok(())
        }
        ("list", [owner]) => {
            for doc in document_repo::list_by_owner(&db, owner)? {
                println!(
                    "{}  {:<10}  {:>4} pages  {}{}",
                    doc.id,
                    doc.status,
                    doc.total_pages,
                    doc.title,
                    doc.published_slug
                        .as_deref()
                        .filter(|_| doc.is_published)
                        .map(|s| format!("  [published: {}]", s))
                        .unwrap_or_default()
                );
            }
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn convert(
    db: &Database,
    config: &Arc<PipelineConfig>,
    document_id: &str,
) -> Result<(), FlipforgeError> {
    let pipeline = Pipeline::from_config(db.clone(), Arc::clone(config));
    let ctx = PipelineContext::new(Job::convert(document_id));
    let (result, _ctx) = pipeline.run(ctx, &NoopProgress);

    if result.success {
        println!(
            "Converted document {} ({} pages)",
            document_id,
            result.total_pages.unwrap_or(0)
        );
        Ok(())
    } else {
        Err(FlipforgeError::Worker(flipforge::WorkerError::JobFailed(
            result.error.unwrap_or_else(|| "unknown failure".to_string()),
        )))
    }
}

fn publish(
    db: &Database,
    config: &Arc<PipelineConfig>,
    document_id: &str,
    slug: Option<&str>,
) -> Result<(), FlipforgeError> {
    let publisher = Publisher::from_config(db.clone(), Arc::clone(config));
    let published = publisher.publish(document_id, slug)?;
    println!("Published document {} as '{}'", document_id, published);
    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: flipforge <config.json> <command>\n\n\
         Commands:\n\
         \x20 ingest <owner-id> <title> <file.pdf>   store an upload and convert it\n\
         \x20 convert <document-id>                  (re)run the conversion\n\
         \x20 publish <document-id> [slug]           copy a ready document to the publish tree\n\
         \x20 unpublish <document-id>                hide a published document\n\
         \x20 list <owner-id>                        list an owner's documents"
    );
}
