//! Publishing: copies a ready document's page set plus the static viewer
//! shell into the public publish tree under a stable public slug.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use tracing::{info, info_span};

use crate::db::{document_repo, Database, DocumentRow, DocumentStatus};
use crate::error::PublishError;
use crate::manifest::PageManifest;
use crate::pipeline::PipelineConfig;
use crate::storage::{PageStore, PublishStore};

/// Files making up the static viewer shell, copied verbatim from the
/// configured viewer asset directory into every published flipbook.
pub const VIEWER_ASSET_FILES: &[&str] = &["app.js", "app.css"];

const SLUG_PATTERN: &str = r"^[a-z0-9]+(?:-[a-z0-9]+)*$";
const SLUG_MIN_LEN: usize = 3;
const SLUG_MAX_LEN: usize = 255;

/// Decides whether an owner may publish. The billing system behind this
/// lives elsewhere; the default grants everyone.
pub trait Entitlement: Send + Sync {
    fn can_publish(&self, owner_id: &str) -> bool;
}

/// Grants every owner. Used when no billing integration is wired up.
pub struct AllowAll;

impl Entitlement for AllowAll {
    fn can_publish(&self, _owner_id: &str) -> bool {
        true
    }
}

pub struct Publisher {
    db: Database,
    store: PageStore,
    publish_store: PublishStore,
    viewer_assets: PathBuf,
    slug_re: Regex,
    entitlement: Box<dyn Entitlement>,
}

impl Publisher {
    pub fn from_config(db: Database, config: Arc<PipelineConfig>) -> Self {
        Self::new(db, config, Box::new(AllowAll))
    }

    pub fn new(
        db: Database,
        config: Arc<PipelineConfig>,
        entitlement: Box<dyn Entitlement>,
    ) -> Self {
        Self {
            db,
            store: PageStore::new(&config.data_root),
            publish_store: PublishStore::new(&config.publish_root),
            viewer_assets: config.viewer_assets.clone(),
            // The pattern is a literal; it cannot fail to compile.
            slug_re: Regex::new(SLUG_PATTERN).unwrap(),
            entitlement,
        }
    }

    /// Publishes a ready document under `requested_slug`, or under its
    /// previous public slug (falling back to a freshly generated one).
    /// The slug conflict check runs before any file is copied; republish
    /// at the same slug overwrites the prior public files.
    pub fn publish(
        &self,
        document_id: &str,
        requested_slug: Option<&str>,
    ) -> Result<String, PublishError> {
        let _span = info_span!("publish", document_id = %document_id).entered();

        let doc = document_repo::find_by_id(&self.db, document_id)?
            .ok_or_else(|| PublishError::DocumentNotFound(document_id.to_string()))?;

        if doc.status()? != DocumentStatus::Ready {
            return Err(PublishError::NotReady {
                id: doc.id.clone(),
                status: doc.status.clone(),
            });
        }

        if !self.entitlement.can_publish(&doc.owner_id) {
            return Err(PublishError::NotEntitled(doc.owner_id.clone()));
        }

        let manifest = doc
            .pages_json
            .as_deref()
            .and_then(|json| PageManifest::from_json(json).ok())
            .ok_or_else(|| PublishError::MissingManifest(doc.id.clone()))?;

        let slug = self.resolve_slug(&doc, requested_slug)?;
        if document_repo::published_slug_taken(&self.db, &slug, &doc.id)? {
            return Err(PublishError::SlugConflict(slug));
        }

        self.copy_public_files(&doc, &manifest, &slug)?;

        let now = Utc::now().to_rfc3339();
        document_repo::mark_published(&self.db, &doc.id, &slug, &now)?;

        info!("Published document {} as '{}'", doc.id, slug);
        Ok(slug)
    }

    /// Flips the visibility flag off and removes the public files on a
    /// best-effort basis. The public slug is kept for republishing.
    pub fn unpublish(&self, document_id: &str) -> Result<(), PublishError> {
        let _span = info_span!("unpublish", document_id = %document_id).entered();

        let doc = document_repo::find_by_id(&self.db, document_id)?
            .ok_or_else(|| PublishError::DocumentNotFound(document_id.to_string()))?;

        let now = Utc::now().to_rfc3339();
        document_repo::mark_unpublished(&self.db, &doc.id, &now)?;

        if let Some(ref slug) = doc.published_slug {
            self.publish_store.remove_slug_dir(slug);
        }

        info!("Unpublished document {}", doc.id);
        Ok(())
    }

    fn resolve_slug(
        &self,
        doc: &DocumentRow,
        requested: Option<&str>,
    ) -> Result<String, PublishError> {
        if let Some(slug) = requested {
            if slug.len() < SLUG_MIN_LEN
                || slug.len() > SLUG_MAX_LEN
                || !self.slug_re.is_match(slug)
            {
                return Err(PublishError::InvalidSlug(slug.to_string()));
            }
            return Ok(slug.to_string());
        }

        // Keep the previous public identifier across republish/unpublish.
        if let Some(ref slug) = doc.published_slug {
            return Ok(slug.clone());
        }

        // First publish without a chosen slug: document slug plus a short
        // random suffix so the public URL is not guessable from the title.
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Ok(format!("{}-{}", doc.slug, &suffix[..8]))
    }

    fn copy_public_files(
        &self,
        doc: &DocumentRow,
        manifest: &PageManifest,
        slug: &str,
    ) -> Result<(), PublishError> {
        self.publish_store.ensure_slug_dir(slug)?;
        self.publish_store.ensure_pages_dir(slug)?;

        let pages_dir = self.store.pages_dir(&doc.owner_id, &doc.id);
        for entry in &manifest.pages {
            let source = pages_dir.join(&entry.file);
            let dest = format!("pages/{}", entry.file);
            self.publish_store.copy_page(&source, slug, &dest)?;
        }

        let pages_json = serde_json::to_string_pretty(manifest)?;
        self.publish_store
            .write_file(slug, "pages.json", pages_json.as_bytes())?;

        let index_html = render_index_html(&doc.title);
        self.publish_store
            .write_file(slug, "index.html", index_html.as_bytes())?;

        for file in VIEWER_ASSET_FILES {
            let source = self.viewer_assets.join(file);
            self.publish_store.copy_page(&source, slug, file)?;
        }

        Ok(())
    }
}

fn render_index_html(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Flipbook</title>
    <link rel="stylesheet" href="app.css">
</head>
<body>
    <div id="flipbook-container"></div>
    <div id="page-info" class="page-info"></div>
    <script src="app.js"></script>
</body>
</html>
"#,
        title = escape_html(title)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PageEntry;
    use tempfile::TempDir;

    struct DenyAll;

    impl Entitlement for DenyAll {
        fn can_publish(&self, _owner_id: &str) -> bool {
            false
        }
    }

    struct Fixture {
        _tmp: TempDir,
        db: Database,
        publisher: Publisher,
        publish_root: PathBuf,
    }

    fn setup(entitlement: Box<dyn Entitlement>) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();

        let viewer = tmp.path().join("viewer");
        std::fs::create_dir_all(&viewer).unwrap();
        for file in VIEWER_ASSET_FILES {
            std::fs::write(viewer.join(file), format!("// {}", file)).unwrap();
        }

        let config = Arc::new(PipelineConfig {
            data_root: tmp.path().join("data"),
            publish_root: tmp.path().join("public"),
            viewer_assets: viewer,
            worker_count: 1,
        });
        let publish_root = config.publish_root.clone();
        let publisher = Publisher::new(db.clone(), config, entitlement);

        Fixture {
            _tmp: tmp,
            db,
            publisher,
            publish_root,
        }
    }

    fn insert_ready_document(f: &Fixture, id: &str, page_count: u32) {
        let mut manifest = PageManifest::new();
        let pages_dir = f
            .publisher
            .store
            .pages_dir("owner-1", id);
        std::fs::create_dir_all(&pages_dir).unwrap();

        for n in 1..=page_count {
            let file = format!("page-{:03}.jpg", n);
            std::fs::write(pages_dir.join(&file), b"jpeg").unwrap();
            manifest.push(PageEntry {
                page_number: n,
                file,
                width: 1240,
                height: 1754,
            });
        }

        let doc = DocumentRow {
            id: id.to_string(),
            owner_id: "owner-1".to_string(),
            title: "Spring <Catalog>".to_string(),
            slug: format!("catalog-{}", id),
            source_path: Some("/data/source.pdf".to_string()),
            status: "ready".to_string(),
            error: None,
            total_pages: page_count,
            pages_json: Some(manifest.to_json().unwrap()),
            is_published: false,
            published_slug: None,
            published_at: None,
            processing_started_at: None,
            processing_completed_at: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            byte_size: None,
        };
        document_repo::insert(&f.db, &doc).unwrap();
    }

    #[test]
    fn test_publish_copies_pages_and_viewer_shell() {
        let f = setup(Box::new(AllowAll));
        insert_ready_document(&f, "d1", 2);

        let slug = f.publisher.publish("d1", Some("spring-catalog")).unwrap();
        assert_eq!(slug, "spring-catalog");

        let dir = f.publish_root.join("spring-catalog");
        assert!(dir.join("pages/page-001.jpg").exists());
        assert!(dir.join("pages/page-002.jpg").exists());
        assert!(dir.join("pages.json").exists());
        assert!(dir.join("app.js").exists());
        assert!(dir.join("app.css").exists());

        let html = std::fs::read_to_string(dir.join("index.html")).unwrap();
        assert!(html.contains("Spring &lt;Catalog&gt; - Flipbook"));

        let doc = document_repo::find_by_id(&f.db, "d1").unwrap().unwrap();
        assert!(doc.is_published);
        assert_eq!(doc.published_slug.as_deref(), Some("spring-catalog"));
    }

    #[test]
    fn test_publish_requires_ready_status() {
        let f = setup(Box::new(AllowAll));
        insert_ready_document(&f, "d1", 1);
        f.db
            .with_conn(|conn| {
                conn.execute("UPDATE documents SET status = 'processing' WHERE id = 'd1'", [])?;
                Ok(())
            })
            .unwrap();

        let result = f.publisher.publish("d1", Some("some-slug"));
        assert!(matches!(result, Err(PublishError::NotReady { .. })));
    }

    #[test]
    fn test_publish_requires_entitlement() {
        let f = setup(Box::new(DenyAll));
        insert_ready_document(&f, "d1", 1);

        let result = f.publisher.publish("d1", Some("some-slug"));
        assert!(matches!(result, Err(PublishError::NotEntitled(_))));
    }

    #[test]
    fn test_publish_rejects_invalid_slugs() {
        let f = setup(Box::new(AllowAll));
        insert_ready_document(&f, "d1", 1);

        for bad in ["Has-Upper", "under_score", "-leading", "trailing-", "ab", "spa ce"] {
            let result = f.publisher.publish("d1", Some(bad));
            assert!(
                matches!(result, Err(PublishError::InvalidSlug(_))),
                "slug '{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_slug_conflict_checked_before_any_copy() {
        let f = setup(Box::new(AllowAll));
        insert_ready_document(&f, "d1", 1);
        insert_ready_document(&f, "d2", 1);

        f.publisher.publish("d1", Some("taken-slug")).unwrap();

        let result = f.publisher.publish("d2", Some("taken-slug"));
        assert!(matches!(result, Err(PublishError::SlugConflict(_))));

        // The loser's publish state and the winner's public files are intact.
        let d2 = document_repo::find_by_id(&f.db, "d2").unwrap().unwrap();
        assert!(!d2.is_published);
        assert!(d2.published_slug.is_none());
        assert!(f
            .publish_root
            .join("taken-slug/pages/page-001.jpg")
            .exists());
    }

    #[test]
    fn test_republish_reuses_slug_and_overwrites() {
        let f = setup(Box::new(AllowAll));
        insert_ready_document(&f, "d1", 1);

        let first = f.publisher.publish("d1", Some("stable-slug")).unwrap();
        // Republish without a requested slug reuses the stored one.
        let second = f.publisher.publish("d1", None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_generated_slug_carries_document_slug_prefix() {
        let f = setup(Box::new(AllowAll));
        insert_ready_document(&f, "d1", 1);

        let slug = f.publisher.publish("d1", None).unwrap();
        assert!(slug.starts_with("catalog-d1-"));
        assert!(f.publish_root.join(&slug).join("index.html").exists());
    }

    #[test]
    fn test_unpublish_keeps_slug_and_removes_files() {
        let f = setup(Box::new(AllowAll));
        insert_ready_document(&f, "d1", 1);

        let slug = f.publisher.publish("d1", Some("gone-soon")).unwrap();
        assert!(f.publish_root.join(&slug).exists());

        f.publisher.unpublish("d1").unwrap();

        let doc = document_repo::find_by_id(&f.db, "d1").unwrap().unwrap();
        assert!(!doc.is_published);
        assert_eq!(doc.published_slug.as_deref(), Some("gone-soon"));
        assert!(!f.publish_root.join(&slug).exists());
    }

    #[test]
    fn test_publish_missing_document() {
        let f = setup(Box::new(AllowAll));
        let result = f.publisher.publish("ghost", None);
        assert!(matches!(result, Err(PublishError::DocumentNotFound(_))));
    }

    #[test]
    fn test_serialization_errors_keep_their_own_message() {
        // A serde_json failure must not be reported as a missing manifest.
        let err = PublishError::from(
            serde_json::from_str::<PageManifest>("{").unwrap_err(),
        );
        assert!(matches!(err, PublishError::Manifest(_)));
        assert!(err.to_string().contains("serialize page manifest"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html(r#"say "hi""#), "say &quot;hi&quot;");
    }
}
