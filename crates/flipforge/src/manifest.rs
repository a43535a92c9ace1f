//! The denormalized page metadata blob stored on a document.
//!
//! Downstream consumers (viewer shell, offline export) read this instead of
//! re-querying the pages table. The JSON shape is part of the public contract:
//! `{ "total_pages": N, "pages": [{ "page_number", "file", "width", "height" }] }`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageManifest {
    pub total_pages: u32,
    pub pages: Vec<PageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// 1-based ordinal, contiguous within the document.
    pub page_number: u32,
    /// Filename relative to the document's pages directory.
    pub file: String,
    pub width: u32,
    pub height: u32,
}

impl PageManifest {
    pub fn new() -> Self {
        Self {
            total_pages: 0,
            pages: Vec::new(),
        }
    }

    /// Appends an entry, keeping `total_pages` in sync.
    pub fn push(&mut self, entry: PageEntry) {
        self.pages.push(entry);
        self.total_pages = self.pages.len() as u32;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for PageManifest {
    fn default() -> Self {
        Self::new()
    }
}
