//! Shared test setup: one local account over a [`MemoryStore`].

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::config::WikiConfig;
use crate::context::Request;
use crate::memory::MemoryStore;
use crate::services::{ItemId, ItemKind};
use crate::wiki::Wiki;

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub wiki: Wiki,
}

impl Fixture {
    /// Account `a1` (`alice@example.com`), writes stamped 2024-03-05 14:07:09 UTC.
    pub fn new() -> Self {
        let store = MemoryStore::new();
        store.set_time(Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap());
        store.add_account("a1", "alice@example.com");
        Self::with_store(store, WikiConfig::default())
    }

    pub fn with_store(store: Arc<MemoryStore>, config: WikiConfig) -> Self {
        let wiki = Wiki::new(store.services(), config);
        Self { store, wiki }
    }

    /// Same store, fresh caches.
    pub fn reopen(self) -> Self {
        let config = self.wiki.config().clone();
        Self::with_store(self.store, config)
    }

    pub fn wiki_page(&self, folder: ItemId, name: &str, content: &str) -> ItemId {
        self.store
            .put("a1", folder, name, ItemKind::Wiki, content, "alice")
            .unwrap()
    }

    pub fn document(&self, folder: ItemId, name: &str, content: &str) -> ItemId {
        self.store
            .put("a1", folder, name, ItemKind::Document, content, "alice")
            .unwrap()
    }

    pub fn folder(&self, parent: ItemId, name: &str) -> ItemId {
        self.store.add_folder("a1", parent, name).unwrap()
    }

    /// Render `raw` with item `id` of `a1` as the subject.
    pub fn render(&self, raw: &str, id: ItemId) -> String {
        self.render_with(raw, id, &Request::default())
    }

    pub fn render_with(&self, raw: &str, id: ItemId, request: &Request) -> String {
        let page = self.wiki.page_by_id("a1", id).unwrap();
        self.wiki.render(raw, &page, request).unwrap()
    }
}
