//! Page snapshots.
//!
//! A [`Page`] pairs one item's metadata with the account that owns it and the
//! notebook scope it was found in. Content is fetched on demand, from the
//! store for local mailboxes or through the transport for remote ones, and
//! parsed into a [`Template`] at most once per snapshot.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{Result, WikiError};
use crate::notebook::ScopeKey;
use crate::services::{Account, ItemId, ItemKind, ItemMeta, Services};
use crate::template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Content comes from the local document store.
    Local,
    /// Content comes through the remote transport.
    Remote,
}

pub struct Page {
    account: Arc<Account>,
    meta: ItemMeta,
    origin: Origin,
    scope: ScopeKey,
    template: OnceLock<Arc<Template>>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("account", &self.account.name)
            .field("id", &self.meta.id)
            .field("name", &self.meta.name)
            .field("version", &self.meta.version)
            .field("origin", &self.origin)
            .finish()
    }
}

impl Page {
    pub fn new(account: Arc<Account>, meta: ItemMeta, origin: Origin, scope: ScopeKey) -> Self {
        Self {
            account,
            meta,
            origin,
            scope,
            template: OnceLock::new(),
        }
    }

    /// Same item seen at another revision.
    pub fn revision(&self, meta: ItemMeta) -> Self {
        Self::new(self.account.clone(), meta, self.origin, self.scope.clone())
    }

    #[inline]
    pub fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.meta.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    #[inline]
    pub fn account(&self) -> &Arc<Account> {
        &self.account
    }

    #[inline]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    #[inline]
    pub const fn is_folder(&self) -> bool {
        self.meta.is_folder()
    }

    #[inline]
    pub fn is_wiki(&self) -> bool {
        self.meta.kind == ItemKind::Wiki
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        self.meta.kind.is_document()
    }

    /// Scope of the notebook this page was found in.
    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    /// Scope that relative names used inside this page resolve against: the
    /// folder itself for folders, the containing notebook otherwise.
    pub fn notebook_scope(&self) -> ScopeKey {
        match (self.is_folder(), self.origin) {
            (true, Origin::Local) => ScopeKey::Folder(self.meta.id),
            _ => self.scope.clone(),
        }
    }

    /// Identity of the template built from this page.
    pub fn template_id(&self) -> String {
        format!("{}:{}:{}", self.account.id, self.scope, self.meta.name)
    }

    pub fn content(&self, services: &Services) -> Result<String> {
        if self.is_folder() {
            return Err(WikiError::NotWikiItem(self.meta.name.clone()));
        }
        let bytes = match self.origin {
            Origin::Local => services
                .store
                .content(&self.account.id, self.meta.id, self.meta.version)?,
            Origin::Remote => {
                services
                    .transport
                    .content(&self.account, self.meta.id, self.meta.version)?
            }
        };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Parsed template of this revision, fetched on first use.
    pub fn template(&self, services: &Services) -> Result<Arc<Template>> {
        if let Some(template) = self.template.get() {
            return Ok(template.clone());
        }
        let source = self.content(services)?;
        let template = Arc::new(Template::named(
            &self.account.id,
            &self.scope.to_string(),
            &self.meta.name,
            source,
        ));
        // Concurrent loaders may race; the first one published wins
        Ok(self.template.get_or_init(|| template).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::services::NOTEBOOK_FOLDER_ID;

    #[test]
    fn test_template_loaded_once() {
        let store = MemoryStore::new();
        store.add_account("a1", "alice@example.com");
        let id = store
            .put("a1", NOTEBOOK_FOLDER_ID, "Home", ItemKind::Wiki, "Hi {{NAME}}", "alice")
            .unwrap();
        let services = store.services();

        let account = Arc::new(services.directory.account(crate::services::AccountBy::Id("a1")).unwrap().unwrap());
        let meta = services.store.item("a1", id).unwrap().unwrap();
        let page = Page::new(account, meta, Origin::Local, ScopeKey::Folder(NOTEBOOK_FOLDER_ID));

        let first = page.template(&services).unwrap();
        let second = page.template(&services).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), "a1:12:Home");
        assert_eq!(first.source(), "Hi {{NAME}}");
        assert_eq!(page.template_id(), first.id());
    }

    #[test]
    fn test_folder_has_no_content() {
        let store = MemoryStore::new();
        store.add_account("a1", "alice@example.com");
        let services = store.services();
        let account = Arc::new(services.directory.account(crate::services::AccountBy::Id("a1")).unwrap().unwrap());
        let meta = services.store.item("a1", NOTEBOOK_FOLDER_ID).unwrap().unwrap();
        let page = Page::new(account, meta, Origin::Local, ScopeKey::Folder(1));

        assert!(matches!(page.content(&services), Err(WikiError::NotWikiItem(_))));
        assert_eq!(page.notebook_scope(), ScopeKey::Folder(NOTEBOOK_FOLDER_ID));
    }
}
