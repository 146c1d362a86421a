//! Notebooks: the name → page table of one folder.
//!
//! ```text
//! ScopeKey ──► resolve ──► Local(folder id)   bulk listing, then single lookups
//!                      └─► Remote(path)       single lookups through the transport
//! ```
//!
//! A local notebook lists its folder once. The listing is *complete* when it
//! fit in the table; misses on a complete table are answered without another
//! store call. Otherwise (or after [`Notebook::expire`]) each miss costs one
//! lookup, and the answer, found or not, is remembered.
//!
//! Names are matched case-insensitively.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{Clock, TtlCache};
use crate::error::{Result, WikiError};
use crate::page::{Origin, Page};
use crate::services::{Account, ItemId, ItemMeta, ROOT_FOLDER_ID, Services};

// ============================================================================
// Scope Keys
// ============================================================================

/// Where a notebook lives: a folder id or an absolute folder path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Folder(ItemId),
    Path(String),
}

impl ScopeKey {
    /// Numeric keys are folder ids, anything else a path.
    pub fn parse(key: &str) -> Self {
        key.parse::<ItemId>()
            .map_or_else(|_| Self::Path(normalize_scope_path(key)), Self::Folder)
    }
}

impl From<ItemId> for ScopeKey {
    fn from(id: ItemId) -> Self {
        Self::Folder(id)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder(id) => write!(f, "{id}"),
            Self::Path(path) => f.write_str(path),
        }
    }
}

fn normalize_scope_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `/a/b` → `/a`, `/a` → `/`, `/` → none.
fn parent_path(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) | None => Some("/".to_string()),
        Some(index) => Some(path[..index].to_string()),
    }
}

/// Turn a scope into the key a notebook is cached under. On local mailboxes
/// every path collapses to the folder id holding it.
pub fn resolve_scope(services: &Services, account: &Account, scope: &ScopeKey) -> Result<ScopeKey> {
    let ScopeKey::Path(path) = scope else {
        return Ok(scope.clone());
    };
    if !services.directory.is_local(account) {
        return Ok(ScopeKey::Path(normalize_scope_path(path)));
    }
    if path == "/" {
        return Ok(ScopeKey::Folder(ROOT_FOLDER_ID));
    }
    let item = services
        .store
        .item_by_path(&account.id, path)?
        .ok_or_else(|| WikiError::NotFound(path.clone()))?;
    Ok(ScopeKey::Folder(if item.is_folder() {
        item.id
    } else {
        item.folder_id
    }))
}

// ============================================================================
// Notebook
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookKind {
    Local(ItemId),
    Remote(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Unloaded,
    Partial,
    Complete,
}

pub struct Notebook {
    account: Arc<Account>,
    kind: NotebookKind,
    key: ScopeKey,
    parent: Option<ScopeKey>,
    /// Mailbox hosted by this process.
    mailbox_local: bool,
    pages: TtlCache<String, Option<Arc<Page>>>,
    listing: Mutex<Listing>,
}

impl fmt::Debug for Notebook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notebook")
            .field("account", &self.account.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("listing", &*self.listing.lock())
            .finish()
    }
}

impl Notebook {
    /// Open the notebook at an already resolved `scope`.
    pub fn open(
        services: &Services,
        account: Arc<Account>,
        scope: ScopeKey,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mailbox_local = services.directory.is_local(&account);

        let (kind, parent) = match &scope {
            ScopeKey::Folder(id) if mailbox_local => {
                let folder = services
                    .store
                    .item(&account.id, *id)?
                    .filter(ItemMeta::is_folder)
                    .ok_or_else(|| WikiError::NotFound(format!("folder {id}")))?;
                let parent = (*id != ROOT_FOLDER_ID).then_some(ScopeKey::Folder(folder.folder_id));
                (NotebookKind::Local(*id), parent)
            }
            ScopeKey::Folder(id) => {
                let folder = services.transport.folder(&account, *id)?;
                let parent = parent_path(&normalize_scope_path(&folder.path)).map(ScopeKey::Path);
                (NotebookKind::Local(*id), parent)
            }
            ScopeKey::Path(path) => {
                let parent = parent_path(path).map(ScopeKey::Path);
                (NotebookKind::Remote(path.clone()), parent)
            }
        };

        Ok(Self {
            account,
            kind,
            key: scope,
            parent,
            mailbox_local,
            pages: TtlCache::new(capacity, None, clock),
            listing: Mutex::new(Listing::Unloaded),
        })
    }

    #[inline]
    pub fn account(&self) -> &Arc<Account> {
        &self.account
    }

    #[inline]
    pub fn kind(&self) -> &NotebookKind {
        &self.kind
    }

    #[inline]
    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    /// Enclosing notebook; `None` only at the account root.
    #[inline]
    pub fn parent(&self) -> Option<&ScopeKey> {
        self.parent.as_ref()
    }

    /// Whether the table holds the whole folder.
    pub fn is_complete(&self) -> bool {
        *self.listing.lock() == Listing::Complete
    }

    /// Find a document by name, case-insensitively.
    pub fn lookup(&self, services: &Services, name: &str) -> Result<Option<Arc<Page>>> {
        let key = name.to_lowercase();
        if let Some(hit) = self.pages.get(&key) {
            return Ok(hit);
        }

        if let NotebookKind::Local(folder) = self.kind {
            if self.load(services, folder)? {
                return Ok(self.pages.get(&key).flatten());
            }
            if let Some(hit) = self.pages.get(&key) {
                return Ok(hit);
            }
        }

        let page = self.fetch(services, name)?.map(|meta| Arc::new(self.page(meta)));
        Ok(self.pages.get_or_insert(key, page))
    }

    /// Forget `name`. The table stops being complete.
    pub fn expire(&self, name: &str) -> Option<Arc<Page>> {
        let removed = self.pages.remove(&name.to_lowercase()).flatten();
        let mut listing = self.listing.lock();
        if *listing == Listing::Complete {
            *listing = Listing::Partial;
        }
        removed
    }

    fn page(&self, meta: ItemMeta) -> Page {
        let origin = if self.mailbox_local {
            Origin::Local
        } else {
            Origin::Remote
        };
        Page::new(self.account.clone(), meta, origin, self.key.clone())
    }

    /// Bulk-load the folder listing once. Returns whether the table is complete.
    fn load(&self, services: &Services, folder: ItemId) -> Result<bool> {
        match *self.listing.lock() {
            Listing::Complete => return Ok(true),
            Listing::Partial => return Ok(false),
            Listing::Unloaded => {}
        }

        let capacity = self.pages.capacity();
        let items = if self.mailbox_local {
            services.store.list(&self.account.id, folder)?
        } else {
            services.transport.search(&self.account, folder, capacity + 1)?
        };
        let documents: Vec<ItemMeta> = items
            .into_iter()
            .filter(|item| item.kind.is_document())
            .collect();
        let complete = documents.len() <= capacity;

        let mut listing = self.listing.lock();
        if *listing == Listing::Unloaded {
            for meta in documents.into_iter().take(capacity) {
                let key = meta.name.to_lowercase();
                self.pages.insert(key, Some(Arc::new(self.page(meta))));
            }
            *listing = if complete {
                Listing::Complete
            } else {
                Listing::Partial
            };
        }
        Ok(*listing == Listing::Complete)
    }

    fn fetch(&self, services: &Services, name: &str) -> Result<Option<ItemMeta>> {
        let found = match &self.kind {
            NotebookKind::Local(folder) if self.mailbox_local => {
                services.store.child(&self.account.id, *folder, name)?
            }
            NotebookKind::Local(folder) => {
                let path = services.transport.folder(&self.account, *folder)?.path;
                services
                    .transport
                    .item_by_path(&self.account, &join(&path, name))?
            }
            NotebookKind::Remote(path) => services
                .transport
                .item_by_path(&self.account, &join(path, name))?,
        };
        Ok(found.filter(|item| item.kind.is_document()))
    }
}

fn join(folder: &str, name: &str) -> String {
    if folder.ends_with('/') {
        format!("{folder}{name}")
    } else {
        format!("{folder}/{name}")
    }
}
