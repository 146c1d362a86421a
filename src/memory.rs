//! In-memory collaborators.
//!
//! [`MemoryStore`] implements every service trait over one shared table of
//! mailboxes. Accounts whose server differs from the store's own are served
//! through the [`RemoteTransport`] half, so remote code paths can be
//! exercised without a second process.
//!
//! # Directory layout for [`MemoryStore::load_dir`]
//!
//! ```text
//! site/
//! ├── alice@example.com/        # one account per top-level directory
//! │   ├── Notebook/             # the well-known notebook folder (id 12)
//! │   │   ├── Home.wiki         # wiki page "Home"
//! │   │   ├── _Footer           # names starting with '_' are wiki pages too
//! │   │   └── Recipes/          # sub-folder
//! │   └── notes.txt             # plain document
//! └── templates@example.com/
//!     └── Template/
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use walkdir::{DirEntry, WalkDir};

use crate::services::{
    Account, AccountBy, AttrScope, Directory, DocumentStore, FIRST_USER_ID, FolderMeta, ItemId,
    ItemKind, ItemMeta, Localizer, NOTEBOOK_FOLDER_ID, ROOT_FOLDER_ID, RemoteTransport, Services,
};

/// Server name of the store itself.
pub const LOCAL_SERVER: &str = "localhost";

/// Characters of content kept as an item's fragment.
const FRAGMENT_LEN: usize = 100;

const WIKI_EXTENSION: &str = ".wiki";

const DEFAULT_REST_BASE: &str = "/home";

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone)]
struct Revision {
    meta: ItemMeta,
    content: Arc<[u8]>,
}

#[derive(Debug)]
struct Item {
    current: Revision,
    /// Prior revisions, oldest first.
    history: Vec<Revision>,
}

#[derive(Debug)]
struct Mailbox {
    account: Account,
    items: BTreeMap<ItemId, Item>,
    next_id: ItemId,
}

impl Mailbox {
    fn meta(&self, id: ItemId) -> Option<&ItemMeta> {
        self.items.get(&id).map(|item| &item.current.meta)
    }

    fn children(&self, folder: ItemId) -> impl Iterator<Item = &ItemMeta> {
        self.items
            .values()
            .map(|item| &item.current.meta)
            .filter(move |meta| meta.folder_id == folder && meta.id != folder)
    }

    fn by_path(&self, path: &str) -> Option<&ItemMeta> {
        let mut current = self.meta(ROOT_FOLDER_ID)?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .children(current.id)
                .find(|meta| meta.name.eq_ignore_ascii_case(segment))?;
        }
        Some(current)
    }

    fn revision(&self, id: ItemId, version: u32) -> Option<&Revision> {
        let item = self.items.get(&id)?;
        if item.current.meta.version == version {
            return Some(&item.current);
        }
        item.history.iter().find(|rev| rev.meta.version == version)
    }
}

#[derive(Debug, Default)]
struct Inner {
    mailboxes: FxHashMap<String, Mailbox>,
    /// Lowercased account name → account id.
    names: FxHashMap<String, String>,
    domains: FxHashMap<String, String>,
    attrs: FxHashMap<(Option<String>, String), String>,
    messages: FxHashMap<(String, Option<String>), String>,
    rest_base: Option<String>,
}

/// Snapshot of how often each read operation was served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub child: usize,
    pub item_by_path: usize,
    pub content: usize,
    pub search: usize,
}

#[derive(Debug, Default)]
struct Counters {
    list: AtomicUsize,
    child: AtomicUsize,
    item_by_path: AtomicUsize,
    content: AtomicUsize,
    search: AtomicUsize,
}

#[inline]
fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Mailboxes, directory and message catalog held in memory.
#[derive(Debug)]
pub struct MemoryStore {
    server: String,
    inner: RwLock<Inner>,
    /// Fixed timestamp for new revisions; wall clock when unset.
    time: Mutex<Option<DateTime<Utc>>>,
    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Self::with_server(LOCAL_SERVER)
    }

    pub fn with_server(server: &str) -> Arc<Self> {
        Arc::new(Self {
            server: server.to_string(),
            inner: RwLock::new(Inner::default()),
            time: Mutex::new(None),
            counters: Counters::default(),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Bundle this store as every collaborator of a [`crate::Wiki`].
    pub fn services(self: &Arc<Self>) -> Services {
        Services {
            store: self.clone(),
            directory: self.clone(),
            transport: self.clone(),
            localizer: self.clone(),
        }
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            list: c.list.load(Ordering::Relaxed),
            child: c.child.load(Ordering::Relaxed),
            item_by_path: c.item_by_path.load(Ordering::Relaxed),
            content: c.content.load(Ordering::Relaxed),
            search: c.search.load(Ordering::Relaxed),
        }
    }

    /// Stamp subsequent writes with `at` instead of the wall clock.
    pub fn set_time(&self, at: DateTime<Utc>) {
        *self.time.lock() = Some(at);
    }

    fn now(&self) -> DateTime<Utc> {
        (*self.time.lock()).unwrap_or_else(Utc::now)
    }

    // ------------------------------------------------------------------------
    // Accounts and directory data
    // ------------------------------------------------------------------------

    /// Create an account hosted by this store, with its root and notebook folders.
    pub fn add_account(&self, id: &str, name: &str) {
        self.add_mailbox(id, name, &self.server);
    }

    /// Create an account hosted on another server.
    pub fn add_remote_account(&self, id: &str, name: &str, server: &str) {
        self.add_mailbox(id, name, server);
    }

    fn add_mailbox(&self, id: &str, name: &str, server: &str) {
        let at = self.now();
        let folder = |id: ItemId, name: &str| Item {
            current: Revision {
                meta: ItemMeta {
                    id,
                    folder_id: ROOT_FOLDER_ID,
                    kind: ItemKind::Folder,
                    name: name.to_string(),
                    version: 1,
                    created: at,
                    modified: at,
                    creator: String::new(),
                    modifier: String::new(),
                    fragment: String::new(),
                    tags: Vec::new(),
                },
                content: Arc::from(Vec::new()),
            },
            history: Vec::new(),
        };

        let mut items = BTreeMap::new();
        items.insert(ROOT_FOLDER_ID, folder(ROOT_FOLDER_ID, ""));
        items.insert(NOTEBOOK_FOLDER_ID, folder(NOTEBOOK_FOLDER_ID, "Notebook"));

        let mailbox = Mailbox {
            account: Account {
                id: id.to_string(),
                name: name.to_string(),
                locale: None,
                server: server.to_string(),
            },
            items,
            next_id: FIRST_USER_ID,
        };

        let mut inner = self.inner.write();
        inner.names.insert(name.to_lowercase(), id.to_string());
        inner.mailboxes.insert(id.to_string(), mailbox);
    }

    pub fn set_locale(&self, account_id: &str, locale: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let mailbox = inner
            .mailboxes
            .get_mut(account_id)
            .with_context(|| format!("no such account: {account_id}"))?;
        mailbox.account.locale = Some(locale.to_string());
        Ok(())
    }

    pub fn set_server(&self, account_id: &str, server: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let mailbox = inner
            .mailboxes
            .get_mut(account_id)
            .with_context(|| format!("no such account: {account_id}"))?;
        mailbox.account.server = server.to_string();
        Ok(())
    }

    /// Override the domain derived from the account name.
    pub fn set_domain(&self, account_id: &str, domain: &str) {
        self.inner
            .write()
            .domains
            .insert(account_id.to_string(), domain.to_string());
    }

    /// Set a config attribute globally (`domain = None`) or for one domain.
    pub fn set_attr(&self, domain: Option<&str>, name: &str, value: &str) {
        self.inner.write().attrs.insert(
            (domain.map(str::to_string), name.to_string()),
            value.to_string(),
        );
    }

    /// Prefix of every REST url, `/home` unless set.
    pub fn set_rest_base(&self, base: &str) {
        self.inner.write().rest_base = Some(base.trim_end_matches('/').to_string());
    }

    /// Add a catalog message; `locale = None` is the fallback entry.
    pub fn set_message(&self, key: &str, locale: Option<&str>, text: &str) {
        self.inner.write().messages.insert(
            (key.to_string(), locale.map(str::to_string)),
            text.to_string(),
        );
    }

    // ------------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------------

    pub fn add_folder(&self, account_id: &str, parent: ItemId, name: &str) -> Result<ItemId> {
        let author = self.account_name(account_id)?;
        let meta = self.insert_item(account_id, parent, name, ItemKind::Folder, &[], &author, self.now())?;
        Ok(meta.id)
    }

    /// Create a document, or add a revision if one with that name exists.
    pub fn put(
        &self,
        account_id: &str,
        folder: ItemId,
        name: &str,
        kind: ItemKind,
        content: &str,
        author: &str,
    ) -> Result<ItemId> {
        let existing = self.with_mailbox(account_id, |mailbox| {
            Ok(mailbox
                .children(folder)
                .find(|meta| meta.name.eq_ignore_ascii_case(name))
                .cloned())
        })?;
        let at = self.now();
        let meta = match existing {
            Some(meta) if meta.kind.is_document() => {
                self.append_at(account_id, meta.id, content.as_bytes(), author, at)?
            }
            Some(meta) => bail!("`{}` is a folder", meta.name),
            None => self.insert_item(account_id, folder, name, kind, content.as_bytes(), author, at)?,
        };
        Ok(meta.id)
    }

    pub fn set_tags(&self, account_id: &str, id: ItemId, tags: &[&str]) -> Result<()> {
        let mut inner = self.inner.write();
        let item = inner
            .mailboxes
            .get_mut(account_id)
            .and_then(|mailbox| mailbox.items.get_mut(&id))
            .with_context(|| format!("item {id} not found in account {account_id}"))?;
        item.current.meta.tags = tags.iter().map(|t| (*t).to_string()).collect();
        Ok(())
    }

    /// Id of the item at an absolute path.
    pub fn find(&self, account_id: &str, path: &str) -> Option<ItemId> {
        let inner = self.inner.read();
        inner.mailboxes.get(account_id)?.by_path(path).map(|meta| meta.id)
    }

    fn account_name(&self, account_id: &str) -> Result<String> {
        self.with_mailbox(account_id, |mailbox| Ok(mailbox.account.name.clone()))
    }

    fn with_mailbox<T>(&self, account_id: &str, f: impl FnOnce(&Mailbox) -> Result<T>) -> Result<T> {
        let inner = self.inner.read();
        let mailbox = inner
            .mailboxes
            .get(account_id)
            .with_context(|| format!("no mailbox for account {account_id}"))?;
        f(mailbox)
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_item(
        &self,
        account_id: &str,
        folder_id: ItemId,
        name: &str,
        kind: ItemKind,
        content: &[u8],
        author: &str,
        at: DateTime<Utc>,
    ) -> Result<ItemMeta> {
        let mut inner = self.inner.write();
        let mailbox = inner
            .mailboxes
            .get_mut(account_id)
            .with_context(|| format!("no mailbox for account {account_id}"))?;

        if !mailbox.meta(folder_id).is_some_and(ItemMeta::is_folder) {
            bail!("folder {folder_id} not found in account {account_id}");
        }
        if mailbox
            .children(folder_id)
            .any(|meta| meta.name.eq_ignore_ascii_case(name))
        {
            bail!("`{name}` already exists in folder {folder_id}");
        }

        let id = mailbox.next_id;
        mailbox.next_id += 1;
        let meta = ItemMeta {
            id,
            folder_id,
            kind,
            name: name.to_string(),
            version: 1,
            created: at,
            modified: at,
            creator: author.to_string(),
            modifier: author.to_string(),
            fragment: fragment_of(content),
            tags: Vec::new(),
        };
        mailbox.items.insert(
            id,
            Item {
                current: Revision {
                    meta: meta.clone(),
                    content: Arc::from(content),
                },
                history: Vec::new(),
            },
        );
        Ok(meta)
    }

    fn append_at(
        &self,
        account_id: &str,
        id: ItemId,
        content: &[u8],
        author: &str,
        at: DateTime<Utc>,
    ) -> Result<ItemMeta> {
        let mut inner = self.inner.write();
        let item = inner
            .mailboxes
            .get_mut(account_id)
            .and_then(|mailbox| mailbox.items.get_mut(&id))
            .with_context(|| format!("item {id} not found in account {account_id}"))?;
        if item.current.meta.is_folder() {
            bail!("cannot add a revision to folder `{}`", item.current.meta.name);
        }

        let mut meta = item.current.meta.clone();
        meta.version += 1;
        meta.modified = at;
        meta.modifier = author.to_string();
        meta.fragment = fragment_of(content);

        let next = Revision {
            meta: meta.clone(),
            content: Arc::from(content),
        };
        let previous = std::mem::replace(&mut item.current, next);
        item.history.push(previous);
        Ok(meta)
    }

    // ------------------------------------------------------------------------
    // Directory loader
    // ------------------------------------------------------------------------

    /// Build a store from a directory tree, one top-level directory per account.
    pub fn load_dir(root: &Path, server: &str) -> Result<Arc<Self>> {
        let store = Self::with_server(server);

        let mut accounts: Vec<PathBuf> = fs::read_dir(root)
            .with_context(|| format!("failed to read {}", root.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir() && !is_hidden_name(path))
            .collect();
        accounts.sort();

        for dir in accounts {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("invalid account directory {}", dir.display()))?;
            store.add_account(&name, &name);
            store
                .load_account(&name, &dir)
                .with_context(|| format!("failed to load account {name}"))?;
        }
        Ok(store)
    }

    fn load_account(&self, account_id: &str, dir: &Path) -> Result<()> {
        let mut folders: FxHashMap<PathBuf, ItemId> = FxHashMap::default();
        folders.insert(dir.to_path_buf(), ROOT_FOLDER_ID);

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            let parent = path
                .parent()
                .and_then(|p| folders.get(p))
                .copied()
                .with_context(|| format!("no parent folder for {}", path.display()))?;
            let file_name = entry.file_name().to_string_lossy();

            if entry.file_type().is_dir() {
                let id = if parent == ROOT_FOLDER_ID && file_name == "Notebook" {
                    NOTEBOOK_FOLDER_ID
                } else {
                    self.add_folder(account_id, parent, &file_name)?
                };
                folders.insert(path.to_path_buf(), id);
                continue;
            }

            let (name, kind) = page_name(&file_name);
            let content = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let at = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map_or_else(|| self.now(), DateTime::<Utc>::from);
            self.insert_item(account_id, parent, name, kind, &content, account_id, at)?;
        }
        Ok(())
    }
}

/// `Home.wiki` and `_Footer` are wiki pages; everything else is a document.
fn page_name(file_name: &str) -> (&str, ItemKind) {
    if let Some(stem) = file_name.strip_suffix(WIKI_EXTENSION) {
        (stem, ItemKind::Wiki)
    } else if file_name.starts_with('_') {
        (file_name, ItemKind::Wiki)
    } else {
        (file_name, ItemKind::Document)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_hidden_name(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

fn fragment_of(content: &[u8]) -> String {
    let text = String::from_utf8_lossy(content);
    let mut fragment = String::new();
    for word in text.split_whitespace() {
        if !fragment.is_empty() {
            fragment.push(' ');
        }
        fragment.push_str(word);
        if fragment.chars().count() >= FRAGMENT_LEN {
            break;
        }
    }
    fragment.chars().take(FRAGMENT_LEN).collect()
}

// ============================================================================
// Service Implementations
// ============================================================================

impl DocumentStore for MemoryStore {
    fn item(&self, account_id: &str, id: ItemId) -> Result<Option<ItemMeta>> {
        self.with_mailbox(account_id, |mailbox| Ok(mailbox.meta(id).cloned()))
    }

    fn list(&self, account_id: &str, folder_id: ItemId) -> Result<Vec<ItemMeta>> {
        bump(&self.counters.list);
        self.with_mailbox(account_id, |mailbox| {
            Ok(mailbox.children(folder_id).cloned().collect())
        })
    }

    fn item_by_path(&self, account_id: &str, path: &str) -> Result<Option<ItemMeta>> {
        bump(&self.counters.item_by_path);
        self.with_mailbox(account_id, |mailbox| Ok(mailbox.by_path(path).cloned()))
    }

    fn content(&self, account_id: &str, id: ItemId, version: u32) -> Result<Vec<u8>> {
        bump(&self.counters.content);
        self.with_mailbox(account_id, |mailbox| {
            let revision = mailbox
                .revision(id, version)
                .with_context(|| format!("item {id} has no revision {version}"))?;
            Ok(revision.content.to_vec())
        })
    }

    fn revisions(&self, account_id: &str, id: ItemId) -> Result<Vec<ItemMeta>> {
        self.with_mailbox(account_id, |mailbox| {
            Ok(mailbox
                .items
                .get(&id)
                .map(|item| item.history.iter().map(|rev| rev.meta.clone()).collect())
                .unwrap_or_default())
        })
    }

    fn append_revision(
        &self,
        account_id: &str,
        id: ItemId,
        content: &[u8],
        author: &str,
    ) -> Result<ItemMeta> {
        self.append_at(account_id, id, content, author, self.now())
    }

    fn create(
        &self,
        account_id: &str,
        folder_id: ItemId,
        name: &str,
        kind: ItemKind,
        content: &[u8],
        author: &str,
    ) -> Result<ItemMeta> {
        self.insert_item(account_id, folder_id, name, kind, content, author, self.now())
    }

    fn child(&self, account_id: &str, folder_id: ItemId, name: &str) -> Result<Option<ItemMeta>> {
        bump(&self.counters.child);
        self.with_mailbox(account_id, |mailbox| {
            Ok(mailbox
                .children(folder_id)
                .find(|meta| meta.name.eq_ignore_ascii_case(name))
                .cloned())
        })
    }
}

impl Directory for MemoryStore {
    fn account(&self, by: AccountBy<'_>) -> Result<Option<Account>> {
        let inner = self.inner.read();
        let id = match by {
            AccountBy::Id(id) => Some(id.to_string()),
            AccountBy::Name(name) => inner.names.get(&name.to_lowercase()).cloned(),
        };
        Ok(id
            .and_then(|id| inner.mailboxes.get(&id))
            .map(|mailbox| mailbox.account.clone()))
    }

    fn is_local(&self, account: &Account) -> bool {
        account.server == self.server
    }

    fn domain_of(&self, account_id: &str) -> Result<Option<String>> {
        let inner = self.inner.read();
        if let Some(domain) = inner.domains.get(account_id) {
            return Ok(Some(domain.clone()));
        }
        Ok(inner
            .mailboxes
            .get(account_id)
            .and_then(|mailbox| mailbox.account.name.split_once('@'))
            .map(|(_, domain)| domain.to_string()))
    }

    fn config_attr(&self, scope: AttrScope<'_>, name: &str) -> Result<Option<String>> {
        let domain = match scope {
            AttrScope::Global => None,
            AttrScope::Domain(domain) => Some(domain.to_string()),
        };
        Ok(self.inner.read().attrs.get(&(domain, name.to_string())).cloned())
    }

    fn rest_url(&self, account: &Account) -> String {
        let inner = self.inner.read();
        let base = inner.rest_base.as_deref().unwrap_or(DEFAULT_REST_BASE);
        format!("{base}/{}", account.name)
    }
}

impl RemoteTransport for MemoryStore {
    fn folder(&self, account: &Account, folder_id: ItemId) -> Result<FolderMeta> {
        let meta = DocumentStore::item(self, &account.id, folder_id)?
            .filter(ItemMeta::is_folder)
            .with_context(|| format!("remote folder {folder_id} not found for {}", account.name))?;
        let path = self.folder_path(&account.id, folder_id)?;
        Ok(FolderMeta {
            id: meta.id,
            name: meta.name,
            path,
        })
    }

    fn search(&self, account: &Account, folder_id: ItemId, limit: usize) -> Result<Vec<ItemMeta>> {
        bump(&self.counters.search);
        self.with_mailbox(&account.id, |mailbox| {
            Ok(mailbox.children(folder_id).take(limit).cloned().collect())
        })
    }

    fn item_by_path(&self, account: &Account, path: &str) -> Result<Option<ItemMeta>> {
        DocumentStore::item_by_path(self, &account.id, path)
    }

    fn content(&self, account: &Account, id: ItemId, version: u32) -> Result<Vec<u8>> {
        DocumentStore::content(self, &account.id, id, version)
    }
}

impl Localizer for MemoryStore {
    fn message(&self, key: &str, locale: Option<&str>) -> Option<String> {
        let inner = self.inner.read();
        locale
            .and_then(|l| inner.messages.get(&(key.to_string(), Some(l.to_string()))))
            .or_else(|| inner.messages.get(&(key.to_string(), None)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounts_have_root_and_notebook() {
        let store = MemoryStore::new();
        store.add_account("a1", "Alice@Example.com");

        let account = store.account(AccountBy::Name("alice@example.com")).unwrap().unwrap();
        assert_eq!(account.id, "a1");
        assert!(store.is_local(&account));

        assert_eq!(store.find("a1", "/"), Some(ROOT_FOLDER_ID));
        assert_eq!(store.find("a1", "/notebook"), Some(NOTEBOOK_FOLDER_ID));
        assert_eq!(store.folder_path("a1", NOTEBOOK_FOLDER_ID).unwrap(), "/Notebook");
        assert_eq!(store.domain_of("a1").unwrap().as_deref(), Some("Example.com"));
    }

    #[test]
    fn test_put_appends_revisions() {
        let store = MemoryStore::new();
        store.add_account("a1", "alice@example.com");
        let id = store
            .put("a1", NOTEBOOK_FOLDER_ID, "Home", ItemKind::Wiki, "one", "alice")
            .unwrap();
        let again = store
            .put("a1", NOTEBOOK_FOLDER_ID, "home", ItemKind::Wiki, "two", "bob")
            .unwrap();
        assert_eq!(id, again);
        assert_eq!(id, FIRST_USER_ID);

        let meta = store.item("a1", id).unwrap().unwrap();
        assert_eq!(meta.version, 2);
        assert_eq!(meta.creator, "alice");
        assert_eq!(meta.modifier, "bob");

        let history = store.revisions("a1", id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].version, 1);
        assert_eq!(DocumentStore::content(&*store, "a1", id, 1).unwrap(), b"one");
        assert_eq!(DocumentStore::content(&*store, "a1", id, 2).unwrap(), b"two");
    }

    #[test]
    fn test_create_rejects_duplicates_and_bad_folders() {
        let store = MemoryStore::new();
        store.add_account("a1", "alice@example.com");
        store
            .create("a1", NOTEBOOK_FOLDER_ID, "Home", ItemKind::Wiki, b"x", "alice")
            .unwrap();
        assert!(store
            .create("a1", NOTEBOOK_FOLDER_ID, "HOME", ItemKind::Wiki, b"y", "alice")
            .is_err());
        assert!(store
            .create("a1", 999, "Other", ItemKind::Wiki, b"y", "alice")
            .is_err());
    }

    #[test]
    fn test_localizer_falls_back() {
        let store = MemoryStore::new();
        store.set_message("notebook", None, "Notebook");
        store.set_message("notebook", Some("fr"), "Carnet");
        assert_eq!(store.message("notebook", Some("fr")).as_deref(), Some("Carnet"));
        assert_eq!(store.message("notebook", Some("de")).as_deref(), Some("Notebook"));
        assert_eq!(store.message("missing", None), None);
    }

    #[test]
    fn test_config_attrs() {
        let store = MemoryStore::new();
        store.set_attr(None, "notebookAccount", "global@example.com");
        store.set_attr(Some("example.com"), "notebookAccount", "wiki@example.com");
        assert_eq!(
            store.config_attr(AttrScope::Global, "notebookAccount").unwrap().as_deref(),
            Some("global@example.com")
        );
        assert_eq!(
            store
                .config_attr(AttrScope::Domain("example.com"), "notebookAccount")
                .unwrap()
                .as_deref(),
            Some("wiki@example.com")
        );
        assert_eq!(store.config_attr(AttrScope::Domain("other.org"), "notebookAccount").unwrap(), None);
    }

    #[test]
    fn test_rest_base() {
        let store = MemoryStore::new();
        store.add_account("a1", "alice@example.com");
        let account = store.account(AccountBy::Id("a1")).unwrap().unwrap();
        assert_eq!(store.rest_url(&account), "/home/alice@example.com");

        store.set_rest_base("https://mail.example.com/service/home/");
        assert_eq!(
            store.rest_url(&account),
            "https://mail.example.com/service/home/alice@example.com"
        );
    }

    #[test]
    fn test_fragment() {
        assert_eq!(fragment_of(b"  Hello\n\n  world  "), "Hello world");
        assert_eq!(fragment_of("x ".repeat(200).as_bytes()).chars().count(), FRAGMENT_LEN);
    }

    #[test]
    fn test_page_name() {
        assert_eq!(page_name("Home.wiki"), ("Home", ItemKind::Wiki));
        assert_eq!(page_name("_Footer"), ("_Footer", ItemKind::Wiki));
        assert_eq!(page_name("notes.txt"), ("notes.txt", ItemKind::Document));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        let alice = dir.path().join("alice@example.com");
        fs::create_dir_all(alice.join("Notebook/Recipes")).unwrap();
        fs::create_dir_all(alice.join(".git")).unwrap();
        fs::write(alice.join("Notebook/Home.wiki"), "Welcome {{NAME}}").unwrap();
        fs::write(alice.join("Notebook/_Footer"), "footer").unwrap();
        fs::write(alice.join("Notebook/Recipes/Soup.wiki"), "soup").unwrap();
        fs::write(alice.join("notes.txt"), "plain").unwrap();
        fs::write(alice.join(".git/config"), "ignored").unwrap();
        fs::write(dir.path().join("stray.txt"), "not an account").unwrap();

        let store = MemoryStore::load_dir(dir.path(), LOCAL_SERVER).unwrap();
        let account = store
            .account(AccountBy::Name("alice@example.com"))
            .unwrap()
            .unwrap();

        let home = store.find(&account.id, "/Notebook/Home").unwrap();
        let meta = store.item(&account.id, home).unwrap().unwrap();
        assert_eq!(meta.kind, ItemKind::Wiki);
        assert_eq!(meta.folder_id, NOTEBOOK_FOLDER_ID);

        let footer = store.find(&account.id, "/Notebook/_Footer").unwrap();
        assert_eq!(store.item(&account.id, footer).unwrap().unwrap().kind, ItemKind::Wiki);

        let soup = store.find(&account.id, "/Notebook/Recipes/Soup").unwrap();
        assert_eq!(
            DocumentStore::content(&*store, &account.id, soup, 1).unwrap(),
            b"soup"
        );

        let notes = store.find(&account.id, "/notes.txt").unwrap();
        assert_eq!(store.item(&account.id, notes).unwrap().unwrap().kind, ItemKind::Document);

        assert!(store.find(&account.id, "/.git").is_none());
        assert!(store.account(AccountBy::Name("stray.txt")).unwrap().is_none());
    }

    #[test]
    fn test_remote_transport_serves_remote_accounts() {
        let store = MemoryStore::new();
        store.add_remote_account("r1", "remy@example.com", "mail2");
        let account = store.account(AccountBy::Id("r1")).unwrap().unwrap();
        assert!(!store.is_local(&account));

        let folder = RemoteTransport::folder(&*store, &account, NOTEBOOK_FOLDER_ID).unwrap();
        assert_eq!(folder.path, "/Notebook");
        assert!(RemoteTransport::folder(&*store, &account, 999).is_err());
    }
}
