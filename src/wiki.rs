//! The rendering engine.
//!
//! A [`Wiki`] owns the three caches and the directive table, and borrows
//! everything else from its [`Services`]:
//!
//! ```text
//! render_page ──► page cache ──miss──► item template ──► chrome? ──► composition cache
//!                                                              └──► compose::render
//! template lookup ──► notebook cache ──► Notebook::lookup ──► parents (`_` names)
//!                                                        └──► fallback accounts
//! ```
//!
//! One `Wiki` is shared by every request thread. Renders never hold a cache
//! lock while fetching or rendering; writes through [`Wiki::add_page`] are
//! serialized so name checks and version checks stay atomic.

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::Mutex;

use crate::cache::{
    Clock, CompositionCache, CompositionKey, PageKey, PageRenderCache, SystemClock, TtlCache,
};
use crate::compose;
use crate::config::WikiConfig;
use crate::context::{Context, Request};
use crate::error::{Result, WikiError};
use crate::log;
use crate::notebook::{Notebook, ScopeKey, resolve_scope};
use crate::page::{Origin, Page};
use crate::services::{
    Account, AccountBy, AttrScope, ItemId, ItemKind, ItemMeta, NOTEBOOK_ACCOUNT_ATTR,
    ROOT_FOLDER_ID, Services,
};
use crate::template::Template;
use crate::url::WikiUrl;
use crate::wiklet::WikletTable;

/// Source used for folders rendered as pages.
const FOLDER_SOURCE: &str = "{{TOC}}";

/// Guard against corrupt parent links while climbing notebooks.
const MAX_CLIMB: usize = 64;

/// A document to create, or a new revision of an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEdit {
    pub account_id: String,
    pub folder_id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    pub content: String,
    pub author: String,
    /// Version the edit was based on; `None` creates a new page.
    pub base_version: Option<u32>,
}

type NotebookCache = TtlCache<(String, ScopeKey), Arc<Notebook>>;

pub struct Wiki {
    services: Services,
    config: WikiConfig,
    wiklets: WikletTable,
    clock: Arc<dyn Clock>,
    notebooks: NotebookCache,
    pages: PageRenderCache,
    compositions: CompositionCache,
    writes: Mutex<()>,
}

impl fmt::Debug for Wiki {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiki")
            .field("wiklets", &self.wiklets.len())
            .field("notebooks", &self.notebooks)
            .field("pages", &self.pages)
            .field("compositions", &self.compositions)
            .finish_non_exhaustive()
    }
}

impl Wiki {
    pub fn new(services: Services, config: WikiConfig) -> Self {
        Self::with_clock(services, config, Arc::new(SystemClock))
    }

    pub fn with_clock(services: Services, config: WikiConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = Some(config.cache.ttl());
        let cache = &config.cache;
        Self {
            notebooks: TtlCache::new(cache.notebooks, ttl, clock.clone()),
            pages: TtlCache::new(cache.renders, ttl, clock.clone()),
            compositions: TtlCache::new(cache.compositions, ttl, clock.clone()),
            services,
            config,
            wiklets: WikletTable::standard(),
            clock,
            writes: Mutex::new(()),
        }
    }

    /// Replace the directive table.
    pub fn with_wiklets(mut self, wiklets: WikletTable) -> Self {
        self.wiklets = wiklets;
        self
    }

    #[inline]
    pub fn services(&self) -> &Services {
        &self.services
    }

    #[inline]
    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    #[inline]
    pub fn wiklets(&self) -> &WikletTable {
        &self.wiklets
    }

    #[inline]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ========================================================================
    // Accounts and notebooks
    // ========================================================================

    pub fn account(&self, account_id: &str) -> Result<Arc<Account>> {
        self.services
            .directory
            .account(AccountBy::Id(account_id))?
            .map(Arc::new)
            .ok_or_else(|| WikiError::NoSuchAccount(account_id.to_string()))
    }

    /// Cached notebook of `account` at `scope`.
    pub fn notebook(&self, account_id: &str, scope: &ScopeKey) -> Result<Arc<Notebook>> {
        let account = self.account(account_id)?;
        self.notebook_for(&account, scope)
    }

    fn notebook_for(&self, account: &Arc<Account>, scope: &ScopeKey) -> Result<Arc<Notebook>> {
        let key = resolve_scope(&self.services, account, scope)?;
        let cache_key = (account.id.clone(), key.clone());
        if let Some(notebook) = self.notebooks.get(&cache_key) {
            return Ok(notebook);
        }
        let notebook = Notebook::open(
            &self.services,
            account.clone(),
            key,
            self.config.cache.pages,
            self.clock.clone(),
        )?;
        Ok(self.notebooks.get_or_insert(cache_key, Arc::new(notebook)))
    }

    /// Find a document by name in one notebook, without inheritance.
    pub fn lookup_page(&self, account_id: &str, scope: &ScopeKey, name: &str) -> Result<Option<Arc<Page>>> {
        self.notebook(account_id, scope)?.lookup(&self.services, name)
    }

    // ========================================================================
    // Template resolution
    // ========================================================================

    /// Resolve `name` as seen from the notebook at `scope`, with inheritance.
    /// Anything short of a store failure yields the missing placeholder.
    pub fn resolve_template(&self, account_id: &str, scope: &ScopeKey, name: &str) -> Result<Arc<Template>> {
        let account = match self.account(account_id) {
            Ok(account) => account,
            Err(err) if err.is_recoverable() => {
                log!("render"; "template {name}: {err}");
                return Ok(Arc::new(Template::missing(name)));
            }
            Err(err) => return Err(err),
        };
        let current = match scope {
            ScopeKey::Folder(id) => Some(*id),
            ScopeKey::Path(_) => None,
        };
        self.resolve_in(&account, scope, current, name)
    }

    /// Resolve `name` as seen from `page`.
    pub fn template_for(&self, page: &Page, name: &str) -> Result<Arc<Template>> {
        let current = if page.is_folder() {
            page.id()
        } else {
            page.meta().folder_id
        };
        self.resolve_in(page.account(), &page.notebook_scope(), Some(current), name)
    }

    fn resolve_in(
        &self,
        account: &Arc<Account>,
        scope: &ScopeKey,
        current: Option<ItemId>,
        name: &str,
    ) -> Result<Arc<Template>> {
        match self.find_template(account, scope, current, name) {
            Ok(Some(template)) => Ok(template),
            Ok(None) => {
                log!("render"; "missing template {name} in {}:{scope}", account.name);
                Ok(Arc::new(Template::missing(name)))
            }
            Err(err) if err.is_recoverable() => {
                log!("render"; "template {name}: {err}");
                Ok(Arc::new(Template::missing(name)))
            }
            Err(err) => Err(err),
        }
    }

    fn find_template(
        &self,
        account: &Arc<Account>,
        scope: &ScopeKey,
        current: Option<ItemId>,
        name: &str,
    ) -> Result<Option<Arc<Template>>> {
        if name.contains('/') {
            let page = self.find_page_by_path(&account.id, name, current, false)?;
            return page.template(&self.services).map(Some);
        }

        let mut notebook = self.notebook_for(account, scope)?;
        if let Some(page) = notebook.lookup(&self.services, name)? {
            return page.template(&self.services).map(Some);
        }
        if !name.starts_with('_') {
            return Ok(None);
        }

        for _ in 0..MAX_CLIMB {
            let Some(parent) = notebook.parent().cloned() else {
                break;
            };
            notebook = match self.notebook_for(account, &parent) {
                Ok(notebook) => notebook,
                Err(err) if err.is_recoverable() => break,
                Err(err) => return Err(err),
            };
            if let Some(page) = notebook.lookup(&self.services, name)? {
                return page.template(&self.services).map(Some);
            }
        }

        match self.lookup_fallback(account, name)? {
            Some(page) => page.template(&self.services).map(Some),
            None => Ok(None),
        }
    }

    /// Accounts holding shared templates: the domain's, then the global one.
    fn fallback_accounts(&self, account: &Account) -> Result<Vec<Arc<Account>>> {
        let directory = &self.services.directory;
        let mut names = Vec::with_capacity(2);
        if let Some(domain) = directory.domain_of(&account.id)? {
            names.extend(directory.config_attr(AttrScope::Domain(&domain), NOTEBOOK_ACCOUNT_ATTR)?);
        }
        names.extend(directory.config_attr(AttrScope::Global, NOTEBOOK_ACCOUNT_ATTR)?);
        names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

        let mut accounts = Vec::with_capacity(names.len());
        for name in names {
            match directory.account(AccountBy::Name(&name))? {
                Some(found) => accounts.push(Arc::new(found)),
                None => log!("render"; "template account {name} does not exist"),
            }
        }
        Ok(accounts)
    }

    fn lookup_fallback(&self, account: &Account, name: &str) -> Result<Option<Arc<Page>>> {
        let scope = ScopeKey::parse(&self.config.templates.folder);
        for fallback in self.fallback_accounts(account)? {
            let notebook = match self.notebook_for(&fallback, &scope) {
                Ok(notebook) => notebook,
                Err(err) if err.is_recoverable() => {
                    log!("render"; "no template folder in {}: {err}", fallback.name);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if let Some(page) = notebook.lookup(&self.services, name)? {
                return Ok(Some(page));
            }
        }
        Ok(None)
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Find the page or folder a link points at, read from folder `current`.
    ///
    /// With `traverse`, a name missing from its folder is looked up in the
    /// fallback template accounts too.
    pub fn find_page_by_path(
        &self,
        account_id: &str,
        path: &str,
        current: Option<ItemId>,
        traverse: bool,
    ) -> Result<Arc<Page>> {
        let url = WikiUrl::parse(path, current);
        if url.is_external() {
            return Err(WikiError::InvalidPath(path.to_string()));
        }
        let owner = Arc::new(url.owner(&self.services, account_id)?);
        let item_path = url.item_path(&self.services, &owner)?;
        let trimmed = item_path.trim_end_matches('/');
        if trimmed.is_empty() {
            return self.folder_page(&owner, ROOT_FOLDER_ID, "/");
        }

        let (parent, name) = match trimmed.rfind('/') {
            Some(0) | None => ("/", trimmed.trim_start_matches('/')),
            Some(index) => (&trimmed[..index], &trimmed[index + 1..]),
        };

        match self.notebook_for(&owner, &ScopeKey::Path(parent.to_string())) {
            Ok(notebook) => {
                if let Some(page) = notebook.lookup(&self.services, name)? {
                    return Ok(page);
                }
            }
            Err(err) if err.is_recoverable() => {}
            Err(err) => return Err(err),
        }

        let local = self.services.directory.is_local(&owner);
        let found = if local {
            self.services.store.item_by_path(&owner.id, trimmed)?
        } else {
            self.services.transport.item_by_path(&owner, trimmed)?
        };
        if let Some(meta) = found.filter(ItemMeta::is_folder) {
            let scope = if local {
                ScopeKey::Folder(meta.folder_id)
            } else {
                ScopeKey::Path(parent.to_string())
            };
            let origin = if local { Origin::Local } else { Origin::Remote };
            return Ok(Arc::new(Page::new(owner, meta, origin, scope)));
        }

        if traverse && let Some(page) = self.lookup_fallback(&owner, name)? {
            return Ok(page);
        }
        Err(WikiError::NotFound(path.to_string()))
    }

    fn folder_page(&self, account: &Arc<Account>, id: ItemId, label: &str) -> Result<Arc<Page>> {
        if !self.services.directory.is_local(account) {
            return Err(WikiError::NotFound(format!("{label} on {}", account.server)));
        }
        let meta = self
            .services
            .store
            .item(&account.id, id)?
            .ok_or_else(|| WikiError::NotFound(label.to_string()))?;
        let scope = ScopeKey::Folder(meta.folder_id);
        Ok(Arc::new(Page::new(account.clone(), meta, Origin::Local, scope)))
    }

    /// Item `id` of a local account. Documents come from their notebook when
    /// the cached snapshot is still current.
    pub fn page_by_id(&self, account_id: &str, id: ItemId) -> Result<Arc<Page>> {
        let account = self.account(account_id)?;
        if !self.services.directory.is_local(&account) {
            return Err(WikiError::NotFound(format!(
                "item {id} of {} is hosted on {}",
                account.name, account.server
            )));
        }
        let meta = self
            .services
            .store
            .item(&account.id, id)?
            .ok_or_else(|| WikiError::NotFound(format!("item {id}")))?;
        if meta.is_folder() {
            return self.folder_page(&account, id, &meta.name);
        }

        let scope = ScopeKey::Folder(meta.folder_id);
        let notebook = self.notebook_for(&account, &scope)?;
        if let Some(page) = notebook.lookup(&self.services, &meta.name)?
            && page.meta() == &meta
        {
            return Ok(page);
        }
        Ok(Arc::new(Page::new(account, meta, Origin::Local, scope)))
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render `raw` with `subject` as the subject item. Not cached.
    pub fn render(&self, raw: &str, subject: &Arc<Page>, request: &Request) -> Result<String> {
        let template = Template::new(raw);
        let mut cx = Context::new(self, request, subject.clone());
        compose::render(&template, &mut cx)
    }

    /// Render `item` for `request`, inside `chrome` (or the configured
    /// default chrome) when there is one.
    pub fn render_page(&self, request: &Request, item: &Arc<Page>, chrome: Option<&str>) -> Result<Arc<str>> {
        let chrome = chrome.or(self.config.render.chrome.as_deref());
        let key = PageKey {
            requestor: request.requestor.clone(),
            account_id: item.account().id.clone(),
            item_id: item.id(),
            chrome: chrome.map(str::to_string),
        };
        if let Some(hit) = self.pages.get(&key) {
            return Ok(hit);
        }

        let item_template = if item.is_folder() {
            Arc::new(Template::new(FOLDER_SOURCE))
        } else if item.is_wiki() {
            item.template(&self.services)?
        } else {
            Arc::new(Template::new(item.content(&self.services)?))
        };

        let mut cx = Context::new(self, request, item.clone());
        let body: Arc<str> = match chrome {
            None => Arc::from(compose::render(&item_template, &mut cx)?),
            Some(name) => {
                let chrome = cx.find_template(name)?;
                if item.is_wiki() && !item_template.is_anonymous() {
                    self.composed(&item_template, &chrome, &mut cx)?
                } else {
                    Arc::from(compose::compose(&item_template, &chrome, &mut cx)?)
                }
            }
        };
        Ok(self.pages.get_or_insert(key, body))
    }

    /// Chrome + wiki page, shared across requestors through the composition cache.
    fn composed(&self, item_template: &Arc<Template>, chrome: &Template, cx: &mut Context<'_>) -> Result<Arc<str>> {
        cx.item_template = Some(item_template.clone());
        let mut inclusions = compose::enumerate_inclusions(chrome, cx);
        if !inclusions.iter().any(|t| t.id() == item_template.id()) {
            inclusions.push(item_template.clone());
        }
        let key = CompositionKey::new(chrome, &inclusions);
        if let Some(hit) = self.compositions.get(&key) {
            return Ok(hit);
        }
        let body = compose::compose(item_template, chrome, cx)?;
        Ok(self.compositions.get_or_insert(key, Arc::from(body)))
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Forget `name` in the notebook at `scope`, and every render it fed.
    pub fn invalidate(&self, account_id: &str, scope: &ScopeKey, name: &str) -> Result<()> {
        let account = self.account(account_id)?;
        let key = match resolve_scope(&self.services, &account, scope) {
            Ok(key) => key,
            Err(err) if err.is_recoverable() => scope.clone(),
            Err(err) => return Err(err),
        };
        if let Some(notebook) = self.notebooks.get(&(account.id.clone(), key.clone())) {
            notebook.expire(name);
        }

        // Any page may INCLUDE any other, across notebooks and accounts
        self.pages.clear();
        if name.starts_with('_') {
            // Listings pick their item and body templates at render time
            self.compositions.clear();
        } else {
            // Sibling edits change TOC and HISTORY output too
            let prefix = format!("{}:{key}:", account.id);
            self.compositions.retain(|k, _| !k.mentions_prefix(&prefix));
        }
        log!("cache"; "invalidated {name} in {}:{key}", account.name);
        Ok(())
    }

    /// Drop one notebook and every rendered page.
    pub fn expire_notebook(&self, account_id: &str, scope: &ScopeKey) -> Result<()> {
        let account = self.account(account_id)?;
        let key = resolve_scope(&self.services, &account, scope)?;
        self.notebooks.remove(&(account.id.clone(), key));
        self.pages.clear();
        self.compositions.clear();
        Ok(())
    }

    pub fn expire_all(&self) {
        self.notebooks.clear();
        self.pages.clear();
        self.compositions.clear();
        log!("cache"; "expired all notebooks and renders");
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create a page, or add a revision on top of `base_version`.
    ///
    /// | Existing page | `base_version` | Result |
    /// |---------------|----------------|--------|
    /// | none | `None` | created at version 1 |
    /// | none | `Some(_)` | `NotFound` |
    /// | yes | `None` | `AlreadyExists` |
    /// | yes | `Some(current)` | new revision |
    /// | yes | `Some(other)` | `ModifyConflict` |
    pub fn add_page(&self, edit: PageEdit) -> Result<Arc<Page>> {
        let account = self.account(&edit.account_id)?;
        if !self.services.directory.is_local(&account) {
            return Err(WikiError::Upstream(anyhow!(
                "cannot write to {}: mailbox is hosted on {}",
                account.name,
                account.server
            )));
        }
        if !edit.kind.is_document() {
            return Err(WikiError::NotWikiItem(edit.name));
        }

        let store = &self.services.store;
        let meta = {
            let _guard = self.writes.lock();
            let existing = store.child(&account.id, edit.folder_id, &edit.name)?;
            match (existing, edit.base_version) {
                (Some(existing), None) => {
                    return Err(WikiError::AlreadyExists {
                        name: existing.name,
                        id: existing.id,
                        version: existing.version,
                    });
                }
                (Some(existing), Some(_)) if existing.is_folder() => {
                    return Err(WikiError::NotWikiItem(existing.name));
                }
                (Some(existing), Some(base)) if base != existing.version => {
                    return Err(WikiError::ModifyConflict {
                        name: existing.name,
                        id: existing.id,
                        version: existing.version,
                    });
                }
                (Some(existing), Some(_)) => store.append_revision(
                    &account.id,
                    existing.id,
                    edit.content.as_bytes(),
                    &edit.author,
                )?,
                (None, Some(_)) => return Err(WikiError::NotFound(edit.name)),
                (None, None) => store.create(
                    &account.id,
                    edit.folder_id,
                    &edit.name,
                    edit.kind,
                    edit.content.as_bytes(),
                    &edit.author,
                )?,
            }
        };

        self.invalidate(&account.id, &ScopeKey::Folder(edit.folder_id), &meta.name)?;
        log!("wiki"; "saved {} v{} for {}", meta.name, meta.version, account.name);
        self.page_by_id(&account.id, meta.id)
    }
}
