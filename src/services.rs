//! Collaborator interfaces consumed by the renderer.
//!
//! The renderer never owns accounts, folders or bytes. It talks to four
//! services, each behind a blocking `Send + Sync` trait:
//!
//! | Trait | Provides |
//! |-------|----------|
//! | [`DocumentStore`] | folder listings, item metadata, revisions, content |
//! | [`Directory`] | accounts, domains, config attributes, REST base urls |
//! | [`RemoteTransport`] | the same data for mailboxes hosted on another server |
//! | [`Localizer`] | message catalog lookups |
//!
//! [`crate::memory::MemoryStore`] implements all four for tests and the CLI.

use std::fmt;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Item identifier, unique within one mailbox.
pub type ItemId = u32;

/// The account's root folder. Breadcrumbs stop here.
pub const ROOT_FOLDER_ID: ItemId = 1;

/// The well-known default notebook folder, labelled through the localizer.
pub const NOTEBOOK_FOLDER_ID: ItemId = 12;

/// Config attribute naming the account that holds fallback templates.
pub const NOTEBOOK_ACCOUNT_ATTR: &str = "notebookAccount";

/// First id handed out to user-created items.
pub const FIRST_USER_ID: ItemId = 256;

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    Wiki,
    Document,
}

impl ItemKind {
    pub const fn is_document(self) -> bool {
        matches!(self, Self::Wiki | Self::Document)
    }

    /// Parse a view name (`wiki`, `document`, `folder`).
    pub fn from_view(view: &str) -> Option<Self> {
        match view.to_ascii_lowercase().as_str() {
            "wiki" => Some(Self::Wiki),
            "document" => Some(Self::Document),
            "folder" => Some(Self::Folder),
            _ => None,
        }
    }
}

/// Metadata snapshot of one item revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMeta {
    pub id: ItemId,
    /// Parent folder. The root folder is its own parent.
    pub folder_id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub version: u32,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Author of the first revision.
    pub creator: String,
    /// Author of this revision.
    pub modifier: String,
    pub fragment: String,
    pub tags: Vec<String>,
}

impl ItemMeta {
    pub const fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder)
    }
}

/// Remote folder metadata returned by [`RemoteTransport::folder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMeta {
    pub id: ItemId,
    pub name: String,
    /// Absolute path from the account root, e.g. `/Notebook/Recipes`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub locale: Option<String>,
    /// Server hosting the account's mailbox.
    pub server: String,
}

#[derive(Debug, Clone, Copy)]
pub enum AccountBy<'a> {
    Id(&'a str),
    Name(&'a str),
}

impl fmt::Display for AccountBy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "name {name}"),
        }
    }
}

/// Where a config attribute is looked up.
#[derive(Debug, Clone, Copy)]
pub enum AttrScope<'a> {
    Global,
    Domain(&'a str),
}

// ============================================================================
// Traits
// ============================================================================

/// Folder/item persistence for mailboxes hosted on this server.
pub trait DocumentStore: Send + Sync {
    fn item(&self, account_id: &str, id: ItemId) -> Result<Option<ItemMeta>>;

    /// Children of a folder (subfolders and documents), unordered.
    fn list(&self, account_id: &str, folder_id: ItemId) -> Result<Vec<ItemMeta>>;

    /// Resolve an absolute path (`/Notebook/page`) from the account root.
    fn item_by_path(&self, account_id: &str, path: &str) -> Result<Option<ItemMeta>>;

    fn content(&self, account_id: &str, id: ItemId, version: u32) -> Result<Vec<u8>>;

    /// Prior revisions of an item, oldest first, excluding the current one.
    fn revisions(&self, account_id: &str, id: ItemId) -> Result<Vec<ItemMeta>>;

    fn append_revision(
        &self,
        account_id: &str,
        id: ItemId,
        content: &[u8],
        author: &str,
    ) -> Result<ItemMeta>;

    fn create(
        &self,
        account_id: &str,
        folder_id: ItemId,
        name: &str,
        kind: ItemKind,
        content: &[u8],
        author: &str,
    ) -> Result<ItemMeta>;

    /// Find a child by name, case-insensitively.
    fn child(&self, account_id: &str, folder_id: ItemId, name: &str) -> Result<Option<ItemMeta>> {
        Ok(self
            .list(account_id, folder_id)?
            .into_iter()
            .find(|item| item.name.eq_ignore_ascii_case(name)))
    }

    /// Folders from just below the root down to `folder_id`, outermost first.
    /// Empty for the root itself.
    fn ancestors(&self, account_id: &str, folder_id: ItemId) -> Result<Vec<ItemMeta>> {
        let mut chain = Vec::new();
        let mut id = folder_id;
        while id != ROOT_FOLDER_ID && chain.len() < MAX_FOLDER_DEPTH {
            let Some(folder) = self.item(account_id, id)? else {
                bail!("folder {id} not found in account {account_id}");
            };
            let parent = folder.folder_id;
            chain.push(folder);
            if parent == id {
                break;
            }
            id = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Absolute path of a folder, `/` for the root.
    fn folder_path(&self, account_id: &str, folder_id: ItemId) -> Result<String> {
        let chain = self.ancestors(account_id, folder_id)?;
        if chain.is_empty() {
            return Ok("/".to_string());
        }
        Ok(chain.iter().fold(String::new(), |mut path, folder| {
            path.push('/');
            path.push_str(&folder.name);
            path
        }))
    }
}

/// Guard against corrupt parent links.
const MAX_FOLDER_DEPTH: usize = 256;

/// Accounts, domains and configuration attributes.
pub trait Directory: Send + Sync {
    fn account(&self, by: AccountBy<'_>) -> Result<Option<Account>>;

    /// Whether the account's mailbox is hosted by this process.
    fn is_local(&self, account: &Account) -> bool;

    fn domain_of(&self, account_id: &str) -> Result<Option<String>>;

    fn config_attr(&self, scope: AttrScope<'_>, name: &str) -> Result<Option<String>>;

    /// Base of the account's REST urls; item paths are appended to it.
    fn rest_url(&self, account: &Account) -> String {
        format!("/home/{}", account.name)
    }
}

/// Access to mailboxes hosted on other servers.
pub trait RemoteTransport: Send + Sync {
    fn folder(&self, account: &Account, folder_id: ItemId) -> Result<FolderMeta>;

    /// Bounded listing of a remote folder.
    fn search(&self, account: &Account, folder_id: ItemId, limit: usize) -> Result<Vec<ItemMeta>>;

    fn item_by_path(&self, account: &Account, path: &str) -> Result<Option<ItemMeta>>;

    fn content(&self, account: &Account, id: ItemId, version: u32) -> Result<Vec<u8>>;
}

pub trait Localizer: Send + Sync {
    fn message(&self, key: &str, locale: Option<&str>) -> Option<String>;
}

/// Transport for single-server deployments: every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemote;

impl RemoteTransport for NoRemote {
    fn folder(&self, account: &Account, _folder_id: ItemId) -> Result<FolderMeta> {
        bail!("no remote transport for server {}", account.server)
    }

    fn search(&self, account: &Account, _folder_id: ItemId, _limit: usize) -> Result<Vec<ItemMeta>> {
        bail!("no remote transport for server {}", account.server)
    }

    fn item_by_path(&self, account: &Account, _path: &str) -> Result<Option<ItemMeta>> {
        bail!("no remote transport for server {}", account.server)
    }

    fn content(&self, account: &Account, _id: ItemId, _version: u32) -> Result<Vec<u8>> {
        bail!("no remote transport for server {}", account.server)
    }
}

/// The collaborators a [`crate::Wiki`] is built from.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub directory: Arc<dyn Directory>,
    pub transport: Arc<dyn RemoteTransport>,
    pub localizer: Arc<dyn Localizer>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_from_view() {
        assert_eq!(ItemKind::from_view("wiki"), Some(ItemKind::Wiki));
        assert_eq!(ItemKind::from_view("Document"), Some(ItemKind::Document));
        assert_eq!(ItemKind::from_view("calendar"), None);
        assert!(ItemKind::Wiki.is_document());
        assert!(!ItemKind::Folder.is_document());
    }

    #[test]
    fn test_no_remote_fails() {
        let account = Account {
            id: "a1".into(),
            name: "bob@example.com".into(),
            locale: None,
            server: "mail2".into(),
        };
        let err = NoRemote.search(&account, 12, 10).unwrap_err();
        assert!(err.to_string().contains("mail2"));
    }
}
