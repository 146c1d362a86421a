//! Wiki link resolution.
//!
//! Links inside pages come in four forms:
//!
//! | Form | Example | Owner | Path |
//! |------|---------|-------|------|
//! | external | `https://example.com/x` | - | passed through |
//! | cross-account | `//bob@example.com/Notebook/Page` | named account | after the account |
//! | absolute | `/Notebook/Page` | reference account | as written |
//! | relative | `../Other/Page` | reference account | current folder + link |
//!
//! Every internal path is normalized (`.` dropped, `..` applied) and escaped
//! before being appended to the owner's REST base.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::error::{Result, WikiError};
use crate::services::{Account, AccountBy, ItemId, ItemMeta, Services};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Form {
    External,
    CrossAccount { account: String, path: String },
    Absolute,
    Relative,
}

/// A link as written in a page, anchored at the folder it appears in.
#[derive(Debug, Clone)]
pub struct WikiUrl {
    url: String,
    form: Form,
    /// Folder a relative link is resolved against.
    current: Option<ItemId>,
    filename: String,
    is_folder: bool,
}

impl WikiUrl {
    /// Parse `url` as written inside folder `current`.
    pub fn parse(url: &str, current: Option<ItemId>) -> Self {
        let form = if url.starts_with("http://") || url.starts_with("https://") {
            Form::External
        } else if let Some(rest) = url.strip_prefix("//") {
            let (account, path) = match rest.find('/') {
                Some(slash) => (&rest[..slash], &rest[slash..]),
                None => (rest, "/"),
            };
            Form::CrossAccount {
                account: account.to_string(),
                path: path.to_string(),
            }
        } else if url.starts_with('/') {
            Form::Absolute
        } else {
            Form::Relative
        };

        let filename = url.rsplit('/').next().unwrap_or(url).to_string();
        Self {
            url: url.to_string(),
            form,
            current,
            filename,
            is_folder: false,
        }
    }

    /// Link to an existing item, relative to its folder.
    pub fn for_item(item: &ItemMeta) -> Self {
        let mut url = Self::parse(&item.name, Some(item.folder_id));
        url.is_folder = item.is_folder();
        url
    }

    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last path component.
    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub const fn is_external(&self) -> bool {
        matches!(self.form, Form::External)
    }

    pub const fn is_cross_account(&self) -> bool {
        matches!(self.form, Form::CrossAccount { .. })
    }

    /// Account owning the target: the named one for `//account/…` links,
    /// otherwise `reference`.
    pub fn owner(&self, services: &Services, reference: &str) -> Result<Account> {
        let by = match &self.form {
            Form::CrossAccount { account, .. } => AccountBy::Name(account),
            _ => AccountBy::Id(reference),
        };
        services
            .directory
            .account(by)?
            .ok_or_else(|| WikiError::NoSuchAccount(by.to_string()))
    }

    /// Normalized, escaped path of the target inside the owner's mailbox.
    pub fn path(&self, services: &Services, owner: &Account) -> Result<String> {
        if self.is_external() {
            return Ok(self.url.clone());
        }
        normalize_path(&self.joined(services, owner)?, self.is_folder)
    }

    /// Normalized path with names left as written, for store lookups.
    pub fn item_path(&self, services: &Services, owner: &Account) -> Result<String> {
        if self.is_external() {
            return Err(WikiError::InvalidPath(self.url.clone()));
        }
        normalize(&self.joined(services, owner)?, self.is_folder, false)
    }

    fn joined(&self, services: &Services, owner: &Account) -> Result<String> {
        Ok(match &self.form {
            Form::External => self.url.clone(),
            Form::CrossAccount { path, .. } => path.clone(),
            Form::Absolute => self.url.clone(),
            Form::Relative => {
                let Some(current) = self.current.filter(|id| *id > 0) else {
                    return Err(WikiError::InvalidPath(self.url.clone()));
                };
                let mut base = if services.directory.is_local(owner) {
                    services.store.folder_path(&owner.id, current)?
                } else {
                    services.transport.folder(owner, current)?.path
                };
                if !base.ends_with('/') {
                    base.push('/');
                }
                base.push_str(&self.url);
                base
            }
        })
    }

    /// REST url of the target.
    pub fn full_url(&self, services: &Services, reference: &str) -> Result<String> {
        if self.is_external() {
            return Ok(self.url.clone());
        }
        let owner = self.owner(services, reference)?;
        let path = self.path(services, &owner)?;
        Ok(format!("{}{}", services.directory.rest_url(&owner), path))
    }

    /// Path of the folder holding the target, `/` for top-level targets.
    pub fn folder_path(&self, services: &Services, owner: &Account) -> Result<String> {
        let path = self.path(services, owner)?;
        Ok(match path.rfind('/') {
            Some(index) if index > 0 => path[..index].to_string(),
            _ => "/".to_string(),
        })
    }
}

/// Apply `.` and `..`, escape each segment, keep or add the trailing `/`.
///
/// Fails when `..` climbs above the root or leaves nothing but the root.
pub fn normalize_path(path: &str, is_folder: bool) -> Result<String> {
    normalize(path, is_folder, true)
}

fn normalize(path: &str, is_folder: bool, escape: bool) -> Result<String> {
    let mut segments: SmallVec<[&str; 8]> = SmallVec::new();
    let mut climbed = false;

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match segment {
            "." => {}
            ".." => {
                climbed = true;
                if segments.pop().is_none() {
                    return Err(WikiError::InvalidPath(path.to_string()));
                }
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        if climbed {
            return Err(WikiError::InvalidPath(path.to_string()));
        }
        return Ok("/".to_string());
    }

    let mut out = String::with_capacity(path.len() + 1);
    for segment in &segments {
        out.push('/');
        if escape {
            out.push_str(&escape_segment(segment));
        } else {
            out.push_str(segment);
        }
    }
    if path.ends_with('/') || is_folder {
        out.push('/');
    }
    Ok(out)
}

/// Percent-escape the characters that break REST paths.
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains([' ', '\'', '"', '#', '?']) {
        return Cow::Borrowed(segment);
    }
    let mut out = String::with_capacity(segment.len() + 8);
    for c in segment.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '\'' => out.push_str("%27"),
            '"' => out.push_str("%22"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::services::{ItemKind, NOTEBOOK_FOLDER_ID, ROOT_FOLDER_ID};

    #[test]
    fn test_normalize_dots() {
        assert_eq!(normalize_path("/a/./b/../c/", false).unwrap(), "/a/c/");
        assert_eq!(normalize_path("/a/b", false).unwrap(), "/a/b");
        assert_eq!(normalize_path("//a///b", false).unwrap(), "/a/b");
        assert_eq!(normalize_path("/a", true).unwrap(), "/a/");
        assert_eq!(normalize_path("/a/", true).unwrap(), "/a/");
        assert_eq!(normalize_path("/", false).unwrap(), "/");
    }

    #[test]
    fn test_normalize_rejects_climb_to_root() {
        assert!(matches!(
            normalize_path("/a/../", false),
            Err(WikiError::InvalidPath(_))
        ));
        assert!(matches!(
            normalize_path("/../x", false),
            Err(WikiError::InvalidPath(_))
        ));
        // Climbing back down is fine
        assert_eq!(normalize_path("/a/../b", false).unwrap(), "/b");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_segment("plain"), "plain");
        assert_eq!(
            escape_segment(r##"my page's "q"#?"##),
            "my%20page%27s%20%22q%22%23%3F"
        );
        assert_eq!(
            normalize_path("/Note book/It's", false).unwrap(),
            "/Note%20book/It%27s"
        );
    }

    #[test]
    fn test_parse_forms() {
        let url = WikiUrl::parse("//bob@example.com/Notebook/Page", None);
        assert!(url.is_cross_account());
        assert_eq!(url.filename(), "Page");

        let url = WikiUrl::parse("//bob@example.com", None);
        assert!(url.is_cross_account());
        assert_eq!(
            url.form,
            Form::CrossAccount {
                account: "bob@example.com".into(),
                path: "/".into()
            }
        );

        assert_eq!(WikiUrl::parse("/Top", None).filename(), "Top");
        assert_eq!(WikiUrl::parse("Page", Some(12)).filename(), "Page");
        assert!(WikiUrl::parse("https://x.org/a", None).is_external());
    }

    fn fixture() -> (std::sync::Arc<MemoryStore>, Services) {
        let store = MemoryStore::new();
        store.add_account("a1", "alice@example.com");
        store.add_account("b1", "bob@example.com");
        let recipes = store.add_folder("a1", NOTEBOOK_FOLDER_ID, "Recipes").unwrap();
        store
            .put("a1", recipes, "Soup", ItemKind::Wiki, "hot", "alice")
            .unwrap();
        let services = store.services();
        (store, services)
    }

    #[test]
    fn test_relative_resolves_against_folder() {
        let (store, services) = fixture();
        let recipes = store.find("a1", "/Notebook/Recipes").unwrap();

        let url = WikiUrl::parse("Soup", Some(recipes));
        assert_eq!(
            url.full_url(&services, "a1").unwrap(),
            "/home/alice@example.com/Notebook/Recipes/Soup"
        );

        let url = WikiUrl::parse("../Other page", Some(recipes));
        assert_eq!(
            url.full_url(&services, "a1").unwrap(),
            "/home/alice@example.com/Notebook/Other%20page"
        );

        let owner = url.owner(&services, "a1").unwrap();
        assert_eq!(url.folder_path(&services, &owner).unwrap(), "/Notebook");
        assert_eq!(url.item_path(&services, &owner).unwrap(), "/Notebook/Other page");
    }

    #[test]
    fn test_relative_without_folder_is_invalid() {
        let (_, services) = fixture();
        let url = WikiUrl::parse("Soup", None);
        assert!(matches!(
            url.full_url(&services, "a1"),
            Err(WikiError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_relative_from_root() {
        let (_, services) = fixture();
        let url = WikiUrl::parse("Notebook", Some(ROOT_FOLDER_ID));
        assert_eq!(
            url.full_url(&services, "a1").unwrap(),
            "/home/alice@example.com/Notebook"
        );
    }

    #[test]
    fn test_cross_account_and_external() {
        let (_, services) = fixture();
        let url = WikiUrl::parse("//bob@example.com/Notebook/Home", Some(12));
        assert_eq!(
            url.full_url(&services, "a1").unwrap(),
            "/home/bob@example.com/Notebook/Home"
        );

        let url = WikiUrl::parse("//nobody@example.com/x", None);
        assert!(matches!(
            url.full_url(&services, "a1"),
            Err(WikiError::NoSuchAccount(_))
        ));

        let url = WikiUrl::parse("http://example.com/a b", None);
        assert_eq!(url.full_url(&services, "zz").unwrap(), "http://example.com/a b");
    }

    #[test]
    fn test_item_url_marks_folders() {
        let (store, services) = fixture();
        let recipes = store.find("a1", "/Notebook/Recipes").unwrap();
        let meta = services.store.item("a1", recipes).unwrap().unwrap();
        let url = WikiUrl::for_item(&meta);
        assert_eq!(
            url.full_url(&services, "a1").unwrap(),
            "/home/alice@example.com/Notebook/Recipes/"
        );
    }

    #[test]
    fn test_remote_relative_uses_transport() {
        let store = MemoryStore::new();
        store.add_remote_account("r1", "remy@example.com", "mail2");
        let services = store.services();
        let url = WikiUrl::parse("Page", Some(NOTEBOOK_FOLDER_ID));
        assert_eq!(
            url.full_url(&services, "r1").unwrap(),
            "/home/remy@example.com/Notebook/Page"
        );
    }
}
