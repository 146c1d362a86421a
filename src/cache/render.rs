//! Keys for the two render caches.

use std::fmt;
use std::sync::Arc;

use super::TtlCache;
use crate::services::ItemId;
use crate::template::Template;

/// A rendered page as seen by one requestor, inside one chrome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub requestor: Option<String>,
    pub account_id: String,
    pub item_id: ItemId,
    /// Chrome template name; `None` for a bare render.
    pub chrome: Option<String>,
}

pub type PageRenderCache = TtlCache<PageKey, Arc<str>>;

/// A composed chrome: its template plus everything it transitively pulls in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositionKey {
    root: String,
    inclusions: Vec<String>,
}

impl CompositionKey {
    pub fn new(root: &Template, inclusions: &[Arc<Template>]) -> Self {
        let mut ids: Vec<String> = inclusions.iter().map(|t| t.id().to_string()).collect();
        ids.sort_unstable();
        Self {
            root: root.id().to_string(),
            inclusions: ids,
        }
    }

    /// Whether the template `id` took part in this composition.
    pub fn mentions(&self, id: &str) -> bool {
        self.root == id || self.inclusions.iter().any(|i| i == id)
    }

    /// Whether any template whose id starts with `prefix` took part.
    pub fn mentions_prefix(&self, prefix: &str) -> bool {
        self.root.starts_with(prefix) || self.inclusions.iter().any(|i| i.starts_with(prefix))
    }
}

impl fmt::Display for CompositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.root, self.inclusions.join(","))
    }
}

pub type CompositionCache = TtlCache<CompositionKey, Arc<str>>;
