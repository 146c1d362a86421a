//! Per-render state.
//!
//! A [`Context`] is created for every top-level render and forked whenever a
//! wiklet renders a template on behalf of another item (TOC entries, history
//! revisions) or with a different inline buffer. It is never shared across
//! threads; the [`Wiki`] it borrows is.

use std::sync::Arc;

use crate::error::Result;
use crate::page::Page;
use crate::services::{ItemKind, Services};
use crate::template::Template;
use crate::wiki::Wiki;

/// Who is asking and how, as carried by the incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Account name of the requestor; `None` for anonymous access.
    pub requestor: Option<String>,
    /// Item kind listed by `{{TOC format=template}}`, e.g. `document`.
    pub view: Option<String>,
    pub locale: Option<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requestor(mut self, requestor: impl Into<String>) -> Self {
        self.requestor = Some(requestor.into());
        self
    }

    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Kind of item a template-mode listing shows; wiki pages by default.
    pub fn view_kind(&self) -> ItemKind {
        self.view
            .as_deref()
            .and_then(ItemKind::from_view)
            .unwrap_or(ItemKind::Wiki)
    }
}

#[derive(Debug, Clone)]
pub struct Context<'w> {
    wiki: &'w Wiki,
    request: &'w Request,
    /// Subject of the render.
    pub item: Arc<Page>,
    /// Template of the subject, when the chrome renders it through CONTENT.
    pub item_template: Option<Arc<Template>>,
    /// Inline buffer returned verbatim by CONTENT.
    pub content: Option<String>,
    /// Newest revision when `item` is an older one.
    pub latest: Option<Arc<Page>>,
    pub locale: Option<String>,
    depth: usize,
}

impl<'w> Context<'w> {
    pub fn new(wiki: &'w Wiki, request: &'w Request, item: Arc<Page>) -> Self {
        let locale = request
            .locale
            .clone()
            .or_else(|| wiki.config().render.locale.clone());
        Self {
            wiki,
            request,
            item,
            item_template: None,
            content: None,
            latest: None,
            locale,
            depth: 0,
        }
    }

    #[inline]
    pub fn wiki(&self) -> &'w Wiki {
        self.wiki
    }

    #[inline]
    pub fn request(&self) -> &'w Request {
        self.request
    }

    #[inline]
    pub fn services(&self) -> &'w Services {
        self.wiki.services()
    }

    /// Fresh context for another item, at the same inclusion depth.
    pub fn for_item(&self, item: Arc<Page>, latest: Option<Arc<Page>>) -> Self {
        Self {
            wiki: self.wiki,
            request: self.request,
            item,
            item_template: None,
            content: None,
            latest,
            locale: self.locale.clone(),
            depth: self.depth,
        }
    }

    /// Copy of this context whose changes do not leak back.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Resolve `name` from the subject's notebook.
    pub fn find_template(&self, name: &str) -> Result<Arc<Template>> {
        self.wiki.template_for(&self.item, name)
    }

    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn enter(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
