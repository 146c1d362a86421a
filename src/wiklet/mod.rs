//! Directive dispatch.
//!
//! # Directives
//!
//! | Key | Module | Output |
//! |-----|--------|--------|
//! | `TOC`, `HISTORY`, `BREADCRUMBS` / `PATH` | [`listing`] | folder listings, revision lists, ancestor trail |
//! | `ICON`, `NAME`, `FRAGMENT`, `CREATOR`, `MODIFIER`, `TAGS`, `VERSION`, `MSG` | [`meta`] | item metadata |
//! | `CREATEDATE`, `MODIFYDATE` | [`date`] | formatted timestamps |
//! | `CONTENT`, `INCLUDE`, `INLINE` | [`include`] | other templates |
//! | `WIKILINK`, `URL` | [`link`] | anchors |
//!
//! # Dispatch
//!
//! ```text
//! [[...]]                      → WIKILINK
//! {{NAME ...}}                 → first word, verbatim
//! <wiklet class='toc' ... />   → class, upper-cased ("link" → WIKILINK)
//! ```

mod date;
mod include;
mod link;
mod listing;
mod meta;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::context::Context;
use crate::error::Result;
use crate::template::{CLASS_ATTR, Template, Token, TokenKind, WIKLET_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wiklet {
    Toc,
    History,
    Breadcrumbs,
    Icon,
    Name,
    Fragment,
    Creator,
    Modifier,
    Tags,
    Version,
    CreateDate,
    ModifyDate,
    Content,
    Include,
    Inline,
    Wikilink,
    Url,
    Msg,
}

impl Wiklet {
    pub const ALL: [Self; 18] = [
        Self::Toc,
        Self::History,
        Self::Breadcrumbs,
        Self::Icon,
        Self::Name,
        Self::Fragment,
        Self::Creator,
        Self::Modifier,
        Self::Tags,
        Self::Version,
        Self::CreateDate,
        Self::ModifyDate,
        Self::Content,
        Self::Include,
        Self::Inline,
        Self::Wikilink,
        Self::Url,
        Self::Msg,
    ];

    /// Dispatch key.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Toc => "TOC",
            Self::History => "HISTORY",
            Self::Breadcrumbs => "BREADCRUMBS",
            Self::Icon => "ICON",
            Self::Name => "NAME",
            Self::Fragment => "FRAGMENT",
            Self::Creator => "CREATOR",
            Self::Modifier => "MODIFIER",
            Self::Tags => "TAGS",
            Self::Version => "VERSION",
            Self::CreateDate => "CREATEDATE",
            Self::ModifyDate => "MODIFYDATE",
            Self::Content => "CONTENT",
            Self::Include => "INCLUDE",
            Self::Inline => "INLINE",
            Self::Wikilink => "WIKILINK",
            Self::Url => "URL",
            Self::Msg => "MSG",
        }
    }

    pub fn render(self, cx: &mut Context<'_>, token: &Token) -> Result<String> {
        match self {
            Self::Toc => listing::toc(cx, token),
            Self::History => listing::history(cx, token),
            Self::Breadcrumbs => listing::breadcrumbs(cx, token),
            Self::Icon => Ok(meta::icon(cx)),
            Self::Name => Ok(meta::name(cx)),
            Self::Fragment => Ok(meta::fragment(cx)),
            Self::Creator => Ok(meta::creator(cx)),
            Self::Modifier => Ok(meta::modifier(cx)),
            Self::Tags => Ok(meta::tags(cx)),
            Self::Version => Ok(meta::version(cx)),
            Self::Msg => Ok(meta::msg(cx, token)),
            Self::CreateDate => Ok(date::create_date(cx, token)),
            Self::ModifyDate => Ok(date::modify_date(cx, token)),
            Self::Content => include::content(cx),
            Self::Include | Self::Inline => include::include(cx, token),
            Self::Wikilink => link::wikilink(cx, token),
            Self::Url => link::url(cx, token),
        }
    }

    /// Template this directive would pull into the render, if any.
    pub fn find_inclusion(self, cx: &mut Context<'_>, token: &Token) -> Result<Option<Arc<Template>>> {
        match self {
            Self::Content => include::content_template(cx),
            Self::Include | Self::Inline => include::include_template(cx, token).map(Some),
            Self::Toc => listing::toc_item_template(cx, token),
            Self::History => listing::history_item_template(cx, token).map(Some),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// Table
// ============================================================================

/// Read-only map from dispatch key to directive, built once per engine.
#[derive(Debug, Clone)]
pub struct WikletTable {
    entries: FxHashMap<String, Wiklet>,
}

impl Default for WikletTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl WikletTable {
    /// No directives at all; every directive token renders as nothing.
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Every built-in directive, plus `PATH` as an alias of `BREADCRUMBS`.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for wiklet in Wiklet::ALL {
            table.insert(wiklet.name(), wiklet);
        }
        table.insert("PATH", Wiklet::Breadcrumbs);
        table
    }

    pub fn insert(&mut self, key: &str, wiklet: Wiklet) {
        self.entries.insert(key.to_string(), wiklet);
    }

    pub fn remove(&mut self, key: &str) -> Option<Wiklet> {
        self.entries.remove(key)
    }

    pub fn lookup(&self, key: &str) -> Option<Wiklet> {
        self.entries.get(key).copied()
    }

    /// Directive a token dispatches to; `None` renders as nothing.
    pub fn get(&self, token: &Token) -> Option<Wiklet> {
        match token.kind() {
            TokenKind::Wikilink => self.lookup(Wiklet::Wikilink.name()),
            TokenKind::Wiklet => {
                let head = token.first_word();
                if head != WIKLET_TAG {
                    return self.lookup(head);
                }
                let class = token.param(CLASS_ATTR)?;
                if class == "link" {
                    self.lookup(Wiklet::Wikilink.name())
                } else {
                    self.lookup(&class.to_uppercase())
                }
            }
            TokenKind::Text | TokenKind::Comment => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
