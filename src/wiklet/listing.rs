//! TOC, HISTORY and BREADCRUMBS.
//!
//! All three can hand each listed item to an item template and wrap the
//! concatenation in a body template (`format=template`; always for HISTORY).
//! The body sees the concatenation as its CONTENT.

use std::sync::Arc;

use crate::compose;
use crate::context::Context;
use crate::error::Result;
use crate::log;
use crate::notebook::ScopeKey;
use crate::page::{Origin, Page};
use crate::services::{ItemId, ItemMeta, NOTEBOOK_FOLDER_ID};
use crate::template::{Template, Token};

const FORMAT: &str = "format";
const ITEM_TEMPLATE: &str = "itemTemplate";
const BODY_TEMPLATE: &str = "bodyTemplate";

const LIST: &str = "list";
const SIMPLE: &str = "simple";
const TEMPLATE: &str = "template";

const TOC_ITEM: &str = "_TocItemTemplate";
const TOC_BODY: &str = "_TocBodyTemplate";
const VERSION_ITEM: &str = "_TocVersionItemTemplate";
const VERSION_BODY: &str = "_TocVersionBodyTemplate";
const PATH_ITEM: &str = "_PathItemTemplate";
const PATH_BODY: &str = "_PathBodyTemplate";

/// Message key labelling the well-known notebook folder.
const NOTEBOOK_MESSAGE: &str = "notebook";

// ============================================================================
// TOC
// ============================================================================

/// Outer tag, inner tag and class of the two plain listing styles.
#[derive(Debug, Clone, Copy)]
enum Style {
    List,
    Simple,
}

impl Style {
    const fn tags(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::List => ("ul", "li", "zmwiki-tocList"),
            Self::Simple => ("span", "span", "zmwiki-tocSimple"),
        }
    }
}

pub fn toc(cx: &mut Context<'_>, token: &Token) -> Result<String> {
    let format = token.param(FORMAT).unwrap_or(LIST);
    let folder = listed_folder(cx);
    let (folders, documents) = children(cx, folder)?;

    if format == TEMPLATE {
        let kind = cx.request().view_kind();
        let items = folders
            .into_iter()
            .chain(documents.into_iter().filter(|meta| meta.kind == kind))
            .map(|meta| child_page(cx, meta, folder))
            .collect();
        return handle_templates(cx, token, items, (TOC_ITEM, TOC_BODY), None);
    }

    let style = if format == SIMPLE { Style::Simple } else { Style::List };
    let (outer, inner, class) = style.tags();

    let mut out = format!("<{outer} class='{class}'>");
    let names = folders
        .iter()
        .map(|meta| format!("{}/", meta.name))
        .chain(documents.iter().map(|meta| meta.name.clone()));
    for name in names {
        out.push_str(&format!(
            "<{inner} class='zmwiki-pageLink'><a href=\"{name}\">{name}</a></{inner}>"
        ));
    }
    out.push_str(&format!("</{outer}>"));
    Ok(out)
}

pub fn toc_item_template(cx: &mut Context<'_>, token: &Token) -> Result<Option<Arc<Template>>> {
    if token.param(FORMAT) != Some(TEMPLATE) {
        return Ok(None);
    }
    cx.find_template(token.param(ITEM_TEMPLATE).unwrap_or(TOC_ITEM))
        .map(Some)
}

/// Folder a TOC lists: the subject itself, or the folder holding it.
fn listed_folder(cx: &Context<'_>) -> ItemId {
    if cx.item.is_folder() {
        cx.item.id()
    } else {
        cx.item.meta().folder_id
    }
}

/// Subfolders and documents of `folder`, each sorted by name.
fn children(cx: &Context<'_>, folder: ItemId) -> Result<(Vec<ItemMeta>, Vec<ItemMeta>)> {
    let services = cx.services();
    let account = cx.item.account();
    let mut items = match cx.item.origin() {
        Origin::Local => services.store.list(&account.id, folder)?,
        Origin::Remote => {
            let limit = cx.wiki().config().cache.pages;
            services.transport.search(account, folder, limit)?
        }
    };
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items.into_iter().partition(ItemMeta::is_folder))
}

fn child_page(cx: &Context<'_>, meta: ItemMeta, folder: ItemId) -> Arc<Page> {
    Arc::new(Page::new(
        cx.item.account().clone(),
        meta,
        cx.item.origin(),
        ScopeKey::Folder(folder),
    ))
}

// ============================================================================
// HISTORY
// ============================================================================

pub fn history(cx: &mut Context<'_>, token: &Token) -> Result<String> {
    if cx.item.is_folder() {
        return Ok(String::new());
    }
    let subject = cx.item.clone();
    let items = revisions(cx)?
        .into_iter()
        .map(|meta| {
            if meta.version == subject.meta().version {
                subject.clone()
            } else {
                Arc::new(subject.revision(meta))
            }
        })
        .collect();
    handle_templates(cx, token, items, (VERSION_ITEM, VERSION_BODY), Some(subject))
}

pub fn history_item_template(cx: &mut Context<'_>, token: &Token) -> Result<Arc<Template>> {
    cx.find_template(token.param(ITEM_TEMPLATE).unwrap_or(VERSION_ITEM))
}

/// Current revision first, then older ones, newest first. Remote items only
/// expose their current revision.
fn revisions(cx: &Context<'_>) -> Result<Vec<ItemMeta>> {
    let mut all = vec![cx.item.meta().clone()];
    if cx.item.origin() == Origin::Local {
        let prior = cx
            .services()
            .store
            .revisions(&cx.item.account().id, cx.item.id())?;
        all.extend(prior.into_iter().rev());
    }
    Ok(all)
}

// ============================================================================
// BREADCRUMBS
// ============================================================================

pub fn breadcrumbs(cx: &mut Context<'_>, token: &Token) -> Result<String> {
    let crumbs = ancestors(cx);
    match token.param(FORMAT) {
        None | Some(SIMPLE) => {
            let markup = simple_trail(cx, &crumbs);
            compose::render(&Template::new(markup), cx)
        }
        Some(TEMPLATE) => {
            let items = crumbs
                .into_iter()
                .map(|meta| {
                    let parent = meta.folder_id;
                    child_page(cx, meta, parent)
                })
                .collect();
            handle_templates(cx, token, items, (PATH_ITEM, PATH_BODY), None)
        }
        Some(other) => {
            let message = format!("Error handling wiklet Breadcrumbs: format {other} not recognized");
            log!("error"; "{message}");
            Ok(message)
        }
    }
}

/// Folders from just below the account root down to the subject's folder.
/// A broken parent chain leaves the trail empty instead of failing the render.
fn ancestors(cx: &Context<'_>) -> Vec<ItemMeta> {
    if cx.item.origin() == Origin::Remote {
        return Vec::new();
    }
    cx.services()
        .store
        .ancestors(&cx.item.account().id, cx.item.meta().folder_id)
        .unwrap_or_default()
}

/// `[[label][/path]]` links, one per ancestor, inside a span.
fn simple_trail(cx: &Context<'_>, crumbs: &[ItemMeta]) -> String {
    let mut out = String::from("<span class='zmwiki-breadcrumbsSimple'>");
    let mut path = String::from("/");
    for folder in crumbs {
        path.push_str(&folder.name);
        let label = if folder.id == NOTEBOOK_FOLDER_ID {
            cx.services()
                .localizer
                .message(NOTEBOOK_MESSAGE, cx.item.account().locale.as_deref())
                .unwrap_or_else(|| folder.name.clone())
        } else {
            folder.name.clone()
        };
        out.push_str(&format!(
            "<span class='zmwiki-pageLink'>[[{label}][{path}]]</span>"
        ));
        path.push('/');
    }
    out.push_str("</span>");
    out
}

// ============================================================================
// Shared
// ============================================================================

/// Render every item through the item template, then the body template
/// with the result as its CONTENT.
fn handle_templates(
    cx: &mut Context<'_>,
    token: &Token,
    items: Vec<Arc<Page>>,
    (item_default, body_default): (&str, &str),
    latest: Option<Arc<Page>>,
) -> Result<String> {
    let item_template = cx.find_template(token.param(ITEM_TEMPLATE).unwrap_or(item_default))?;

    let mut buf = String::new();
    for item in items {
        let mut child = cx.for_item(item, latest.clone());
        buf.push_str(&compose::render(&item_template, &mut child)?);
    }

    let mut body_cx = cx.fork();
    body_cx.content = Some(buf);
    let body = body_cx.find_template(token.param(BODY_TEMPLATE).unwrap_or(body_default))?;
    compose::render(&body, &mut body_cx)
}

#[cfg(test)]
mod tests {
    use crate::fixture::Fixture;
    use crate::services::{ItemKind, NOTEBOOK_FOLDER_ID, ROOT_FOLDER_ID};

    #[test]
    fn test_toc_list() {
        let fx = Fixture::new();
        let home = fx.wiki_page(NOTEBOOK_FOLDER_ID, "Home", "home");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "Alpha", "a");
        fx.folder(NOTEBOOK_FOLDER_ID, "Sub");

        assert_eq!(
            fx.render("{{TOC}}", home),
            "<ul class='zmwiki-tocList'>\
             <li class='zmwiki-pageLink'><a href=\"Sub/\">Sub/</a></li>\
             <li class='zmwiki-pageLink'><a href=\"Alpha\">Alpha</a></li>\
             <li class='zmwiki-pageLink'><a href=\"Home\">Home</a></li>\
             </ul>"
        );
    }

    #[test]
    fn test_toc_simple_on_folder() {
        let fx = Fixture::new();
        let sub = fx.folder(NOTEBOOK_FOLDER_ID, "Sub");
        fx.wiki_page(sub, "Leaf", "x");

        assert_eq!(
            fx.render("{{TOC format=simple}}", sub),
            "<span class='zmwiki-tocSimple'>\
             <span class='zmwiki-pageLink'><a href=\"Leaf\">Leaf</a></span>\
             </span>"
        );
    }

    #[test]
    fn test_toc_template_mode() {
        let fx = Fixture::new();
        let home = fx.wiki_page(NOTEBOOK_FOLDER_ID, "Home", "home");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_TocItemTemplate", "{{NAME}}, ");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_TocBodyTemplate", "({{CONTENT}}).");
        fx.document(NOTEBOOK_FOLDER_ID, "notes.txt", "plain");
        fx.folder(NOTEBOOK_FOLDER_ID, "Sub");

        // Wiki pages by default; templates are pages too
        assert_eq!(
            fx.render("{{TOC format=template}}", home),
            "(Sub, Home, _TocBodyTemplate, _TocItemTemplate, )."
        );

        let request = crate::context::Request::new().view("document");
        assert_eq!(
            fx.render_with("{{TOC format=template}}", home, &request),
            "(Sub, notes.txt, )."
        );
    }

    #[test]
    fn test_toc_custom_templates() {
        let fx = Fixture::new();
        let home = fx.wiki_page(NOTEBOOK_FOLDER_ID, "Home", "home");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_Row", "{{NAME}}; ");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_Wrap", "({{CONTENT}}).");

        assert_eq!(
            fx.render("{{TOC format=template itemTemplate=_Row bodyTemplate=_Wrap}}", home),
            "(Home; _Row; _Wrap; )."
        );
    }

    #[test]
    fn test_history() {
        let fx = Fixture::new();
        let home = fx.wiki_page(NOTEBOOK_FOLDER_ID, "Home", "one");
        fx.store
            .put("a1", NOTEBOOK_FOLDER_ID, "Home", ItemKind::Wiki, "two", "bob")
            .unwrap();
        fx.store
            .put("a1", NOTEBOOK_FOLDER_ID, "Home", ItemKind::Wiki, "three", "carol")
            .unwrap();
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_TocVersionItemTemplate", "{{VERSION}}:{{MODIFIER}}, ");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_TocVersionBodyTemplate", "<{{CONTENT}}>.");

        assert_eq!(
            fx.render("{{HISTORY}}", home),
            "<3:carol, 2:bob, 1:alice, >."
        );
    }

    #[test]
    fn test_history_links_latest() {
        let fx = Fixture::new();
        let home = fx.wiki_page(NOTEBOOK_FOLDER_ID, "Home", "one");
        fx.store
            .put("a1", NOTEBOOK_FOLDER_ID, "Home", ItemKind::Wiki, "two", "bob")
            .unwrap();
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_V", "{{URL type=version}}, ");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_B", "{{CONTENT}}");

        assert_eq!(
            fx.render("{{HISTORY itemTemplate=_V bodyTemplate=_B}}", home),
            "<a href='/home/alice@example.com/Notebook/Home?ver=2'>Home</a>, \
             <a href='/home/alice@example.com/Notebook/Home?ver=1'>Home</a>, "
        );
    }

    #[test]
    fn test_history_on_folder_is_empty() {
        let fx = Fixture::new();
        assert_eq!(fx.render("{{HISTORY}}", NOTEBOOK_FOLDER_ID), "");
    }

    #[test]
    fn test_breadcrumbs_simple() {
        let fx = Fixture::new();
        fx.store.set_message("notebook", None, "My Notebook");
        let sub = fx.folder(NOTEBOOK_FOLDER_ID, "Sub");
        let leaf = fx.wiki_page(sub, "Leaf", "x");

        assert_eq!(
            fx.render("{{BREADCRUMBS}}", leaf),
            "<span class='zmwiki-breadcrumbsSimple'>\
             <span class='zmwiki-pageLink'><a href='/home/alice@example.com/Notebook'>My Notebook</a></span>\
             <span class='zmwiki-pageLink'><a href='/home/alice@example.com/Notebook/Sub'>Sub</a></span>\
             </span>"
        );
    }

    #[test]
    fn test_breadcrumbs_template_and_alias() {
        let fx = Fixture::new();
        let sub = fx.folder(NOTEBOOK_FOLDER_ID, "Sub");
        let leaf = fx.wiki_page(sub, "Leaf", "x");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_PathItemTemplate", "/{{NAME}}");
        fx.wiki_page(NOTEBOOK_FOLDER_ID, "_PathBodyTemplate", "{{CONTENT}}!!");

        assert_eq!(fx.render("{{PATH format=template}}", leaf), "/Notebook/Sub!!");
    }

    #[test]
    fn test_breadcrumbs_at_root_and_bad_format() {
        let fx = Fixture::new();
        assert_eq!(
            fx.render("{{BREADCRUMBS}}", NOTEBOOK_FOLDER_ID),
            "<span class='zmwiki-breadcrumbsSimple'></span>"
        );
        assert_eq!(
            fx.render("{{BREADCRUMBS format=tree}}", ROOT_FOLDER_ID),
            "Error handling wiklet Breadcrumbs: format tree not recognized"
        );
    }
}
