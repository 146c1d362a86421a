//! Template rendering.
//!
//! ```text
//! Template ──tokens──► TEXT / COMMENT ──────────────► copied
//!                  └─► WIKLET / WIKILINK ──dispatch──► Wiklet::render
//! ```
//!
//! Wiklet failures that a page can live with (missing pages, bad links,
//! unknown accounts) are logged and render as an HTML comment naming the
//! directive. Store failures abort the render.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::context::Context;
use crate::error::Result;
use crate::log;
use crate::template::Template;

/// Render `template` against `cx`.
pub fn render(template: &Template, cx: &mut Context<'_>) -> Result<String> {
    let wiki = cx.wiki();
    if cx.depth() >= wiki.config().render.max_depth {
        let label = if template.is_anonymous() {
            "(anonymous)"
        } else {
            template.id()
        };
        log!("render"; "inclusion depth exceeded at {label}");
        return Ok(format!("<!-- inclusion depth exceeded {label} -->"));
    }

    template.touch(wiki.clock().now());
    cx.enter();
    let result = render_tokens(template, cx);
    cx.leave();
    result
}

fn render_tokens(template: &Template, cx: &mut Context<'_>) -> Result<String> {
    let wiklets = cx.wiki().wiklets();
    let mut out = String::with_capacity(template.source().len());

    for token in template.tokens() {
        if token.is_verbatim() {
            out.push_str(token.value());
            continue;
        }
        let Some(wiklet) = wiklets.get(token) else {
            continue;
        };
        match wiklet.render(cx, token) {
            Ok(text) => out.push_str(&text),
            Err(err) if err.is_recoverable() => {
                log!("wiklet"; "{}: {err}", wiklet.name());
                out.push_str(&format!("<!-- {} failed: {err} -->", wiklet.name()));
            }
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}

/// Every named template `template` pulls in, directly or through other
/// inclusions, in discovery order. Lookup failures are skipped.
pub fn enumerate_inclusions(template: &Template, cx: &mut Context<'_>) -> Vec<Arc<Template>> {
    let mut seen = FxHashSet::default();
    let mut found = Vec::new();
    collect(template, cx, &mut seen, &mut found, 0);
    found
}

fn collect(
    template: &Template,
    cx: &mut Context<'_>,
    seen: &mut FxHashSet<String>,
    found: &mut Vec<Arc<Template>>,
    depth: usize,
) {
    let wiki = cx.wiki();
    if depth >= wiki.config().render.max_depth {
        return;
    }
    for token in template.tokens().iter().filter(|t| !t.is_verbatim()) {
        let Some(wiklet) = wiki.wiklets().get(token) else {
            continue;
        };
        let Ok(Some(included)) = wiklet.find_inclusion(cx, token) else {
            continue;
        };
        if included.is_anonymous() || !seen.insert(included.id().to_string()) {
            continue;
        }
        found.push(included.clone());
        collect(&included, cx, seen, found, depth + 1);
    }
}

/// Render the subject of `cx` inside `chrome`.
///
/// Wiki pages are pulled in by the chrome's CONTENT directive; anything else
/// is rendered first and handed over as the inline buffer.
pub fn compose(item_template: &Arc<Template>, chrome: &Template, cx: &mut Context<'_>) -> Result<String> {
    if cx.item.is_wiki() {
        cx.item_template = Some(item_template.clone());
    } else {
        let body = render(item_template, cx)?;
        cx.content = Some(body);
    }
    render(chrome, cx)
}
