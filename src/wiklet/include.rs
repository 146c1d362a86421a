//! CONTENT, INCLUDE and INLINE.

use std::sync::Arc;

use crate::compose;
use crate::context::Context;
use crate::error::{Result, WikiError};
use crate::log;
use crate::template::{Template, Token};
use crate::wiklet::Wiklet;

const PAGE: &str = "page";

// ============================================================================
// CONTENT
// ============================================================================

/// The inline buffer when one is set, otherwise the subject's own template.
///
/// A template whose first directive is CONTENT again comes back as raw
/// source rather than recursing into itself.
pub fn content(cx: &mut Context<'_>) -> Result<String> {
    if let Some(content) = &cx.content {
        return Ok(content.clone());
    }
    let Some(template) = content_template(cx)? else {
        return Ok("<!-- content wiklet on non-wiki item -->".to_string());
    };

    let wiklets = cx.wiki().wiklets();
    let first = template
        .tokens()
        .iter()
        .find(|token| !token.is_verbatim())
        .and_then(|token| wiklets.get(token));
    if first == Some(Wiklet::Content) {
        return Ok(template.source().to_string());
    }
    compose::render(&template, cx)
}

/// Template CONTENT renders; `None` while an inline buffer is set or for
/// anything but a wiki page.
pub fn content_template(cx: &mut Context<'_>) -> Result<Option<Arc<Template>>> {
    if cx.content.is_some() || !cx.item.is_wiki() {
        return Ok(None);
    }
    if let Some(template) = &cx.item_template {
        return Ok(Some(template.clone()));
    }
    cx.item.template(cx.services()).map(Some)
}

// ============================================================================
// INCLUDE / INLINE
// ============================================================================

/// Render another template for the same subject. Failures render as a
/// comment naming the directive.
pub fn include(cx: &mut Context<'_>, token: &Token) -> Result<String> {
    let rendered = include_template(cx, token).and_then(|template| compose::render(&template, cx));
    match rendered {
        Ok(text) => Ok(text),
        Err(err) => {
            log!("wiklet"; "INCLUDE {}: {err}", token.value());
            Ok(format!("<!-- missing template {} -->", token.value()))
        }
    }
}

/// `page=NAME`, or the first bare argument.
pub fn include_template(cx: &mut Context<'_>, token: &Token) -> Result<Arc<Template>> {
    let name = token
        .param(PAGE)
        .or_else(|| token.argument())
        .ok_or_else(|| WikiError::NotFound(format!("no page named in `{}`", token.value())))?;
    cx.find_template(name)
}
