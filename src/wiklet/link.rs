//! WIKILINK and URL.

use crate::compose;
use crate::context::Context;
use crate::error::{Result, WikiError};
use crate::template::{Template, Token, TokenKind};
use crate::url::WikiUrl;

const PAGENAME: &str = "pagename";
const TEXT: &str = "text";
const TYPE: &str = "type";
const LABEL: &str = "label";

/// Start of a link produced by a nested directive.
const NESTED_WIKLET: &str = "<wiklet";

const VERSION_URL: &str = "version";
const HISTORY_URL: &str = "history";

// ============================================================================
// WIKILINK
// ============================================================================

/// Split the inside of `[[...]]` into `(link, title)`.
///
/// `link|title` and `title][link` are recognised; otherwise the text is both.
fn split_link(text: &str) -> (&str, &str) {
    if let Some((link, title)) = text.split_once('|') {
        return (link, title);
    }
    if let Some((title, link)) = text.split_once("][") {
        return (link, title);
    }
    (text, text)
}

/// Anchor to another page, resolved against the subject's folder.
pub fn wikilink(cx: &mut Context<'_>, token: &Token) -> Result<String> {
    let (link, title) = if token.kind() == TokenKind::Wikilink {
        let text = token.value();
        let (link, title) = split_link(text);
        // A link built by a nested directive is rendered first
        let link = if text.starts_with(NESTED_WIKLET) {
            compose::render(&Template::new(link), cx)?
        } else {
            link.to_string()
        };
        (link, title.to_string())
    } else {
        let link = token
            .param(PAGENAME)
            .or_else(|| token.argument())
            .ok_or_else(|| WikiError::NotFound(format!("no page named in `{}`", token.value())))?;
        let title = token.param(TEXT).unwrap_or(link);
        (link.to_string(), title.to_string())
    };

    let anchor = if cx.item.is_folder() {
        cx.item.id()
    } else {
        cx.item.meta().folder_id
    };
    let url = WikiUrl::parse(&link, Some(anchor));
    match url.full_url(cx.services(), &cx.item.account().id) {
        Ok(href) => Ok(format!("<a href='{href}'>{title}</a>")),
        Err(err) if err.is_recoverable() => Ok(format!("<!-- invalid wiki url {link} -->{title}")),
        Err(err) => Err(err),
    }
}

// ============================================================================
// URL
// ============================================================================

/// Anchor to the subject itself.
///
/// | `type` | href |
/// |--------|------|
/// | none | the subject |
/// | `version` | the latest revision, `?ver=N` of the subject |
/// | `history` | the subject, `?view=history`; nothing for folders |
pub fn url(cx: &Context<'_>, token: &Token) -> Result<String> {
    let mut title = cx.item.name().replace('<', "&lt;").replace('>', "&gt;");
    let services = cx.services();
    let account_id = &cx.item.account().id;

    let href = match (token.param(TYPE), &cx.latest) {
        (Some(VERSION_URL), Some(latest)) => WikiUrl::for_item(latest.meta())
            .full_url(services, &latest.account().id)
            .map(|url| Some(format!("{url}?ver={}", cx.item.meta().version))),
        (Some(HISTORY_URL), _) if cx.item.is_folder() => Ok(None),
        (Some(HISTORY_URL), _) => {
            title = token.param(LABEL).unwrap_or(HISTORY_URL).to_string();
            WikiUrl::for_item(cx.item.meta())
                .full_url(services, account_id)
                .map(|url| Some(format!("{url}?view={HISTORY_URL}")))
        }
        _ => WikiUrl::for_item(cx.item.meta())
            .full_url(services, account_id)
            .map(Some),
    };

    match href {
        Ok(Some(href)) => Ok(format!("<a href='{href}'>{title}</a>")),
        Ok(None) => Ok(String::new()),
        Err(err) if err.is_recoverable() => {
            Ok(format!("<!-- cannot generate URL for item {title} -->{title}"))
        }
        Err(err) => Err(err),
    }
}
