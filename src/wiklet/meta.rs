//! Item metadata directives.

use crate::context::Context;
use crate::services::ROOT_FOLDER_ID;
use crate::template::Token;

pub fn icon(cx: &Context<'_>) -> String {
    let class = if cx.item.is_document() {
        "ImgPage"
    } else if cx.item.meta().folder_id == ROOT_FOLDER_ID {
        "ImgNotebook"
    } else {
        "ImgSection"
    };
    format!("<div class='{class}'></div>")
}

pub fn name(cx: &Context<'_>) -> String {
    escape_angles(cx.item.name())
}

pub fn fragment(cx: &Context<'_>) -> String {
    if cx.item.is_document() {
        cx.item.meta().fragment.clone()
    } else {
        String::new()
    }
}

/// Owner of a folder, author of a document's first revision.
pub fn creator(cx: &Context<'_>) -> String {
    if cx.item.is_folder() {
        cx.item.account().name.clone()
    } else {
        cx.item.meta().creator.clone()
    }
}

pub fn modifier(cx: &Context<'_>) -> String {
    if cx.item.is_document() {
        cx.item.meta().modifier.clone()
    } else {
        String::new()
    }
}

pub fn tags(cx: &Context<'_>) -> String {
    let tags = &cx.item.meta().tags;
    if cx.item.is_folder() || tags.is_empty() {
        return String::new();
    }
    let mut out = String::from("<span class='zmwiki-tagsTitle'>Tags: </span>");
    for (i, tag) in tags.iter().enumerate() {
        let separator = if i + 1 == tags.len() { " " } else { ", " };
        out.push_str(&format!("<span class='zmwiki-tags'>{tag}{separator} </span>"));
    }
    out
}

/// Folders are always at version 1.
pub fn version(cx: &Context<'_>) -> String {
    if cx.item.is_document() {
        cx.item.meta().version.to_string()
    } else {
        "1".to_string()
    }
}

/// Catalog message `key`, in the locale of the account owning the subject.
pub fn msg(cx: &Context<'_>, token: &Token) -> String {
    let Some(key) = token.param("key") else {
        return String::new();
    };
    let locale = cx.item.account().locale.as_deref();
    cx.services()
        .localizer
        .message(key, locale)
        .unwrap_or_default()
}

fn escape_angles(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}
