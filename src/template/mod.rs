//! Page templates.
//!
//! A [`Template`] is the raw source of one page plus its lazily built token
//! list. Identity is the `account:scope:name` triple it was loaded under;
//! templates built on the fly (breadcrumb markup, nested link targets) are
//! anonymous and carry the empty id.

mod params;
mod token;

pub use params::{Params, parse_params};
pub use token::{CLASS_ATTR, Token, TokenKind, WIKLET_TAG, tokenize};

use std::sync::OnceLock;
use std::time::Instant;

use parking_lot::Mutex;

#[derive(Debug)]
pub struct Template {
    id: String,
    source: String,
    tokens: OnceLock<Vec<Token>>,
    /// Advisory only; nothing reads it on the render path.
    last_rendered: Mutex<Option<Instant>>,
}

impl Template {
    /// Anonymous template.
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_id(String::new(), source)
    }

    /// Template loaded from `name` in the notebook `scope` of `account`.
    pub fn named(account: &str, scope: &str, name: &str, source: impl Into<String>) -> Self {
        Self::with_id(format!("{account}:{scope}:{name}"), source)
    }

    fn with_id(id: String, source: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
            tokens: OnceLock::new(),
            last_rendered: Mutex::new(None),
        }
    }

    /// Placeholder rendered in place of a template that could not be found.
    pub fn missing(name: &str) -> Self {
        Self::new(format!("<!-- missing template {name} -->"))
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.id.is_empty()
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Token list, parsed on first access.
    pub fn tokens(&self) -> &[Token] {
        self.tokens.get_or_init(|| tokenize(&self.source))
    }

    pub fn touch(&self, now: Instant) {
        *self.last_rendered.lock() = Some(now);
    }

    pub fn last_rendered(&self) -> Option<Instant> {
        *self.last_rendered.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = Template::named("acct-1", "12", "Home", "body");
        assert_eq!(t.id(), "acct-1:12:Home");
        assert!(!t.is_anonymous());
        assert!(Template::new("x").is_anonymous());
        assert_eq!(Template::named("", "", "", "").id(), "::");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let t = Template::new("Hello {{NAME}} and [[Other]] bye");
        let first: Vec<String> = t.tokens().iter().map(|tok| tok.value().to_string()).collect();
        let again: Vec<String> = t.tokens().iter().map(|tok| tok.value().to_string()).collect();
        assert_eq!(first, again);
        assert_eq!(first.len(), 5);
        assert!(std::ptr::eq(t.tokens().as_ptr(), t.tokens().as_ptr()));
    }

    #[test]
    fn test_missing_placeholder() {
        let t = Template::missing("_Footer");
        assert_eq!(t.source(), "<!-- missing template _Footer -->");
        assert_eq!(t.tokens()[0].kind(), TokenKind::Comment);
    }

    #[test]
    fn test_touch() {
        let t = Template::new("x");
        assert!(t.last_rendered().is_none());
        let now = Instant::now();
        t.touch(now);
        assert_eq!(t.last_rendered(), Some(now));
    }
}
