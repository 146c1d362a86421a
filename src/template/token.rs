//! Tokenizer for wiki page sources.
//!
//! A source is split into a flat token list. Four delimiter grammars are
//! recognised, tested in this order at every position:
//!
//! | Opener | Closer | Token | Value |
//! |--------|--------|-------|-------|
//! | `<!--` | `-->` | `Comment` | whole comment, delimiters included |
//! | `{{` | `}}` | `Wiklet` | text between the braces |
//! | `[[` | `]]` | `Wikilink` | text between the brackets |
//! | `<wiklet` | `/>` or `>…</wiklet>` | `Wiklet` | tag text without `<`, `>` and `/` |
//!
//! An opener without its closer is plain text. Text runs stop at the next
//! opener. Scanning ends once fewer than two characters remain, so a single
//! trailing character after a directive is not emitted.

use std::sync::OnceLock;

use serde::Serialize;

use super::params::{Params, parse_params};

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const WIKLET_OPEN: &str = "{{";
const WIKLET_CLOSE: &str = "}}";
const LINK_OPEN: &str = "[[";
const LINK_CLOSE: &str = "]]";
const TAG_OPEN: &str = "<wiklet";
const TAG_CLOSE: &str = "</wiklet>";

/// Word that marks the tag form of a directive (`<wiklet class=… />`).
pub const WIKLET_TAG: &str = "wiklet";
/// Attribute naming the directive in the tag form.
pub const CLASS_ATTR: &str = "class";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenKind {
    Text,
    Comment,
    Wiklet,
    Wikilink,
}

/// One lexical unit of a page source.
#[derive(Debug, Clone)]
pub struct Token {
    kind: TokenKind,
    value: String,
    params: OnceLock<Params>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            params: OnceLock::new(),
        }
    }

    #[inline]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Text and comments are copied to the output untouched.
    #[inline]
    pub const fn is_verbatim(&self) -> bool {
        matches!(self.kind, TokenKind::Text | TokenKind::Comment)
    }

    /// Parameters of the directive, parsed on first access.
    pub fn params(&self) -> &Params {
        self.params.get_or_init(|| parse_params(&self.value))
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params().get(key).map(String::as_str)
    }

    /// First whitespace-delimited word of the value.
    pub fn first_word(&self) -> &str {
        self.value.split_whitespace().next().unwrap_or("")
    }

    /// First positional argument: a bare key other than the directive name
    /// and the `class` attribute.
    pub fn argument(&self) -> Option<&str> {
        let head = self.first_word();
        self.params()
            .iter()
            .enumerate()
            .filter(|(i, (key, _))| !(*i == 0 && key.as_str() == head))
            .filter(|(_, (key, _))| key.as_str() != CLASS_ATTR)
            .find(|(_, (key, value))| key == value)
            .map(|(_, (key, _))| key.as_str())
    }
}

// ============================================================================
// Scanner
// ============================================================================

/// Split `text` into tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let Some((last, _)) = text.char_indices().next_back() else {
        return tokens;
    };

    let mut pos = 0;
    while pos < last {
        if let Some((token, next)) = directive_at(text, pos) {
            tokens.push(token);
            pos = next;
            continue;
        }

        let mut end = pos + char_len_at(text, pos);
        while end < last && !opener_at(text, end) {
            end += char_len_at(text, end);
        }
        if end == last {
            end = text.len();
        }
        tokens.push(Token::new(TokenKind::Text, &text[pos..end]));
        pos = end;
    }
    tokens
}

#[inline]
fn char_len_at(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(1, char::len_utf8)
}

#[inline]
fn opener_at(text: &str, pos: usize) -> bool {
    let rest = &text[pos..];
    [COMMENT_OPEN, WIKLET_OPEN, LINK_OPEN, TAG_OPEN]
        .iter()
        .any(|opener| rest.starts_with(opener))
}

/// Match a complete directive at `pos`, returning it and the offset after it.
fn directive_at(text: &str, pos: usize) -> Option<(Token, usize)> {
    let rest = &text[pos..];

    if rest.starts_with(COMMENT_OPEN) {
        let close = pos + COMMENT_OPEN.len() + text[pos + COMMENT_OPEN.len()..].find(COMMENT_CLOSE)?;
        let end = close + COMMENT_CLOSE.len();
        return Some((Token::new(TokenKind::Comment, &text[pos..end]), end));
    }
    if rest.starts_with(WIKLET_OPEN) {
        return delimited(text, pos, WIKLET_OPEN, WIKLET_CLOSE, TokenKind::Wiklet);
    }
    if rest.starts_with(LINK_OPEN) {
        return delimited(text, pos, LINK_OPEN, LINK_CLOSE, TokenKind::Wikilink);
    }
    if rest.starts_with(TAG_OPEN) {
        return wiklet_tag(text, pos);
    }
    None
}

fn delimited(
    text: &str,
    pos: usize,
    open: &str,
    close: &str,
    kind: TokenKind,
) -> Option<(Token, usize)> {
    let start = pos + open.len();
    let inner_end = start + text[start..].find(close)?;
    Some((Token::new(kind, &text[start..inner_end]), inner_end + close.len()))
}

/// `<wiklet … />` or `<wiklet …>body</wiklet>`; the body is discarded.
fn wiklet_tag(text: &str, pos: usize) -> Option<(Token, usize)> {
    let gt = pos + TAG_OPEN.len() + text[pos + TAG_OPEN.len()..].find('>')?;
    let tag = &text[pos + 1..gt];

    if let Some(open) = tag.strip_suffix('/') {
        return Some((Token::new(TokenKind::Wiklet, open.trim_end()), gt + 1));
    }

    let close = gt + 1 + text[gt + 1..].find(TAG_CLOSE)?;
    Some((Token::new(TokenKind::Wiklet, tag.trim_end()), close + TAG_CLOSE.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_values(text: &str) -> Vec<(TokenKind, String)> {
        tokenize(text)
            .into_iter()
            .map(|t| (t.kind(), t.value().to_string()))
            .collect()
    }

    #[test]
    fn test_adjacent_wiklets() {
        assert_eq!(
            kinds_and_values("{{A}}{{B}}"),
            vec![
                (TokenKind::Wiklet, "A".to_string()),
                (TokenKind::Wiklet, "B".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_is_text() {
        assert_eq!(
            kinds_and_values("{{A"),
            vec![(TokenKind::Text, "{{A".to_string())]
        );
    }

    #[test]
    fn test_unterminated_after_text() {
        assert_eq!(
            kinds_and_values("see {{NAME"),
            vec![
                (TokenKind::Text, "see ".to_string()),
                (TokenKind::Text, "{{NAME".to_string()),
            ]
        );
    }

    #[test]
    fn test_plain_text_is_one_token() {
        let text = "Hello, wiki world.\nSecond line with ünïcödé.";
        let tokens = tokenize(text);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value(), text);
    }

    #[test]
    fn test_short_inputs() {
        assert!(tokenize("").is_empty());
        // Fewer than two characters never produce a token
        assert!(tokenize("x").is_empty());
        assert_eq!(kinds_and_values("xy"), vec![(TokenKind::Text, "xy".to_string())]);
        // A lone character after a directive is dropped
        assert_eq!(kinds_and_values("{{A}}!").len(), 1);
    }

    #[test]
    fn test_mixed_grammars() {
        let tokens = kinds_and_values("a <!-- c {{X}} --> {{NAME}} [[Page|title]] z.");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Text, "a ".to_string()),
                (TokenKind::Comment, "<!-- c {{X}} -->".to_string()),
                (TokenKind::Text, " ".to_string()),
                (TokenKind::Wiklet, "NAME".to_string()),
                (TokenKind::Text, " ".to_string()),
                (TokenKind::Wikilink, "Page|title".to_string()),
                (TokenKind::Text, " z.".to_string()),
            ]
        );
    }

    #[test]
    fn test_wiklet_tag_self_closing() {
        let tokens = tokenize("<wiklet class='toc' format=simple /> after");
        assert_eq!(tokens[0].kind(), TokenKind::Wiklet);
        assert_eq!(tokens[0].value(), "wiklet class='toc' format=simple");
        assert_eq!(tokens[1].value(), " after");
    }

    #[test]
    fn test_wiklet_tag_with_body() {
        let tokens = kinds_and_values("<wiklet class='name'>ignored body</wiklet>!!");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Wiklet, "wiklet class='name'".to_string()),
                (TokenKind::Text, "!!".to_string()),
            ]
        );
    }

    #[test]
    fn test_wiklet_tag_without_close_is_text() {
        let tokens = kinds_and_values("<wiklet class='name'> no end");
        assert_eq!(tokens, vec![(TokenKind::Text, "<wiklet class='name'> no end".to_string())]);
    }

    #[test]
    fn test_wikilink_with_brackets_inside() {
        let tokens = tokenize("[[Title][/Notebook/Page]]..");
        assert_eq!(tokens[0].kind(), TokenKind::Wikilink);
        assert_eq!(tokens[0].value(), "Title][/Notebook/Page");
    }

    #[test]
    fn test_argument_skips_name_and_class() {
        let token = Token::new(TokenKind::Wiklet, "INCLUDE header");
        assert_eq!(token.argument(), Some("header"));

        let token = Token::new(TokenKind::Wiklet, "wiklet class='include' footer");
        assert_eq!(token.argument(), Some("footer"));

        let token = Token::new(TokenKind::Wiklet, "INCLUDE page=x");
        assert_eq!(token.argument(), None);
    }

    #[test]
    fn test_params_memoized() {
        let token = Token::new(TokenKind::Wiklet, "TOC format=simple");
        let first = token.params() as *const Params;
        let second = token.params() as *const Params;
        assert_eq!(first, second);
        assert_eq!(token.param("format"), Some("simple"));
    }
}
