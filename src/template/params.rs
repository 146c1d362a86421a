//! Directive parameter parsing.
//!
//! `key1 value1="a b" key2='c'` becomes
//! `{key1: "key1", value1: "a b", key2: "c"}`. A bare key maps to itself,
//! later duplicates overwrite the value but keep the first position.
//! Parsing never fails: an unterminated quote drops its key.

use indexmap::IndexMap;

/// Ordered parameter map of one directive.
pub type Params = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Key,
    Value,
    Quoted(char),
}

pub fn parse_params(text: &str) -> Params {
    let mut params = Params::new();
    let mut state = State::Key;
    let mut key = String::new();
    let mut value = String::new();

    // A synthetic trailing space flushes the last pair
    for c in text.chars().chain(std::iter::once(' ')) {
        match state {
            State::Key => {
                if c.is_whitespace() {
                    if !key.is_empty() {
                        params.insert(key.clone(), key.clone());
                    }
                    key.clear();
                } else if c == '=' {
                    state = State::Value;
                } else {
                    key.push(c);
                }
            }
            State::Value => {
                if value.is_empty() && (c == '"' || c == '\'') {
                    state = State::Quoted(c);
                } else if c.is_whitespace() {
                    commit(&mut params, &mut key, &mut value);
                    state = State::Key;
                } else {
                    value.push(c);
                }
            }
            State::Quoted(quote) => {
                if c == quote && !value.ends_with('\\') {
                    commit(&mut params, &mut key, &mut value);
                    state = State::Key;
                } else {
                    value.push(c);
                }
            }
        }
    }
    params
}

fn commit(params: &mut Params, key: &mut String, value: &mut String) {
    if !key.is_empty() {
        params.insert(std::mem::take(key), std::mem::take(value));
    } else {
        value.clear();
    }
}
