//! Diagnostic output with colored module prefixes.
//!
//! Everything goes to stderr so rendered pages written to stdout stay clean.
//!
//! | Module | Color | Used for |
//! |--------|-------|----------|
//! | `render` | blue | template lookups, depth limits |
//! | `cache` | green | invalidation, expiry |
//! | `error` | red | failures reported by the binary |
//! | anything else | yellow | `wiklet`, `wiki`, `config`, … |
//!
//! # Example
//!
//! ```ignore
//! log!("wiklet"; "format {} not recognized", format);
//! log!("error"; "{err:#}");
//! ```

use colored::{Color, ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stderr},
    sync::{
        OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

/// Width assumed when stderr is not a terminal.
const FALLBACK_WIDTH: u16 = 120;

/// Module whose lines survive quiet mode.
const ERROR_MODULE: &str = "error";

const MODULE_COLORS: &[(&str, Color)] = &[
    ("render", Color::BrightBlue),
    ("cache", Color::BrightGreen),
    (ERROR_MODULE, Color::BrightRed),
];

static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

static QUIET: AtomicBool = AtomicBool::new(false);

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("cache"; "invalidated {name}");
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Silence every module except `error`.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

/// Write one line to stderr. Single-line messages are cut to the terminal
/// width; multi-line ones are written whole.
pub fn log(module: &str, message: &str) {
    if QUIET.load(Ordering::Relaxed) && !module.eq_ignore_ascii_case(ERROR_MODULE) {
        return;
    }
    let prefix = prefix(module);

    let mut out = stderr().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    let message = if message.contains('\n') {
        message
    } else {
        // "[module] " takes the module name plus three columns
        let room = usize::from(terminal_width()).saturating_sub(module.len() + 3);
        truncate_str(message, room)
    };
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

fn terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map_or(FALLBACK_WIDTH, |(width, _)| width))
}

fn module_color(module: &str) -> Color {
    MODULE_COLORS
        .iter()
        .find(|(name, _)| module.eq_ignore_ascii_case(name))
        .map_or(Color::BrightYellow, |(_, color)| *color)
}

fn prefix(module: &str) -> ColoredString {
    format!("[{module}]").color(module_color(module)).bold()
}

/// Longest prefix of `s` within `max_len` bytes that ends on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let end = (0..=max_len).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 3), "hel");
        // "é" is two bytes; never split it
        assert_eq!(truncate_str("héllo", 2), "h");
        assert_eq!(truncate_str("", 0), "");
    }

    #[test]
    fn test_prefix_text() {
        colored::control::set_override(false);
        assert_eq!(prefix("Cache").to_string(), "[Cache]");
        assert_eq!(prefix("wiklet").to_string(), "[wiklet]");
    }

    #[test]
    fn test_module_colors() {
        assert_eq!(module_color("RENDER"), Color::BrightBlue);
        assert_eq!(module_color("error"), Color::BrightRed);
        assert_eq!(module_color("wiki"), Color::BrightYellow);
    }
}
