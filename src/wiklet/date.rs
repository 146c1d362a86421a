//! CREATEDATE and MODIFYDATE.
//!
//! `format` picks a style and a part:
//!
//! | Style | date | time |
//! |-------|------|------|
//! | `short` | `3/5/24` | `2:07 PM` |
//! | `medium` | `Mar 5, 2024` | `2:07:09 PM` |
//! | `long` | `March 5, 2024` | `2:07:09 PM UTC` |
//! | `full` | `Tuesday, March 5, 2024` | `2:07:09 PM UTC` |
//!
//! Parts are `date`, `time` and `dateandtime`; an unknown or missing format
//! means `shortdateandtime`. With a locale the locale's own names and
//! orderings are used instead. Times are shown in UTC.

use chrono::{DateTime, Locale, Utc};

use crate::context::Context;
use crate::template::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Short,
    Medium,
    Long,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Date,
    Time,
    DateAndTime,
}

/// Parse `shortdate`, `longdateandtime`, … ; anything else is
/// `shortdateandtime`.
fn parse_format(format: Option<&str>) -> (Style, Part) {
    const DEFAULT: (Style, Part) = (Style::Short, Part::DateAndTime);
    let Some(format) = format else {
        return DEFAULT;
    };
    let (style, rest) = [
        ("short", Style::Short),
        ("medium", Style::Medium),
        ("long", Style::Long),
        ("full", Style::Full),
    ]
    .into_iter()
    .find_map(|(prefix, style)| format.strip_prefix(prefix).map(|rest| (style, rest)))
    .unwrap_or((Style::Short, ""));

    match rest {
        "date" => (style, Part::Date),
        "time" => (style, Part::Time),
        "dateandtime" => (style, Part::DateAndTime),
        _ => DEFAULT,
    }
}

const fn date_pattern(style: Style, localized: bool) -> &'static str {
    match (style, localized) {
        (Style::Short, false) => "%-m/%-d/%y",
        (Style::Medium, false) => "%b %-d, %Y",
        (Style::Long, false) => "%B %-d, %Y",
        (Style::Full, false) => "%A, %B %-d, %Y",
        (Style::Short, true) => "%x",
        (Style::Medium, true) => "%-d %b %Y",
        (Style::Long, true) => "%-d %B %Y",
        (Style::Full, true) => "%A %-d %B %Y",
    }
}

const fn time_pattern(style: Style, localized: bool) -> &'static str {
    match (style, localized) {
        (Style::Short, false) => "%-I:%M %p",
        (Style::Medium, false) => "%-I:%M:%S %p",
        (Style::Long | Style::Full, false) => "%-I:%M:%S %p %Z",
        (Style::Short, true) => "%H:%M",
        (Style::Medium, true) => "%X",
        (Style::Long | Style::Full, true) => "%X %Z",
    }
}

/// `fr-FR`, `fr_FR` and bare `fr` (as `fr_FR`) are accepted.
fn parse_locale(locale: &str) -> Option<Locale> {
    let normalized = locale.replace('-', "_");
    if let Ok(found) = Locale::try_from(normalized.as_str()) {
        return Some(found);
    }
    if normalized.contains('_') {
        return None;
    }
    let doubled = format!("{normalized}_{}", normalized.to_uppercase());
    Locale::try_from(doubled.as_str()).ok()
}

pub fn format_date(at: DateTime<Utc>, format: Option<&str>, locale: Option<&str>) -> String {
    let (style, part) = parse_format(format);
    let locale = locale.and_then(parse_locale);
    let localized = locale.is_some();

    let pattern = match part {
        Part::Date => date_pattern(style, localized).to_string(),
        Part::Time => time_pattern(style, localized).to_string(),
        Part::DateAndTime => format!(
            "{} {}",
            date_pattern(style, localized),
            time_pattern(style, localized)
        ),
    };

    match locale {
        Some(locale) => at.format_localized(&pattern, locale).to_string(),
        None => at.format(&pattern).to_string(),
    }
}

/// Date of the first revision.
pub fn create_date(cx: &Context<'_>, token: &Token) -> String {
    format_date(cx.item.meta().created, token.param("format"), cx.locale.as_deref())
}

pub fn modify_date(cx: &Context<'_>, token: &Token) -> String {
    format_date(cx.item.meta().modified, token.param("format"), cx.locale.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;
    use crate::services::{ItemKind, NOTEBOOK_FOLDER_ID};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format(None), (Style::Short, Part::DateAndTime));
        assert_eq!(parse_format(Some("longdate")), (Style::Long, Part::Date));
        assert_eq!(parse_format(Some("mediumtime")), (Style::Medium, Part::Time));
        assert_eq!(parse_format(Some("fulldateandtime")), (Style::Full, Part::DateAndTime));
        assert_eq!(parse_format(Some("longish")), (Style::Short, Part::DateAndTime));
        assert_eq!(parse_format(Some("date")), (Style::Short, Part::DateAndTime));
    }

    #[test]
    fn test_unlocalized_formats() {
        assert_eq!(format_date(at(), None, None), "3/5/24 2:07 PM");
        assert_eq!(format_date(at(), Some("bogus"), None), "3/5/24 2:07 PM");
        assert_eq!(format_date(at(), Some("shortdate"), None), "3/5/24");
        assert_eq!(format_date(at(), Some("mediumdate"), None), "Mar 5, 2024");
        assert_eq!(format_date(at(), Some("longdate"), None), "March 5, 2024");
        assert_eq!(format_date(at(), Some("fulldate"), None), "Tuesday, March 5, 2024");
        assert_eq!(format_date(at(), Some("mediumtime"), None), "2:07:09 PM");
        assert_eq!(format_date(at(), Some("longtime"), None), "2:07:09 PM UTC");
        assert_eq!(
            format_date(at(), Some("mediumdateandtime"), None),
            "Mar 5, 2024 2:07:09 PM"
        );
    }

    #[test]
    fn test_localized_formats() {
        let text = format_date(at(), Some("longdate"), Some("fr_FR"));
        assert!(text.contains("mars"), "{text}");
        assert!(text.contains("2024"), "{text}");
        assert_eq!(format_date(at(), Some("shorttime"), Some("fr-FR")), "14:07");
        assert_eq!(format_date(at(), Some("shorttime"), Some("de")), "14:07");
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        assert_eq!(format_date(at(), Some("shortdate"), Some("xx_YY")), "3/5/24");
    }

    #[test]
    fn test_directives() {
        let fx = Fixture::new();
        let page = fx.wiki_page(NOTEBOOK_FOLDER_ID, "Home", "one");
        fx.store
            .set_time(Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap());
        fx.store
            .put("a1", NOTEBOOK_FOLDER_ID, "Home", ItemKind::Wiki, "two", "bob")
            .unwrap();

        assert_eq!(fx.render("{{CREATEDATE format=shortdate}}", page), "3/5/24");
        assert_eq!(fx.render("{{MODIFYDATE format=shortdate}}", page), "4/1/24");
        assert_eq!(fx.render("{{MODIFYDATE}}", page), "4/1/24 9:30 AM");
    }
}
