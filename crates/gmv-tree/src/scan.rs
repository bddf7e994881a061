//! Line-level markdown scanning for headings.
//!
//! The tree parsers only need headings and the text between them, so this is a
//! line scanner rather than a full parse. Front matter and fenced code blocks
//! are skipped.

use std::cmp::Ordering;
use std::sync::LazyLock;

use gmv_renderer::strip_cross_references;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// ATX heading with optional closing `#` sequence.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").unwrap()
});

/// A meaningful line of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    /// ATX heading with level 1-6 and its title, cross-references stripped.
    Heading { level: u8, title: String },
    /// Any other line outside front matter and code fences.
    Text(&'a str),
}

/// Iterate the headings and text lines of `text`.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut fence: Option<(char, usize)> = None;

    body(text).lines().filter_map(move |line| {
        let trimmed = line.trim_start();

        if let Some((marker, len)) = fence {
            if fence_marker(trimmed).is_some_and(|(m, l)| m == marker && l >= len)
                && trimmed.trim_start_matches(marker).trim().is_empty()
            {
                fence = None;
            }
            return None;
        }
        if let Some(open) = fence_marker(trimmed) {
            fence = Some(open);
            return None;
        }

        match HEADING_RE.captures(line) {
            Some(caps) => {
                let level = u8::try_from(caps[1].len()).unwrap_or(6);
                let raw = caps.get(2).map_or("", |m| m.as_str());
                let title = strip_cross_references(raw).trim().to_owned();
                Some(Line::Heading { level, title })
            }
            None => Some(Line::Text(line)),
        }
    })
}

/// First level-1 heading title, if any and not blank.
pub(crate) fn first_heading(text: &str) -> Option<String> {
    lines(text).find_map(|line| match line {
        Line::Heading { level: 1, title } if !title.is_empty() => Some(title),
        _ => None,
    })
}

/// Locale-style name ordering.
///
/// Names compare by base letters first, ignoring case and accents, so
/// `Éclair` sorts between `apple` and `Zebra`. Ties fall back to the
/// lower-cased name, then the raw name.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Lower-cased name with accents removed (NFD minus combining marks).
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Document text after YAML front matter.
fn body(text: &str) -> &str {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return text;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let line = line.trim_end();
        if line == "---" || line == "..." {
            return &rest[offset..];
        }
    }
    text
}

/// Opening fence marker (char and run length) of a code fence line.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let marker = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = line.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}
