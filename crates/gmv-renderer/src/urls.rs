//! Base URL handling.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `href`/`src` attributes whose value starts with exactly one `/`.
static ROOT_RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\s(?:href|src)\s*=\s*)(?:"(/(?:[^/"][^"]*)?)"|'(/(?:[^/'][^']*)?)')"#)
        .unwrap()
});

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Strip trailing slashes from a base URL.
#[must_use]
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Whether `url` is absolute: it carries a scheme or is protocol-relative.
#[must_use]
pub fn is_absolute_url(url: &str) -> bool {
    url.starts_with("//") || SCHEME_RE.is_match(url)
}

/// Prefix root-relative `href`/`src` values with `base_url`.
///
/// Values starting with `//` are protocol-relative and left alone. With an
/// absolute base the pass is idempotent, since rewritten values no longer
/// start with `/`.
///
/// ```
/// use gmv_renderer::absolutize_urls;
///
/// let html = absolutize_urls(r#"<a href="/x">x</a>"#, "http://h:3000/");
/// assert_eq!(html, r#"<a href="http://h:3000/x">x</a>"#);
/// ```
#[must_use]
pub fn absolutize_urls(html: &str, base_url: &str) -> String {
    let base = normalize_base_url(base_url);
    if base.is_empty() {
        return html.to_owned();
    }

    ROOT_RELATIVE_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let attr = &caps[1];
            match (caps.get(2), caps.get(3)) {
                (Some(value), _) => format!(r#"{attr}"{base}{}""#, value.as_str()),
                (None, Some(value)) => format!("{attr}'{base}{}'", value.as_str()),
                (None, None) => caps[0].to_owned(),
            }
        })
        .into_owned()
}
