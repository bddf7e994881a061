//! Text to identifier normalization.

/// Convert text to a URL-safe slug.
///
/// Lower-cases and trims the input, drops every character that is not
/// alphanumeric, `_`, `-` or whitespace, collapses runs of whitespace, `_` and
/// `-` into a single `-` and never emits a leading or trailing `-`.
///
/// Slugs are not unique; callers de-duplicate.
///
/// # Examples
///
/// ```
/// use gmv_renderer::slugify;
///
/// assert_eq!(slugify("My Page!"), "my-page");
/// assert_eq!(slugify("  A -- B  "), "a-b");
/// assert_eq!(slugify("snake_case_name"), "snake-case-name");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}
