//! In-document heading parser.

use std::collections::HashSet;

use gmv_renderer::cross_references;
use gmv_storage::{DocumentRef, Storage};

use super::{ParseError, TreeParser};
use crate::model::{BlockType, Category, Page, Session};
use crate::scan::{Line, first_heading, lines};

/// Headings whose sections are skipped by [`HeadingMode::Structured`].
pub const DEFAULT_IGNORE_HEADINGS: &[&str] = &[
    "Notes",
    "Session Notes",
    "Recap",
    "Summary",
    "Story",
    "Narrative",
    "Overview",
];

/// Name of the category collecting references outside any heading.
const PAGES_CATEGORY: &str = "Pages";

/// Heading that nests deeper headings as subcategories.
const ENEMIES_HEADING: &str = "Enemies";

/// Deepest heading level that opens a regular category.
const MAX_CATEGORY_LEVEL: u8 = 2;

/// Variant of heading extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeadingMode {
    /// `#`/`##` headings become categories with keyword handling.
    #[default]
    Structured,
    /// Every cross-reference becomes a page in one `Pages` category.
    Flat,
}

/// Builds a session from the headings of the entry document.
///
/// In [`HeadingMode::Structured`]:
///
/// - `#` and `##` headings open categories, `##` nested under the open `#`
/// - `[[references]]` become pages of the innermost open category
/// - a heading named `Tables`, `Quotes` or `Images` tags its pages with the
///   matching [`BlockType`]
/// - under `Enemies`, deeper headings open nested subcategories
/// - sections under an ignored heading are skipped until the next heading of
///   the same or a shallower level
/// - references before any category go to a `Pages` category
///
/// Slugs are unique across the document; the first reference wins.
#[derive(Clone, Debug)]
pub struct HeadingParser {
    mode: HeadingMode,
    ignore_headings: Vec<String>,
}

impl HeadingParser {
    /// Create a parser with the default ignore list.
    #[must_use]
    pub fn new(mode: HeadingMode) -> Self {
        Self {
            mode,
            ignore_headings: DEFAULT_IGNORE_HEADINGS
                .iter()
                .map(|&h| h.to_owned())
                .collect(),
        }
    }

    /// Replace the ignore list. Matching is case-insensitive.
    #[must_use]
    pub fn with_ignore_headings(mut self, headings: Vec<String>) -> Self {
        self.ignore_headings = headings;
        self
    }

    /// Extraction variant.
    #[must_use]
    pub fn mode(&self) -> HeadingMode {
        self.mode
    }

    /// Build a session from document text.
    #[must_use]
    pub fn parse_text(&self, name: &str, text: &str) -> Session {
        let name = first_heading(text).unwrap_or_else(|| name.to_owned());
        let mut session = Session::new(name);
        session.categories = match self.mode {
            HeadingMode::Flat => flat_categories(text),
            HeadingMode::Structured => StructuredBuilder::new(&self.ignore_headings).build(text),
        };
        session
    }
}

impl Default for HeadingParser {
    fn default() -> Self {
        Self::new(HeadingMode::default())
    }
}

impl TreeParser for HeadingParser {
    fn parse(&self, storage: &dyn Storage, entry: &DocumentRef) -> Result<Session, ParseError> {
        let text = storage.read(entry).map_err(|source| ParseError::ReadEntry {
            path: entry.path().to_owned(),
            source,
        })?;
        let session = self.parse_text(entry.stem(), &text);
        tracing::debug!(entry = %entry, mode = ?self.mode, "Parsed document headings");
        Ok(session)
    }
}

/// All references of the document in one `Pages` category.
fn flat_categories(text: &str) -> Vec<Category> {
    let mut seen = HashSet::new();
    let mut category = Category::new(PAGES_CATEGORY);

    for line in text.lines() {
        for reference in cross_references(line) {
            let slug = reference.slug();
            if seen.insert(slug.clone()) {
                category.pages.push(Page::new(reference.display_text(), slug));
            }
        }
    }

    if category.pages.is_empty() {
        Vec::new()
    } else {
        vec![category]
    }
}

/// An open category while walking the document.
struct Frame {
    level: u8,
    category: Category,
    block_type: Option<BlockType>,
    nests_headings: bool,
}

struct StructuredBuilder<'p> {
    ignore_headings: &'p [String],
    top: Vec<Category>,
    stack: Vec<Frame>,
    /// Index in `top` of the category for references outside any heading.
    loose_pages: Option<usize>,
    /// Level of the ignored heading whose section is being skipped.
    skip_level: Option<u8>,
    seen: HashSet<String>,
}

impl<'p> StructuredBuilder<'p> {
    fn new(ignore_headings: &'p [String]) -> Self {
        Self {
            ignore_headings,
            top: Vec::new(),
            stack: Vec::new(),
            loose_pages: None,
            skip_level: None,
            seen: HashSet::new(),
        }
    }

    fn build(mut self, text: &str) -> Vec<Category> {
        for line in lines(text) {
            match line {
                Line::Heading { level, title } => self.heading(level, title),
                Line::Text(line) if self.skip_level.is_none() => self.references(line),
                Line::Text(_) => {}
            }
        }
        while self.close_innermost() {}
        self.top
    }

    fn heading(&mut self, level: u8, title: String) {
        if self.skip_level.is_some_and(|skip| level > skip) {
            return;
        }
        self.skip_level = None;

        let nesting = self
            .stack
            .iter()
            .any(|frame| frame.nests_headings && frame.level < level);
        if level > MAX_CATEGORY_LEVEL && !nesting {
            // Plain subheading: its references stay in the enclosing category.
            if self.is_ignored(&title) {
                self.skip_level = Some(level);
            }
            return;
        }

        while self.stack.last().is_some_and(|frame| frame.level >= level) {
            self.close_innermost();
        }

        if self.is_ignored(&title) {
            self.skip_level = Some(level);
            return;
        }

        let keyword = level <= MAX_CATEGORY_LEVEL;
        let block_type = if keyword { keyword_block_type(&title) } else { None };
        let nests_headings = keyword && title.eq_ignore_ascii_case(ENEMIES_HEADING);
        self.stack.push(Frame {
            level,
            category: Category::new(title),
            block_type,
            nests_headings,
        });
    }

    fn references(&mut self, line: &str) {
        for reference in cross_references(line) {
            let slug = reference.slug();
            if !self.seen.insert(slug.clone()) {
                continue;
            }
            let mut page = Page::new(reference.display_text(), slug);

            match self.stack.last_mut() {
                Some(frame) => {
                    if let Some(block_type) = frame.block_type {
                        page.block_types.insert(block_type);
                    }
                    frame.category.pages.push(page);
                }
                None => {
                    let index = *self.loose_pages.get_or_insert_with(|| {
                        self.top.push(Category::new(PAGES_CATEGORY));
                        self.top.len() - 1
                    });
                    self.top[index].pages.push(page);
                }
            }
        }
    }

    /// Close the innermost open category. Returns `false` when none is open.
    fn close_innermost(&mut self) -> bool {
        let Some(frame) = self.stack.pop() else {
            return false;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.category.categories.push(frame.category),
            None => self.top.push(frame.category),
        }
        true
    }

    fn is_ignored(&self, title: &str) -> bool {
        self.ignore_headings
            .iter()
            .any(|h| h.trim().eq_ignore_ascii_case(title))
    }
}

fn keyword_block_type(title: &str) -> Option<BlockType> {
    [
        ("Tables", BlockType::Table),
        ("Quotes", BlockType::Quote),
        ("Images", BlockType::Image),
    ]
    .into_iter()
    .find(|(keyword, _)| title.eq_ignore_ascii_case(keyword))
    .map(|(_, block_type)| block_type)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use gmv_storage::MockStorage;
    use pretty_assertions::assert_eq;

    use super::*;

    fn structured(text: &str) -> Session {
        HeadingParser::new(HeadingMode::Structured).parse_text("Doc", text)
    }

    fn flat(text: &str) -> Session {
        HeadingParser::new(HeadingMode::Flat).parse_text("Doc", text)
    }

    fn slugs(category: &Category) -> Vec<&str> {
        category.pages.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_flat_deduplicates_first_wins() {
        let session = flat("[[A|First]] text [[A|Second]]\n- [[B]]\n# H\n[[a]]");

        assert_eq!(session.categories.len(), 1);
        let pages = &session.categories[0];
        assert_eq!(pages.name, "Pages");
        assert_eq!(slugs(pages), vec!["a", "b"]);
        assert_eq!(pages.pages[0].name, "First");
    }

    #[test]
    fn test_flat_without_references_has_no_category() {
        let session = flat("# Title\nNothing here");

        assert!(session.categories.is_empty());
        assert_eq!(session.name, "Title");
    }

    #[test]
    fn test_session_name_falls_back_to_document_name() {
        assert_eq!(structured("## Only sub").name, "Doc");
    }

    #[test]
    fn test_structured_nests_second_level() {
        let session = structured(
            "# Session 1\n[[Intro]]\n## Places\n- [[Tavern]]\n## People\n- [[Mage]]\n# Session 2\n[[Dragon]]",
        );

        assert_eq!(session.name, "Session 1");
        assert_eq!(session.categories.len(), 2);
        let first = &session.categories[0];
        assert_eq!(first.name, "Session 1");
        assert_eq!(slugs(first), vec!["intro"]);
        assert_eq!(first.categories[0].name, "Places");
        assert_eq!(slugs(&first.categories[0]), vec!["tavern"]);
        assert_eq!(first.categories[1].name, "People");
        assert_eq!(session.categories[1].name, "Session 2");
        assert_eq!(slugs(&session.categories[1]), vec!["dragon"]);
    }

    #[test]
    fn test_structured_second_level_without_first_is_top_level() {
        let session = structured("## Places\n[[Tavern]]\n## People\n[[Mage]]");

        let names: Vec<&str> = session.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Places", "People"]);
    }

    #[test]
    fn test_structured_keyword_block_types() {
        let session = structured(
            "# Prep\n## Tables\n[[Loot]]\n## quotes\n[[Speech]]\n## Images\n[[Map]]\n## Other\n[[Plain]]",
        );

        let prep = &session.categories[0];
        let types: Vec<BTreeSet<BlockType>> = prep
            .categories
            .iter()
            .map(|c| c.pages[0].block_types.clone())
            .collect();
        assert_eq!(
            types,
            vec![
                BTreeSet::from([BlockType::Table]),
                BTreeSet::from([BlockType::Quote]),
                BTreeSet::from([BlockType::Image]),
                BTreeSet::new(),
            ]
        );
    }

    #[test]
    fn test_structured_enemies_subcategories() {
        let session = structured(
            "# Fight\n## Enemies\n[[Boss]]\n### Goblins\n[[Goblin Archer]]\n#### Elite\n[[Goblin King]]\n### Undead\n[[Zombie]]\n## Loot\n[[Gold]]",
        );

        let fight = &session.categories[0];
        let enemies = &fight.categories[0];
        assert_eq!(enemies.name, "Enemies");
        assert_eq!(slugs(enemies), vec!["boss"]);
        assert_eq!(enemies.categories[0].name, "Goblins");
        assert_eq!(slugs(&enemies.categories[0]), vec!["goblin-archer"]);
        assert_eq!(enemies.categories[0].categories[0].name, "Elite");
        assert_eq!(
            slugs(&enemies.categories[0].categories[0]),
            vec!["goblin-king"]
        );
        assert_eq!(enemies.categories[1].name, "Undead");
        assert_eq!(fight.categories[1].name, "Loot");
        assert_eq!(slugs(&fight.categories[1]), vec!["gold"]);
    }

    #[test]
    fn test_structured_third_level_outside_enemies_is_not_a_category() {
        let session = structured("# Act\n### Detail\n[[Clue]]");

        let act = &session.categories[0];
        assert!(act.categories.is_empty());
        assert_eq!(slugs(act), vec!["clue"]);
    }

    #[test]
    fn test_structured_ignore_headings_skip_section() {
        let session = structured(
            "# Act\n[[Kept]]\n## Recap\n[[Skipped]]\n### Detail\n[[Also Skipped]]\n## Places\n[[Tavern]]\n# session notes\n[[Gone]]\n# Next\n[[Here]]",
        );

        let names: Vec<&str> = session.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Act", "Next"]);
        let act = &session.categories[0];
        assert_eq!(slugs(act), vec!["kept"]);
        assert_eq!(act.categories.len(), 1);
        assert_eq!(slugs(&act.categories[0]), vec!["tavern"]);
        assert_eq!(slugs(&session.categories[1]), vec!["here"]);
    }

    #[test]
    fn test_structured_ignored_subheading_keeps_enclosing_category() {
        let session = structured("# Act\n[[A]]\n### Notes\n[[Hidden]]\n## Places\n[[B]]");

        let act = &session.categories[0];
        assert_eq!(slugs(act), vec!["a"]);
        assert_eq!(slugs(&act.categories[0]), vec!["b"]);
    }

    #[test]
    fn test_structured_custom_ignore_list() {
        let session = HeadingParser::new(HeadingMode::Structured)
            .with_ignore_headings(vec!["Secrets".to_owned()])
            .parse_text("Doc", "# Recap\n[[Shown]]\n# Secrets\n[[Hidden]]");

        assert_eq!(session.categories.len(), 1);
        assert_eq!(session.categories[0].name, "Recap");
    }

    #[test]
    fn test_structured_loose_references_go_to_pages() {
        let session = structured("[[Intro]]\n# Act\n[[Scene]]");

        assert_eq!(session.categories[0].name, "Pages");
        assert_eq!(slugs(&session.categories[0]), vec!["intro"]);
        assert_eq!(session.categories[1].name, "Act");
    }

    #[test]
    fn test_structured_skips_code_and_deduplicates() {
        let session = structured("# Act\n```\n[[Code Ref]]\n```\n[[A]] [[A|again]]\n## B\n[[a]]");

        let act = &session.categories[0];
        assert_eq!(slugs(act), vec!["a"]);
        assert_eq!(act.pages[0].name, "A");
        assert!(act.categories[0].pages.is_empty());
    }

    #[test]
    fn test_structured_keeps_empty_categories_in_memory() {
        let session = structured("# Empty\n## Also Empty");

        assert_eq!(session.categories.len(), 1);
        assert!(session.categories[0].is_empty());
        assert_eq!(session.categories[0].categories[0].name, "Also Empty");
    }

    #[test]
    fn test_parse_reads_entry() {
        let storage = MockStorage::new().with_file("Prep/Session 3.md", "[[Ogre]]");

        let session = HeadingParser::default()
            .parse(&storage, &DocumentRef::new("Prep/Session 3.md"))
            .unwrap();

        assert_eq!(session.name, "Session 3");
        assert_eq!(slugs(&session.categories[0]), vec!["ogre"]);
    }

    #[test]
    fn test_parse_unreadable_entry_is_an_error() {
        let storage = MockStorage::new().with_unreadable("Prep.md");

        let err = HeadingParser::default()
            .parse(&storage, &DocumentRef::new("Prep.md"))
            .unwrap_err();

        assert!(matches!(err, ParseError::ReadEntry { .. }));
    }
}
