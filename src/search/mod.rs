//! Incremental in-page search.
//!
//! Every query change rebuilds the match markup from scratch: existing
//! `mark.search-match` elements are unwrapped back into plain text, then each
//! text node under the content root is split around case-insensitive literal
//! occurrences of the query. The match list is in document order and one
//! match is "current" at a time.
//!
//! The engine mirrors its state into the page skeleton: the query into
//! `input#searchInput`, the counter into `span#searchCount` and visibility as
//! the `visible` class on `div#searchBox`. Scrolling is left to the caller:
//! operations that move the current match return the node to reveal.

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::document::Document;
use crate::dom::NodeId;
use crate::input::{Key, KeyInput};

/// Class on every match marker.
pub const MATCH_CLASS: &str = "search-match";
/// Extra class on the current match.
pub const CURRENT_CLASS: &str = "search-match-current";
/// Class that shows the search box.
pub const VISIBLE_CLASS: &str = "visible";

/// Lifecycle of the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    /// No session; no highlights.
    #[default]
    Closed,
    /// Box shown, input focused.
    Open,
    /// Box hidden, highlights kept, document focused.
    Hidden,
}

/// Result of routing a key through the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    /// Not a search key; the default action proceeds.
    Ignored,
    /// Consumed. `reveal` is the match to scroll into view, if any.
    Handled { reveal: Option<NodeId> },
}

impl SearchKey {
    pub const fn prevents_default(self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

/// Build the matcher for `query`: the text is escaped so it only ever
/// matches literally.
pub fn literal_matcher(query: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
}

/// Search session over a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    state: SearchState,
    query: String,
    select_all: bool,
    matches: Vec<NodeId>,
    current: Option<usize>,
    count_text: String,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> SearchState {
        self.state
    }

    /// True while keystrokes go to the search input.
    pub fn input_focused(&self) -> bool {
        self.state == SearchState::Open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[NodeId] {
        &self.matches
    }

    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_match(&self) -> Option<NodeId> {
        self.current.and_then(|index| self.matches.get(index).copied())
    }

    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    /// `"i/n"`, `"0/0"` for a query with no matches, or empty.
    pub fn count_text(&self) -> &str {
        &self.count_text
    }

    /// Show the box, focus the input and select its text.
    pub fn open(&mut self, doc: &mut Document) {
        self.state = SearchState::Open;
        self.select_all = !self.query.is_empty();
        let search_box = doc.search_box();
        doc.dom_mut().add_class(search_box, VISIBLE_CLASS);
        debug!("search opened");
    }

    /// Hide the box but keep the highlights.
    pub fn hide(&mut self, doc: &mut Document) {
        if self.state == SearchState::Closed {
            return;
        }
        self.state = SearchState::Hidden;
        self.select_all = false;
        let search_box = doc.search_box();
        doc.dom_mut().remove_class(search_box, VISIBLE_CLASS);
    }

    /// End the session: clear highlights, count and query.
    pub fn close(&mut self, doc: &mut Document) {
        self.state = SearchState::Closed;
        self.select_all = false;
        clear_highlights(doc);
        self.matches.clear();
        self.current = None;
        self.query.clear();
        self.count_text.clear();
        let search_box = doc.search_box();
        doc.dom_mut().remove_class(search_box, VISIBLE_CLASS);
        self.mirror(doc);
        debug!("search closed");
    }

    /// Forget the session without touching the page (the page was replaced).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rebuild highlights for `query`. Returns the first match to reveal.
    ///
    /// # Example
    ///
    /// ```
    /// use marksight::document::Document;
    /// use marksight::search::SearchEngine;
    ///
    /// let mut doc = Document::from_markdown("a.b and axb", None);
    /// let mut search = SearchEngine::new();
    /// search.on_query_change(&mut doc, "A.B");
    /// assert_eq!(search.matches().len(), 1);
    /// assert_eq!(search.count_text(), "1/1");
    /// ```
    pub fn on_query_change(&mut self, doc: &mut Document, query: &str) -> Option<NodeId> {
        query.clone_into(&mut self.query);
        clear_highlights(doc);
        self.matches.clear();
        self.current = None;

        if query.is_empty() {
            self.count_text.clear();
            self.mirror(doc);
            return None;
        }

        match literal_matcher(query) {
            Ok(matcher) => self.matches = wrap_matches(doc, &matcher),
            Err(err) => warn!(%err, "search pattern rejected"),
        }
        debug!(query, matches = self.matches.len(), "search rebuilt");

        if self.matches.is_empty() {
            self.update_count();
            self.mirror(doc);
            return None;
        }
        self.set_current(doc, 0);
        self.mirror(doc);
        self.current_match()
    }

    /// Advance to the next match, wrapping around.
    pub fn next(&mut self, doc: &mut Document) -> Option<NodeId> {
        self.step(doc, 1)
    }

    /// Go back to the previous match, wrapping around.
    pub fn prev(&mut self, doc: &mut Document) -> Option<NodeId> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        self.step(doc, len - 1)
    }

    fn step(&mut self, doc: &mut Document, forward: usize) -> Option<NodeId> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let index = (self.current.unwrap_or(0) + forward) % len;
        self.set_current(doc, index);
        self.mirror(doc);
        self.current_match()
    }

    fn set_current(&mut self, doc: &mut Document, index: usize) {
        let dom = doc.dom_mut();
        if let Some(previous) = self.current_match() {
            dom.remove_class(previous, CURRENT_CLASS);
        }
        self.current = Some(index);
        if let Some(node) = self.current_match() {
            dom.add_class(node, CURRENT_CLASS);
        }
        self.update_count();
    }

    fn update_count(&mut self) {
        self.count_text = match self.current {
            Some(index) if !self.matches.is_empty() => {
                format!("{}/{}", index + 1, self.matches.len())
            }
            _ if self.query.is_empty() => String::new(),
            _ => "0/0".to_string(),
        };
    }

    fn mirror(&self, doc: &mut Document) {
        let input = doc.search_input();
        let count = doc.search_count();
        let dom = doc.dom_mut();
        dom.set_attr(input, "value", self.query.clone());
        dom.set_text_content(count, &self.count_text);
    }

    /// Keys while the search input has focus.
    pub fn handle_input_key(&mut self, doc: &mut Document, key: &KeyInput) -> SearchKey {
        if !self.input_focused() {
            return SearchKey::Ignored;
        }
        match key.key {
            Key::Escape => {
                self.close(doc);
                SearchKey::Handled { reveal: None }
            }
            Key::Enter => {
                let reveal = if key.shift {
                    self.prev(doc)
                } else {
                    self.next(doc)
                };
                self.hide(doc);
                SearchKey::Handled { reveal }
            }
            Key::Backspace => {
                let mut query = if self.select_all {
                    String::new()
                } else {
                    self.query.clone()
                };
                query.pop();
                self.select_all = false;
                SearchKey::Handled {
                    reveal: self.on_query_change(doc, &query),
                }
            }
            Key::Char(c) if key.is_unmodified() => {
                let mut query = if self.select_all {
                    String::new()
                } else {
                    self.query.clone()
                };
                query.push(c);
                self.select_all = false;
                SearchKey::Handled {
                    reveal: self.on_query_change(doc, &query),
                }
            }
            // focused text input swallows everything else
            _ => SearchKey::Handled { reveal: None },
        }
    }

    /// Keys while the document has focus.
    pub fn handle_global_key(&mut self, doc: &mut Document, key: &KeyInput) -> SearchKey {
        if self.input_focused() || !key.is_unmodified() {
            return SearchKey::Ignored;
        }
        match key.key {
            Key::Char('/') => {
                self.open(doc);
                SearchKey::Handled { reveal: None }
            }
            Key::Char('n') if self.has_matches() => SearchKey::Handled {
                reveal: self.next(doc),
            },
            Key::Char('N') if self.has_matches() => SearchKey::Handled {
                reveal: self.prev(doc),
            },
            _ => SearchKey::Ignored,
        }
    }
}

/// Unwrap every match marker back into plain text.
fn clear_highlights(doc: &mut Document) {
    let content = doc.content();
    let dom = doc.dom_mut();
    for mark in dom.elements_with_class(content, MATCH_CLASS) {
        let Some(parent) = dom.parent(mark) else {
            continue;
        };
        let text = dom.text_content(mark);
        let replacement = dom.create_text(text);
        dom.replace_child(parent, replacement, mark);
        dom.release(mark);
        dom.normalize(parent);
    }
}

/// Split every text node under the content root around matches. Returns the
/// new markers in document order.
fn wrap_matches(doc: &mut Document, matcher: &Regex) -> Vec<NodeId> {
    let content = doc.content();
    let dom = doc.dom_mut();
    let mut marks = Vec::new();
    for node in dom.text_nodes(content) {
        let Some(parent) = dom.parent(node) else {
            continue;
        };
        let Some(text) = dom.text(node).map(ToOwned::to_owned) else {
            continue;
        };
        let mut last = 0;
        let mut found = false;
        for hit in matcher.find_iter(&text) {
            if hit.as_str().is_empty() {
                continue;
            }
            found = true;
            if hit.start() > last {
                let before = dom.create_text(&text[last..hit.start()]);
                dom.insert_before(parent, before, node);
            }
            let mark = dom.create_element("mark");
            dom.add_class(mark, MATCH_CLASS);
            let inner = dom.create_text(hit.as_str());
            dom.append_child(mark, inner);
            dom.insert_before(parent, mark, node);
            marks.push(mark);
            last = hit.end();
        }
        if !found {
            continue;
        }
        if last < text.len() {
            let after = dom.create_text(&text[last..]);
            dom.insert_before(parent, after, node);
        }
        dom.release(node);
    }
    marks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source: &str) -> Document {
        Document::from_markdown(source, None)
    }

    fn count_dom_text(doc: &Document) -> String {
        doc.dom().text_content(doc.search_count())
    }

    fn marks(doc: &Document) -> Vec<NodeId> {
        doc.dom().elements_with_class(doc.content(), MATCH_CLASS)
    }

    #[test]
    fn test_query_is_matched_literally() {
        let mut doc = doc("a.b and axb");
        let mut search = SearchEngine::new();
        search.on_query_change(&mut doc, "a.b");
        assert_eq!(search.matches().len(), 1);
        let text = doc.dom().text_content(search.matches()[0]);
        assert_eq!(text, "a.b");
    }

    #[test]
    fn test_regex_metacharacters_never_error() {
        let mut doc = doc("cost is $5 (approx) [x] a+b? c|d ^e \\f {g}");
        let mut search = SearchEngine::new();
        for query in ["$5", "(approx)", "[x]", "a+b?", "c|d", "^e", "\\f", "{g}", ".*"] {
            search.on_query_change(&mut doc, query);
            let expected = usize::from(query != ".*");
            assert_eq!(search.matches().len(), expected, "query {query:?}");
        }
    }

    #[test]
    fn test_matching_is_case_insensitive_and_preserves_text() {
        let mut doc = doc("Rust rust RUST");
        let mut search = SearchEngine::new();
        let first = search.on_query_change(&mut doc, "rust");
        assert_eq!(search.matches().len(), 3);
        assert_eq!(first, Some(search.matches()[0]));
        assert_eq!(search.current_index(), Some(0));
        assert_eq!(doc.dom().text_content(doc.content()), "Rust rust RUST");
        assert!(doc.dom().has_class(search.matches()[0], CURRENT_CLASS));
        assert_eq!(count_dom_text(&doc), "1/3");
    }

    #[test]
    fn test_repeated_rebuilds_reuse_arena_slots() {
        let mut doc = doc(&"needle hay ".repeat(200));
        let mut search = SearchEngine::new();
        let queries = ["n", "ne", "nee", "need", "needl", "needle", ""];

        for query in queries {
            search.on_query_change(&mut doc, query);
        }
        let settled = doc.dom().allocated();
        for _ in 0..4 {
            for query in queries {
                search.on_query_change(&mut doc, query);
            }
        }
        assert_eq!(doc.dom().allocated(), settled);

        search.on_query_change(&mut doc, "needle");
        let searching = doc.dom().allocated();
        for _ in 0..1000 {
            search.next(&mut doc);
        }
        assert_eq!(doc.dom().allocated(), searching);
        assert_eq!(count_dom_text(&doc), "1/200");
    }

    #[test]
    fn test_count_text_states() {
        let mut doc = doc("alpha");
        let mut search = SearchEngine::new();
        search.on_query_change(&mut doc, "zzz");
        assert_eq!(search.count_text(), "0/0");
        assert_eq!(count_dom_text(&doc), "0/0");
        search.on_query_change(&mut doc, "");
        assert_eq!(search.count_text(), "");
        assert!(search.matches().is_empty());
        assert_eq!(count_dom_text(&doc), "");
    }

    #[test]
    fn test_rebuild_removes_previous_marks() {
        let mut doc = doc("one two one");
        let mut search = SearchEngine::new();
        search.on_query_change(&mut doc, "one");
        search.on_query_change(&mut doc, "two");
        assert_eq!(marks(&doc).len(), 1);
        search.on_query_change(&mut doc, "");
        assert!(marks(&doc).is_empty());
        assert_eq!(doc.dom().text_nodes(doc.content()).len(), 1);
    }

    #[test]
    fn test_next_and_prev_wrap() {
        let mut doc = doc("x x x");
        let mut search = SearchEngine::new();
        search.on_query_change(&mut doc, "x");
        search.prev(&mut doc);
        assert_eq!(search.current_index(), Some(2));
        assert_eq!(search.count_text(), "3/3");
        search.next(&mut doc);
        assert_eq!(search.current_index(), Some(0));
        let current: Vec<_> = doc
            .dom()
            .elements_with_class(doc.content(), CURRENT_CLASS);
        assert_eq!(current, vec![search.matches()[0]]);
    }

    #[test]
    fn test_next_without_matches_is_noop() {
        let mut doc = doc("text");
        let mut search = SearchEngine::new();
        assert_eq!(search.next(&mut doc), None);
        assert_eq!(search.prev(&mut doc), None);
        assert_eq!(search.current_index(), None);
    }

    #[test]
    fn test_matches_inside_formatting_stay_in_document_order() {
        let mut doc = doc("# Find\n\nsome **find** and `find`\n\n- find");
        let mut search = SearchEngine::new();
        search.on_query_change(&mut doc, "find");
        let tags: Vec<_> = search
            .matches()
            .iter()
            .map(|m| {
                let parent = doc.dom().parent(*m).unwrap();
                doc.dom().tag(parent).unwrap().to_string()
            })
            .collect();
        assert_eq!(tags, vec!["h1", "strong", "code", "li"]);
    }

    #[test]
    fn test_search_ui_text_is_not_searched() {
        let mut doc = doc("body");
        let mut search = SearchEngine::new();
        search.on_query_change(&mut doc, "0/0");
        assert!(search.matches().is_empty());
        search.on_query_change(&mut doc, "Search");
        assert!(search.matches().is_empty());
    }

    #[test]
    fn test_state_machine_and_visibility() {
        let mut doc = doc("hello");
        let search_box = doc.search_box();
        let mut search = SearchEngine::new();
        assert_eq!(search.state(), SearchState::Closed);

        search.open(&mut doc);
        assert!(search.input_focused());
        assert!(doc.dom().has_class(search_box, VISIBLE_CLASS));

        search.on_query_change(&mut doc, "hell");
        search.hide(&mut doc);
        assert_eq!(search.state(), SearchState::Hidden);
        assert!(!doc.dom().has_class(search_box, VISIBLE_CLASS));
        assert_eq!(marks(&doc).len(), 1, "hide keeps highlights");

        search.close(&mut doc);
        assert_eq!(search.state(), SearchState::Closed);
        assert!(marks(&doc).is_empty());
        assert_eq!(search.query(), "");
        assert_eq!(doc.dom().attr(doc.search_input(), "value"), Some(""));
    }

    #[test]
    fn test_input_keys_edit_query_and_mirror_value() {
        let mut doc = doc("apple banana");
        let mut search = SearchEngine::new();
        search.open(&mut doc);
        for c in "ban".chars() {
            search.handle_input_key(&mut doc, &KeyInput::char(c));
        }
        assert_eq!(search.query(), "ban");
        assert_eq!(doc.dom().attr(doc.search_input(), "value"), Some("ban"));
        assert_eq!(search.matches().len(), 1);

        search.handle_input_key(&mut doc, &KeyInput::plain(Key::Backspace));
        assert_eq!(search.query(), "ba");
    }

    #[test]
    fn test_reopen_selects_query_so_typing_replaces_it() {
        let mut doc = doc("apple banana");
        let mut search = SearchEngine::new();
        search.open(&mut doc);
        search.on_query_change(&mut doc, "apple");
        search.hide(&mut doc);
        search.open(&mut doc);
        search.handle_input_key(&mut doc, &KeyInput::char('b'));
        assert_eq!(search.query(), "b");
    }

    #[test]
    fn test_enter_advances_then_hides() {
        let mut doc = doc("x x");
        let mut search = SearchEngine::new();
        search.open(&mut doc);
        search.handle_input_key(&mut doc, &KeyInput::char('x'));
        let outcome = search.handle_input_key(&mut doc, &KeyInput::plain(Key::Enter));
        assert_eq!(
            outcome,
            SearchKey::Handled {
                reveal: Some(search.matches()[1])
            }
        );
        assert_eq!(search.state(), SearchState::Hidden);

        search.open(&mut doc);
        let shift_enter = KeyInput::plain(Key::Enter).with_shift();
        search.handle_input_key(&mut doc, &shift_enter);
        assert_eq!(search.current_index(), Some(0));
    }

    #[test]
    fn test_escape_closes() {
        let mut doc = doc("x");
        let mut search = SearchEngine::new();
        search.open(&mut doc);
        search.handle_input_key(&mut doc, &KeyInput::char('x'));
        search.handle_input_key(&mut doc, &KeyInput::plain(Key::Escape));
        assert_eq!(search.state(), SearchState::Closed);
        assert!(!search.has_matches());
    }

    #[test]
    fn test_global_keys() {
        let mut doc = doc("x x");
        let mut search = SearchEngine::new();
        assert_eq!(
            search.handle_global_key(&mut doc, &KeyInput::char('n')),
            SearchKey::Ignored,
            "n without matches is not consumed"
        );
        assert!(
            search
                .handle_global_key(&mut doc, &KeyInput::char('/'))
                .prevents_default()
        );
        assert_eq!(
            search.handle_global_key(&mut doc, &KeyInput::char('/')),
            SearchKey::Ignored,
            "global keys are inactive while the input has focus"
        );
        search.handle_input_key(&mut doc, &KeyInput::char('x'));
        search.hide(&mut doc);
        search.handle_global_key(&mut doc, &KeyInput::char('N').with_shift());
        assert_eq!(search.current_index(), Some(1));
        assert_eq!(
            search.handle_global_key(&mut doc, &KeyInput::ctrl('n')),
            SearchKey::Ignored
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn match_count_equals_literal_occurrences(
                text in "[a-cA-C. ]{1,60}",
                query in "[a-c.]{1,3}",
            ) {
                let mut doc = Document::from_markdown(&format!("x{text}"), None);
                let haystack = doc.dom().text_content(doc.content()).to_lowercase();
                let expected = haystack.matches(query.as_str()).count();

                let mut search = SearchEngine::new();
                search.on_query_change(&mut doc, &query);
                prop_assert_eq!(search.matches().len(), expected);
                if expected > 0 {
                    prop_assert_eq!(search.current_index(), Some(0));
                }
            }

            #[test]
            fn next_cycles_back_to_start(
                words in proptest::collection::vec("[ab]{1,4}", 1..20),
                backwards in any::<bool>(),
            ) {
                let mut doc = Document::from_markdown(&words.join(" "), None);
                let mut search = SearchEngine::new();
                search.on_query_change(&mut doc, "a");
                let start = search.current_index();
                for _ in 0..search.matches().len() {
                    if backwards {
                        search.prev(&mut doc);
                    } else {
                        search.next(&mut doc);
                    }
                }
                prop_assert_eq!(search.current_index(), start);
            }
        }
    }
}
