//! Rendered Markdown documents.
//!
//! A [`Document`] is the page the interaction layer works on: a small DOM
//! holding the page skeleton (`html > head > meta#colorSchemeTag`,
//! `body > div#searchBox`, `div#content.markdown-body`) with the rendered
//! Markdown inside the content root.
//!
//! Rendering is delegated to comrak; this module only turns comrak's AST into
//! DOM nodes, assigns heading ids and serializes standalone pages.

mod page;
mod render;

use std::path::{Path, PathBuf};

use crate::dom::{Dom, NodeId};

pub use render::{Slugger, slugify};

/// Id of the `meta` element carrying the `color-scheme` hint.
pub const COLOR_SCHEME_META_ID: &str = "colorSchemeTag";
/// Id of the search overlay container.
pub const SEARCH_BOX_ID: &str = "searchBox";
/// Id of the search input.
pub const SEARCH_INPUT_ID: &str = "searchInput";
/// Id of the match counter.
pub const SEARCH_COUNT_ID: &str = "searchCount";
/// Id of the rendered content root.
pub const CONTENT_ID: &str = "content";

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    base_dir: Option<PathBuf>,
    dom: Dom,
    head: NodeId,
    body: NodeId,
    color_scheme_meta: NodeId,
    search_box: NodeId,
    search_input: NodeId,
    search_count: NodeId,
    content: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::from_markdown("", None)
    }
}

impl Document {
    /// Render `source` into a fresh page.
    ///
    /// `base_dir` is the directory relative links and images resolve against.
    ///
    /// # Example
    ///
    /// ```
    /// use marksight::document::Document;
    ///
    /// let doc = Document::from_markdown("# Hello\n\nWorld", None);
    /// assert_eq!(doc.content_html(), "<h1 id=\"hello\">Hello</h1><p>World</p>");
    /// ```
    pub fn from_markdown(source: &str, base_dir: Option<PathBuf>) -> Self {
        let mut dom = Dom::new("html");
        let root = dom.root();

        let head = dom.create_element("head");
        dom.append_child(root, head);
        let color_scheme_meta = dom.create_element("meta");
        dom.set_attr(color_scheme_meta, "id", COLOR_SCHEME_META_ID);
        dom.set_attr(color_scheme_meta, "name", "color-scheme");
        dom.set_attr(color_scheme_meta, "content", "light dark");
        dom.append_child(head, color_scheme_meta);

        let body = dom.create_element("body");
        dom.append_child(root, body);

        let search_box = dom.create_element("div");
        dom.set_attr(search_box, "id", SEARCH_BOX_ID);
        dom.add_class(search_box, "search-box");
        dom.append_child(body, search_box);

        let search_input = dom.create_element("input");
        dom.set_attr(search_input, "type", "text");
        dom.set_attr(search_input, "id", SEARCH_INPUT_ID);
        dom.set_attr(search_input, "placeholder", "Search...");
        dom.set_attr(search_input, "value", "");
        dom.append_child(search_box, search_input);

        let search_count = dom.create_element("span");
        dom.set_attr(search_count, "id", SEARCH_COUNT_ID);
        dom.add_class(search_count, "count");
        dom.append_child(search_box, search_count);

        let content = dom.create_element("div");
        dom.set_attr(content, "id", CONTENT_ID);
        dom.add_class(content, "markdown-body");
        dom.append_child(body, content);

        render::render_into(&mut dom, content, source);

        Self {
            source: source.to_string(),
            base_dir,
            dom,
            head,
            body,
            color_scheme_meta,
            search_box,
            search_input,
            search_count,
            content,
        }
    }

    /// The Markdown text this page was rendered from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub const fn dom(&self) -> &Dom {
        &self.dom
    }

    pub const fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    /// The `html` element.
    pub const fn html(&self) -> NodeId {
        self.dom.root()
    }

    pub const fn head(&self) -> NodeId {
        self.head
    }

    pub const fn body(&self) -> NodeId {
        self.body
    }

    pub const fn color_scheme_meta(&self) -> NodeId {
        self.color_scheme_meta
    }

    pub const fn search_box(&self) -> NodeId {
        self.search_box
    }

    pub const fn search_input(&self) -> NodeId {
        self.search_input
    }

    pub const fn search_count(&self) -> NodeId {
        self.search_count
    }

    /// The `div#content.markdown-body` root that holds rendered Markdown.
    pub const fn content(&self) -> NodeId {
        self.content
    }

    /// Serialized rendered Markdown (the content root's inner HTML).
    pub fn content_html(&self) -> String {
        self.dom.inner_html(self.content)
    }

    /// Resolve a relative link or image reference against the base directory.
    ///
    /// Returns `None` for URLs with a scheme, bare fragments, or when the page
    /// has no base directory.
    pub fn resolve_resource(&self, href: &str) -> Option<PathBuf> {
        if href.is_empty() || href.starts_with('#') || has_scheme(href) {
            return None;
        }
        let path = href.split(['#', '?']).next().unwrap_or(href);
        if path.is_empty() {
            return None;
        }
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            return Some(candidate.to_path_buf());
        }
        self.base_dir.as_ref().map(|base| base.join(candidate))
    }
}

/// True when `href` starts with a URL scheme such as `https:` or `mailto:`.
pub fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        // a single letter is a Windows drive, not a scheme
        && scheme.len() > 1
}
