//! Standalone page serialization (print and export).

use std::fmt::Write as _;

use crate::dom::{escape_attr, escape_text};

use super::Document;

/// Page stylesheet. Kept free of `<` and `&` so it can be embedded verbatim.
const STYLESHEET: &str = r"
:root { color-scheme: light dark; }
body { margin: 0; font: 16px/1.6 -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; }
.markdown-body { max-width: 900px; margin: 0 auto; padding: 32px; }
.markdown-body pre { padding: 16px; overflow: auto; border-radius: 6px; background: rgba(127, 127, 127, 0.12); }
.markdown-body code { font-family: ui-monospace, SFMono-Regular, Menlo, monospace; font-size: 85%; }
.markdown-body blockquote { margin: 0; padding: 0 1em; border-left: 4px solid rgba(127, 127, 127, 0.4); opacity: 0.85; }
.markdown-body table { border-collapse: collapse; }
.markdown-body th, .markdown-body td { padding: 6px 13px; border: 1px solid rgba(127, 127, 127, 0.35); }
.markdown-body img { max-width: 100%; }
.task-list-item { list-style: none; }

html.theme-light { color-scheme: light; }
html.theme-light body { background: #ffffff; color: #1f2328; }
html.theme-light a { color: #0969da; }
html.theme-dark { color-scheme: dark; }
html.theme-dark body { background: #0d1117; color: #e6edf3; }
html.theme-dark a { color: #4493f8; }
@media (prefers-color-scheme: dark) {
  html.theme-system body { background: #0d1117; color: #e6edf3; }
  html.theme-system a { color: #4493f8; }
}

@keyframes anchor-highlight-light {
  from { background-color: rgba(255, 208, 0, 0.5); }
  to { background-color: transparent; }
}
@keyframes anchor-highlight-dark {
  from { background-color: rgba(255, 208, 0, 0.3); }
  to { background-color: transparent; }
}
.anchor-highlight { animation: anchor-highlight-light 1.5s ease-out; }
html.theme-dark .anchor-highlight { animation-name: anchor-highlight-dark; }
@media (prefers-color-scheme: dark) {
  html.theme-system .anchor-highlight { animation-name: anchor-highlight-dark; }
}

.search-box { display: none; position: fixed; top: 8px; right: 16px; z-index: 10; padding: 6px 8px; border-radius: 6px; background: rgba(127, 127, 127, 0.2); }
.search-box.visible { display: flex; gap: 8px; align-items: center; }
.search-box .count { font-size: 12px; opacity: 0.7; min-width: 3em; }
mark.search-match { background: rgba(255, 208, 0, 0.4); color: inherit; }
mark.search-match-current { background: rgba(255, 140, 0, 0.8); }
@media print { .search-box { display: none; } }
";

impl Document {
    /// Serialize the page as a standalone HTML file.
    ///
    /// The current theme classes and `color-scheme` hint are carried over, and
    /// relative resources resolve against the base directory through a
    /// `<base>` element.
    pub fn page_html(&self) -> String {
        let dom = self.dom();
        let mut out = String::from("<!DOCTYPE html>\n<html");
        if let Some(html) = dom.element(self.html())
            && !html.classes().is_empty()
        {
            let _ = write!(out, " class=\"{}\"", escape_attr(&html.classes().join(" ")));
        }
        out.push_str("><head><meta charset=\"utf-8\">");
        out.push_str(&dom.inner_html(self.head()));
        if let Some(base) = self.base_href() {
            let _ = write!(out, "<base href=\"{}\">", escape_attr(&base));
        }
        let _ = write!(out, "<title>{}</title>", escape_text(&self.title()));
        out.push_str("<style>");
        out.push_str(STYLESHEET);
        out.push_str("</style></head>");
        out.push_str(&dom.outer_html(self.body()));
        out.push_str("</html>\n");
        out
    }

    /// First heading's text, or a generic title.
    pub fn title(&self) -> String {
        let dom = self.dom();
        dom.descendants(self.content())
            .find(|id| {
                dom.tag(*id)
                    .is_some_and(|tag| matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6"))
            })
            .map(|id| dom.text_content(id))
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| "Markdown".to_string())
    }

    fn base_href(&self) -> Option<String> {
        let base = self.base_dir()?;
        let mut path = base.to_string_lossy().replace('\\', "/").replace(' ', "%20");
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        if !path.ends_with('/') {
            path.push('/');
        }
        Some(format!("file://{path}"))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_page_html_is_standalone() {
        let doc = Document::from_markdown("# Title\n\nBody", None);
        let page = doc.page_html();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Title</title>"));
        assert!(page.contains("@keyframes anchor-highlight-light"));
        assert!(page.contains("<div id=\"content\" class=\"markdown-body\">"));
        assert!(page.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_page_html_carries_base_href() {
        let doc = Document::from_markdown("x", Some(PathBuf::from("/my notes")));
        assert!(
            doc.page_html()
                .contains("<base href=\"file:///my%20notes/\">")
        );
    }

    #[test]
    fn test_title_falls_back_without_headings() {
        let doc = Document::from_markdown("plain", None);
        assert_eq!(doc.title(), "Markdown");
    }

    #[test]
    fn test_stylesheet_is_embeddable() {
        assert!(!STYLESHEET.contains('<'));
        assert!(!STYLESHEET.contains('&'));
    }
}
