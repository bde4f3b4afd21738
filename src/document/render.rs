//! comrak AST to DOM conversion.

use std::collections::HashSet;

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};

use crate::dom::{Dom, NodeId};

/// Renderer options: raw HTML is not passed through, GFM extensions are on.
fn create_options() -> Options {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.superscript = true;
    options.extension.subscript = true;

    options
}

/// Render `source` and append the result to `parent`.
pub(super) fn render_into(dom: &mut Dom, parent: NodeId, source: &str) {
    let arena = Arena::new();
    let options = create_options();
    let root = parse_document(&arena, source, &options);

    let mut builder = Builder {
        dom,
        source,
        content: parent,
        slugger: Slugger::default(),
        footnotes: None,
    };
    builder.build(root, parent);
    // one text node per contiguous run, as a browser parser would produce
    builder.dom.normalize(parent);
}

struct Builder<'d> {
    dom: &'d mut Dom,
    source: &'d str,
    content: NodeId,
    slugger: Slugger,
    footnotes: Option<NodeId>,
}

impl Builder<'_> {
    fn children<'a>(&mut self, node: &'a AstNode<'a>, parent: NodeId) {
        for child in node.children() {
            self.build(child, parent);
        }
    }

    fn element(&mut self, tag: &str, parent: NodeId) -> NodeId {
        let el = self.dom.create_element(tag);
        self.dom.append_child(parent, el);
        el
    }

    fn text(&mut self, text: &str, parent: NodeId) {
        let node = self.dom.create_text(text);
        self.dom.append_child(parent, node);
    }

    fn build<'a>(&mut self, node: &'a AstNode<'a>, parent: NodeId) {
        match &node.data.borrow().value {
            NodeValue::Document => self.children(node, parent),
            NodeValue::Heading(heading) => {
                let el = self.element(&format!("h{}", heading.level), parent);
                self.children(node, el);
                let slug = self.slugger.unique(&self.dom.text_content(el));
                self.dom.set_attr(el, "id", slug);
            }
            NodeValue::Paragraph => {
                if in_tight_list(node) {
                    self.children(node, parent);
                } else {
                    let el = self.element("p", parent);
                    self.children(node, el);
                }
            }
            NodeValue::CodeBlock(code_block) => {
                let pre = self.element("pre", parent);
                let code = self.element("code", pre);
                if let Some(lang) = code_block.info.split_whitespace().next() {
                    self.dom.add_class(code, &format!("language-{lang}"));
                }
                self.text(&code_block.literal, code);
            }
            NodeValue::HtmlBlock(html) => {
                let el = self.element("p", parent);
                self.text(html.literal.trim_end(), el);
            }
            NodeValue::List(list) => {
                let tag = match list.list_type {
                    ListType::Bullet => "ul",
                    ListType::Ordered => "ol",
                };
                let el = self.element(tag, parent);
                if list.list_type == ListType::Ordered && list.start != 1 {
                    self.dom.set_attr(el, "start", list.start.to_string());
                }
                self.children(node, el);
            }
            NodeValue::Item(_) => {
                let el = self.element("li", parent);
                self.children(node, el);
            }
            NodeValue::TaskItem(symbol) => {
                let el = self.element("li", parent);
                self.dom.add_class(el, "task-list-item");
                let checkbox = self.element("input", el);
                self.dom.set_attr(checkbox, "type", "checkbox");
                self.dom.set_attr(checkbox, "disabled", "");
                if symbol.is_some() {
                    self.dom.set_attr(checkbox, "checked", "");
                }
                self.text(" ", el);
                self.children(node, el);
            }
            NodeValue::BlockQuote => {
                let el = self.element("blockquote", parent);
                self.children(node, el);
            }
            NodeValue::ThematicBreak => {
                self.element("hr", parent);
            }
            NodeValue::Table(table) => {
                let alignments = table.alignments.clone();
                self.table(node, parent, &alignments);
            }
            NodeValue::FootnoteDefinition(def) => {
                let list = self.footnote_list();
                let item = self.element("li", list);
                self.dom.set_attr(item, "id", format!("fn-{}", def.name));
                self.children(node, item);
            }
            NodeValue::FootnoteReference(reference) => {
                let sup = self.element("sup", parent);
                self.dom.add_class(sup, "footnote-ref");
                let link = self.element("a", sup);
                self.dom
                    .set_attr(link, "href", format!("#fn-{}", reference.name));
                self.dom.set_attr(link, "id", format!("fnref-{}", reference.name));
                self.text(&format!("[{}]", reference.name), link);
            }
            NodeValue::Text(text) => self.text(text, parent),
            NodeValue::Code(code) => {
                let el = self.element("code", parent);
                self.text(&code.literal, el);
            }
            NodeValue::HtmlInline(html) => self.text(html, parent),
            NodeValue::Emph => {
                let el = self.element("em", parent);
                self.children(node, el);
            }
            NodeValue::Strong => {
                let el = self.element("strong", parent);
                self.children(node, el);
            }
            NodeValue::Strikethrough => {
                let el = self.element("s", parent);
                self.children(node, el);
            }
            NodeValue::Superscript => {
                let el = self.element("sup", parent);
                self.children(node, el);
            }
            NodeValue::Subscript => {
                let el = self.element("sub", parent);
                self.children(node, el);
            }
            NodeValue::Link(link) if self.is_schemeless_autolink(&link.url, node) => {
                self.children(node, parent);
            }
            NodeValue::Link(link) => {
                let el = self.element("a", parent);
                self.dom.set_attr(el, "href", link.url.clone());
                if !link.title.is_empty() {
                    self.dom.set_attr(el, "title", link.title.clone());
                }
                self.children(node, el);
            }
            NodeValue::Image(link) => {
                let el = self.element("img", parent);
                self.dom.set_attr(el, "src", link.url.clone());
                self.dom.set_attr(el, "alt", plain_text(node));
                if !link.title.is_empty() {
                    self.dom.set_attr(el, "title", link.title.clone());
                }
            }
            NodeValue::SoftBreak => self.text("\n", parent),
            NodeValue::LineBreak => {
                self.element("br", parent);
            }
            _ => self.children(node, parent),
        }
    }

    /// A `www.` host or bare email the autolinker picked up without an
    /// explicit scheme. Only `http://`-style URLs and `<...>` autolinks link.
    fn is_schemeless_autolink<'a>(&self, url: &str, node: &'a AstNode<'a>) -> bool {
        let text = plain_text(node);
        let implied = url
            .strip_prefix("http://")
            .is_some_and(|rest| rest == text && text.starts_with("www."))
            || url.strip_prefix("mailto:").is_some_and(|rest| rest == text);
        implied && !self.source.contains(&format!("<{text}>"))
    }

    fn table<'a>(&mut self, node: &'a AstNode<'a>, parent: NodeId, alignments: &[TableAlignment]) {
        let table = self.element("table", parent);
        let mut body = None;
        for row in node.children() {
            let is_header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
            let section = if is_header {
                self.element("thead", table)
            } else if let Some(body) = body {
                body
            } else {
                let created = self.element("tbody", table);
                body = Some(created);
                created
            };
            let tr = self.element("tr", section);
            for (index, cell) in row.children().enumerate() {
                let cell_el = self.element(if is_header { "th" } else { "td" }, tr);
                let align = match alignments.get(index) {
                    Some(TableAlignment::Left) => Some("left"),
                    Some(TableAlignment::Center) => Some("center"),
                    Some(TableAlignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    self.dom
                        .set_attr(cell_el, "style", format!("text-align:{align}"));
                }
                self.children(cell, cell_el);
            }
        }
    }

    fn footnote_list(&mut self) -> NodeId {
        if let Some(list) = self.footnotes {
            return list;
        }
        let section = self.element("section", self.content);
        self.dom.add_class(section, "footnotes");
        self.element("hr", section);
        let list = self.element("ol", section);
        self.footnotes = Some(list);
        list
    }
}

fn in_tight_list<'a>(node: &'a AstNode<'a>) -> bool {
    let Some(item) = node.parent() else {
        return false;
    };
    if !matches!(
        item.data.borrow().value,
        NodeValue::Item(_) | NodeValue::TaskItem(_)
    ) {
        return false;
    }
    item.parent().is_some_and(|list| {
        matches!(&list.data.borrow().value, NodeValue::List(list) if list.tight)
    })
}

fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for child in node.descendants().skip(1) {
        match &child.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            _ => {}
        }
    }
    out
}

/// GitHub-style heading slug.
///
/// Lowercases, trims, turns whitespace runs into `-`, drops everything that
/// is not an ASCII word character or `-`, then collapses repeated `-`.
///
/// # Example
///
/// ```
/// use marksight::document::slugify;
///
/// assert_eq!(slugify("  Hello, World!  "), "hello-world");
/// assert_eq!(slugify("a -- b"), "a-b");
/// ```
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut dashed = String::with_capacity(lowered.len());
    let mut in_space = false;
    for ch in lowered.trim().chars() {
        if ch.is_whitespace() {
            if !in_space {
                dashed.push('-');
            }
            in_space = true;
        } else {
            in_space = false;
            dashed.push(ch);
        }
    }

    let mut slug = String::with_capacity(dashed.len());
    for ch in dashed.chars() {
        if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
            continue;
        }
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }
    slug
}

/// Hands out unique slugs for one document.
///
/// The first occurrence keeps the bare slug; repeats get `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashSet<String>,
}

impl Slugger {
    pub fn unique(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        let mut index = 1;
        while self.seen.contains(&candidate) {
            candidate = format!("{base}-{index}");
            index += 1;
        }
        self.seen.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn html(source: &str) -> String {
        Document::from_markdown(source, None).content_html()
    }

    #[test]
    fn test_slugify_matches_github_rules() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("What's new?"), "whats-new");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
        assert_eq!(slugify("Ünïcode"), "ncode");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn test_slugger_suffixes_duplicates_from_one() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.unique("Intro"), "intro");
        assert_eq!(slugger.unique("Intro"), "intro-1");
        assert_eq!(slugger.unique("Intro"), "intro-2");
        assert_eq!(slugger.unique("Other"), "other");
    }

    #[test]
    fn test_heading_ids_are_unique() {
        let out = html("# Setup\n\n## Setup\n");
        assert!(out.contains("<h1 id=\"setup\">"), "got {out}");
        assert!(out.contains("<h2 id=\"setup-1\">"), "got {out}");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let out = html("<div>hi</div>\n\ntext <b>bold</b>");
        assert!(!out.contains("<div>"), "raw html leaked: {out}");
        assert!(out.contains("&lt;div&gt;hi&lt;/div&gt;"), "got {out}");
        assert!(out.contains("&lt;b&gt;bold&lt;/b&gt;"), "got {out}");
    }

    #[test]
    fn test_task_list_items_get_disabled_checkboxes() {
        let out = html("- [x] done\n- [ ] todo\n");
        assert!(
            out.contains("<input type=\"checkbox\" disabled=\"\" checked=\"\">"),
            "got {out}"
        );
        assert!(out.contains("class=\"task-list-item\""), "got {out}");
    }

    #[test]
    fn test_tight_list_has_no_paragraphs() {
        let out = html("- one\n- two\n");
        assert_eq!(out, "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn test_code_block_language_class() {
        let out = html("```rust\nfn main() {}\n```\n");
        assert_eq!(
            out,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_autolinks_bare_urls() {
        let out = html("see https://example.com now");
        assert!(
            out.contains("<a href=\"https://example.com\">https://example.com</a>"),
            "got {out}"
        );
    }

    #[test]
    fn test_schemeless_hosts_and_emails_stay_text() {
        let out = html("visit www.example.com or write to team@example.com, B.Sc holders");
        assert!(!out.contains("<a"), "got {out}");
        assert!(out.contains("www.example.com or write to team@example.com"), "got {out}");
    }

    #[test]
    fn test_angle_bracket_email_still_links() {
        let out = html("ask <help@example.com>");
        assert!(
            out.contains("<a href=\"mailto:help@example.com\">help@example.com</a>"),
            "got {out}"
        );
    }

    #[test]
    fn test_footnotes_link_to_definitions() {
        let doc = Document::from_markdown("Claim[^src].\n\n[^src]: Source.\n", None);
        let out = doc.content_html();
        assert!(out.contains("href=\"#fn-src\""), "got {out}");
        assert!(doc.dom().element_by_id("fn-src").is_some());
    }

    #[test]
    fn test_adjacent_text_is_merged() {
        let doc = Document::from_markdown("a.b and [not a link", None);
        let dom = doc.dom();
        let texts = dom.text_nodes(doc.content());
        assert_eq!(texts.len(), 1, "expected one text node");
        assert_eq!(dom.text(texts[0]), Some("a.b and [not a link"));
    }
}
