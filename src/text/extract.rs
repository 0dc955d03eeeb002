//! Plain-text extraction from HTML documents.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{Html, Selector};

/// Sentinel title used when neither the page nor the bookmark has one.
pub const UNTITLED: &str = "untitled";

/// Elements whose subtrees carry no visible page content.
const SKIP_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "meta", "link"];

/// Title and visible text extracted from an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Page `<title>` content, if present and non-empty
    pub title: Option<String>,

    /// Visible text, one trimmed non-empty line per text run
    pub text: String,
}

impl ExtractedPage {
    /// Whether the extraction yielded any usable text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extract the title and visible text from an HTML document.
///
/// Non-content elements (script, style, nav, footer, header, metadata and
/// link tags) are skipped wholesale; remaining text runs are joined with
/// newlines and collapsed. Malformed HTML degrades to partial or empty text
/// rather than an error.
pub fn extract_page(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);

    let mut raw = String::new();
    collect_text(document.tree.root(), &mut raw);

    ExtractedPage {
        title,
        text: collapse_whitespace(&raw),
    }
}

/// Extract the first non-empty `<title>` text.
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let element = document.select(&selector).next()?;
    let title: String = element.text().collect::<String>().trim().to_string();
    (!title.is_empty()).then_some(title)
}

/// Walk the DOM, appending visible text runs separated by newlines.
fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Element(element) => {
            if SKIP_TAGS.contains(&element.name()) {
                return;
            }
            for child in node.children() {
                collect_text(child, out);
            }
        }
        Node::Text(text) => {
            out.push_str(&text);
            out.push('\n');
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

/// Trim every line, drop empties, and rejoin with single newlines.
pub fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
