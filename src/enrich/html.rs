//! HTML → plain text conversion for the enrichment extractors (§4.6).

use scraper::Html;

const SKIP_TAGS: &[&str] = &["script", "style", "noscript"];
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
];

/// Strip `<script>`/`<style>`, convert block-level tags to newlines,
/// and decode entities, leaving plain text suitable for the §4.2
/// extractors to scan.
pub fn html_to_text(body: &str) -> String {
    let document = Html::parse_document(body);

    let mut out = String::new();
    for node in document.tree.root().descendants() {
        if has_skipped_ancestor(node) {
            continue;
        }
        if let Some(text) = node.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(element) = node.value().as_element() {
            if BLOCK_TAGS.contains(&element.name()) {
                out.push('\n');
            }
        }
    }

    normalize_whitespace(&out)
}

fn has_skipped_ancestor(node: ego_tree::NodeRef<scraper::Node>) -> bool {
    node.ancestors().any(|ancestor| {
        ancestor
            .value()
            .as_element()
            .is_some_and(|el| SKIP_TAGS.contains(&el.name()))
    })
}

fn normalize_whitespace(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
