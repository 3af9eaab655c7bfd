//! The explanatory prose that follows a resource's link in a post.
//!
//! The walk starts at a node and continues through its following siblings, descending into
//! each, and ends at the first boundary: a stop-set element, or an anchor pointing somewhere new.

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};

use crate::{
    dom::{body, element_name},
    text::{deduplicate_lines, deduplicate_sentences, normalize_ws, word_key},
};

/// Elements that end a description.
const STOP: &[&str] = &[
    "a", "h1", "h2", "h3", "h4", "h5", "h6", "div", "ol", "ul", "dl", "dt", "li", "table",
];
/// Boundaries of the second, wider pass.
const WIDER_STOP: &[&str] = &["a", "h1", "h2", "h3", "h4", "h5", "h6"];
/// Elements whose content goes on a line of its own.
const BLOCK: &[&str] = &[
    "p", "div", "li", "dd", "dt", "tr", "blockquote", "ul", "ol", "dl", "table", "h1", "h2", "h3",
    "h4", "h5", "h6",
];
/// Left behind in the markup where images were removed.
const IMAGE_MARKER: &str = "%IMAGEREPLACED%";

static RX_PUNCT_FIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.,:;])").unwrap());
static RX_PUNCT_DEDUPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.,:;])[.,:;]").unwrap());

/// Description of the primary resource, read from the top of the post body.
///
/// The first anchor met is the resource's own link and does not end the description.
pub fn describe_primary(html: &Html, title: &str) -> Option<String> {
    let start = body(html)?.first_child()?;
    describe(start, title, true)
}

/// Description starting at `start`.
///
/// When the text found is empty or merely restates `title`, a second pass that only stops at
/// headings and anchors is tried. After an empty first pass, every anchor ends the second.
pub fn describe(start: NodeRef<'_, Node>, title: &str, skip_first_anchor: bool) -> Option<String> {
    let first = finish(&collect(start, STOP, skip_first_anchor));
    let restates = first
        .as_deref()
        .is_some_and(|d| word_key(d) == word_key(title));
    if first.is_some() && !restates {
        return first;
    }
    let skip_first_anchor = skip_first_anchor && first.is_some();
    finish(&collect(start, WIDER_STOP, skip_first_anchor)).or(first)
}

enum Frame<'a> {
    Enter(NodeRef<'a, Node>),
    Leave,
}

/// Raw text from `start` up to the first boundary, one block per line.
fn collect(start: NodeRef<'_, Node>, stop: &[&str], skip_first_anchor: bool) -> String {
    let mut out = String::new();
    let mut urls: Vec<String> = Vec::new();

    let mut stack: Vec<Frame<'_>> = start.next_siblings().map(Frame::Enter).collect();
    stack.reverse();
    stack.push(Frame::Enter(start));

    while let Some(frame) = stack.pop() {
        let node = match frame {
            Frame::Leave => {
                out.push('\n');
                continue;
            }
            Frame::Enter(node) => node,
        };
        match node.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                let name = e.name();
                if name == "a" {
                    let url = comparable_url(e.attr("href").unwrap_or_default());
                    let continues = (skip_first_anchor && urls.is_empty())
                        || urls.last().is_some_and(|last| *last == url);
                    if node != start && stop.contains(&name) && !continues {
                        break;
                    }
                    urls.push(url);
                } else if node != start && stop.contains(&name) {
                    break;
                }

                if name == "br" {
                    if !ends_sentence(node.prev_sibling()) {
                        out.push_str(". ");
                    }
                    out.push('\n');
                    continue;
                }
                if BLOCK.contains(&name) {
                    out.push('\n');
                    stack.push(Frame::Leave);
                }
                stack.extend(node.children().rev().map(Frame::Enter));
            }
            _ => {}
        }
    }
    out
}

/// Drop a trailing `index.html`, `index.php` or slash so that equivalent links compare equal.
fn comparable_url(href: &str) -> String {
    let href = href.trim();
    match href.rsplit_once('/') {
        Some((head, last)) if matches!(last, "" | "index.html" | "index.php") => head.to_string(),
        _ => href.to_string(),
    }
}

fn ends_sentence(node: Option<NodeRef<'_, Node>>) -> bool {
    let Some(node) = node else {
        return false;
    };
    let text: String = node
        .descendants()
        .filter_map(|n| match n.value() {
            Node::Text(t) => Some(&**t),
            _ => None,
        })
        .collect();
    normalize_ws(&text).ends_with('.') || element_name(node) == Some("br")
}

fn finish(raw: &str) -> Option<String> {
    let text = deduplicate_lines(raw).replace(IMAGE_MARKER, "");
    let text = RX_PUNCT_FIX.replace_all(text.trim(), "$1");
    let text = deduplicate_sentences(&text);
    let text = normalize_ws(&RX_PUNCT_DEDUPE.replace_all(&text, "$1"));
    if text.is_empty() {
        return None;
    }
    Some(if text.ends_with('.') { text } else { text + "." })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::ElementRef;

    fn find<'a>(html: &'a Html, name: &str, nth: usize) -> NodeRef<'a, Node> {
        *html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == name)
            .nth(nth)
            .expect("element")
    }

    #[test]
    fn primary_description_runs_to_the_list() {
        let html = Html::parse_document(
            r#"<p><a href="http://www.persee.fr/nauti/">Archaeonautica</a> is a journal
            <a href="http://www.persee.fr/nauti/index.html">(home)</a> published by CNRS<br>
            ISSN: 0154-1854</p>
            <ul><li><a href="http://www.persee.fr/nauti/1">Vol. 1</a></li></ul>"#,
        );
        assert_eq!(
            describe_primary(&html, "Archaeonautica").as_deref(),
            Some("Archaeonautica is a journal (home) published by CNRS. ISSN: 0154-1854.")
        );
    }

    #[test]
    fn a_different_anchor_ends_the_description() {
        let html = Html::parse_document(
            r#"<p><a href="http://a.org/">A</a> describes A. <a href="http://b.org/">B</a> is another.</p>"#,
        );
        assert_eq!(describe_primary(&html, "A").as_deref(), Some("A describes A."));
    }

    #[test]
    fn restated_title_triggers_the_wider_pass() {
        let html = Html::parse_document(
            r#"<div><a href="http://a.org/">Annual Report</a></div>
            <div>Published each year by the institute.</div>
            <h2>Next</h2>"#,
        );
        assert_eq!(
            describe_primary(&html, "Annual Report").as_deref(),
            Some("Annual Report Published each year by the institute.")
        );
    }

    #[test]
    fn a_post_opening_with_a_list_has_no_primary_description() {
        let html = Html::parse_document(
            r#"<ul><li><a href="http://a.org/1">Issue 1</a></li><li><a href="http://a.org/2">Issue 2</a></li></ul>"#,
        );
        assert_eq!(describe_primary(&html, "Annual Report"), None);
    }

    #[test]
    fn description_after_a_context_stops_at_the_first_anchor() {
        let html = Html::parse_document(
            r#"<h3><a href="http://a.org/1">Issue 1</a></h3>
            <p>Contents of the first issue; %IMAGEREPLACED% articles on pottery .</p>
            <h3><a href="http://a.org/2">Issue 2</a></h3>"#,
        );
        let start = find(&html, "h3", 0).next_sibling().expect("sibling");
        assert_eq!(
            describe(start, "Issue 1", false).as_deref(),
            Some("Contents of the first issue; articles on pottery.")
        );
    }

    #[test]
    fn nothing_to_describe() {
        let html = Html::parse_document(r#"<ul><li><a href="http://a.org/1">Issue 1</a></li><li><a href="http://a.org/2">Issue 2</a></li></ul>"#);
        let start = find(&html, "li", 0).next_sibling().expect("sibling");
        assert_eq!(describe(start, "Issue 1", false), None);
    }

    #[test]
    fn repeated_lines_collapse() {
        let html = Html::parse_document(
            r#"<p><a href="http://a.org/">A</a></p><p>The collection.</p><p>The collection.</p><p>The collection, with maps.</p>"#,
        );
        assert_eq!(
            describe_primary(&html, "Something else").as_deref(),
            Some("A The collection, with maps.")
        );
    }

    #[test]
    fn urls_compare_without_index_pages() {
        assert_eq!(comparable_url("http://a.org/x/index.php"), "http://a.org/x");
        assert_eq!(comparable_url("http://a.org/x/"), "http://a.org/x");
        assert_eq!(comparable_url("http://a.org/x"), "http://a.org/x");
    }
}
