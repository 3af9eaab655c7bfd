//! Hyperlinks in a post body and the markup around them.

use std::collections::{BTreeSet, HashSet};

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};
use tracing::trace;

use crate::{config::AnchorConfig, error::ParseError, text::domain_of, text::normalize};

/// A hyperlink that may point at a resource.
#[derive(Debug, Clone)]
pub struct Anchor<'a> {
    pub node: ElementRef<'a>,
    pub url: String,
    /// Normalized link text.
    pub text: String,
    pub domain: String,
}

/// Name of an element node, `None` for text and everything else.
pub fn element_name<'a>(node: NodeRef<'a, Node>) -> Option<&'a str> {
    match node.value() {
        Node::Element(e) => Some(e.name()),
        _ => None,
    }
}

/// Normalized text content of an element.
pub fn text_of(el: ElementRef<'_>) -> String {
    normalize(&el.text().collect::<Vec<_>>().join(" "))
}

/// The `<body>` of a parsed document.
pub fn body(html: &Html) -> Option<ElementRef<'_>> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "body")
}

/// Finds and filters the anchors of a post body.
#[derive(Debug, Clone)]
pub struct AnchorSelector<'c> {
    config: &'c AnchorConfig,
    skip_urls: HashSet<&'c str>,
}

impl<'c> AnchorSelector<'c> {
    pub fn new(config: &'c AnchorConfig) -> Self {
        Self {
            config,
            skip_urls: config.ignore_urls.iter().map(String::as_str).collect(),
        }
    }

    /// Additionally ignore these urls.
    pub fn skipping(mut self, urls: &'c [String]) -> Self {
        self.skip_urls.extend(urls.iter().map(String::as_str));
        self
    }

    /// Anchors in document order, first occurrence of each url only.
    ///
    /// Links without text, to an ignored domain, or with ignored text or url are dropped. Links
    /// to the blog itself are kept; see [`AnchorSelector::is_resource`].
    pub fn anchors<'a>(&self, html: &'a Html) -> Vec<Anchor<'a>> {
        let mut seen = HashSet::new();
        html.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "a")
            .filter_map(|node| {
                let url = node.value().attr("href")?.trim().to_string();
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return None;
                }
                if !seen.insert(url.clone()) {
                    return None;
                }
                let text = text_of(node);
                let domain = domain_of(&url);
                if text.is_empty()
                    || self.config.ignore_domains.contains(&domain)
                    || self.skip_urls.contains(url.as_str())
                    || self
                        .config
                        .ignore_text
                        .iter()
                        .any(|t| t.eq_ignore_ascii_case(&text))
                {
                    trace!(%url, "ignoring anchor");
                    return None;
                }
                Some(Anchor {
                    node,
                    url,
                    text,
                    domain,
                })
            })
            .collect()
    }

    pub fn is_self(&self, anchor: &Anchor<'_>) -> bool {
        self.config.self_domains.contains(&anchor.domain)
    }

    /// Whether the anchor may be taken for a primary or subordinate resource.
    pub fn is_resource(&self, anchor: &Anchor<'_>) -> bool {
        !self.is_self(anchor)
    }

    /// Index of the first resource anchor at or after `from`.
    pub fn next_valid(&self, anchors: &[Anchor<'_>], from: usize) -> Result<usize, ParseError> {
        anchors
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, a)| self.is_resource(a))
            .map(|(i, _)| i)
            .ok_or(ParseError::NoValidAnchor)
    }

    /// Distinct domains of the resource anchors, sorted.
    ///
    /// When the post links to more than one domain, links to structured bibliographic sources are
    /// taken for catalogue references rather than resources and do not count.
    pub fn routing_domains<'d>(
        &self,
        html: &Html,
        bibliographic: impl IntoIterator<Item = &'d str>,
    ) -> Vec<String> {
        let domains: BTreeSet<String> = self
            .anchors(html)
            .into_iter()
            .filter(|a| self.is_resource(a))
            .map(|a| a.domain)
            .collect();
        if domains.len() > 1 {
            let bibliographic: HashSet<&str> = bibliographic.into_iter().collect();
            domains
                .into_iter()
                .filter(|d| !bibliographic.contains(d.as_str()))
                .collect()
        } else {
            domains.into_iter().collect()
        }
    }
}

/// The element whose text names the resource an anchor points at.
///
/// That is the enclosing list item if there is one, otherwise the largest ancestor that links
/// nowhere but to the anchor's url, otherwise the anchor itself.
pub fn title_context<'a>(anchor: &Anchor<'a>) -> ElementRef<'a> {
    let mut ancestors = anchor.node.ancestors().filter_map(ElementRef::wrap);
    if let Some(li) = ancestors.clone().find(|e| e.value().name() == "li") {
        return li;
    }
    let mut context = anchor.node;
    for parent in ancestors.by_ref() {
        if matches!(parent.value().name(), "body" | "html") || links_elsewhere(parent, &anchor.url) {
            break;
        }
        context = parent;
    }
    context
}

fn links_elsewhere(el: ElementRef<'_>, url: &str) -> bool {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "a")
        .filter_map(|e| e.value().attr("href"))
        .any(|href| href.trim() != url)
}

/// The first following sibling that is an element or holds visible text.
pub fn next_content<'a>(el: ElementRef<'a>) -> Option<NodeRef<'a, Node>> {
    el.next_siblings().find(|n| match n.value() {
        Node::Text(t) => !t.trim().is_empty(),
        Node::Element(_) => true,
        _ => false,
    })
}

/// The nearest enclosing list item.
pub fn enclosing_li<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "li")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    const BODY: &str = r#"<div>
        <a href="http://www.addthis.com/bookmark">Share</a>
        <a href="http://www.persee.fr/nauti">Archaeonautica</a> is a journal.
        <a href="http://www.persee.fr/nauti">Archaeonautica again</a>
        <a href="http://ancientworldonline.blogspot.com/2011/list.html">AWOL list</a>
        <a href="http://www.persee.fr/empty"></a>
        <a href="mailto:someone@example.org">mail</a>
        <ul>
          <li><a href="http://www.persee.fr/nauti/1">Vol. 1 (1977)</a> first volume</li>
          <li><h3><a href="http://www.persee.fr/nauti/2">Vol. 2</a></h3></li>
        </ul>
        <h3><a href="http://zenon.dainst.org/Record/000001">Zenon record</a></h3>
        <p><a href="http://www.persee.fr/a">A</a> and <a href="http://www.persee.fr/b">B</a></p>
        </div>"#;

    fn fixture() -> (Config, Html) {
        let cfg = Config::from_toml(
            r#"
            [anchors]
            ignore_domains = ["www.addthis.com"]
            self_domains = ["ancientworldonline.blogspot.com"]
            ignore_text = ["contact us"]
            "#,
        )
        .expect("config");
        (cfg, Html::parse_document(BODY))
    }

    #[test]
    fn anchors_are_unique_and_filtered() {
        let (cfg, html) = fixture();
        let selector = AnchorSelector::new(&cfg.anchors);
        let urls: Vec<String> = selector.anchors(&html).into_iter().map(|a| a.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://www.persee.fr/nauti",
                "http://ancientworldonline.blogspot.com/2011/list.html",
                "http://www.persee.fr/nauti/1",
                "http://www.persee.fr/nauti/2",
                "http://zenon.dainst.org/Record/000001",
                "http://www.persee.fr/a",
                "http://www.persee.fr/b",
            ]
        );
    }

    #[test]
    fn next_valid_skips_self_links() {
        let (cfg, html) = fixture();
        let selector = AnchorSelector::new(&cfg.anchors);
        let anchors = selector.anchors(&html);
        assert_eq!(selector.next_valid(&anchors, 0).unwrap(), 0);
        assert_eq!(selector.next_valid(&anchors, 1).unwrap(), 2);
        assert!(matches!(
            selector.next_valid(&anchors, anchors.len()),
            Err(ParseError::NoValidAnchor)
        ));
    }

    #[test]
    fn skipped_urls_are_dropped() {
        let (cfg, html) = fixture();
        let skip = vec!["http://www.persee.fr/nauti".to_string()];
        let selector = AnchorSelector::new(&cfg.anchors).skipping(&skip);
        assert_eq!(selector.anchors(&html)[0].url, "http://ancientworldonline.blogspot.com/2011/list.html");
    }

    #[test]
    fn bibliographic_domains_do_not_route() {
        let (cfg, html) = fixture();
        let selector = AnchorSelector::new(&cfg.anchors);
        assert_eq!(
            selector.routing_domains(&html, ["zenon.dainst.org"]),
            vec!["www.persee.fr"]
        );
        assert_eq!(
            selector.routing_domains(&html, std::iter::empty()),
            vec!["www.persee.fr", "zenon.dainst.org"]
        );
    }

    #[test]
    fn title_contexts() {
        let (cfg, html) = fixture();
        let selector = AnchorSelector::new(&cfg.anchors);
        let anchors = selector.anchors(&html);
        let name = |i: usize| title_context(&anchors[i]).value().name().to_string();
        assert_eq!(name(2), "li");
        assert_eq!(name(3), "li");
        assert_eq!(name(4), "h3");
        assert_eq!(name(5), "a");
        assert_eq!(text_of(title_context(&anchors[2])), "Vol. 1 (1977) first volume");
    }

    #[test]
    fn next_content_skips_blank_text() {
        let (cfg, html) = fixture();
        let selector = AnchorSelector::new(&cfg.anchors);
        let anchors = selector.anchors(&html);
        let heading = title_context(&anchors[4]);
        assert!(heading.next_sibling().is_some_and(|n| n.value().is_text()));
        assert_eq!(next_content(heading).and_then(element_name), Some("p"));

        let first = title_context(&anchors[5]);
        let text = next_content(first).and_then(|n| n.value().as_text().map(|t| t.trim().to_string()));
        assert_eq!(text.as_deref(), Some("and"));
    }
}
