//! Lists of theses, one line per person.
//!
//! Some posts are rosters rather than link lists: each entry is a `span.person_name` followed by
//! the year, a link to the thesis and a short abstract after a line break, all as siblings in one
//! paragraph. Subject pages linked above a group of entries become related resources.

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Node, Selector};
use tracing::debug;

use super::ResourceParser;
use crate::{
    article::Article,
    config::VariantConfig,
    dom::text_of,
    error::ParseError,
    extract::{Outcome, ResourceExtractor},
    resource::Resource,
    text::{clean_title, normalize, normalize_ws},
};

static PERSON: Lazy<Selector> = Lazy::new(|| Selector::parse("span.person_name").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

pub struct Roster<'c> {
    domain: &'c str,
    variant: &'c VariantConfig,
}

impl<'c> Roster<'c> {
    pub fn new(domain: &'c str, variant: &'c VariantConfig) -> Self {
        Self { domain, variant }
    }

    fn walk(&self, extractor: &ResourceExtractor<'_>, article: &Article) -> Result<Outcome, ParseError> {
        let anchors: Vec<ElementRef<'_>> = article.body.select(&ANCHOR).collect();
        let mut theses = Vec::new();
        let mut subjects: Vec<Resource> = Vec::new();

        for person in article.body.select(&PERSON) {
            let Some(link) = next_element(*person, |e| e.value().name() == "a") else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let title = clean_title(&text_of(link));

            let subject = anchors
                .iter()
                .take_while(|a| **a != link)
                .filter(|a| a.value().attr("href").is_some_and(|h| h.contains("subjects")))
                .last()
                .map(|a| self.subject(extractor, article, *a))
                .transpose()?;

            let mut thesis = Resource::new(href.trim(), title);
            thesis.authors = vec![text_of(person)];
            thesis.description = abstract_of(link);
            thesis.year = person
                .next_sibling()
                .map(node_text)
                .map(|t| clean_title(&t))
                .filter(|y| !y.is_empty());
            thesis.languages = extractor
                .language(&[Some(thesis.title.as_str())])
                .into_iter()
                .collect();
            thesis.keywords = extractor.miner().keywords(
                [
                    subject.as_ref().map(|s| s.title.as_str()),
                    Some(thesis.title.as_str()),
                ],
                &[],
                &article.title,
            )?;
            if let Some(subject) = subject {
                thesis.related_resources.push(subject.package());
                if !subjects.iter().any(|s| s.url == subject.url) {
                    subjects.push(subject);
                }
            }
            extractor.cite_article(&mut thesis, article, None);
            theses.push(thesis);
        }

        debug!(article = %article.id, theses = theses.len(), subjects = subjects.len(), "roster walked");
        theses.extend(subjects);
        Ok(Outcome::Extracted(theses))
    }

    fn subject(
        &self,
        extractor: &ResourceExtractor<'_>,
        article: &Article,
        anchor: ElementRef<'_>,
    ) -> Result<Resource, ParseError> {
        let title = clean_title(&text_of(anchor));
        let url = anchor.value().attr("href").unwrap_or_default().trim();
        let mut resource = Resource::new(url, title);
        resource.keywords = extractor
            .miner()
            .keywords([Some(resource.title.as_str())], &[], &article.title)?;
        resource.languages = extractor
            .language(&[Some(resource.title.as_str())])
            .into_iter()
            .collect();
        extractor.cite_article(&mut resource, article, None);
        Ok(resource)
    }
}

impl ResourceParser for Roster<'_> {
    fn name(&self) -> &str {
        self.domain
    }

    fn skip_urls(&self) -> &[String] {
        &self.variant.skip_urls
    }

    fn get_resources(
        &self,
        extractor: &ResourceExtractor<'_>,
        article: &Article,
    ) -> Result<Outcome, ParseError> {
        if self.variant.article_urls.contains(&article.url) {
            self.walk(extractor, article)
        } else {
            extractor.run(self, article)
        }
    }
}

/// The first following sibling element matching `pred`.
fn next_element<'a>(node: NodeRef<'a, Node>, pred: impl Fn(&ElementRef<'a>) -> bool) -> Option<ElementRef<'a>> {
    node.next_siblings().filter_map(ElementRef::wrap).find(pred)
}

fn is_person(e: &ElementRef<'_>) -> bool {
    e.value().name() == "span" && e.value().classes().any(|c| c == "person_name")
}

fn node_text(node: NodeRef<'_, Node>) -> String {
    match node.value() {
        Node::Text(t) => normalize(t),
        _ => ElementRef::wrap(node).map(text_of).unwrap_or_default(),
    }
}

/// Text between the line break after `link` and the next person.
fn abstract_of(link: ElementRef<'_>) -> Option<String> {
    let br = next_element(*link, |e| e.value().name() == "br")?;
    let mut text = String::new();
    for node in br.next_siblings() {
        if ElementRef::wrap(node).is_some_and(|e| is_person(&e)) {
            break;
        }
        text.push_str(&node_text(node));
        text.push(' ');
    }
    let text = normalize_ws(&text);
    if text.is_empty() {
        return None;
    }
    Some(normalize_ws(
        &text.split('.').map(str::trim).collect::<Vec<_>>().join(". "),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, language::tests::FixedClassifier};

    const ROSTER_URL: &str = "http://ancientworldonline.blogspot.com/2015/05/universitat-wien-theses-and.html";

    const ROSTER: &str = r#"<div>
        <a href="http://othes.univie.ac.at/view/subjects/ALT.html">Altertumswissenschaften</a><br>
        <span class="person_name">Huber, Anna</span> (2012)
        <a href="http://othes.univie.ac.at/20001/">Die Keramik von Ephesos</a><br>
        Eine Studie.Mit Katalog<br>
        <span class="person_name">Gruber, Max</span> (2013)
        <a href="http://othes.univie.ac.at/20002/">Römische Münzen</a><br>
        Numismatik in Noricum.
        </div>"#;

    fn run(url: &str) -> Vec<Resource> {
        let cfg = Config::builtin().unwrap();
        let classifier = FixedClassifier("de", 0.99);
        let ex = ResourceExtractor::new(&cfg, &classifier);
        let parser = Roster::new("othes.univie.ac.at", &cfg.variants["othes.univie.ac.at"]);
        let article = Article::from_html("id", "Universität Wien Theses", url, vec![], ROSTER);
        parser.get_resources(&ex, &article).unwrap().into_resources()
    }

    #[test]
    fn roster_entries_become_theses() {
        let resources = run(ROSTER_URL);
        assert_eq!(resources.len(), 3);

        let first = &resources[0];
        assert_eq!(first.url, "http://othes.univie.ac.at/20001/");
        assert_eq!(first.title, "Die Keramik von Ephesos");
        assert_eq!(first.authors, vec!["Huber, Anna"]);
        assert_eq!(first.year.as_deref(), Some("2012"));
        assert_eq!(first.description.as_deref(), Some("Eine Studie. Mit Katalog"));
        assert_eq!(first.related_resources[0].url, "http://othes.univie.ac.at/view/subjects/ALT.html");

        assert_eq!(resources[1].year.as_deref(), Some("2013"));
        assert_eq!(resources[1].description.as_deref(), Some("Numismatik in Noricum."));

        let subject = &resources[2];
        assert_eq!(subject.title, "Altertumswissenschaften");
        assert!(subject.related_resources.is_empty());
    }

    #[test]
    fn other_articles_use_the_generic_pipeline() {
        let resources = run("http://ancientworldonline.blogspot.com/2016/01/other.html");
        assert_eq!(resources[0].url, "http://othes.univie.ac.at/view/subjects/ALT.html");
    }
}
