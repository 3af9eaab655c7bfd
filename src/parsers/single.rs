//! Posts about exactly one resource, possibly introduced by a catalogue record.
//!
//! The first valid link is the resource. When it points at a structured bibliographic source
//! instead, the record is fetched and the next link is expected to be the resource it describes;
//! both views are then merged. Every link after the resource is a candidate subordinate.

use tracing::{info, warn};

use super::ResourceParser;
use crate::{
    article::Article,
    description::describe_primary,
    dom::Anchor,
    error::ParseError,
    extract::{Outcome, ResourceExtractor},
    merge::merge,
    resource::Resource,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Single<'c> {
    skip_urls: &'c [String],
}

impl<'c> Single<'c> {
    pub fn with_skip_urls(skip_urls: &'c [String]) -> Self {
        Self { skip_urls }
    }

    /// The catalogue record behind `url`, if enrichment is on and the source is known.
    fn biblio(&self, extractor: &ResourceExtractor<'_>, article: &Article, url: &str) -> Option<Resource> {
        let fetcher = extractor.fetcher()?;
        if !fetcher.supports(url) {
            return None;
        }
        match fetcher.fetch(url) {
            Ok(resource) => Some(resource),
            Err(e) => {
                warn!(article = %article.url, %url, "{e}");
                None
            }
        }
    }

    fn post(
        &self,
        extractor: &ResourceExtractor<'_>,
        article: &Article,
        anchor: &Anchor<'_>,
    ) -> Result<Resource, ParseError> {
        let titles = extractor.titles(self, article, anchor)?;
        extractor.post_resource(article, anchor, titles)
    }

    /// Fill in what the record lacks from the post, citing the post for those fields only.
    fn round_out(
        &self,
        extractor: &ResourceExtractor<'_>,
        article: &Article,
        bib: &mut Resource,
    ) -> Result<(), ParseError> {
        let mut fields = Vec::new();
        if bib.description.is_none() {
            bib.description = describe_primary(&article.body, &bib.title);
        }
        if bib.description.is_some() {
            fields.push("description".to_string());
        }
        if bib.keywords.is_empty() {
            bib.keywords = extractor.miner().keywords(
                [Some(article.title.as_str()), Some(bib.title.as_str())],
                &article.categories,
                &article.title,
            )?;
        }
        if !bib.keywords.is_empty() {
            fields.push("keywords".to_string());
        }
        if !fields.is_empty() {
            extractor.cite_article(bib, article, Some(fields));
        }
        Ok(())
    }
}

impl ResourceParser for Single<'_> {
    fn name(&self) -> &str {
        "generic-single"
    }

    fn skip_urls(&self) -> &[String] {
        self.skip_urls
    }

    fn get_resources(
        &self,
        extractor: &ResourceExtractor<'_>,
        article: &Article,
    ) -> Result<Outcome, ParseError> {
        if !extractor.reconciler().allows(&article.title) {
            return Ok(Outcome::Skipped);
        }
        let selector = extractor.selector(self.skip_urls);
        let anchors = selector.anchors(&article.body);

        let first = selector.next_valid(&anchors, 0)?;
        let mut last = first;
        let mut cursor = Some(first);
        let bib = self.biblio(extractor, article, &anchors[first].url);
        if bib.is_some() {
            cursor = selector.next_valid(&anchors, first + 1).ok();
            if cursor.is_none() {
                warn!(article = %article.url, "no valid anchor after the bibliographic record");
            }
        }

        let mut top = match (bib, cursor) {
            (Some(bib), Some(i)) if anchors[i].url == bib.url => {
                last = i;
                let post = self.post(extractor, article, &anchors[i])?;
                match merge(&bib, &post) {
                    Ok(merged) => merged.resource,
                    Err(e) => {
                        warn!(article = %article.url, "{e}; keeping the post's resource");
                        post
                    }
                }
            }
            (Some(mut bib), cursor) => {
                if let Some(i) = cursor {
                    info!(
                        record = %anchors[first].url,
                        next = %anchors[i].url,
                        resource = %bib.url,
                        "link after the bibliographic record is not the resource it describes"
                    );
                }
                self.round_out(extractor, article, &mut bib)?;
                bib
            }
            (None, Some(i)) => {
                last = i;
                self.post(extractor, article, &anchors[i])?
            }
            (None, None) => return Err(ParseError::NoValidAnchor),
        };

        let subordinates = extractor.subordinates(article, &anchors[last + 1..], &top)?;
        top.subordinate_resources = subordinates.iter().map(Resource::package).collect();
        let mut resources = vec![top];
        resources.extend(subordinates);
        Ok(Outcome::Extracted(resources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        language::tests::FixedClassifier,
        resource::ProvenanceVerb,
        translator::{
            BiblioFetcher,
            tests::{FakeClient, RDF},
        },
    };

    fn article(html: &str) -> Article {
        Article::from_html(
            "tag:blogger.com,1999:blog-1.post-9",
            "Journal: Archaeonautica",
            "http://ancientworldonline.blogspot.com/2013/07/archaeonautica.html",
            vec![],
            html,
        )
    }

    const WITH_RECORD: &str = r#"
        <p><a href="http://zenon.dainst.org/Record/000812345">Zenon record</a>
        <a href="http://www.persee.fr/collection/nauti">Archaeonautica</a> is published by CNRS.</p>
        <ul><li><a href="http://www.persee.fr/issue/nauti_0154-1854_1977_num_1_1">Vol. 1 (1977)</a></li></ul>"#;

    #[test]
    fn record_and_post_are_merged() {
        let cfg = Config::builtin().unwrap();
        let classifier = FixedClassifier("en", 0.99);
        let client = FakeClient::ok("application/rdf+xml", RDF);
        let fetcher = BiblioFetcher::new(&cfg, &client);
        let ex = ResourceExtractor::new(&cfg, &classifier).with_fetcher(&fetcher);

        let resources = Single::default()
            .get_resources(&ex, &article(WITH_RECORD))
            .unwrap()
            .into_resources();
        let top = &resources[0];
        assert_eq!(top.url, "http://www.persee.fr/collection/nauti");
        assert_eq!(top.zenon_id.as_deref(), Some("000812345"));
        assert_eq!(top.publishers, vec!["CNRS"]);
        assert_eq!(top.keywords, vec!["journal"]);
        assert!(top.provenance.iter().any(|p| p.resource == "http://purl.org/net/wf-motifs#Combine"));
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1].year.as_deref(), Some("1977"));
        assert_eq!(top.subordinate_resources[0].url, resources[1].url);
    }

    #[test]
    fn mismatched_record_is_rounded_out() {
        let cfg = Config::builtin().unwrap();
        let classifier = FixedClassifier("en", 0.99);
        let client = FakeClient::ok("application/rdf+xml", RDF);
        let fetcher = BiblioFetcher::new(&cfg, &client);
        let ex = ResourceExtractor::new(&cfg, &classifier).with_fetcher(&fetcher);
        let html = r#"<p><a href="http://zenon.dainst.org/Record/000812345">Zenon record</a>
            <a href="http://www.persee.fr/somewhere-else">Elsewhere</a></p>"#;

        let resources = Single::default()
            .get_resources(&ex, &article(html))
            .unwrap()
            .into_resources();
        let top = &resources[0];
        assert_eq!(top.url, "http://www.persee.fr/collection/nauti");
        assert!(top.description.is_some());
        let cited = top
            .provenance
            .iter()
            .find(|p| p.term == ProvenanceVerb::CitesAsDataSource.uri() && p.resource.starts_with("tag:"))
            .expect("post citation");
        assert_eq!(
            cited.fields.as_deref(),
            Some(&["description".to_string(), "keywords".to_string()][..])
        );
    }

    #[test]
    fn without_enrichment_the_first_link_is_the_resource() {
        let cfg = Config::builtin().unwrap();
        let classifier = FixedClassifier("en", 0.99);
        let ex = ResourceExtractor::new(&cfg, &classifier);
        let resources = Single::default()
            .get_resources(&ex, &article(WITH_RECORD))
            .unwrap()
            .into_resources();
        assert_eq!(resources[0].url, "http://zenon.dainst.org/Record/000812345");
        assert_eq!(resources.len(), 1);
    }
}
