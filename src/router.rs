//! Picks the extraction strategy for an article from the domains its body links to.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    article::Article,
    config::Config,
    dom::AnchorSelector,
    error::ParseError,
    extract::{Outcome, ResourceExtractor},
    parsers::{self, Generic, ResourceParser, Single},
};

/// Marker in a post title that forces the single-resource strategy.
const JOURNAL_MARKER: &str = "journal:";

pub struct DomainRouter<'c> {
    config: &'c Config,
    generic: Generic,
    single: Single<'static>,
    variants: BTreeMap<String, Box<dyn ResourceParser + 'c>>,
}

impl<'c> DomainRouter<'c> {
    /// Register a variant for every domain named in a `[variants]` table or an exception table.
    pub fn new(config: &'c Config) -> Self {
        let domains = config
            .variants
            .keys()
            .map(String::as_str)
            .chain(config.title_overrides.iter().map(|o| o.domain.as_str()))
            .chain(config.primary_anchor_overrides.iter().map(|o| o.domain.as_str()));

        let mut variants = BTreeMap::new();
        for domain in domains {
            variants
                .entry(domain.to_lowercase())
                .or_insert_with(|| parsers::for_variant(config, domain));
        }
        debug!(variants = variants.len(), "domain router ready");

        Self {
            config,
            generic: Generic,
            single: Single::default(),
            variants,
        }
    }

    /// Sorted external domains the article links to, as routing sees them.
    pub fn domains(&self, article: &Article) -> Vec<String> {
        AnchorSelector::new(&self.config.anchors)
            .routing_domains(&article.body, self.config.bibliographic_domains())
    }

    pub fn route(&self, article: &Article) -> Result<&dyn ResourceParser, ParseError> {
        let domains = self.domains(article);
        if domains.is_empty() {
            return Err(ParseError::NoDomains(article.id.clone()));
        }
        if article.title.to_lowercase().contains(JOURNAL_MARKER) {
            return Ok(&self.single);
        }

        if let [domain] = domains.as_slice() {
            if let Some(variant) = self.variants.get(domain) {
                return Ok(variant.as_ref());
            }
            if self.config.routing.single_resource_domains.contains(domain) {
                return Ok(&self.single);
            }
            return Ok(&self.generic);
        }

        let mut claimed = domains.iter().filter_map(|d| self.variants.get(d));
        match (claimed.next(), claimed.next()) {
            (Some(variant), None) => Ok(variant.as_ref()),
            _ => Err(ParseError::AmbiguousDomains {
                article: article.id.clone(),
                domains,
            }),
        }
    }

    /// Route the article and run the chosen strategy on it.
    pub fn parse(
        &self,
        extractor: &ResourceExtractor<'_>,
        article: &Article,
    ) -> Result<Outcome, ParseError> {
        let parser = self.route(article)?;
        debug!(article = %article.id, parser = parser.name(), "routed");
        parser.get_resources(extractor, article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::tests::FixedClassifier;

    fn article(title: &str, html: &str) -> Article {
        Article::from_html(
            "tag:blogger.com,1999:blog-1.post-7",
            title,
            "http://ancientworldonline.blogspot.com/2014/02/post.html",
            vec![],
            html,
        )
    }

    fn route_name(title: &str, html: &str) -> Result<String, ParseError> {
        let cfg = Config::builtin().unwrap();
        let router = DomainRouter::new(&cfg);
        router.route(&article(title, html)).map(|p| p.name().to_string())
    }

    #[test]
    fn one_domain_without_variant_is_generic() {
        let html = r#"<p><a href="http://www.example.org/a">A</a> <a href="http://www.example.org/b">B</a></p>"#;
        assert_eq!(route_name("Example", html).unwrap(), "generic");
    }

    #[test]
    fn one_domain_with_variant() {
        let html = r#"<p><a href="http://oi.uchicago.edu/research/pubs/oip139.html">OIP 139</a></p>"#;
        assert_eq!(route_name("OIP 139", html).unwrap(), "oi.uchicago.edu");
    }

    #[test]
    fn single_resource_domain() {
        let html = r#"<p><a href="http://www.egyptpro.sci.waseda.ac.jp/">Egyptian Project</a></p>"#;
        assert_eq!(route_name("Egyptian Project", html).unwrap(), "generic-single");
    }

    #[test]
    fn journal_marker_forces_single() {
        let html = r#"<p><a href="http://www.example.org/a">A</a> <a href="http://www.example.net/b">B</a></p>"#;
        assert_eq!(route_name("Open Access Journal: Example", html).unwrap(), "generic-single");
    }

    #[test]
    fn a_single_claimed_domain_wins() {
        let html = r#"<p><a href="http://oi.uchicago.edu/research/pubs/oip139.html">OIP 139</a>
            <a href="http://www.oxbowbooks.com/oip139">Buy it</a></p>"#;
        assert_eq!(route_name("OIP 139", html).unwrap(), "oi.uchicago.edu");
    }

    #[test]
    fn unclaimed_domains_are_ambiguous() {
        let html = r#"<p><a href="http://www.example.org/a">A</a> <a href="http://www.example.net/b">B</a></p>"#;
        match route_name("Two sites", html) {
            Err(ParseError::AmbiguousDomains { domains, .. }) => {
                assert_eq!(domains, vec!["www.example.net", "www.example.org"]);
            }
            other => panic!("expected ambiguous domains, got {other:?}"),
        }
    }

    #[test]
    fn catalogue_links_do_not_count_next_to_a_resource() {
        let html = r#"<p><a href="http://zenon.dainst.org/Record/000812345">Zenon</a>
            <a href="http://www.persee.fr/collection/nauti">Archaeonautica</a></p>"#;
        let cfg = Config::builtin().unwrap();
        let router = DomainRouter::new(&cfg);
        assert_eq!(router.domains(&article("Archaeonautica", html)), vec!["www.persee.fr"]);
    }

    #[test]
    fn self_links_only_is_no_domains() {
        let html = r#"<p><a href="http://ancientworldonline.blogspot.com/2011/list.html">List</a></p>"#;
        assert!(matches!(route_name("List", html), Err(ParseError::NoDomains(_))));
    }

    #[test]
    fn parse_runs_the_routed_strategy() {
        let cfg = Config::builtin().unwrap();
        let classifier = FixedClassifier("en", 0.99);
        let ex = ResourceExtractor::new(&cfg, &classifier);
        let router = DomainRouter::new(&cfg);
        let html = r#"<p><a href="http://www.example.org/journal">Example Journal</a> is online.</p>"#;
        let resources = router
            .parse(&ex, &article("Example Journal", html))
            .unwrap()
            .into_resources();
        assert_eq!(resources[0].url, "http://www.example.org/journal");
    }
}
