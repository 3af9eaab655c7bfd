//! Turning one article into resources.
//!
//! An article is processed in a fixed order: the primary resource first, then the resources
//! subordinate to it, then related posts on the blog itself. Later stages consume the primary's
//! package, so the order cannot change. The [`ResourceParser`] decides how the primary anchor
//! and its title are chosen; everything else is shared and lives on [`ResourceExtractor`].

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::{
    analytic::parse_analytic_title,
    article::Article,
    config::Config,
    description::{describe, describe_primary},
    dom::{Anchor, AnchorSelector, enclosing_li, next_content, text_of, title_context},
    error::ParseError,
    identifier::extract_identifiers,
    keywords::KeywordMiner,
    language::{LanguageClassifier, detect},
    parsers::ResourceParser,
    resource::{ProvenanceVerb, Resource, ResourcePackage},
    text::{clean_title, normalize_ws},
    titles::{TitleReconciler, Titles},
    translator::BiblioFetcher,
};

static RX_AUTHORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(compiled by |assembled by |created by |written by |authors?):?\s*([^\.]+)").unwrap()
});
static RX_EDITORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(edited by |editors?):?\s*([^\.]+)").unwrap());

/// Progress through one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    PrimaryExtracted,
    SubordinatesExtracted,
    RelatedExtracted,
    Done,
    Skipped,
    Failed,
}

/// What an article yielded.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The title marks the post as describing nothing.
    Skipped,
    /// The primary resource first, then its subordinates, then related resources.
    Extracted(Vec<Resource>),
}

impl Outcome {
    pub fn into_resources(self) -> Vec<Resource> {
        match self {
            Self::Skipped => Vec::new(),
            Self::Extracted(resources) => resources,
        }
    }
}

/// Shared extraction machinery, configured once per run.
pub struct ResourceExtractor<'c> {
    pub config: &'c Config,
    classifier: &'c dyn LanguageClassifier,
    fetcher: Option<&'c BiblioFetcher<'c>>,
}

impl<'c> ResourceExtractor<'c> {
    pub fn new(config: &'c Config, classifier: &'c dyn LanguageClassifier) -> Self {
        Self {
            config,
            classifier,
            fetcher: None,
        }
    }

    /// Enable enrichment from structured bibliographic sources.
    pub fn with_fetcher(mut self, fetcher: &'c BiblioFetcher<'c>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn fetcher(&self) -> Option<&'c BiblioFetcher<'c>> {
        self.fetcher
    }

    pub fn selector<'s>(&self, skip_urls: &'s [String]) -> AnchorSelector<'s>
    where
        'c: 's,
    {
        AnchorSelector::new(&self.config.anchors).skipping(skip_urls)
    }

    pub fn reconciler(&self) -> TitleReconciler<'c> {
        TitleReconciler::new(&self.config.titles)
    }

    pub fn miner(&self) -> KeywordMiner<'c> {
        KeywordMiner::new(&self.config.keywords)
    }

    /// Run the default pipeline, with `parser` choosing the primary anchor and its title.
    pub fn run<P: ResourceParser + ?Sized>(
        &self,
        parser: &P,
        article: &Article,
    ) -> Result<Outcome, ParseError> {
        let mut stage = Stage::Init;
        let result = self.stages(parser, article, &mut stage);
        if result.is_err() {
            stage = Stage::Failed;
        }
        debug!(article = %article.id, parser = parser.name(), ?stage, "extraction finished");
        result
    }

    fn stages<P: ResourceParser + ?Sized>(
        &self,
        parser: &P,
        article: &Article,
        stage: &mut Stage,
    ) -> Result<Outcome, ParseError> {
        if !self.reconciler().allows(&article.title) {
            info!(article = %article.id, title = %article.title, "omitting post by title");
            *stage = Stage::Skipped;
            return Ok(Outcome::Skipped);
        }

        let selector = self.selector(parser.skip_urls());
        let anchors = selector.anchors(&article.body);
        let index = parser.select_primary_anchor(&selector, &anchors)?;
        let anchor = &anchors[index];
        let titles = self.titles(parser, article, anchor)?;
        let mut primary = self.post_resource(article, anchor, titles)?;
        *stage = Stage::PrimaryExtracted;

        let subordinates = self.subordinates(article, &anchors[index + 1..], &primary)?;
        *stage = Stage::SubordinatesExtracted;

        let related = self.related(&selector, article, &anchors[index + 1..])?;
        *stage = Stage::RelatedExtracted;

        primary.subordinate_resources = subordinates.iter().map(Resource::package).collect();
        primary.related_resources = related.iter().map(Resource::package).collect();
        *stage = Stage::Done;

        let mut resources = Vec::with_capacity(1 + subordinates.len() + related.len());
        resources.push(primary);
        resources.extend(subordinates);
        resources.extend(related);
        Ok(Outcome::Extracted(resources))
    }

    /// Reconcile the anchor's text with the article title.
    pub fn titles<P: ResourceParser + ?Sized>(
        &self,
        parser: &P,
        article: &Article,
        anchor: &Anchor<'_>,
    ) -> Result<Titles, ParseError> {
        let anchor_title = clean_title(&anchor.text);
        parser
            .reconcile_titles(
                &self.reconciler(),
                Some(&anchor_title),
                Some(&article.title),
            )
            .ok_or(ParseError::MissingTitle)
    }

    /// The resource an article is about, read from the top of its body.
    pub fn post_resource(
        &self,
        article: &Article,
        anchor: &Anchor<'_>,
        titles: Titles,
    ) -> Result<Resource, ParseError> {
        let keywords = self.miner().keywords(
            [Some(article.title.as_str()), Some(titles.longest())],
            &article.categories,
            &article.title,
        )?;
        let Titles { title, extended } = titles;
        let description = describe_primary(&article.body, &title).unwrap_or_else(|| {
            warn!(article = %article.url, "no primary description; using title");
            title.clone()
        });

        let mut resource = Resource::new(&anchor.url, title);
        resource.authors = people(&RX_AUTHORS, &description);
        resource.editors = people(&RX_EDITORS, &description);
        resource.identifiers = extract_identifiers(Some(&description));
        resource.languages = self
            .language(&[
                Some(resource.title.as_str()),
                extended.as_deref(),
                Some(description.as_str()),
            ])
            .into_iter()
            .collect();
        resource.title_extended = extended;
        resource.description = Some(description);
        resource.keywords = keywords;
        self.cite_article(&mut resource, article, None);
        Ok(resource)
    }

    /// Subordinates of `parent`: anchors on the parent's domain, each titled by its context.
    pub fn subordinates(
        &self,
        article: &Article,
        anchors: &[Anchor<'_>],
        parent: &Resource,
    ) -> Result<Vec<Resource>, ParseError> {
        let package = parent.parent_package();
        let mut resources = Vec::new();
        for anchor in anchors.iter().filter(|a| a.domain == parent.domain) {
            let Some(mut resource) = self.item_resource(article, anchor, Some(&package))? else {
                continue;
            };
            if let Some(analytic) = parse_analytic_title(&resource.title) {
                resource.volume = analytic.volume;
                resource.issue = analytic.issue;
                resource.year = analytic.year;
            }
            if wants_list_year(&resource) {
                resource.year = enclosing_li(anchor.node).and_then(|li| leading_year(&text_of(li)));
            }
            resources.push(resource);
        }
        debug!(article = %article.id, count = resources.len(), "subordinate resources");
        Ok(resources)
    }

    /// Posts on the blog itself that the article links to.
    pub fn related(
        &self,
        selector: &AnchorSelector<'_>,
        article: &Article,
        anchors: &[Anchor<'_>],
    ) -> Result<Vec<Resource>, ParseError> {
        let mut resources = Vec::new();
        for anchor in anchors.iter().filter(|a| selector.is_self(a)) {
            if let Some(resource) = self.item_resource(article, anchor, None)? {
                resources.push(resource);
            }
        }
        Ok(resources)
    }

    /// A subordinate or related resource. `None` when its context yields no title.
    fn item_resource(
        &self,
        article: &Article,
        anchor: &Anchor<'_>,
        parent: Option<&ResourcePackage>,
    ) -> Result<Option<Resource>, ParseError> {
        let context = title_context(anchor);
        let title = clean_title(&text_of(context));
        if title.is_empty() {
            warn!(article = %article.id, url = %anchor.url, "anchor context has no title");
            return Ok(None);
        }
        // Subordinates read on from the very next node; related posts from the next content.
        let next = match parent {
            Some(_) => context.next_sibling(),
            None => next_content(context),
        };
        let description = next
            .and_then(|next| describe(next, &title, false))
            .unwrap_or_else(|| title.clone());

        let mut resource = Resource::new(&anchor.url, title);
        resource.identifiers = extract_identifiers(Some(&description));
        resource.languages = self
            .language(&[Some(resource.title.as_str()), Some(description.as_str())])
            .into_iter()
            .collect();
        resource.keywords = self
            .miner()
            .keywords([Some(resource.title.as_str())], &[], &article.title)?;
        resource.description = Some(description);
        resource.is_part_of = parent.cloned();
        self.cite_article(&mut resource, article, None);
        Ok(Some(resource))
    }

    /// Language of the given texts taken together.
    pub fn language(&self, parts: &[Option<&str>]) -> Option<String> {
        let text = normalize_ws(&parts.iter().flatten().copied().collect::<Vec<_>>().join(" "));
        detect(self.classifier, &text, self.config.language.threshold)
    }

    /// Record that `resource` was read from `article`. `fields` defaults to every populated
    /// field.
    pub fn cite_article(&self, resource: &mut Resource, article: &Article, fields: Option<Vec<String>>) {
        let fields = fields.unwrap_or_else(|| resource.populated_fields());
        resource.set_provenance(
            article.id.as_str(),
            ProvenanceVerb::CitesAsDataSource,
            article.updated.clone(),
            Some(fields),
        );
        resource.set_provenance(
            article.url.as_str(),
            ProvenanceVerb::CitesAsMetadataDocument,
            article.updated.clone(),
            None,
        );
    }
}

/// Names introduced by a phrase such as "edited by", split on commas and "and".
fn people(rx: &Regex, text: &str) -> Vec<String> {
    let Some(raw) = rx.captures(text).and_then(|c| c.get(2)) else {
        return Vec::new();
    };
    raw.as_str()
        .split(',')
        .flat_map(|chunk| chunk.split(" and "))
        .map(normalize_ws)
        .filter(|name| !name.is_empty())
        .collect()
}

/// A year opening a list item, as in "2011: Vol. 3, Nr. 1 | Vol. 3, Nr. 2".
/// An issue with volume and number but no year takes the year its list item starts with.
fn wants_list_year(resource: &Resource) -> bool {
    resource.volume.is_some() && resource.issue.is_some() && resource.year.is_none()
}

fn leading_year(text: &str) -> Option<String> {
    let head: String = text.trim().chars().take(4).collect();
    (head.len() == 4 && head.chars().all(|c| c.is_ascii_digit()) && !head.starts_with('0'))
        .then_some(head)
}
