//! Extraction strategies.
//!
//! Most posts go through the [`Generic`] pipeline. Sites whose posts follow a house style of
//! their own get a variant that overrides how the primary anchor is picked, how its title is
//! reconciled, or the whole walk. Variants are chosen per domain by the
//! [`DomainRouter`](crate::router::DomainRouter).

use tracing::warn;

use crate::{
    article::Article,
    config::Config,
    dom::{Anchor, AnchorSelector},
    error::ParseError,
    extract::{Outcome, ResourceExtractor},
    titles::{TitleReconciler, Titles},
};

pub mod curated;
pub mod generic;
pub mod primary_filter;
pub mod roster;
pub mod single;

pub use curated::Curated;
pub use generic::Generic;
pub use primary_filter::PrimaryFilter;
pub use roster::Roster;
pub use single::Single;

pub trait ResourceParser {
    /// Name used in logs and by the `domains` command.
    fn name(&self) -> &str;

    /// Urls that never count as anchors in posts handled by this parser.
    fn skip_urls(&self) -> &[String] {
        &[]
    }

    /// Index into `anchors` of the primary resource's link.
    fn select_primary_anchor(
        &self,
        selector: &AnchorSelector<'_>,
        anchors: &[Anchor<'_>],
    ) -> Result<usize, ParseError> {
        selector.next_valid(anchors, 0)
    }

    fn reconcile_titles(
        &self,
        reconciler: &TitleReconciler<'_>,
        anchor_title: Option<&str>,
        article_title: Option<&str>,
    ) -> Option<Titles> {
        reconciler.reconcile(anchor_title, article_title)
    }

    fn get_resources(
        &self,
        extractor: &ResourceExtractor<'_>,
        article: &Article,
    ) -> Result<Outcome, ParseError> {
        extractor.run(self, article)
    }
}

/// The parser a `[variants.<domain>]` table asks for.
pub fn for_variant<'c>(config: &'c Config, domain: &'c str) -> Box<dyn ResourceParser + 'c> {
    let Some(variant) = config.variants.get(domain) else {
        return Box::new(Curated::new(config, domain));
    };
    match variant.parser.as_str() {
        "" | "generic" | "curated" => Box::new(Curated::new(config, domain)),
        "single" | "generic-single" => Box::new(Single::with_skip_urls(&variant.skip_urls)),
        "primary-filter" => Box::new(PrimaryFilter::new(domain, variant)),
        "roster" => Box::new(Roster::new(domain, variant)),
        other => {
            warn!(%domain, parser = other, "unknown parser; using the generic pipeline");
            Box::new(Curated::new(config, domain))
        }
    }
}
