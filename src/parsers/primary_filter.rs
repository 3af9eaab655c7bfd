use super::ResourceParser;
use crate::{
    config::VariantConfig,
    dom::{Anchor, AnchorSelector},
    error::ParseError,
};

/// Keeps known non-resource links from being taken for the primary resource.
///
/// Sites that announce their publications through a bookseller, or open a post with a link to
/// their news page, list those under `never_primary_domains` and `never_primary_urls`. When no
/// anchor survives, the first valid one is used after all.
pub struct PrimaryFilter<'c> {
    domain: &'c str,
    variant: &'c VariantConfig,
}

impl<'c> PrimaryFilter<'c> {
    pub fn new(domain: &'c str, variant: &'c VariantConfig) -> Self {
        Self { domain, variant }
    }

    fn may_be_primary(&self, anchor: &Anchor<'_>) -> bool {
        !self
            .variant
            .never_primary_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(&anchor.domain))
            && !self.variant.never_primary_urls.contains(&anchor.url)
    }
}

impl ResourceParser for PrimaryFilter<'_> {
    fn name(&self) -> &str {
        self.domain
    }

    fn skip_urls(&self) -> &[String] {
        &self.variant.skip_urls
    }

    fn select_primary_anchor(
        &self,
        selector: &AnchorSelector<'_>,
        anchors: &[Anchor<'_>],
    ) -> Result<usize, ParseError> {
        match anchors
            .iter()
            .position(|a| selector.is_resource(a) && self.may_be_primary(a))
        {
            Some(index) => Ok(index),
            None => selector.next_valid(anchors, 0),
        }
    }
}
