//! The generic pipeline corrected by per-domain exception tables.

use tracing::debug;

use super::ResourceParser;
use crate::{
    config::{AnchorOverride, Config, TitleOverride},
    dom::{Anchor, AnchorSelector},
    error::ParseError,
    titles::{TitleReconciler, Titles},
};

pub struct Curated<'c> {
    domain: &'c str,
    skip_urls: &'c [String],
    titles: Vec<&'c TitleOverride>,
    anchors: Vec<&'c AnchorOverride>,
}

impl<'c> Curated<'c> {
    pub fn new(config: &'c Config, domain: &'c str) -> Self {
        Self {
            domain,
            skip_urls: config
                .variants
                .get(domain)
                .map_or(&[][..], |v| v.skip_urls.as_slice()),
            titles: config
                .title_overrides
                .iter()
                .filter(|o| o.domain.eq_ignore_ascii_case(domain))
                .collect(),
            anchors: config
                .primary_anchor_overrides
                .iter()
                .filter(|o| o.domain.eq_ignore_ascii_case(domain))
                .collect(),
        }
    }
}

impl ResourceParser for Curated<'_> {
    fn name(&self) -> &str {
        self.domain
    }

    fn skip_urls(&self) -> &[String] {
        self.skip_urls
    }

    fn select_primary_anchor(
        &self,
        selector: &AnchorSelector<'_>,
        anchors: &[Anchor<'_>],
    ) -> Result<usize, ParseError> {
        let index = selector.next_valid(anchors, 0)?;
        let swapped = self
            .anchors
            .iter()
            .find(|o| o.from == anchors[index].url)
            .and_then(|o| anchors.iter().position(|a| a.url == o.to));
        if let Some(swapped) = swapped {
            debug!(from = %anchors[index].url, to = %anchors[swapped].url, "primary anchor override");
            return Ok(swapped);
        }
        Ok(index)
    }

    fn reconcile_titles(
        &self,
        reconciler: &TitleReconciler<'_>,
        anchor_title: Option<&str>,
        article_title: Option<&str>,
    ) -> Option<Titles> {
        if let (Some(anchor), Some(article)) = (anchor_title, article_title)
            && self.titles.iter().any(|o| {
                o.anchor_title.to_lowercase() == anchor.to_lowercase()
                    && o.article_title.to_lowercase() == article.to_lowercase()
            })
        {
            return Some(Titles::new(article));
        }
        reconciler.reconcile(anchor_title, article_title)
    }
}
