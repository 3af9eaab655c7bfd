use std::collections::BTreeSet;

use crate::{article::Category, config::KeywordTable, error::ParseError, text::normalize_ws};

/// Category term Blogger attaches to every entry.
const POST_KIND: &str = "kind#post";

/// Maps titles and post categories onto the controlled tag vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct KeywordMiner<'c> {
    table: &'c KeywordTable,
}

impl<'c> KeywordMiner<'c> {
    pub fn new(table: &'c KeywordTable) -> Self {
        Self { table }
    }

    /// Raw tags found in free text, before cleaning.
    pub fn mine<'t>(&self, texts: impl IntoIterator<Item = Option<&'t str>>) -> Vec<String> {
        let mut tags = Vec::new();
        for text in texts.into_iter().flatten() {
            let lower = text.to_lowercase();
            let tokens: BTreeSet<&str> = lower
                .split_whitespace()
                .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
                .filter(|t| !t.is_empty())
                .collect();

            tags.extend(
                tokens
                    .iter()
                    .filter_map(|t| self.table.terms.get(*t))
                    .cloned(),
            );

            if tokens.contains("open") && tokens.contains("access") {
                if !tokens.contains("partial") {
                    tags.push("open access".to_string());
                } else if lower.contains("partial open access") {
                    tags.push("mixed access".to_string());
                }
            }
            if tokens.contains("series") && !tokens.contains("lecture") {
                tags.push("series".to_string());
            }

            tags.extend(
                self.table
                    .phrases
                    .iter()
                    .filter(|(phrase, _)| lower.contains(phrase.as_str()))
                    .map(|(_, tag)| tag.clone()),
            );
        }
        tags
    }

    /// Keywords for a resource: tags mined from `texts` plus the post's categories.
    ///
    /// `post_title` only labels errors.
    pub fn keywords<'t>(
        &self,
        texts: impl IntoIterator<Item = Option<&'t str>>,
        categories: &[Category],
        post_title: &str,
    ) -> Result<Vec<String>, ParseError> {
        let mut tags = self.mine(texts);
        for category in categories {
            let term = normalize_ws(&category.term).to_lowercase();
            if term.contains(POST_KIND) {
                continue;
            }
            match self.table.lookup(&term) {
                Some(tag) => tags.push(tag.to_string()),
                None => {
                    return Err(ParseError::UnmappedCategory {
                        term: category.term.clone(),
                        title: post_title.to_string(),
                    });
                }
            }
        }
        self.clean(tags)
    }

    /// Split, deduplicate and validate raw tags, sorted case-insensitively.
    pub fn clean(&self, raw: Vec<String>) -> Result<Vec<String>, ParseError> {
        let mut keywords: Vec<String> = raw
            .iter()
            .flat_map(|tag| tag.split(','))
            .map(normalize_ws)
            .filter(|kw| !kw.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        keywords.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

        if let Some(bad) = keywords.iter().find(|kw| {
            **kw != kw.to_uppercase() && **kw != kw.to_lowercase() && !self.table.is_registered(kw)
        }) {
            return Err(ParseError::InvalidKeyword(bad.clone()));
        }
        Ok(keywords)
    }
}
