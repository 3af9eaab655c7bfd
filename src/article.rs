//! Blog posts as read from Atom entries.

use std::{fs, path::Path};

use scraper::Html;
use tracing::warn;

use crate::{
    error::ArticleError,
    text::{normalize, purify_html},
    xml::{self, XmlElement},
};

/// A post category: Blogger labels carry the Atom scheme as vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub vocabulary: Option<String>,
    pub term: String,
}

/// One blog post, read-only once loaded.
#[derive(Debug, Clone)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    pub updated: Option<String>,
    pub categories: Vec<Category>,
    pub body: Html,
}

impl Article {
    /// Build an article from already extracted parts. The markup is sanitized before parsing.
    pub fn from_html(
        id: impl Into<String>,
        title: &str,
        url: impl Into<String>,
        categories: Vec<Category>,
        html: &str,
    ) -> Self {
        Self {
            id: id.into(),
            title: normalize(title),
            url: url.into(),
            updated: None,
            categories,
            body: Html::parse_document(&purify_html(html)),
        }
    }

    /// Read every entry of an Atom document, which may be a single `<entry>` or a `<feed>`.
    pub fn from_atom_str(doc: &str) -> Result<Vec<Self>, ArticleError> {
        let root = xml::parse(doc)?.ok_or(ArticleError::MissingElement("entry"))?;
        match root.name.as_str() {
            "entry" => Ok(vec![Self::from_entry(&root)?]),
            "feed" => root.children_named("entry").map(Self::from_entry).collect(),
            _ => Err(ArticleError::MissingElement("entry")),
        }
    }

    pub fn from_path(path: &Path) -> Result<Vec<Self>, ArticleError> {
        let doc = fs::read_to_string(path).map_err(|source| ArticleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_atom_str(&doc)
    }

    fn from_entry(entry: &XmlElement) -> Result<Self, ArticleError> {
        let id = entry
            .child("id")
            .map(XmlElement::text)
            .filter(|id| !id.is_empty())
            .ok_or(ArticleError::MissingElement("id"))?;
        let content = entry
            .child("content")
            .ok_or(ArticleError::MissingElement("content"))?
            .text();
        let title = entry.child("title").map(XmlElement::text).unwrap_or_default();
        let url = entry
            .children_named("link")
            .find(|l| l.attr("rel") == Some("alternate"))
            .and_then(|l| l.attr("href"))
            .map(str::to_string)
            .unwrap_or_else(|| {
                warn!(%id, "entry has no alternate link");
                String::new()
            });
        let categories = entry
            .children_named("category")
            .filter_map(|c| {
                Some(Category {
                    vocabulary: c.attr("scheme").map(str::to_string),
                    term: c.attr("term")?.to_string(),
                })
            })
            .collect();

        let mut article = Self::from_html(id, &title, url, categories, &content);
        article.updated = entry
            .child("updated")
            .map(XmlElement::text)
            .filter(|u| !u.is_empty());
        Ok(article)
    }
}
