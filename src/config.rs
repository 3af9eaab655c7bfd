//! Lookup tables that steer extraction.
//!
//! The tables live in a TOML document. The one shipped in `config/awol.toml` is compiled into the
//! binary and used unless another file is given on the command line. A [`RawConfig`] mirrors the
//! document; [`Config`] is the compiled form handed to every component.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs,
    path::Path,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, text::normalize_ws};

const BUILTIN: &str = include_str!("../config/awol.toml");

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RawConfig {
    pub language: LanguageConfig,
    pub anchors: AnchorConfig,
    pub titles: RawTitleConfig,
    pub colon_prefix: Vec<ColonPrefix>,
    pub keywords: BTreeMap<String, String>,
    pub routing: RoutingConfig,
    pub biblio_source: Vec<RawBiblioSource>,
    pub primary_anchor_override: Vec<AnchorOverride>,
    pub title_override: Vec<TitleOverride>,
    pub variants: BTreeMap<String, VariantConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Minimum classifier confidence for a language to be assigned.
    pub threshold: f64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self { threshold: 0.98 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnchorConfig {
    /// Link targets that never describe a resource.
    pub ignore_domains: Vec<String>,
    /// The blog's own hosts. Links to them are related resources, never primary ones.
    pub self_domains: Vec<String>,
    pub ignore_text: Vec<String>,
    pub ignore_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RawTitleConfig {
    pub omit: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ColonPrefix {
    pub prefix: String,
    /// Posts whose title carries this prefix describe no resource.
    pub omit_post: bool,
    /// Drop the prefix and the colon from the title.
    pub strip_title: bool,
    /// The post lists several resources of equal rank.
    pub multiple_resources: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// Domains whose posts always describe exactly one resource.
    pub single_resource_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RawBiblioSource {
    pub domain: String,
    pub url_pattern: String,
    pub url_suffix: String,
    pub content_type: String,
    /// Local element names leading from the document root to the payload.
    pub payload: Vec<String>,
    pub date_pattern: Option<String>,
    pub id_field: Option<String>,
    pub field_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AnchorOverride {
    pub domain: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TitleOverride {
    pub domain: String,
    pub anchor_title: String,
    pub article_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VariantConfig {
    /// Which parser handles the domain: `generic`, `single`, `curated`, `primary-filter` or
    /// `roster`.
    pub parser: String,
    pub skip_urls: Vec<String>,
    pub never_primary_domains: Vec<String>,
    pub never_primary_urls: Vec<String>,
    /// Articles handled by the roster walk; every other article falls back to the generic
    /// pipeline.
    pub article_urls: Vec<String>,
}

/// Compiled configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub language: LanguageConfig,
    pub anchors: AnchorConfig,
    pub titles: TitleTable,
    pub keywords: KeywordTable,
    pub routing: RoutingConfig,
    pub biblio_sources: Vec<BiblioSource>,
    pub primary_anchor_overrides: Vec<AnchorOverride>,
    pub title_overrides: Vec<TitleOverride>,
    pub variants: BTreeMap<String, VariantConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct TitleTable {
    /// Lower-cased titles of posts that describe no resource.
    pub omit: HashSet<String>,
    /// Lower-cased, whitespace-normalized prefix to its flags.
    pub colon_prefixes: HashMap<String, ColonPrefix>,
}

#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    /// Single-word keys.
    pub terms: BTreeMap<String, String>,
    /// Multi-word keys, matched as substrings.
    pub phrases: BTreeMap<String, String>,
    /// Every registered tag, split on commas.
    pub tags: HashSet<String>,
}

impl KeywordTable {
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.terms
            .get(key)
            .or_else(|| self.phrases.get(key))
            .map(String::as_str)
    }

    pub fn is_registered(&self, keyword: &str) -> bool {
        self.tags.contains(keyword)
            || self.terms.contains_key(&keyword.to_lowercase())
            || self.phrases.contains_key(&keyword.to_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct BiblioSource {
    pub domain: String,
    pub url_pattern: Regex,
    pub url_suffix: String,
    pub content_type: String,
    pub payload: Vec<String>,
    pub date_pattern: Option<Regex>,
    pub id_field: Option<String>,
    pub field_map: BTreeMap<String, String>,
}

impl Config {
    /// The configuration compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(BUILTIN)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn from_toml(doc: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(doc)?;
        Self::compile(raw)
    }

    pub fn compile(raw: RawConfig) -> Result<Self, ConfigError> {
        let titles = TitleTable {
            omit: raw
                .titles
                .omit
                .iter()
                .map(|t| normalize_ws(t).to_lowercase())
                .collect(),
            colon_prefixes: raw
                .colon_prefix
                .into_iter()
                .map(|p| (normalize_ws(&p.prefix).to_lowercase(), p))
                .collect(),
        };

        let mut keywords = KeywordTable::default();
        for (key, tag) in raw.keywords {
            let key = normalize_ws(&key).to_lowercase();
            keywords
                .tags
                .extend(tag.split(',').map(normalize_ws).filter(|t| !t.is_empty()));
            if key.contains(' ') {
                keywords.phrases.insert(key, tag);
            } else {
                keywords.terms.insert(key, tag);
            }
        }

        let biblio_sources = raw
            .biblio_source
            .into_iter()
            .map(|s| {
                let url_pattern = Regex::new(&s.url_pattern).map_err(|source| ConfigError::Regex {
                    table: "biblio_source.url_pattern",
                    source,
                })?;
                let date_pattern = s
                    .date_pattern
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|source| ConfigError::Regex {
                        table: "biblio_source.date_pattern",
                        source,
                    })?;
                Ok(BiblioSource {
                    domain: s.domain.to_lowercase(),
                    url_pattern,
                    url_suffix: s.url_suffix,
                    content_type: s.content_type,
                    payload: s.payload,
                    date_pattern,
                    id_field: s.id_field,
                    field_map: s.field_map,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            language: raw.language,
            anchors: AnchorConfig {
                ignore_domains: lowercase_all(raw.anchors.ignore_domains),
                self_domains: lowercase_all(raw.anchors.self_domains),
                ignore_text: raw.anchors.ignore_text,
                ignore_urls: raw.anchors.ignore_urls,
            },
            titles,
            keywords,
            routing: RoutingConfig {
                single_resource_domains: lowercase_all(raw.routing.single_resource_domains),
            },
            biblio_sources,
            primary_anchor_overrides: raw.primary_anchor_override,
            title_overrides: raw.title_override,
            variants: raw
                .variants
                .into_iter()
                .map(|(domain, v)| (domain.to_lowercase(), v))
                .collect(),
        })
    }

    /// Domains of structured bibliographic sources.
    pub fn bibliographic_domains(&self) -> impl Iterator<Item = &str> {
        self.biblio_sources.iter().map(|s| s.domain.as_str())
    }

    pub fn biblio_source(&self, domain: &str) -> Option<&BiblioSource> {
        self.biblio_sources.iter().find(|s| s.domain == domain)
    }
}

fn lowercase_all(v: Vec<String>) -> Vec<String> {
    v.into_iter().map(|s| s.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_compiles() {
        let cfg = Config::builtin().expect("builtin config");
        assert_eq!(cfg.language.threshold, 0.98);
        assert!(cfg.anchors.self_domains.contains(&"ancientworldonline.blogspot.com".to_string()));
        assert!(cfg.titles.omit.contains("administrative note"));
        assert!(cfg.titles.colon_prefixes["journal"].strip_title);
        assert!(cfg.biblio_source("zenon.dainst.org").is_some());
        assert_eq!(cfg.keywords.lookup("journal"), Some("journal"));
    }

    #[test]
    fn keyword_keys_are_split_into_terms_and_phrases() {
        let cfg = Config::from_toml(
            r#"
            [keywords]
            "Numismatics" = "numismatics"
            "cultural heritage" = "cultural heritage, heritage"
            "italia" = "Italy"
            "#,
        )
        .expect("config");
        assert_eq!(cfg.keywords.terms.get("numismatics").map(String::as_str), Some("numismatics"));
        assert!(cfg.keywords.phrases.contains_key("cultural heritage"));
        assert!(cfg.keywords.tags.contains("heritage"));
        assert!(cfg.keywords.is_registered("Italy"));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = Config::from_toml(
            r#"
            [[biblio_source]]
            domain = "example.org"
            url_pattern = "("
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Regex { .. }));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = Config::from_toml("").expect("config");
        assert_eq!(cfg.language.threshold, 0.98);
        assert!(cfg.keywords.terms.is_empty());
    }
}
