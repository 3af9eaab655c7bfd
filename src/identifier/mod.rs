//! Standard identifiers (ISSN, ISBN) mentioned in free text.
//!
//! Each family knows the token that announces it, the patterns that find a labelled or unlabelled
//! number next to that token and how to reduce a match to the bare number.

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod isbn;
pub mod issn;

use isbn::Isbn;
use issn::Issn;

/// Whether an identifier names an electronic manifestation or is unqualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierVariant {
    Electronic,
    Generic,
}

pub type Variants = BTreeMap<IdentifierVariant, BTreeSet<String>>;

/// Identifier family (`issn`, `isbn`, `uri`, ...) to its variants.
///
/// A family is only present when at least one variant holds a value.
pub type Identifiers = BTreeMap<String, Variants>;

pub trait IdentifierFamily {
    /// Family key, also the token that must occur in the lower-cased text.
    const NAME: &'static str;

    /// Patterns matching a number qualified as electronic.
    fn electronic() -> &'static [Regex];
    /// Patterns matching any number introduced by the family token.
    fn generic() -> &'static [Regex];
    /// Reduces a pattern match to the number itself.
    fn precise() -> &'static Regex;
    fn fallback() -> Option<&'static Regex> {
        None
    }

    /// Rewrite the lower-cased text before matching.
    fn prepare(text: &str) -> Cow<'_, str> {
        Cow::Borrowed(text)
    }

    fn canonicalize(raw: &str) -> String {
        raw.trim().trim_matches('-').to_string()
    }

    /// A number classified as electronic is not also generic.
    fn post_process(variants: &mut Variants) {
        if let Some(electronic) = variants.get(&IdentifierVariant::Electronic).cloned()
            && let Some(generic) = variants.get_mut(&IdentifierVariant::Generic)
        {
            generic.retain(|id| !electronic.contains(id));
            if generic.is_empty() {
                variants.remove(&IdentifierVariant::Generic);
            }
        }
    }
}

type FamilyFn = fn(&str) -> Option<Variants>;

/// Families tried on every text, keyed by name.
static FAMILIES: &[(&str, FamilyFn)] = &[
    (Issn::NAME, extract_family::<Issn>),
    (Isbn::NAME, extract_family::<Isbn>),
];

/// Find every identifier mentioned in `text`.
pub fn extract_identifiers(text: Option<&str>) -> Identifiers {
    let Some(text) = text else {
        return Identifiers::new();
    };
    let lower = text.to_lowercase();
    FAMILIES
        .iter()
        .filter_map(|(name, extract)| extract(&lower).map(|v| (name.to_string(), v)))
        .collect()
}

fn extract_family<F: IdentifierFamily>(lower: &str) -> Option<Variants> {
    let text = F::prepare(lower);
    if !text.contains(F::NAME) {
        return None;
    }

    let mut variants = Variants::new();
    for (variant, patterns) in [
        (IdentifierVariant::Electronic, F::electronic()),
        (IdentifierVariant::Generic, F::generic()),
    ] {
        let found: BTreeSet<String> = patterns
            .iter()
            .flat_map(|rx| rx.find_iter(&text))
            .filter_map(|m| reduce::<F>(m.as_str()))
            .map(|raw| F::canonicalize(&raw))
            .filter(|id| !id.is_empty())
            .collect();
        if !found.is_empty() {
            variants.insert(variant, found);
        }
    }

    if variants.is_empty() {
        warn!(family = F::NAME, text = %text, "expected but failed to match identifier");
        return None;
    }
    F::post_process(&mut variants);
    Some(variants)
}

fn reduce<F: IdentifierFamily>(candidate: &str) -> Option<String> {
    F::precise()
        .captures(candidate)
        .or_else(|| F::fallback().and_then(|rx| rx.captures(candidate)))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Add `id` to `identifiers[family][variant]`.
pub fn insert(identifiers: &mut Identifiers, family: &str, variant: IdentifierVariant, id: String) {
    identifiers
        .entry(family.to_string())
        .or_default()
        .entry(variant)
        .or_default()
        .insert(id);
}

/// The first identifier of a family, electronic before generic.
pub fn preferred<'a>(identifiers: &'a Identifiers, family: &str) -> Option<&'a str> {
    let variants = identifiers.get(family)?;
    [IdentifierVariant::Electronic, IdentifierVariant::Generic]
        .iter()
        .find_map(|v| variants.get(v).and_then(|ids| ids.iter().next()))
        .map(String::as_str)
}
