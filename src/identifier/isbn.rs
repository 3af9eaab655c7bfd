use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::identifier::IdentifierFamily;

static ELECTRONIC: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(electronic|e-|online|on-line|digital)([\s:]*isbn[^\d]*[\dX\-]+)",
        r"(?i)(isbn[\s(]*)(electrónico|électronique|online|on-line|digital)([^\d]*[\dX\-]+)",
        r"(?i)(isbn[^\d]*[\dX\-]+[\s(]*)(electrónico|électronique|online|on-line|digital)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static GENERIC: Lazy<Vec<Regex>> =
    Lazy::new(|| vec![Regex::new(r"(?i)isbn[^\d]*[\dX\-]+").unwrap()]);

static PRECISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[^\d]*([\dX\-]+)").unwrap());

// "ISBN-13:" would otherwise read as the number 13.
static LENGTH_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)isbn[\s\-]?1[03]\b").unwrap());

/// International Standard Book Number.
pub struct Isbn;

impl IdentifierFamily for Isbn {
    const NAME: &'static str = "isbn";

    fn electronic() -> &'static [Regex] {
        &ELECTRONIC
    }

    fn generic() -> &'static [Regex] {
        &GENERIC
    }

    fn precise() -> &'static Regex {
        &PRECISE
    }

    fn prepare(text: &str) -> Cow<'_, str> {
        LENGTH_LABEL.replace_all(text, "isbn")
    }

    fn canonicalize(raw: &str) -> String {
        raw.trim().trim_matches('-').to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_labels_are_dropped() {
        assert_eq!(Isbn::prepare("isbn-13: 978"), "isbn: 978");
        assert_eq!(Isbn::prepare("isbn 10 1-88"), "isbn 1-88");
        assert_eq!(Isbn::prepare("isbn 1088"), "isbn 1088");
    }

    #[test]
    fn online_isbn_is_electronic() {
        let ids = crate::identifier::extract_identifiers(Some("Online ISBN: 978-3-11-041847-0"));
        let isbn = &ids["isbn"];
        assert!(isbn[&crate::identifier::IdentifierVariant::Electronic].contains("978-3-11-041847-0"));
        assert!(!isbn.contains_key(&crate::identifier::IdentifierVariant::Generic));
    }
}
