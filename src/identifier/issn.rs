use once_cell::sync::Lazy;
use regex::Regex;

use crate::identifier::IdentifierFamily;

static ELECTRONIC: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(e-|e)(issn[\s:\-]*[\dX]{4}[\-\s]+[\dX]{4})",
        r"(?i)(electronic|online|on-line|digital|internet)([\s:]*issn[^\d]*[\dX]{4}[\-\s]+[\dX]{4})",
        r"(?i)(issn[\s(\-]*)(electrónico|électronique|online|on-line|digital|internet)([^\d]*[\dX]{4}[\-\s]+[\dX]{4})",
        r"(?i)(issn[^\d]*[\dX]{4}[\-\s]+[\dX]{4}[\s(]*)(electrónico|électronique|online|on-line|digital)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static GENERIC: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)issn[^\d]*[\dX]{4}[\-\s]+[\dX]{4}",
        r"(?i)issn[^\d]*[\dX\-\s]{8,11}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static PRECISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[^\d]*([\dX]{4}[\-\s]+[\dX]{4})").unwrap());
static FALLBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[^\d]*([\dX\-\s]+)").unwrap());

/// International Standard Serial Number.
pub struct Issn;

impl IdentifierFamily for Issn {
    const NAME: &'static str = "issn";

    fn electronic() -> &'static [Regex] {
        &ELECTRONIC
    }

    fn generic() -> &'static [Regex] {
        &GENERIC
    }

    fn precise() -> &'static Regex {
        &PRECISE
    }

    fn fallback() -> Option<&'static Regex> {
        Some(&FALLBACK)
    }

    /// `NNNN-NNNN`, with an upper-case check digit.
    fn canonicalize(raw: &str) -> String {
        let raw = raw.trim().to_uppercase();
        let compact: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == 'X')
            .collect();
        if compact.len() == 8 {
            format!("{}-{}", &compact[..4], &compact[4..])
        } else {
            raw.replace(' ', "-")
        }
    }
}
