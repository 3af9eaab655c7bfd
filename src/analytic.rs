//! Volume, issue and year from the conventional titles of journal issues.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analytic {
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub year: Option<String>,
}

/// A title pattern and the capture group holding each field.
struct Template {
    rx: Regex,
    volume: Option<usize>,
    issue: Option<usize>,
    year: Option<usize>,
}

impl Template {
    fn new(rx: &str, volume: Option<usize>, issue: Option<usize>, year: Option<usize>) -> Self {
        Self {
            rx: Regex::new(rx).unwrap(),
            volume,
            issue,
            year,
        }
    }
}

/// NOTE: Ordering is important here. Templates capturing more fields come first, so that a
/// general template never reads a volume number as a year or the other way round.
static TEMPLATES: Lazy<Vec<Template>> = Lazy::new(|| {
    vec![
        // Bd. 52, Nr. 1 (2005)
        Template::new(
            r"(?i)^Bd\.\s+(\d+),?\s+Nr\.\s+(\d+)\s+\(?(\d{4})\)?$",
            Some(1),
            Some(2),
            Some(3),
        ),
        // 1888 Mitteilungen des Deutschen Archäologischen Instituts / Römische Abteilung Band 3
        Template::new(r"(?i)^(\d{4})[^\d]+Band (\d+)$", Some(2), None, Some(1)),
        // University Museums and Collections Journal 4/2011
        Template::new(r"^[^\d]*(\d+)/(\d{4})[^\d]*$", Some(1), None, Some(2)),
        // 2011 12
        Template::new(r"^[^\d]*(\d{4})\W*([\d\-]+)[^\d]*$", Some(2), None, Some(1)),
        // Vol. 4 (2011)
        Template::new(r"^[^\d]*([\d\-]{1,4})\W*(\d{4})[^\d]*$", Some(1), None, Some(2)),
        // 2011
        Template::new(r"^[^\d]*(\d{4})[^\d]*$", None, None, Some(1)),
        // Volume 12
        Template::new(r"^[^\d]*([\d\-]+)[^\d]*$", Some(1), None, None),
    ]
});

/// Parse an issue title, or `None` when it does not look like one.
pub fn parse_analytic_title(title: &str) -> Option<Analytic> {
    TEMPLATES.iter().find_map(|t| {
        let caps = t.rx.captures(title)?;
        let group = |i: Option<usize>| i.and_then(|i| caps.get(i)).map(|m| m.as_str().to_string());
        Some(Analytic {
            volume: group(t.volume),
            issue: group(t.issue),
            year: group(t.year),
        })
    })
}
