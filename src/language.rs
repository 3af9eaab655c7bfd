//! Language identification of titles and descriptions.

use tracing::trace;

/// Anything that can guess the language of a text with a confidence in `[0, 1]`.
pub trait LanguageClassifier {
    fn classify(&self, text: &str) -> Option<(String, f64)>;
}

/// Classifier backed by `whatlang`, reporting two-letter codes where one exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangClassifier;

/// ISO 639-3 to ISO 639-1 for the languages that turn up in the blog.
const TWO_LETTER: &[(&str, &str)] = &[
    ("ara", "ar"),
    ("ces", "cs"),
    ("deu", "de"),
    ("ell", "el"),
    ("eng", "en"),
    ("fra", "fr"),
    ("heb", "he"),
    ("hrv", "hr"),
    ("ita", "it"),
    ("nld", "nl"),
    ("pol", "pl"),
    ("por", "pt"),
    ("rus", "ru"),
    ("spa", "es"),
    ("srp", "sr"),
    ("tur", "tr"),
];

impl LanguageClassifier for WhatlangClassifier {
    fn classify(&self, text: &str) -> Option<(String, f64)> {
        let info = whatlang::detect(text)?;
        let code = info.lang().code();
        let code = TWO_LETTER
            .iter()
            .find(|(three, _)| *three == code)
            .map_or(code, |(_, two)| two);
        Some((code.to_string(), info.confidence()))
    }
}

/// The language of `text` if the classifier is at least `threshold` confident.
pub fn detect(classifier: &dyn LanguageClassifier, text: &str, threshold: f64) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let (code, confidence) = classifier.classify(text)?;
    trace!(%code, confidence, "language guess");
    (confidence >= threshold).then_some(code)
}
