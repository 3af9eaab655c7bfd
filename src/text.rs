//! Canonical text forms shared by every extraction stage.
//!
//! Markup in blog posts is written by hand, pasted from word processors and run through several
//! editors over the years, so the same title can arrive with any mix of dashes, quotes and
//! whitespace. Everything that gets compared or stored passes through [`normalize`] first.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RX_DASHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "[\u{002d}\u{00ad}\u{2010}\u{2011}\u{2012}\u{2013}\u{2014}\u{2015}\u{2e3a}\u{2e3b}\u{207b}\u{208b}\u{fe63}\u{ff0d}]",
    )
    .unwrap()
});
static RX_CANARY: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[.,:!"“„;\-\s']+"#).unwrap());
static RX_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{P}+").unwrap());
static RX_EXPR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"expr:[^\s=]+="[^"]*"\s*"#).unwrap());
static RX_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static RX_OP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(/?)o:p\b").unwrap());

/// Characters that are replaced wholesale, after dashes have been unified.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{00a0}", " "),
    ("N\u{00b0}", "No."),
    ("\u{2026}", "..."),
    ("\u{201c}", "\""),
    ("\u{201d}", "\""),
];

/// Bracket and quote pairs stripped when they wrap a whole title.
const JUNK_PAIRS: &[(char, char)] = &[
    ('(', ')'),
    ('[', ']'),
    ('{', '}'),
    ('"', '"'),
    ('\'', '\''),
    ('<', '>'),
    ('«', '»'),
    ('‘', '’'),
    ('‚', '‛'),
    ('“', '”'),
    ('‟', '„'),
    ('‹', '›'),
    ('〟', '＂'),
];

/// Punctuation stripped from either end of a title.
const JUNK_SINGLES: &[char] = &['\\', '/', '|', ',', ';', '-', '.', '_'];

/// Collapse every whitespace run into a single space and trim both ends.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unify dash variants, no-break spaces, ellipses and curly double quotes.
pub fn purify(s: &str) -> String {
    let mut cooked = RX_DASHES.replace_all(s, "-").into_owned();
    for (from, to) in REPLACEMENTS {
        if cooked.contains(from) {
            cooked = cooked.replace(from, to);
        }
    }
    cooked
}

/// The canonical form of a piece of text: NFC, purified, whitespace-normalized.
pub fn normalize(s: &str) -> String {
    let composed: String = s.nfc().collect();
    normalize_ws(&purify(&composed))
}

/// Clean up raw markup before it is handed to the HTML parser.
///
/// Blogger exports carry Word's `o:p` paragraphs, `expr:` template attributes and the odd inline
/// script; all of these confuse the DOM walk downstream.
pub fn purify_html(raw: &str) -> String {
    let mut cooked = normalize(raw);
    cooked = RX_OP.replace_all(&cooked, "<${1}p").into_owned();
    if cooked.contains("expr:") {
        cooked = RX_EXPR.replace_all(&cooked, "").into_owned();
    }
    if cooked.contains("<script") || cooked.contains("<SCRIPT") {
        cooked = RX_SCRIPT.replace_all(&cooked, "").into_owned();
    }
    cooked
}

/// Clean a candidate title.
///
/// Peels off wrapping brackets, quotes, a leading "and " and stray punctuation. Titles are
/// never cut at a '.', however many clauses they run to.
pub fn clean_title(raw: &str) -> String {
    let mut cooked = normalize(raw);
    if cooked.is_empty() {
        return cooked;
    }

    for &(open, close) in JUNK_PAIRS {
        if cooked.chars().count() > 1 && cooked.starts_with(open) && cooked.ends_with(close) {
            cooked = strip_ends(&cooked, true, true);
        }
        cooked = tidy_title_start(cooked);
    }
    for &junk in JUNK_SINGLES {
        if cooked.starts_with(junk) {
            cooked = strip_ends(&cooked, true, false);
        }
        if cooked.ends_with(junk) {
            cooked = strip_ends(&cooked, false, true);
        }
        cooked = tidy_title_start(cooked);
    }
    cooked
}

fn strip_ends(s: &str, front: bool, back: bool) -> String {
    let mut chars = s.chars();
    if front {
        chars.next();
    }
    if back {
        chars.next_back();
    }
    chars.as_str().to_string()
}

fn tidy_title_start(s: String) -> String {
    let s = s.strip_prefix("and ").map(str::to_string).unwrap_or(s);
    s.trim().to_string()
}

/// Collapse consecutive lines that repeat, or extend, the line before them.
///
/// Lines are compared on a "canary" form: lower-cased with punctuation and whitespace removed. A
/// line whose canary starts with the previous canary replaces the previous line; an identical
/// canary is dropped.
pub fn deduplicate_lines(raw: &str) -> String {
    let mut good: Vec<String> = Vec::new();
    let mut prev = String::new();
    for line in raw.lines().map(normalize_ws).filter(|l| !l.is_empty()) {
        let canary = RX_CANARY.replace_all(&line.to_lowercase(), "").into_owned();
        if canary.is_empty() {
            good.push(line);
        } else if prev.is_empty() {
            good.push(line);
        } else if starts_with_longer(&canary, &prev) {
            good.pop();
            good.push(line);
        } else if canary != prev {
            good.push(line);
        }
        prev = canary;
    }
    normalize_ws(&good.join(" "))
}

/// Drop sentences that repeat the previous one, and sentences the following one extends.
pub fn deduplicate_sentences(raw: &str) -> String {
    let mut good: Vec<String> = Vec::new();
    let mut prev = String::new();
    for sentence in raw.split('.').map(normalize_ws).filter(|s| !s.is_empty()) {
        if sentence == prev {
            continue;
        }
        if starts_with_longer(&sentence, &prev) {
            good.pop();
        }
        good.push(sentence.clone());
        prev = sentence;
    }
    good.join(". ")
}

/// `candidate` is strictly longer than a non-empty `prefix` and begins with it.
fn starts_with_longer(candidate: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.chars().count() < candidate.chars().count()
        && candidate.starts_with(prefix)
}

/// An order- and punctuation-insensitive key of the words in `s`.
///
/// Two texts with equal keys restate each other.
pub fn word_key(s: &str) -> String {
    let cooked = RX_PUNCT.replace_all(&normalize_ws(s), "").to_lowercase();
    let mut words: Vec<&str> = cooked.split_whitespace().collect();
    words.sort_unstable();
    words.dedup();
    words.concat()
}

/// Host component of a url, without scheme, port, path or credentials.
pub fn domain_of(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url)
        && let Some(host) = parsed.host_str()
    {
        return host.to_lowercase();
    }
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        proptest::proptest!(|(s in "[a-zA-Z0-9 \t\n\u{a0}\u{2013}\u{2014}\u{201c}\u{201d}\u{2026}°.,:;éü]{0,64}")| {
            let once = normalize(&s);
            proptest::prop_assert_eq!(normalize(&once), once.clone());
            proptest::prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
            proptest::prop_assert!(!once.contains("  "));
            proptest::prop_assert!(!once.contains('\n') && !once.contains('\t'));
        })
    }

    #[test]
    fn normalize_unifies_typography() {
        assert_eq!(
            normalize("Bd.\u{a0}52 \u{2013} N\u{b0}\u{a0}1 \u{201c}Neue Folge\u{201d}\u{2026}"),
            "Bd. 52 - No. 1 \"Neue Folge\"..."
        );
    }

    #[test]
    fn normalize_composes_to_nfc() {
        assert_eq!(normalize("e\u{301}cole"), "\u{e9}cole");
    }

    #[test]
    fn clean_title_strips_wrappers() {
        assert_eq!(clean_title("  (Archaeonautica)  "), "Archaeonautica");
        assert_eq!(clean_title("and Gallia Préhistoire."), "Gallia Préhistoire");
        assert_eq!(clean_title("\"Bd. 52, Nr. 1 (2005)\""), "Bd. 52, Nr. 1 (2005)");
        assert_eq!(clean_title("-- Il capitale culturale,"), "- Il capitale culturale");
    }

    #[test]
    fn clean_title_keeps_every_clause() {
        assert_eq!(
            clean_title("Il capitale culturale. Studies on the Value of Cultural Heritage"),
            "Il capitale culturale. Studies on the Value of Cultural Heritage"
        );
        assert_eq!(clean_title("A. B. C. D"), "A. B. C. D");
        let long = "The first clause is quite long indeed. And so is the second one here. Tail";
        assert_eq!(clean_title(long), long);
        assert_eq!(clean_title(&format!("{long}.")), long);
    }

    #[test]
    fn deduplicate_lines_merges_repeats() {
        let raw = "Foo bar\nfoo bar.\nFoo bar baz\n\nSomething else";
        assert_eq!(deduplicate_lines(raw), "Foo bar baz Something else");
    }

    #[test]
    fn deduplicate_sentences_drops_prefixes() {
        assert_eq!(
            deduplicate_sentences("A journal. A journal of things. Again. Again."),
            "A journal of things. Again"
        );
    }

    #[test]
    fn word_key_ignores_order_and_punctuation() {
        assert_eq!(word_key("Gallia, Préhistoire."), word_key("préhistoire gallia"));
        assert_ne!(word_key("Gallia"), word_key("Gallia Préhistoire"));
    }

    #[test]
    fn purify_html_drops_scripts_and_expr() {
        let raw = r#"<div expr:id="data:post.id" class="x"><o:p>a</o:p><script type="text/javascript">var x = "<b>";</script></div>"#;
        let cooked = purify_html(raw);
        assert!(!cooked.contains("script"));
        assert!(!cooked.contains("expr:"));
        assert!(cooked.contains("<p>a</p>"));
    }

    #[test]
    fn domain_of_handles_ports_and_bare_hosts() {
        assert_eq!(domain_of("http://www.unimc.it/riviste/index.php"), "www.unimc.it");
        assert_eq!(domain_of("https://Example.org:8080/x"), "example.org");
        assert_eq!(domain_of("www.persee.fr/web"), "www.persee.fr");
    }
}
