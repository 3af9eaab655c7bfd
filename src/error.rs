use thiserror::Error;

/// Errors that abort the extraction of a single article.
///
/// None of these are fatal for a batch: the caller logs the article id along with the error and
/// moves on to the next article.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No anchor in the body survived filtering.
    #[error("could not find valid self-or-subsequent resource anchor")]
    NoValidAnchor,

    /// The body links to no external domain at all.
    #[error("no resource domains found in article {0}")]
    NoDomains(String),

    /// The body links to several domains and no variant claims any of them.
    #[error("multiple ambiguous domains in article {article}: {}", .domains.join(", "))]
    AmbiguousDomains { article: String, domains: Vec<String> },

    /// A post category has no entry in the keyword table.
    #[error("unexpected category \"{term}\" in post \"{title}\"")]
    UnmappedCategory { term: String, title: String },

    /// A mined keyword is mixed-case and not a registered tag.
    #[error("keyword \"{0}\" lacks an entry in the keyword table")]
    InvalidKeyword(String),

    /// Neither the anchor nor the article provided a usable title.
    #[error("could not extract resource title")]
    MissingTitle,
}

/// Two resources could not be reconciled without silently dropping data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("could not reconcile url mismatch in merge: {left} vs. {right}")]
    UrlConflict { left: String, right: String },

    #[error("cannot merge two resources in which the {field} field differs: \"{left}\" vs. \"{right}\"")]
    ScalarConflict {
        field: &'static str,
        left: String,
        right: String,
    },
}

/// Structured bibliographic data could not be obtained. Callers fall back to text-only
/// extraction.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("parsing structured bibliographic data from {0} is not supported")]
    UnsupportedDomain(String),

    #[error("{0} does not match the record pattern of its bibliographic source")]
    UrlPatternMismatch(String),

    #[error("got {actual} from {url} when {expected} was expected")]
    UnexpectedContentType {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("unsuccessful attempt (status code {status}) to get bibliographic data from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("malformed bibliographic payload from {url}: {message}")]
    Payload { url: String, message: String },
}

/// The Atom entry could not be turned into an [`Article`](crate::article::Article).
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("malformed entry XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("entry has no <{0}> element")]
    MissingElement(&'static str),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid pattern in {table}: {source}")]
    Regex {
        table: &'static str,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Merge(#[from] MergeError),
}
