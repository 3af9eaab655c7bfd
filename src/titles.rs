use crate::{
    config::{ColonPrefix, TitleTable},
    text::{clean_title, normalize_ws},
};

/// A resource title, optionally with a longer form that carries a subtitle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Titles {
    pub title: String,
    pub extended: Option<String>,
}

impl Titles {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            extended: None,
        }
    }

    /// The longest title known, used when mining keywords.
    pub fn longest(&self) -> &str {
        self.extended.as_deref().unwrap_or(&self.title)
    }
}

/// Picks the canonical title of a resource from the anchor text and the post title.
#[derive(Debug, Clone, Copy)]
pub struct TitleReconciler<'c> {
    table: &'c TitleTable,
}

impl<'c> TitleReconciler<'c> {
    pub fn new(table: &'c TitleTable) -> Self {
        Self { table }
    }

    fn colon_prefix(&self, title: &str) -> Option<&'c ColonPrefix> {
        let (prefix, _) = title.split_once(':')?;
        self.table
            .colon_prefixes
            .get(&normalize_ws(prefix).to_lowercase())
    }

    /// Drop a configured "Prefix:" from a post title.
    pub fn strip_colon_prefix(&self, title: &str) -> String {
        match (self.colon_prefix(title), title.split_once(':')) {
            (Some(entry), Some((_, rest))) if entry.strip_title => clean_title(rest),
            _ => title.to_string(),
        }
    }

    /// Whether a post with this title may describe resources at all.
    pub fn allows(&self, title: &str) -> bool {
        if self.table.omit.contains(&normalize_ws(title).to_lowercase()) {
            return false;
        }
        !self.colon_prefix(title).is_some_and(|p| p.omit_post)
    }

    pub fn reconcile(&self, anchor_title: Option<&str>, article_title: Option<&str>) -> Option<Titles> {
        let anchor = anchor_title.filter(|t| !t.is_empty());
        let article = article_title.filter(|t| !t.is_empty());
        match (anchor, article) {
            (None, None) => None,
            (Some(anchor), None) => Some(Titles::new(anchor)),
            (None, Some(article)) => Some(Titles::new(self.strip_colon_prefix(article))),
            (Some(anchor), Some(article)) => {
                if anchor.to_lowercase() == article.to_lowercase() {
                    return Some(Titles::new(article));
                }
                let cleaned = self.strip_colon_prefix(article);
                let anchor_lower = anchor.to_lowercase();
                let cleaned_lower = cleaned.to_lowercase();
                if cleaned_lower == anchor_lower {
                    Some(Titles::new(anchor))
                } else if !cleaned.is_empty() && anchor_lower.contains(&cleaned_lower) {
                    Some(Titles {
                        title: cleaned,
                        extended: Some(anchor.to_string()),
                    })
                } else {
                    Some(Titles::new(anchor))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn config() -> Config {
        Config::from_toml(
            r#"
            [titles]
            omit = ["Administrative"]

            [[colon_prefix]]
            prefix = "Journal"
            strip_title = true

            [[colon_prefix]]
            prefix = "site news"
            omit_post = true

            [[colon_prefix]]
            prefix = "open access monograph series"
            strip_title = true
            multiple_resources = true
            "#,
        )
        .expect("config")
    }

    #[test]
    fn equal_titles_prefer_the_article() {
        let cfg = config();
        let r = TitleReconciler::new(&cfg.titles);
        assert_eq!(
            r.reconcile(Some("gallia préhistoire"), Some("Gallia Préhistoire")),
            Some(Titles::new("Gallia Préhistoire"))
        );
    }

    #[test]
    fn cleaned_article_title_inside_anchor_yields_both() {
        let cfg = config();
        let r = TitleReconciler::new(&cfg.titles);
        assert_eq!(
            r.reconcile(
                Some("Il capitale culturale. Studies on the Value of Cultural Heritage"),
                Some("Journal: Il capitale culturale")
            ),
            Some(Titles {
                title: "Il capitale culturale".into(),
                extended: Some("Il capitale culturale. Studies on the Value of Cultural Heritage".into()),
            })
        );
    }

    #[test]
    fn stripped_article_equal_to_anchor_prefers_anchor() {
        let cfg = config();
        let r = TitleReconciler::new(&cfg.titles);
        assert_eq!(
            r.reconcile(Some("Archaeonautica"), Some("Journal: archaeonautica")),
            Some(Titles::new("Archaeonautica"))
        );
    }

    #[test]
    fn unrelated_titles_keep_the_anchor() {
        let cfg = config();
        let r = TitleReconciler::new(&cfg.titles);
        assert_eq!(
            r.reconcile(Some("OIP 139. Early Megiddo"), Some("Just Published: OIP 139")),
            Some(Titles::new("OIP 139. Early Megiddo"))
        );
    }

    #[test]
    fn one_sided_titles() {
        let cfg = config();
        let r = TitleReconciler::new(&cfg.titles);
        assert_eq!(r.reconcile(None, None), None);
        assert_eq!(r.reconcile(Some(""), None), None);
        assert_eq!(r.reconcile(Some("Anchor"), None), Some(Titles::new("Anchor")));
        assert_eq!(
            r.reconcile(None, Some("journal: The Post")),
            Some(Titles::new("The Post"))
        );
    }

    #[test]
    fn longest_prefers_the_extended_title() {
        let mut titles = Titles::new("Archaeonautica");
        assert_eq!(titles.longest(), "Archaeonautica");
        titles.extended = Some("Archaeonautica: revue d'archéologie navale".into());
        assert_eq!(titles.longest(), "Archaeonautica: revue d'archéologie navale");
    }

    #[test]
    fn omit_rules() {
        let cfg = config();
        let r = TitleReconciler::new(&cfg.titles);
        assert!(!r.allows("administrative"));
        assert!(!r.allows("Site News: moving to a new server"));
        assert!(r.allows("Journal: Il capitale culturale"));
        assert!(r.allows("No colon at all"));
    }
}
