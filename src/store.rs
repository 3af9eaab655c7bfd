//! JSON files for a batch of extracted resources, one per resource.
//!
//! Resources land in `<root>/<domain>/<key>.json`, the key being derived from the title. The
//! store remembers which url each key was written for during the run, so that a second resource
//! with the same key is either merged into the first or written next to it.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{error::StoreError, merge::merge, resource::Resource};

const MAX_KEY_LEN: usize = 64;
const KEY_PREFIX_LEN: usize = 48;
const DIGEST_LEN: usize = 12;

pub struct Store {
    root: PathBuf,
    /// domain -> key -> url
    index: HashMap<String, HashMap<String, String>>,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `resource`, merging it into an earlier record with the same key where possible.
    /// Returns the file written.
    pub fn save(&mut self, resource: &Resource) -> Result<PathBuf, StoreError> {
        let domain = if resource.domain.is_empty() {
            "unknown".to_string()
        } else {
            resource.domain.clone()
        };
        let key = key_for(resource);
        let path = self.path(&domain, &key);

        let known = self
            .index
            .get(&domain)
            .and_then(|keys| keys.get(&key))
            .cloned();
        let Some(known_url) = known else {
            self.write(&domain, &key, resource)?;
            return Ok(path);
        };

        let existing = Resource::from_json(&fs::read_to_string(&path)?)?;
        if known_url == resource.url {
            let merged = merge(&existing, resource)?;
            debug!(path = %path.display(), fields = ?merged.modified_fields, "merged into stored record");
            self.write(&domain, &key, &merged.resource)?;
            return Ok(path);
        }

        match merge(&existing, resource) {
            Ok(merged) => {
                self.write(&domain, &key, &merged.resource)?;
                Ok(path)
            }
            Err(e) => {
                let key = format!("{key}-{}", &digest(&resource.url)[..DIGEST_LEN]);
                let path = self.path(&domain, &key);
                let saved_before = self
                    .index
                    .get(&domain)
                    .and_then(|keys| keys.get(&key))
                    .is_some_and(|url| *url == resource.url);
                if saved_before {
                    let earlier = Resource::from_json(&fs::read_to_string(&path)?)?;
                    let merged = merge(&earlier, resource)?;
                    self.write(&domain, &key, &merged.resource)?;
                } else {
                    warn!(url = %resource.url, %key, "{e}; saving separately");
                    self.write(&domain, &key, resource)?;
                }
                Ok(path)
            }
        }
    }

    fn path(&self, domain: &str, key: &str) -> PathBuf {
        self.root.join(domain).join(format!("{key}.json"))
    }

    fn write(&mut self, domain: &str, key: &str, resource: &Resource) -> Result<(), StoreError> {
        let dir = self.root.join(domain);
        fs::create_dir_all(&dir)?;
        fs::write(self.path(domain, key), resource.to_json()?)?;
        self.index
            .entry(domain.to_string())
            .or_default()
            .insert(key.to_string(), resource.url.clone());
        Ok(())
    }
}

/// File name stem for a resource: its title reduced to lowercase ASCII words joined by `-`.
pub fn key_for(resource: &Resource) -> String {
    let key = resource
        .title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if key.is_empty() {
        return digest(&resource.url)[..DIGEST_LEN].to_string();
    }
    if key.len() > MAX_KEY_LEN {
        let prefix = key[..KEY_PREFIX_LEN].trim_end_matches('-');
        return format!("{prefix}-{}", &digest(&key)[..DIGEST_LEN]);
    }
    key
}

fn digest(s: &str) -> String {
    format!("{:x}", Sha256::digest(s.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(url: &str, title: &str) -> Resource {
        Resource::new(url, title)
    }

    #[test]
    fn keys() {
        assert_eq!(
            key_for(&resource("http://www.persee.fr/nauti", "Archaeonautica: Vol. 1 (1977)")),
            "archaeonautica-vol-1-1977"
        );
        assert_eq!(key_for(&resource("http://www.persee.fr/nauti", "ákoue")), "koue");

        let empty = key_for(&resource("http://www.persee.fr/nauti", "Ἀρχαιολογία"));
        assert_eq!(empty.len(), DIGEST_LEN);
        assert!(empty.chars().all(|c| c.is_ascii_hexdigit()));

        let long = key_for(&resource(
            "http://www.persee.fr/nauti",
            "A very long title about the archaeology of the Mediterranean harbours in antiquity",
        ));
        assert!(long.len() <= KEY_PREFIX_LEN + 1 + DIGEST_LEN);
        assert!(long.starts_with("a-very-long-title"));
    }

    #[test]
    fn writes_under_the_domain() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::new(dir.path());
        let path = store
            .save(&resource("http://www.persee.fr/nauti", "Archaeonautica"))
            .unwrap();
        assert_eq!(path, dir.path().join("www.persee.fr").join("archaeonautica.json"));
        let back = Resource::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.url, "http://www.persee.fr/nauti");
    }

    #[test]
    fn same_url_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::new(dir.path());
        let mut first = resource("http://www.persee.fr/nauti", "Archaeonautica");
        first.keywords = vec!["journal".into()];
        let mut second = first.clone();
        second.keywords = vec!["open access".into()];

        store.save(&first).unwrap();
        let path = store.save(&second).unwrap();
        let back = Resource::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.keywords, vec!["journal", "open access"]);
    }

    #[test]
    fn conflicting_records_are_kept_apart() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::new(dir.path());
        let mut first = resource("http://www.persee.fr/nauti/1", "Archaeonautica");
        first.year = Some("1977".into());
        let mut second = resource("http://www.persee.fr/other/2", "Archaeonautica");
        second.year = Some("1978".into());

        let a = store.save(&first).unwrap();
        let b = store.save(&second).unwrap();
        assert_ne!(a, b);
        assert!(b.file_name().unwrap().to_str().unwrap().starts_with("archaeonautica-"));
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn records_kept_apart_still_merge_with_their_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::new(dir.path());
        let mut first = resource("http://www.persee.fr/nauti/1", "Archaeonautica");
        first.year = Some("1977".into());
        let mut second = resource("http://www.persee.fr/other/2", "Archaeonautica");
        second.year = Some("1978".into());
        second.keywords = vec!["journal".into()];
        let mut repeat = second.clone();
        repeat.keywords = vec!["open access".into()];

        store.save(&first).unwrap();
        let apart = store.save(&second).unwrap();
        let again = store.save(&repeat).unwrap();
        assert_eq!(apart, again);

        let back = Resource::from_json(&fs::read_to_string(&again).unwrap()).unwrap();
        assert_eq!(back.keywords, vec!["journal", "open access"]);
        assert_eq!(back.year.as_deref(), Some("1978"));
        assert_eq!(fs::read_dir(dir.path().join("www.persee.fr")).unwrap().count(), 2);
    }

    #[test]
    fn same_url_conflict_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::new(dir.path());
        let mut first = resource("http://www.persee.fr/nauti", "Archaeonautica");
        first.year = Some("1977".into());
        let mut second = first.clone();
        second.year = Some("1978".into());

        store.save(&first).unwrap();
        assert!(matches!(store.save(&second), Err(StoreError::Merge(_))));
    }
}
