//! The bibliographic record produced by extraction and consumed by exporters.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    identifier::{Identifiers, preferred},
    text::domain_of,
};

/// Resource of the provenance entry written when two records are merged.
pub const COMBINE: &str = "http://purl.org/net/wf-motifs#Combine";

/// Relation between a resource and the document a provenance entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvenanceVerb {
    CitesAsMetadataDocument,
    CitesAsDataSource,
    HasWorkflowMotif,
}

impl ProvenanceVerb {
    pub fn uri(self) -> &'static str {
        match self {
            Self::CitesAsMetadataDocument => "http://purl.org/spar/cito/citesAsMetadataDocument",
            Self::CitesAsDataSource => "http://purl.org/spar/cito/citesAsDataSource",
            Self::HasWorkflowMotif => "http://purl.org/net/wf-motifs#hasWorkflowMotif",
        }
    }
}

/// One entry of a resource's audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub term: String,
    pub when: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

/// Summary of a resource embedded in another one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePackage {
    pub title_full: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

/// A place of publication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    /// Authority (e.g. `marccountry`) to code.
    #[serde(flatten)]
    pub codes: BTreeMap<String, String>,
}

/// Location of a resource in a reference manager, set once it has been uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoteroId {
    pub library_type: String,
    #[serde(rename = "libraryID")]
    pub library_id: String,
    #[serde(rename = "itemID")]
    pub item_id: String,
}

impl std::fmt::Display for ZoteroId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.library_type, self.library_id, self.item_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub url_alternates: Vec<String>,
    pub domain: String,

    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_extended: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub title_alternates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub identifiers: Identifiers,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub editors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publishers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responsibility: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub places: Vec<Place>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issued_dates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_part_of: Option<ResourcePackage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subordinate_resources: Vec<ResourcePackage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_resources: Vec<ResourcePackage>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provenance: Vec<Provenance>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zenon_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zotero_id: Option<ZoteroId>,
}

impl Resource {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            domain: domain_of(&url),
            url,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Summary used when this resource is embedded in another one.
    pub fn package(&self) -> ResourcePackage {
        let title_full = self
            .title_extended
            .clone()
            .unwrap_or_else(|| self.title.clone());
        ResourcePackage {
            title: (title_full != self.title).then(|| self.title.clone()),
            title_full,
            url: self.url.clone(),
            issn: None,
            isbn: None,
        }
    }

    /// Summary carrying the preferred ISSN, or failing that ISBN, for a resource's children.
    pub fn parent_package(&self) -> ResourcePackage {
        let mut package = self.package();
        if let Some(issn) = preferred(&self.identifiers, "issn") {
            package.issn = Some(issn.to_string());
        } else if let Some(isbn) = preferred(&self.identifiers, "isbn") {
            package.isbn = Some(isbn.to_string());
        }
        package
    }

    /// Append a provenance entry stamped with the current time.
    pub fn set_provenance(
        &mut self,
        resource: impl Into<String>,
        verb: ProvenanceVerb,
        resource_date: Option<String>,
        fields: Option<Vec<String>>,
    ) {
        self.provenance.push(Provenance {
            term: verb.uri().to_string(),
            when: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            resource: resource.into(),
            resource_date,
            fields,
        });
    }

    /// Names of the fields holding a value, sorted, provenance excluded.
    pub fn populated_fields(&self) -> Vec<String> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map
                .into_iter()
                .filter(|(k, v)| k != "provenance" && !is_blank(v))
                .map(|(k, _)| k)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

fn is_blank(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}
