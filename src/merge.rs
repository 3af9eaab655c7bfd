//! Reconcile two records of the same real-world object into one.
//!
//! Every field of [`Resource`] is destructured below, so adding a field without deciding how it
//! merges is a compile error.

use std::fmt::Display;

use tracing::debug;

use crate::{
    error::MergeError,
    identifier::Identifiers,
    resource::{COMBINE, ProvenanceVerb, Resource, ResourcePackage},
    text::domain_of,
};

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub resource: Resource,
    /// Fields present on both sides whose values differed.
    pub modified_fields: Vec<String>,
}

#[derive(Debug, Default)]
struct Modified(Vec<String>);

impl Modified {
    fn note(&mut self, field: &str, changed: bool) {
        if changed {
            self.0.push(field.to_string());
        }
    }
}

/// Merge `left` and `right`.
///
/// Fails when the urls cannot be reconciled or when an identity field (volume, issue, year, an
/// external id) holds different values on both sides. The caller then keeps both records.
pub fn merge(left: &Resource, right: &Resource) -> Result<Merged, MergeError> {
    let Resource {
        url: url1,
        url_alternates: url_alternates1,
        domain: domain1,
        title: title1,
        title_extended: title_extended1,
        title_alternates: title_alternates1,
        description: description1,
        languages: languages1,
        keywords: keywords1,
        identifiers: identifiers1,
        authors: authors1,
        editors: editors1,
        contributors: contributors1,
        publishers: publishers1,
        responsibility: responsibility1,
        places: places1,
        volume: volume1,
        issue: issue1,
        year: year1,
        issued_dates: issued_dates1,
        start_date: start_date1,
        end_date: end_date1,
        extent: extent1,
        form: form1,
        frequency: frequency1,
        issuance: issuance1,
        resource_type: resource_type1,
        is_part_of: is_part_of1,
        subordinate_resources: subordinate_resources1,
        related_resources: related_resources1,
        provenance: provenance1,
        zenon_id: zenon_id1,
        zotero_id: zotero_id1,
    } = left.clone();
    let Resource {
        url: url2,
        url_alternates: url_alternates2,
        domain: domain2,
        title: title2,
        title_extended: title_extended2,
        title_alternates: title_alternates2,
        description: description2,
        languages: languages2,
        keywords: keywords2,
        identifiers: identifiers2,
        authors: authors2,
        editors: editors2,
        contributors: contributors2,
        publishers: publishers2,
        responsibility: responsibility2,
        places: places2,
        volume: volume2,
        issue: issue2,
        year: year2,
        issued_dates: issued_dates2,
        start_date: start_date2,
        end_date: end_date2,
        extent: extent2,
        form: form2,
        frequency: frequency2,
        issuance: issuance2,
        resource_type: resource_type2,
        is_part_of: is_part_of2,
        subordinate_resources: subordinate_resources2,
        related_resources: related_resources2,
        provenance: provenance2,
        zenon_id: zenon_id2,
        zotero_id: zotero_id2,
    } = right.clone();

    let mut modified = Modified::default();

    let (url, alternate) = merge_url(url1, url2)?;
    let mut url_alternates = union(url_alternates1, url_alternates2, &mut modified, "url_alternates");
    if let Some(alternate) = alternate
        && !url_alternates.contains(&alternate)
    {
        url_alternates.push(alternate);
    }

    let domain = if url.is_empty() {
        text(Some(domain1), Some(domain2), &mut modified, "domain").unwrap_or_default()
    } else {
        domain_of(&url)
    };

    let mut keywords = union(keywords1, keywords2, &mut modified, "keywords");
    keywords.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

    let is_part_of = parent(is_part_of1, is_part_of2, &domain, &mut modified);

    let mut merged = Resource {
        url_alternates,
        title: text(Some(title1), Some(title2), &mut modified, "title").unwrap_or_default(),
        title_extended: text(title_extended1, title_extended2, &mut modified, "title_extended"),
        title_alternates: union(title_alternates1, title_alternates2, &mut modified, "title_alternates"),
        description: text(description1, description2, &mut modified, "description"),
        languages: union(languages1, languages2, &mut modified, "languages"),
        keywords,
        identifiers: identifiers(identifiers1, identifiers2, &mut modified),
        authors: union(authors1, authors2, &mut modified, "authors"),
        editors: union(editors1, editors2, &mut modified, "editors"),
        contributors: union(contributors1, contributors2, &mut modified, "contributors"),
        publishers: union(publishers1, publishers2, &mut modified, "publishers"),
        responsibility: union(responsibility1, responsibility2, &mut modified, "responsibility"),
        places: union(places1, places2, &mut modified, "places"),
        volume: scalar("volume", volume1, volume2)?,
        issue: scalar("issue", issue1, issue2)?,
        year: scalar("year", year1, year2)?,
        issued_dates: union(issued_dates1, issued_dates2, &mut modified, "issued_dates"),
        start_date: text(start_date1, start_date2, &mut modified, "start_date"),
        end_date: text(end_date1, end_date2, &mut modified, "end_date"),
        extent: text(extent1, extent2, &mut modified, "extent"),
        form: text(form1, form2, &mut modified, "form"),
        frequency: text(frequency1, frequency2, &mut modified, "frequency"),
        issuance: text(issuance1, issuance2, &mut modified, "issuance"),
        resource_type: text(resource_type1, resource_type2, &mut modified, "type"),
        is_part_of,
        subordinate_resources: packages(
            subordinate_resources1,
            subordinate_resources2,
            &mut modified,
            "subordinate_resources",
        ),
        related_resources: packages(
            related_resources1,
            related_resources2,
            &mut modified,
            "related_resources",
        ),
        provenance: provenance1.into_iter().chain(provenance2).collect(),
        zenon_id: scalar("zenon_id", zenon_id1, zenon_id2)?,
        zotero_id: scalar("zotero_id", zotero_id1, zotero_id2)?,
        url,
        domain,
    };

    let modified_fields = modified.0;
    debug!(url = %merged.url, modified = ?modified_fields, "merged resources");
    merged.set_provenance(
        COMBINE,
        ProvenanceVerb::HasWorkflowMotif,
        None,
        Some(modified_fields.clone()),
    );
    Ok(Merged {
        resource: merged,
        modified_fields,
    })
}

/// Canonical url and the alternate it replaced, if any.
fn merge_url(a: String, b: String) -> Result<(String, Option<String>), MergeError> {
    if a == b || b.is_empty() {
        return Ok((a, None));
    }
    if a.is_empty() {
        return Ok((b, None));
    }
    if a.starts_with(&b) {
        return Ok((b, Some(a)));
    }
    if b.starts_with(&a) {
        return Ok((a, Some(b)));
    }
    if let (Some((scheme_a, path_a)), Some((scheme_b, path_b))) = (a.split_once("://"), b.split_once("://"))
        && path_a == path_b
        && (scheme_a == "https" || scheme_b == "https")
    {
        return Ok((format!("https://{path_a}"), None));
    }
    Err(MergeError::UrlConflict { left: a, right: b })
}

/// Identity fields: agreement or one-sided presence, never a choice between two values.
fn scalar<T: PartialEq + Display>(
    field: &'static str,
    a: Option<T>,
    b: Option<T>,
) -> Result<Option<T>, MergeError> {
    match (a, b) {
        (Some(a), Some(b)) if a != b => Err(MergeError::ScalarConflict {
            field,
            left: a.to_string(),
            right: b.to_string(),
        }),
        (a, b) => Ok(a.or(b)),
    }
}

/// Short text: the containing string wins, otherwise the longer one (ties go right).
fn text(a: Option<String>, b: Option<String>, modified: &mut Modified, field: &str) -> Option<String> {
    let a = a.filter(|s| !s.is_empty());
    let b = b.filter(|s| !s.is_empty());
    match (a, b) {
        (Some(a), Some(b)) => {
            if a == b {
                return Some(a);
            }
            modified.note(field, true);
            if b.contains(a.as_str()) {
                Some(b)
            } else if a.contains(b.as_str()) || a.chars().count() > b.chars().count() {
                Some(a)
            } else {
                Some(b)
            }
        }
        (a, b) => a.or(b),
    }
}

/// Order-preserving union.
fn union<T: PartialEq>(a: Vec<T>, b: Vec<T>, modified: &mut Modified, field: &str) -> Vec<T> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    modified.note(field, a != b);
    let mut out = a;
    for item in b {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn identifiers(a: Identifiers, b: Identifiers, modified: &mut Modified) -> Identifiers {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    modified.note("identifiers", a != b);
    let mut out = a;
    for (family, variants) in b {
        let slot = out.entry(family).or_default();
        for (variant, ids) in variants {
            slot.entry(variant).or_default().extend(ids);
        }
    }
    out
}

/// Concatenation, deduplicated on the embedded url.
fn packages(
    a: Vec<ResourcePackage>,
    b: Vec<ResourcePackage>,
    modified: &mut Modified,
    field: &str,
) -> Vec<ResourcePackage> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    modified.note(field, a != b);
    let mut out: Vec<ResourcePackage> = Vec::with_capacity(a.len() + b.len());
    for package in a.into_iter().chain(b) {
        if !out.iter().any(|p| p.url == package.url) {
            out.push(package);
        }
    }
    out
}

/// Prefer the parent on the child's own domain, then the parent carrying an ISSN.
fn parent(
    a: Option<ResourcePackage>,
    b: Option<ResourcePackage>,
    domain: &str,
    modified: &mut Modified,
) -> Option<ResourcePackage> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if a == b {
                return Some(a);
            }
            modified.note("is_part_of", true);
            if !domain.is_empty() && domain_of(&a.url) == domain {
                Some(a)
            } else if !domain.is_empty() && domain_of(&b.url) == domain {
                Some(b)
            } else {
                match (a.issn.is_some(), b.issn.is_some()) {
                    (true, false) => Some(a),
                    (false, true) => Some(b),
                    _ => None,
                }
            }
        }
        (a, b) => a.or(b),
    }
}
