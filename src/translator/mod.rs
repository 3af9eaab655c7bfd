//! Enrichment from structured bibliographic sources.
//!
//! A source is described by a [`BiblioSource`] recipe: which record urls it serves, where the
//! machine-readable form of a record lives, and how its fields map onto a [`Resource`].

use tracing::{debug, trace};

use crate::{
    config::{BiblioSource, Config},
    error::EnrichmentError,
    identifier::{IdentifierVariant, insert},
    resource::{ProvenanceVerb, Resource},
    text::{domain_of, normalize},
    xml,
};

pub mod http;
pub mod mods;

use http::HttpClient;
use mods::ModsFields;

/// Fetches and converts records of the configured bibliographic sources.
pub struct BiblioFetcher<'c> {
    config: &'c Config,
    client: Box<dyn HttpClient + 'c>,
}

impl<'c> BiblioFetcher<'c> {
    pub fn new(config: &'c Config, client: impl HttpClient + 'c) -> Self {
        Self {
            config,
            client: Box::new(client),
        }
    }

    pub fn supports(&self, url: &str) -> bool {
        self.config.biblio_source(&domain_of(url)).is_some()
    }

    /// The resource described by the record at `url`.
    pub fn fetch(&self, url: &str) -> Result<Resource, EnrichmentError> {
        let domain = domain_of(url);
        let source = self
            .config
            .biblio_source(&domain)
            .ok_or_else(|| EnrichmentError::UnsupportedDomain(domain.clone()))?;
        if !source.url_pattern.is_match(url) {
            return Err(EnrichmentError::UrlPatternMismatch(url.to_string()));
        }

        let biblio_url = format!("{}{}", url.trim_end_matches('/'), source.url_suffix);
        debug!(url = %biblio_url, "fetching bibliographic record");
        let response = self.client.get(&biblio_url)?;
        if !(200..300).contains(&response.status) {
            return Err(EnrichmentError::HttpStatus {
                url: biblio_url,
                status: response.status,
            });
        }
        let mime = response
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        if !mime.eq_ignore_ascii_case(&source.content_type) {
            return Err(EnrichmentError::UnexpectedContentType {
                url: biblio_url,
                expected: source.content_type.clone(),
                actual: response.content_type,
            });
        }

        let payload_error = |message: String| EnrichmentError::Payload {
            url: biblio_url.clone(),
            message,
        };
        let root = xml::parse(&response.body)
            .map_err(|e| payload_error(e.to_string()))?
            .ok_or_else(|| payload_error("empty document".into()))?;
        let payload = match source.payload.split_first() {
            Some((first, rest)) if *first == root.name => root.path(rest),
            Some(_) => None,
            None => Some(&root),
        }
        .ok_or_else(|| payload_error(format!("no {} element", source.payload.join("/"))))?;

        let fields = mods::extract(payload);
        let mut resource = to_resource(&fields, source, url);
        let updated = fields
            .first("record_change_date")
            .or_else(|| fields.first("record_creation_date"))
            .map(|d| fix_date(source, d));
        let populated = resource.populated_fields();
        resource.set_provenance(
            biblio_url,
            ProvenanceVerb::CitesAsDataSource,
            updated,
            Some(populated),
        );
        if source.id_field.as_deref() == Some("zenon_id") {
            resource.zenon_id = url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .map(str::to_string);
        }
        Ok(resource)
    }
}

/// Rewrite a compact record date (`20130710153307.0`) as `2013-07-10T15:33:07.0`.
fn fix_date(source: &BiblioSource, raw: &str) -> String {
    let Some(caps) = source.date_pattern.as_ref().and_then(|rx| rx.captures(raw)) else {
        return raw.to_string();
    };
    let part = |name: &str| caps.name(name).map_or("", |m| m.as_str());
    format!(
        "{}-{}-{}T{}:{}:{}",
        part("year"),
        part("month"),
        part("day"),
        part("hour"),
        part("minute"),
        part("second")
    )
}

fn to_resource(fields: &ModsFields, source: &BiblioSource, record_url: &str) -> Resource {
    let url = fields.first("url").unwrap_or(record_url);
    let mut resource = Resource::new(url, fields.first("title").map(normalize).unwrap_or_default());

    for (key, values) in &fields.values {
        let target = source.field_map.get(key).map_or(key.as_str(), String::as_str);
        let first = || values.first().cloned();
        match target {
            "title" | "url" | "record_change_date" | "record_creation_date" => {}
            "publishers" => resource.publishers.extend(values.iter().cloned()),
            "languages" => resource.languages.extend(values.iter().cloned()),
            "responsibility" => resource.responsibility.extend(values.iter().cloned()),
            "issued_dates" => resource.issued_dates.extend(values.iter().cloned()),
            "identifiers" => {
                for id in values {
                    insert(&mut resource.identifiers, key, IdentifierVariant::Generic, id.clone());
                }
            }
            "type" => resource.resource_type = first(),
            "frequency" => resource.frequency = first(),
            "issuance" => resource.issuance = first(),
            "form" => resource.form = first(),
            "extent" => resource.extent = first(),
            "start_date" => resource.start_date = first(),
            "end_date" => resource.end_date = first(),
            other => trace!(field = other, "unmapped bibliographic field"),
        }
    }
    resource.places = fields.places.clone();
    for (role, name) in &fields.names {
        match role.as_str() {
            "author" => resource.authors.push(name.clone()),
            "editor" => resource.editors.push(name.clone()),
            _ => resource.contributors.push(name.clone()),
        }
    }
    resource
}
