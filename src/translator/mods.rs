//! Flatten a MODS record into named field values.

use std::collections::BTreeMap;

use crate::{resource::Place, xml::XmlElement};

/// Everything read from one MODS record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModsFields {
    /// Field name to values in document order. Names follow the MODS element, or its `type`
    /// attribute for notes and identifiers.
    pub values: BTreeMap<String, Vec<String>>,
    /// `(role, name)` pairs.
    pub names: Vec<(String, String)>,
    pub places: Vec<Place>,
}

impl ModsFields {
    fn push(&mut self, key: impl Into<String>, value: String) {
        if !value.is_empty() {
            self.values.entry(key.into()).or_default().push(value);
        }
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values.get(key)?.first().map(String::as_str)
    }
}

/// Elements read as plain text: element, field, whether the value is lower-cased.
const PLAIN: &[(&str, &str, bool)] = &[
    ("title", "title", false),
    ("typeOfResource", "type", true),
    ("publisher", "publisher", false),
    ("frequency", "frequency", true),
    ("issuance", "issuance", false),
    ("form", "form", true),
    ("extent", "extent", true),
    ("recordCreationDate", "record_creation_date", false),
    ("recordChangeDate", "record_change_date", false),
    ("languageTerm", "language", false),
    ("url", "url", false),
];

pub fn extract(mods: &XmlElement) -> ModsFields {
    let mut fields = ModsFields::default();
    walk(&mut fields, vec![mods]);
    fields
}

/// Dispatch on element name; unknown elements are descended into.
fn walk<'a>(fields: &mut ModsFields, mut pending: Vec<&'a XmlElement>) {
    pending.reverse();
    while let Some(el) = pending.pop() {
        match el.name.as_str() {
            "name" => name(fields, el),
            "originInfo" => origin_info(fields, el),
            "dateIssued" => date_issued(fields, el),
            "note" => fields.push(typed_key(el, "note"), el.text()),
            "identifier" => fields.push(typed_key(el, "identifier"), el.text()),
            other => match PLAIN.iter().find(|(element, _, _)| *element == other) {
                Some((_, key, true)) => fields.push(*key, el.text().to_lowercase()),
                Some((_, key, false)) => fields.push(*key, el.text()),
                None => pending.extend(el.elements().collect::<Vec<_>>().into_iter().rev()),
            },
        }
    }
}

fn typed_key(e: &XmlElement, default: &str) -> String {
    e.attr("type")
        .map(|t| t.trim().replace(' ', "_"))
        .unwrap_or_else(|| default.to_string())
}

fn name(fields: &mut ModsFields, e: &XmlElement) {
    let role = e
        .child("role")
        .and_then(|r| r.child("roleTerm"))
        .map(|t| t.text().to_lowercase())
        .unwrap_or_else(|| "name".to_string());
    let parts: Vec<&XmlElement> = e.children_named("namePart").collect();
    let value = if parts.is_empty() {
        e.text()
    } else if e.attr("type") == Some("personal") {
        let part = |kind: &str| {
            parts
                .iter()
                .find(|p| p.attr("type") == Some(kind))
                .map(|p| p.text())
        };
        match (part("family"), part("given")) {
            (Some(family), Some(given)) => format!("{family}, {given}"),
            (Some(family), None) => family,
            _ => parts.iter().map(|p| p.text()).collect::<Vec<_>>().join(", "),
        }
    } else {
        parts.iter().map(|p| p.text()).collect::<Vec<_>>().join(", ")
    };
    if !value.is_empty() {
        fields.names.push((role, value));
    }
}

/// All places of an `originInfo` make up one [`Place`]: text terms are joined into its name and
/// code terms are keyed by authority.
fn origin_info(fields: &mut ModsFields, e: &XmlElement) {
    let mut names = Vec::new();
    let mut codes = BTreeMap::new();
    for term in e.children_named("place").flat_map(|p| p.children_named("placeTerm")) {
        match term.attr("type") {
            Some("code") => {
                let authority = term.attr("authority").unwrap_or("code").to_string();
                codes.insert(authority, term.text());
            }
            _ => names.push(term.text()),
        }
    }
    if !names.is_empty() || !codes.is_empty() {
        fields.places.push(Place {
            place_name: (!names.is_empty()).then(|| names.join(", ")),
            codes,
        });
    }
    walk(fields, e.elements().filter(|c| c.name != "place").collect());
}

fn date_issued(fields: &mut ModsFields, e: &XmlElement) {
    let text = e.text();
    match e.attr("point") {
        None => fields.push("issued_date", text),
        Some("end") if text == "9999" => {}
        Some(point) => fields.push(format!("{point}_date"), text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    const MODS: &str = r#"<mods:mods xmlns:mods="http://www.loc.gov/mods/v3">
  <mods:titleInfo><mods:title>Archaeonautica</mods:title></mods:titleInfo>
  <mods:name type="personal">
    <mods:namePart type="family">Pomey</mods:namePart>
    <mods:namePart type="given">Patrice</mods:namePart>
    <mods:role><mods:roleTerm type="text">Editor</mods:roleTerm></mods:role>
  </mods:name>
  <mods:name type="corporate"><mods:namePart>CNRS</mods:namePart><mods:namePart>Paris</mods:namePart></mods:name>
  <mods:typeOfResource>Text</mods:typeOfResource>
  <mods:originInfo>
    <mods:place><mods:placeTerm type="code" authority="marccountry">fr</mods:placeTerm></mods:place>
    <mods:place><mods:placeTerm type="text">Paris</mods:placeTerm></mods:place>
    <mods:publisher>CNRS Éditions</mods:publisher>
    <mods:dateIssued>1977-</mods:dateIssued>
    <mods:dateIssued point="start">1977</mods:dateIssued>
    <mods:dateIssued point="end">9999</mods:dateIssued>
    <mods:issuance>continuing</mods:issuance>
    <mods:frequency>Irregular</mods:frequency>
  </mods:originInfo>
  <mods:language><mods:languageTerm type="code" authority="iso639-2b">fre</mods:languageTerm></mods:language>
  <mods:physicalDescription><mods:form authority="marcform">Print</mods:form><mods:extent>v. : ill.</mods:extent></mods:physicalDescription>
  <mods:note type="statement of responsibility">Centre national de la recherche scientifique</mods:note>
  <mods:identifier type="issn">0154-1854</mods:identifier>
  <mods:identifier type="uri">http://www.persee.fr/collection/nauti</mods:identifier>
  <mods:location><mods:url>http://www.persee.fr/collection/nauti</mods:url></mods:location>
  <mods:recordInfo>
    <mods:recordCreationDate>20090115103512.0</mods:recordCreationDate>
    <mods:recordChangeDate>20130710153307.0</mods:recordChangeDate>
  </mods:recordInfo>
</mods:mods>"#;

    #[test]
    fn walks_every_known_element() {
        let root = xml::parse(MODS).unwrap().unwrap();
        let f = extract(&root);
        assert_eq!(f.first("title"), Some("Archaeonautica"));
        assert_eq!(
            f.names,
            vec![
                ("editor".to_string(), "Pomey, Patrice".to_string()),
                ("name".to_string(), "CNRS, Paris".to_string()),
            ]
        );
        assert_eq!(f.first("type"), Some("text"));
        assert_eq!(f.first("publisher"), Some("CNRS Éditions"));
        assert_eq!(f.values["issued_date"], vec!["1977-"]);
        assert_eq!(f.first("start_date"), Some("1977"));
        assert!(!f.values.contains_key("end_date"));
        assert_eq!(f.first("issuance"), Some("continuing"));
        assert_eq!(f.first("frequency"), Some("irregular"));
        assert_eq!(f.first("language"), Some("fre"));
        assert_eq!(f.first("form"), Some("print"));
        assert_eq!(f.first("extent"), Some("v. : ill."));
        assert_eq!(
            f.first("statement_of_responsibility"),
            Some("Centre national de la recherche scientifique")
        );
        assert_eq!(f.first("issn"), Some("0154-1854"));
        assert_eq!(f.first("uri"), Some("http://www.persee.fr/collection/nauti"));
        assert_eq!(f.first("url"), Some("http://www.persee.fr/collection/nauti"));
        assert_eq!(f.first("record_change_date"), Some("20130710153307.0"));
        assert_eq!(
            f.places,
            vec![Place {
                place_name: Some("Paris".into()),
                codes: [("marccountry".to_string(), "fr".to_string())].into(),
            }]
        );
    }
}
