//! A small owned element tree over `quick-xml` events.
//!
//! Both the Atom entries and the MODS records are small documents that are easier to query as a
//! tree than as a stream. Names are stored without their namespace prefix.

use quick_xml::{
    Reader,
    escape::{resolve_predefined_entity, unescape},
    events::{BytesStart, Event},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    fn open(e: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
            attrs: e
                .attributes()
                .flatten()
                .map(|a| {
                    let raw = String::from_utf8_lossy(a.value.as_ref()).to_string();
                    let value = unescape(&raw).map(|v| v.to_string()).unwrap_or(raw);
                    (String::from_utf8_lossy(a.key.local_name().as_ref()).to_string(), value)
                })
                .collect(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Follow a path of child names from this element.
    pub fn path(&self, names: &[impl AsRef<str>]) -> Option<&XmlElement> {
        names
            .iter()
            .try_fold(self, |el, name| el.child(name.as_ref()))
    }

    /// Concatenated text of all descendants, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        // Reversed so that text comes out in document order.
        let mut pending: Vec<&XmlNode> = self.children.iter().rev().collect();
        while let Some(node) = pending.pop() {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => pending.extend(e.children.iter().rev()),
            }
        }
        out.trim().to_string()
    }
}

/// Parse a document into its root element, or `None` if it has none.
pub fn parse(doc: &str) -> Result<Option<XmlElement>, quick_xml::Error> {
    let mut reader = Reader::from_str(doc);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut text = String::new();

    fn flush(text: &mut String, stack: &mut [XmlElement]) {
        if !text.trim().is_empty()
            && let Some(parent) = stack.last_mut()
        {
            parent.children.push(XmlNode::Text(std::mem::take(text)));
        }
        text.clear();
    }

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                flush(&mut text, &mut stack);
                stack.push(XmlElement::open(&e));
            }
            Event::Empty(e) => {
                flush(&mut text, &mut stack);
                let el = XmlElement::open(&e);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(el)),
                    None => {
                        root.get_or_insert(el);
                    }
                }
            }
            Event::End(_) => {
                flush(&mut text, &mut stack);
                if let Some(el) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(el)),
                        None => {
                            root.get_or_insert(el);
                        }
                    }
                }
            }
            Event::Text(t) => text.push_str(&String::from_utf8_lossy(t.as_ref())),
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(t.as_ref())),
            Event::GeneralRef(r) => {
                if let Ok(Some(c)) = r.resolve_char_ref() {
                    text.push(c);
                } else {
                    let name = String::from_utf8_lossy(r.as_ref()).to_string();
                    match resolve_predefined_entity(&name) {
                        Some(s) => text.push_str(s),
                        None => {
                            text.push('&');
                            text.push_str(&name);
                            text.push(';');
                        }
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(root)
}
