// Generic XML element tree
//
// quick-xml gives us a stream of events; metamodel parsing wants to walk
// parents and children freely, so the stream is folded into an owned tree.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// One XML element with its attributes and ordered child elements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Tag name as written, including any namespace prefix
    pub name: String,
    /// Attributes in document order, keys as written
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
}

/// Strip a namespace prefix (`ecore:EClass` -> `EClass`)
pub fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder helper used by tests and fixtures
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    /// Tag name without namespace prefix
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Attribute value by exact key, falling back to a local-name match
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .or_else(|| {
                let wanted = local_name(key);
                self.attributes
                    .iter()
                    .filter(|(k, _)| !k.starts_with("xmlns"))
                    .find(|(k, _)| local_name(k) == wanted)
            })
            .map(|(_, v)| v.as_str())
    }

    /// Direct children with the given local tag name
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.local_name() == tag)
    }

    /// All descendants with the given local tag name, in document order
    pub fn descendants_named(&self, tag: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(tag, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, tag: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.local_name() == tag {
                found.push(child);
            }
            child.collect_descendants(tag, found);
        }
    }
}

/// Parse an XML document into its root element
pub fn parse_xml(input: &str, path: &Path) -> Result<XmlElement> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(element_from(e, path)?);
            }
            Ok(Event::Empty(ref e)) => {
                let element = element_from(e, path)?;
                attach(element, &mut stack, &mut root, path)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::parse(path, "unexpected closing tag"))?;
                attach(element, &mut stack, &mut root, path)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::parse(
                    path,
                    format!("XML error at position {}: {}", reader.error_position(), e),
                ));
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::parse(path, "unexpected end of document"));
    }

    root.ok_or_else(|| Error::parse(path, "document has no root element"))
}

fn element_from(e: &BytesStart<'_>, path: &Path) -> Result<XmlElement> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| Error::parse(path, format!("invalid tag name: {}", err)))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::parse(path, format!("attribute error: {}", err)))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| Error::parse(path, format!("invalid attribute key: {}", err)))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::parse(path, format!("invalid value for '{}': {}", key, err)))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(Error::parse(path, "document has more than one root element"))
    } else {
        *root = Some(element);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<XmlElement> {
        parse_xml(input, Path::new("test.ecore"))
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("ecore:EPackage"), "EPackage");
        assert_eq!(local_name("eClassifiers"), "eClassifiers");
    }

    #[test]
    fn test_parse_nested_elements() {
        let root = parse(
            r#"<?xml version="1.0"?>
<ecore:EPackage xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore" name="shop">
  <eClassifiers name="Order">
    <eStructuralFeatures name="lines"/>
  </eClassifiers>
  <eClassifiers name="Line"/>
</ecore:EPackage>"#,
        )
        .unwrap();

        assert_eq!(root.name, "ecore:EPackage");
        assert_eq!(root.local_name(), "EPackage");
        assert_eq!(root.attr("name"), Some("shop"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].children[0].attr("name"), Some("lines"));
    }

    #[test]
    fn test_attr_local_name_fallback() {
        let element = XmlElement::new("eClassifiers")
            .with_attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
            .with_attr("xsi:type", "ecore:EClass");
        assert_eq!(element.attr("xsi:type"), Some("ecore:EClass"));
        assert_eq!(element.attr("type"), Some("ecore:EClass"));
        assert_eq!(element.attr("xsi"), None);
    }

    #[test]
    fn test_attribute_unescaping() {
        let root = parse(r#"<a doc="x &lt; y &amp; z"/>"#).unwrap();
        assert_eq!(root.attr("doc"), Some("x < y & z"));
    }

    #[test]
    fn test_descendants_named() {
        let root = parse(
            r#"<p><eClassifiers name="A"><eStructuralFeatures name="x"/></eClassifiers>
<eSubpackages><eClassifiers name="B"/></eSubpackages></p>"#,
        )
        .unwrap();

        let names: Vec<_> = root
            .descendants_named("eClassifiers")
            .iter()
            .filter_map(|e| e.attr("name"))
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(root.children_named("eSubpackages").count(), 1);
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let result = parse("<a><b></a>");
        assert!(result.is_err());
    }

    #[test]
    fn test_unclosed_document_fails() {
        let result = parse("<a><b/>");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_document_fails() {
        let err = parse("<?xml version=\"1.0\"?>").unwrap_err();
        assert!(err.to_string().contains("no root element"));
    }
}
