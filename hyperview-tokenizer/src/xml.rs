//! Owned XML element tree produced from component, style and template files.
//!
//! Parsing goes through `roxmltree`; the borrowed tree is copied into
//! [`XmlElement`] values so definitions can outlive the source text.

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};

/// Synthetic root tag used to pre-declare the reserved namespace prefixes
const WRAPPER: &str = "__hyperview_root__";

/// Prefixes every document may use without declaring them
const RESERVED_NAMESPACES: &[(&str, &str)] = &[
    ("layout", "http://schema.hyperview.dev/layout"),
    ("rx", "http://schema.hyperview.dev/rx"),
    ("action", "http://schema.hyperview.dev/action"),
    ("state", "http://schema.hyperview.dev/state"),
];

fn wrap(xml: &str) -> String {
    let declarations: String = RESERVED_NAMESPACES
        .iter()
        .map(|(prefix, uri)| format!(" xmlns:{}=\"{}\"", prefix, uri))
        .collect();
    format!("<{0}{1}>{2}</{0}>", WRAPPER, declarations, strip_prolog(xml))
}

/// Drop a leading `<?xml ... ?>` declaration, which may not appear inside the wrapper.
fn strip_prolog(xml: &str) -> &str {
    let trimmed = xml.trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return &trimmed[end + 2..];
        }
    }
    trimmed
}

/// A parsed XML element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlElement {
    /// Qualified name, `prefix:local` for namespaced elements
    pub name: String,
    /// Attributes in document order, qualified the same way as `name`
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Text before the first child element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Text between this element's end tag and the next sibling element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            tail: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn required_attribute(&self, name: &str) -> TokenizationResult<&str> {
        self.attribute(name)
            .ok_or_else(|| TokenizationError::MissingAttribute {
                element: self.name.clone(),
                attribute: name.to_string(),
            })
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn children_named<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a XmlElement> + 'b
    where
        'a: 'b,
    {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Exactly one or no child named `name`.
    pub fn single_child(&self, name: &str) -> TokenizationResult<Option<&XmlElement>> {
        let mut matching = self.children.iter().filter(|child| child.name == name);
        let first = matching.next();
        let rest = matching.count();
        if rest > 0 {
            return Err(TokenizationError::UnexpectedChildCount {
                parent: self.name.clone(),
                child: name.to_string(),
                count: rest + 1,
            });
        }
        Ok(first)
    }

    /// Local part of the name (after any `prefix:`)
    pub fn local_name(&self) -> &str {
        split_prefix(&self.name).1
    }

    /// Text of this element and all descendants, tails included.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }
}

/// Split `prefix:local` into its parts; unprefixed names yield `None`.
pub fn split_prefix(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Parse a document that must contain exactly one root element.
pub fn parse_xml(xml: &str) -> TokenizationResult<XmlElement> {
    let wrapped = wrap(xml);
    let doc = roxmltree::Document::parse(&wrapped)?;
    let root = doc.root_element();

    let mut roots = element_children(root);
    let first = roots
        .next()
        .ok_or_else(|| TokenizationError::Xml("document has no root element".to_string()))?;
    if roots.next().is_some() {
        return Err(TokenizationError::Xml(
            "document has more than one root element".to_string(),
        ));
    }

    Ok(convert(first))
}

/// Iterator over element children (skips text/CDATA/comment nodes).
fn element_children<'a>(node: Node<'a, 'a>) -> impl Iterator<Item = Node<'a, 'a>> {
    node.children().filter(|n| n.is_element())
}

fn qualified_name(node: Node, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

fn convert(node: Node) -> XmlElement {
    let tag = node.tag_name();
    let mut element = XmlElement::new(qualified_name(node, tag.namespace(), tag.name()));

    for attr in node.attributes() {
        element.attributes.push((
            qualified_name(node, attr.namespace(), attr.name()),
            attr.value().to_string(),
        ));
    }

    let mut pending = String::new();
    for child in node.children() {
        if child.is_element() {
            flush_text(&mut element, &mut pending);
            element.children.push(convert(child));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                pending.push_str(text);
            }
        }
    }
    flush_text(&mut element, &mut pending);

    element
}

/// Attach accumulated text either as the element's leading text or as the tail of its last child.
fn flush_text(element: &mut XmlElement, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending);
    match element.children.last_mut() {
        Some(last) => last.tail = Some(text),
        None => element.text = Some(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attributes_in_order() {
        let root = parse_xml(r#"<Label text="hi" field="title" />"#).unwrap();
        assert_eq!(root.name, "Label");
        assert_eq!(
            root.attributes,
            vec![
                ("text".to_string(), "hi".to_string()),
                ("field".to_string(), "title".to_string())
            ]
        );
    }

    #[test]
    fn test_reserved_prefixes_need_no_declaration() {
        let root = parse_xml(
            r#"<Component><Button action:tap="submit" layout:top="super" /><rx:disposeBags /></Component>"#,
        )
        .unwrap();
        assert_eq!(root.children[0].attribute("action:tap"), Some("submit"));
        assert_eq!(root.children[0].attribute("layout:top"), Some("super"));
        assert_eq!(root.children[1].name, "rx:disposeBags");
        assert_eq!(root.children[1].local_name(), "disposeBags");
    }

    #[test]
    fn test_prolog_is_stripped() {
        let root = parse_xml("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Component />").unwrap();
        assert_eq!(root.name, "Component");
    }

    #[test]
    fn test_mixed_content_keeps_tails() {
        let root = parse_xml("<text>Hello <b>big</b> world</text>").unwrap();
        assert_eq!(root.text.as_deref(), Some("Hello "));
        assert_eq!(root.children[0].text.as_deref(), Some("big"));
        assert_eq!(root.children[0].tail.as_deref(), Some(" world"));
        assert_eq!(root.text_content(), "Hello big world");
    }

    #[test]
    fn test_single_child_rejects_duplicates() {
        let root = parse_xml("<Component><state /><state /></Component>").unwrap();
        let err = root.single_child("state").unwrap_err();
        assert!(matches!(
            err,
            TokenizationError::UnexpectedChildCount { count: 2, .. }
        ));
        assert!(root.single_child("styles").unwrap().is_none());
    }

    #[test]
    fn test_child_outlives_lookup_name() {
        let root = parse_xml("<Component><state><count type=\"Int\" /></state></Component>").unwrap();
        let state = {
            let name = String::from("state");
            root.single_child(&name).unwrap()
        };
        assert_eq!(state.map(|s| s.children.len()), Some(1));

        let named: Vec<&XmlElement> = {
            let name = String::from("state");
            let collected = root.children_named(&name).collect();
            collected
        };
        assert_eq!(named.len(), 1);
    }

    #[test]
    fn test_malformed_xml() {
        let result = parse_xml("<Component><Label></Component>");
        assert!(matches!(result, Err(TokenizationError::Xml(_))));
    }
}
