//! Property descriptions (what an element accepts) and materialized properties
//! (what a document sets).

use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};
use crate::types::{Materialization, SupportedValue, TypeFactory};
use crate::xml::XmlElement;

/// One segment of the path a property is applied through, e.g. `layer` in `layer.cornerRadius`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyNamespace {
    pub name: String,
    /// The segment is an optional member, generated with `?.`
    pub is_optional: bool,
}

impl PropertyNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_optional: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_optional: true,
        }
    }
}

fn join_key_path(namespace: &[PropertyNamespace], name: &str) -> String {
    namespace
        .iter()
        .map(|segment| segment.name.as_str())
        .chain(std::iter::once(name))
        .collect::<Vec<_>>()
        .join(".")
}

/// A property an element factory accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescription {
    pub namespace: Vec<PropertyNamespace>,
    pub name: String,
    pub type_factory: TypeFactory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SupportedValue>,
}

impl PropertyDescription {
    pub fn new(name: &str, type_factory: TypeFactory) -> Self {
        Self {
            namespace: Vec::new(),
            name: name.to_string(),
            type_factory,
            default_value: None,
        }
    }

    pub fn nested(namespace: &[&str], name: &str, type_factory: TypeFactory) -> Self {
        Self {
            namespace: namespace.iter().map(|n| PropertyNamespace::new(*n)).collect(),
            ..Self::new(name, type_factory)
        }
    }

    pub fn with_default(mut self, value: SupportedValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Dotted attribute name, e.g. `layer.cornerRadius`
    pub fn key_path(&self) -> String {
        join_key_path(&self.namespace, &self.name)
    }

    /// Materialize a raw attribute value for this property.
    pub fn materialize(&self, raw: &str, element: &str) -> TokenizationResult<Property> {
        let value = PropertyValue::parse(raw, |literal| {
            self.type_factory
                .materialize_attribute(literal, &format!("{}.{}", element, self.key_path()))
        })?;
        Ok(self.property(value))
    }

    pub fn property(&self, value: PropertyValue) -> Property {
        Property {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            value,
            type_factory: self.type_factory.clone(),
            default_value: self.default_value.clone(),
        }
    }
}

/// The value a document assigns to a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyValue {
    Value(SupportedValue),
    /// `$name`: bound to a state item
    State(String),
    /// `@name`: resolved from the active theme at runtime
    Theme(String),
}

impl PropertyValue {
    /// `$name` binds state, `@name` a theme value, `$$` / `@@` escape a literal first character.
    pub fn parse(
        raw: &str,
        literal: impl FnOnce(&str) -> TokenizationResult<SupportedValue>,
    ) -> TokenizationResult<PropertyValue> {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix("$$") {
            return literal(&format!("${}", rest)).map(PropertyValue::Value);
        }
        if let Some(rest) = trimmed.strip_prefix("@@") {
            return literal(&format!("@{}", rest)).map(PropertyValue::Value);
        }
        if let Some(name) = trimmed.strip_prefix('$') {
            return Ok(PropertyValue::State(name.to_string()));
        }
        if let Some(name) = trimmed.strip_prefix('@') {
            // fonts start with '@' too
            if !name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                return Ok(PropertyValue::Theme(name.to_string()));
            }
        }
        literal(raw).map(PropertyValue::Value)
    }
}

/// A property set on an element, style or template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub namespace: Vec<PropertyNamespace>,
    pub name: String,
    pub value: PropertyValue,
    pub type_factory: TypeFactory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SupportedValue>,
}

impl Property {
    pub fn key_path(&self) -> String {
        join_key_path(&self.namespace, &self.name)
    }

    pub fn state_name(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::State(name) => Some(name),
            _ => None,
        }
    }

    pub fn requires_theme(&self) -> bool {
        matches!(self.value, PropertyValue::Theme(_))
    }
}

/// Properties materialized from an element plus the children that were not consumed as properties
pub struct MaterializedProperties<'a> {
    pub properties: Vec<Property>,
    pub remaining_children: Vec<&'a XmlElement>,
}

/// Materialize `attributes` and property children of `element_name` against `descriptions`.
///
/// Attributes must already exclude structural ones (`field`, `style`, `layout:*`, ...).
pub fn materialize_properties<'a>(
    descriptions: &[PropertyDescription],
    element_name: &str,
    attributes: &[(String, String)],
    children: &'a [XmlElement],
) -> TokenizationResult<MaterializedProperties<'a>> {
    let mut properties = Vec::new();
    let mut grouped: Vec<(&PropertyDescription, Vec<(String, String)>)> = Vec::new();

    for (name, raw) in attributes {
        if let Some(description) = descriptions.iter().find(|d| &d.key_path() == name) {
            properties.push(description.materialize(raw, element_name)?);
            continue;
        }

        let multi = descriptions.iter().find_map(|d| {
            if d.type_factory.materialization() != Materialization::MultipleAttribute {
                return None;
            }
            name.strip_prefix(&format!("{}.", d.key_path()))
                .map(|component| (d, component))
        });
        match multi {
            Some((description, component)) => {
                let pair = (component.to_string(), raw.clone());
                match grouped.iter_mut().find(|(d, _)| std::ptr::eq(*d, description)) {
                    Some((_, components)) => components.push(pair),
                    None => grouped.push((description, vec![pair])),
                }
            }
            None => {
                return Err(TokenizationError::UnknownProperty {
                    element: element_name.to_string(),
                    property: name.clone(),
                })
            }
        }
    }

    for (description, components) in grouped {
        let context = format!("{}.{}", element_name, description.key_path());
        let value = description
            .type_factory
            .materialize_attributes(&components, &context)?;
        properties.push(description.property(PropertyValue::Value(value)));
    }

    let mut remaining_children = Vec::new();
    for child in children {
        let element_property = descriptions.iter().find(|d| {
            d.type_factory.materialization() == Materialization::Element && d.key_path() == child.name
        });
        match element_property {
            Some(description) => {
                let value = description.type_factory.materialize_element(child)?;
                properties.push(description.property(PropertyValue::Value(value)));
            }
            None => remaining_children.push(child),
        }
    }

    Ok(MaterializedProperties {
        properties,
        remaining_children,
    })
}

/// Keep the last property for each key path, in order of last occurrence.
pub fn merge_properties(properties: impl IntoIterator<Item = Property>) -> Vec<Property> {
    let mut merged: Vec<Property> = Vec::new();
    for property in properties {
        let key = property.key_path();
        merged.retain(|existing| existing.key_path() != key);
        merged.push(property);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_xml;

    fn descriptions() -> Vec<PropertyDescription> {
        vec![
            PropertyDescription::new("text", TypeFactory::String.optional()),
            PropertyDescription::new("numberOfLines", TypeFactory::Integer),
            PropertyDescription::nested(&["layer"], "cornerRadius", TypeFactory::Float),
            PropertyDescription::new("layoutMargins", TypeFactory::EdgeInsets),
            PropertyDescription::new("attributedText", TypeFactory::AttributedText.optional()),
        ]
    }

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_property_value_forms() {
        let literal = |s: &str| Ok(SupportedValue::String(s.to_string()));
        assert_eq!(
            PropertyValue::parse("$email", literal).unwrap(),
            PropertyValue::State("email".to_string())
        );
        assert_eq!(
            PropertyValue::parse("@primary", literal).unwrap(),
            PropertyValue::Theme("primary".to_string())
        );
        assert_eq!(
            PropertyValue::parse("$$5", literal).unwrap(),
            PropertyValue::Value(SupportedValue::String("$5".to_string()))
        );
        assert_eq!(
            PropertyValue::parse("@16", literal).unwrap(),
            PropertyValue::Value(SupportedValue::String("@16".to_string()))
        );
    }

    #[test]
    fn test_materialize_routes_by_key_path() {
        let result = materialize_properties(
            &descriptions(),
            "Label",
            &attrs(&[
                ("text", "Hello"),
                ("layer.cornerRadius", "4"),
                ("layoutMargins.top", "8"),
                ("layoutMargins.bottom", "2"),
            ]),
            &[],
        )
        .unwrap();
        let keys: Vec<String> = result.properties.iter().map(Property::key_path).collect();
        assert_eq!(keys, vec!["text", "layer.cornerRadius", "layoutMargins"]);
        assert_eq!(result.properties[1].namespace, vec![PropertyNamespace::new("layer")]);
        assert_eq!(
            result.properties[2].value,
            PropertyValue::Value(SupportedValue::EdgeInsets {
                top: 8.0,
                left: 0.0,
                bottom: 2.0,
                right: 0.0
            })
        );
    }

    #[test]
    fn test_element_properties_consume_children() {
        let element = parse_xml("<Label><attributedText>Hi <b>you</b></attributedText><View /></Label>").unwrap();
        let result = materialize_properties(&descriptions(), "Label", &[], &element.children).unwrap();
        assert_eq!(result.properties.len(), 1);
        assert_eq!(result.properties[0].name, "attributedText");
        assert_eq!(result.remaining_children.len(), 1);
        assert_eq!(result.remaining_children[0].name, "View");
    }

    #[test]
    fn test_unknown_attribute_fails() {
        let err = materialize_properties(&descriptions(), "Label", &attrs(&[("txet", "x")]), &[])
            .err()
            .unwrap();
        assert_eq!(
            err,
            TokenizationError::UnknownProperty {
                element: "Label".to_string(),
                property: "txet".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_literal_reports_context() {
        let err = materialize_properties(&descriptions(), "Label", &attrs(&[("numberOfLines", "many")]), &[])
            .err()
            .unwrap();
        match err {
            TokenizationError::InvalidValue { value, context, .. } => {
                assert_eq!(value, "many");
                assert_eq!(context, "Label.numberOfLines");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_merge_keeps_last_per_key() {
        let description = PropertyDescription::new("text", TypeFactory::String);
        let a = description.property(PropertyValue::Value(SupportedValue::String("a".into())));
        let b = PropertyDescription::new("alpha", TypeFactory::Float)
            .property(PropertyValue::Value(SupportedValue::Float(1.0)));
        let c = description.property(PropertyValue::Value(SupportedValue::String("c".into())));
        let merged = merge_properties(vec![a, b.clone(), c.clone()]);
        assert_eq!(merged, vec![b, c]);
    }
}
