//! Style and template names, style definitions and style groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};
use crate::modules::ModuleRegistry;
use crate::properties::{materialize_properties, Property, PropertyDescription};
use crate::types::TypeFactory;
use crate::xml::XmlElement;

/// Split on `.` and `:`, dropping empty components.
fn name_components<'a>(kind: &str, value: &'a str) -> TokenizationResult<(Option<&'a str>, &'a str)> {
    let components: Vec<&str> = value.split(['.', ':']).filter(|c| !c.is_empty()).collect();
    match components.as_slice() {
        [name] => Ok((None, *name)),
        [group, name] => Ok((Some(*group), *name)),
        _ => Err(TokenizationError::InvalidName {
            kind: kind.to_string(),
            value: value.to_string(),
        }),
    }
}

/// `name` within the current component, or `:group:name` / `group.name` in a style group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleName {
    Local { name: String },
    Global { group: String, name: String },
}

impl StyleName {
    pub fn local(name: impl Into<String>) -> Self {
        StyleName::Local { name: name.into() }
    }

    pub fn global(group: impl Into<String>, name: impl Into<String>) -> Self {
        StyleName::Global {
            group: group.into(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StyleName::Local { name } | StyleName::Global { name, .. } => name,
        }
    }

    /// Qualify a local name into `group` when declared inside a named group.
    pub fn qualified(self, group: Option<&str>) -> StyleName {
        match (self, group) {
            (StyleName::Local { name }, Some(group)) => StyleName::global(group, name),
            (name, _) => name,
        }
    }
}

impl FromStr for StyleName {
    type Err = TokenizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match name_components("style", s)? {
            (None, name) => StyleName::local(name),
            (Some(group), name) => StyleName::global(group, name),
        })
    }
}

impl fmt::Display for StyleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleName::Local { name } => write!(f, "{}", name),
            StyleName::Global { group, name } => write!(f, ":{}:{}", group, name),
        }
    }
}

/// Same shape as [`StyleName`], naming a template
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateName {
    Local { name: String },
    Global { group: String, name: String },
}

impl TemplateName {
    pub fn name(&self) -> &str {
        match self {
            TemplateName::Local { name } | TemplateName::Global { name, .. } => name,
        }
    }

    pub fn qualified(self, group: Option<&str>) -> TemplateName {
        match (self, group) {
            (TemplateName::Local { name }, Some(group)) => TemplateName::Global {
                group: group.to_string(),
                name,
            },
            (name, _) => name,
        }
    }
}

impl FromStr for TemplateName {
    type Err = TokenizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match name_components("template", s)? {
            (None, name) => TemplateName::Local { name: name.to_string() },
            (Some(group), name) => TemplateName::Global {
                group: group.to_string(),
                name: name.to_string(),
            },
        })
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateName::Local { name } => write!(f, "{}", name),
            TemplateName::Global { group, name } => write!(f, ":{}:{}", group, name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessModifier {
    Public,
    #[default]
    Internal,
    Private,
}

impl FromStr for AccessModifier {
    type Err = TokenizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(AccessModifier::Public),
            "internal" => Ok(AccessModifier::Internal),
            "private" => Ok(AccessModifier::Private),
            other => Err(TokenizationError::UnknownEnumValue {
                value: other.to_string(),
                type_name: "AccessModifier".to_string(),
                expected: "public, internal, private".to_string(),
            }),
        }
    }
}

/// Properties an attributed text style or template may set
pub fn attributed_text_properties() -> Vec<PropertyDescription> {
    use crate::types::enums;
    vec![
        PropertyDescription::new("font", TypeFactory::Font.optional()),
        PropertyDescription::new("foregroundColor", TypeFactory::Color.optional()),
        PropertyDescription::new("backgroundColor", TypeFactory::Color.optional()),
        PropertyDescription::new("kern", TypeFactory::Float),
        PropertyDescription::new("strikethroughColor", TypeFactory::Color.optional()),
        PropertyDescription::new("underlineColor", TypeFactory::Color.optional()),
        PropertyDescription::nested(&["paragraphStyle"], "lineSpacing", TypeFactory::Float),
        PropertyDescription::nested(&["paragraphStyle"], "lineHeightMultiple", TypeFactory::Float),
        PropertyDescription::nested(
            &["paragraphStyle"],
            "alignment",
            TypeFactory::Enumeration(enums::text_alignment()),
        ),
    ]
}

/// Style for one inline tag of attributed text, e.g. `<b font=":bold@14"/>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedTextStyle {
    pub name: String,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleType {
    /// Bound to the element factory with this tag
    View { element: String },
    AttributedText { runs: Vec<AttributedTextStyle> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub name: StyleName,
    pub extend: Vec<StyleName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_modifier: Option<AccessModifier>,
    pub style_type: StyleType,
    pub properties: Vec<Property>,
}

impl Style {
    /// Own properties or runs bind a theme value; extends are not considered here.
    pub fn requires_theme(&self) -> bool {
        let runs = match &self.style_type {
            StyleType::AttributedText { runs } => runs.as_slice(),
            StyleType::View { .. } => &[],
        };
        self.properties.iter().any(Property::requires_theme)
            || runs.iter().flat_map(|r| &r.properties).any(Property::requires_theme)
    }

    /// Parse one child of `<styles>`; `group` names the enclosing group, if any.
    pub fn parse(element: &XmlElement, group: Option<&str>, registry: &ModuleRegistry) -> TokenizationResult<Style> {
        let name: StyleName = element.required_attribute("name")?.parse()?;
        if matches!(name, StyleName::Global { .. }) {
            return Err(TokenizationError::InvalidName {
                kind: "style".to_string(),
                value: name.to_string(),
            });
        }
        let name = name.qualified(group);
        let extend = parse_extend::<StyleName>(element)?
            .into_iter()
            .map(|parent| parent.qualified(group))
            .collect();
        let access_modifier = element
            .attribute("accessModifier")
            .map(str::parse::<AccessModifier>)
            .transpose()?;
        let attributes = own_attributes(element);

        let (style_type, properties) = if element.name == "attributedTextStyle" {
            let descriptions = attributed_text_properties();
            let materialized = materialize_properties(&descriptions, &element.name, &attributes, &element.children)?;
            let runs = materialized
                .remaining_children
                .into_iter()
                .map(|run| -> TokenizationResult<AttributedTextStyle> {
                    let run_attributes = run.attributes.clone();
                    let run_properties = materialize_properties(&descriptions, &run.name, &run_attributes, &[])?;
                    Ok(AttributedTextStyle {
                        name: run.name.clone(),
                        properties: run_properties.properties,
                    })
                })
                .collect::<TokenizationResult<Vec<_>>>()?;
            (StyleType::AttributedText { runs }, materialized.properties)
        } else {
            let tag = element
                .name
                .strip_suffix("Style")
                .filter(|tag| !tag.is_empty())
                .ok_or_else(|| unexpected(element))?;
            let factory = registry.element_factory(tag).ok_or_else(|| unexpected(element))?;
            let materialized = materialize_properties(&factory.properties, tag, &attributes, &element.children)
                .map_err(|err| match err {
                    TokenizationError::UnknownProperty { property, .. } => TokenizationError::InvalidStyleProperty {
                        style: name.to_string(),
                        property,
                        reason: format!("<{}> has no such property", tag),
                    },
                    other => other,
                })?;
            if let Some(child) = materialized.remaining_children.first() {
                return Err(TokenizationError::UnexpectedElement {
                    parent: element.name.clone(),
                    element: child.name.clone(),
                });
            }
            (
                StyleType::View {
                    element: tag.to_string(),
                },
                materialized.properties,
            )
        };

        Ok(Style {
            name,
            extend,
            access_modifier,
            style_type,
            properties,
        })
    }
}

fn unexpected(element: &XmlElement) -> TokenizationError {
    TokenizationError::UnexpectedElement {
        parent: "styles".to_string(),
        element: element.name.clone(),
    }
}

pub(crate) fn parse_extend<N: FromStr<Err = TokenizationError>>(element: &XmlElement) -> TokenizationResult<Vec<N>> {
    element
        .attribute("extend")
        .map(|value| value.split_whitespace().map(str::parse::<N>).collect())
        .unwrap_or_else(|| Ok(Vec::new()))
}

/// Attributes other than the structural `name`, `extend`, `accessModifier` and `style`
pub(crate) fn own_attributes(element: &XmlElement) -> Vec<(String, String)> {
    element
        .attributes
        .iter()
        .filter(|(name, _)| !matches!(name.as_str(), "name" | "extend" | "accessModifier" | "style"))
        .cloned()
        .collect()
}

/// The styles of one `<styles>` element, either a component's own or a shared group file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleGroup {
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_modifier: Option<AccessModifier>,
    pub styles: Vec<Style>,
}

impl StyleGroup {
    pub fn parse(element: &XmlElement, registry: &ModuleRegistry) -> TokenizationResult<StyleGroup> {
        if element.name != "styles" {
            return Err(TokenizationError::UnexpectedElement {
                parent: "document".to_string(),
                element: element.name.clone(),
            });
        }
        let name = element.attribute("name").map(str::to_string);
        let access_modifier = element
            .attribute("accessModifier")
            .map(str::parse::<AccessModifier>)
            .transpose()?;
        let styles = element
            .children
            .iter()
            .map(|child| Style::parse(child, name.as_deref(), registry))
            .collect::<TokenizationResult<Vec<_>>>()?;
        tracing::debug!(group = ?name, styles = styles.len(), "parsed style group");
        Ok(StyleGroup {
            name,
            access_modifier,
            styles,
        })
    }

    pub fn style(&self, name: &StyleName) -> Option<&Style> {
        self.styles.iter().find(|style| &style.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuntimePlatform;
    use crate::xml::parse_xml;

    fn registry() -> ModuleRegistry {
        ModuleRegistry::with_default_modules(RuntimePlatform::IOS).unwrap()
    }

    #[test]
    fn test_style_name_round_trip() {
        for (input, display) in [
            ("title", "title"),
            ("common.title", ":common:title"),
            (":common:title", ":common:title"),
            ("common:title", ":common:title"),
        ] {
            let parsed: StyleName = input.parse().unwrap();
            assert_eq!(parsed.to_string(), display);
            assert_eq!(display.parse::<StyleName>().unwrap(), parsed);
        }
    }

    #[test]
    fn test_invalid_names() {
        for input in ["", ":", "a.b.c", ":a:b:c"] {
            assert!(
                matches!(input.parse::<StyleName>(), Err(TokenizationError::InvalidName { .. })),
                "{:?} should be rejected",
                input
            );
            assert!(input.parse::<TemplateName>().is_err());
        }
    }

    #[test]
    fn test_group_qualifies_local_names() {
        let xml = r#"<styles name="common">
            <LabelStyle name="title" extend="base :other:body" font=":bold@20" />
            <LabelStyle name="base" textColor="@text" />
        </styles>"#;
        let group = StyleGroup::parse(&parse_xml(xml).unwrap(), &registry()).unwrap();
        let title = &group.styles[0];
        assert_eq!(title.name, StyleName::global("common", "title"));
        assert_eq!(
            title.extend,
            vec![StyleName::global("common", "base"), StyleName::global("other", "body")]
        );
        assert!(!title.requires_theme());
        assert!(group.styles[1].requires_theme());
    }

    #[test]
    fn test_style_property_must_exist_on_element() {
        let xml = r#"<styles><ButtonStyle name="primary" numberOfLines="2" /></styles>"#;
        let err = StyleGroup::parse(&parse_xml(xml).unwrap(), &registry()).unwrap_err();
        assert!(matches!(
            err,
            TokenizationError::InvalidStyleProperty { ref property, .. } if property == "numberOfLines"
        ));
    }

    #[test]
    fn test_attributed_text_style_runs() {
        let xml = r#"<styles>
            <attributedTextStyle name="body" font="@14">
                <b font=":bold@14" />
                <i foregroundColor="@accent" />
            </attributedTextStyle>
        </styles>"#;
        let group = StyleGroup::parse(&parse_xml(xml).unwrap(), &registry()).unwrap();
        let style = &group.styles[0];
        match &style.style_type {
            StyleType::AttributedText { runs } => {
                assert_eq!(runs.len(), 2);
                assert_eq!(runs[0].name, "b");
            }
            other => panic!("unexpected style type {:?}", other),
        }
        assert!(style.requires_theme());
    }

    #[test]
    fn test_access_modifier_defaults_to_internal() {
        assert_eq!(AccessModifier::default(), AccessModifier::Internal);
        assert_eq!("private".parse::<AccessModifier>().unwrap(), AccessModifier::Private);
        assert!("open".parse::<AccessModifier>().is_err());
    }

    #[test]
    fn test_unknown_style_element() {
        let xml = r#"<styles><WidgetStyle name="x" /></styles>"#;
        assert!(matches!(
            StyleGroup::parse(&parse_xml(xml).unwrap(), &registry()),
            Err(TokenizationError::UnexpectedElement { .. })
        ));
    }
}
