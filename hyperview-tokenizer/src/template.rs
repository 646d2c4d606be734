//! Attributed text templates with `{{argument}}` placeholders.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};
use crate::properties::{materialize_properties, Property};
use crate::style::{attributed_text_properties, own_attributes, parse_extend, AccessModifier, StyleName, TemplateName};
use crate::xml::XmlElement;

/// Argument names in order of first appearance
pub fn lex_arguments(text: &str) -> Vec<String> {
    static ARGUMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = ARGUMENT_REGEX.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

    let mut arguments: Vec<String> = Vec::new();
    for capture in regex.captures_iter(text) {
        let name = &capture[1];
        if !arguments.iter().any(|a| a == name) {
            arguments.push(name.to_string());
        }
    }
    arguments
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: TemplateName,
    pub extend: Vec<TemplateName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_modifier: Option<AccessModifier>,
    pub text: String,
    pub arguments: Vec<String>,
    /// Attributed text style applied to the generated string.
    ///
    /// Never qualified with the template group: style and template groups are
    /// separate namespaces, so shared styles are named `:group:name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleName>,
    pub properties: Vec<Property>,
}

impl Template {
    pub fn requires_theme(&self) -> bool {
        self.properties.iter().any(Property::requires_theme)
    }

    pub fn parse(element: &XmlElement, group: Option<&str>) -> TokenizationResult<Template> {
        if element.name != "attributedText" {
            return Err(TokenizationError::UnexpectedElement {
                parent: "templates".to_string(),
                element: element.name.clone(),
            });
        }
        let name: TemplateName = element.required_attribute("name")?.parse()?;
        if matches!(name, TemplateName::Global { .. }) {
            return Err(TokenizationError::InvalidName {
                kind: "template".to_string(),
                value: name.to_string(),
            });
        }
        let extend = parse_extend::<TemplateName>(element)?
            .into_iter()
            .map(|parent| parent.qualified(group))
            .collect();
        let style = element.attribute("style").map(str::parse::<StyleName>).transpose()?;
        let access_modifier = element
            .attribute("accessModifier")
            .map(str::parse::<AccessModifier>)
            .transpose()?;

        let materialized = materialize_properties(
            &attributed_text_properties(),
            &element.name,
            &own_attributes(element),
            &[],
        )?;
        let text = element.text_content().trim().to_string();

        Ok(Template {
            name: name.qualified(group),
            extend,
            access_modifier,
            arguments: lex_arguments(&text),
            text,
            style,
            properties: materialized.properties,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateGroup {
    pub name: Option<String>,
    pub templates: Vec<Template>,
}

impl TemplateGroup {
    pub fn parse(element: &XmlElement) -> TokenizationResult<TemplateGroup> {
        if element.name != "templates" {
            return Err(TokenizationError::UnexpectedElement {
                parent: "document".to_string(),
                element: element.name.clone(),
            });
        }
        let name = element.attribute("name").map(str::to_string);
        let templates = element
            .children
            .iter()
            .map(|child| Template::parse(child, name.as_deref()))
            .collect::<TokenizationResult<Vec<_>>>()?;
        Ok(TemplateGroup { name, templates })
    }

    pub fn template(&self, name: &TemplateName) -> Option<&Template> {
        self.templates.iter().find(|t| &t.name == name)
    }
}
