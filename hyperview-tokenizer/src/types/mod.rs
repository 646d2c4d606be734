//! Typed property values and the factories that materialize them.
//!
//! A [`TypeFactory`] knows how to turn raw XML (one attribute, a group of
//! attributes, or a whole element) into a [`SupportedValue`], and which
//! runtime type the value maps onto for each [`RuntimePlatform`].

pub mod enums;
pub mod values;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};
use crate::xml::XmlElement;

pub use enums::EnumTypeFactory;
pub use values::{AttributedTextRun, Color, Font, FontWeight, SupportedValue};

/// Target platform of a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuntimePlatform {
    #[serde(rename = "iOS")]
    IOS,
    #[serde(rename = "tvOS")]
    TvOS,
    #[serde(rename = "macOS")]
    MacOS,
}

impl RuntimePlatform {
    pub const ALL: [RuntimePlatform; 3] = [
        RuntimePlatform::IOS,
        RuntimePlatform::TvOS,
        RuntimePlatform::MacOS,
    ];

    /// UIKit-based platforms share type names
    pub fn is_uikit(self) -> bool {
        matches!(self, RuntimePlatform::IOS | RuntimePlatform::TvOS)
    }
}

impl fmt::Display for RuntimePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimePlatform::IOS => write!(f, "iOS"),
            RuntimePlatform::TvOS => write!(f, "tvOS"),
            RuntimePlatform::MacOS => write!(f, "macOS"),
        }
    }
}

impl FromStr for RuntimePlatform {
    type Err = TokenizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(RuntimePlatform::IOS),
            "tvos" => Ok(RuntimePlatform::TvOS),
            "macos" => Ok(RuntimePlatform::MacOS),
            _ => Err(TokenizationError::UnknownEnumValue {
                value: s.to_string(),
                type_name: "RuntimePlatform".to_string(),
                expected: "iOS, tvOS, macOS".to_string(),
            }),
        }
    }
}

/// The platform type a value is generated as
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeType {
    Named { name: String, modules: Vec<String> },
    Unsupported,
}

impl RuntimeType {
    pub fn named(name: impl Into<String>) -> Self {
        RuntimeType::Named {
            name: name.into(),
            modules: Vec::new(),
        }
    }

    pub fn with_module(name: impl Into<String>, module: impl Into<String>) -> Self {
        RuntimeType::Named {
            name: name.into(),
            modules: vec![module.into()],
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RuntimeType::Named { name, .. } => Some(name),
            RuntimeType::Unsupported => None,
        }
    }

    fn optional(self) -> Self {
        match self {
            RuntimeType::Named { name, modules } => RuntimeType::Named {
                name: format!("{}?", name),
                modules,
            },
            RuntimeType::Unsupported => RuntimeType::Unsupported,
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeType::Named { name, .. } => write!(f, "{}", name),
            RuntimeType::Unsupported => write!(f, "<unsupported>"),
        }
    }
}

/// Schema category used when generating XSD documents for editors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum XsdType {
    String,
    Integer,
    Decimal,
    Boolean,
    Token,
    Enumeration(Vec<String>),
    Pattern(String),
}

/// How a type reads its value out of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Materialization {
    /// A single attribute, e.g. `textColor="#fff"`
    Attribute,
    /// Several attributes sharing a prefix, e.g. `layoutMargins.top="8"`
    MultipleAttribute,
    /// A child element, e.g. `<attributedText>`
    Element,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeFactory {
    String,
    Integer,
    Float,
    Double,
    Bool,
    Color,
    Font,
    Image,
    Url,
    Size,
    Point,
    Rect,
    EdgeInsets,
    AttributedText,
    Enumeration(EnumTypeFactory),
    Optional(Box<TypeFactory>),
    /// A view instance, used for action parameters referencing elements
    View { runtime_name: String },
    /// The whole state object of a nested component
    ComponentState { component: String },
}

const INSET_KEYS: &[&str] = &["top", "left", "bottom", "right"];
const RECT_KEYS: &[&str] = &["x", "y", "width", "height"];

impl TypeFactory {
    /// Wrap in `Optional` unless already optional.
    pub fn optional(self) -> TypeFactory {
        match self {
            TypeFactory::Optional(_) => self,
            other => TypeFactory::Optional(Box::new(other)),
        }
    }

    /// The factory with any optional wrapper removed
    pub fn unwrapped(&self) -> &TypeFactory {
        match self {
            TypeFactory::Optional(inner) => inner.unwrapped(),
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeFactory::Optional(_))
    }

    /// Name used in XML (`type="Color?"`, `Int(5)`)
    pub fn type_name(&self) -> String {
        match self {
            TypeFactory::String => "String".to_string(),
            TypeFactory::Integer => "Int".to_string(),
            TypeFactory::Float => "Float".to_string(),
            TypeFactory::Double => "Double".to_string(),
            TypeFactory::Bool => "Bool".to_string(),
            TypeFactory::Color => "Color".to_string(),
            TypeFactory::Font => "Font".to_string(),
            TypeFactory::Image => "Image".to_string(),
            TypeFactory::Url => "URL".to_string(),
            TypeFactory::Size => "Size".to_string(),
            TypeFactory::Point => "Point".to_string(),
            TypeFactory::Rect => "Rect".to_string(),
            TypeFactory::EdgeInsets => "EdgeInsets".to_string(),
            TypeFactory::AttributedText => "AttributedText".to_string(),
            TypeFactory::Enumeration(factory) => factory.name.clone(),
            TypeFactory::Optional(inner) => format!("{}?", inner.type_name()),
            TypeFactory::View { runtime_name } => runtime_name.clone(),
            TypeFactory::ComponentState { component } => format!("{}.State", component),
        }
    }

    pub fn materialization(&self) -> Materialization {
        match self {
            TypeFactory::Optional(inner) => inner.materialization(),
            TypeFactory::Rect | TypeFactory::EdgeInsets => Materialization::MultipleAttribute,
            TypeFactory::AttributedText => Materialization::Element,
            _ => Materialization::Attribute,
        }
    }

    pub fn xsd_type(&self) -> XsdType {
        match self {
            TypeFactory::String | TypeFactory::AttributedText => XsdType::String,
            TypeFactory::Integer => XsdType::Integer,
            TypeFactory::Float | TypeFactory::Double => XsdType::Decimal,
            TypeFactory::Bool => XsdType::Boolean,
            TypeFactory::Color => {
                XsdType::Pattern(r"(#[0-9a-fA-F]{3}|#[0-9a-fA-F]{6}|#[0-9a-fA-F]{8}|\w+)".to_string())
            }
            TypeFactory::Font => XsdType::Pattern(r"(:\w+)?(\w[\w ]*)?@[0-9.]+".to_string()),
            TypeFactory::Size | TypeFactory::Point => {
                XsdType::Pattern(r"-?[0-9.]+\s*,\s*-?[0-9.]+".to_string())
            }
            TypeFactory::Enumeration(factory) => XsdType::Enumeration(factory.cases.clone()),
            TypeFactory::Optional(inner) => inner.xsd_type(),
            TypeFactory::Image
            | TypeFactory::Url
            | TypeFactory::Rect
            | TypeFactory::EdgeInsets
            | TypeFactory::View { .. }
            | TypeFactory::ComponentState { .. } => XsdType::Token,
        }
    }

    pub fn runtime_type(&self, platform: RuntimePlatform) -> RuntimeType {
        let uikit = platform.is_uikit();
        let pick = |ui: &str, ns: &str| {
            if uikit {
                RuntimeType::with_module(ui, "UIKit")
            } else {
                RuntimeType::with_module(ns, "AppKit")
            }
        };
        match self {
            TypeFactory::String => RuntimeType::named("String"),
            TypeFactory::Integer => RuntimeType::named("Int"),
            TypeFactory::Float => RuntimeType::with_module("CGFloat", "CoreGraphics"),
            TypeFactory::Double => RuntimeType::named("Double"),
            TypeFactory::Bool => RuntimeType::named("Bool"),
            TypeFactory::Url => RuntimeType::with_module("URL", "Foundation"),
            TypeFactory::Color => pick("UIColor", "NSColor"),
            TypeFactory::Font => pick("UIFont", "NSFont"),
            TypeFactory::Image => pick("UIImage", "NSImage"),
            TypeFactory::EdgeInsets => pick("UIEdgeInsets", "NSEdgeInsets"),
            TypeFactory::Size => RuntimeType::with_module("CGSize", "CoreGraphics"),
            TypeFactory::Point => RuntimeType::with_module("CGPoint", "CoreGraphics"),
            TypeFactory::Rect => RuntimeType::with_module("CGRect", "CoreGraphics"),
            TypeFactory::AttributedText => RuntimeType::with_module("NSAttributedString", "Foundation"),
            TypeFactory::Enumeration(factory) => factory.runtime_type(platform),
            TypeFactory::Optional(inner) => inner.runtime_type(platform).optional(),
            TypeFactory::View { runtime_name } => RuntimeType::named(runtime_name.clone()),
            TypeFactory::ComponentState { component } => {
                RuntimeType::named(format!("{}.State", component))
            }
        }
    }

    /// Types that can be written as a single attribute literal on `platform`.
    pub fn supported_attribute_types(platform: RuntimePlatform) -> Vec<TypeFactory> {
        let mut types = vec![
            TypeFactory::String,
            TypeFactory::Integer,
            TypeFactory::Float,
            TypeFactory::Double,
            TypeFactory::Bool,
            TypeFactory::Color,
            TypeFactory::Font,
            TypeFactory::Image,
            TypeFactory::Url,
            TypeFactory::Size,
            TypeFactory::Point,
        ];
        types.extend(
            enums::builtin_enums()
                .into_iter()
                .filter(|factory| factory.runtime_type(platform) != RuntimeType::Unsupported)
                .map(TypeFactory::Enumeration),
        );
        types
    }

    /// Look up an attribute-capable type by its XML name; a trailing `?` makes it optional.
    pub fn attribute_type_named(name: &str, platform: RuntimePlatform) -> TokenizationResult<TypeFactory> {
        let trimmed = name.trim();
        let (base, optional) = match trimmed.strip_suffix('?') {
            Some(base) => (base, true),
            None => (trimmed, false),
        };
        let factory = TypeFactory::supported_attribute_types(platform)
            .into_iter()
            .find(|factory| factory.type_name() == base)
            .ok_or_else(|| TokenizationError::UnknownType {
                name: name.to_string(),
                platform,
            })?;
        Ok(if optional { factory.optional() } else { factory })
    }

    /// Materialize a single attribute value. `context` names the attribute for error messages.
    pub fn materialize_attribute(&self, value: &str, context: &str) -> TokenizationResult<SupportedValue> {
        let invalid = || TokenizationError::InvalidValue {
            value: value.to_string(),
            type_name: self.type_name(),
            context: context.to_string(),
        };
        match self {
            TypeFactory::Optional(inner) => inner.materialize_attribute(value, context),
            TypeFactory::String => Ok(SupportedValue::String(value.to_string())),
            TypeFactory::Integer => value
                .trim()
                .parse::<i64>()
                .map(SupportedValue::Integer)
                .map_err(|_| invalid()),
            TypeFactory::Float | TypeFactory::Double => values::parse_number(value)
                .map(SupportedValue::Float)
                .ok_or_else(invalid),
            TypeFactory::Bool => match value.trim() {
                "true" => Ok(SupportedValue::Bool(true)),
                "false" => Ok(SupportedValue::Bool(false)),
                _ => Err(invalid()),
            },
            TypeFactory::Color => Color::parse(value).map(SupportedValue::Color).ok_or_else(invalid),
            TypeFactory::Font => Font::parse(value, context).map(SupportedValue::Font),
            TypeFactory::Image => {
                if value.trim().is_empty() {
                    Err(invalid())
                } else {
                    Ok(SupportedValue::Image(value.trim().to_string()))
                }
            }
            TypeFactory::Url => {
                if value.contains("://") {
                    Ok(SupportedValue::Url(value.trim().to_string()))
                } else {
                    Err(invalid())
                }
            }
            TypeFactory::Size => values::parse_pair(value)
                .map(|(width, height)| SupportedValue::Size { width, height })
                .ok_or_else(invalid),
            TypeFactory::Point => values::parse_pair(value)
                .map(|(x, y)| SupportedValue::Point { x, y })
                .ok_or_else(invalid),
            TypeFactory::Enumeration(factory) => factory.materialize(value),
            TypeFactory::Rect
            | TypeFactory::EdgeInsets
            | TypeFactory::AttributedText
            | TypeFactory::View { .. }
            | TypeFactory::ComponentState { .. } => Err(TokenizationError::NotMaterializable {
                type_name: self.type_name(),
                source_kind: "a single attribute".to_string(),
            }),
        }
    }

    /// Materialize from attributes whose names had the property prefix stripped
    /// (`layoutMargins.top` arrives as `top`).
    pub fn materialize_attributes(
        &self,
        attributes: &[(String, String)],
        context: &str,
    ) -> TokenizationResult<SupportedValue> {
        let component = |key: &str| -> TokenizationResult<f64> {
            match attributes.iter().find(|(name, _)| name == key) {
                Some((_, raw)) => values::parse_number(raw).ok_or_else(|| TokenizationError::InvalidValue {
                    value: raw.clone(),
                    type_name: "Float".to_string(),
                    context: format!("{}.{}", context, key),
                }),
                None => Ok(0.0),
            }
        };
        let check_keys = |allowed: &[&str]| -> TokenizationResult<()> {
            match attributes.iter().find(|(name, _)| !allowed.contains(&name.as_str())) {
                Some((name, _)) => Err(TokenizationError::UnknownProperty {
                    element: context.to_string(),
                    property: name.clone(),
                }),
                None => Ok(()),
            }
        };
        match self {
            TypeFactory::Optional(inner) => inner.materialize_attributes(attributes, context),
            TypeFactory::EdgeInsets => {
                check_keys(INSET_KEYS)?;
                Ok(SupportedValue::EdgeInsets {
                    top: component("top")?,
                    left: component("left")?,
                    bottom: component("bottom")?,
                    right: component("right")?,
                })
            }
            TypeFactory::Rect => {
                check_keys(RECT_KEYS)?;
                Ok(SupportedValue::Rect {
                    x: component("x")?,
                    y: component("y")?,
                    width: component("width")?,
                    height: component("height")?,
                })
            }
            _ => Err(TokenizationError::NotMaterializable {
                type_name: self.type_name(),
                source_kind: "multiple attributes".to_string(),
            }),
        }
    }

    pub fn materialize_element(&self, element: &XmlElement) -> TokenizationResult<SupportedValue> {
        match self {
            TypeFactory::Optional(inner) => inner.materialize_element(element),
            TypeFactory::AttributedText => Ok(SupportedValue::AttributedText(
                values::attributed_runs(element),
            )),
            _ => Err(TokenizationError::NotMaterializable {
                type_name: self.type_name(),
                source_kind: format!("element <{}>", element.name),
            }),
        }
    }
}

impl fmt::Display for TypeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_does_not_double_wrap() {
        let once = TypeFactory::String.optional();
        let twice = once.clone().optional();
        assert_eq!(once, twice);
        assert!(twice.is_nullable());
        assert_eq!(twice.unwrapped(), &TypeFactory::String);
    }

    #[test]
    fn test_optional_delegates_materialization() {
        let factory = TypeFactory::Integer.optional();
        assert_eq!(
            factory.materialize_attribute("42", "numberOfLines").unwrap(),
            SupportedValue::Integer(42)
        );
        assert_eq!(factory.materialization(), Materialization::Attribute);
        assert_eq!(factory.xsd_type(), XsdType::Integer);
    }

    #[test]
    fn test_runtime_type_depends_on_platform() {
        assert_eq!(
            TypeFactory::Color.runtime_type(RuntimePlatform::IOS).name(),
            Some("UIColor")
        );
        assert_eq!(
            TypeFactory::Color.runtime_type(RuntimePlatform::MacOS).name(),
            Some("NSColor")
        );
        assert_eq!(
            TypeFactory::String.optional().runtime_type(RuntimePlatform::IOS).name(),
            Some("String?")
        );
    }

    #[test]
    fn test_attribute_type_named() {
        let factory = TypeFactory::attribute_type_named("String?", RuntimePlatform::IOS).unwrap();
        assert_eq!(factory, TypeFactory::String.optional());

        let err = TypeFactory::attribute_type_named("Widget", RuntimePlatform::IOS).unwrap_err();
        assert!(matches!(err, TokenizationError::UnknownType { .. }));

        // not attribute-capable
        assert!(TypeFactory::attribute_type_named("EdgeInsets", RuntimePlatform::IOS).is_err());
    }

    #[test]
    fn test_invalid_value_names_raw_text_and_context() {
        let err = TypeFactory::Bool
            .materialize_attribute("yes", "isHidden")
            .unwrap_err();
        assert_eq!(
            err,
            TokenizationError::InvalidValue {
                value: "yes".to_string(),
                type_name: "Bool".to_string(),
                context: "isHidden".to_string(),
            }
        );
    }

    #[test]
    fn test_multiple_attribute_insets() {
        let attributes = vec![
            ("top".to_string(), "8".to_string()),
            ("left".to_string(), "16".to_string()),
        ];
        let value = TypeFactory::EdgeInsets
            .materialize_attributes(&attributes, "layoutMargins")
            .unwrap();
        assert_eq!(
            value,
            SupportedValue::EdgeInsets {
                top: 8.0,
                left: 16.0,
                bottom: 0.0,
                right: 0.0
            }
        );

        let bad = vec![("middle".to_string(), "1".to_string())];
        assert!(TypeFactory::EdgeInsets
            .materialize_attributes(&bad, "layoutMargins")
            .is_err());
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("ios".parse::<RuntimePlatform>().unwrap(), RuntimePlatform::IOS);
        assert_eq!("macOS".parse::<RuntimePlatform>().unwrap(), RuntimePlatform::MacOS);
        assert!("android".parse::<RuntimePlatform>().is_err());
    }
}
