use thiserror::Error;

use crate::types::RuntimePlatform;

pub type TokenizationResult<T> = Result<T, TokenizationError>;

/// Failures raised while assembling a [`ModuleRegistry`](crate::modules::ModuleRegistry)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModuleError {
    #[error("No module provides a component reference factory for platform {platform}")]
    MissingReferenceFactoryProvider { platform: RuntimePlatform },

    #[error("More than one module provides a component reference factory for platform {platform}: {modules}")]
    DuplicateReferenceFactoryProvider {
        platform: RuntimePlatform,
        modules: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizationError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Expected at most one <{child}> inside <{parent}>, found {count}")]
    UnexpectedChildCount {
        parent: String,
        child: String,
        count: usize,
    },

    #[error("Missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("Unexpected element <{element}> inside <{parent}>")]
    UnexpectedElement { parent: String, element: String },

    #[error("Invalid {kind} name '{value}': expected 'name', 'group.name' or ':group:name'")]
    InvalidName { kind: String, value: String },

    #[error("Style '{name}' not found")]
    UnknownStyle { name: String },

    #[error("Template '{name}' not found")]
    UnknownTemplate { name: String },

    #[error("Style group '{group}' not found")]
    UnknownStyleGroup { group: String },

    #[error("Style '{name}' extends itself through {path}")]
    CyclicStyleExtension { name: String, path: String },

    #[error("Invalid property '{property}' in style '{style}': {reason}")]
    InvalidStyleProperty {
        style: String,
        property: String,
        reason: String,
    },

    #[error("Style '{style}' is bound to <{style_element}> and cannot be applied to <{element}>")]
    StyleElementMismatch {
        style: String,
        style_element: String,
        element: String,
    },

    #[error("Unknown property '{property}' for element <{element}>")]
    UnknownProperty { element: String, property: String },

    #[error("Invalid value '{value}' for {context}: expected {type_name}")]
    InvalidValue {
        value: String,
        type_name: String,
        context: String,
    },

    #[error("Unknown value '{value}' for {type_name}. Expected one of: {expected}")]
    UnknownEnumValue {
        value: String,
        type_name: String,
        expected: String,
    },

    #[error("Type '{type_name}' cannot be materialized from {source_kind}")]
    NotMaterializable {
        type_name: String,
        source_kind: String,
    },

    #[error("Unknown type '{name}' for platform {platform}")]
    UnknownType {
        name: String,
        platform: RuntimePlatform,
    },

    #[error("Unknown layout attribute '{attribute}'")]
    UnknownLayoutAttribute { attribute: String },

    #[error("Unknown layout anchor '{anchor}'")]
    UnknownLayoutAnchor { anchor: String },

    #[error("Invalid layout constraint '{value}': {reason}")]
    InvalidConstraint { value: String, reason: String },

    #[error("Unknown lifecycle hook '{hook}'")]
    UnknownLifecycleHook { hook: String },

    #[error("Invalid action binding '{binding}': {reason}")]
    InvalidActionBinding { binding: String, reason: String },

    #[error("Element <{element}> is not a container and cannot have children")]
    ElementNotContainer { element: String },

    #[error("Duplicate id '{id}': element ids must be unique within a component")]
    DuplicateId { id: String },

    #[error("State item '{name}' is used with conflicting types: {types}")]
    StateTypeMismatch { name: String, types: String },

    #[error("Action '{action}' has incompatible sources: {reason}")]
    ActionSignatureMismatch { action: String, reason: String },

    #[error("Action '{action}' references unknown state item '{name}'")]
    UnknownStateItem { action: String, name: String },

    #[error("Unknown element id '{id}' referenced from {context}")]
    UnknownElementId { id: String, context: String },

    #[error("Element '{id}' has no property '{property}'")]
    UnknownElementProperty { id: String, property: String },

    #[error("Unknown component type '{type_name}'")]
    UnknownComponent { type_name: String },

    #[error("Cyclic component reference: {path}")]
    CyclicComponentReference { path: String },

    #[error("Default theme '{theme}' is not one of the declared themes [{themes}]")]
    DefaultThemeNotDeclared { theme: String, themes: String },

    #[error(transparent)]
    Module(#[from] ModuleError),
}

impl From<roxmltree::Error> for TokenizationError {
    fn from(err: roxmltree::Error) -> Self {
        TokenizationError::Xml(err.to_string())
    }
}

impl From<serde_yaml::Error> for TokenizationError {
    fn from(err: serde_yaml::Error) -> Self {
        TokenizationError::Config(err.to_string())
    }
}
