//! # HyperView tokenizer
//!
//! Parses XML component definitions into a typed document model and resolves
//! them against a module registry: styles and templates, state items and
//! actions, with every cross reference verified. The results are handed to a
//! code generator.
//!
//! ## Example
//! ```ignore
//! use hyperview_tokenizer::{ApplicationDescription, GlobalContext, default_modules};
//!
//! let mut global = GlobalContext::new(ApplicationDescription::default(), &default_modules())?;
//! global.add_component_xml(r#"
//! <Component type="Login">
//!   <TextField field="email" text="$email" />
//!   <Button title="Sign in" action:tap="submit(email.text)" />
//! </Component>
//! "#, "Login")?;
//!
//! let resolved = global.context("Login")?.resolve()?;
//! assert_eq!(resolved.state["email"].applications.len(), 1);
//! ```

pub mod action;
pub mod application;
pub mod component;
pub mod context;
pub mod elements;
pub mod error;
pub mod layout;
pub mod logging;
pub mod modules;
pub mod properties;
pub mod style;
pub mod template;
pub mod types;
pub mod xml;

// --- Core types ---
pub use application::ApplicationDescription;
pub use component::{ComponentDefinition, StateDescription, StateItemDescription};
pub use context::{
    ComponentContext, GlobalContext, ResolvedComponent, ResolvedHyperViewAction, ResolvedRoot,
    ResolvedStateItem, ResolvedStyle, ResolvedTemplate,
};
pub use elements::{ElementFactory, ElementId, UiElement};
pub use error::{ModuleError, TokenizationError, TokenizationResult};
pub use modules::{default_modules, ModuleRegistry, RuntimeModule};
pub use properties::{Property, PropertyDescription, PropertyValue};
pub use style::{StyleGroup, StyleName, TemplateName};
pub use types::{RuntimePlatform, RuntimeType, SupportedValue, TypeFactory};
pub use xml::{parse_xml, XmlElement};

/// Parse one component file against `registry`.
///
/// `fallback_type` names the component when its root has no `type` attribute.
pub fn parse_component(
    xml: &str,
    fallback_type: &str,
    registry: &ModuleRegistry,
) -> TokenizationResult<ComponentDefinition> {
    let root = parse_xml(xml)?;
    ComponentDefinition::parse(&root, fallback_type, registry)
}

/// Parse and resolve a standalone component with the built-in modules.
pub fn resolve_component(xml: &str, platform: RuntimePlatform) -> TokenizationResult<ResolvedComponent> {
    let application = ApplicationDescription {
        platform,
        ..ApplicationDescription::default()
    };
    let mut global = GlobalContext::new(application, &default_modules())?;
    let type_name = global.add_component_xml(xml, "Component")?.type_name.clone();
    global.context(&type_name)?.resolve()
}
