//! Resolution of component definitions against everything loaded in one run.

pub mod actions;
pub mod state;
pub mod styles;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::application::ApplicationDescription;
use crate::component::ComponentDefinition;
use crate::elements::UiElement;
use crate::error::{TokenizationError, TokenizationResult};
use crate::layout::{Constraint, ConstraintTarget};
use crate::modules::{ModuleRegistry, RuntimeModule};
use crate::style::StyleGroup;
use crate::template::TemplateGroup;
use crate::types::RuntimePlatform;
use crate::xml::parse_xml;

pub use actions::{
    ActionSignatureParameter, ResolvedActionParameter, ResolvedActionSource, ResolvedHyperViewAction,
    ResolvedParameterKind,
};
pub use state::{ResolvedStateItem, StateApplication};
pub use styles::{ResolvedElement, ResolvedRoot, ResolvedStyle, ResolvedTemplate};

/// Every component, style group and template group of a run, plus the registry they resolve against
#[derive(Debug)]
pub struct GlobalContext {
    application: ApplicationDescription,
    registry: ModuleRegistry,
    definitions: BTreeMap<String, ComponentDefinition>,
    style_groups: BTreeMap<String, StyleGroup>,
    template_groups: BTreeMap<String, TemplateGroup>,
}

impl GlobalContext {
    /// Build the registry for the application's platform from `modules`.
    pub fn new(application: ApplicationDescription, modules: &[RuntimeModule]) -> TokenizationResult<Self> {
        application.validate()?;
        let registry = ModuleRegistry::new(modules, application.platform)?;
        Ok(Self::with_registry(application, registry))
    }

    pub fn with_registry(application: ApplicationDescription, registry: ModuleRegistry) -> Self {
        Self {
            application,
            registry,
            definitions: BTreeMap::new(),
            style_groups: BTreeMap::new(),
            template_groups: BTreeMap::new(),
        }
    }

    pub fn application(&self) -> &ApplicationDescription {
        &self.application
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn platform(&self) -> RuntimePlatform {
        self.registry.platform()
    }

    /// Parse and register a component file. A named `<styles>` group is registered globally too.
    pub fn add_component_xml(&mut self, xml: &str, fallback_type: &str) -> TokenizationResult<&ComponentDefinition> {
        let root = parse_xml(xml)?;
        let definition = ComponentDefinition::parse(&root, fallback_type, &self.registry)?;
        Ok(self.add_definition(definition))
    }

    pub fn add_definition(&mut self, definition: ComponentDefinition) -> &ComponentDefinition {
        if let Some(group) = definition.styles.as_ref().filter(|group| group.name.is_some()) {
            self.add_style_group(group.clone());
        }
        if let Some(group) = definition.templates.as_ref().filter(|group| group.name.is_some()) {
            self.add_template_group(group.clone());
        }
        let type_name = definition.type_name.clone();
        if self.definitions.contains_key(&type_name) {
            tracing::warn!(%type_name, "component defined twice, keeping the last definition");
        }
        self.definitions.insert(type_name.clone(), definition);
        &self.definitions[&type_name]
    }

    /// Parse a shared file whose root is `<styles name="...">` or `<templates name="...">`.
    pub fn add_group_xml(&mut self, xml: &str) -> TokenizationResult<()> {
        let root = parse_xml(xml)?;
        if root.attribute("name").is_none() {
            return Err(TokenizationError::MissingAttribute {
                element: root.name.clone(),
                attribute: "name".to_string(),
            });
        }
        match root.name.as_str() {
            "styles" => self.add_style_group(StyleGroup::parse(&root, &self.registry)?),
            "templates" => self.add_template_group(TemplateGroup::parse(&root)?),
            other => {
                return Err(TokenizationError::UnexpectedElement {
                    parent: "document".to_string(),
                    element: other.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Unnamed groups cannot be referenced globally and are ignored.
    pub fn add_style_group(&mut self, group: StyleGroup) {
        if let Some(name) = group.name.clone() {
            self.style_groups.insert(name, group);
        }
    }

    pub fn add_template_group(&mut self, group: TemplateGroup) {
        if let Some(name) = group.name.clone() {
            self.template_groups.insert(name, group);
        }
    }

    pub fn definition(&self, type_name: &str) -> Option<&ComponentDefinition> {
        self.definitions.get(type_name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.definitions.values()
    }

    pub fn style_group(&self, name: &str) -> TokenizationResult<&StyleGroup> {
        self.style_groups
            .get(name)
            .ok_or_else(|| TokenizationError::UnknownStyleGroup { group: name.to_string() })
    }

    pub fn template_group(&self, name: &str) -> TokenizationResult<&TemplateGroup> {
        self.template_groups
            .get(name)
            .ok_or_else(|| TokenizationError::UnknownStyleGroup { group: name.to_string() })
    }

    /// Context for resolving the component named `type_name`
    pub fn context(&self, type_name: &str) -> TokenizationResult<ComponentContext<'_>> {
        let definition = self.definition(type_name).ok_or_else(|| TokenizationError::UnknownComponent {
            type_name: type_name.to_string(),
        })?;
        Ok(ComponentContext::new(self, definition))
    }

    /// Resolve every registered component, in type name order.
    pub fn resolve_all(&self) -> TokenizationResult<Vec<ResolvedComponent>> {
        self.definitions
            .values()
            .map(|definition| ComponentContext::new(self, definition).resolve())
            .collect()
    }
}

/// One component being resolved, chained to the components that embed it
#[derive(Debug, Clone, Copy)]
pub struct ComponentContext<'a> {
    pub global: &'a GlobalContext,
    pub definition: &'a ComponentDefinition,
    parent: Option<&'a ComponentContext<'a>>,
}

impl<'a> ComponentContext<'a> {
    pub fn new(global: &'a GlobalContext, definition: &'a ComponentDefinition) -> Self {
        Self {
            global,
            definition,
            parent: None,
        }
    }

    pub fn platform(&self) -> RuntimePlatform {
        self.global.platform()
    }

    /// Context for a component embedded in this one; fails if it is already being resolved up the chain.
    pub fn child_for<'b>(&'b self, definition: &'b ComponentDefinition) -> TokenizationResult<ComponentContext<'b>> {
        let chain = self.chain();
        if chain.contains(&definition.type_name.as_str()) {
            let mut path: Vec<&str> = chain.into_iter().rev().collect();
            path.push(&definition.type_name);
            return Err(TokenizationError::CyclicComponentReference { path: path.join(" -> ") });
        }
        Ok(ComponentContext {
            global: self.global,
            definition,
            parent: Some(self),
        })
    }

    /// Context for the component an element references
    pub fn reference_context<'b>(&'b self, type_name: &str) -> TokenizationResult<ComponentContext<'b>> {
        let definition = self
            .global
            .definition(type_name)
            .ok_or_else(|| TokenizationError::UnknownComponent {
                type_name: type_name.to_string(),
            })?;
        self.child_for(definition)
    }

    /// Type names from this component up to the outermost one
    fn chain(&self) -> Vec<&'a str> {
        let mut names = vec![self.definition.type_name.as_str()];
        let mut current = self.parent;
        while let Some(context) = current {
            names.push(context.definition.type_name.as_str());
            current = context.parent;
        }
        names
    }

    /// The element with `id`, searched in this component only
    pub fn element(&self, id: &str) -> TokenizationResult<&'a UiElement> {
        self.definition
            .element(id)
            .ok_or_else(|| TokenizationError::UnknownElementId {
                id: id.to_string(),
                context: self.definition.type_name.clone(),
            })
    }

    /// Every constraint must point at an element that exists.
    pub fn verify_layout(&self) -> TokenizationResult<()> {
        let check = |owner: &str, constraints: &[Constraint]| -> TokenizationResult<()> {
            for constraint in constraints {
                if let Some(ConstraintTarget::Field(id)) = &constraint.target {
                    if self.definition.element(id).is_none() {
                        return Err(TokenizationError::UnknownElementId {
                            id: id.clone(),
                            context: format!("layout of {}", owner),
                        });
                    }
                }
            }
            Ok(())
        };
        check(&self.definition.type_name, &self.definition.root_layout)?;
        for element in self.definition.all_elements() {
            check(element.id.name(), &element.layout)?;
        }
        Ok(())
    }

    /// Every embedded component, transitively, must be registered and must not embed itself.
    pub fn verify_references(&self) -> TokenizationResult<()> {
        for type_name in self.definition.referenced_components() {
            self.reference_context(type_name)?.verify_references()?;
        }
        Ok(())
    }

    /// Run every resolution pass and collect the results.
    pub fn resolve(&self) -> TokenizationResult<ResolvedComponent> {
        let _span = tracing::debug_span!("resolve", component = %self.definition.type_name).entered();
        self.verify_references()?;
        self.verify_layout()?;
        let state = self.resolve_state()?;
        let actions = self.resolve_actions_with(&state)?;
        let root = self.resolve_root()?;
        let elements = self.resolve_elements()?;
        let styles = self.resolve_declared_styles()?;
        let templates = self.resolve_declared_templates()?;
        tracing::debug!(
            state = state.len(),
            actions = actions.len(),
            styles = styles.len(),
            templates = templates.len(),
            "component resolved"
        );
        let requires_theme = root.requires_theme
            || elements.iter().any(|e| e.requires_theme)
            || styles.iter().any(|s| s.requires_theme)
            || templates.iter().any(|t| t.requires_theme);
        Ok(ResolvedComponent {
            type_name: self.definition.type_name.clone(),
            requires_theme,
            root,
            state,
            actions,
            elements,
            styles,
            templates,
        })
    }
}

/// Everything the code generator needs for one component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComponent {
    pub type_name: String,
    pub requires_theme: bool,
    pub root: ResolvedRoot,
    pub state: BTreeMap<String, ResolvedStateItem>,
    pub actions: Vec<ResolvedHyperViewAction>,
    pub elements: Vec<ResolvedElement>,
    /// Every declared style, including ones no element applies.
    pub styles: Vec<ResolvedStyle>,
    pub templates: Vec<ResolvedTemplate>,
}

impl ResolvedComponent {
    pub fn action(&self, name: &str) -> Option<&ResolvedHyperViewAction> {
        self.actions.iter().find(|action| action.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::default_modules;

    fn global(components: &[(&str, &str)]) -> GlobalContext {
        let mut global = GlobalContext::new(ApplicationDescription::default(), &default_modules()).unwrap();
        for (name, xml) in components {
            global.add_component_xml(xml, name).unwrap();
        }
        global
    }

    #[test]
    fn test_cyclic_references() {
        let global = global(&[
            ("A", r#"<Component><B passthrough="$b" /></Component>"#),
            ("B", r#"<Component><A passthrough="$a" /></Component>"#),
        ]);
        let err = global.context("A").unwrap().resolve().unwrap_err();
        assert_eq!(
            err,
            TokenizationError::CyclicComponentReference {
                path: "A -> B -> A".to_string()
            }
        );
    }

    #[test]
    fn test_self_reference() {
        let global = global(&[("A", r#"<Component><A /></Component>"#)]);
        assert!(matches!(
            global.context("A").unwrap().resolve(),
            Err(TokenizationError::CyclicComponentReference { .. })
        ));
    }

    #[test]
    fn test_unknown_component() {
        let global = global(&[("A", r#"<Component><Missing /></Component>"#)]);
        assert_eq!(
            global.context("A").unwrap().resolve().unwrap_err(),
            TokenizationError::UnknownComponent {
                type_name: "Missing".to_string()
            }
        );
    }

    #[test]
    fn test_layout_targets_must_exist() {
        let global = global(&[(
            "A",
            r#"<Component>
                <Label field="title" layout:top="super" />
                <Label layout:below="subtitle offset(8)" />
            </Component>"#,
        )]);
        let err = global.context("A").unwrap().verify_layout().unwrap_err();
        assert!(matches!(err, TokenizationError::UnknownElementId { ref id, .. } if id == "subtitle"));
    }

    #[test]
    fn test_named_component_styles_are_global() {
        let global = global(&[(
            "A",
            r#"<Component><styles name="shared"><LabelStyle name="x" numberOfLines="2" /></styles></Component>"#,
        )]);
        assert!(global.style_group("shared").is_ok());
        assert!(matches!(
            global.style_group("other"),
            Err(TokenizationError::UnknownStyleGroup { .. })
        ));
    }

    #[test]
    fn test_group_files_need_names() {
        let mut global = global(&[]);
        assert!(global.add_group_xml("<styles />").is_err());
        assert!(global
            .add_group_xml(r#"<templates name="texts"><attributedText name="a">x</attributedText></templates>"#)
            .is_ok());
        assert!(global.template_group("texts").is_ok());
    }
}
