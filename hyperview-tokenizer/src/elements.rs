//! Element factories and the parsed element tree of a component.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::ActionBinding;
use crate::error::{TokenizationError, TokenizationResult};
use crate::layout::{parse_layout_attribute, Constraint};
use crate::modules::ModuleRegistry;
use crate::properties::{materialize_properties, PropertyDescription, Property};
use crate::style::StyleName;
use crate::types::{RuntimeType, TypeFactory};
use crate::xml::{split_prefix, XmlElement};

/// One parameter an element event carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementActionParameter {
    pub label: Option<String>,
    pub type_factory: TypeFactory,
}

impl ElementActionParameter {
    pub fn new(label: Option<&str>, type_factory: TypeFactory) -> Self {
        Self {
            label: label.map(str::to_string),
            type_factory,
        }
    }
}

/// An event an element can emit, e.g. a button's `tap`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementActionDescription {
    pub name: String,
    pub aliases: Vec<String>,
    pub parameters: Vec<ElementActionParameter>,
}

impl ElementActionDescription {
    pub fn new(name: &str, aliases: &[&str], parameters: Vec<ElementActionParameter>) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            parameters,
        }
    }

    pub fn matches(&self, event: &str) -> bool {
        self.name == event || self.aliases.iter().any(|alias| alias == event)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    View,
    Container,
    /// Embeds another component. `None` means the type comes from the `type` attribute.
    ComponentReference { type_name: Option<String> },
}

/// Everything needed to build one element tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementFactory {
    pub tag: String,
    pub kind: ElementKind,
    pub runtime_type: RuntimeType,
    pub properties: Vec<PropertyDescription>,
    pub actions: Vec<ElementActionDescription>,
}

impl ElementFactory {
    pub fn view(tag: &str, runtime_type: RuntimeType) -> Self {
        Self {
            tag: tag.to_string(),
            kind: ElementKind::View,
            runtime_type,
            properties: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn container(tag: &str, runtime_type: RuntimeType) -> Self {
        Self {
            kind: ElementKind::Container,
            ..Self::view(tag, runtime_type)
        }
    }

    pub fn with_properties(mut self, properties: impl IntoIterator<Item = PropertyDescription>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn with_actions(mut self, actions: impl IntoIterator<Item = ElementActionDescription>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, ElementKind::Container)
    }

    pub fn is_component_reference(&self) -> bool {
        matches!(self.kind, ElementKind::ComponentReference { .. })
    }

    pub fn property(&self, key_path: &str) -> Option<&PropertyDescription> {
        self.properties.iter().find(|p| p.key_path() == key_path)
    }
}

/// Field name of an element in generated code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementId {
    /// Written by the author with `field` or `id`
    Field(String),
    /// Assigned in document order for elements without one
    Generated(String),
}

impl ElementId {
    pub fn name(&self) -> &str {
        match self {
            ElementId::Field(name) | ElementId::Generated(name) => name,
        }
    }
}

/// How much of a nested component's state the embedding component owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PassthroughMode {
    None,
    /// `passthrough="$name"`: one state item holding the whole nested state
    Whole(String),
    /// `passthrough="exported"`: every exported nested item under its own name
    Exported,
}

/// A `state:<name>="<value>"` attribute on a component reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBinding {
    pub name: String,
    pub raw_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReference {
    pub type_name: String,
    pub passthrough: PassthroughMode,
    pub state_bindings: Vec<StateBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    pub id: ElementId,
    pub factory: Arc<ElementFactory>,
    pub properties: Vec<Property>,
    pub styles: Vec<StyleName>,
    pub layout: Vec<Constraint>,
    pub actions: Vec<ActionBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ComponentReference>,
    pub children: Vec<UiElement>,
}

impl UiElement {
    pub fn tag(&self) -> &str {
        &self.factory.tag
    }

    /// This element and all descendants in document order
    pub fn descendants(&self) -> Vec<&UiElement> {
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }
}

fn collect<'a>(element: &'a UiElement, out: &mut Vec<&'a UiElement>) {
    out.push(element);
    for child in &element.children {
        collect(child, out);
    }
}

/// Every element of a forest in document order
pub fn flatten(elements: &[UiElement]) -> Vec<&UiElement> {
    elements.iter().flat_map(UiElement::descendants).collect()
}

/// Builds [`UiElement`] trees, assigning ids as it goes.
pub struct ElementParser<'a> {
    registry: &'a ModuleRegistry,
    taken_ids: HashSet<String>,
    counter: usize,
}

impl<'a> ElementParser<'a> {
    /// `roots` are scanned up front so generated ids never collide with authored ones.
    pub fn new(registry: &'a ModuleRegistry, roots: &[&XmlElement]) -> TokenizationResult<Self> {
        let mut taken_ids = HashSet::new();
        for root in roots {
            collect_explicit_ids(registry, root, &mut taken_ids)?;
        }
        Ok(Self {
            registry,
            taken_ids,
            counter: 0,
        })
    }

    /// Parse `nodes`, skipping reserved tags.
    pub fn parse_children(&mut self, nodes: &[&XmlElement]) -> TokenizationResult<Vec<UiElement>> {
        let mut elements = Vec::new();
        for node in nodes {
            if let Some(factory) = self.registry.factory(&node.name) {
                elements.push(self.parse_element(node, factory)?);
            }
        }
        Ok(elements)
    }

    fn parse_element(&mut self, node: &XmlElement, factory: Arc<ElementFactory>) -> TokenizationResult<UiElement> {
        let id = self.element_id(node);

        let mut styles = Vec::new();
        let mut layout = Vec::new();
        let mut actions = Vec::new();
        let mut state_bindings = Vec::new();
        let mut passthrough = PassthroughMode::None;
        let mut type_attribute = None;
        let mut plain = Vec::new();

        for (name, value) in &node.attributes {
            match split_prefix(name) {
                (None, "field" | "id") => {}
                (None, "style") => {
                    for style in value.split_whitespace() {
                        styles.push(style.parse::<StyleName>()?);
                    }
                }
                (Some("layout"), attribute) => layout.extend(parse_layout_attribute(attribute, value)?),
                (Some("action"), event) => actions.push(ActionBinding::parse(event, value)?),
                (Some("state"), state_name) if factory.is_component_reference() => {
                    state_bindings.push(StateBinding {
                        name: state_name.to_string(),
                        raw_value: value.clone(),
                    });
                }
                (None, "passthrough") if factory.is_component_reference() => {
                    passthrough = parse_passthrough(value)?;
                }
                (None, "type") if factory.is_component_reference() => {
                    type_attribute = Some(value.clone());
                }
                _ => plain.push((name.clone(), value.clone())),
            }
        }

        let materialized = materialize_properties(&factory.properties, &factory.tag, &plain, &node.children)?;

        let reference = match &factory.kind {
            ElementKind::ComponentReference { type_name } => Some(ComponentReference {
                type_name: match (type_name, type_attribute) {
                    (Some(name), _) => name.clone(),
                    (None, Some(name)) => name,
                    (None, None) => {
                        return Err(TokenizationError::MissingAttribute {
                            element: node.name.clone(),
                            attribute: "type".to_string(),
                        })
                    }
                },
                passthrough,
                state_bindings,
            }),
            _ => None,
        };

        let child_nodes: Vec<&XmlElement> = materialized
            .remaining_children
            .into_iter()
            .filter(|child| !ModuleRegistry::is_reserved(&child.name))
            .collect();
        if !child_nodes.is_empty() && !factory.is_container() {
            return Err(TokenizationError::ElementNotContainer {
                element: node.name.clone(),
            });
        }
        let children = self.parse_children(&child_nodes)?;

        Ok(UiElement {
            id,
            factory,
            properties: materialized.properties,
            styles,
            layout,
            actions,
            reference,
            children,
        })
    }

    fn element_id(&mut self, node: &XmlElement) -> ElementId {
        if let Some(name) = explicit_id(node) {
            return ElementId::Field(name.to_string());
        }
        let base = lower_first(split_prefix(&node.name).1);
        loop {
            self.counter += 1;
            let candidate = format!("{}{}", base, self.counter);
            if self.taken_ids.insert(candidate.clone()) {
                return ElementId::Generated(candidate);
            }
        }
    }
}

fn explicit_id(node: &XmlElement) -> Option<&str> {
    node.attribute("field").or_else(|| node.attribute("id"))
}

fn collect_explicit_ids(
    registry: &ModuleRegistry,
    node: &XmlElement,
    seen: &mut HashSet<String>,
) -> TokenizationResult<()> {
    for child in &node.children {
        if ModuleRegistry::is_reserved(&child.name) {
            continue;
        }
        if let Some(id) = explicit_id(child) {
            if !seen.insert(id.to_string()) {
                return Err(TokenizationError::DuplicateId { id: id.to_string() });
            }
        }
        collect_explicit_ids(registry, child, seen)?;
    }
    Ok(())
}

fn parse_passthrough(value: &str) -> TokenizationResult<PassthroughMode> {
    match value.trim() {
        "none" => Ok(PassthroughMode::None),
        "exported" => Ok(PassthroughMode::Exported),
        other => match other.strip_prefix('$') {
            Some(name) if !name.is_empty() => Ok(PassthroughMode::Whole(name.to_string())),
            _ => Err(TokenizationError::UnknownEnumValue {
                value: other.to_string(),
                type_name: "passthrough".to_string(),
                expected: "none, exported, $stateName".to_string(),
            }),
        },
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
