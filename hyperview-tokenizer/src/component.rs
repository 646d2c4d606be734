//! One parsed component file: its element tree and everything declared beside it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::elements::{flatten, ElementParser, UiElement};
use crate::error::{TokenizationError, TokenizationResult};
use crate::layout::{parse_layout_attribute, Constraint};
use crate::modules::ModuleRegistry;
use crate::properties::{materialize_properties, Property};
use crate::style::{StyleGroup, StyleName};
use crate::template::TemplateGroup;
use crate::types::{RuntimePlatform, SupportedValue, TypeFactory};
use crate::xml::{split_prefix, XmlElement};

/// A `<state>` child: an explicitly declared state item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateItemDescription {
    pub name: String,
    pub type_factory: TypeFactory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SupportedValue>,
    /// Handler called when the value changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub is_exported: bool,
}

impl StateItemDescription {
    fn parse(element: &XmlElement, platform: RuntimePlatform) -> TokenizationResult<StateItemDescription> {
        let name = element.name.clone();
        let type_factory = TypeFactory::attribute_type_named(element.required_attribute("type")?, platform)?;
        let default_value = match element.attribute("default") {
            Some("nil") if type_factory.is_nullable() => None,
            Some(raw) => Some(type_factory.materialize_attribute(raw, &format!("state.{}", name))?),
            None => None,
        };
        Ok(StateItemDescription {
            receiver: element.attribute("receiver").map(str::to_string),
            is_exported: parse_flag(element, "exported")?,
            name,
            type_factory,
            default_value,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDescription {
    pub items: Vec<StateItemDescription>,
}

impl StateDescription {
    pub fn item(&self, name: &str) -> Option<&StateItemDescription> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn exported(&self) -> impl Iterator<Item = &StateItemDescription> {
        self.items.iter().filter(|item| item.is_exported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleHook {
    WillInit,
    DidInit,
    ViewDidLoad,
    ViewWillAppear,
    ViewDidAppear,
    ViewWillDisappear,
    ViewDidDisappear,
}

impl FromStr for LifecycleHook {
    type Err = TokenizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "willInit" => Ok(LifecycleHook::WillInit),
            "didInit" => Ok(LifecycleHook::DidInit),
            "viewDidLoad" => Ok(LifecycleHook::ViewDidLoad),
            "viewWillAppear" => Ok(LifecycleHook::ViewWillAppear),
            "viewDidAppear" => Ok(LifecycleHook::ViewDidAppear),
            "viewWillDisappear" => Ok(LifecycleHook::ViewWillDisappear),
            "viewDidDisappear" => Ok(LifecycleHook::ViewDidDisappear),
            other => Err(TokenizationError::UnknownLifecycleHook {
                hook: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleHook::WillInit => "willInit",
            LifecycleHook::DidInit => "didInit",
            LifecycleHook::ViewDidLoad => "viewDidLoad",
            LifecycleHook::ViewWillAppear => "viewWillAppear",
            LifecycleHook::ViewDidAppear => "viewDidAppear",
            LifecycleHook::ViewWillDisappear => "viewWillDisappear",
            LifecycleHook::ViewDidDisappear => "viewDidDisappear",
        };
        write!(f, "{}", name)
    }
}

/// `<overrides viewDidLoad="setUp"/>`: call `handler` at `hook`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub hook: LifecycleHook,
    pub handler: String,
}

/// `<bag name="visible" resetOn="viewWillDisappear"/>` inside `<rx:disposeBags>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisposeBag {
    pub name: String,
    pub reset_on: Vec<LifecycleHook>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BarButtonItemStyle {
    Plain,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarButtonItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_item: Option<String>,
    pub style: BarButtonItemStyle,
}

impl BarButtonItem {
    fn parse(element: &XmlElement) -> TokenizationResult<BarButtonItem> {
        if element.name != "barButtonItem" {
            return Err(TokenizationError::UnexpectedElement {
                parent: "navigationItem".to_string(),
                element: element.name.clone(),
            });
        }
        let style = match element.attribute("style") {
            None | Some("plain") => BarButtonItemStyle::Plain,
            Some("done") => BarButtonItemStyle::Done,
            Some(other) => {
                return Err(TokenizationError::UnknownEnumValue {
                    value: other.to_string(),
                    type_name: "BarButtonItemStyle".to_string(),
                    expected: "plain, done".to_string(),
                })
            }
        };
        Ok(BarButtonItem {
            id: element.required_attribute("id")?.to_string(),
            title: element.attribute("title").map(str::to_string),
            image: element.attribute("image").map(str::to_string),
            system_item: element.attribute("systemItem").map(str::to_string),
            style,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub hides_back_button: bool,
    pub left_bar_button_items: Vec<BarButtonItem>,
    pub right_bar_button_items: Vec<BarButtonItem>,
}

impl NavigationItem {
    fn parse(element: &XmlElement) -> TokenizationResult<NavigationItem> {
        let items = |name: &str| -> TokenizationResult<Vec<BarButtonItem>> {
            match element.single_child(name)? {
                Some(list) => list.children.iter().map(BarButtonItem::parse).collect(),
                None => Ok(Vec::new()),
            }
        };
        if let Some(child) = element
            .children
            .iter()
            .find(|c| !matches!(c.name.as_str(), "leftBarButtonItems" | "rightBarButtonItems"))
        {
            return Err(TokenizationError::UnexpectedElement {
                parent: element.name.clone(),
                element: child.name.clone(),
            });
        }
        Ok(NavigationItem {
            title: element.attribute("title").map(str::to_string),
            prompt: element.attribute("prompt").map(str::to_string),
            hides_back_button: parse_flag(element, "hidesBackButton")?,
            left_bar_button_items: items("leftBarButtonItems")?,
            right_bar_button_items: items("rightBarButtonItems")?,
        })
    }
}

fn parse_flag(element: &XmlElement, attribute: &str) -> TokenizationResult<bool> {
    match element.attribute(attribute) {
        None => Ok(false),
        Some(raw) => match TypeFactory::Bool.materialize_attribute(raw, &format!("{}.{}", element.name, attribute))? {
            SupportedValue::Bool(flag) => Ok(flag),
            _ => Ok(false),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub type_name: String,
    pub is_root_view: bool,
    pub root_properties: Vec<Property>,
    pub root_styles: Vec<StyleName>,
    pub root_layout: Vec<Constraint>,
    pub children: Vec<UiElement>,
    pub state_description: StateDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<StyleGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<TemplateGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_item: Option<NavigationItem>,
    pub dispose_bags: Vec<DisposeBag>,
    pub overrides: Vec<Override>,
}

impl ComponentDefinition {
    /// `fallback_type` names the component when the root has no `type`, usually the file stem.
    pub fn parse(
        root: &XmlElement,
        fallback_type: &str,
        registry: &ModuleRegistry,
    ) -> TokenizationResult<ComponentDefinition> {
        let type_name = root.attribute("type").unwrap_or(fallback_type).to_string();
        let _span = tracing::debug_span!("component", %type_name).entered();

        let mut root_styles = Vec::new();
        let mut root_layout = Vec::new();
        let mut attributes = Vec::new();
        for (name, value) in &root.attributes {
            match split_prefix(name) {
                (None, "type" | "rootView") => {}
                (None, "style") => {
                    for style in value.split_whitespace() {
                        root_styles.push(style.parse::<StyleName>()?);
                    }
                }
                (Some("layout"), attribute) => root_layout.extend(parse_layout_attribute(attribute, value)?),
                _ => attributes.push((name.clone(), value.clone())),
            }
        }
        let root_properties = match registry.element_factory("View") {
            Some(view) => materialize_properties(&view.properties, &root.name, &attributes, &[])?.properties,
            None => Vec::new(),
        };

        let mut parser = ElementParser::new(registry, &[root])?;
        let child_nodes: Vec<&XmlElement> = root.children.iter().collect();
        let children = parser.parse_children(&child_nodes)?;

        let state_description = match root.single_child("state")? {
            Some(state) => StateDescription {
                items: state
                    .children
                    .iter()
                    .map(|item| StateItemDescription::parse(item, registry.platform()))
                    .collect::<TokenizationResult<Vec<_>>>()?,
            },
            None => StateDescription::default(),
        };

        let styles = root
            .single_child("styles")?
            .map(|styles| StyleGroup::parse(styles, registry))
            .transpose()?;
        let templates = root.single_child("templates")?.map(TemplateGroup::parse).transpose()?;
        let navigation_item = root.single_child("navigationItem")?.map(NavigationItem::parse).transpose()?;

        let overrides = match root.single_child("overrides")? {
            Some(element) => element
                .attributes
                .iter()
                .map(|(hook, handler)| -> TokenizationResult<Override> {
                    Ok(Override {
                        hook: hook.parse::<LifecycleHook>()?,
                        handler: handler.clone(),
                    })
                })
                .collect::<TokenizationResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        let dispose_bags = match root.single_child("rx:disposeBags")? {
            Some(element) => element
                .children
                .iter()
                .map(|bag| -> TokenizationResult<DisposeBag> {
                    Ok(DisposeBag {
                        name: bag.required_attribute("name")?.to_string(),
                        reset_on: bag
                            .attribute("resetOn")
                            .map(|hooks| {
                                hooks
                                    .split_whitespace()
                                    .map(str::parse::<LifecycleHook>)
                                    .collect::<TokenizationResult<Vec<LifecycleHook>>>()
                            })
                            .unwrap_or_else(|| Ok(Vec::new()))?,
                    })
                })
                .collect::<TokenizationResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        let definition = ComponentDefinition {
            type_name,
            is_root_view: parse_flag(root, "rootView")?,
            root_properties,
            root_styles,
            root_layout,
            children,
            state_description,
            styles,
            templates,
            navigation_item,
            dispose_bags,
            overrides,
        };
        tracing::debug!(
            elements = definition.all_elements().len(),
            state = definition.state_description.items.len(),
            "parsed component"
        );
        Ok(definition)
    }

    /// Every element in document order
    pub fn all_elements(&self) -> Vec<&UiElement> {
        flatten(&self.children)
    }

    pub fn element(&self, id: &str) -> Option<&UiElement> {
        self.all_elements().into_iter().find(|e| e.id.name() == id)
    }

    /// Types of the components this one embeds, deduplicated in document order
    pub fn referenced_components(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for element in self.all_elements() {
            if let Some(reference) = &element.reference {
                if !names.contains(&reference.type_name.as_str()) {
                    names.push(&reference.type_name);
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementId;
    use crate::xml::parse_xml;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> TokenizationResult<ComponentDefinition> {
        let registry = ModuleRegistry::with_default_modules(RuntimePlatform::IOS).unwrap();
        ComponentDefinition::parse(&parse_xml(xml).unwrap(), "Fallback", &registry)
    }

    #[test]
    fn test_parse_full_component() {
        let xml = r#"<Component type="Profile" rootView="true" backgroundColor="white">
            <styles>
                <LabelStyle name="title" font=":bold@18" />
            </styles>
            <state>
                <name type="String?" default="nil" exported="true" />
                <count type="Int" default="3" receiver="countChanged" />
            </state>
            <overrides viewDidLoad="setUp" viewWillDisappear="tearDown" />
            <navigationItem title="Profile" hidesBackButton="true">
                <rightBarButtonItems>
                    <barButtonItem id="save" systemItem="save" style="done" />
                </rightBarButtonItems>
            </navigationItem>
            <rx:disposeBags>
                <bag name="visibleBag" resetOn="viewWillDisappear" />
            </rx:disposeBags>
            <Label field="nameLabel" style="title" text="$name" layout:edges="super" />
            <Container>
                <Label text="hello" />
            </Container>
        </Component>"#;
        let definition = parse(xml).unwrap();
        assert_eq!(definition.type_name, "Profile");
        assert!(definition.is_root_view);
        assert_eq!(definition.root_properties.len(), 1);
        assert_eq!(definition.children.len(), 2);
        assert_eq!(definition.all_elements().len(), 3);
        assert_eq!(definition.state_description.items.len(), 2);
        assert_eq!(definition.state_description.items[0].default_value, None);
        assert_eq!(
            definition.state_description.items[1].default_value,
            Some(SupportedValue::Integer(3))
        );
        assert_eq!(definition.state_description.exported().count(), 1);
        assert_eq!(
            definition.overrides,
            vec![
                Override {
                    hook: LifecycleHook::ViewDidLoad,
                    handler: "setUp".to_string()
                },
                Override {
                    hook: LifecycleHook::ViewWillDisappear,
                    handler: "tearDown".to_string()
                },
            ]
        );
        let navigation = definition.navigation_item.as_ref().unwrap();
        assert!(navigation.hides_back_button);
        assert_eq!(navigation.right_bar_button_items[0].style, BarButtonItemStyle::Done);
        assert_eq!(definition.dispose_bags[0].reset_on, vec![LifecycleHook::ViewWillDisappear]);
        assert_eq!(definition.styles.as_ref().unwrap().styles.len(), 1);
        assert!(definition.element("nameLabel").is_some());
    }

    #[test]
    fn test_type_falls_back() {
        let definition = parse("<Component><Label /></Component>").unwrap();
        assert_eq!(definition.type_name, "Fallback");
    }

    #[test]
    fn test_generated_ids_skip_authored_ones() {
        let definition = parse(r#"<C><Label /><Label field="label2" /><Label /></C>"#).unwrap();
        let ids: Vec<ElementId> = definition.all_elements().iter().map(|e| e.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                ElementId::Generated("label1".to_string()),
                ElementId::Field("label2".to_string()),
                ElementId::Generated("label3".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let result = parse(r#"<C><Label field="a" /><Container><Button id="a" /></Container></C>"#);
        assert_eq!(result.unwrap_err(), TokenizationError::DuplicateId { id: "a".to_string() });
    }

    #[test]
    fn test_children_on_leaf() {
        let result = parse(r#"<C><Label><Button /></Label></C>"#);
        assert!(matches!(result, Err(TokenizationError::ElementNotContainer { ref element }) if element == "Label"));
    }

    #[test]
    fn test_unknown_hook() {
        let result = parse(r#"<C><overrides viewDidExplode="x" /></C>"#);
        assert!(matches!(result, Err(TokenizationError::UnknownLifecycleHook { .. })));
    }

    #[test]
    fn test_state_attribute_only_on_references() {
        let result = parse(r#"<C><Label state:text="x" /></C>"#);
        assert!(matches!(result, Err(TokenizationError::UnknownProperty { .. })));
    }

    #[test]
    fn test_component_reference() {
        let definition =
            parse(r#"<C><ProfileCard field="card" state:name="$userName" passthrough="exported" /></C>"#).unwrap();
        let card = definition.element("card").unwrap();
        let reference = card.reference.as_ref().unwrap();
        assert_eq!(reference.type_name, "ProfileCard");
        assert_eq!(reference.state_bindings[0].name, "name");
        assert_eq!(definition.referenced_components(), vec!["ProfileCard"]);
    }

    #[test]
    fn test_two_state_blocks() {
        let result = parse(r#"<C><state /><state /></C>"#);
        assert!(matches!(result, Err(TokenizationError::UnexpectedChildCount { .. })));
    }
}
