//! State resolution: explicit `<state>` declarations merged with `$name` usage sites.

use std::collections::BTreeMap;

use serde::Serialize;

use super::ComponentContext;
use crate::component::StateItemDescription;
use crate::elements::{ElementId, PassthroughMode, UiElement};
use crate::error::{TokenizationError, TokenizationResult};
use crate::properties::PropertyValue;
use crate::types::{SupportedValue, TypeFactory};

/// Where a state item is applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateApplication {
    /// `None` for the component's root view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementId>,
    /// Key path of the property, `state.<name>` for nested component state
    pub property: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStateItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<StateItemDescription>,
    pub type_factory: TypeFactory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SupportedValue>,
    pub applications: Vec<StateApplication>,
}

impl ResolvedStateItem {
    pub fn is_exported(&self) -> bool {
        self.description.as_ref().is_some_and(|d| d.is_exported)
    }
}

struct UsageSite {
    name: String,
    application: StateApplication,
    type_factory: TypeFactory,
    default_value: Option<SupportedValue>,
}

impl<'a> ComponentContext<'a> {
    pub fn resolve_state(&self) -> TokenizationResult<BTreeMap<String, ResolvedStateItem>> {
        let _span = tracing::debug_span!("resolve_state", component = %self.definition.type_name).entered();
        let platform = self.platform();

        let mut sites = Vec::new();
        for property in &self.definition.root_properties {
            if let Some(name) = property.state_name() {
                sites.push(UsageSite {
                    name: name.to_string(),
                    application: StateApplication {
                        element: None,
                        property: property.key_path(),
                    },
                    type_factory: property.type_factory.clone(),
                    default_value: property.default_value.clone(),
                });
            }
        }
        for element in self.definition.all_elements() {
            self.collect_sites(element, &mut sites)?;
        }

        let mut grouped: BTreeMap<String, Vec<UsageSite>> = BTreeMap::new();
        for site in sites {
            grouped.entry(site.name.clone()).or_default().push(site);
        }

        let mut resolved = BTreeMap::new();
        for description in &self.definition.state_description.items {
            let applications = grouped
                .remove(&description.name)
                .unwrap_or_default()
                .into_iter()
                .map(|site| site.application)
                .collect();
            resolved.insert(
                description.name.clone(),
                ResolvedStateItem {
                    name: description.name.clone(),
                    description: Some(description.clone()),
                    type_factory: description.type_factory.clone(),
                    default_value: description.default_value.clone(),
                    applications,
                },
            );
        }

        for (name, sites) in grouped {
            let mut types: Vec<String> = Vec::new();
            for site in &sites {
                let runtime = site.type_factory.runtime_type(platform).to_string();
                if !types.contains(&runtime) {
                    types.push(runtime);
                }
            }
            if types.len() > 1 {
                return Err(TokenizationError::StateTypeMismatch {
                    name,
                    types: types.join(", "),
                });
            }
            let Some(first) = sites.first() else {
                continue;
            };
            let type_factory = first.type_factory.clone();
            let default_value = sites.iter().find_map(|site| site.default_value.clone());
            tracing::debug!(%name, %type_factory, sites = sites.len(), "inferred state item");
            resolved.insert(
                name.clone(),
                ResolvedStateItem {
                    name,
                    description: None,
                    type_factory,
                    default_value,
                    applications: sites.into_iter().map(|site| site.application).collect(),
                },
            );
        }
        Ok(resolved)
    }

    fn collect_sites(&self, element: &UiElement, sites: &mut Vec<UsageSite>) -> TokenizationResult<()> {
        for property in &element.properties {
            if let Some(name) = property.state_name() {
                sites.push(UsageSite {
                    name: name.to_string(),
                    application: StateApplication {
                        element: Some(element.id.clone()),
                        property: property.key_path(),
                    },
                    type_factory: property.type_factory.clone(),
                    default_value: property.default_value.clone(),
                });
            }
        }

        let Some(reference) = &element.reference else {
            return Ok(());
        };
        if reference.state_bindings.is_empty() && reference.passthrough == PassthroughMode::None {
            return Ok(());
        }

        let nested = self.reference_context(&reference.type_name)?;
        let nested_state = nested.resolve_state()?;
        let site = |name: &str, property: String, type_factory: TypeFactory| UsageSite {
            name: name.to_string(),
            application: StateApplication {
                element: Some(element.id.clone()),
                property,
            },
            type_factory,
            default_value: None,
        };

        for binding in &reference.state_bindings {
            let property = format!("state.{}", binding.name);
            let item = nested_state
                .get(&binding.name)
                .ok_or_else(|| TokenizationError::UnknownProperty {
                    element: reference.type_name.clone(),
                    property: property.clone(),
                })?;
            let value = PropertyValue::parse(&binding.raw_value, |literal| {
                item.type_factory.materialize_attribute(literal, &property)
            })?;
            match value {
                PropertyValue::State(name) => sites.push(site(&name, property, item.type_factory.clone())),
                PropertyValue::Value(_) | PropertyValue::Theme(_) => {}
            }
        }

        match &reference.passthrough {
            PassthroughMode::None => {}
            PassthroughMode::Whole(name) => sites.push(site(
                name,
                "state".to_string(),
                TypeFactory::ComponentState {
                    component: reference.type_name.clone(),
                },
            )),
            PassthroughMode::Exported => {
                for item in nested_state.values().filter(|item| item.is_exported()) {
                    sites.push(site(&item.name, format!("state.{}", item.name), item.type_factory.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::application::ApplicationDescription;
    use crate::context::GlobalContext;
    use crate::error::TokenizationError;
    use crate::modules::default_modules;
    use crate::types::{SupportedValue, TypeFactory};
    use pretty_assertions::assert_eq;

    fn global(components: &[(&str, &str)]) -> GlobalContext {
        let mut global = GlobalContext::new(ApplicationDescription::default(), &default_modules()).unwrap();
        for (name, xml) in components {
            global.add_component_xml(xml, name).unwrap();
        }
        global
    }

    #[test]
    fn test_usage_sites_agree() {
        let global = global(&[(
            "Login",
            r#"<Component>
                <TextField text="$email" />
                <Label text="$email" numberOfLines="$lines" />
            </Component>"#,
        )]);
        let state = global.context("Login").unwrap().resolve_state().unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state["email"].type_factory, TypeFactory::String.optional());
        assert_eq!(state["email"].applications.len(), 2);
        assert_eq!(state["lines"].type_factory, TypeFactory::Integer);
        assert_eq!(state["lines"].default_value, Some(SupportedValue::Integer(1)));
    }

    #[test]
    fn test_usage_sites_disagree() {
        let global = global(&[(
            "Login",
            r#"<Component>
                <TextField text="$value" />
                <Slider value="$value" />
            </Component>"#,
        )]);
        let err = global.context("Login").unwrap().resolve_state().unwrap_err();
        assert!(matches!(err, TokenizationError::StateTypeMismatch { ref name, .. } if name == "value"));
    }

    #[test]
    fn test_explicit_declaration_is_trusted() {
        let global = global(&[(
            "Login",
            r#"<Component>
                <state><value type="Bool" default="true" /></state>
                <TextField text="$value" />
                <Slider value="$value" />
            </Component>"#,
        )]);
        let state = global.context("Login").unwrap().resolve_state().unwrap();
        assert_eq!(state["value"].type_factory, TypeFactory::Bool);
        assert_eq!(state["value"].applications.len(), 2);
        assert!(state["value"].description.is_some());
    }

    #[test]
    fn test_passthrough_modes() {
        let global = global(&[
            (
                "Card",
                r#"<Component>
                    <state>
                        <title type="String?" exported="true" />
                        <count type="Int" default="0" />
                    </state>
                    <Label text="$title" />
                </Component>"#,
            ),
            (
                "Screen",
                r#"<Component>
                    <Card field="whole" passthrough="$card" />
                    <Card field="exported" passthrough="exported" />
                    <Card field="bound" state:count="$total" state:title="Fixed" />
                </Component>"#,
            ),
        ]);
        let state = global.context("Screen").unwrap().resolve_state().unwrap();
        let names: Vec<&str> = state.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["card", "title", "total"]);
        assert_eq!(
            state["card"].type_factory,
            TypeFactory::ComponentState {
                component: "Card".to_string()
            }
        );
        assert_eq!(state["title"].applications[0].property, "state.title");
        assert_eq!(state["total"].type_factory, TypeFactory::Integer);
    }

    #[test]
    fn test_binding_unknown_nested_state() {
        let global = global(&[
            ("Card", r#"<Component><Label /></Component>"#),
            ("Screen", r#"<Component><Card state:missing="$x" /></Component>"#),
        ]);
        assert!(matches!(
            global.context("Screen").unwrap().resolve_state(),
            Err(TokenizationError::UnknownProperty { .. })
        ));
    }
}
