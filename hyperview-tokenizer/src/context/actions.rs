//! Action resolution: element event bindings merged into named component actions.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ComponentContext, ResolvedStateItem};
use crate::action::{ActionBinding, ActionParameters, ParameterValueSpec};
use crate::elements::{ElementActionDescription, ElementActionParameter, ElementId, UiElement};
use crate::error::{TokenizationError, TokenizationResult};
use crate::types::{SupportedValue, TypeFactory};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolvedParameterKind {
    /// Forwarded from the element event's parameter at this index
    Inherited { index: usize },
    Constant(SupportedValue),
    /// `nil` passed for an optional type
    Nil,
    StateVariable(String),
    Reference {
        element: ElementId,
        #[serde(skip_serializing_if = "Option::is_none")]
        property: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedActionParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub type_factory: TypeFactory,
    pub kind: ResolvedParameterKind,
}

/// One element event feeding an action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedActionSource {
    pub element: ElementId,
    /// The element event that matched, by its primary name
    pub element_action: String,
    pub parameters: Vec<ResolvedActionParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSignatureParameter {
    pub label: String,
    pub type_factory: TypeFactory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedHyperViewAction {
    pub name: String,
    pub parameters: Vec<ActionSignatureParameter>,
    pub sources: Vec<ResolvedActionSource>,
}

impl ResolvedHyperViewAction {
    /// The events this action exposes when the component is embedded elsewhere
    pub fn as_element_action(&self) -> ElementActionDescription {
        ElementActionDescription {
            name: self.name.clone(),
            aliases: Vec::new(),
            parameters: self
                .parameters
                .iter()
                .map(|p| ElementActionParameter::new(Some(&p.label), p.type_factory.clone()))
                .collect(),
        }
    }
}

impl<'a> ComponentContext<'a> {
    pub fn resolve_actions(&self) -> TokenizationResult<Vec<ResolvedHyperViewAction>> {
        let state = self.resolve_state()?;
        self.resolve_actions_with(&state)
    }

    /// Resolve actions against already resolved state.
    pub fn resolve_actions_with(
        &self,
        state: &BTreeMap<String, ResolvedStateItem>,
    ) -> TokenizationResult<Vec<ResolvedHyperViewAction>> {
        let _span = tracing::debug_span!("resolve_actions", component = %self.definition.type_name).entered();

        let mut grouped: Vec<(String, Vec<ResolvedActionSource>)> = Vec::new();
        for element in self.definition.all_elements() {
            if element.actions.is_empty() {
                continue;
            }
            let available = self.element_actions(element)?;
            for binding in &element.actions {
                let Some(description) = available.iter().find(|a| a.matches(&binding.event)) else {
                    tracing::debug!(element = %element.id.name(), event = %binding.event, "no matching element action, binding dropped");
                    continue;
                };
                let source = ResolvedActionSource {
                    element: element.id.clone(),
                    element_action: description.name.clone(),
                    parameters: self.resolve_parameters(element, binding, description, state)?,
                };
                match grouped.iter_mut().find(|(name, _)| name == &binding.action) {
                    Some((_, sources)) => sources.push(source),
                    None => grouped.push((binding.action.clone(), vec![source])),
                }
            }
        }

        grouped
            .into_iter()
            .map(|(name, sources)| self.verify_signature(name, sources))
            .collect()
    }

    /// Events an element can emit; a component reference exposes the nested component's actions.
    fn element_actions(&self, element: &UiElement) -> TokenizationResult<Vec<ElementActionDescription>> {
        match &element.reference {
            Some(reference) => {
                let nested = self.reference_context(&reference.type_name)?;
                Ok(nested
                    .resolve_actions()?
                    .iter()
                    .map(ResolvedHyperViewAction::as_element_action)
                    .collect())
            }
            None => Ok(element.factory.actions.clone()),
        }
    }

    fn resolve_parameters(
        &self,
        element: &UiElement,
        binding: &ActionBinding,
        description: &ElementActionDescription,
        state: &BTreeMap<String, ResolvedStateItem>,
    ) -> TokenizationResult<Vec<ResolvedActionParameter>> {
        let specs = match &binding.parameters {
            ActionParameters::Inherited => {
                return Ok(description
                    .parameters
                    .iter()
                    .enumerate()
                    .map(|(index, parameter)| ResolvedActionParameter {
                        label: parameter.label.clone(),
                        type_factory: parameter.type_factory.clone(),
                        kind: ResolvedParameterKind::Inherited { index },
                    })
                    .collect())
            }
            ActionParameters::Explicit(specs) => specs,
        };

        specs
            .iter()
            .map(|spec| -> TokenizationResult<ResolvedActionParameter> {
                let (type_factory, kind) = match &spec.value {
                    ParameterValueSpec::Constant { type_name, literal } => {
                        let type_factory = TypeFactory::attribute_type_named(type_name, self.platform())?;
                        let value = if literal == "nil" && type_factory.is_nullable() {
                            ResolvedParameterKind::Nil
                        } else {
                            let context = format!("{}({})", binding.action, type_name);
                            ResolvedParameterKind::Constant(type_factory.materialize_attribute(literal, &context)?)
                        };
                        (type_factory, value)
                    }
                    ParameterValueSpec::StateVariable(name) => {
                        let item = state.get(name).ok_or_else(|| TokenizationError::UnknownStateItem {
                            action: binding.action.clone(),
                            name: name.clone(),
                        })?;
                        (item.type_factory.clone(), ResolvedParameterKind::StateVariable(name.clone()))
                    }
                    ParameterValueSpec::Reference { target, property } => {
                        let target_element = if target == "self" {
                            element
                        } else {
                            self.element(target)?
                        };
                        let type_factory = match property {
                            Some(property) => target_element
                                .factory
                                .property(property)
                                .map(|p| p.type_factory.clone())
                                .ok_or_else(|| TokenizationError::UnknownElementProperty {
                                    id: target_element.id.name().to_string(),
                                    property: property.clone(),
                                })?,
                            None => TypeFactory::View {
                                runtime_name: match &target_element.reference {
                                    Some(reference) => reference.type_name.clone(),
                                    None => target_element
                                        .factory
                                        .runtime_type
                                        .name()
                                        .unwrap_or(target_element.tag())
                                        .to_string(),
                                },
                            },
                        };
                        (
                            type_factory,
                            ResolvedParameterKind::Reference {
                                element: target_element.id.clone(),
                                property: property.clone(),
                            },
                        )
                    }
                };
                Ok(ResolvedActionParameter {
                    label: spec.label.clone(),
                    type_factory,
                    kind,
                })
            })
            .collect()
    }

    /// Every source must match the first one in parameter count and runtime types.
    fn verify_signature(
        &self,
        name: String,
        sources: Vec<ResolvedActionSource>,
    ) -> TokenizationResult<ResolvedHyperViewAction> {
        let platform = self.platform();
        let Some(first) = sources.first() else {
            return Ok(ResolvedHyperViewAction {
                name,
                parameters: Vec::new(),
                sources,
            });
        };

        for source in &sources[1..] {
            if source.parameters.len() != first.parameters.len() {
                return Err(TokenizationError::ActionSignatureMismatch {
                    action: name,
                    reason: format!(
                        "{} passes {} parameters, {} passes {}",
                        first.element.name(),
                        first.parameters.len(),
                        source.element.name(),
                        source.parameters.len()
                    ),
                });
            }
            for (index, (expected, actual)) in first.parameters.iter().zip(&source.parameters).enumerate() {
                let expected_type = expected.type_factory.runtime_type(platform);
                let actual_type = actual.type_factory.runtime_type(platform);
                if expected_type != actual_type {
                    return Err(TokenizationError::ActionSignatureMismatch {
                        action: name,
                        reason: format!(
                            "parameter {} is {} from {} but {} from {}",
                            index,
                            expected_type,
                            first.element.name(),
                            actual_type,
                            source.element.name()
                        ),
                    });
                }
            }
        }

        let parameters = first
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| ActionSignatureParameter {
                label: parameter
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("param{}", index + 1)),
                type_factory: parameter.type_factory.clone(),
            })
            .collect();
        tracing::debug!(action = %name, sources = sources.len(), "resolved action");
        Ok(ResolvedHyperViewAction {
            name,
            parameters,
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationDescription;
    use crate::context::GlobalContext;
    use crate::modules::default_modules;
    use pretty_assertions::assert_eq;

    fn global(components: &[(&str, &str)]) -> GlobalContext {
        let mut global = GlobalContext::new(ApplicationDescription::default(), &default_modules()).unwrap();
        for (name, xml) in components {
            global.add_component_xml(xml, name).unwrap();
        }
        global
    }

    fn actions(xml: &str) -> TokenizationResult<Vec<ResolvedHyperViewAction>> {
        let global = global(&[("Form", xml)]);
        let result = global.context("Form").unwrap().resolve_actions();
        result
    }

    #[test]
    fn test_inherited_parameters() {
        let actions = actions(
            r#"<Component>
                <TextField action:textChanged="emailChanged" />
                <TextField action:valueChanged="emailChanged" />
            </Component>"#,
        )
        .unwrap();
        assert_eq!(actions.len(), 1);
        let action = &actions[0];
        assert_eq!(action.name, "emailChanged");
        assert_eq!(action.sources.len(), 2);
        assert_eq!(action.sources[1].element_action, "textChanged");
        assert_eq!(
            action.parameters,
            vec![ActionSignatureParameter {
                label: "text".to_string(),
                type_factory: TypeFactory::String.optional()
            }]
        );
    }

    #[test]
    fn test_self_reference_uses_generated_id() {
        let xml = r#"<Component>
            <Label />
            <Button action:tap="pressed(self)" />
        </Component>"#;
        let first = actions(xml).unwrap();
        let second = actions(xml).unwrap();
        let kind = &first[0].sources[0].parameters[0].kind;
        assert_eq!(
            kind,
            &ResolvedParameterKind::Reference {
                element: ElementId::Generated("button2".to_string()),
                property: None
            }
        );
        assert_eq!(first, second);
        assert_eq!(
            first[0].parameters[0].type_factory,
            TypeFactory::View {
                runtime_name: "UIButton".to_string()
            }
        );
    }

    #[test]
    fn test_reference_property_and_state() {
        let actions = actions(
            r#"<Component>
                <TextField field="email" text="$email" />
                <Button action:tap="submit(email.text, $email, retries: Int(3))" />
            </Component>"#,
        )
        .unwrap();
        let parameters = &actions[0].sources[0].parameters;
        assert_eq!(parameters[0].type_factory, TypeFactory::String.optional());
        assert_eq!(parameters[1].kind, ResolvedParameterKind::StateVariable("email".to_string()));
        assert_eq!(parameters[2].kind, ResolvedParameterKind::Constant(SupportedValue::Integer(3)));
        assert_eq!(actions[0].parameters[0].label, "param1");
        assert_eq!(actions[0].parameters[2].label, "retries");
    }

    #[test]
    fn test_resolution_failures() {
        let cases = [
            (r#"<C><Button action:tap="go($missing)" /></C>"#, "UnknownStateItem"),
            (r#"<C><Button action:tap="go(nobody)" /></C>"#, "UnknownElementId"),
            (r#"<C><Button action:tap="go(self.nothing)" /></C>"#, "UnknownElementProperty"),
            (r#"<C><Button action:tap="go(Widget(1))" /></C>"#, "UnknownType"),
        ];
        for (xml, expected) in cases {
            let err = actions(xml).unwrap_err();
            assert!(format!("{:?}", err).starts_with(expected), "{} gave {:?}", xml, err);
        }
    }

    #[test]
    fn test_unmatched_binding_is_dropped() {
        let actions = actions(r#"<C><Label action:tap="nothing" /></C>"#).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn test_nested_component_actions() {
        let global = global(&[
            (
                "Row",
                r#"<Component><Button action:tap="selected(Int(1))" /></Component>"#,
            ),
            (
                "List",
                r#"<Component><Row action:selected="rowSelected" /></Component>"#,
            ),
        ]);
        let actions = global.context("List").unwrap().resolve_actions().unwrap();
        assert_eq!(actions[0].name, "rowSelected");
        assert_eq!(actions[0].parameters[0].type_factory, TypeFactory::Integer);
        assert_eq!(actions[0].parameters[0].label, "param1");
    }

    #[test]
    fn test_sources_with_different_parameter_counts() {
        let err = actions(
            r#"<Component>
                <Button action:tap="go(Int(1))" />
                <Button action:tap="go(Int(1), Int(2))" />
            </Component>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TokenizationError::ActionSignatureMismatch { ref action, ref reason }
                if action == "go" && reason.contains("passes 1 parameters")
        ));
    }

    #[test]
    fn test_explicit_component_reference_is_typed_by_component() {
        let global = global(&[
            ("A", r#"<Component><Button action:tap="picked(Int(1))" /></Component>"#),
            ("B", r#"<Component><Button action:tap="picked(Int(1))" /></Component>"#),
            (
                "One",
                r#"<Component><ComponentReference type="A" action:picked="chosen(self)" /></Component>"#,
            ),
            (
                "Both",
                r#"<Component>
                    <ComponentReference type="A" action:picked="chosen(self)" />
                    <ComponentReference type="B" action:picked="chosen(self)" />
                </Component>"#,
            ),
        ]);
        let actions = global.context("One").unwrap().resolve_actions().unwrap();
        assert_eq!(
            actions[0].parameters[0].type_factory,
            TypeFactory::View {
                runtime_name: "A".to_string()
            }
        );
        assert!(matches!(
            global.context("Both").unwrap().resolve_actions(),
            Err(TokenizationError::ActionSignatureMismatch { ref action, .. }) if action == "chosen"
        ));
    }
}
