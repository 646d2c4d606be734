//! Style and template lookup with `extend` flattening.

use serde::Serialize;

use super::ComponentContext;
use crate::elements::{ElementId, UiElement};
use crate::error::{TokenizationError, TokenizationResult};
use crate::properties::{merge_properties, Property};
use crate::style::{AccessModifier, AttributedTextStyle, Style, StyleName, StyleType, TemplateName};
use crate::template::Template;

/// A style with every extended style merged in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStyle {
    pub name: StyleName,
    pub access_modifier: AccessModifier,
    pub style_type: StyleType,
    pub properties: Vec<Property>,
    pub requires_theme: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTemplate {
    pub name: TemplateName,
    pub access_modifier: AccessModifier,
    pub text: String,
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ResolvedStyle>,
    pub properties: Vec<Property>,
    pub requires_theme: bool,
}

/// An element's own properties on top of its styles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedElement {
    pub id: ElementId,
    pub tag: String,
    pub properties: Vec<Property>,
    pub requires_theme: bool,
}

/// The root view of a component after applying its root styles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRoot {
    pub properties: Vec<Property>,
    pub requires_theme: bool,
}

/// Runs with the same tag merge like properties, parent first.
fn merge_runs(runs: impl IntoIterator<Item = AttributedTextStyle>) -> Vec<AttributedTextStyle> {
    let mut merged: Vec<AttributedTextStyle> = Vec::new();
    for run in runs {
        match merged.iter_mut().find(|existing| existing.name == run.name) {
            Some(existing) => {
                let properties = std::mem::take(&mut existing.properties);
                existing.properties = merge_properties(properties.into_iter().chain(run.properties));
            }
            None => merged.push(run),
        }
    }
    merged
}

fn bound_element(style_type: &StyleType) -> &str {
    match style_type {
        StyleType::View { element } => element,
        StyleType::AttributedText { .. } => "attributedText",
    }
}

/// View styles extend styles of the same element or of the base `View`; attributed text extends attributed text.
fn check_extension(child: &Style, parent_name: &StyleName, parent: &ResolvedStyle) -> TokenizationResult<()> {
    let compatible = match (&child.style_type, &parent.style_type) {
        (StyleType::View { element }, StyleType::View { element: parent_element }) => {
            parent_element == element || parent_element == "View"
        }
        (StyleType::AttributedText { .. }, StyleType::AttributedText { .. }) => true,
        _ => false,
    };
    if compatible {
        return Ok(());
    }
    Err(TokenizationError::StyleElementMismatch {
        style: parent_name.to_string(),
        style_element: bound_element(&parent.style_type).to_string(),
        element: bound_element(&child.style_type).to_string(),
    })
}

fn cycle_error(visited: &[StyleName], name: &StyleName) -> TokenizationError {
    let path = visited
        .iter()
        .chain(std::iter::once(name))
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");
    TokenizationError::CyclicStyleExtension {
        name: name.to_string(),
        path,
    }
}

impl<'a> ComponentContext<'a> {
    /// The declared style, searched in this component then in the global groups.
    pub fn style(&self, name: &StyleName) -> TokenizationResult<&'a Style> {
        let unknown = || TokenizationError::UnknownStyle { name: name.to_string() };
        let own = self.definition.styles.as_ref();
        match name {
            StyleName::Local { name: local } => own
                .and_then(|group| group.styles.iter().find(|style| style.name.name() == local))
                .ok_or_else(unknown),
            StyleName::Global { group, .. } => {
                if let Some(style) = own.filter(|g| g.name.as_ref() == Some(group)).and_then(|g| g.style(name)) {
                    return Ok(style);
                }
                self.global.style_group(group)?.style(name).ok_or_else(unknown)
            }
        }
    }

    pub fn template(&self, name: &TemplateName) -> TokenizationResult<&'a Template> {
        let unknown = || TokenizationError::UnknownTemplate { name: name.to_string() };
        let own = self.definition.templates.as_ref();
        match name {
            TemplateName::Local { name: local } => own
                .and_then(|group| group.templates.iter().find(|t| t.name.name() == local))
                .ok_or_else(unknown),
            TemplateName::Global { group, .. } => {
                if let Some(template) = own
                    .filter(|g| g.name.as_ref() == Some(group))
                    .and_then(|g| g.template(name))
                {
                    return Ok(template);
                }
                self.global.template_group(group)?.template(name).ok_or_else(unknown)
            }
        }
    }

    pub fn resolve_style(&self, name: &StyleName) -> TokenizationResult<ResolvedStyle> {
        self.resolve_style_inner(name, &mut Vec::new())
    }

    fn resolve_style_inner(&self, name: &StyleName, visited: &mut Vec<StyleName>) -> TokenizationResult<ResolvedStyle> {
        if visited.contains(name) {
            return Err(cycle_error(visited, name));
        }
        let style = self.style(name)?;
        visited.push(name.clone());

        let mut properties = Vec::new();
        let mut runs = Vec::new();
        let mut requires_theme = style.requires_theme();
        for parent_name in &style.extend {
            let parent = self.resolve_style_inner(parent_name, visited)?;
            check_extension(style, parent_name, &parent)?;
            requires_theme |= parent.requires_theme;
            properties.extend(parent.properties);
            if let StyleType::AttributedText { runs: parent_runs } = parent.style_type {
                runs.extend(parent_runs);
            }
        }
        visited.pop();

        properties.extend(style.properties.iter().cloned());
        let style_type = match &style.style_type {
            StyleType::AttributedText { runs: own_runs } => StyleType::AttributedText {
                runs: merge_runs(runs.into_iter().chain(own_runs.iter().cloned())),
            },
            view => view.clone(),
        };

        Ok(ResolvedStyle {
            name: style.name.clone(),
            access_modifier: style
                .access_modifier
                .unwrap_or(self.global.application().default_access_modifier),
            style_type,
            properties: merge_properties(properties),
            requires_theme,
        })
    }

    pub fn resolve_template(&self, name: &TemplateName) -> TokenizationResult<ResolvedTemplate> {
        self.resolve_template_inner(name, &mut Vec::new())
    }

    fn resolve_template_inner(
        &self,
        name: &TemplateName,
        visited: &mut Vec<TemplateName>,
    ) -> TokenizationResult<ResolvedTemplate> {
        if visited.contains(name) {
            let path = visited
                .iter()
                .chain(std::iter::once(name))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(TokenizationError::CyclicStyleExtension {
                name: name.to_string(),
                path,
            });
        }
        let template = self.template(name)?;
        visited.push(name.clone());

        let mut properties = Vec::new();
        let mut requires_theme = template.requires_theme();
        for parent_name in &template.extend {
            let parent = self.resolve_template_inner(parent_name, visited)?;
            requires_theme |= parent.requires_theme;
            properties.extend(parent.properties);
        }
        visited.pop();
        properties.extend(template.properties.iter().cloned());

        let style = match &template.style {
            Some(style_name) => {
                let style = self.resolve_style(style_name)?;
                if let StyleType::View { element } = &style.style_type {
                    return Err(TokenizationError::StyleElementMismatch {
                        style: style_name.to_string(),
                        style_element: element.clone(),
                        element: "attributedText".to_string(),
                    });
                }
                requires_theme |= style.requires_theme;
                Some(style)
            }
            None => None,
        };

        Ok(ResolvedTemplate {
            name: template.name.clone(),
            access_modifier: template
                .access_modifier
                .unwrap_or(self.global.application().default_access_modifier),
            text: template.text.clone(),
            arguments: template.arguments.clone(),
            style,
            properties: merge_properties(properties),
            requires_theme,
        })
    }

    /// Merge `styles` in order under `own`, checking each is bound to `tag` or the base `View`.
    fn apply_styles(&self, tag: &str, styles: &[StyleName], own: &[Property]) -> TokenizationResult<(Vec<Property>, bool)> {
        let mut properties = Vec::new();
        let mut requires_theme = false;
        for style_name in styles {
            let style = self.resolve_style(style_name)?;
            match &style.style_type {
                StyleType::View { element: bound } if bound == tag || bound == "View" => {}
                other => {
                    return Err(TokenizationError::StyleElementMismatch {
                        style: style_name.to_string(),
                        style_element: bound_element(other).to_string(),
                        element: tag.to_string(),
                    })
                }
            }
            requires_theme |= style.requires_theme;
            properties.extend(style.properties);
        }
        requires_theme |= own.iter().any(Property::requires_theme);
        properties.extend(own.iter().cloned());
        Ok((merge_properties(properties), requires_theme))
    }

    /// Properties of `element` after applying its styles in order.
    pub fn resolve_element(&self, element: &UiElement) -> TokenizationResult<ResolvedElement> {
        let (properties, requires_theme) = self.apply_styles(element.tag(), &element.styles, &element.properties)?;
        Ok(ResolvedElement {
            id: element.id.clone(),
            tag: element.tag().to_string(),
            properties,
            requires_theme,
        })
    }

    /// The root view's properties with the component's root styles applied.
    pub fn resolve_root(&self) -> TokenizationResult<ResolvedRoot> {
        let (properties, requires_theme) =
            self.apply_styles("View", &self.definition.root_styles, &self.definition.root_properties)?;
        Ok(ResolvedRoot {
            properties,
            requires_theme,
        })
    }

    /// Every style the component declares, flattened, including ones no element applies.
    pub fn resolve_declared_styles(&self) -> TokenizationResult<Vec<ResolvedStyle>> {
        let Some(group) = &self.definition.styles else {
            return Ok(Vec::new());
        };
        group.styles.iter().map(|style| self.resolve_style(&style.name)).collect()
    }

    pub fn resolve_declared_templates(&self) -> TokenizationResult<Vec<ResolvedTemplate>> {
        let Some(group) = &self.definition.templates else {
            return Ok(Vec::new());
        };
        group
            .templates
            .iter()
            .map(|template| self.resolve_template(&template.name))
            .collect()
    }

    pub fn resolve_elements(&self) -> TokenizationResult<Vec<ResolvedElement>> {
        self.definition
            .all_elements()
            .into_iter()
            .map(|element| self.resolve_element(element))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::application::ApplicationDescription;
    use crate::context::GlobalContext;
    use crate::error::TokenizationError;
    use crate::modules::default_modules;
    use crate::properties::PropertyValue;
    use crate::style::StyleName;
    use crate::types::SupportedValue;
    use pretty_assertions::assert_eq;

    fn global() -> GlobalContext {
        let mut global = GlobalContext::new(ApplicationDescription::default(), &default_modules()).unwrap();
        global
            .add_group_xml(
                r#"<styles name="common">
                    <LabelStyle name="base" numberOfLines="1" textColor="@text" />
                    <LabelStyle name="body" extend="base" numberOfLines="2" />
                    <LabelStyle name="loopA" extend="loopB" />
                    <LabelStyle name="loopB" extend="loopA" />
                    <ViewStyle name="card" alpha="0.5" />
                </styles>"#,
            )
            .unwrap();
        global
            .add_component_xml(
                r#"<Component type="Screen">
                    <styles>
                        <LabelStyle name="title" extend=":common:body" numberOfLines="3" font=":bold@20" />
                        <ButtonStyle name="primary" isEnabled="true" />
                    </styles>
                    <Label field="heading" style="title :common:card" numberOfLines="4" />
                    <Label field="wrong" style="primary" />
                </Component>"#,
                "Screen",
            )
            .unwrap();
        global
    }

    #[test]
    fn test_chain_flattening_matches_manual_merge() {
        let global = global();
        let context = global.context("Screen").unwrap();
        let resolved = context.resolve_style(&StyleName::local("title")).unwrap();
        let keys: Vec<String> = resolved.properties.iter().map(|p| p.key_path()).collect();
        assert_eq!(keys, vec!["textColor", "numberOfLines", "font"]);
        assert_eq!(
            resolved.properties[1].value,
            PropertyValue::Value(SupportedValue::Integer(3))
        );
        assert!(resolved.requires_theme);
    }

    #[test]
    fn test_cyclic_extension() {
        let global = global();
        let context = global.context("Screen").unwrap();
        let err = context.resolve_style(&StyleName::global("common", "loopA")).unwrap_err();
        assert_eq!(
            err,
            TokenizationError::CyclicStyleExtension {
                name: ":common:loopA".to_string(),
                path: ":common:loopA -> :common:loopB -> :common:loopA".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_names() {
        let global = global();
        let context = global.context("Screen").unwrap();
        assert!(matches!(
            context.resolve_style(&StyleName::local("nope")),
            Err(TokenizationError::UnknownStyle { .. })
        ));
        assert!(matches!(
            context.resolve_style(&StyleName::global("missing", "x")),
            Err(TokenizationError::UnknownStyleGroup { .. })
        ));
    }

    #[test]
    fn test_element_styles_apply_under_own_properties() {
        let global = global();
        let context = global.context("Screen").unwrap();
        let heading = context.definition.element("heading").unwrap();
        let resolved = context.resolve_element(heading).unwrap();
        let number_of_lines = resolved
            .properties
            .iter()
            .find(|p| p.name == "numberOfLines")
            .unwrap();
        assert_eq!(number_of_lines.value, PropertyValue::Value(SupportedValue::Integer(4)));
        assert!(resolved.properties.iter().any(|p| p.name == "alpha"));
        assert!(resolved.requires_theme);
    }

    #[test]
    fn test_style_for_other_element() {
        let global = global();
        let context = global.context("Screen").unwrap();
        let wrong = context.definition.element("wrong").unwrap();
        assert!(matches!(
            context.resolve_element(wrong),
            Err(TokenizationError::StyleElementMismatch { .. })
        ));
    }

    fn with_component(xml: &str) -> GlobalContext {
        let mut global = global();
        global.add_component_xml(xml, "Other").unwrap();
        global
    }

    #[test]
    fn test_extending_a_style_of_another_element() {
        let global = with_component(
            r#"<Component>
                <styles>
                    <ButtonStyle name="btn" isEnabled="false" />
                    <LabelStyle name="lbl" extend="btn" numberOfLines="1" />
                </styles>
            </Component>"#,
        );
        let context = global.context("Other").unwrap();
        assert_eq!(
            context.resolve_style(&StyleName::local("lbl")).unwrap_err(),
            TokenizationError::StyleElementMismatch {
                style: "btn".to_string(),
                style_element: "Button".to_string(),
                element: "Label".to_string(),
            }
        );
    }

    #[test]
    fn test_extending_the_base_view_style() {
        let global = with_component(
            r#"<Component>
                <styles>
                    <LabelStyle name="lbl" extend=":common:card" numberOfLines="1" />
                </styles>
            </Component>"#,
        );
        let context = global.context("Other").unwrap();
        let resolved = context.resolve_style(&StyleName::local("lbl")).unwrap();
        let keys: Vec<String> = resolved.properties.iter().map(|p| p.key_path()).collect();
        assert_eq!(keys, vec!["alpha", "numberOfLines"]);
    }

    #[test]
    fn test_view_style_extending_attributed_text() {
        let global = with_component(
            r#"<Component>
                <styles>
                    <attributedTextStyle name="rich" font="@14" />
                    <LabelStyle name="lbl" extend="rich" />
                    <attributedTextStyle name="richer" extend=":common:base" />
                </styles>
            </Component>"#,
        );
        let context = global.context("Other").unwrap();
        assert!(matches!(
            context.resolve_style(&StyleName::local("lbl")),
            Err(TokenizationError::StyleElementMismatch { ref style_element, .. }) if style_element == "attributedText"
        ));
        assert!(matches!(
            context.resolve_style(&StyleName::local("richer")),
            Err(TokenizationError::StyleElementMismatch { ref element, .. }) if element == "attributedText"
        ));
    }

    #[test]
    fn test_unknown_root_style() {
        let global = with_component(r#"<Component style="doesNotExist"><Label /></Component>"#);
        assert!(matches!(
            global.context("Other").unwrap().resolve(),
            Err(TokenizationError::UnknownStyle { .. })
        ));
    }

    #[test]
    fn test_root_styles_apply_under_root_properties() {
        let global = with_component(r#"<Component style=":common:card" alpha="1"><Label /></Component>"#);
        let resolved = global.context("Other").unwrap().resolve().unwrap();
        let alpha = resolved.root.properties.iter().find(|p| p.name == "alpha").unwrap();
        assert_eq!(alpha.value, PropertyValue::Value(SupportedValue::Float(1.0)));
        assert!(!resolved.root.requires_theme);
    }

    #[test]
    fn test_root_rejects_styles_for_other_elements() {
        let global = with_component(r#"<Component style=":common:base"><Label /></Component>"#);
        assert!(matches!(
            global.context("Other").unwrap().resolve(),
            Err(TokenizationError::StyleElementMismatch { ref element, .. }) if element == "View"
        ));
    }

    #[test]
    fn test_unused_style_with_dangling_extend() {
        let global = with_component(
            r#"<Component>
                <styles>
                    <LabelStyle name="a" extend="missing" />
                </styles>
                <Label />
            </Component>"#,
        );
        assert!(matches!(
            global.context("Other").unwrap().resolve(),
            Err(TokenizationError::UnknownStyle { ref name, .. }) if name == "missing"
        ));
    }

    #[test]
    fn test_declared_styles_and_templates_are_resolved() {
        let global = with_component(
            r#"<Component>
                <styles>
                    <LabelStyle name="caption" extend=":common:base" />
                    <attributedTextStyle name="rich" font="@14" />
                </styles>
                <templates>
                    <attributedText name="greeting" style="rich">Hello {{name}}!</attributedText>
                </templates>
                <Label />
            </Component>"#,
        );
        let resolved = global.context("Other").unwrap().resolve().unwrap();
        let names: Vec<String> = resolved.styles.iter().map(|s| s.name.to_string()).collect();
        assert_eq!(names, vec!["caption", "rich"]);
        assert_eq!(resolved.templates.len(), 1);
        assert_eq!(resolved.templates[0].arguments, vec!["name".to_string()]);
        assert!(resolved.templates[0].style.is_some());
        assert!(resolved.requires_theme);
    }

    #[test]
    fn test_unused_template_with_unknown_style() {
        let global = with_component(
            r#"<Component>
                <templates>
                    <attributedText name="greeting" style="nowhere">Hello</attributedText>
                </templates>
                <Label />
            </Component>"#,
        );
        assert!(matches!(
            global.context("Other").unwrap().resolve(),
            Err(TokenizationError::UnknownStyle { .. })
        ));
    }
}
