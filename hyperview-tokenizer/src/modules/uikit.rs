//! UIKit elements for iOS and tvOS.

use super::RuntimeModule;
use crate::elements::{ElementActionDescription, ElementActionParameter, ElementFactory};
use crate::properties::{PropertyDescription, PropertyNamespace};
use crate::types::enums;
use crate::types::{RuntimePlatform, RuntimeType, SupportedValue, TypeFactory};

fn ui(name: &str) -> RuntimeType {
    RuntimeType::with_module(name, "UIKit")
}

fn prop(name: &str, type_factory: TypeFactory) -> PropertyDescription {
    PropertyDescription::new(name, type_factory)
}

fn event(name: &str, aliases: &[&str], parameters: &[(Option<&str>, TypeFactory)]) -> ElementActionDescription {
    ElementActionDescription::new(
        name,
        aliases,
        parameters
            .iter()
            .map(|(label, type_factory)| ElementActionParameter::new(*label, type_factory.clone()))
            .collect(),
    )
}

pub fn view_properties() -> Vec<PropertyDescription> {
    vec![
        prop("backgroundColor", TypeFactory::Color.optional()),
        prop("tintColor", TypeFactory::Color.optional()),
        prop("alpha", TypeFactory::Float).with_default(SupportedValue::Float(1.0)),
        prop("isHidden", TypeFactory::Bool).with_default(SupportedValue::Bool(false)),
        prop("clipsToBounds", TypeFactory::Bool),
        prop("isUserInteractionEnabled", TypeFactory::Bool),
        prop("layoutMargins", TypeFactory::EdgeInsets),
        prop("frame", TypeFactory::Rect),
        PropertyDescription::nested(&["layer"], "cornerRadius", TypeFactory::Float),
        PropertyDescription::nested(&["layer"], "borderWidth", TypeFactory::Float),
        PropertyDescription::nested(&["layer"], "masksToBounds", TypeFactory::Bool),
    ]
}

fn text_properties() -> Vec<PropertyDescription> {
    vec![
        prop("text", TypeFactory::String.optional()),
        prop("font", TypeFactory::Font.optional()),
        prop("textColor", TypeFactory::Color.optional()),
        prop("textAlignment", TypeFactory::Enumeration(enums::text_alignment())),
    ]
}

fn view() -> ElementFactory {
    ElementFactory::container("View", ui("UIView")).with_properties(view_properties())
}

fn container() -> ElementFactory {
    ElementFactory::container("Container", ui("UIView")).with_properties(view_properties())
}

fn stack_view() -> ElementFactory {
    ElementFactory::container("StackView", ui("UIStackView"))
        .with_properties(view_properties())
        .with_properties([
            prop("axis", TypeFactory::Enumeration(enums::layout_axis())),
            prop("spacing", TypeFactory::Float),
            prop("distribution", TypeFactory::Enumeration(enums::stack_distribution())),
            prop("alignment", TypeFactory::Enumeration(enums::stack_alignment())),
        ])
}

fn scroll_view() -> ElementFactory {
    ElementFactory::container("ScrollView", ui("UIScrollView"))
        .with_properties(view_properties())
        .with_properties([
            prop("contentInset", TypeFactory::EdgeInsets),
            prop("contentSize", TypeFactory::Size),
            prop("showsVerticalScrollIndicator", TypeFactory::Bool),
            prop("showsHorizontalScrollIndicator", TypeFactory::Bool),
        ])
}

fn label() -> ElementFactory {
    ElementFactory::view("Label", ui("UILabel"))
        .with_properties(view_properties())
        .with_properties(text_properties())
        .with_properties([
            prop("numberOfLines", TypeFactory::Integer).with_default(SupportedValue::Integer(1)),
            prop("lineBreakMode", TypeFactory::Enumeration(enums::line_break_mode())),
            prop("attributedText", TypeFactory::AttributedText.optional()),
        ])
}

fn button() -> ElementFactory {
    let title_label = |name: &str, type_factory: TypeFactory| PropertyDescription {
        namespace: vec![PropertyNamespace::optional("titleLabel")],
        ..PropertyDescription::new(name, type_factory)
    };
    ElementFactory::view("Button", ui("UIButton"))
        .with_properties(view_properties())
        .with_properties([
            prop("title", TypeFactory::String.optional()),
            prop("titleColor", TypeFactory::Color.optional()),
            prop("image", TypeFactory::Image.optional()),
            prop("isEnabled", TypeFactory::Bool),
            prop("contentEdgeInsets", TypeFactory::EdgeInsets),
            title_label("font", TypeFactory::Font.optional()),
            title_label("numberOfLines", TypeFactory::Integer),
        ])
        .with_actions([event("tap", &["touchUpInside"], &[])])
}

fn text_field() -> ElementFactory {
    ElementFactory::view("TextField", ui("UITextField"))
        .with_properties(view_properties())
        .with_properties(text_properties())
        .with_properties([
            prop("placeholder", TypeFactory::String.optional()),
            prop("keyboardType", TypeFactory::Enumeration(enums::keyboard_type())),
            prop("isSecureTextEntry", TypeFactory::Bool),
            prop("isEnabled", TypeFactory::Bool),
        ])
        .with_actions([
            event("textChanged", &["valueChanged"], &[(Some("text"), TypeFactory::String.optional())]),
            event("editingDidEnd", &[], &[]),
            event("primaryActionTriggered", &["return"], &[]),
        ])
}

fn text_view() -> ElementFactory {
    ElementFactory::view("TextView", ui("UITextView"))
        .with_properties(view_properties())
        .with_properties(text_properties())
        .with_properties([prop("isSelectable", TypeFactory::Bool)])
        .with_actions([event("textChanged", &[], &[(Some("text"), TypeFactory::String.optional())])])
}

fn image_view() -> ElementFactory {
    ElementFactory::view("ImageView", ui("UIImageView"))
        .with_properties(view_properties())
        .with_properties([
            prop("image", TypeFactory::Image.optional()),
            prop("contentMode", TypeFactory::Enumeration(enums::content_mode())),
        ])
}

fn activity_indicator() -> ElementFactory {
    ElementFactory::view("ActivityIndicator", ui("UIActivityIndicatorView"))
        .with_properties(view_properties())
        .with_properties([
            prop("style", TypeFactory::Enumeration(enums::activity_indicator_style())),
            prop("color", TypeFactory::Color.optional()),
            prop("hidesWhenStopped", TypeFactory::Bool),
        ])
}

fn switch() -> ElementFactory {
    ElementFactory::view("Switch", ui("UISwitch"))
        .with_properties(view_properties())
        .with_properties([
            prop("isOn", TypeFactory::Bool),
            prop("onTintColor", TypeFactory::Color.optional()),
        ])
        .with_actions([event("valueChanged", &["toggle"], &[(Some("isOn"), TypeFactory::Bool)])])
}

fn slider() -> ElementFactory {
    ElementFactory::view("Slider", ui("UISlider"))
        .with_properties(view_properties())
        .with_properties([
            prop("value", TypeFactory::Float),
            prop("minimumValue", TypeFactory::Float),
            prop("maximumValue", TypeFactory::Float),
        ])
        .with_actions([event("valueChanged", &[], &[(Some("value"), TypeFactory::Float)])])
}

fn elements(platform: RuntimePlatform) -> Vec<ElementFactory> {
    let mut elements = vec![
        view(),
        container(),
        stack_view(),
        scroll_view(),
        label(),
        button(),
        text_field(),
        image_view(),
        activity_indicator(),
    ];
    // not available on tvOS
    if platform == RuntimePlatform::IOS {
        elements.extend([text_view(), switch(), slider()]);
    }
    elements
}

pub fn module() -> RuntimeModule {
    RuntimeModule::new("uikit", &[RuntimePlatform::IOS, RuntimePlatform::TvOS])
        .with_elements(RuntimePlatform::IOS, elements(RuntimePlatform::IOS))
        .with_elements(RuntimePlatform::TvOS, elements(RuntimePlatform::TvOS))
}
