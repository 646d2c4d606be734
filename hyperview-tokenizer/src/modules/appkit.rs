//! AppKit elements for macOS.

use super::RuntimeModule;
use crate::elements::{ElementActionDescription, ElementActionParameter, ElementFactory};
use crate::properties::PropertyDescription;
use crate::types::enums;
use crate::types::{RuntimePlatform, RuntimeType, SupportedValue, TypeFactory};

fn ns(name: &str) -> RuntimeType {
    RuntimeType::with_module(name, "AppKit")
}

fn prop(name: &str, type_factory: TypeFactory) -> PropertyDescription {
    PropertyDescription::new(name, type_factory)
}

pub fn view_properties() -> Vec<PropertyDescription> {
    vec![
        prop("alphaValue", TypeFactory::Float).with_default(SupportedValue::Float(1.0)),
        prop("isHidden", TypeFactory::Bool).with_default(SupportedValue::Bool(false)),
        prop("toolTip", TypeFactory::String.optional()),
        prop("frame", TypeFactory::Rect),
        PropertyDescription::nested(&["layer"], "cornerRadius", TypeFactory::Float),
        PropertyDescription::nested(&["layer"], "borderWidth", TypeFactory::Float),
    ]
}

fn text_field_properties() -> Vec<PropertyDescription> {
    vec![
        prop("stringValue", TypeFactory::String),
        prop("font", TypeFactory::Font.optional()),
        prop("textColor", TypeFactory::Color.optional()),
        prop("alignment", TypeFactory::Enumeration(enums::text_alignment())),
        prop("lineBreakMode", TypeFactory::Enumeration(enums::line_break_mode())),
    ]
}

fn elements() -> Vec<ElementFactory> {
    vec![
        ElementFactory::container("View", ns("NSView")).with_properties(view_properties()),
        ElementFactory::container("Container", ns("NSView")).with_properties(view_properties()),
        ElementFactory::container("StackView", ns("NSStackView"))
            .with_properties(view_properties())
            .with_properties([
                prop("orientation", TypeFactory::Enumeration(enums::layout_axis())),
                prop("spacing", TypeFactory::Float),
                prop("distribution", TypeFactory::Enumeration(enums::stack_distribution())),
                prop("edgeInsets", TypeFactory::EdgeInsets),
            ]),
        ElementFactory::view("Label", ns("NSTextField"))
            .with_properties(view_properties())
            .with_properties(text_field_properties())
            .with_properties([prop("attributedStringValue", TypeFactory::AttributedText)]),
        ElementFactory::view("TextField", ns("NSTextField"))
            .with_properties(view_properties())
            .with_properties(text_field_properties())
            .with_properties([
                prop("placeholderString", TypeFactory::String.optional()),
                prop("isEditable", TypeFactory::Bool),
            ])
            .with_actions([ElementActionDescription::new(
                "textChanged",
                &["valueChanged"],
                vec![ElementActionParameter::new(Some("text"), TypeFactory::String)],
            )]),
        ElementFactory::view("Button", ns("NSButton"))
            .with_properties(view_properties())
            .with_properties([
                prop("title", TypeFactory::String),
                prop("image", TypeFactory::Image.optional()),
                prop("bezelStyle", TypeFactory::Enumeration(enums::bezel_style())),
                prop("isEnabled", TypeFactory::Bool),
            ])
            .with_actions([ElementActionDescription::new("tap", &["click"], Vec::new())]),
        ElementFactory::view("ImageView", ns("NSImageView"))
            .with_properties(view_properties())
            .with_properties([prop("image", TypeFactory::Image.optional())]),
    ]
}

pub fn module() -> RuntimeModule {
    RuntimeModule::new("appkit", &[RuntimePlatform::MacOS]).with_elements(RuntimePlatform::MacOS, elements())
}
