use serde::{Deserialize, Serialize};

use super::{RuntimePlatform, RuntimeType, SupportedValue};
use crate::error::{TokenizationError, TokenizationResult};

/// A fixed set of case labels mapped onto a platform enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumTypeFactory {
    pub name: String,
    pub cases: Vec<String>,
    pub uikit_type: Option<String>,
    pub appkit_type: Option<String>,
}

impl EnumTypeFactory {
    pub fn new(name: &str, cases: &[&str], uikit_type: Option<&str>, appkit_type: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            cases: cases.iter().map(|c| c.to_string()).collect(),
            uikit_type: uikit_type.map(str::to_string),
            appkit_type: appkit_type.map(str::to_string),
        }
    }

    pub fn runtime_type(&self, platform: RuntimePlatform) -> RuntimeType {
        let (name, module) = if platform.is_uikit() {
            (&self.uikit_type, "UIKit")
        } else {
            (&self.appkit_type, "AppKit")
        };
        match name {
            Some(name) => RuntimeType::with_module(name.clone(), module),
            None => RuntimeType::Unsupported,
        }
    }

    /// Exact, case-sensitive match against the case labels.
    pub fn materialize(&self, value: &str) -> TokenizationResult<SupportedValue> {
        if self.cases.iter().any(|case| case == value) {
            Ok(SupportedValue::EnumCase(value.to_string()))
        } else {
            Err(TokenizationError::UnknownEnumValue {
                value: value.to_string(),
                type_name: self.name.clone(),
                expected: self.cases.join(", "),
            })
        }
    }
}

pub fn text_alignment() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "TextAlignment",
        &["left", "right", "center", "justified", "natural"],
        Some("NSTextAlignment"),
        Some("NSTextAlignment"),
    )
}

pub fn content_mode() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "ContentMode",
        &[
            "scaleToFill", "scaleAspectFit", "scaleAspectFill", "redraw", "center", "top",
            "bottom", "left", "right", "topLeft", "topRight", "bottomLeft", "bottomRight",
        ],
        Some("UIView.ContentMode"),
        None,
    )
}

pub fn line_break_mode() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "LineBreakMode",
        &[
            "byWordWrapping", "byCharWrapping", "byClipping", "byTruncatingHead",
            "byTruncatingTail", "byTruncatingMiddle",
        ],
        Some("NSLineBreakMode"),
        Some("NSLineBreakMode"),
    )
}

pub fn keyboard_type() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "KeyboardType",
        &[
            "default", "asciiCapable", "numbersAndPunctuation", "URL", "numberPad", "phonePad",
            "namePhonePad", "emailAddress", "decimalPad", "twitter", "webSearch",
        ],
        Some("UIKeyboardType"),
        None,
    )
}

pub fn layout_axis() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "LayoutAxis",
        &["horizontal", "vertical"],
        Some("NSLayoutConstraint.Axis"),
        Some("NSUserInterfaceLayoutOrientation"),
    )
}

pub fn stack_distribution() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "StackDistribution",
        &["fill", "fillEqually", "fillProportionally", "equalSpacing", "equalCentering"],
        Some("UIStackView.Distribution"),
        Some("NSStackView.Distribution"),
    )
}

pub fn stack_alignment() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "StackAlignment",
        &["fill", "leading", "firstBaseline", "center", "trailing", "lastBaseline"],
        Some("UIStackView.Alignment"),
        None,
    )
}

pub fn activity_indicator_style() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "ActivityIndicatorStyle",
        &["medium", "large"],
        Some("UIActivityIndicatorView.Style"),
        None,
    )
}

pub fn bezel_style() -> EnumTypeFactory {
    EnumTypeFactory::new(
        "BezelStyle",
        &["rounded", "regularSquare", "disclosure", "shadowlessSquare", "circular", "texturedSquare", "inline"],
        None,
        Some("NSButton.BezelStyle"),
    )
}

/// Every enumeration the built-in modules use, for constant and state type lookup
pub fn builtin_enums() -> Vec<EnumTypeFactory> {
    vec![
        text_alignment(),
        content_mode(),
        line_break_mode(),
        keyboard_type(),
        layout_axis(),
        stack_distribution(),
        stack_alignment(),
        activity_indicator_style(),
        bezel_style(),
    ]
}
