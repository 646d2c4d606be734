use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};
use crate::xml::XmlElement;

/// A materialized property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SupportedValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Color(Color),
    Font(Font),
    Image(String),
    Url(String),
    Size { width: f64, height: f64 },
    Point { x: f64, y: f64 },
    Rect { x: f64, y: f64, width: f64, height: f64 },
    EdgeInsets { top: f64, left: f64, bottom: f64, right: f64 },
    EnumCase(String),
    AttributedText(Vec<AttributedTextRun>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Absolute { red: u8, green: u8, blue: u8, alpha: u8 },
    Named(String),
}

const NAMED_COLORS: &[&str] = &[
    "black", "darkGray", "lightGray", "white", "gray", "red", "green", "blue", "cyan",
    "yellow", "magenta", "orange", "purple", "brown", "clear",
];

impl Color {
    /// `#RGB`, `#RRGGBB`, `#RRGGBBAA` or one of the system color names.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        NAMED_COLORS
            .contains(&value)
            .then(|| Color::Named(value.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match hex.len() {
        3 => {
            let short = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Color::Absolute {
                red: short(0)?,
                green: short(1)?,
                blue: short(2)?,
                alpha: 255,
            })
        }
        6 => Some(Color::Absolute {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
            alpha: 255,
        }),
        8 => Some(Color::Absolute {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
            alpha: channel(6..8)?,
        }),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontWeight {
    UltraLight,
    Thin,
    Light,
    Regular,
    Medium,
    Semibold,
    Bold,
    Heavy,
    Black,
}

impl FontWeight {
    const CASES: &'static [(&'static str, FontWeight)] = &[
        ("ultraLight", FontWeight::UltraLight),
        ("thin", FontWeight::Thin),
        ("light", FontWeight::Light),
        ("regular", FontWeight::Regular),
        ("medium", FontWeight::Medium),
        ("semibold", FontWeight::Semibold),
        ("bold", FontWeight::Bold),
        ("heavy", FontWeight::Heavy),
        ("black", FontWeight::Black),
    ];

    fn parse(value: &str) -> TokenizationResult<FontWeight> {
        FontWeight::CASES
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, weight)| *weight)
            .ok_or_else(|| TokenizationError::UnknownEnumValue {
                value: value.to_string(),
                type_name: "FontWeight".to_string(),
                expected: FontWeight::CASES
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Font {
    System { weight: FontWeight, size: f64 },
    Named { name: String, size: f64 },
}

impl Font {
    /// `:bold@20` (system font with weight), `Helvetica@16` or `@16` (regular system font).
    pub fn parse(value: &str, context: &str) -> TokenizationResult<Font> {
        let invalid = || TokenizationError::InvalidValue {
            value: value.to_string(),
            type_name: "Font".to_string(),
            context: context.to_string(),
        };
        let (family, size) = value.trim().rsplit_once('@').ok_or_else(invalid)?;
        let size = parse_number(size).ok_or_else(invalid)?;

        if family.is_empty() {
            Ok(Font::System {
                weight: FontWeight::Regular,
                size,
            })
        } else if let Some(weight) = family.strip_prefix(':') {
            Ok(Font::System {
                weight: FontWeight::parse(weight)?,
                size,
            })
        } else {
            Ok(Font::Named {
                name: family.to_string(),
                size,
            })
        }
    }
}

/// A span of attributed text with the inline style names wrapping it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedTextRun {
    pub text: String,
    pub styles: Vec<String>,
}

/// Flatten mixed content into runs, outermost style first.
pub(crate) fn attributed_runs(element: &XmlElement) -> Vec<AttributedTextRun> {
    let mut runs = Vec::new();
    collect_runs(element, &mut Vec::new(), &mut runs);
    runs
}

fn collect_runs(element: &XmlElement, styles: &mut Vec<String>, runs: &mut Vec<AttributedTextRun>) {
    push_run(element.text.as_deref(), styles, runs);
    for child in &element.children {
        styles.push(child.name.clone());
        collect_runs(child, styles, runs);
        styles.pop();
        push_run(child.tail.as_deref(), styles, runs);
    }
}

fn push_run(text: Option<&str>, styles: &[String], runs: &mut Vec<AttributedTextRun>) {
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        runs.push(AttributedTextRun {
            text: text.to_string(),
            styles: styles.to_vec(),
        });
    }
}

pub(crate) fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

pub(crate) fn parse_pair(value: &str) -> Option<(f64, f64)> {
    let (first, second) = value.split_once(',')?;
    Some((parse_number(first)?, parse_number(second)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_xml;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(
            Color::parse("#fff"),
            Some(Color::Absolute { red: 255, green: 255, blue: 255, alpha: 255 })
        );
        assert_eq!(
            Color::parse("#10203040"),
            Some(Color::Absolute { red: 16, green: 32, blue: 48, alpha: 64 })
        );
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#gggggg"), None);
    }

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(Color::parse("clear"), Some(Color::Named("clear".to_string())));
        assert_eq!(Color::parse("chartreuse"), None);
    }

    #[test]
    fn test_parse_fonts() {
        assert_eq!(
            Font::parse(":bold@20", "font").unwrap(),
            Font::System { weight: FontWeight::Bold, size: 20.0 }
        );
        assert_eq!(
            Font::parse("Helvetica Neue@14.5", "font").unwrap(),
            Font::Named { name: "Helvetica Neue".to_string(), size: 14.5 }
        );
        assert_eq!(
            Font::parse("@12", "font").unwrap(),
            Font::System { weight: FontWeight::Regular, size: 12.0 }
        );
        assert!(matches!(
            Font::parse(":chunky@12", "font"),
            Err(TokenizationError::UnknownEnumValue { .. })
        ));
        assert!(matches!(
            Font::parse("Helvetica", "font"),
            Err(TokenizationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_attributed_runs() {
        let element = parse_xml("<attributedText>Hi <b>there <i>you</i></b>!</attributedText>").unwrap();
        let runs = attributed_runs(&element);
        let flattened: Vec<(&str, Vec<&str>)> = runs
            .iter()
            .map(|run| (run.text.as_str(), run.styles.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(
            flattened,
            vec![
                ("Hi ", vec![]),
                ("there ", vec!["b"]),
                ("you", vec!["b", "i"]),
                ("!", vec![]),
            ]
        );
    }
}
