//! `layout:*` attribute parsing into constraint descriptions.
//!
//! ```text
//! layout:leading="super inset(16)"
//! layout:below="emailField offset(8)"
//! layout:height=">= 44 @high"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutAnchor {
    Top,
    Bottom,
    Leading,
    Trailing,
    Left,
    Right,
    Width,
    Height,
    CenterX,
    CenterY,
    FirstBaseline,
    LastBaseline,
}

impl LayoutAnchor {
    pub fn parse(value: &str) -> TokenizationResult<LayoutAnchor> {
        match value {
            "top" => Ok(LayoutAnchor::Top),
            "bottom" => Ok(LayoutAnchor::Bottom),
            "leading" => Ok(LayoutAnchor::Leading),
            "trailing" => Ok(LayoutAnchor::Trailing),
            "left" => Ok(LayoutAnchor::Left),
            "right" => Ok(LayoutAnchor::Right),
            "width" => Ok(LayoutAnchor::Width),
            "height" => Ok(LayoutAnchor::Height),
            "centerX" => Ok(LayoutAnchor::CenterX),
            "centerY" => Ok(LayoutAnchor::CenterY),
            "firstBaseline" => Ok(LayoutAnchor::FirstBaseline),
            "lastBaseline" => Ok(LayoutAnchor::LastBaseline),
            other => Err(TokenizationError::UnknownLayoutAnchor {
                anchor: other.to_string(),
            }),
        }
    }

    fn is_dimension(self) -> bool {
        matches!(self, LayoutAnchor::Width | LayoutAnchor::Height)
    }

    /// Anchors on the far side of a view, where insets point inwards
    fn is_trailing_edge(self) -> bool {
        matches!(
            self,
            LayoutAnchor::Trailing | LayoutAnchor::Right | LayoutAnchor::Bottom
        )
    }
}

/// Attribute names accepted after `layout:`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutAttribute {
    Top,
    Bottom,
    Leading,
    Trailing,
    Left,
    Right,
    Width,
    Height,
    CenterX,
    CenterY,
    FirstBaseline,
    LastBaseline,
    Before,
    After,
    Above,
    Below,
    Edges,
    FillHorizontally,
    FillVertically,
    Center,
}

impl LayoutAttribute {
    pub fn parse(value: &str) -> TokenizationResult<LayoutAttribute> {
        let attribute = match value {
            "top" => LayoutAttribute::Top,
            "bottom" => LayoutAttribute::Bottom,
            "leading" => LayoutAttribute::Leading,
            "trailing" => LayoutAttribute::Trailing,
            "left" => LayoutAttribute::Left,
            "right" => LayoutAttribute::Right,
            "width" => LayoutAttribute::Width,
            "height" => LayoutAttribute::Height,
            "centerX" => LayoutAttribute::CenterX,
            "centerY" => LayoutAttribute::CenterY,
            "firstBaseline" => LayoutAttribute::FirstBaseline,
            "lastBaseline" => LayoutAttribute::LastBaseline,
            "before" => LayoutAttribute::Before,
            "after" => LayoutAttribute::After,
            "above" => LayoutAttribute::Above,
            "below" => LayoutAttribute::Below,
            "edges" => LayoutAttribute::Edges,
            "fillHorizontally" => LayoutAttribute::FillHorizontally,
            "fillVertically" => LayoutAttribute::FillVertically,
            "center" => LayoutAttribute::Center,
            other => {
                return Err(TokenizationError::UnknownLayoutAttribute {
                    attribute: other.to_string(),
                })
            }
        };
        Ok(attribute)
    }

    /// `(own anchor, default target anchor)` pairs this attribute expands into
    fn anchor_pairs(self) -> Vec<(LayoutAnchor, LayoutAnchor)> {
        use LayoutAnchor as A;
        let same = |anchor: LayoutAnchor| vec![(anchor, anchor)];
        match self {
            LayoutAttribute::Top => same(A::Top),
            LayoutAttribute::Bottom => same(A::Bottom),
            LayoutAttribute::Leading => same(A::Leading),
            LayoutAttribute::Trailing => same(A::Trailing),
            LayoutAttribute::Left => same(A::Left),
            LayoutAttribute::Right => same(A::Right),
            LayoutAttribute::Width => same(A::Width),
            LayoutAttribute::Height => same(A::Height),
            LayoutAttribute::CenterX => same(A::CenterX),
            LayoutAttribute::CenterY => same(A::CenterY),
            LayoutAttribute::FirstBaseline => same(A::FirstBaseline),
            LayoutAttribute::LastBaseline => same(A::LastBaseline),
            LayoutAttribute::Before => vec![(A::Trailing, A::Leading)],
            LayoutAttribute::After => vec![(A::Leading, A::Trailing)],
            LayoutAttribute::Above => vec![(A::Bottom, A::Top)],
            LayoutAttribute::Below => vec![(A::Top, A::Bottom)],
            LayoutAttribute::Edges => vec![
                (A::Top, A::Top),
                (A::Leading, A::Leading),
                (A::Bottom, A::Bottom),
                (A::Trailing, A::Trailing),
            ],
            LayoutAttribute::FillHorizontally => {
                vec![(A::Leading, A::Leading), (A::Trailing, A::Trailing)]
            }
            LayoutAttribute::FillVertically => vec![(A::Top, A::Top), (A::Bottom, A::Bottom)],
            LayoutAttribute::Center => vec![(A::CenterX, A::CenterX), (A::CenterY, A::CenterY)],
        }
    }

    /// Spacing attributes measure away from the target, so offsets grow in the negative direction
    fn flips_offset(self) -> bool {
        matches!(self, LayoutAttribute::Before | LayoutAttribute::Above)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintRelation {
    Equal,
    LessThanOrEqual,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintTarget {
    Parent,
    This,
    SafeAreaLayoutGuide,
    LayoutMargins,
    Field(String),
}

impl ConstraintTarget {
    fn parse(value: &str) -> ConstraintTarget {
        match value {
            "super" => ConstraintTarget::Parent,
            "self" => ConstraintTarget::This,
            "safeAreaLayoutGuide" => ConstraintTarget::SafeAreaLayoutGuide,
            "layoutMargins" => ConstraintTarget::LayoutMargins,
            id => ConstraintTarget::Field(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintPriority {
    Required,
    High,
    Low,
    Custom(f32),
}

impl ConstraintPriority {
    fn parse(value: &str, raw: &str) -> TokenizationResult<ConstraintPriority> {
        match value {
            "required" => Ok(ConstraintPriority::Required),
            "high" => Ok(ConstraintPriority::High),
            "low" => Ok(ConstraintPriority::Low),
            number => number
                .parse::<f32>()
                .ok()
                .filter(|p| (0.0..=1000.0).contains(p))
                .map(ConstraintPriority::Custom)
                .ok_or_else(|| TokenizationError::InvalidConstraint {
                    value: raw.to_string(),
                    reason: format!("unknown priority '{}'", number),
                }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub anchor: LayoutAnchor,
    pub relation: ConstraintRelation,
    /// `None` for pure dimension constants such as `layout:width="200"`
    pub target: Option<ConstraintTarget>,
    pub target_anchor: LayoutAnchor,
    pub constant: f64,
    pub multiplier: f64,
    pub priority: ConstraintPriority,
}

enum Modifier {
    Offset(f64),
    Inset(f64),
}

/// Parse one `layout:<attribute>="<value>"` pair into its constraints.
pub fn parse_layout_attribute(attribute: &str, value: &str) -> TokenizationResult<Vec<Constraint>> {
    let attribute_kind = LayoutAttribute::parse(attribute)?;
    let invalid = |reason: String| TokenizationError::InvalidConstraint {
        value: value.to_string(),
        reason,
    };

    let mut relation = ConstraintRelation::Equal;
    let mut target: Option<(ConstraintTarget, Option<LayoutAnchor>)> = None;
    let mut constant: Option<f64> = None;
    let mut modifier: Option<Modifier> = None;
    let mut multiplier = 1.0;
    let mut priority = ConstraintPriority::Required;

    for (index, token) in value.split_whitespace().enumerate() {
        let token = match split_relation(token) {
            Some((parsed, rest)) if index == 0 => {
                relation = parsed;
                if rest.is_empty() {
                    continue;
                }
                rest
            }
            Some(_) => return Err(invalid("relation must come first".to_string())),
            None => token,
        };

        if let Some(level) = token.strip_prefix('@') {
            priority = ConstraintPriority::parse(level, value)?;
        } else if let Some(argument) = call_argument(token, "offset") {
            modifier = Some(Modifier::Offset(parse_constant(argument, value)?));
        } else if let Some(argument) = call_argument(token, "inset") {
            modifier = Some(Modifier::Inset(parse_constant(argument, value)?));
        } else if let Some(argument) = call_argument(token, "multiplied") {
            multiplier = parse_constant(argument, value)?;
        } else if let Ok(number) = token.parse::<f64>() {
            if constant.replace(number).is_some() {
                return Err(invalid("more than one constant".to_string()));
            }
        } else if target.is_none() {
            let (name, anchor) = match token.split_once('.') {
                Some((name, anchor)) => (name, Some(LayoutAnchor::parse(anchor)?)),
                None => (token, None),
            };
            target = Some((ConstraintTarget::parse(name), anchor));
        } else {
            return Err(invalid(format!("unexpected token '{}'", token)));
        }
    }

    let mut constraints = Vec::new();
    for (anchor, default_target_anchor) in attribute_kind.anchor_pairs() {
        let (constraint_target, target_anchor) = match &target {
            Some((t, explicit)) => (Some(t.clone()), explicit.unwrap_or(default_target_anchor)),
            None if anchor.is_dimension() && constant.is_some() => (None, anchor),
            None => (Some(ConstraintTarget::Parent), default_target_anchor),
        };

        let base = constant.unwrap_or(0.0);
        let adjusted = match modifier {
            Some(Modifier::Offset(offset)) if attribute_kind.flips_offset() => base - offset,
            Some(Modifier::Offset(offset)) => base + offset,
            Some(Modifier::Inset(inset)) if anchor.is_trailing_edge() => base - inset,
            Some(Modifier::Inset(inset)) => base + inset,
            None => base,
        };

        constraints.push(Constraint {
            anchor,
            relation,
            target: constraint_target,
            target_anchor,
            constant: adjusted,
            multiplier,
            priority,
        });
    }
    Ok(constraints)
}

fn split_relation(token: &str) -> Option<(ConstraintRelation, &str)> {
    for (prefix, relation) in [
        ("<=", ConstraintRelation::LessThanOrEqual),
        (">=", ConstraintRelation::GreaterThanOrEqual),
        ("==", ConstraintRelation::Equal),
        ("=", ConstraintRelation::Equal),
    ] {
        if let Some(rest) = token.strip_prefix(prefix) {
            return Some((relation, rest));
        }
    }
    None
}

fn call_argument<'a>(token: &'a str, name: &str) -> Option<&'a str> {
    token
        .strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_constant(argument: &str, raw: &str) -> TokenizationResult<f64> {
    argument
        .trim()
        .parse::<f64>()
        .map_err(|_| TokenizationError::InvalidConstraint {
            value: raw.to_string(),
            reason: format!("'{}' is not a number", argument),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_inset_from_super() {
        let constraints = parse_layout_attribute("leading", "super inset(16)").unwrap();
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].target, Some(ConstraintTarget::Parent));
        assert_eq!(constraints[0].constant, 16.0);
    }

    #[test]
    fn test_edges_expand_with_inward_insets() {
        let constraints = parse_layout_attribute("edges", "inset(8)").unwrap();
        let constants: Vec<(LayoutAnchor, f64)> =
            constraints.iter().map(|c| (c.anchor, c.constant)).collect();
        assert_eq!(
            constants,
            vec![
                (LayoutAnchor::Top, 8.0),
                (LayoutAnchor::Leading, 8.0),
                (LayoutAnchor::Bottom, -8.0),
                (LayoutAnchor::Trailing, -8.0),
            ]
        );
    }

    #[test]
    fn test_below_field_with_offset() {
        let constraints = parse_layout_attribute("below", "emailField offset(12)").unwrap();
        assert_eq!(constraints[0].anchor, LayoutAnchor::Top);
        assert_eq!(constraints[0].target_anchor, LayoutAnchor::Bottom);
        assert_eq!(
            constraints[0].target,
            Some(ConstraintTarget::Field("emailField".to_string()))
        );
        assert_eq!(constraints[0].constant, 12.0);
    }

    #[test]
    fn test_dimension_constant_with_relation_and_priority() {
        let constraints = parse_layout_attribute("height", ">= 44 @high").unwrap();
        assert_eq!(constraints[0].relation, ConstraintRelation::GreaterThanOrEqual);
        assert_eq!(constraints[0].target, None);
        assert_eq!(constraints[0].constant, 44.0);
        assert_eq!(constraints[0].priority, ConstraintPriority::High);
    }

    #[test]
    fn test_explicit_target_anchor_and_multiplier() {
        let constraints = parse_layout_attribute("width", "super.height multiplied(0.5)").unwrap();
        assert_eq!(constraints[0].target_anchor, LayoutAnchor::Height);
        assert_eq!(constraints[0].multiplier, 0.5);
    }

    #[test]
    fn test_unknown_keywords() {
        assert!(matches!(
            parse_layout_attribute("middle", "super"),
            Err(TokenizationError::UnknownLayoutAttribute { .. })
        ));
        assert!(matches!(
            parse_layout_attribute("top", "super.middle"),
            Err(TokenizationError::UnknownLayoutAnchor { .. })
        ));
        assert!(matches!(
            parse_layout_attribute("top", "super emailField"),
            Err(TokenizationError::InvalidConstraint { .. })
        ));
    }
}
