//! Parsing of `action:<event>="<binding>"` attribute values.
//!
//! A binding names the component action the event feeds and, optionally, the
//! parameters it passes:
//!
//! ```text
//! action:tap="submit"                              inherit the event's own parameters
//! action:tap="submit(self.text, $email)"           reference and state parameters
//! action:tap="select(index: Int(3), kind: 'x')"    labelled constants
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};

/// One `action:*` attribute on an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBinding {
    /// The element event, e.g. `tap`
    pub event: String,
    /// The component-level action it is routed to
    pub action: String,
    pub parameters: ActionParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionParameters {
    /// No parameter list: forward the event's parameters as-is
    Inherited,
    Explicit(Vec<ActionParameterSpec>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParameterSpec {
    pub label: Option<String>,
    pub value: ParameterValueSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterValueSpec {
    /// `Int(5)`, `'text'` (shorthand for `String('text')`)
    Constant { type_name: String, literal: String },
    /// `$name`
    StateVariable(String),
    /// `id` or `id.property`; `self` is the declaring element
    Reference { target: String, property: Option<String> },
}

impl ActionBinding {
    pub fn parse(event: &str, value: &str) -> TokenizationResult<ActionBinding> {
        let invalid = |reason: &str| TokenizationError::InvalidActionBinding {
            binding: value.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = value.trim();

        let (action, parameters) = match trimmed.find('(') {
            Some(open) => {
                let inner = trimmed[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("missing closing ')'"))?;
                let specs = split_top_level(inner)
                    .map_err(|reason| invalid(&reason))?
                    .into_iter()
                    .map(|part| parse_parameter(part).map_err(|reason| invalid(&reason)))
                    .collect::<TokenizationResult<Vec<_>>>()?;
                (&trimmed[..open], ActionParameters::Explicit(specs))
            }
            None => (trimmed, ActionParameters::Inherited),
        };

        let action = action.trim();
        if !is_identifier(action) {
            return Err(invalid("action name must be an identifier"));
        }

        Ok(ActionBinding {
            event: event.to_string(),
            action: action.to_string(),
            parameters,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Split on commas that are outside quotes and parentheses.
fn split_top_level(input: &str) -> Result<Vec<&str>, String> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (index, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?;
            }
            (None, ',') if depth == 0 => {
                parts.push(input[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated string literal".to_string());
    }
    if depth != 0 {
        return Err("unbalanced '('".to_string());
    }
    parts.push(input[start..].trim());

    if parts.iter().any(|p| p.is_empty()) {
        return Err("empty parameter".to_string());
    }
    Ok(parts)
}

fn parse_parameter(part: &str) -> Result<ActionParameterSpec, String> {
    let (label, value) = match part.split_once(':') {
        Some((label, value)) if is_identifier(label.trim()) && !starts_with_quote(label) => {
            (Some(label.trim().to_string()), value.trim())
        }
        _ => (None, part.trim()),
    };

    Ok(ActionParameterSpec {
        label,
        value: parse_parameter_value(value)?,
    })
}

fn starts_with_quote(s: &str) -> bool {
    s.trim_start().starts_with(['\'', '"'])
}

fn parse_parameter_value(value: &str) -> Result<ParameterValueSpec, String> {
    if let Some(name) = value.strip_prefix('$') {
        if !is_identifier(name) {
            return Err(format!("invalid state name '{}'", name));
        }
        return Ok(ParameterValueSpec::StateVariable(name.to_string()));
    }

    if let Some(literal) = unquote(value) {
        return Ok(ParameterValueSpec::Constant {
            type_name: "String".to_string(),
            literal: literal.to_string(),
        });
    }

    if let Some(open) = value.find('(') {
        let type_name = value[..open].trim();
        let literal = value[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| format!("missing ')' in '{}'", value))?
            .trim();
        let bare = type_name.strip_suffix('?').unwrap_or(type_name);
        if !is_identifier(bare) {
            return Err(format!("invalid type name '{}'", type_name));
        }
        return Ok(ParameterValueSpec::Constant {
            type_name: type_name.to_string(),
            literal: unquote(literal).unwrap_or(literal).to_string(),
        });
    }

    let (target, property) = match value.split_once('.') {
        Some((target, property)) => (target, Some(property)),
        None => (value, None),
    };
    if !is_identifier(target) || property.is_some_and(|p| !is_identifier(p)) {
        return Err(format!("invalid reference '{}'", value));
    }
    Ok(ParameterValueSpec::Reference {
        target: target.to_string(),
        property: property.map(str::to_string),
    })
}

fn unquote(value: &str) -> Option<&str> {
    ['\'', '"'].iter().find_map(|q| {
        value
            .strip_prefix(*q)
            .and_then(|rest| rest.strip_suffix(*q))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherited_binding() {
        let binding = ActionBinding::parse("tap", "submit").unwrap();
        assert_eq!(binding.action, "submit");
        assert_eq!(binding.parameters, ActionParameters::Inherited);
    }

    #[test]
    fn test_explicit_parameters() {
        let binding =
            ActionBinding::parse("tap", "select(self.text, $email, index: Int(3), kind: 'a, b')").unwrap();
        let ActionParameters::Explicit(params) = binding.parameters else {
            panic!("expected explicit parameters");
        };
        assert_eq!(params.len(), 4);
        assert_eq!(
            params[0].value,
            ParameterValueSpec::Reference {
                target: "self".to_string(),
                property: Some("text".to_string())
            }
        );
        assert_eq!(params[1].value, ParameterValueSpec::StateVariable("email".to_string()));
        assert_eq!(params[2].label.as_deref(), Some("index"));
        assert_eq!(
            params[2].value,
            ParameterValueSpec::Constant {
                type_name: "Int".to_string(),
                literal: "3".to_string()
            }
        );
        assert_eq!(
            params[3].value,
            ParameterValueSpec::Constant {
                type_name: "String".to_string(),
                literal: "a, b".to_string()
            }
        );
    }

    #[test]
    fn test_empty_parameter_list() {
        let binding = ActionBinding::parse("tap", "reload()").unwrap();
        assert_eq!(binding.parameters, ActionParameters::Explicit(vec![]));
    }

    #[test]
    fn test_malformed_bindings() {
        for value in ["submit(", "submit(a,,b)", "9lives", "submit('open)", "submit(a.b.c)"] {
            assert!(
                matches!(
                    ActionBinding::parse("tap", value),
                    Err(TokenizationError::InvalidActionBinding { .. })
                ),
                "{} should be rejected",
                value
            );
        }
    }
}
