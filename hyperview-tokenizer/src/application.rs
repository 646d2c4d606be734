//! Application-wide settings, read from a YAML file.
//!
//! ```yaml
//! platform: iOS
//! themes: [light, dark]
//! defaultTheme: light
//! defaultAccessModifier: public
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TokenizationError, TokenizationResult};
use crate::style::AccessModifier;
use crate::types::RuntimePlatform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDescription {
    #[serde(default = "default_platform")]
    pub platform: RuntimePlatform,
    #[serde(default = "default_themes")]
    pub themes: Vec<String>,
    #[serde(default = "default_theme")]
    pub default_theme: String,
    #[serde(default)]
    pub default_access_modifier: AccessModifier,
}

fn default_platform() -> RuntimePlatform {
    RuntimePlatform::IOS
}

fn default_themes() -> Vec<String> {
    vec![default_theme()]
}

fn default_theme() -> String {
    "none".to_string()
}

impl Default for ApplicationDescription {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            themes: default_themes(),
            default_theme: default_theme(),
            default_access_modifier: AccessModifier::default(),
        }
    }
}

impl ApplicationDescription {
    pub fn new(
        platform: RuntimePlatform,
        themes: Vec<String>,
        default_theme: impl Into<String>,
        default_access_modifier: AccessModifier,
    ) -> TokenizationResult<Self> {
        let description = Self {
            platform,
            themes,
            default_theme: default_theme.into(),
            default_access_modifier,
        };
        description.validate()?;
        Ok(description)
    }

    pub fn from_yaml(yaml: &str) -> TokenizationResult<Self> {
        let description: ApplicationDescription = serde_yaml::from_str(yaml)?;
        description.validate()?;
        Ok(description)
    }

    pub fn from_file(path: &Path) -> TokenizationResult<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TokenizationError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> TokenizationResult<()> {
        if !self.themes.contains(&self.default_theme) {
            return Err(TokenizationError::DefaultThemeNotDeclared {
                theme: self.default_theme.clone(),
                themes: self.themes.join(", "),
            });
        }
        Ok(())
    }

    pub fn is_themed(&self) -> bool {
        self.themes.len() > 1 || self.themes.iter().any(|t| t != "none")
    }
}
