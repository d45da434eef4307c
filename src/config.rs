// Copyright 2025 Cowboy AI, LLC.

//! Engine configuration
//!
//! All settings have defaults, so an empty YAML or JSON document yields a
//! working configuration.

use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::PermissionCode;
use serde::{Deserialize, Serialize};

/// Configuration for the workflow engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Permission codes that act as an administrative override.
    /// Holding any one of them is sufficient.
    #[serde(default = "default_override_permissions")]
    pub override_permissions: Vec<PermissionCode>,
    /// Permission codes that allow viewing every instance without
    /// granting transition rights
    #[serde(default = "default_view_permissions")]
    pub view_permissions: Vec<PermissionCode>,
    /// Whether listing and firing transitions requires the override or an
    /// assignment on the instance. View-only permissions never satisfy it.
    #[serde(default = "default_true")]
    pub require_assignment_to_transition: bool,
    /// Template export settings
    #[serde(default)]
    pub template: TemplateSettings,
}

/// Settings written into exported template headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    /// Template format version
    #[serde(default = "default_format_version")]
    pub format_version: String,
    /// Host name recorded as the export origin
    #[serde(default = "default_host")]
    pub host: String,
    /// Application name recorded in the export description
    #[serde(default = "default_application")]
    pub application: String,
}

fn default_override_permissions() -> Vec<PermissionCode> {
    vec![PermissionCode::new("ADMIN")]
}

fn default_view_permissions() -> Vec<PermissionCode> {
    vec![PermissionCode::new("VIEW_ACTIVE_WORKFLOWS")]
}

fn default_true() -> bool {
    true
}

fn default_format_version() -> String {
    "0.2".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_application() -> String {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            override_permissions: default_override_permissions(),
            view_permissions: default_view_permissions(),
            require_assignment_to_transition: default_true(),
            template: TemplateSettings::default(),
        }
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            format_version: default_format_version(),
            host: default_host(),
            application: default_application(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration from YAML
    pub fn from_yaml_str(source: &str) -> WorkflowResult<Self> {
        let config: Self = serde_yaml::from_str(source)
            .map_err(|e| WorkflowError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from JSON
    pub fn from_json_str(source: &str) -> WorkflowResult<Self> {
        let config: Self = serde_json::from_str(source)
            .map_err(|e| WorkflowError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for unusable values
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.override_permissions.is_empty() {
            return Err(WorkflowError::Configuration(
                "at least one override permission is required".to_string(),
            ));
        }
        let blank = self
            .override_permissions
            .iter()
            .chain(self.view_permissions.iter())
            .any(PermissionCode::is_blank);
        if blank {
            return Err(WorkflowError::Configuration(
                "permission codes must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `code` is one of the configured override permissions
    pub fn is_override_code(&self, code: &PermissionCode) -> bool {
        self.override_permissions.contains(code)
    }

    /// Whether `code` grants view access to every instance
    pub fn is_view_code(&self, code: &PermissionCode) -> bool {
        self.view_permissions.contains(code)
    }
}
