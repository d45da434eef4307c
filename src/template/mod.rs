// Copyright 2025 Cowboy AI, LLC.

//! Workflow templates: a portable YAML form of a definition
//!
//! A template document is a `---` delimited header carrying a `Name:` key,
//! followed by a YAML body describing the definition's structure. Action
//! titles stand in for ids, so a template can be imported into any
//! installation.

mod exporter;
mod importer;
mod registry;

pub use exporter::TemplateExporter;
pub use importer::{TemplateDocument, TemplateImporter};
pub use registry::ImportedTemplates;

use crate::identifiers::PermissionCode;
use crate::workflow::ActionType;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Body of a template document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowTemplate {
    /// Definition title
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Template format version
    pub version: String,
    /// Version of the source definition
    #[serde(default)]
    pub remote_version: u32,
    /// Position among definitions
    #[serde(default)]
    pub sort_order: u32,
    /// Actions keyed by title, in definition order
    pub structure: IndexMap<String, ActionTemplate>,
}

/// One action in a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActionTemplate {
    /// Action variant
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Outgoing transitions; each entry maps a transition title to its target
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<IndexMap<String, TransitionTarget>>,
}

/// Where a template transition leads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TransitionTarget {
    /// Title of the next action, or `~` to end the workflow
    Next(Option<String>),
    /// A permission-gated transition
    Gated {
        /// Title of the next action, or absent to end the workflow
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
        /// Permission required to take the transition
        permission: PermissionCode,
    },
}

impl TransitionTarget {
    /// Title of the next action
    pub fn next_action(&self) -> Option<&str> {
        match self {
            TransitionTarget::Next(next) | TransitionTarget::Gated { to: next, .. } => {
                next.as_deref()
            }
        }
    }

    /// Permission gating the transition
    pub fn permission(&self) -> Option<&PermissionCode> {
        match self {
            TransitionTarget::Next(_) => None,
            TransitionTarget::Gated { permission, .. } => Some(permission),
        }
    }
}

impl WorkflowTemplate {
    /// Transitions of every action flattened to `(action, transition, target)`
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &str, &TransitionTarget)> {
        self.structure.iter().flat_map(|(action, template)| {
            template.transitions.iter().flat_map(move |entry| {
                entry
                    .iter()
                    .map(move |(title, target)| (action.as_str(), title.as_str(), target))
            })
        })
    }
}

/// JSON schema describing the template body
pub fn template_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(WorkflowTemplate)
}
