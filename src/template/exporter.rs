// Copyright 2025 Cowboy AI, LLC.

//! Template export

use super::{ActionTemplate, TransitionTarget, WorkflowTemplate};
use crate::config::TemplateSettings;
use crate::errors::WorkflowResult;
use crate::workflow::{ActionGraph, WorkflowDefinition};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::info;

/// Writes definitions out as template documents
#[derive(Debug, Clone)]
pub struct TemplateExporter {
    settings: TemplateSettings,
}

impl TemplateExporter {
    /// Create an exporter
    pub fn new(settings: TemplateSettings) -> Self {
        Self { settings }
    }

    /// Export settings
    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    /// Render `definition` as a template document exported by `exported_by`
    pub fn export(&self, definition: &WorkflowDefinition, exported_by: &str) -> WorkflowResult<String> {
        self.export_at(definition, exported_by, Utc::now())
    }

    /// Render `definition` with an explicit export time
    pub fn export_at(
        &self,
        definition: &WorkflowDefinition,
        exported_by: &str,
        at: DateTime<Utc>,
    ) -> WorkflowResult<String> {
        let template = self.template_for(definition, exported_by, at);
        let body = serde_yaml::to_string(&template)?;

        let mut document = format!("---\nName: {}\n---\n", header_name(&definition.title));
        document.push_str(body.trim_start_matches("---\n"));

        info!(
            definition_id = %definition.id,
            actions = definition.actions.len(),
            exported_by,
            "Exported workflow template"
        );
        Ok(document)
    }

    /// Build the template body for `definition`
    pub fn template_for(
        &self,
        definition: &WorkflowDefinition,
        exported_by: &str,
        at: DateTime<Utc>,
    ) -> WorkflowTemplate {
        let structure = definition
            .actions
            .iter()
            .map(|action| {
                let transitions = action
                    .transitions
                    .iter()
                    .map(|transition| {
                        let to = transition
                            .next_action
                            .and_then(|next| definition.action(&next))
                            .map(|next| next.title.clone());
                        let target = match &transition.required_permission {
                            Some(permission) => TransitionTarget::Gated {
                                to,
                                permission: permission.clone(),
                            },
                            None => TransitionTarget::Next(to),
                        };
                        IndexMap::from([(transition.title.clone(), target)])
                    })
                    .collect();
                let template = ActionTemplate {
                    action_type: action.kind.action_type(),
                    transitions,
                };
                (action.title.clone(), template)
            })
            .collect();

        WorkflowTemplate {
            name: format!("{} {}", definition.title, at.format("%d/%m/%Y %H-%M-%S")),
            description: Some(format!(
                "Exported from {} on {} by {} using {}",
                self.settings.host,
                at.format("%d/%m/%Y %H:%M:%S"),
                exported_by,
                self.settings.application
            )),
            version: self.settings.format_version.clone(),
            remote_version: definition.remote_version,
            sort_order: definition.sort_order,
            structure,
        }
    }
}

impl Default for TemplateExporter {
    fn default() -> Self {
        Self::new(TemplateSettings::default())
    }
}

/// Header name derived from a title: lowercase alphanumerics only
fn header_name(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if name.is_empty() {
        "exportedworkflow".to_string()
    } else {
        name
    }
}
