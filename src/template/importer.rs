// Copyright 2025 Cowboy AI, LLC.

//! Template parsing and materialization

use super::WorkflowTemplate;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::workflow::{ActionKind, ActionType, Assignees, DefinitionBuilder, WorkflowDefinition};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

const HEADER_DELIMITER: &str = "---";

/// A parsed template document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    /// Value of the header's `Name:` key
    pub name: String,
    /// Template body
    pub template: WorkflowTemplate,
}

#[derive(Deserialize)]
struct Header {
    #[serde(rename = "Name")]
    name: String,
}

/// Reads template documents and turns them into definitions
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateImporter;

impl TemplateImporter {
    /// Parse a template document
    ///
    /// A document without a `---` header block carrying `Name:` is rejected
    /// with [`WorkflowError::MissingTemplateHeader`]; YAML that cannot be
    /// read fails with [`WorkflowError::TemplateParse`].
    pub fn parse(source: &str) -> WorkflowResult<TemplateDocument> {
        let (header, body) = split_header(source).ok_or(WorkflowError::MissingTemplateHeader)?;

        let header: Header = serde_yaml::from_str(header).map_err(unparseable)?;
        let template: WorkflowTemplate = serde_yaml::from_str(body).map_err(unparseable)?;
        if template.structure.is_empty() {
            return Err(WorkflowError::TemplateParse {
                detail: format!("template '{}' has no actions", template.name),
            });
        }

        debug!(
            header = %header.name,
            template = %template.name,
            actions = template.structure.len(),
            "Parsed workflow template"
        );

        Ok(TemplateDocument {
            name: header.name,
            template,
        })
    }

    /// Build a validated definition from a template
    ///
    /// Assignment actions come in with no assignees.
    pub fn materialize(template: &WorkflowTemplate) -> WorkflowResult<WorkflowDefinition> {
        let mut builder = DefinitionBuilder::new(template.name.clone());
        builder
            .sort_order(template.sort_order)
            .remote_version(template.remote_version);
        if let Some(description) = &template.description {
            builder.description(description.clone());
        }

        let mut ids = HashMap::new();
        for (title, action) in &template.structure {
            let kind = match action.action_type {
                ActionType::Simple => ActionKind::Simple,
                ActionType::AssignUsers => ActionKind::assign(Assignees::new()),
            };
            ids.insert(title.as_str(), builder.action(title.clone(), kind));
        }

        for (action, title, target) in template.transitions() {
            let from = ids[action];
            let to = match target.next_action() {
                Some(next) => Some(*ids.get(next).ok_or_else(|| {
                    WorkflowError::InvalidDefinition(format!(
                        "transition '{title}' points to unknown action '{next}'"
                    ))
                })?),
                None => None,
            };
            match target.permission() {
                Some(permission) => {
                    builder.gated_transition(from, title, to, permission.clone());
                }
                None => {
                    builder.transition(from, title, to);
                }
            }
        }

        let definition = builder.build()?;
        info!(
            definition_id = %definition.id,
            title = %definition.title,
            actions = definition.actions.len(),
            "Imported workflow template"
        );
        Ok(definition)
    }

    /// Parse a document and build its definition
    pub fn import(source: &str) -> WorkflowResult<WorkflowDefinition> {
        let document = Self::parse(source)?;
        Self::materialize(&document.template)
    }
}

fn unparseable(err: serde_yaml::Error) -> WorkflowError {
    WorkflowError::TemplateParse {
        detail: err.to_string(),
    }
}

/// Split a document into its header block and body
fn split_header(source: &str) -> Option<(&str, &str)> {
    let rest = source.trim_start();
    let rest = rest.strip_prefix(HEADER_DELIMITER)?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == HEADER_DELIMITER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return header
                .lines()
                .any(|l| l.trim_start().starts_with("Name:"))
                .then_some((header, body));
        }
        offset += line.len();
    }
    None
}
