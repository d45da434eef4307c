// Copyright 2025 Cowboy AI, LLC.

//! Registry of templates that have been imported

use super::{TemplateImporter, WorkflowTemplate};
use crate::errors::WorkflowResult;
use indexmap::IndexMap;
use tracing::info;

/// Imported templates keyed by header name, in registration order
#[derive(Debug, Clone, Default)]
pub struct ImportedTemplates {
    templates: IndexMap<String, WorkflowTemplate>,
}

impl ImportedTemplates {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, template: WorkflowTemplate) {
        let name = name.into();
        info!(name = %name, template = %template.name, "Registered workflow template");
        self.templates.insert(name, template);
    }

    /// Parse a document and register it under its header name
    pub fn register_source(&mut self, source: &str) -> WorkflowResult<&WorkflowTemplate> {
        let document = TemplateImporter::parse(source)?;
        self.register(document.name.clone(), document.template);
        Ok(&self.templates[&document.name])
    }

    /// All templates, or only the one registered under `name`
    pub fn imported(&self, name: Option<&str>) -> Vec<&WorkflowTemplate> {
        match name {
            Some(name) => self.templates.get(name).into_iter().collect(),
            None => self.templates.values().collect(),
        }
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
