// Copyright 2025 Cowboy AI, LLC.

//! Template import and export scenarios

use cim_approval_workflow::{
    ActionKind, ActionType, DefinitionBuilder, ImportedTemplates, TemplateExporter,
    TemplateImporter, TemplateSettings, WorkflowDefinition, WorkflowError,
};
use pretty_assertions::assert_eq;

const GOOD: &str = r#"---
Name: exportedworkflow
---
name: 'My Workflow 4 20/02/2014 03-12-55'
description: 'Exported from localhost on 20/02/2014 03-12-55 by joe bloggs using approvals 0.1'
version: '0.2'
remote_version: 0
sort_order: 3
structure:
  'Step One':
    type: simple
    transitions:
      - Step One T1: 'Step Two'
  'Step Two':
    type: simple
"#;

const NO_HEADER: &str = r#"name: 'My Workflow 4 20/02/2014 03-12-55'
version: '0.2'
structure:
  'Step One':
    type: simple
    transitions:
      - Step One T1: 'Step Two'
  'Step Two':
    type: simple
"#;

// 'Step One' is missing its colon
const MALFORMED: &str = r#"---
Name: exportedworkflow
---
name: 'My Workflow 4 20/02/2014 03-12-55'
version: '0.2'
structure:
  'Step One'
    type: simple
    transitions:
      - Step One T1: 'Step Two'
  'Step Two':
    type: simple
"#;

fn settings() -> TemplateSettings {
    TemplateSettings {
        format_version: "0.2".to_string(),
        host: "localhost".to_string(),
        application: "approvals 0.1".to_string(),
    }
}

fn definition_with_actions() -> WorkflowDefinition {
    let mut builder = DefinitionBuilder::new("My Workflow 4");
    builder.sort_order(3);
    let one = builder.action("Step One", ActionKind::Simple);
    let two = builder.action("Step Two", ActionKind::Simple);
    let three = builder.action("Step Three", ActionKind::Simple);
    builder.transition(one, "Step One T1", Some(two));
    builder.transition(two, "Step Two T1", Some(three));
    builder.gated_transition(two, "Step Two T2", None, "Permission1");
    builder.build().unwrap()
}

fn line_counts(document: &str) -> (usize, usize) {
    let lines = document.lines().count();
    let blanks = document.lines().filter(|line| line.trim().is_empty()).count();
    (lines, blanks)
}

#[test]
fn test_parse_good_import() {
    let document = TemplateImporter::parse(GOOD).unwrap();

    assert_eq!(document.name, "exportedworkflow");
    assert_eq!(document.template.name, "My Workflow 4 20/02/2014 03-12-55");
    assert_eq!(document.template.sort_order, 3);
    let titles: Vec<_> = document.template.structure.keys().cloned().collect();
    assert_eq!(titles, vec!["Step One", "Step Two"]);
}

#[test]
fn test_parse_without_header() {
    let err = TemplateImporter::parse(NO_HEADER).unwrap_err();

    assert_eq!(err, WorkflowError::MissingTemplateHeader);
    assert_eq!(err.to_string(), "Invalid YAML format.");
}

#[test]
fn test_parse_malformed_yaml() {
    let err = TemplateImporter::parse(MALFORMED).unwrap_err();

    assert!(matches!(err, WorkflowError::TemplateParse { .. }));
    assert_eq!(err.to_string(), "Invalid YAML format. Unable to parse.");
}

#[test]
fn test_import_builds_definition() {
    let definition = TemplateImporter::import(GOOD).unwrap();

    assert_eq!(definition.title, "My Workflow 4 20/02/2014 03-12-55");
    let one = definition.action_by_title("Step One").unwrap();
    let two = definition.action_by_title("Step Two").unwrap();
    assert_eq!(one.transitions.len(), 1);
    assert_eq!(one.transitions[0].next_action, Some(two.id));
    assert!(two.is_terminal());
}

#[test]
fn test_export_with_actions() {
    let exporter = TemplateExporter::new(settings());
    let definition = definition_with_actions();

    let document = exporter.export(&definition, "joe bloggs").unwrap();
    let (lines, blanks) = line_counts(&document);
    assert_eq!(blanks, 0);
    assert!(lines > 10);
    assert!(document.contains("by joe bloggs using approvals 0.1"));

    let reimported = TemplateImporter::parse(&document).unwrap().template;
    assert_eq!(reimported.structure.len(), 3);
    assert_eq!(reimported.structure["Step Two"].transitions.len(), 2);
    assert_eq!(reimported.structure["Step One"].action_type, ActionType::Simple);
}

#[test]
fn test_export_single_action_has_no_blank_lines() {
    let mut builder = DefinitionBuilder::new("Lonely");
    builder.action("Only", ActionKind::Simple);
    let definition = builder.build().unwrap();

    let exporter = TemplateExporter::new(settings());
    let document = exporter.export(&definition, "joe bloggs").unwrap();
    let larger = exporter
        .export(&definition_with_actions(), "joe bloggs")
        .unwrap();

    let (lines, blanks) = line_counts(&document);
    assert_eq!(blanks, 0);
    assert!(lines < line_counts(&larger).0);
    assert!(!document.contains("transitions"));
}

#[test]
fn test_imported_templates_none() {
    let registry = ImportedTemplates::new();
    assert!(registry.imported(None).is_empty());
}

#[test]
fn test_imported_templates_one() {
    let mut registry = ImportedTemplates::new();
    registry.register_source(GOOD).unwrap();

    let found = registry.imported(Some("exportedworkflow"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "My Workflow 4 20/02/2014 03-12-55");
}

#[test]
fn test_imported_templates_many() {
    let mut registry = ImportedTemplates::new();
    registry.register_source(GOOD).unwrap();
    let exported = TemplateExporter::new(settings())
        .export(&definition_with_actions(), "joe bloggs")
        .unwrap();
    registry.register_source(&exported).unwrap();

    assert_eq!(registry.imported(None).len(), 2);
    assert!(registry.imported(Some("missing")).is_empty());
}
