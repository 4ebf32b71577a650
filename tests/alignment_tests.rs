//! Alignment validation against an external schema, end to end.

use dcc_tabular::alignment::{SchemaTerms, validate_alignments};
use dcc_tabular::config::{CommandPlan, RunConfig};
use dcc_tabular::graph::PrefixMap;
use dcc_tabular::rows::Row;

const SCHEMA_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="https://ptb.de/dcc"
           elementFormDefault="qualified">
  <xs:element name="Sensor"/>
  <xs:element name="observes"/>
</xs:schema>
"#;

const ONTOLOGY_TTL: &str = r#"
@prefix dcc: <https://ptb.de/dcc/ont/> .
@prefix dccx: <https://ptb.de/dcc/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .

dcc:Sensor a owl:Class ;
    skos:prefLabel "Sensor"@en ;
    skos:exactMatch dccx:Sensor .

dcc:observes a owl:ObjectProperty ;
    skos:prefLabel "observes"@en ;
    skos:exactMatch dccx:observes .

dcc:Mystery a owl:Class ;
    skos:prefLabel "Mystery"@en ;
    skos:exactMatch dccx:Unknown .
"#;

fn aligned_row(id: &str, entity_type: &str, alignment: &str) -> Row {
    Row {
        id: id.to_string(),
        entity_type: entity_type.to_string(),
        dccx_alignment: alignment.to_string(),
        ..Row::default()
    }
}

#[test]
fn two_resolved_one_unresolved() {
    let schema = SchemaTerms::from_xsd_str(SCHEMA_XSD, "inline").unwrap();
    let rows = vec![
        aligned_row("dcc:Sensor", "Class", "dccx:Sensor"),
        aligned_row("dcc:observes", "ObjectProperty", "dccx:observes"),
        aligned_row("dcc:Mystery", "Class", "dccx:Unknown"),
    ];
    let report = validate_alignments(&rows, &PrefixMap::preferred(), &schema);
    assert_eq!(report.total, 3);
    assert_eq!(report.resolved, 2);
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.unresolved_examples, vec!["https://ptb.de/dcc/Unknown"]);
}

#[test]
fn sentinel_rows_are_excluded() {
    let schema = SchemaTerms::from_xsd_str(SCHEMA_XSD, "inline").unwrap();
    let rows = vec![
        aligned_row("dcc:Sensor", "Class", "none"),
        aligned_row("dcc:observes", "ObjectProperty", "dccx:observes"),
    ];
    let report = validate_alignments(&rows, &PrefixMap::preferred(), &schema);
    assert_eq!(report.total, 1);
    assert_eq!(report.resolved, 1);
    assert_eq!(report.unresolved, 0);
}

#[test]
fn export_mode_reports_alignment_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ontology.ttl");
    let output = dir.path().join("ontology.csv");
    let schema = dir.path().join("dcc.xsd");
    std::fs::write(&input, ONTOLOGY_TTL).unwrap();
    std::fs::write(&schema, SCHEMA_XSD).unwrap();

    let config = RunConfig {
        command: CommandPlan::Export {
            input_ttl: input,
            output_csv: output.clone(),
        },
        schema_xsd: Some(schema),
        json: false,
    };
    let summary = dcc_tabular::run(&config).unwrap();
    assert!(!summary.has_defects(), "{:?}", summary.defects);
    assert_eq!(summary.entities, 3);

    let alignment = summary.alignment.as_ref().unwrap();
    assert_eq!(alignment.total, 3);
    assert_eq!(alignment.resolved, 2);
    assert_eq!(alignment.unresolved, 1);
    // The unresolved count is a signal, not a defect: exit status stays
    // clean.
    assert!(!summary.has_defects());

    // The CSV landed with one base row per entity.
    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 4);
}

#[test]
fn validate_mode_runs_label_checks() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ontology.ttl");
    std::fs::write(&input, ONTOLOGY_TTL).unwrap();

    let config = RunConfig {
        command: CommandPlan::Validate {
            input_ttl: input,
        },
        schema_xsd: None,
        json: false,
    };
    let summary = dcc_tabular::run(&config).unwrap();
    assert_eq!(summary.mode, "validate");
    let labels = summary.labels.as_ref().unwrap();
    assert_eq!(labels.entities_with_labels, 3);
    assert!(labels.missing_english.is_empty());
    assert!(summary.alignment.is_none());
}
