//! External-schema alignment validation and the
//! label-language checks run in `validate` mode.
//!
//! The schema side is reduced to the set of qualified names an XSD
//! declares: its target namespace joined with every `name` attribute.
//! Unresolved alignments never fail the run — they are expected during
//! ontology evolution — but the unresolved count is the headline signal
//! of schema drift.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use oxigraph::model::vocab::rdfs;
use oxigraph::model::{Literal, TermRef};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;

use crate::error::TransformError;
use crate::graph::{OntologyDocument, PrefixMap};
use crate::rows::{Row, RowKind};
use crate::vocab::{ALIGNMENT_NONE, skos};

/// Cap on example lists in reports.
const SAMPLE_LIMIT: usize = 10;

fn sample(values: impl IntoIterator<Item = String>) -> Vec<String> {
    values.into_iter().take(SAMPLE_LIMIT).collect()
}

// =============================================================================
// Schema term set
// =============================================================================

/// The qualified names declared by the external XML Schema.
#[derive(Debug, Clone)]
pub struct SchemaTerms {
    pub target_namespace: String,
    terms: BTreeSet<String>,
}

impl SchemaTerms {
    /// Parse an XSD: the target namespace plus every element `name`
    /// attribute becomes one qualified name.
    pub fn from_xsd_str(content: &str, origin: &str) -> Result<Self, TransformError> {
        let parse_error = |message: String| TransformError::Parse {
            path: origin.to_string(),
            message,
        };

        let mut reader = Reader::from_str(content);
        let mut target_namespace: Option<String> = None;
        let mut names: Vec<String> = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    for attribute in e.attributes() {
                        let attribute = attribute.map_err(|e| parse_error(e.to_string()))?;
                        match attribute.key.as_ref() {
                            b"targetNamespace" if target_namespace.is_none() => {
                                target_namespace =
                                    Some(String::from_utf8_lossy(&attribute.value).trim().to_string());
                            }
                            b"name" => {
                                names.push(String::from_utf8_lossy(&attribute.value).to_string());
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(parse_error(e.to_string())),
            }
        }

        let target_namespace = target_namespace
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| parse_error("schema has no targetNamespace".to_string()))?;
        let base = if target_namespace.ends_with(['/', '#']) {
            target_namespace.clone()
        } else {
            format!("{target_namespace}/")
        };
        let terms = names.into_iter().map(|name| format!("{base}{name}")).collect();
        Ok(Self {
            target_namespace,
            terms,
        })
    }

    pub fn from_xsd_file(path: &Path) -> Result<Self, TransformError> {
        let content = fs::read_to_string(path).map_err(|source| TransformError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_xsd_str(&content, &path.display().to_string())
    }

    pub fn contains(&self, iri: &str) -> bool {
        self.terms.contains(iri)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }
}

// =============================================================================
// Alignment report
// =============================================================================

/// One checked alignment.
#[derive(Debug, Clone, Serialize)]
pub struct AlignmentRecord {
    pub source: String,
    pub target: String,
    pub entity_type: String,
    pub resolved: bool,
}

/// Per-entity-type coverage counts.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TypeCoverage {
    pub total: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentReport {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Alignment targets absent from the schema (sampled).
    pub unresolved_examples: Vec<String>,
    /// Schema names no ontology term aligns to.
    pub schema_without_alignment: usize,
    pub schema_without_examples: Vec<String>,
    pub per_type: BTreeMap<String, TypeCoverage>,
    pub records: Vec<AlignmentRecord>,
}

/// Check every `dccx_alignment` cell (minus the `none` sentinel) against
/// the schema's qualified names.
pub fn validate_alignments(
    rows: &[Row],
    prefixes: &PrefixMap,
    schema: &SchemaTerms,
) -> AlignmentReport {
    let mut records = Vec::new();
    for row in rows {
        if row.kind() != Ok(RowKind::Base)
            || row.dccx_alignment.is_empty()
            || row.dccx_alignment == ALIGNMENT_NONE
        {
            continue;
        }
        let target = prefixes
            .expand(&row.dccx_alignment)
            .unwrap_or_else(|| row.dccx_alignment.clone());
        let resolved = schema.contains(&target);
        records.push(AlignmentRecord {
            source: row.id.clone(),
            target,
            entity_type: row.entity_type.clone(),
            resolved,
        });
    }

    let mut per_type: BTreeMap<String, TypeCoverage> = BTreeMap::new();
    for record in &records {
        let coverage = per_type.entry(record.entity_type.clone()).or_default();
        coverage.total += 1;
        if record.resolved {
            coverage.resolved += 1;
        }
    }

    let targets: BTreeSet<&str> = records.iter().map(|r| r.target.as_str()).collect();
    let unresolved_targets: BTreeSet<String> = records
        .iter()
        .filter(|r| !r.resolved)
        .map(|r| r.target.clone())
        .collect();
    let schema_without: Vec<String> = schema
        .iter()
        .filter(|term| !targets.contains(term))
        .map(str::to_string)
        .collect();

    let resolved = records.iter().filter(|r| r.resolved).count();
    AlignmentReport {
        total: records.len(),
        resolved,
        unresolved: records.len() - resolved,
        unresolved_examples: sample(unresolved_targets),
        schema_without_alignment: schema_without.len(),
        schema_without_examples: sample(schema_without),
        per_type,
        records,
    }
}

// =============================================================================
// Label-language report
// =============================================================================

/// Label hygiene checks for `validate` mode: every term should carry an
/// English preferred label.
#[derive(Debug, Clone, Serialize)]
pub struct LabelLanguageReport {
    pub entities_with_labels: usize,
    pub missing_english: Vec<String>,
    pub non_english_preferred: Vec<String>,
}

pub fn label_language_report(doc: &OntologyDocument) -> LabelLanguageReport {
    let mut with_labels: BTreeMap<String, Vec<Literal>> = BTreeMap::new();
    for predicate in [skos::PREF_LABEL, rdfs::LABEL] {
        for triple in doc.graph.iter() {
            if triple.predicate != predicate {
                continue;
            }
            let TermRef::Literal(literal) = triple.object else {
                continue;
            };
            with_labels
                .entry(triple.subject.to_string())
                .or_default()
                .push(literal.into_owned());
        }
    }

    let mut missing_english = Vec::new();
    let mut non_english_preferred = Vec::new();
    for (subject, literals) in &with_labels {
        let display = match subject.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            Some(iri) => doc.prefixes.compact(iri),
            None => subject.clone(),
        };
        if !literals.iter().any(|l| l.language() == Some("en")) {
            missing_english.push(display.clone());
        }
        if literals
            .iter()
            .any(|l| l.language().is_some_and(|lang| lang != "en"))
        {
            non_english_preferred.push(display);
        }
    }

    LabelLanguageReport {
        entities_with_labels: with_labels.len(),
        missing_english: sample(missing_english),
        non_english_preferred: sample(non_english_preferred),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::load_turtle_str;

    const XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="https://ptb.de/dcc"
           elementFormDefault="qualified">
  <xs:element name="Sensor" type="xs:string"/>
  <xs:element name="observes"/>
  <xs:complexType name="Observation"/>
</xs:schema>
"#;

    #[test]
    fn xsd_names_become_qualified_terms() {
        let schema = SchemaTerms::from_xsd_str(XSD, "inline").unwrap();
        assert_eq!(schema.target_namespace, "https://ptb.de/dcc");
        assert!(schema.contains("https://ptb.de/dcc/Sensor"));
        assert!(schema.contains("https://ptb.de/dcc/observes"));
        assert!(schema.contains("https://ptb.de/dcc/Observation"));
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn missing_target_namespace_is_an_error() {
        let err = SchemaTerms::from_xsd_str("<schema/>", "inline").unwrap_err();
        assert!(matches!(err, TransformError::Parse { .. }));
    }

    fn aligned_row(id: &str, entity_type: &str, alignment: &str) -> Row {
        Row {
            id: id.to_string(),
            entity_type: entity_type.to_string(),
            dccx_alignment: alignment.to_string(),
            ..Row::default()
        }
    }

    #[test]
    fn resolution_counts_resolved_and_unresolved() {
        let schema = SchemaTerms::from_xsd_str(XSD, "inline").unwrap();
        let prefixes = PrefixMap::preferred();
        let rows = vec![
            aligned_row("dcc:Sensor", "Class", "dccx:Sensor"),
            aligned_row("dcc:observes", "ObjectProperty", "dccx:observes"),
            aligned_row("dcc:Unknown", "Class", "dccx:Unknown"),
            aligned_row("dcc:Unaligned", "Class", "none"),
        ];
        let report = validate_alignments(&rows, &prefixes, &schema);
        assert_eq!(report.total, 3);
        assert_eq!(report.resolved, 2);
        assert_eq!(report.unresolved, 1);
        assert_eq!(report.unresolved_examples, vec!["https://ptb.de/dcc/Unknown"]);
        assert_eq!(report.schema_without_alignment, 1);
        assert_eq!(report.per_type["Class"].total, 2);
        assert_eq!(report.per_type["Class"].resolved, 1);
        assert_eq!(report.per_type["ObjectProperty"].resolved, 1);
    }

    #[test]
    fn label_report_flags_missing_english() {
        let doc = load_turtle_str(
            r#"
@prefix dcc: <https://ptb.de/dcc/ont/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
dcc:Sensor a owl:Class ; skos:prefLabel "Sensor"@en , "Messaufnehmer"@de .
dcc:Observation a owl:Class ; skos:prefLabel "Messung"@de .
"#,
            "inline",
        )
        .unwrap();
        let report = label_language_report(&doc);
        assert_eq!(report.entities_with_labels, 2);
        assert_eq!(report.missing_english, vec!["dcc:Observation"]);
        assert_eq!(
            report.non_english_preferred,
            vec!["dcc:Observation", "dcc:Sensor"]
        );
    }
}
