//! Import-side invariant enforcement and partial-failure isolation.

use dcc_tabular::delimited::{read_rows, write_rows};
use dcc_tabular::error::DefectKind;
use dcc_tabular::graph::PrefixMap;
use dcc_tabular::reconstruct::reconstruct;
use dcc_tabular::rows::Row;

fn base_row(id: &str, entity_type: &str) -> Row {
    Row {
        id: id.to_string(),
        entity_type: entity_type.to_string(),
        dccx_alignment: "none".to_string(),
        ..Row::default()
    }
}

/// Run rows through the CSV layer and back before reconstructing, the
/// way a real import does.
fn import(rows: &[Row]) -> dcc_tabular::Reconstruction {
    let bytes = write_rows(rows);
    let reread = read_rows(std::str::from_utf8(&bytes).unwrap()).unwrap();
    assert_eq!(reread, rows);
    reconstruct(&reread, &PrefixMap::preferred()).unwrap()
}

#[test]
fn deprecated_requires_replaced_by() {
    let mut row = base_row("dcc:Old", "Class");
    row.status = "deprecated".to_string();
    let reconstruction = import(&[row]);
    assert_eq!(reconstruction.skipped, 1);
    assert_eq!(reconstruction.defects.len(), 1);
    let defect = &reconstruction.defects[0];
    assert_eq!(defect.kind, DefectKind::InvalidRow);
    assert_eq!(defect.row, Some(1));
    assert!(defect.reason.contains("replaced_by"));
}

#[test]
fn restriction_rows_require_all_three_fields() {
    for missing in ["on_property", "restriction_type", "restriction_filler"] {
        let base = base_row("dcc:Sensor", "Class");
        let mut restriction = Row {
            id: "dcc:Sensor".to_string(),
            entity_type: "Class".to_string(),
            on_property: "dcc:observes".to_string(),
            restriction_type: "some".to_string(),
            restriction_filler: "dcc:Observation".to_string(),
            ..Row::default()
        };
        match missing {
            "on_property" => restriction.on_property.clear(),
            "restriction_type" => restriction.restriction_type.clear(),
            _ => restriction.restriction_filler.clear(),
        }
        let reconstruction = import(&[base, restriction]);
        assert_eq!(reconstruction.skipped, 1, "missing {missing}");
        assert_eq!(reconstruction.defects[0].kind, DefectKind::InvalidRow);
        assert_eq!(reconstruction.defects[0].row, Some(2));
    }
}

#[test]
fn max_restriction_without_cardinality_is_rejected() {
    let base = base_row("dcc:Sensor", "Class");
    let restriction = Row {
        id: "dcc:Sensor".to_string(),
        entity_type: "Class".to_string(),
        on_property: "dcc:observes".to_string(),
        restriction_type: "max".to_string(),
        restriction_filler: "dcc:Observation".to_string(),
        ..Row::default()
    };
    let reconstruction = import(&[base, restriction]);
    assert_eq!(reconstruction.skipped, 1);
    assert!(reconstruction.defects[0].reason.contains("cardinality_value"));
}

#[test]
fn cardinality_on_universal_restriction_is_rejected() {
    let base = base_row("dcc:Sensor", "Class");
    let restriction = Row {
        id: "dcc:Sensor".to_string(),
        entity_type: "Class".to_string(),
        on_property: "dcc:observes".to_string(),
        restriction_type: "only".to_string(),
        restriction_filler: "dcc:Observation".to_string(),
        cardinality_value: "3".to_string(),
        ..Row::default()
    };
    let reconstruction = import(&[base, restriction]);
    assert_eq!(reconstruction.skipped, 1);
    assert!(reconstruction.defects[0].reason.contains("forbidden"));
}

#[test]
fn mixed_axiom_columns_are_rejected() {
    let base = base_row("dcc:Sensor", "Class");
    let mixed = Row {
        id: "dcc:Sensor".to_string(),
        entity_type: "Class".to_string(),
        on_property: "dcc:observes".to_string(),
        restriction_type: "some".to_string(),
        restriction_filler: "dcc:Observation".to_string(),
        annotation_predicate: "rdfs:seeAlso".to_string(),
        annotation_value: "dcc:Observation".to_string(),
        ..Row::default()
    };
    let reconstruction = import(&[base, mixed]);
    assert_eq!(reconstruction.skipped, 1);
    assert!(reconstruction.defects[0].reason.contains("mixes"));
}

#[test]
fn ten_good_entities_survive_one_bad_one() {
    let mut rows = Vec::new();
    for i in 0..10 {
        let mut row = base_row(&format!("dcc:Good{i}"), "Class");
        row.label = format!("Good {i}@en");
        rows.push(row);
    }
    let mut bad = base_row("dcc:Bad", "Class");
    bad.status = "deprecated".to_string();
    rows.push(bad);

    let reconstruction = import(&rows);
    assert_eq!(reconstruction.entities, 11);
    assert_eq!(reconstruction.skipped, 1);
    assert_eq!(reconstruction.defects.len(), 1);
    assert_eq!(reconstruction.defects[0].entity, "dcc:Bad");

    // Each good class contributed rdf:type + skos:prefLabel.
    assert_eq!(reconstruction.graph.len(), 20);
}

#[test]
fn unknown_entity_type_cell_is_rejected() {
    let row = base_row("dcc:Sensor", "Klass");
    let reconstruction = import(&[row]);
    assert_eq!(reconstruction.skipped, 1);
    assert!(reconstruction.defects[0].reason.contains("entity_type"));
}

#[test]
fn unresolvable_identifier_is_rejected() {
    let row = base_row("unknownprefix:Sensor", "Class");
    let reconstruction = import(&[row]);
    assert_eq!(reconstruction.skipped, 1);
    assert!(reconstruction.defects[0].reason.contains("resolvable"));
}
