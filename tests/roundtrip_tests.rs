//! Round-trip properties over the three-entity sensor scenario: exact
//! row counts, triple isomorphism up to blank-node relabeling, and
//! byte-identical repeated export.

use dcc_tabular::config::{CommandPlan, RunConfig};
use dcc_tabular::delimited::{read_rows, write_rows};
use dcc_tabular::graph::{PrefixMap, load_turtle_str};
use dcc_tabular::pipeline::export_rows;
use dcc_tabular::reconstruct::reconstruct;
use dcc_tabular::roundtrip::diff_graphs;

const SCENARIO_TTL: &str = r#"
@prefix dcc: <https://ptb.de/dcc/ont/> .
@prefix dccx: <https://ptb.de/dcc/> .
@prefix sosa: <http://www.w3.org/ns/sosa/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .

dcc:Sensor a owl:Class ;
    skos:prefLabel "Sensor"@en ;
    skos:exactMatch dccx:Sensor ;
    rdfs:subClassOf sosa:Sensor ,
        [ a owl:Restriction ; owl:onProperty dcc:observes ; owl:someValuesFrom dcc:Observation ] .

dcc:observes a owl:ObjectProperty , owl:FunctionalProperty ;
    skos:prefLabel "observes"@en ;
    skos:exactMatch dccx:observes ;
    rdfs:domain dcc:Sensor ;
    rdfs:range dcc:Observation .

dcc:Observation a owl:Class ;
    skos:prefLabel "Observation"@en ;
    skos:exactMatch dccx:Observation ;
    rdfs:subClassOf sosa:Observation ,
        [ a owl:Restriction ; owl:onProperty dcc:observedBy ; owl:allValuesFrom dcc:Sensor ] .
"#;

#[test]
fn scenario_exports_exactly_five_rows() {
    let doc = load_turtle_str(SCENARIO_TTL, "scenario").unwrap();
    let (rows, defects, entities) = export_rows(&doc);
    assert!(defects.is_empty(), "defects: {defects:?}");
    assert_eq!(entities, 3);
    assert_eq!(rows.len(), 5);

    // Entities in identifier order, base row before restriction rows.
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "dcc:Observation",
            "dcc:Observation",
            "dcc:Sensor",
            "dcc:Sensor",
            "dcc:observes"
        ]
    );

    let observation = &rows[0];
    assert_eq!(observation.entity_type, "Class");
    assert_eq!(observation.label, "Observation@en");
    assert_eq!(observation.dccx_alignment, "dccx:Observation");
    assert_eq!(observation.subclass_of, "http://www.w3.org/ns/sosa/Observation");

    let observation_restriction = &rows[1];
    assert_eq!(observation_restriction.on_property, "dcc:observedBy");
    assert_eq!(observation_restriction.restriction_type, "only");
    assert_eq!(observation_restriction.restriction_filler, "dcc:Sensor");
    assert!(observation_restriction.cardinality_value.is_empty());
    assert!(observation_restriction.label.is_empty());

    let sensor_restriction = &rows[3];
    assert_eq!(sensor_restriction.on_property, "dcc:observes");
    assert_eq!(sensor_restriction.restriction_type, "some");
    assert_eq!(sensor_restriction.restriction_filler, "dcc:Observation");

    let observes = &rows[4];
    assert_eq!(observes.entity_type, "ObjectProperty");
    assert_eq!(observes.property_characteristic, "functional");
    assert_eq!(observes.property_domain, "dcc:Sensor");
    assert_eq!(observes.property_range, "dcc:Observation");
    assert_eq!(observes.dccx_alignment, "dccx:observes");
}

#[test]
fn roundtrip_is_isomorphic_up_to_blank_nodes() {
    let doc = load_turtle_str(SCENARIO_TTL, "scenario").unwrap();
    let (rows, defects, _) = export_rows(&doc);
    assert!(defects.is_empty());

    // Through the CSV layer, not just the in-memory rows.
    let bytes = write_rows(&rows);
    let reread = read_rows(std::str::from_utf8(&bytes).unwrap()).unwrap();
    assert_eq!(reread, rows);

    let reconstruction = reconstruct(&reread, &PrefixMap::preferred()).unwrap();
    assert!(reconstruction.defects.is_empty(), "{:?}", reconstruction.defects);
    assert_eq!(reconstruction.graph.len(), doc.graph.len());

    let (lost, invented) = diff_graphs(&doc.graph, &reconstruction.graph);
    assert!(lost.is_empty(), "lost: {lost:?}");
    assert!(invented.is_empty(), "invented: {invented:?}");
}

#[test]
fn repeated_export_is_byte_identical() {
    let doc = load_turtle_str(SCENARIO_TTL, "scenario").unwrap();
    let (first_rows, _, _) = export_rows(&doc);
    let first = write_rows(&first_rows);

    let doc_again = load_turtle_str(SCENARIO_TTL, "scenario").unwrap();
    let (second_rows, _, _) = export_rows(&doc_again);
    let second = write_rows(&second_rows);

    assert_eq!(first, second);
}

#[test]
fn roundtrip_mode_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scenario.ttl");
    let csv = dir.path().join("scenario.csv");
    let roundtrip = dir.path().join("scenario.roundtrip.ttl");
    std::fs::write(&input, SCENARIO_TTL).unwrap();

    let config = RunConfig {
        command: CommandPlan::Roundtrip {
            input_ttl: input,
            output_csv: csv.clone(),
            roundtrip_ttl: roundtrip.clone(),
        },
        schema_xsd: None,
        json: false,
    };
    let summary = dcc_tabular::run(&config).unwrap();
    assert!(!summary.has_defects(), "{:?}", summary.defects);
    assert_eq!(summary.entities, 3);
    assert_eq!(summary.rows, 5);

    let report = summary.roundtrip.as_ref().unwrap();
    assert!(report.identical(), "lost: {:?}, invented: {:?}", report.lost, report.invented);
    assert!(report.rows_stable);
    assert_eq!(report.source_triples, report.reconstructed_triples);

    // Both artifacts landed on disk, and the reconstructed TTL reloads
    // into an isomorphic graph.
    let csv_content = std::fs::read_to_string(&csv).unwrap();
    assert!(csv_content.starts_with("id,label,entity_type,dccx_alignment,"));
    let rt_content = std::fs::read_to_string(&roundtrip).unwrap();
    let original = load_turtle_str(SCENARIO_TTL, "scenario").unwrap();
    let reloaded = load_turtle_str(&rt_content, "roundtrip").unwrap();
    let (lost, invented) = diff_graphs(&original.graph, &reloaded.graph);
    assert!(lost.is_empty() && invented.is_empty());
}

#[test]
fn deprecation_and_annotations_round_trip() {
    let ttl = r#"
@prefix dcc: <https://ptb.de/dcc/ont/> .
@prefix dcterms: <http://purl.org/dc/terms/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

dcc:LegacyUnit a owl:Class ;
    skos:prefLabel "Legacy unit"@en ;
    skos:definition "Superseded unit container."@en ;
    owl:deprecated "true"^^xsd:boolean ;
    dcterms:isReplacedBy dcc:Unit ;
    rdfs:seeAlso dcc:Unit .

dcc:unit1 a owl:NamedIndividual , dcc:Unit ;
    rdfs:label "unit one"@en ;
    rdfs:comment "An individual."@en .
"#;
    let doc = load_turtle_str(ttl, "inline").unwrap();
    let (rows, defects, _) = export_rows(&doc);
    assert!(defects.is_empty(), "defects: {defects:?}");

    let legacy = rows.iter().find(|r| r.id == "dcc:LegacyUnit").unwrap();
    assert_eq!(legacy.status, "deprecated");
    assert_eq!(legacy.replaced_by, "dcc:Unit");

    // rdfs:seeAlso and the individual's concrete types travel as
    // annotation rows.
    assert!(rows
        .iter()
        .any(|r| r.id == "dcc:LegacyUnit" && r.annotation_predicate == "rdfs:seeAlso"));
    assert!(rows
        .iter()
        .any(|r| r.id == "dcc:unit1"
            && r.annotation_predicate == "rdf:type"
            && r.annotation_value == "owl:NamedIndividual"));

    let reconstruction = reconstruct(&rows, &PrefixMap::preferred()).unwrap();
    assert!(reconstruction.defects.is_empty(), "{:?}", reconstruction.defects);
    let (lost, invented) = diff_graphs(&doc.graph, &reconstruction.graph);
    assert!(lost.is_empty(), "lost: {lost:?}");
    assert!(invented.is_empty(), "invented: {invented:?}");
}
