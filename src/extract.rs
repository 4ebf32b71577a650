//! Entity extraction: group triples by subject IRI and classify each
//! subject against the fixed priority list.
//!
//! Only IRI subjects are entities; blank-node subjects are expression
//! structure (restrictions, RDF lists) owned by the entity that
//! references them. A subject whose types match nothing on the list is
//! reported as a defect, never silently guessed.

use std::collections::BTreeMap;

use oxigraph::model::vocab::rdf;
use oxigraph::model::{NamedNode, SubjectRef, TermRef};

use crate::error::Defect;
use crate::graph::OntologyDocument;
use crate::model::{Entity, EntityKind};
use crate::vocab::owl;

/// Classification priority: Class > ObjectProperty > DataProperty >
/// AnnotationProperty > Individual. Individuals are recognized by
/// `owl:NamedIndividual` or `owl:Ontology` (the ontology header).
fn classify(types: &[NamedNode]) -> Option<EntityKind> {
    let has = |candidate| types.iter().any(|t| t.as_ref() == candidate);
    if has(owl::CLASS) {
        Some(EntityKind::Class)
    } else if has(owl::OBJECT_PROPERTY) {
        Some(EntityKind::ObjectProperty)
    } else if has(owl::DATATYPE_PROPERTY) {
        Some(EntityKind::DataProperty)
    } else if has(owl::ANNOTATION_PROPERTY) {
        Some(EntityKind::AnnotationProperty)
    } else if has(owl::NAMED_INDIVIDUAL) || has(owl::ONTOLOGY) {
        Some(EntityKind::Individual)
    } else {
        None
    }
}

/// Single pass over the graph: every IRI subject becomes an entity,
/// classified by its `rdf:type` objects. Entities come back sorted by
/// rendered identifier so downstream output is deterministic.
pub fn extract_entities(
    doc: &OntologyDocument,
    default_kind: Option<EntityKind>,
) -> (Vec<Entity>, Vec<Defect>) {
    let mut subjects: BTreeMap<String, NamedNode> = BTreeMap::new();
    for triple in doc.graph.iter() {
        if let SubjectRef::NamedNode(node) = triple.subject {
            subjects
                .entry(doc.prefixes.compact(node.as_str()))
                .or_insert_with(|| node.into_owned());
        }
    }

    let mut entities = Vec::with_capacity(subjects.len());
    let mut defects = Vec::new();
    for (id, iri) in subjects {
        let types: Vec<NamedNode> = doc
            .graph
            .objects_for_subject_predicate(iri.as_ref(), rdf::TYPE)
            .filter_map(|object| match object {
                TermRef::NamedNode(node) => Some(node.into_owned()),
                _ => None,
            })
            .collect();

        match classify(&types).or(default_kind) {
            Some(kind) => entities.push(Entity { id, iri, kind }),
            None => {
                tracing::warn!(subject = %id, "no recognized rdf:type, skipping entity");
                defects.push(Defect::unknown_entity_type(id));
            }
        }
    }

    (entities, defects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::load_turtle_str;

    const TTL: &str = r#"
@prefix dcc: <https://ptb.de/dcc/ont/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

dcc:Sensor a owl:Class .
dcc:observes a owl:ObjectProperty , owl:FunctionalProperty .
dcc:serialNumber a owl:DatatypeProperty .
dcc:note a owl:AnnotationProperty .
dcc:sensor1 a owl:NamedIndividual .
<https://ptb.de/dcc/ont/> a owl:Ontology .
dcc:orphan rdfs:label "untyped" .
"#;

    fn doc() -> OntologyDocument {
        load_turtle_str(TTL, "inline").unwrap()
    }

    #[test]
    fn classification_follows_priority_list() {
        let (entities, defects) = extract_entities(&doc(), None);
        let kinds: Vec<(&str, EntityKind)> = entities
            .iter()
            .map(|e| (e.id.as_str(), e.kind))
            .collect();
        assert!(kinds.contains(&("dcc:Sensor", EntityKind::Class)));
        assert!(kinds.contains(&("dcc:observes", EntityKind::ObjectProperty)));
        assert!(kinds.contains(&("dcc:serialNumber", EntityKind::DataProperty)));
        assert!(kinds.contains(&("dcc:note", EntityKind::AnnotationProperty)));
        assert!(kinds.contains(&("dcc:sensor1", EntityKind::Individual)));
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].entity, "dcc:orphan");
    }

    #[test]
    fn ontology_header_is_an_individual() {
        let (entities, _) = extract_entities(&doc(), None);
        let header = entities
            .iter()
            .find(|e| e.iri.as_str() == "https://ptb.de/dcc/ont/")
            .unwrap();
        assert_eq!(header.kind, EntityKind::Individual);
    }

    #[test]
    fn default_kind_suppresses_the_defect() {
        let (entities, defects) = extract_entities(&doc(), Some(EntityKind::Individual));
        assert!(defects.is_empty());
        let orphan = entities.iter().find(|e| e.id == "dcc:orphan").unwrap();
        assert_eq!(orphan.kind, EntityKind::Individual);
    }

    #[test]
    fn entities_are_sorted_by_identifier() {
        let (entities, _) = extract_entities(&doc(), None);
        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
