//! Axiom decomposition: one entity's outgoing triples become
//! independent, self-contained axiom facts.
//!
//! Dispatch is a fixed predicate→axiom-kind mapping — the column schema
//! is closed, so unmatched predicates fall through to annotation facts
//! rather than being dropped. Restriction blank nodes are dereferenced
//! recursively (including through `owl:intersectionOf`/`owl:unionOf`
//! lists); an incomplete restriction is recorded as a
//! `MalformedRestriction` defect and skipped without aborting the
//! entity.

use std::collections::HashSet;

use oxigraph::model::vocab::{rdf, rdfs};
use oxigraph::model::{BlankNodeRef, Graph, Literal, NamedNodeRef, SubjectRef, TermRef, TripleRef};

use crate::error::{Defect, DefectKind};
use crate::graph::{OntologyDocument, PrefixMap, encode_literal, render_term};
use crate::model::{AxiomFact, Characteristic, Entity, EntityKind, Quantifier, RestrictionFact};
use crate::vocab::{dcterms, owl, skos};

/// Decomposition result: the ordered fact sequence plus any per-entity
/// defects encountered along the way.
#[derive(Debug, Default)]
pub struct Decomposition {
    pub facts: Vec<AxiomFact>,
    pub defects: Vec<Defect>,
}

// Guard against cyclic rdf:first/rdf:rest structures.
const MAX_LIST_LENGTH: usize = 10_000;

/// Walk an RDF collection. `None` for anything that is not a
/// well-formed `rdf:first`/`rdf:rest` chain ending in `rdf:nil`.
pub(crate) fn list_items<'g>(graph: &'g Graph, head: TermRef<'g>) -> Option<Vec<TermRef<'g>>> {
    let mut items = Vec::new();
    let mut current = head;
    for _ in 0..MAX_LIST_LENGTH {
        if let TermRef::NamedNode(node) = current {
            if node == rdf::NIL {
                return Some(items);
            }
        }
        let subject: SubjectRef<'g> = match current {
            TermRef::NamedNode(node) => node.into(),
            TermRef::BlankNode(node) => node.into(),
            _ => return None,
        };
        items.push(graph.object_for_subject_predicate(subject, rdf::FIRST)?);
        current = graph.object_for_subject_predicate(subject, rdf::REST)?;
    }
    None
}

/// Render a class expression as a cell: a CURIE/IRI, `oneOf(a|b)`, or
/// `union(a|b)`. List member order is preserved.
pub(crate) fn class_expression_cell(
    graph: &Graph,
    prefixes: &PrefixMap,
    term: TermRef<'_>,
) -> Option<String> {
    match term {
        TermRef::NamedNode(node) => Some(prefixes.compact(node.as_str())),
        TermRef::BlankNode(node) => {
            if let Some(head) = graph.object_for_subject_predicate(node, owl::ONE_OF) {
                let items = list_items(graph, head)?;
                let cells: Vec<String> =
                    items.iter().map(|item| render_term(*item, prefixes)).collect();
                return Some(format!("oneOf({})", cells.join("|")));
            }
            if let Some(head) = graph.object_for_subject_predicate(node, owl::UNION_OF) {
                let items = list_items(graph, head)?;
                let mut cells = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        TermRef::NamedNode(member) => cells.push(prefixes.compact(member.as_str())),
                        _ => return None,
                    }
                }
                return Some(format!("union({})", cells.join("|")));
            }
            None
        }
        _ => None,
    }
}

/// Serialize an RDF collection cell for leftover annotations
/// (`owl:members` and friends): members joined with `|`.
fn list_cell(graph: &Graph, prefixes: &PrefixMap, head: TermRef<'_>) -> Option<String> {
    let items = list_items(graph, head)?;
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(|item| render_term(*item, prefixes))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

// =============================================================================
// Restrictions
// =============================================================================

/// Decompose one `owl:Restriction` blank node into its fields.
fn parse_restriction(
    graph: &Graph,
    prefixes: &PrefixMap,
    node: BlankNodeRef<'_>,
) -> Result<RestrictionFact, String> {
    let object_of = |predicate| graph.object_for_subject_predicate(node, predicate);

    let on_property = match object_of(owl::ON_PROPERTY) {
        Some(TermRef::NamedNode(property)) => prefixes.compact(property.as_str()),
        Some(_) => return Err("owl:onProperty is not an IRI".to_string()),
        None => return Err("missing owl:onProperty".to_string()),
    };

    let filler_cell = |term: TermRef<'_>| {
        class_expression_cell(graph, prefixes, term)
            .ok_or_else(|| "filler is an unsupported anonymous class expression".to_string())
    };

    if let Some(term) = object_of(owl::SOME_VALUES_FROM) {
        return Ok(RestrictionFact {
            on_property,
            quantifier: Quantifier::Some,
            filler: filler_cell(term)?,
            cardinality: None,
        });
    }
    if let Some(term) = object_of(owl::ALL_VALUES_FROM) {
        return Ok(RestrictionFact {
            on_property,
            quantifier: Quantifier::Only,
            filler: filler_cell(term)?,
            cardinality: None,
        });
    }

    let cardinality_forms = [
        (owl::MIN_QUALIFIED_CARDINALITY, Quantifier::Min),
        (owl::MIN_CARDINALITY, Quantifier::Min),
        (owl::MAX_QUALIFIED_CARDINALITY, Quantifier::Max),
        (owl::MAX_CARDINALITY, Quantifier::Max),
        (owl::QUALIFIED_CARDINALITY, Quantifier::Exact),
        (owl::CARDINALITY, Quantifier::Exact),
    ];
    for (predicate, quantifier) in cardinality_forms {
        let Some(term) = object_of(predicate) else {
            continue;
        };
        let TermRef::Literal(literal) = term else {
            return Err(format!("{} is not a literal", prefixes.compact(predicate.as_str())));
        };
        let cardinality: u64 = literal.value().parse().map_err(|_| {
            format!("cardinality {:?} is not a non-negative integer", literal.value())
        })?;
        let filler_term = object_of(owl::ON_CLASS)
            .or_else(|| object_of(owl::ON_DATA_RANGE))
            .ok_or_else(|| {
                "cardinality restriction without owl:onClass or owl:onDataRange".to_string()
            })?;
        return Ok(RestrictionFact {
            on_property,
            quantifier,
            filler: filler_cell(filler_term)?,
            cardinality: Some(cardinality),
        });
    }

    Err("no quantifier (owl:someValuesFrom, owl:allValuesFrom, or a cardinality)".to_string())
}

/// Collect every restriction reachable from a class-expression blank
/// node, recursing through `owl:intersectionOf`/`owl:unionOf` lists.
fn collect_restrictions(
    graph: &Graph,
    prefixes: &PrefixMap,
    node: BlankNodeRef<'_>,
    facts: &mut Vec<RestrictionFact>,
    errors: &mut Vec<String>,
) {
    if graph.contains(TripleRef::new(node, rdf::TYPE, owl::RESTRICTION)) {
        match parse_restriction(graph, prefixes, node) {
            Ok(fact) => facts.push(fact),
            Err(reason) => errors.push(reason),
        }
        return;
    }

    let mut found_list = false;
    for predicate in [owl::INTERSECTION_OF, owl::UNION_OF] {
        for head in graph.objects_for_subject_predicate(node, predicate) {
            found_list = true;
            match list_items(graph, head) {
                Some(items) => {
                    for item in items {
                        if let TermRef::BlankNode(member) = item {
                            collect_restrictions(graph, prefixes, member, facts, errors);
                        }
                    }
                }
                None => errors.push("malformed RDF list in class expression".to_string()),
            }
        }
    }
    if !found_list {
        errors.push("blank node is neither a restriction nor an intersection/union".to_string());
    }
}

// =============================================================================
// Literal selection
// =============================================================================

/// All literal objects of a predicate, sorted by encoded form so
/// repeated runs pick the same preferred value.
fn literals_of(
    graph: &Graph,
    subject: SubjectRef<'_>,
    predicate: NamedNodeRef<'_>,
    prefixes: &PrefixMap,
) -> Vec<Literal> {
    let mut literals: Vec<Literal> = graph
        .objects_for_subject_predicate(subject, predicate)
        .filter_map(|term| match term {
            TermRef::Literal(literal) => Some(literal.into_owned()),
            _ => None,
        })
        .collect();
    literals.sort_by_cached_key(|l| encode_literal(l.as_ref(), prefixes));
    literals
}

/// Pick the column value for a multi-valued annotation: the English
/// literal when present, the first otherwise. Leftovers become
/// annotation rows.
fn preferred_literal(literals: Vec<Literal>) -> (Option<Literal>, Vec<Literal>) {
    if literals.is_empty() {
        return (None, Vec::new());
    }
    let index = literals
        .iter()
        .position(|l| l.language() == Some("en"))
        .unwrap_or(0);
    let mut leftovers = literals;
    let preferred = leftovers.remove(index);
    (Some(preferred), leftovers)
}

// =============================================================================
// Decomposer
// =============================================================================

/// Decompose one entity's triples into axiom facts.
pub fn decompose(doc: &OntologyDocument, entity: &Entity) -> Decomposition {
    let graph = &doc.graph;
    let prefixes = &doc.prefixes;
    let subject = entity.iri.as_ref();

    let mut facts = Vec::new();
    let mut defects = Vec::new();
    let mut annotations: Vec<(String, String)> = Vec::new();
    let mut handled: HashSet<&str> = HashSet::new();

    let push_annotation = |annotations: &mut Vec<(String, String)>, predicate: &str, value: String| {
        annotations.push((prefixes.compact(predicate), value));
    };

    // Descriptive columns. Classes and properties read their label from
    // skos:prefLabel, individuals from rdfs:label; the other label
    // predicate stays an annotation so both directions round-trip.
    let label_predicate = if entity.kind == EntityKind::Individual {
        rdfs::LABEL
    } else {
        skos::PREF_LABEL
    };
    let descriptive = [
        (label_predicate, 0usize),
        (skos::DEFINITION, 1),
        (rdfs::COMMENT, 2),
        (skos::EXAMPLE, 3),
        (dcterms::SOURCE, 4),
    ];
    for (predicate, slot) in descriptive {
        let (preferred, leftovers) = preferred_literal(literals_of(graph, subject.into(), predicate, prefixes));
        if let Some(literal) = preferred {
            let cell = encode_literal(literal.as_ref(), prefixes);
            facts.push(match slot {
                0 => AxiomFact::Label(cell),
                1 => AxiomFact::Definition(cell),
                2 => AxiomFact::Comment(cell),
                3 => AxiomFact::Example(cell),
                _ => AxiomFact::Source(cell),
            });
        }
        for literal in leftovers {
            push_annotation(
                &mut annotations,
                predicate.as_str(),
                encode_literal(literal.as_ref(), prefixes),
            );
        }
        // Non-literal objects (an IRI-valued dcterms:source, say) stay
        // annotations.
        for term in graph.objects_for_subject_predicate(subject, predicate) {
            if !matches!(term, TermRef::Literal(_)) {
                push_annotation(&mut annotations, predicate.as_str(), render_term(term, prefixes));
            }
        }
        handled.insert(predicate.as_str());
    }

    // Deprecation status.
    let mut deprecated = false;
    for term in graph.objects_for_subject_predicate(subject, owl::DEPRECATED) {
        match term {
            TermRef::Literal(literal) if matches!(literal.value(), "true" | "1") => {
                deprecated = true;
            }
            other => {
                push_annotation(&mut annotations, owl::DEPRECATED.as_str(), render_term(other, prefixes));
            }
        }
    }
    handled.insert(owl::DEPRECATED.as_str());

    let mut replacements: Vec<String> = graph
        .objects_for_subject_predicate(subject, dcterms::IS_REPLACED_BY)
        .map(|term| render_term(term, prefixes))
        .collect();
    replacements.sort();
    handled.insert(dcterms::IS_REPLACED_BY.as_str());
    if deprecated {
        let mut replacements = replacements.into_iter();
        let replaced_by = replacements.next();
        if replaced_by.is_none() {
            defects.push(Defect {
                kind: DefectKind::InvalidRow,
                entity: entity.id.clone(),
                row: None,
                reason: "status=deprecated requires a non-empty replaced_by".to_string(),
            });
        }
        facts.push(AxiomFact::Deprecated { replaced_by });
        for extra in replacements {
            push_annotation(&mut annotations, dcterms::IS_REPLACED_BY.as_str(), extra);
        }
    } else {
        for value in replacements {
            push_annotation(&mut annotations, dcterms::IS_REPLACED_BY.as_str(), value);
        }
    }

    // Alignment into the external schema namespace. Only classes and
    // properties carry the column; everything else keeps exactMatch as
    // annotations.
    let mut alignment_targets: Vec<(bool, String)> = graph
        .objects_for_subject_predicate(subject, skos::EXACT_MATCH)
        .map(|term| (matches!(term, TermRef::NamedNode(_)), render_term(term, prefixes)))
        .collect();
    alignment_targets.sort();
    let mut alignment_taken = false;
    for (is_iri, target) in alignment_targets {
        if entity.kind.requires_alignment() && is_iri && !alignment_taken {
            facts.push(AxiomFact::Alignment(target));
            alignment_taken = true;
        } else {
            push_annotation(&mut annotations, skos::EXACT_MATCH.as_str(), target);
        }
    }
    handled.insert(skos::EXACT_MATCH.as_str());

    // Structural axioms, per entity kind.
    let mut restriction_facts = Vec::new();
    match entity.kind {
        EntityKind::Class => {
            let mut restriction_errors = Vec::new();
            for predicate in [rdfs::SUB_CLASS_OF, owl::EQUIVALENT_CLASS, owl::DISJOINT_WITH] {
                let mut named_cells = Vec::new();
                for term in graph.objects_for_subject_predicate(subject, predicate) {
                    match term {
                        TermRef::NamedNode(node) => named_cells.push(prefixes.compact(node.as_str())),
                        TermRef::BlankNode(node) => {
                            // Restrictions live under rdfs:subClassOf; anonymous
                            // expressions under equivalence/disjointness are
                            // union/oneOf cells or a recorded defect.
                            if predicate == rdfs::SUB_CLASS_OF {
                                collect_restrictions(
                                    graph,
                                    prefixes,
                                    node,
                                    &mut restriction_facts,
                                    &mut restriction_errors,
                                );
                            } else if let Some(cell) = class_expression_cell(graph, prefixes, term) {
                                named_cells.push(cell);
                            } else {
                                restriction_errors.push(format!(
                                    "unsupported anonymous expression under {}",
                                    prefixes.compact(predicate.as_str())
                                ));
                            }
                        }
                        other => push_annotation(
                            &mut annotations,
                            predicate.as_str(),
                            render_term(other, prefixes),
                        ),
                    }
                }
                named_cells.sort();
                for cell in named_cells {
                    facts.push(if predicate == rdfs::SUB_CLASS_OF {
                        AxiomFact::SubclassOf(cell)
                    } else if predicate == owl::EQUIVALENT_CLASS {
                        AxiomFact::EquivalentTo(cell)
                    } else {
                        AxiomFact::DisjointWith(cell)
                    });
                }
                handled.insert(predicate.as_str());
            }
            for reason in restriction_errors {
                tracing::warn!(entity = %entity.id, %reason, "skipping malformed restriction");
                defects.push(Defect::malformed_restriction(entity.id.clone(), reason));
            }
        }
        EntityKind::ObjectProperty | EntityKind::DataProperty => {
            for (predicate, is_domain) in [(rdfs::DOMAIN, true), (rdfs::RANGE, false)] {
                let mut cells = Vec::new();
                for term in graph.objects_for_subject_predicate(subject, predicate) {
                    match class_expression_cell(graph, prefixes, term) {
                        Some(cell) => cells.push(cell),
                        None => tracing::warn!(
                            entity = %entity.id,
                            predicate = %prefixes.compact(predicate.as_str()),
                            "unsupported class expression, loss will show in the round-trip report"
                        ),
                    }
                }
                cells.sort();
                for cell in cells {
                    facts.push(if is_domain {
                        AxiomFact::Domain(cell)
                    } else {
                        AxiomFact::Range(cell)
                    });
                }
                handled.insert(predicate.as_str());
            }

            let mut characteristics: Vec<Characteristic> = graph
                .objects_for_subject_predicate(subject, rdf::TYPE)
                .filter_map(|term| match term {
                    TermRef::NamedNode(node) => Characteristic::from_type_iri(node.as_str()),
                    _ => None,
                })
                .collect();
            characteristics.sort();
            characteristics.dedup();
            facts.extend(characteristics.into_iter().map(AxiomFact::Characteristic));

            let mut inverses = Vec::new();
            for term in graph.objects_for_subject_predicate(subject, owl::INVERSE_OF) {
                match term {
                    TermRef::NamedNode(node) => inverses.push(prefixes.compact(node.as_str())),
                    other => push_annotation(
                        &mut annotations,
                        owl::INVERSE_OF.as_str(),
                        render_term(other, prefixes),
                    ),
                }
            }
            inverses.sort();
            facts.extend(inverses.into_iter().map(AxiomFact::InverseOf));
            handled.insert(owl::INVERSE_OF.as_str());
        }
        EntityKind::AnnotationProperty | EntityKind::Individual => {}
    }

    restriction_facts.sort();
    facts.extend(restriction_facts.into_iter().map(AxiomFact::Restriction));

    // Everything not consumed above becomes an annotation fact.
    for triple in graph.triples_for_subject(subject) {
        let predicate = triple.predicate;
        if handled.contains(predicate.as_str()) {
            continue;
        }
        if predicate == rdf::TYPE {
            if let TermRef::NamedNode(node) = triple.object {
                let structural = entity
                    .kind
                    .type_iri()
                    .is_some_and(|type_iri| node == type_iri);
                let characteristic = matches!(
                    entity.kind,
                    EntityKind::ObjectProperty | EntityKind::DataProperty
                ) && Characteristic::from_type_iri(node.as_str()).is_some();
                if structural || characteristic {
                    continue;
                }
            }
            push_annotation(
                &mut annotations,
                rdf::TYPE.as_str(),
                render_term(triple.object, prefixes),
            );
            continue;
        }
        if [owl::UNION_OF, owl::INTERSECTION_OF, owl::MEMBERS]
            .iter()
            .any(|p| *p == predicate)
        {
            if let Some(cell) = list_cell(graph, prefixes, triple.object) {
                push_annotation(&mut annotations, predicate.as_str(), cell);
                continue;
            }
        }
        push_annotation(
            &mut annotations,
            predicate.as_str(),
            render_term(triple.object, prefixes),
        );
    }

    annotations.sort();
    annotations.dedup();
    facts.extend(
        annotations
            .into_iter()
            .map(|(predicate, value)| AxiomFact::Annotation { predicate, value }),
    );

    Decomposition { facts, defects }
}
