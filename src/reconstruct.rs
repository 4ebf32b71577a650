//! TTL reconstruction: regroup rows by identifier, validate
//! the per-entity invariants, and emit the corresponding triples into a
//! fresh graph.
//!
//! Validation is all-or-nothing per entity: an entity with any invalid
//! row contributes no triples at all and its defects are recorded, while
//! every other entity still reconstructs. A row whose identifier is
//! blank cannot be attributed to any entity and aborts the run.

use std::collections::HashMap;

use indexmap::IndexMap;
use oxigraph::model::vocab::{rdf, rdfs, xsd};
use oxigraph::model::{BlankNode, Graph, Literal, NamedNode, Subject, Term, Triple};

use crate::error::{Defect, TransformError};
use crate::graph::{PrefixMap, parse_literal_cell};
use crate::model::{Characteristic, EntityKind, Quantifier};
use crate::rows::{Row, RowKind, STATUS_DEPRECATED, split_multi_value};
use crate::vocab::{ALIGNMENT_NONE, dcterms, is_force_literal, owl, skos};

/// Result of a reconstruction pass.
#[derive(Debug)]
pub struct Reconstruction {
    pub graph: Graph,
    pub defects: Vec<Defect>,
    /// Number of entities in the input row set.
    pub entities: usize,
    /// Entities skipped because of invalid rows.
    pub skipped: usize,
}

/// Deterministic blank-node allocator, one per reconstruction run.
struct BlankNodes {
    next: usize,
}

impl BlankNodes {
    fn new() -> Self {
        Self { next: 0 }
    }

    fn fresh(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.next));
        self.next += 1;
        node
    }
}

/// Build an RDF collection from terms, appending its triples.
fn build_list(items: Vec<Term>, bnodes: &mut BlankNodes, triples: &mut Vec<Triple>) -> Term {
    let mut head: Term = Term::from(rdf::NIL.into_owned());
    for item in items.into_iter().rev() {
        let node = bnodes.fresh();
        triples.push(Triple::new(node.clone(), rdf::FIRST.into_owned(), item));
        triples.push(Triple::new(node.clone(), rdf::REST.into_owned(), head));
        head = Term::from(node);
    }
    head
}

/// Expand a class-expression cell: an IRI/CURIE, `union(a|b)`, or
/// `oneOf(a|b)`. Expression cells synthesize their blank-node structure
/// into `triples`.
fn expand_class_expression(
    cell: &str,
    prefixes: &PrefixMap,
    datatype_context: bool,
    bnodes: &mut BlankNodes,
    triples: &mut Vec<Triple>,
) -> Result<Term, String> {
    let cell = cell.trim();
    for (marker, predicate) in [("union(", owl::UNION_OF), ("oneOf(", owl::ONE_OF)] {
        let Some(inner) = cell
            .strip_prefix(marker)
            .and_then(|rest| rest.strip_suffix(')'))
        else {
            continue;
        };
        let members: Vec<Term> = inner
            .split('|')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                prefixes
                    .parse_term_cell(part)
                    .unwrap_or_else(|| Term::from(parse_literal_cell(part, prefixes)))
            })
            .collect();
        if members.is_empty() {
            return Err(format!("empty {marker}...) expression"));
        }
        let node = bnodes.fresh();
        let node_type = if datatype_context {
            rdfs::DATATYPE
        } else {
            owl::CLASS
        };
        triples.push(Triple::new(
            node.clone(),
            rdf::TYPE.into_owned(),
            node_type.into_owned(),
        ));
        let head = build_list(members, bnodes, triples);
        triples.push(Triple::new(node.clone(), predicate.into_owned(), head));
        return Ok(Term::from(node));
    }
    prefixes
        .expand_node(cell)
        .map(Term::from)
        .ok_or_else(|| format!("{cell:?} is not a resolvable IRI or expression"))
}

/// Per-entity builder: validation and triple emission in one pass, with
/// emission discarded when any defect was recorded.
struct EntityBuilder<'a> {
    id: &'a str,
    prefixes: &'a PrefixMap,
    triples: Vec<Triple>,
    defects: Vec<Defect>,
}

impl<'a> EntityBuilder<'a> {
    fn invalid(&mut self, row_number: usize, reason: impl Into<String>) {
        self.defects
            .push(Defect::invalid_row(self.id, row_number, reason));
    }

    fn push(&mut self, subject: impl Into<Subject>, predicate: NamedNode, object: impl Into<Term>) {
        self.triples
            .push(Triple::new(subject, predicate, object));
    }

    fn expand_iri_cell(&mut self, row_number: usize, column: &str, cell: &str) -> Option<NamedNode> {
        match self.prefixes.expand_node(cell) {
            Some(node) => Some(node),
            None => {
                self.invalid(
                    row_number,
                    format!("{column}: {cell:?} is not a resolvable IRI"),
                );
                None
            }
        }
    }
}

fn build_base_row(
    builder: &mut EntityBuilder<'_>,
    subject: &NamedNode,
    kind: EntityKind,
    row_number: usize,
    row: &Row,
    bnodes: &mut BlankNodes,
) {
    let prefixes = builder.prefixes;

    // Descriptive literals.
    let label_predicate = if kind == EntityKind::Individual {
        rdfs::LABEL
    } else {
        skos::PREF_LABEL
    };
    let literal_columns = [
        (label_predicate, &row.label),
        (skos::DEFINITION, &row.definition),
        (rdfs::COMMENT, &row.comment),
        (skos::EXAMPLE, &row.example),
        (dcterms::SOURCE, &row.source),
    ];
    for (predicate, cell) in literal_columns {
        if !cell.is_empty() {
            builder.triples.push(Triple::new(
                subject.clone(),
                predicate.into_owned(),
                parse_literal_cell(cell, prefixes),
            ));
        }
    }

    // Status.
    match row.status.as_str() {
        "" => {
            if !row.replaced_by.is_empty() {
                builder.invalid(row_number, "replaced_by requires status=deprecated");
            }
        }
        STATUS_DEPRECATED => {
            if row.replaced_by.is_empty() {
                builder.invalid(row_number, "status=deprecated requires a non-empty replaced_by");
            } else {
                builder.push(
                    subject.clone(),
                    owl::DEPRECATED.into_owned(),
                    Literal::new_typed_literal("true", xsd::BOOLEAN),
                );
                let replacement: Term = prefixes
                    .parse_term_cell(&row.replaced_by)
                    .unwrap_or_else(|| Term::from(parse_literal_cell(&row.replaced_by, prefixes)));
                builder.push(subject.clone(), dcterms::IS_REPLACED_BY.into_owned(), replacement);
            }
        }
        other => {
            builder.invalid(row_number, format!("unknown status {other:?}"));
        }
    }

    // Alignment: mandatory CURIE-or-sentinel for classes and properties,
    // forbidden for individuals.
    if kind.requires_alignment() {
        if row.dccx_alignment.is_empty() {
            builder.invalid(
                row_number,
                "dccx_alignment is mandatory for classes and properties (use the sentinel \"none\")",
            );
        } else if row.dccx_alignment != ALIGNMENT_NONE {
            if let Some(target) =
                builder.expand_iri_cell(row_number, "dccx_alignment", &row.dccx_alignment)
            {
                builder.push(subject.clone(), skos::EXACT_MATCH.into_owned(), target);
            }
        }
    } else if !row.dccx_alignment.is_empty() {
        builder.invalid(row_number, "dccx_alignment must be blank for individuals");
    }

    // Structural columns. Superclasses are plain IRIs (restrictions have
    // their own rows); equivalence and disjointness also accept
    // union()/oneOf() expression cells.
    for value in split_multi_value(&row.subclass_of) {
        if let Some(target) = builder.expand_iri_cell(row_number, "subclass_of", value) {
            builder.push(subject.clone(), rdfs::SUB_CLASS_OF.into_owned(), target);
        }
    }
    for (column, predicate, cell) in [
        ("equivalent_to", owl::EQUIVALENT_CLASS, &row.equivalent_to),
        ("disjoint_with", owl::DISJOINT_WITH, &row.disjoint_with),
    ] {
        for value in split_multi_value(cell) {
            match expand_class_expression(value, prefixes, false, bnodes, &mut builder.triples) {
                Ok(expression) => {
                    builder.push(subject.clone(), predicate.into_owned(), expression);
                }
                Err(reason) => builder.invalid(row_number, format!("{column}: {reason}")),
            }
        }
    }

    // Property columns.
    let datatype_context = kind == EntityKind::DataProperty;
    for (column, predicate, cell) in [
        ("property_domain", rdfs::DOMAIN, &row.property_domain),
        ("property_range", rdfs::RANGE, &row.property_range),
    ] {
        for value in split_multi_value(cell) {
            match expand_class_expression(
                value,
                prefixes,
                datatype_context,
                bnodes,
                &mut builder.triples,
            ) {
                Ok(expression) => builder.push(subject.clone(), predicate.into_owned(), expression),
                Err(reason) => builder.invalid(row_number, format!("{column}: {reason}")),
            }
        }
    }
    for value in split_multi_value(&row.property_characteristic) {
        match Characteristic::parse(value) {
            Some(characteristic) => builder.push(
                subject.clone(),
                rdf::TYPE.into_owned(),
                characteristic.type_iri().into_owned(),
            ),
            None => builder.invalid(
                row_number,
                format!("property_characteristic: unknown characteristic {value:?}"),
            ),
        }
    }
    for value in split_multi_value(&row.inverse_of) {
        if let Some(target) = builder.expand_iri_cell(row_number, "inverse_of", value) {
            builder.push(subject.clone(), owl::INVERSE_OF.into_owned(), target);
        }
    }

    // Cross-kind column checks. Structural class columns belong to
    // classes; property columns belong to properties.
    if kind != EntityKind::Class
        && (!row.subclass_of.is_empty()
            || !row.equivalent_to.is_empty()
            || !row.disjoint_with.is_empty())
    {
        builder.invalid(row_number, "class-structural columns on a non-class entity");
    }
    if !kind.is_property()
        && (!row.property_domain.is_empty()
            || !row.property_range.is_empty()
            || !row.property_characteristic.is_empty()
            || !row.inverse_of.is_empty())
    {
        builder.invalid(row_number, "property columns on a non-property entity");
    }
}

fn build_restriction_row(
    builder: &mut EntityBuilder<'_>,
    subject: &NamedNode,
    row_number: usize,
    row: &Row,
    property_kinds: &HashMap<String, EntityKind>,
    bnodes: &mut BlankNodes,
) {
    if row.on_property.is_empty() || row.restriction_type.is_empty() || row.restriction_filler.is_empty()
    {
        builder.invalid(
            row_number,
            "restriction rows require on_property, restriction_type, and restriction_filler together",
        );
        return;
    }
    let Some(quantifier) = Quantifier::parse(&row.restriction_type) else {
        builder.invalid(
            row_number,
            format!("unknown restriction_type {:?}", row.restriction_type),
        );
        return;
    };
    let cardinality = if quantifier.requires_cardinality() {
        if row.cardinality_value.is_empty() {
            builder.invalid(
                row_number,
                format!("restriction_type={} requires cardinality_value", quantifier.as_str()),
            );
            return;
        }
        match row.cardinality_value.parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                builder.invalid(
                    row_number,
                    format!(
                        "cardinality_value {:?} is not a non-negative integer",
                        row.cardinality_value
                    ),
                );
                return;
            }
        }
    } else {
        if !row.cardinality_value.is_empty() {
            builder.invalid(
                row_number,
                format!(
                    "cardinality_value is forbidden for restriction_type={}",
                    quantifier.as_str()
                ),
            );
            return;
        }
        None
    };

    let Some(on_property) = builder.expand_iri_cell(row_number, "on_property", &row.on_property)
    else {
        return;
    };
    let on_data_property = property_kinds
        .get(row.on_property.trim())
        .is_some_and(|kind| *kind == EntityKind::DataProperty);

    let filler = match expand_class_expression(
        &row.restriction_filler,
        builder.prefixes,
        on_data_property,
        bnodes,
        &mut builder.triples,
    ) {
        Ok(term) => term,
        Err(reason) => {
            builder.invalid(row_number, format!("restriction_filler: {reason}"));
            return;
        }
    };

    let node = bnodes.fresh();
    builder.push(node.clone(), rdf::TYPE.into_owned(), owl::RESTRICTION.into_owned());
    builder.push(node.clone(), owl::ON_PROPERTY.into_owned(), on_property);
    match quantifier {
        Quantifier::Some => {
            builder.push(node.clone(), owl::SOME_VALUES_FROM.into_owned(), filler);
        }
        Quantifier::Only => {
            builder.push(node.clone(), owl::ALL_VALUES_FROM.into_owned(), filler);
        }
        Quantifier::Min | Quantifier::Max | Quantifier::Exact => {
            let predicate = match quantifier {
                Quantifier::Min => owl::MIN_QUALIFIED_CARDINALITY,
                Quantifier::Max => owl::MAX_QUALIFIED_CARDINALITY,
                _ => owl::QUALIFIED_CARDINALITY,
            };
            let value = cardinality.unwrap_or_default().to_string();
            builder.push(
                node.clone(),
                predicate.into_owned(),
                Literal::new_typed_literal(value, xsd::NON_NEGATIVE_INTEGER),
            );
            let filler_predicate = if on_data_property {
                owl::ON_DATA_RANGE
            } else {
                owl::ON_CLASS
            };
            builder.push(node.clone(), filler_predicate.into_owned(), filler);
        }
    }
    builder.push(subject.clone(), rdfs::SUB_CLASS_OF.into_owned(), node);
}

fn build_annotation_row(
    builder: &mut EntityBuilder<'_>,
    subject: &NamedNode,
    row_number: usize,
    row: &Row,
    bnodes: &mut BlankNodes,
) {
    let Some(predicate) =
        builder.expand_iri_cell(row_number, "annotation_predicate", &row.annotation_predicate)
    else {
        return;
    };
    let value = row.annotation_value.as_str();
    let prefixes = builder.prefixes;

    // Collection-valued predicates re-expand their member list.
    let is_list_predicate = [owl::UNION_OF, owl::INTERSECTION_OF, owl::MEMBERS]
        .iter()
        .any(|p| p.as_str() == predicate.as_str());
    if is_list_predicate && !value.is_empty() {
        let members: Vec<Term> = split_multi_value(value)
            .into_iter()
            .map(|part| {
                prefixes
                    .parse_term_cell(part)
                    .unwrap_or_else(|| Term::from(parse_literal_cell(part, prefixes)))
            })
            .collect();
        let head = build_list(members, bnodes, &mut builder.triples);
        builder.push(subject.clone(), predicate, head);
        return;
    }

    let object: Term = if is_force_literal(predicate.as_ref()) {
        Term::from(parse_literal_cell(value, prefixes))
    } else {
        prefixes
            .parse_term_cell(value)
            .unwrap_or_else(|| Term::from(parse_literal_cell(value, prefixes)))
    };
    builder.push(subject.clone(), predicate, object);
}

/// Reconstruct a graph from rows. Returns a fatal error only
/// when a row cannot be attributed to an entity at all.
pub fn reconstruct(rows: &[Row], prefixes: &PrefixMap) -> Result<Reconstruction, TransformError> {
    let mut groups: IndexMap<&str, Vec<(usize, &Row)>> = IndexMap::new();
    for (index, row) in rows.iter().enumerate() {
        let id = row.id.trim();
        if id.is_empty() {
            return Err(TransformError::Tabular(format!(
                "row {} has a blank id and cannot be attributed to an entity",
                index + 1
            )));
        }
        groups.entry(id).or_default().push((index + 1, row));
    }

    // Property kinds, for owl:onDataRange decisions on restriction rows.
    let mut property_kinds: HashMap<String, EntityKind> = HashMap::new();
    for (&id, group) in &groups {
        if let Some(kind) = group
            .iter()
            .find_map(|(_, row)| EntityKind::parse(row.entity_type.trim()))
        {
            if kind.is_property() {
                property_kinds.insert((*id).to_string(), kind);
            }
        }
    }

    let mut graph = Graph::new();
    let mut defects = Vec::new();
    let mut bnodes = BlankNodes::new();
    let mut skipped = 0usize;
    let entities = groups.len();

    for (&id, group) in &groups {
        let mut builder = EntityBuilder {
            id,
            prefixes,
            triples: Vec::new(),
            defects: Vec::new(),
        };

        // Consistent (identifier, entity_type) across the group.
        let mut kind = None;
        for (row_number, row) in group {
            let cell = row.entity_type.trim();
            match EntityKind::parse(cell) {
                Some(parsed) => match kind {
                    None => kind = Some(parsed),
                    Some(existing) if existing != parsed => {
                        builder.invalid(
                            *row_number,
                            format!(
                                "entity_type {cell:?} contradicts {:?} on an earlier row",
                                existing.as_str()
                            ),
                        );
                    }
                    Some(_) => {}
                },
                None => builder.invalid(*row_number, format!("unknown entity_type {cell:?}")),
            }
        }

        let subject = prefixes.expand_node(id);
        if subject.is_none() {
            builder.invalid(group[0].0, format!("id {id:?} is not a resolvable IRI"));
        }

        if let (Some(kind), Some(subject)) = (kind, subject) {
            if let Some(type_iri) = kind.type_iri() {
                builder.push(
                    subject.clone(),
                    rdf::TYPE.into_owned(),
                    type_iri.into_owned(),
                );
            }

            let mut base_rows = 0usize;
            for (row_number, row) in group {
                match row.kind() {
                    Ok(RowKind::Base) => {
                        base_rows += 1;
                        if base_rows > 1 {
                            builder.invalid(*row_number, "more than one base row for this entity");
                            continue;
                        }
                        build_base_row(&mut builder, &subject, kind, *row_number, row, &mut bnodes);
                    }
                    Ok(RowKind::Restriction) => {
                        if kind != EntityKind::Class {
                            builder.invalid(*row_number, "restriction rows belong to classes");
                            continue;
                        }
                        build_restriction_row(
                            &mut builder,
                            &subject,
                            *row_number,
                            row,
                            &property_kinds,
                            &mut bnodes,
                        );
                    }
                    Ok(RowKind::Annotation) => {
                        build_annotation_row(&mut builder, &subject, *row_number, row, &mut bnodes);
                    }
                    Err(reason) => builder.invalid(*row_number, reason),
                }
            }
            if base_rows == 0 {
                builder.invalid(group[0].0, "entity has no base row");
            }
        }

        if builder.defects.is_empty() {
            for triple in builder.triples {
                graph.insert(&triple);
            }
        } else {
            for defect in &builder.defects {
                tracing::warn!(entity = %id, defect = %defect, "skipping entity");
            }
            defects.extend(builder.defects);
            skipped += 1;
        }
    }

    Ok(Reconstruction {
        graph,
        defects,
        entities,
        skipped,
    })
}
