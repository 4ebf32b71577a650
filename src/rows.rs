//! The tabular row model and the export-direction row mapper.
//!
//! Three row kinds share the fixed column schema: one base row per
//! entity (descriptive, structural, and property columns), one row per
//! restriction, one row per leftover annotation. Columns never mix
//! across kinds.

use serde::{Deserialize, Serialize};

use crate::model::{AxiomFact, Entity, RestrictionFact};
use crate::vocab::ALIGNMENT_NONE;

/// The fixed column set, in file order.
pub const COLUMNS: [&str; 23] = [
    "id",
    "label",
    "entity_type",
    "dccx_alignment",
    "status",
    "replaced_by",
    "definition",
    "comment",
    "example",
    "source",
    "subclass_of",
    "equivalent_to",
    "disjoint_with",
    "on_property",
    "restriction_type",
    "restriction_filler",
    "cardinality_value",
    "property_domain",
    "property_range",
    "property_characteristic",
    "inverse_of",
    "annotation_predicate",
    "annotation_value",
];

/// The in-cell separator for multi-valued columns. `union(...)` and
/// `oneOf(...)` expression cells are atomic and never split.
pub const MULTI_VALUE_SEPARATOR: char = '|';

pub const STATUS_DEPRECATED: &str = "deprecated";

/// One tabular row. Every cell holds its rendered text form; blank
/// means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    pub label: String,
    pub entity_type: String,
    pub dccx_alignment: String,
    pub status: String,
    pub replaced_by: String,
    pub definition: String,
    pub comment: String,
    pub example: String,
    pub source: String,
    pub subclass_of: String,
    pub equivalent_to: String,
    pub disjoint_with: String,
    pub on_property: String,
    pub restriction_type: String,
    pub restriction_filler: String,
    pub cardinality_value: String,
    pub property_domain: String,
    pub property_range: String,
    pub property_characteristic: String,
    pub inverse_of: String,
    pub annotation_predicate: String,
    pub annotation_value: String,
}

/// Which of the three row kinds a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Base,
    Restriction,
    Annotation,
}

impl Row {
    /// Cells in `COLUMNS` order.
    pub fn cells(&self) -> [&str; 23] {
        [
            &self.id,
            &self.label,
            &self.entity_type,
            &self.dccx_alignment,
            &self.status,
            &self.replaced_by,
            &self.definition,
            &self.comment,
            &self.example,
            &self.source,
            &self.subclass_of,
            &self.equivalent_to,
            &self.disjoint_with,
            &self.on_property,
            &self.restriction_type,
            &self.restriction_filler,
            &self.cardinality_value,
            &self.property_domain,
            &self.property_range,
            &self.property_characteristic,
            &self.inverse_of,
            &self.annotation_predicate,
            &self.annotation_value,
        ]
    }

    /// Build a row from cells in `COLUMNS` order.
    pub fn from_cells(cells: Vec<String>) -> Result<Self, String> {
        if cells.len() != COLUMNS.len() {
            return Err(format!(
                "expected {} cells, found {}",
                COLUMNS.len(),
                cells.len()
            ));
        }
        let mut cells = cells.into_iter();
        let mut take = || cells.next().unwrap_or_default();
        Ok(Row {
            id: take(),
            label: take(),
            entity_type: take(),
            dccx_alignment: take(),
            status: take(),
            replaced_by: take(),
            definition: take(),
            comment: take(),
            example: take(),
            source: take(),
            subclass_of: take(),
            equivalent_to: take(),
            disjoint_with: take(),
            on_property: take(),
            restriction_type: take(),
            restriction_filler: take(),
            cardinality_value: take(),
            property_domain: take(),
            property_range: take(),
            property_characteristic: take(),
            inverse_of: take(),
            annotation_predicate: take(),
            annotation_value: take(),
        })
    }

    fn has_base_cells(&self) -> bool {
        [
            &self.label,
            &self.dccx_alignment,
            &self.status,
            &self.replaced_by,
            &self.definition,
            &self.comment,
            &self.example,
            &self.source,
            &self.subclass_of,
            &self.equivalent_to,
            &self.disjoint_with,
            &self.property_domain,
            &self.property_range,
            &self.property_characteristic,
            &self.inverse_of,
        ]
        .iter()
        .any(|cell| !cell.is_empty())
    }

    fn has_restriction_cells(&self) -> bool {
        [
            &self.on_property,
            &self.restriction_type,
            &self.restriction_filler,
            &self.cardinality_value,
        ]
        .iter()
        .any(|cell| !cell.is_empty())
    }

    fn has_annotation_cells(&self) -> bool {
        !self.annotation_predicate.is_empty() || !self.annotation_value.is_empty()
    }

    /// Classify the row, rejecting mixed rows (every
    /// row's non-blank optional columns belong to exactly one kind).
    pub fn kind(&self) -> Result<RowKind, String> {
        let base = self.has_base_cells();
        let restriction = self.has_restriction_cells();
        let annotation = self.has_annotation_cells();
        match (base, restriction, annotation) {
            (_, false, false) => Ok(RowKind::Base),
            (false, true, false) => Ok(RowKind::Restriction),
            (false, false, true) => Ok(RowKind::Annotation),
            _ => Err("row mixes columns of different axiom kinds".to_string()),
        }
    }
}

/// Split a multi-valued cell. Expression cells are atomic.
pub fn split_multi_value(cell: &str) -> Vec<&str> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if (trimmed.starts_with("union(") || trimmed.starts_with("oneOf(")) && trimmed.ends_with(')') {
        return vec![trimmed];
    }
    trimmed
        .split(MULTI_VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

fn join_multi_value(mut values: Vec<String>) -> String {
    values.sort();
    values.dedup();
    values.join("|")
}

/// Map one entity's facts to rows: base row, then restriction rows
/// sorted by their fields, then annotation rows sorted by predicate and
/// value.
pub fn map_rows(entity: &Entity, facts: &[AxiomFact]) -> Vec<Row> {
    let mut base = Row {
        id: entity.id.clone(),
        entity_type: entity.kind.as_str().to_string(),
        ..Row::default()
    };

    let mut subclasses = Vec::new();
    let mut equivalents = Vec::new();
    let mut disjoints = Vec::new();
    let mut domains = Vec::new();
    let mut ranges = Vec::new();
    let mut characteristics = Vec::new();
    let mut inverses = Vec::new();
    let mut restrictions: Vec<RestrictionFact> = Vec::new();
    let mut annotations: Vec<(String, String)> = Vec::new();

    for fact in facts {
        match fact {
            AxiomFact::Label(value) => base.label = value.clone(),
            AxiomFact::Definition(value) => base.definition = value.clone(),
            AxiomFact::Comment(value) => base.comment = value.clone(),
            AxiomFact::Example(value) => base.example = value.clone(),
            AxiomFact::Source(value) => base.source = value.clone(),
            AxiomFact::Deprecated { replaced_by } => {
                base.status = STATUS_DEPRECATED.to_string();
                base.replaced_by = replaced_by.clone().unwrap_or_default();
            }
            AxiomFact::Alignment(value) => base.dccx_alignment = value.clone(),
            AxiomFact::SubclassOf(value) => subclasses.push(value.clone()),
            AxiomFact::EquivalentTo(value) => equivalents.push(value.clone()),
            AxiomFact::DisjointWith(value) => disjoints.push(value.clone()),
            AxiomFact::Domain(value) => domains.push(value.clone()),
            AxiomFact::Range(value) => ranges.push(value.clone()),
            AxiomFact::Characteristic(characteristic) => {
                characteristics.push(characteristic.as_str().to_string());
            }
            AxiomFact::InverseOf(value) => inverses.push(value.clone()),
            AxiomFact::Restriction(restriction) => restrictions.push(restriction.clone()),
            AxiomFact::Annotation { predicate, value } => {
                annotations.push((predicate.clone(), value.clone()));
            }
        }
    }

    base.subclass_of = join_multi_value(subclasses);
    base.equivalent_to = join_multi_value(equivalents);
    base.disjoint_with = join_multi_value(disjoints);
    base.property_domain = join_multi_value(domains);
    base.property_range = join_multi_value(ranges);
    base.property_characteristic = join_multi_value(characteristics);
    base.inverse_of = join_multi_value(inverses);

    // The alignment column is mandatory for classes and properties; an
    // unaligned term carries the explicit sentinel.
    if entity.kind.requires_alignment() && base.dccx_alignment.is_empty() {
        base.dccx_alignment = ALIGNMENT_NONE.to_string();
    }

    let mut rows = vec![base];

    restrictions.sort();
    restrictions.dedup();
    for restriction in restrictions {
        rows.push(Row {
            id: entity.id.clone(),
            entity_type: entity.kind.as_str().to_string(),
            on_property: restriction.on_property,
            restriction_type: restriction.quantifier.as_str().to_string(),
            restriction_filler: restriction.filler,
            cardinality_value: restriction
                .cardinality
                .map(|n| n.to_string())
                .unwrap_or_default(),
            ..Row::default()
        });
    }

    annotations.sort();
    annotations.dedup();
    for (predicate, value) in annotations {
        rows.push(Row {
            id: entity.id.clone(),
            entity_type: entity.kind.as_str().to_string(),
            annotation_predicate: predicate,
            annotation_value: value,
            ..Row::default()
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Characteristic, EntityKind, Quantifier};
    use oxigraph::model::NamedNode;

    fn entity(kind: EntityKind) -> Entity {
        Entity {
            id: "dcc:Sensor".to_string(),
            iri: NamedNode::new("https://ptb.de/dcc/ont/Sensor").unwrap(),
            kind,
        }
    }

    #[test]
    fn base_row_folds_profile_facts() {
        let facts = vec![
            AxiomFact::Label("Sensor@en".to_string()),
            AxiomFact::Characteristic(Characteristic::Functional),
            AxiomFact::Domain("dcc:Sensor".to_string()),
            AxiomFact::Range("dcc:Observation".to_string()),
        ];
        let rows = map_rows(&entity(EntityKind::ObjectProperty), &facts);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.label, "Sensor@en");
        assert_eq!(row.property_characteristic, "functional");
        assert_eq!(row.property_domain, "dcc:Sensor");
        assert_eq!(row.property_range, "dcc:Observation");
        assert_eq!(row.dccx_alignment, "none");
        assert_eq!(row.kind(), Ok(RowKind::Base));
    }

    #[test]
    fn restrictions_get_their_own_rows() {
        let facts = vec![
            AxiomFact::SubclassOf("sosa:Sensor".to_string()),
            AxiomFact::Restriction(crate::model::RestrictionFact {
                on_property: "dcc:observes".to_string(),
                quantifier: Quantifier::Some,
                filler: "dcc:Observation".to_string(),
                cardinality: None,
            }),
        ];
        let rows = map_rows(&entity(EntityKind::Class), &facts);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind(), Ok(RowKind::Base));
        assert_eq!(rows[1].kind(), Ok(RowKind::Restriction));
        assert_eq!(rows[1].on_property, "dcc:observes");
        assert_eq!(rows[1].restriction_type, "some");
        assert_eq!(rows[1].restriction_filler, "dcc:Observation");
        assert!(rows[1].cardinality_value.is_empty());
        assert!(rows[1].label.is_empty());
    }

    #[test]
    fn individuals_skip_the_alignment_sentinel() {
        let rows = map_rows(&entity(EntityKind::Individual), &[]);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].dccx_alignment.is_empty());
    }

    #[test]
    fn mixed_rows_are_rejected() {
        let row = Row {
            id: "dcc:Sensor".to_string(),
            entity_type: "Class".to_string(),
            on_property: "dcc:observes".to_string(),
            restriction_type: "some".to_string(),
            restriction_filler: "dcc:Observation".to_string(),
            property_characteristic: "functional".to_string(),
            ..Row::default()
        };
        assert!(row.kind().is_err());
    }

    #[test]
    fn multi_value_cells_are_sorted_and_expression_cells_stay_atomic() {
        let facts = vec![
            AxiomFact::SubclassOf("sosa:Sensor".to_string()),
            AxiomFact::SubclassOf("dcc:Device".to_string()),
        ];
        let rows = map_rows(&entity(EntityKind::Class), &facts);
        assert_eq!(rows[0].subclass_of, "dcc:Device|sosa:Sensor");

        assert_eq!(
            split_multi_value("dcc:Device|sosa:Sensor"),
            vec!["dcc:Device", "sosa:Sensor"]
        );
        assert_eq!(
            split_multi_value("union(xsd:double|xsd:string)"),
            vec!["union(xsd:double|xsd:string)"]
        );
        assert!(split_multi_value("  ").is_empty());
    }

    #[test]
    fn row_cells_match_column_order() {
        let row = Row {
            id: "dcc:Sensor".to_string(),
            ..Row::default()
        };
        let cells = row.cells();
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[0], "dcc:Sensor");
        let rebuilt = Row::from_cells(cells.iter().map(|c| c.to_string()).collect()).unwrap();
        assert_eq!(rebuilt, row);
    }
}
