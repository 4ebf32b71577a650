//! Core data model: entity kinds, restriction quantifiers, property
//! characteristics, and the axiom-fact sum type the decomposer emits.
//!
//! The column schema is fixed and closed, so every axiom kind is one
//! constructor here and the dispatch sites match exhaustively.

use oxigraph::model::NamedNodeRef;
use serde::{Deserialize, Serialize};

use crate::vocab::owl;

// =============================================================================
// Entity kinds
// =============================================================================

/// The five entity kinds of the tabular schema, in classification
/// priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Class,
    ObjectProperty,
    DataProperty,
    AnnotationProperty,
    Individual,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Class => "Class",
            EntityKind::ObjectProperty => "ObjectProperty",
            EntityKind::DataProperty => "DataProperty",
            EntityKind::AnnotationProperty => "AnnotationProperty",
            EntityKind::Individual => "Individual",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Class" => Some(EntityKind::Class),
            "ObjectProperty" => Some(EntityKind::ObjectProperty),
            "DataProperty" => Some(EntityKind::DataProperty),
            "AnnotationProperty" => Some(EntityKind::AnnotationProperty),
            "Individual" => Some(EntityKind::Individual),
            _ => None,
        }
    }

    /// Classes and the three property kinds carry a mandatory
    /// `dccx_alignment` cell; individuals must leave it empty.
    pub fn requires_alignment(self) -> bool {
        !matches!(self, EntityKind::Individual)
    }

    pub fn is_property(self) -> bool {
        matches!(
            self,
            EntityKind::ObjectProperty | EntityKind::DataProperty | EntityKind::AnnotationProperty
        )
    }

    /// The structural `rdf:type` triple this kind emits on
    /// reconstruction. Individuals emit none of their own: their
    /// concrete types round-trip as annotation rows.
    pub fn type_iri(self) -> Option<NamedNodeRef<'static>> {
        match self {
            EntityKind::Class => Some(owl::CLASS),
            EntityKind::ObjectProperty => Some(owl::OBJECT_PROPERTY),
            EntityKind::DataProperty => Some(owl::DATATYPE_PROPERTY),
            EntityKind::AnnotationProperty => Some(owl::ANNOTATION_PROPERTY),
            EntityKind::Individual => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Restrictions
// =============================================================================

/// Restriction quantifier, the `restriction_type` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    Some,
    Only,
    Min,
    Max,
    Exact,
}

impl Quantifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Quantifier::Some => "some",
            Quantifier::Only => "only",
            Quantifier::Min => "min",
            Quantifier::Max => "max",
            Quantifier::Exact => "exact",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "some" => Some(Quantifier::Some),
            "only" => Some(Quantifier::Only),
            "min" => Some(Quantifier::Min),
            "max" => Some(Quantifier::Max),
            "exact" => Some(Quantifier::Exact),
            _ => None,
        }
    }

    /// `cardinality_value` is required iff the quantifier is a
    /// cardinality form, and forbidden otherwise.
    pub fn requires_cardinality(self) -> bool {
        matches!(self, Quantifier::Min | Quantifier::Max | Quantifier::Exact)
    }
}

/// One decomposed restriction: property + quantifier + filler, with the
/// cardinality for the `min`/`max`/`exact` forms. Cells are already
/// rendered (CURIE or full IRI).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RestrictionFact {
    pub on_property: String,
    pub quantifier: Quantifier,
    pub filler: String,
    pub cardinality: Option<u64>,
}

// =============================================================================
// Property characteristics
// =============================================================================

/// OWL property characteristics, the multi-valued
/// `property_characteristic` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Characteristic {
    Functional,
    InverseFunctional,
    Symmetric,
    Asymmetric,
    Reflexive,
    Irreflexive,
    Transitive,
}

/// Characteristic ↔ `rdf:type` dispatch table.
pub const CHARACTERISTIC_TYPES: &[(Characteristic, NamedNodeRef<'static>)] = &[
    (Characteristic::Functional, owl::FUNCTIONAL_PROPERTY),
    (Characteristic::InverseFunctional, owl::INVERSE_FUNCTIONAL_PROPERTY),
    (Characteristic::Symmetric, owl::SYMMETRIC_PROPERTY),
    (Characteristic::Asymmetric, owl::ASYMMETRIC_PROPERTY),
    (Characteristic::Reflexive, owl::REFLEXIVE_PROPERTY),
    (Characteristic::Irreflexive, owl::IRREFLEXIVE_PROPERTY),
    (Characteristic::Transitive, owl::TRANSITIVE_PROPERTY),
];

impl Characteristic {
    pub fn as_str(self) -> &'static str {
        match self {
            Characteristic::Functional => "functional",
            Characteristic::InverseFunctional => "inverseFunctional",
            Characteristic::Symmetric => "symmetric",
            Characteristic::Asymmetric => "asymmetric",
            Characteristic::Reflexive => "reflexive",
            Characteristic::Irreflexive => "irreflexive",
            Characteristic::Transitive => "transitive",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "functional" => Some(Characteristic::Functional),
            "inverseFunctional" => Some(Characteristic::InverseFunctional),
            "symmetric" => Some(Characteristic::Symmetric),
            "asymmetric" => Some(Characteristic::Asymmetric),
            "reflexive" => Some(Characteristic::Reflexive),
            "irreflexive" => Some(Characteristic::Irreflexive),
            "transitive" => Some(Characteristic::Transitive),
            _ => None,
        }
    }

    pub fn type_iri(self) -> NamedNodeRef<'static> {
        match self {
            Characteristic::Functional => owl::FUNCTIONAL_PROPERTY,
            Characteristic::InverseFunctional => owl::INVERSE_FUNCTIONAL_PROPERTY,
            Characteristic::Symmetric => owl::SYMMETRIC_PROPERTY,
            Characteristic::Asymmetric => owl::ASYMMETRIC_PROPERTY,
            Characteristic::Reflexive => owl::REFLEXIVE_PROPERTY,
            Characteristic::Irreflexive => owl::IRREFLEXIVE_PROPERTY,
            Characteristic::Transitive => owl::TRANSITIVE_PROPERTY,
        }
    }

    pub fn from_type_iri(iri: &str) -> Option<Self> {
        CHARACTERISTIC_TYPES
            .iter()
            .find(|(_, t)| t.as_str() == iri)
            .map(|(c, _)| *c)
    }
}

// =============================================================================
// Axiom facts
// =============================================================================

/// One self-contained unit of entity metadata, produced by the
/// decomposer and consumed by the row mapper. Literal-valued facts carry
/// the encoded cell form (`text`, `text@lang`, or `text^^datatype`);
/// IRI-valued facts carry the rendered CURIE or full IRI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxiomFact {
    Label(String),
    Definition(String),
    Comment(String),
    Example(String),
    Source(String),
    Deprecated { replaced_by: Option<String> },
    SubclassOf(String),
    EquivalentTo(String),
    DisjointWith(String),
    Restriction(RestrictionFact),
    Domain(String),
    Range(String),
    Characteristic(Characteristic),
    InverseOf(String),
    Alignment(String),
    Annotation { predicate: String, value: String },
}

/// One extracted entity: rendered identifier, full IRI, and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub iri: oxigraph::model::NamedNode,
    pub kind: EntityKind,
}
