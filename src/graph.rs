//! Graph loading and the cell-level codecs.
//!
//! - Turtle parsing into an in-memory [`Graph`] via the oxigraph store
//! - `@prefix` scanning into a prefix→namespace table
//! - CURIE rendering/expansion against the closed preferred table
//! - the literal cell convention (`text`, `text@lang`, `text^^datatype`)
//! - deterministic Turtle serialization

use std::fs;
use std::path::Path;

use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{
    BlankNode, Graph, GraphNameRef, Literal, LiteralRef, NamedNode, Term, TermRef, Triple,
};
use oxigraph::model::vocab::xsd;
use oxigraph::store::Store;

use crate::error::TransformError;
use crate::vocab::PREFERRED_PREFIXES;

// =============================================================================
// Prefix table
// =============================================================================

/// Prefix→namespace table.
///
/// Cell rendering and expansion use only the closed preferred table, so
/// a CSV remains importable on its own. Prefixes scanned from an input
/// document are kept separately and only prettify serialized Turtle.
#[derive(Debug, Clone)]
pub struct PrefixMap {
    cell: Vec<(String, String)>,
    document: Vec<(String, String)>,
}

impl PrefixMap {
    /// The canonical table of `vocab::PREFERRED_PREFIXES`.
    pub fn preferred() -> Self {
        Self {
            cell: PREFERRED_PREFIXES
                .iter()
                .map(|(p, ns)| (p.to_string(), ns.to_string()))
                .collect(),
            document: Vec::new(),
        }
    }

    /// Register prefixes declared by an input document. Names already in
    /// the preferred table keep their canonical namespace.
    pub fn register_document_prefixes(&mut self, scanned: impl IntoIterator<Item = (String, String)>) {
        for (prefix, namespace) in scanned {
            if self.cell.iter().any(|(p, _)| *p == prefix) {
                continue;
            }
            match self.document.iter_mut().find(|(p, _)| *p == prefix) {
                Some(entry) => entry.1 = namespace,
                None => self.document.push((prefix, namespace)),
            }
        }
    }

    /// Render an IRI as a CURIE when a preferred namespace covers it,
    /// otherwise return the full IRI. Compaction is skipped when the
    /// local part would be ambiguous (empty, or containing `/`, `#`,
    /// `:`, or whitespace).
    pub fn compact(&self, iri: &str) -> String {
        let mut best: Option<(&str, &str)> = None;
        for (prefix, namespace) in &self.cell {
            if iri.starts_with(namespace.as_str())
                && best.is_none_or(|(_, ns)| namespace.len() > ns.len())
            {
                best = Some((prefix, namespace));
            }
        }
        if let Some((prefix, namespace)) = best {
            let local = &iri[namespace.len()..];
            if !local.is_empty()
                && !local.contains(['/', '#', ':'])
                && !local.chars().any(char::is_whitespace)
            {
                return format!("{prefix}:{local}");
            }
        }
        iri.to_string()
    }

    /// Expand a cell to a full IRI: `<iri>`, an absolute IRI, or a CURIE
    /// over the preferred table. Returns `None` for anything else.
    pub fn expand(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() || text.chars().any(char::is_whitespace) {
            return None;
        }
        if let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return Some(inner.to_string());
        }
        if text.contains("://") {
            return Some(text.to_string());
        }
        let (prefix, local) = text.split_once(':')?;
        self.cell
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, namespace)| format!("{namespace}{local}"))
    }

    /// [`Self::expand`] plus IRI validation.
    pub fn expand_node(&self, text: &str) -> Option<NamedNode> {
        NamedNode::new(self.expand(text)?).ok()
    }

    /// Parse a cell that may denote any RDF term usable as an object:
    /// blank node label, bracketed or absolute IRI, or CURIE. Returns
    /// `None` when the cell should be read as a literal instead.
    pub fn parse_term_cell(&self, text: &str) -> Option<Term> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(id) = text.strip_prefix("_:") {
            return BlankNode::new(id).ok().map(Term::from);
        }
        if text.contains('@') || text.contains("^^") {
            return None;
        }
        self.expand_node(text).map(Term::from)
    }

    /// Entries for the Turtle serializer: the preferred table plus any
    /// document-declared extras.
    pub fn serializer_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cell
            .iter()
            .chain(self.document.iter())
            .map(|(p, ns)| (p.as_str(), ns.as_str()))
    }
}

// =============================================================================
// Literal cells
// =============================================================================

fn is_language_tag(text: &str) -> bool {
    !text.is_empty()
        && text.starts_with(|c: char| c.is_ascii_alphabetic())
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Encode a literal for a cell: `text@lang`, `text^^datatype`, or bare
/// text. A plain literal whose text would itself decode as tagged or
/// typed is pinned with an explicit `^^xsd:string` so decoding stays
/// exact.
pub fn encode_literal(literal: LiteralRef<'_>, prefixes: &PrefixMap) -> String {
    if let Some(language) = literal.language() {
        return format!("{}@{}", literal.value(), language);
    }
    let datatype = literal.datatype();
    if datatype != xsd::STRING {
        return format!("{}^^{}", literal.value(), prefixes.compact(datatype.as_str()));
    }
    let value = literal.value();
    let ambiguous = value
        .rsplit_once('@')
        .is_some_and(|(_, tag)| is_language_tag(tag))
        || value
            .rsplit_once("^^")
            .is_some_and(|(_, dt)| prefixes.expand(dt).is_some());
    if ambiguous {
        format!("{value}^^xsd:string")
    } else {
        value.to_string()
    }
}

/// Decode a literal cell. The inverse of [`encode_literal`]; text that
/// matches neither marker is a simple literal.
pub fn parse_literal_cell(text: &str, prefixes: &PrefixMap) -> Literal {
    if let Some((lexical, datatype)) = text.rsplit_once("^^") {
        if let Some(node) = prefixes.expand_node(datatype) {
            if node.as_ref() == xsd::STRING {
                return Literal::new_simple_literal(lexical);
            }
            return Literal::new_typed_literal(lexical, node);
        }
    }
    if let Some((lexical, tag)) = text.rsplit_once('@') {
        if is_language_tag(tag) {
            if let Ok(literal) = Literal::new_language_tagged_literal(lexical, tag.to_lowercase()) {
                return literal;
            }
        }
    }
    Literal::new_simple_literal(text)
}

/// Render any term as a cell value.
pub fn render_term(term: TermRef<'_>, prefixes: &PrefixMap) -> String {
    match term {
        TermRef::NamedNode(node) => prefixes.compact(node.as_str()),
        TermRef::BlankNode(node) => format!("_:{}", node.as_str()),
        TermRef::Literal(literal) => encode_literal(literal, prefixes),
        _ => term.to_string(),
    }
}

// =============================================================================
// Loading
// =============================================================================

/// An ontology document: the triple set plus the prefix table resolved
/// from its declarations.
#[derive(Debug, Clone)]
pub struct OntologyDocument {
    pub graph: Graph,
    pub prefixes: PrefixMap,
}

/// Scan `@prefix` / `PREFIX` declarations without a full reparse. The
/// parser has already validated the syntax; this only recovers the
/// prefix table the store API does not expose.
fn scan_prefixes(content: &str) -> Vec<(String, String)> {
    let mut found = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        let rest = if let Some(rest) = trimmed.strip_prefix("@prefix") {
            rest
        } else if trimmed.get(..6).is_some_and(|s| s.eq_ignore_ascii_case("prefix")) {
            &trimmed[6..]
        } else {
            continue;
        };
        let rest = rest.trim_start();
        let Some((name, rest)) = rest.split_once(':') else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(start) = rest.find('<') else { continue };
        let Some(end) = rest[start + 1..].find('>') else {
            continue;
        };
        let namespace = &rest[start + 1..start + 1 + end];
        found.push((name.trim().to_string(), namespace.to_string()));
    }
    found
}

/// Parse a Turtle document into an [`OntologyDocument`].
pub fn load_turtle_str(content: &str, origin: &str) -> Result<OntologyDocument, TransformError> {
    let parse_error = |message: String| TransformError::Parse {
        path: origin.to_string(),
        message,
    };
    let store = Store::new().map_err(|e| parse_error(e.to_string()))?;
    store
        .load_from_reader(RdfFormat::Turtle, content.as_bytes())
        .map_err(|e| parse_error(e.to_string()))?;

    let mut graph = Graph::new();
    for quad in store.iter() {
        let quad = quad.map_err(|e| parse_error(e.to_string()))?;
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
    }

    let mut prefixes = PrefixMap::preferred();
    prefixes.register_document_prefixes(scan_prefixes(content));
    Ok(OntologyDocument { graph, prefixes })
}

/// Read and parse a Turtle file.
pub fn load_turtle(path: &Path) -> Result<OntologyDocument, TransformError> {
    let content = fs::read_to_string(path).map_err(|source| TransformError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_turtle_str(&content, &path.display().to_string())
}

// =============================================================================
// Serialization
// =============================================================================

/// Serialize a graph as Turtle with the table's prefix declarations.
/// Triples are emitted in sorted order so repeated serialization of an
/// unchanged graph is byte-identical.
pub fn serialize_turtle(graph: &Graph, prefixes: &PrefixMap) -> Result<String, TransformError> {
    let serialize_error = |message: String| TransformError::Serialize(message);

    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
    for (prefix, namespace) in prefixes.serializer_entries() {
        serializer = serializer
            .with_prefix(prefix, namespace)
            .map_err(|e| serialize_error(e.to_string()))?;
    }

    let mut triples: Vec<Triple> = graph.iter().map(|t| t.into_owned()).collect();
    triples.sort_by_cached_key(|t| {
        (
            t.subject.to_string(),
            t.predicate.to_string(),
            t.object.to_string(),
        )
    });

    let mut writer = serializer.for_writer(Vec::new());
    for triple in &triples {
        writer
            .serialize_quad(triple.as_ref().in_graph(GraphNameRef::DefaultGraph))
            .map_err(|e| serialize_error(e.to_string()))?;
    }
    let bytes = writer.finish().map_err(|e| serialize_error(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| serialize_error(e.to_string()))
}
