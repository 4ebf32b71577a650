//! Mode drivers: export, import, roundtrip, validate.
//!
//! Each mode is one synchronous pass with whole-file reads and writes at
//! the boundary. The stages themselves are pure functions over immutable
//! inputs, so a library consumer can run them across independent
//! ontology files in parallel.

use std::fs;
use std::path::Path;

use crate::alignment::{SchemaTerms, label_language_report, validate_alignments};
use crate::axioms::decompose;
use crate::config::{CommandPlan, RunConfig};
use crate::delimited::{read_rows, write_rows};
use crate::error::{Defect, TransformError};
use crate::extract::extract_entities;
use crate::graph::{OntologyDocument, PrefixMap, load_turtle, serialize_turtle};
use crate::reconstruct::reconstruct;
use crate::report::RunSummary;
use crate::roundtrip::{RoundtripReport, diff_graphs};
use crate::rows::{Row, map_rows};

/// Run the export stages in memory: extract, decompose, map. Returns
/// the rows, the recorded defects, and the entity count.
pub fn export_rows(doc: &OntologyDocument) -> (Vec<Row>, Vec<Defect>, usize) {
    let (entities, mut defects) = extract_entities(doc, None);
    let mut rows = Vec::new();
    for entity in &entities {
        let decomposition = decompose(doc, entity);
        defects.extend(decomposition.defects);
        rows.extend(map_rows(entity, &decomposition.facts));
    }
    (rows, defects, entities.len())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), TransformError> {
    fs::write(path, bytes).map_err(|source| TransformError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn read_input(path: &Path) -> Result<String, TransformError> {
    fs::read_to_string(path).map_err(|source| TransformError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Dispatch one run. Fatal conditions surface as an error; everything
/// else lands in the summary.
pub fn run(config: &RunConfig) -> Result<RunSummary, TransformError> {
    let schema = config
        .schema_xsd
        .as_deref()
        .map(SchemaTerms::from_xsd_file)
        .transpose()?;
    let schema = schema.as_ref();
    match &config.command {
        CommandPlan::Export {
            input_ttl,
            output_csv,
        } => run_export(input_ttl, output_csv, schema),
        CommandPlan::Import {
            input_csv,
            output_ttl,
        } => run_import(input_csv, output_ttl, schema),
        CommandPlan::Roundtrip {
            input_ttl,
            output_csv,
            roundtrip_ttl,
        } => run_roundtrip(input_ttl, output_csv, roundtrip_ttl, schema),
        CommandPlan::Validate { input_ttl } => run_validate(input_ttl, schema),
    }
}

fn run_export(
    input: &Path,
    output: &Path,
    schema: Option<&SchemaTerms>,
) -> Result<RunSummary, TransformError> {
    let doc = load_turtle(input)?;
    let (rows, defects, entities) = export_rows(&doc);
    let bytes = write_rows(&rows);
    write_output(output, &bytes)?;
    tracing::info!(
        rows = rows.len(),
        entities,
        input = %input.display(),
        output = %output.display(),
        "exported ontology to tabular format"
    );

    let mut summary = RunSummary::new("export");
    summary.entities = entities;
    summary.rows = rows.len();
    summary.source_triples = Some(doc.graph.len());
    summary.defects = defects;
    if let Some(schema) = schema {
        summary.alignment = Some(validate_alignments(&rows, &doc.prefixes, schema));
    }
    Ok(summary)
}

fn run_import(
    input: &Path,
    output: &Path,
    schema: Option<&SchemaTerms>,
) -> Result<RunSummary, TransformError> {
    let prefixes = PrefixMap::preferred();
    let rows = read_rows(&read_input(input)?)?;
    let reconstruction = reconstruct(&rows, &prefixes)?;
    let turtle = serialize_turtle(&reconstruction.graph, &prefixes)?;
    write_output(output, turtle.as_bytes())?;
    tracing::info!(
        rows = rows.len(),
        triples = reconstruction.graph.len(),
        skipped = reconstruction.skipped,
        output = %output.display(),
        "imported tabular file to ontology"
    );

    let mut summary = RunSummary::new("import");
    summary.entities = reconstruction.entities;
    summary.rows = rows.len();
    summary.output_triples = Some(reconstruction.graph.len());
    summary.defects = reconstruction.defects;
    if let Some(schema) = schema {
        summary.alignment = Some(validate_alignments(&rows, &prefixes, schema));
    }
    Ok(summary)
}

fn run_roundtrip(
    input: &Path,
    csv_path: &Path,
    roundtrip_path: &Path,
    schema: Option<&SchemaTerms>,
) -> Result<RunSummary, TransformError> {
    let doc = load_turtle(input)?;
    let (rows, mut defects, entities) = export_rows(&doc);
    let bytes = write_rows(&rows);
    write_output(csv_path, &bytes)?;

    // Go through the tabular file we just wrote, not the in-memory rows:
    // the fidelity claim covers the CSV layer too.
    let reread = read_rows(&read_input(csv_path)?)?;
    let prefixes = PrefixMap::preferred();
    let reconstruction = reconstruct(&reread, &prefixes)?;
    defects.extend(reconstruction.defects.iter().cloned());
    let turtle = serialize_turtle(&reconstruction.graph, &doc.prefixes)?;
    write_output(roundtrip_path, turtle.as_bytes())?;

    let (lost, invented) = diff_graphs(&doc.graph, &reconstruction.graph);
    if !lost.is_empty() || !invented.is_empty() {
        tracing::warn!(
            lost = lost.len(),
            invented = invented.len(),
            "round-trip drift detected"
        );
    }

    // Second export of the reconstructed graph: determinism check.
    let reconstructed_doc = OntologyDocument {
        graph: reconstruction.graph.clone(),
        prefixes: PrefixMap::preferred(),
    };
    let (rows_again, _, _) = export_rows(&reconstructed_doc);
    let rows_stable = write_rows(&rows_again) == bytes;

    let mut summary = RunSummary::new("roundtrip");
    summary.entities = entities;
    summary.rows = rows.len();
    summary.source_triples = Some(doc.graph.len());
    summary.output_triples = Some(reconstruction.graph.len());
    summary.defects = defects;
    summary.roundtrip = Some(RoundtripReport {
        source_triples: doc.graph.len(),
        rows: rows.len(),
        reconstructed_triples: reconstruction.graph.len(),
        lost,
        invented,
        rows_stable,
    });
    if let Some(schema) = schema {
        summary.alignment = Some(validate_alignments(&rows, &doc.prefixes, schema));
    }
    Ok(summary)
}

fn run_validate(input: &Path, schema: Option<&SchemaTerms>) -> Result<RunSummary, TransformError> {
    let doc = load_turtle(input)?;
    let (rows, defects, entities) = export_rows(&doc);

    let mut summary = RunSummary::new("validate");
    summary.entities = entities;
    summary.rows = rows.len();
    summary.source_triples = Some(doc.graph.len());
    summary.defects = defects;
    summary.labels = Some(label_language_report(&doc));
    match schema {
        Some(schema) => {
            summary.alignment = Some(validate_alignments(&rows, &doc.prefixes, schema));
        }
        None => tracing::info!("no schema provided, skipping alignment checks"),
    }
    Ok(summary)
}
