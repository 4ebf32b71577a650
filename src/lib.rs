pub mod alignment;
pub mod axioms;
pub mod config;
pub mod delimited;
pub mod error;
pub mod extract;
pub mod graph;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod reconstruct;
pub mod report;
pub mod roundtrip;
pub mod rows;
pub mod vocab;

pub use alignment::{AlignmentReport, SchemaTerms, validate_alignments};
pub use config::{CliArgs, CommandPlan, RunConfig};
pub use error::{Defect, DefectKind, TransformError};
pub use graph::{OntologyDocument, PrefixMap, load_turtle, load_turtle_str, serialize_turtle};
pub use logging::{LoggingConfig, init_logging};
pub use model::{AxiomFact, Characteristic, Entity, EntityKind, Quantifier, RestrictionFact};
pub use pipeline::{export_rows, run};
pub use reconstruct::{Reconstruction, reconstruct};
pub use report::RunSummary;
pub use roundtrip::{RoundtripReport, diff_graphs};
pub use rows::{COLUMNS, Row, RowKind, map_rows};
