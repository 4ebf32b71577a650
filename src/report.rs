//! The per-run summary: counts, recorded defects, and the optional
//! alignment / round-trip / label reports, with text and JSON
//! renderings.

use std::fmt::Write as _;

use serde::Serialize;

use crate::alignment::{AlignmentReport, LabelLanguageReport};
use crate::error::Defect;
use crate::roundtrip::RoundtripReport;

/// Structured summary of one run. `--json` prints it verbatim; the text
/// rendering is the human-readable equivalent.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub mode: &'static str,
    pub entities: usize,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_triples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_triples: Option<usize>,
    pub defects: Vec<Defect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roundtrip: Option<RoundtripReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<LabelLanguageReport>,
}

impl RunSummary {
    pub fn new(mode: &'static str) -> Self {
        Self {
            mode,
            entities: 0,
            rows: 0,
            source_triples: None,
            output_triples: None,
            defects: Vec::new(),
            alignment: None,
            roundtrip: None,
            labels: None,
        }
    }

    /// Distinguishes "ran with zero defects" from "ran with N recorded
    /// defects" for the exit status.
    pub fn has_defects(&self) -> bool {
        !self.defects.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} summary:", self.mode);
        let _ = writeln!(out, "  Entities:             {}", self.entities);
        let _ = writeln!(out, "  Rows:                 {}", self.rows);
        if let Some(count) = self.source_triples {
            let _ = writeln!(out, "  Source triples:       {count}");
        }
        if let Some(count) = self.output_triples {
            let _ = writeln!(out, "  Output triples:       {count}");
        }

        if let Some(roundtrip) = &self.roundtrip {
            let _ = writeln!(out, "  Round-trip:");
            let _ = writeln!(out, "    Reconstructed triples: {}", roundtrip.reconstructed_triples);
            let _ = writeln!(out, "    Lost triples:          {}", roundtrip.lost.len());
            for triple in &roundtrip.lost {
                let _ = writeln!(out, "      - {triple}");
            }
            let _ = writeln!(out, "    Invented triples:      {}", roundtrip.invented.len());
            for triple in &roundtrip.invented {
                let _ = writeln!(out, "      - {triple}");
            }
            let _ = writeln!(out, "    Rows stable:           {}", roundtrip.rows_stable);
            let _ = writeln!(out, "    Graphs identical:      {}", roundtrip.identical());
        }

        if let Some(alignment) = &self.alignment {
            let _ = writeln!(out, "  Schema alignment:");
            let _ = writeln!(
                out,
                "    In schema namespace:   {}/{}",
                alignment.resolved, alignment.total
            );
            let _ = writeln!(out, "    Unresolved targets:    {}", alignment.unresolved);
            for example in &alignment.unresolved_examples {
                let _ = writeln!(out, "      - {example}");
            }
            let _ = writeln!(
                out,
                "    Schema names without alignment: {}",
                alignment.schema_without_alignment
            );
            for example in &alignment.schema_without_examples {
                let _ = writeln!(out, "      - {example}");
            }
            for (entity_type, coverage) in &alignment.per_type {
                let _ = writeln!(
                    out,
                    "    {entity_type}: {}/{} targets in schema",
                    coverage.resolved, coverage.total
                );
            }
        }

        if let Some(labels) = &self.labels {
            let _ = writeln!(out, "  Label languages:");
            let _ = writeln!(out, "    Entities with labels:  {}", labels.entities_with_labels);
            let _ = writeln!(
                out,
                "    Missing English label: {}",
                labels.missing_english.len()
            );
            for example in &labels.missing_english {
                let _ = writeln!(out, "      - {example}");
            }
            let _ = writeln!(
                out,
                "    Non-English preferred: {}",
                labels.non_english_preferred.len()
            );
            for example in &labels.non_english_preferred {
                let _ = writeln!(out, "      - {example}");
            }
        }

        let _ = writeln!(out, "  Defects:              {}", self.defects.len());
        for defect in &self.defects {
            let _ = writeln!(out, "    - {defect}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Defect;

    #[test]
    fn text_rendering_lists_defects() {
        let mut summary = RunSummary::new("export");
        summary.entities = 3;
        summary.rows = 5;
        summary
            .defects
            .push(Defect::malformed_restriction("dcc:Sensor", "missing owl:onProperty"));
        let text = summary.render_text();
        assert!(text.contains("export summary:"));
        assert!(text.contains("Defects:              1"));
        assert!(text.contains("missing owl:onProperty"));
        assert!(summary.has_defects());
    }

    #[test]
    fn json_rendering_is_machine_readable() {
        let summary = RunSummary::new("import");
        let value: serde_json::Value = serde_json::from_str(&summary.to_json()).unwrap();
        assert_eq!(value["mode"], "import");
        assert_eq!(value["defects"], serde_json::json!([]));
    }
}
