//! CLI surface and the validated run configuration.
//!
//! `CliArgs` is the raw clap derive; `RunConfig::from_args` turns it
//! into a validated plan and fails fast on missing input files before
//! any work starts.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "dcc-tabular",
    version,
    about = "Export/import the DCC ontology to its tabular curation format"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// DCC schema XSD used to validate dccx_alignment targets.
    #[arg(long, value_name = "FILE", env = "DCC_TABULAR_SCHEMA_XSD")]
    pub schema_xsd: Option<PathBuf>,

    /// Print the run summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export a Turtle ontology to the tabular CSV format.
    Export {
        /// Path to the TTL ontology to export.
        #[arg(long, value_name = "FILE")]
        input_ttl: PathBuf,
        /// Where to write the CSV table.
        #[arg(long, value_name = "FILE")]
        output_csv: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Import a tabular CSV back into a Turtle ontology.
    Import {
        /// Path to the tabular CSV to import.
        #[arg(long, value_name = "FILE")]
        input_csv: PathBuf,
        /// Where to write the reconstructed TTL.
        #[arg(long, value_name = "FILE")]
        output_ttl: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Export, re-import, and report round-trip fidelity.
    Roundtrip {
        /// Path to the TTL ontology to round-trip.
        #[arg(long, value_name = "FILE")]
        input_ttl: PathBuf,
        /// Where to write the intermediate CSV table.
        #[arg(long, value_name = "FILE")]
        output_csv: PathBuf,
        /// Where to write the reconstructed TTL.
        #[arg(long, value_name = "FILE")]
        roundtrip_ttl: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Load an ontology and run the alignment and label checks only.
    Validate {
        /// Path to the TTL ontology to validate.
        #[arg(long, value_name = "FILE")]
        input_ttl: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
}

/// The mode-specific file plan, with required paths made non-optional.
#[derive(Debug, Clone)]
pub enum CommandPlan {
    Export {
        input_ttl: PathBuf,
        output_csv: PathBuf,
    },
    Import {
        input_csv: PathBuf,
        output_ttl: PathBuf,
    },
    Roundtrip {
        input_ttl: PathBuf,
        output_csv: PathBuf,
        roundtrip_ttl: PathBuf,
    },
    Validate {
        input_ttl: PathBuf,
    },
}

impl CommandPlan {
    pub fn mode(&self) -> &'static str {
        match self {
            CommandPlan::Export { .. } => "export",
            CommandPlan::Import { .. } => "import",
            CommandPlan::Roundtrip { .. } => "roundtrip",
            CommandPlan::Validate { .. } => "validate",
        }
    }
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub command: CommandPlan,
    pub schema_xsd: Option<PathBuf>,
    pub json: bool,
}

impl RunConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let (command, common) = match args.command {
            Command::Export {
                input_ttl,
                output_csv,
                common,
            } => (
                CommandPlan::Export {
                    input_ttl,
                    output_csv,
                },
                common,
            ),
            Command::Import {
                input_csv,
                output_ttl,
                common,
            } => (
                CommandPlan::Import {
                    input_csv,
                    output_ttl,
                },
                common,
            ),
            Command::Roundtrip {
                input_ttl,
                output_csv,
                roundtrip_ttl,
                common,
            } => (
                CommandPlan::Roundtrip {
                    input_ttl,
                    output_csv,
                    roundtrip_ttl,
                },
                common,
            ),
            Command::Validate { input_ttl, common } => {
                (CommandPlan::Validate { input_ttl }, common)
            }
        };
        let config = Self {
            command,
            schema_xsd: common.schema_xsd,
            json: common.json,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on unreadable inputs before any stage runs.
    pub fn validate(&self) -> Result<()> {
        let inputs: Vec<&Path> = match &self.command {
            CommandPlan::Export { input_ttl, .. } => vec![input_ttl],
            CommandPlan::Import { input_csv, .. } => vec![input_csv],
            CommandPlan::Roundtrip { input_ttl, .. } => vec![input_ttl],
            CommandPlan::Validate { input_ttl } => vec![input_ttl],
        };
        for path in inputs {
            ensure_readable(path).with_context(|| format!("input file {}", path.display()))?;
        }
        if let Some(schema) = &self.schema_xsd {
            ensure_readable(schema)
                .with_context(|| format!("schema file {}", schema.display()))?;
        }
        Ok(())
    }
}

fn ensure_readable(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("does not exist");
    }
    if !path.is_file() {
        bail!("is not a regular file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_fails_validation() {
        let config = RunConfig {
            command: CommandPlan::Validate {
                input_ttl: PathBuf::from("/nonexistent/ontology.ttl"),
            },
            schema_xsd: None,
            json: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn mode_names_match_subcommands() {
        let plan = CommandPlan::Roundtrip {
            input_ttl: PathBuf::new(),
            output_csv: PathBuf::new(),
            roundtrip_ttl: PathBuf::new(),
        };
        assert_eq!(plan.mode(), "roundtrip");
    }

    #[test]
    fn cli_args_parse_into_a_plan() {
        use clap::Parser;
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let args = CliArgs::parse_from(["dcc-tabular", "validate", "--input-ttl", path, "--json"]);
        let config = RunConfig::from_args(args).unwrap();
        assert!(config.json);
        assert_eq!(config.command.mode(), "validate");
    }
}
