use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Red Zone rule tooling.
///
/// Inspects the field catalog, validates rule documents and evaluates
/// customer records against the loaded rule set.
#[derive(Parser, Debug)]
#[command(name = "redzone", about = "Red Zone customer-health rule engine")]
pub struct CliArgs {
    /// Configuration profile (`PROD` reads `PROD_RULES_DIR` before `RULES_DIR`, ...)
    #[arg(long, global = true, env = "REDZONE_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved field catalog as JSON
    Fields {
        /// FieldCatalog document (default: CATALOG_PATH)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Load and validate every rule document
    Validate {
        /// Rules directory (default: RULES_DIR)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Also check fields against this FieldCatalog document
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Print the most severe matching rule for one record
    Evaluate {
        #[arg(long)]
        rules: Option<PathBuf>,

        /// JSON file holding a single record object
        #[arg(long)]
        record: PathBuf,

        /// Print every matching rule instead of the most severe one
        #[arg(long)]
        all: bool,
    },

    /// Evaluate a batch of records and print the scan report
    Scan {
        #[arg(long)]
        rules: Option<PathBuf>,

        /// JSON file holding an array of `{customer_id, record}`
        #[arg(long)]
        records: PathBuf,

        /// Worker threads (default: SCAN_THREADS, 0 = one per core)
        #[arg(long)]
        threads: Option<usize>,

        /// Append the audit log entries to the output
        #[arg(long)]
        audit: bool,
    },
}
