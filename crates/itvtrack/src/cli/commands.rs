//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::InspectionForm;

/// Vehicle and inspection fields shared by `add` and `edit`.
#[derive(Debug, Clone, Default, Args)]
pub struct RecordArgs {
    /// Manufacturer, e.g. "Seat"
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Model name, e.g. "Ibiza"
    #[arg(short, long)]
    pub model: Option<String>,

    /// Year of first registration
    #[arg(short, long)]
    pub year: Option<String>,

    /// License plate
    #[arg(short, long)]
    pub license: Option<String>,

    /// Date of the last workshop inspection (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub inspection_date: Option<String>,

    /// Date of the last passed ITV (YYYY-MM-DD)
    #[arg(short, long, value_name = "DATE")]
    pub itv_date: Option<String>,

    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

impl RecordArgs {
    /// Overwrite the fields of `form` that were given on the command line.
    ///
    /// An empty value clears the field.
    #[must_use]
    pub fn apply_to(&self, mut form: InspectionForm) -> InspectionForm {
        let fields = [
            (&self.brand, &mut form.vehicle_brand),
            (&self.model, &mut form.vehicle_model),
            (&self.year, &mut form.registration_year),
            (&self.license, &mut form.vehicle_license),
            (&self.inspection_date, &mut form.inspection_date),
            (&self.itv_date, &mut form.itv_date),
            (&self.notes, &mut form.notes),
        ];
        for (arg, field) in fields {
            if let Some(value) = arg {
                field.clone_from(value);
            }
        }
        form
    }

    /// Build a fresh form from the given fields.
    #[must_use]
    pub fn to_form(&self) -> InspectionForm {
        self.apply_to(InspectionForm::default())
    }
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Record fields
    #[command(flatten)]
    pub record: RecordArgs,
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Identifier of the record to edit
    pub id: String,

    /// Fields to change
    #[command(flatten)]
    pub record: RecordArgs,
}

/// Arguments for commands that address one record.
#[derive(Debug, Args)]
pub struct RecordRef {
    /// Record identifier
    pub id: String,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record identifier
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List and upcoming command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One record per line
    Plain,
    /// Aligned columns
    #[default]
    Table,
    /// JSON array
    Json,
}
