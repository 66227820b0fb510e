//! The conversion pipeline: read the export, map it, render it, write it.

use std::path::PathBuf;

use tracing::info;

use crate::directory::{map_records, FieldName, MappedUsers, TabularReader};
use crate::errors::CoreError;
use crate::tfvars;

/// Everything a single conversion needs.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub variable: String,
    pub delimiter: u8,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from("users.csv"),
            output: PathBuf::from("variables.auto.tfvars"),
            variable: tfvars::DEFAULT_VARIABLE.into(),
            delimiter: b',',
        }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Data rows read, excluding the header.
    pub rows: usize,
    /// Entries in the written mapping.
    pub users: usize,
    /// Logins that appeared more than once (one entry per overwrite).
    pub duplicates: Vec<String>,
    pub ignored_columns: Vec<String>,
    /// Recognized attributes with no column in the export.
    pub missing_fields: Vec<FieldName>,
}

/// Runs the CSV to variables-file conversion.
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Read and map the input without rendering it.
    pub fn load(&self) -> Result<(usize, MappedUsers), CoreError> {
        let table = TabularReader::new()
            .with_delimiter(self.options.delimiter)
            .read_path(&self.options.input)?;
        let rows = table.rows.len();
        Ok((rows, map_records(&table)))
    }

    /// Produce the variables file contents without touching the output path.
    pub fn preview(&self) -> Result<String, CoreError> {
        let (_, mapped) = self.load()?;
        Ok(tfvars::render(&self.options.variable, &mapped.users)?)
    }

    /// Convert the input and replace the output file.
    ///
    /// The output is fully rendered before anything is written, and is then
    /// written atomically; on any error the existing output is left as it was.
    pub fn run(&self) -> Result<ConversionSummary, CoreError> {
        let (rows, mapped) = self.load()?;
        let contents = tfvars::render(&self.options.variable, &mapped.users)?;
        tfvars::write_atomic(&self.options.output, &contents)?;

        info!(
            input = %self.options.input.display(),
            output = %self.options.output.display(),
            users = mapped.users.len(),
            "conversion complete"
        );

        Ok(ConversionSummary {
            input: self.options.input.clone(),
            output: self.options.output.clone(),
            rows,
            users: mapped.users.len(),
            duplicates: mapped.duplicates,
            ignored_columns: mapped.ignored_columns,
            missing_fields: mapped.missing_fields,
        })
    }
}
