//! Writes census tables to CSV, one row per place per recorded step.

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::census::Census;
use crate::error::EpiError;

/// One line of a census report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CensusRow {
    pub step: usize,
    pub place: String,
    pub population: usize,
    pub infected: usize,
    pub immune: usize,
    pub susceptible: usize,
    pub cured: i64,
}

pub struct CensusReport {
    writer: Writer<File>,
    rows: usize,
}

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path) -> Result<File, EpiError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(EpiError::ReportError(format!(
            "report output files must be CSVs, got {}",
            path.display()
        ))),
    }
}

impl CensusReport {
    /// Creates (or truncates) the report file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::ReportError`] if `path` does not end in `.csv`, or
    /// [`EpiError::IoError`] if the file or its directories cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, EpiError> {
        let file = generate_validate_filepath(path.as_ref())?;
        Ok(CensusReport {
            writer: Writer::from_writer(file),
            rows: 0,
        })
    }

    /// Appends one row per place and flushes.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if a row cannot be serialized or written.
    pub fn record(&mut self, census: &Census) -> Result<(), EpiError> {
        for (place, counts) in census.iter() {
            self.writer.serialize(CensusRow {
                step: census.step(),
                place: place.to_string(),
                population: counts.population,
                infected: counts.infected,
                immune: counts.immune,
                susceptible: counts.susceptible,
                cured: counts.cured,
            })?;
            self.rows += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Rows written so far, not counting the header.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }
}
