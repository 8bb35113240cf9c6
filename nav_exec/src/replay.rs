//! # IMU log replay
//!
//! Reads recorded linear acceleration samples from a CSV file with the header
//! `t_ns,ax,ay,az`, in the order the IMU driver produced them. Rows with a
//! `t_ns` of zero are placeholder readings and are passed through as samples
//! with no timestamp.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs::File, io::Read, path::Path};

use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};
use serde::Deserialize;

use crate::accel_integ::Acceleration;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Iterator over the samples of a recorded IMU log.
pub struct SampleReader<R: Read> {
    rows: DeserializeRecordsIntoIter<R, SampleRow>,
    row_index: usize,
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    t_ns: u64,
    ax: f64,
    ay: f64,
    az: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Could not open the sample log: {0}")]
    OpenError(std::io::Error),

    #[error("Could not read sample row {0}: {1}")]
    RowError(usize, csv::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl SampleReader<File> {
    /// Open a sample log file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(ReplayError::OpenError)?;

        Ok(Self::from_reader(file))
    }
}

impl<R: Read> SampleReader<R> {
    /// Read samples from any reader.
    pub fn from_reader(reader: R) -> Self {
        let rows = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader)
            .into_deserialize();

        Self { rows, row_index: 0 }
    }
}

impl<R: Read> Iterator for SampleReader<R> {
    type Item = Result<Acceleration, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        let index = self.row_index;
        self.row_index += 1;

        Some(
            row.map(|r| Acceleration::new(r.ax, r.ay, r.az, r.t_ns))
                .map_err(|e| ReplayError::RowError(index, e)),
        )
    }
}
