use lcmsplot::Ion;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{
    debug,
    info,
};

use crate::error::CliError;

/// One row of a scan table, one ion per row.
#[derive(Debug, Clone, Copy, Deserialize)]
struct ScanTableRow {
    scan_number: i32,
    ms_level: u8,
    elution_time: f64,
    mz: f64,
    intensity: f64,
    #[serde(default)]
    charge: u8,
}

/// All the ions of a single scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanBlock {
    pub scan_number: i32,
    pub ms_level: u8,
    pub elution_time: f64,
    pub ions: Vec<Ion>,
}

impl ScanBlock {
    fn start(row: &ScanTableRow) -> Self {
        Self {
            scan_number: row.scan_number,
            ms_level: row.ms_level,
            elution_time: row.elution_time,
            ions: vec![Ion::new(row.mz, row.intensity, row.charge)],
        }
    }
}

/// Streams a tab-delimited scan table one scan at a time.
///
/// Consecutive rows sharing a scan number make up a scan, the MS level and
/// elution time are taken from the first row of the group.
pub struct ScanTableReader<R: Read> {
    rows: csv::DeserializeRecordsIntoIter<R, ScanTableRow>,
    pending: Option<ScanTableRow>,
    scans_read: usize,
}

impl ScanTableReader<File> {
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let file = File::open(path).map_err(|e| {
            CliError::DataReading(format!("Unable to open {}: {}", path.display(), e))
        })?;
        info!("Reading scan table from {}", path.display());
        Ok(Self::new(file))
    }
}

impl<R: Read> ScanTableReader<R> {
    pub fn new(reader: R) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self {
            rows: rdr.into_deserialize(),
            pending: None,
            scans_read: 0,
        }
    }

    pub fn scans_read(&self) -> usize {
        self.scans_read
    }

    fn next_row(&mut self) -> Option<Result<ScanTableRow, CliError>> {
        if let Some(row) = self.pending.take() {
            return Some(Ok(row));
        }
        self.rows.next().map(|r| r.map_err(CliError::from))
    }
}

impl<R: Read> Iterator for ScanTableReader<R> {
    type Item = Result<ScanBlock, CliError>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = match self.next_row()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        let mut block = ScanBlock::start(&first);

        loop {
            match self.rows.next() {
                None => break,
                Some(Err(e)) => return Some(Err(CliError::from(e))),
                Some(Ok(row)) => {
                    if row.scan_number != block.scan_number {
                        self.pending = Some(row);
                        break;
                    }
                    block.ions.push(Ion::new(row.mz, row.intensity, row.charge));
                }
            }
        }

        self.scans_read += 1;
        debug!(
            "Read scan {} with {} ions",
            block.scan_number,
            block.ions.len()
        );
        Some(Ok(block))
    }
}
