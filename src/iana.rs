//! Conversion of the IANA "Service Name and Transport Protocol Port Number
//! Registry" CSV export into a services file.
//!
//! Only the first three columns are used: service name, port number (or an
//! inclusive `low-high` range) and transport protocol.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::domain::ServiceKey;
use crate::report::write_file;
use crate::services::ServiceDirectory;

const UNNAMED_SERVICE: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows: u64,
    pub skipped: u64,
}

pub fn read_registry<R: Read>(source: R) -> csv::Result<(ServiceDirectory, ImportSummary)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let mut directory = ServiceDirectory::new();
    let mut summary = ImportSummary::default();
    for row in reader.records() {
        let row = row?;
        summary.rows += 1;
        if !import_row(&row, &mut directory) {
            summary.skipped += 1;
        }
    }
    Ok((directory, summary))
}

fn import_row(row: &csv::StringRecord, directory: &mut ServiceDirectory) -> bool {
    if row.len() < 3 {
        return false;
    }
    let service = match row[0].trim() {
        "" => UNNAMED_SERVICE,
        name => name,
    };
    let port = row[1].trim();
    let protocol = row[2].trim().to_uppercase();
    if port.is_empty() || protocol.is_empty() {
        return false;
    }

    let Some((low, high)) = port_range(port) else {
        debug!("skipping malformed port {port:?} for {service}");
        return false;
    };
    for port in low..=high {
        directory.insert(ServiceKey::new(protocol.clone(), port), service.to_string());
    }
    true
}

fn port_range(raw: &str) -> Option<(u16, u16)> {
    match raw.split_once('-') {
        Some((low, high)) => Some((low.trim().parse().ok()?, high.trim().parse().ok()?)),
        None => {
            let port = raw.parse().ok()?;
            Some((port, port))
        }
    }
}

/// Reads the registry at `source_path` and writes a services file to `output`.
pub fn convert(source_path: &Path, output: &Path) -> Result<ImportSummary> {
    let read_error = |source: csv::Error| Error::IanaRead {
        path: source_path.to_path_buf(),
        source,
    };
    let file = File::open(source_path).map_err(|e| read_error(e.into()))?;
    let (directory, summary) = read_registry(file).map_err(read_error)?;

    write_file(output, |out| Ok(directory.write_csv(out)?))?;
    info!(
        rows = summary.rows,
        skipped = summary.skipped,
        entries = directory.len(),
        output = %output.display(),
        "wrote services file"
    );
    Ok(summary)
}
