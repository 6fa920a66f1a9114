//! Ranking of the aggregated counters and the report sinks.
//!
//! Rows are ordered by byte count, largest first. The sort is stable over
//! the ordered maps the aggregator keeps, so equal byte counts fall back to
//! ascending service name (or protocol, then port, for unrecognized keys).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::domain::{FlowStats, ServiceKey};
use crate::models::dto::{ServiceRow, UnrecognizedRow};

/// Label of the rollup row.
pub const OTHER: &str = "other";

pub const TOP_HEADER: [&str; 3] = ["Service", "Total Packets", "Total Bytes"];
pub const UNRECOGNIZED_HEADER: [&str; 4] = ["Protocol", "Port", "Packets", "Bytes"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopReport {
    pub top_n: i64,
    pub rows: Vec<ServiceRow>,
    pub other: Option<ServiceRow>,
}

impl TopReport {
    pub fn title(&self) -> String {
        format!("--- Top {} Services Report (by Bytes) ---", self.top_n)
    }

    /// The ranked rows followed by the rollup, if there is one.
    pub fn all_rows(&self) -> impl Iterator<Item = &ServiceRow> {
        self.rows.iter().chain(self.other.iter())
    }
}

fn by_bytes_desc<K>(entries: &mut [(K, FlowStats)]) {
    entries.sort_by(|a, b| b.1.byte_count.cmp(&a.1.byte_count));
}

pub fn build_top_n(stats: &BTreeMap<String, FlowStats>, top_n: i64) -> TopReport {
    let mut ranked: Vec<(&str, FlowStats)> = stats.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    by_bytes_desc(&mut ranked);

    let keep = usize::try_from(top_n.max(0)).unwrap_or(usize::MAX).min(ranked.len());
    let rest = ranked.split_off(keep);

    let mut other = FlowStats::default();
    for (_, s) in &rest {
        other.merge(s);
    }

    TopReport {
        top_n,
        rows: ranked.iter().map(|(name, s)| ServiceRow::new(*name, s)).collect(),
        other: (other.packet_count > 0).then(|| ServiceRow::new(OTHER, &other)),
    }
}

pub fn build_unrecognized(stats: &BTreeMap<ServiceKey, FlowStats>) -> Vec<UnrecognizedRow> {
    let mut ranked: Vec<(&ServiceKey, FlowStats)> = stats.iter().map(|(k, v)| (k, *v)).collect();
    by_bytes_desc(&mut ranked);
    ranked
        .into_iter()
        .map(|(key, s)| UnrecognizedRow::new(key, &s))
        .collect()
}

pub fn write_top_csv<W: Write>(report: &TopReport, mut out: W) -> Result<()> {
    writeln!(out, "{}", report.title())?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(TOP_HEADER)?;
    for row in report.all_rows() {
        writer.write_record([row.service.clone(), row.packets.to_string(), row.bytes.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_unrecognized_csv<W: Write>(rows: &[UnrecognizedRow], out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(UNRECOGNIZED_HEADER)?;
    for row in rows {
        writer.write_record([
            row.protocol.clone(),
            row.port.to_string(),
            row.packets.to_string(),
            row.bytes.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Aligned table for the terminal. Same numbers as the CSV file.
pub fn print_top<W: Write>(report: &TopReport, mut out: W) -> Result<()> {
    let width = report
        .all_rows()
        .map(|r| r.service.len())
        .chain([TOP_HEADER[0].len()])
        .max()
        .unwrap_or(0);

    writeln!(out)?;
    writeln!(out, "{}", report.title())?;
    writeln!(out, "{:<width$}  {:>15}  {:>18}", TOP_HEADER[0], TOP_HEADER[1], TOP_HEADER[2])?;
    for row in report.all_rows() {
        writeln!(out, "{:<width$}  {:>15}  {:>18}", row.service, row.packets, row.bytes)?;
    }
    out.flush()?;
    Ok(())
}

/// Creates `path` and hands a buffered writer to `write`. The file is
/// closed on return whether or not `write` succeeded.
pub fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let output = |source| Error::Output {
        path: path.to_path_buf(),
        source,
    };
    let mut file = BufWriter::new(File::create(path).map_err(output)?);
    write(&mut file)?;
    file.flush().map_err(output)?;
    Ok(())
}
