use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::chart;
use crate::error::{Error, Result};
use crate::models::dto::{JsonReport, RunTotals, UnrecognizedRow};
use crate::report::{self, TopReport};
use crate::services::ServiceDirectory;
use crate::sniff;

/// Where flow records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowSource {
    Stdin,
    File(PathBuf),
    Capture(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub top_n: i64,
    pub top_path: PathBuf,
    pub unrecognized_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub chart_dir: Option<PathBuf>,
    pub print_table: bool,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub top: TopReport,
    pub unrecognized: Vec<UnrecognizedRow>,
    pub totals: RunTotals,
    pub written: Vec<PathBuf>,
}

/// Loads the services file, aggregates every record of `source` and writes
/// the reports described by `settings`.
pub fn run(services: &Path, source: &FlowSource, settings: &ReportSettings) -> Result<Outcome> {
    let directory = ServiceDirectory::load(services)?;
    if directory.is_empty() {
        warn!(path = %services.display(), "service directory is empty, every flow will be Unrecognized");
    }

    let mut aggregator = Aggregator::new(&directory);
    ingest(source, &mut aggregator)?;

    let top = report::build_top_n(aggregator.services(), settings.top_n);
    let unrecognized = report::build_unrecognized(aggregator.unrecognized());
    let totals = aggregator.totals().clone();

    let mut written = Vec::new();
    if !unrecognized.is_empty() {
        report::write_file(&settings.unrecognized_path, |out| {
            report::write_unrecognized_csv(&unrecognized, out)
        })?;
        written.push(settings.unrecognized_path.clone());
    }

    report::write_file(&settings.top_path, |out| report::write_top_csv(&top, out))?;
    written.push(settings.top_path.clone());

    if settings.print_table {
        report::print_top(&top, io::stdout().lock())?;
    }

    if let Some(path) = &settings.json_path {
        let json = JsonReport {
            top_n: settings.top_n,
            services: top.rows.clone(),
            other: top.other.clone(),
            unrecognized: unrecognized.clone(),
            totals: totals.clone(),
        };
        report::write_file(path, |out| Ok(serde_json::to_writer_pretty(out, &json)?))?;
        written.push(path.clone());
    }

    if let Some(dir) = &settings.chart_dir {
        let rows: Vec<_> = top.all_rows().cloned().collect();
        written.extend(chart::render(&rows, dir)?);
    }

    if totals.parse_failures > 0 {
        warn!(count = totals.parse_failures, "skipped unparseable flow records");
    }
    info!(
        records = totals.records,
        packets = totals.packets,
        bytes = totals.bytes,
        services = aggregator.services().len(),
        unrecognized_keys = unrecognized.len(),
        "processing complete, reports saved to {}",
        display_paths(&written)
    );

    Ok(Outcome {
        top,
        unrecognized,
        totals,
        written,
    })
}

fn ingest(source: &FlowSource, aggregator: &mut Aggregator<'_>) -> Result<()> {
    match source {
        FlowSource::Stdin => aggregator.ingest_reader(io::stdin().lock())?,
        FlowSource::File(path) => {
            let file = File::open(path).map_err(|source| Error::FlowsOpen {
                path: path.clone(),
                source,
            })?;
            aggregator.ingest_reader(BufReader::new(file))?;
        }
        FlowSource::Capture(path) => {
            let summary = sniff::start_reading(path, aggregator)?;
            if summary.undecoded > 0 {
                info!(
                    packets = summary.packets,
                    undecoded = summary.undecoded,
                    "some packets had no recognisable network layer"
                );
            }
        }
    }
    Ok(())
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
