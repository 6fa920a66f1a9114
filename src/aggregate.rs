use std::collections::BTreeMap;
use std::io::BufRead;

use tracing::trace;

use crate::classify::{Classification, Classifier};
use crate::models::domain::{FlowRecord, FlowStats, ServiceKey};
use crate::models::dto::RunTotals;
use crate::parser::parse_flow_line;
use crate::services::ServiceDirectory;

/// Per-service counters for one run.
pub struct Aggregator<'a> {
    classifier: Classifier<'a>,
    services: BTreeMap<String, FlowStats>,
    unrecognized: BTreeMap<ServiceKey, FlowStats>,
    totals: RunTotals,
}

impl<'a> Aggregator<'a> {
    pub fn new(directory: &'a ServiceDirectory) -> Self {
        Aggregator {
            classifier: Classifier::new(directory),
            services: BTreeMap::new(),
            unrecognized: BTreeMap::new(),
            totals: RunTotals::default(),
        }
    }

    pub fn ingest(&mut self, record: &FlowRecord) {
        let (key, class) = self
            .classifier
            .classify(&record.protocol, record.src_port, record.dst_port);

        self.services
            .entry(class.label().to_string())
            .or_default()
            .add(record.packets, record.bytes);

        if class == Classification::Unrecognized {
            self.unrecognized
                .entry(key)
                .or_default()
                .add(record.packets, record.bytes);
        }

        self.totals.records += 1;
        self.totals.packets = self.totals.packets.saturating_add(record.packets);
        self.totals.bytes = self.totals.bytes.saturating_add(record.bytes);
    }

    /// Parses and ingests one text line. Lines that fail to parse are only
    /// counted: flow exports are noisy and a message per line is useless.
    pub fn ingest_line(&mut self, line: &str) {
        match parse_flow_line(line) {
            None => {}
            Some(Ok(record)) => self.ingest(&record),
            Some(Err(e)) => {
                trace!("dropping flow line ({e}): {line}");
                self.totals.parse_failures += 1;
            }
        }
    }

    /// Only read errors are returned. A line that is not valid UTF-8 counts
    /// as a parse failure like any other malformed record.
    pub fn ingest_reader<R: BufRead>(&mut self, reader: R) -> std::io::Result<()> {
        for line in reader.split(b'\n') {
            let line = line?;
            match std::str::from_utf8(&line) {
                Ok(text) => self.ingest_line(text),
                Err(_) => self.totals.parse_failures += 1,
            }
        }
        Ok(())
    }

    pub fn services(&self) -> &BTreeMap<String, FlowStats> {
        &self.services
    }

    pub fn unrecognized(&self) -> &BTreeMap<ServiceKey, FlowStats> {
        &self.unrecognized
    }

    pub fn totals(&self) -> &RunTotals {
        &self.totals
    }
}
