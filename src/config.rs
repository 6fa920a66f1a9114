use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::pipeline::{FlowSource, ReportSettings};

#[derive(Debug, Parser)]
#[command(name = "svctop", version, about = "Rank network traffic by service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory the report files are written to
    #[arg(long, global = true, env = "SVCTOP_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Also write the full report as JSON to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Also draw packet and byte donut charts (SVG) into this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub charts: Option<PathBuf>,

    /// Do not print the report table; only warnings and errors are logged
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Aggregate `protocol,src_port,dst_port,packets,bytes` lines
    Flows {
        /// `protocol,port,service_name` lookup file
        services: PathBuf,
        /// Number of services listed individually
        #[arg(allow_negative_numbers = true)]
        top_n: i64,
        /// Read flows from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Aggregate the packets of a pcap or pcapng file
    Pcap {
        pcap: PathBuf,
        services: PathBuf,
        #[arg(allow_negative_numbers = true)]
        top_n: i64,
    },
    /// Build a services file from the IANA port number registry CSV
    ImportIana { source: PathBuf, output: PathBuf },
    /// Draw the donut charts for an existing top services report into --out-dir
    Chart { report: PathBuf },
}

impl Cli {
    pub fn default_log_filter(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    pub fn report_settings(&self, top_n: i64, source: &FlowSource) -> ReportSettings {
        let (top_file, unrecognized_file) = match source {
            FlowSource::Capture(_) => ("Top-Services_pcap.txt", "unrecognized_pcap.txt"),
            FlowSource::Stdin | FlowSource::File(_) => ("Top-Services.txt", "unrecognized.txt"),
        };
        ReportSettings {
            top_n,
            top_path: self.out_dir.join(top_file),
            unrecognized_path: self.out_dir.join(unrecognized_file),
            json_path: self.json.clone(),
            chart_dir: self.charts.clone(),
            print_table: !self.quiet,
        }
    }
}
