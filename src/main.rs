use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use tracing::error;
use tracing_subscriber::EnvFilter;

use svctop::config::{Cli, Command};
use svctop::{chart, iana};
use svctop::pipeline::{self, FlowSource};

fn main() -> ExitCode {
    dotenv().ok();

    // clap exits with 2 on bad usage; svctop reports every usage error as 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.default_log_filter());

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn execute(cli: &Cli) -> svctop::Result<()> {
    let (services, source, top_n) = match &cli.command {
        Command::Flows {
            services,
            top_n,
            input,
        } => {
            let source = match input {
                Some(path) => FlowSource::File(path.clone()),
                None => FlowSource::Stdin,
            };
            (services, source, *top_n)
        }
        Command::Pcap {
            pcap,
            services,
            top_n,
        } => (services, FlowSource::Capture(pcap.clone()), *top_n),
        Command::ImportIana { source, output } => {
            iana::convert(source, output)?;
            return Ok(());
        }
        Command::Chart { report } => {
            chart::render_report_file(report, &cli.out_dir)?;
            return Ok(());
        }
    };

    let settings = cli.report_settings(top_n, &source);
    pipeline::run(services, &source, &settings)?;
    Ok(())
}
