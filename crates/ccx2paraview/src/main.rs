use std::process::ExitCode;

use ccx_vtk::{ConversionStatus, Converter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod args;

use args::{Args, Command, parse_args};

fn usage() {
    eprintln!(
        "usage: ccx2paraview <input.frd> <vtk|vtu> [--output-dir DIR] [--no-derived] [--json] [--quiet|--verbose]"
    );
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.verbosity.default_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Convert(args)) => args,
        Ok(Command::Help) => {
            usage();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}");
            usage();
            return ExitCode::from(2);
        }
    };
    init_logging(&args);

    let report = match Converter::new(&args.input, args.options.clone()).run() {
        Ok(report) => report,
        Err(err) => {
            error!(input = %args.input.display(), "conversion failed: {err}");
            return ExitCode::from(1);
        }
    };

    if args.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                error!("failed to render report: {err}");
                return ExitCode::from(1);
            }
        }
    } else if report.status != ConversionStatus::EmptyMesh {
        info!(files = report.files.len(), "conversion finished");
    }
    ExitCode::SUCCESS
}
