use std::process::ExitCode;

use clap::Parser;
use rastedit::cli::{self, CliArgs};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    rastedit::logging::init(args.verbose);

    match cli::run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
