//! `biw` binary entry point.

use std::process::ExitCode;

use broken_image_watch::cli_app::{Cli, run};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("biw: {err}");
            ExitCode::FAILURE
        }
    }
}
