//! targetmap - Overlap resolution for build targets

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = targetmap::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
