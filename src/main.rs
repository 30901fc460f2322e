//! fabrik - Local-first MRP for small workshops

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = fabrik_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
