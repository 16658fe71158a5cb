//! pdfdesk CLI entry point.

use clap::Parser;
use pdfdesk::cli::{self, Cli, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
