//! Errcat Control - CLI over error descriptor catalogs

use clap::Parser;
use errcatctl::cli::Cli;
use errcatctl::errors::EXIT_GENERAL_ERROR;
use errcatctl::{commands, logging, output};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match commands::run(&cli) {
        Ok(code) => code,
        Err(err) => {
            output::display_error(&format!("{:#}", err));
            EXIT_GENERAL_ERROR
        }
    };

    std::process::exit(code);
}
