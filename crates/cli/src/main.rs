//! vecnav CLI: build, query and inspect index files.
//!
//! - `vecnav construct data.npy out.vnav [--metric ip] [--max-edges 32] [--reorder]`
//! - `vecnav query out.vnav queries.npy -k 10 [--ground-truth gt.npy]`
//! - `vecnav info out.vnav`

mod commands;
mod npy;
mod parse;
mod run;

use std::process;

use tracing::Level;

use commands::build_cli;
use parse::matches_to_action;

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(2);
        }
    };

    match run::execute(action) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
