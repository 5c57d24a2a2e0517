//! tgen regression harness
//!
//! Exercises a tgen traffic-generator host wired to a router peer: selects
//! the functional/stateful/stateless suites from the command line, sequences
//! the remote daemons around each suite and hands execution to the external
//! test engine.

use clap::Parser;
use tgen_regress::{args::Args, common::logging, runner};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    logging::init(args.log_path.as_deref());

    match runner::run(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
