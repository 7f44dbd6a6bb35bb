use anyhow::Result;
use clap::Parser;
use coverage_audit::cli;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    if let Err(err) = cli::dispatch(args) {
        // Failures before logging is up have nowhere else to go.
        if !cli::already_logged(&err) {
            eprintln!("error: {:#}", err);
        }
        std::process::exit(1);
    }
    Ok(())
}
