//! Spring Insight - command-line front end.
//!
//! # Usage
//!
//! ```bash
//! spring-insight [OPTIONS] <COMMAND>
//! ```
//!
//! # Examples
//!
//! Structure report of one file:
//! ```bash
//! spring-insight analyze src/main/java/com/example/UserController.java
//! ```
//!
//! Quality metrics for a whole tree, as JSON:
//! ```bash
//! spring-insight analyze ./my-service --mode quality -f json -o quality.json
//! ```
//!
//! HTML documentation:
//! ```bash
//! spring-insight docs ./my-service --format html --title "My Service" -o docs.html
//! ```
//!
//! Build system and frameworks:
//! ```bash
//! spring-insight detect ./my-service -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use spring_insight::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    // Initialize logger based on verbose flag
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Spring Insight starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Done");

    Ok(())
}
