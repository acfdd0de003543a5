//! OpenAPI Inspect - command-line front end of the generator.
//!
//! # Usage
//!
//! ```bash
//! openapi-inspect [OPTIONS] <INPUT>...
//! ```
//!
//! # Examples
//!
//! Generate a Swagger 2.0 YAML document from a directory of descriptors:
//! ```bash
//! openapi-inspect ./api -o swagger.yaml
//! ```
//!
//! Generate OpenAPI 3.0 JSON with custom settings:
//! ```bash
//! openapi-inspect ./api -d openapi3 -f json -s settings.yaml -o openapi.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_inspect::cli;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can configure the logger
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI Inspect starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Document generation completed successfully");

    Ok(())
}
