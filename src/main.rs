// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use tracing_subscriber::EnvFilter;

use spla_flow::config::{load_config, ExpressionFile, LibraryConfig};
use spla_flow::Library;

struct Args {
    config: Option<String>,
    expression: String,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config = None;
    let mut expression = None;
    let mut rest = args.iter().skip(1);

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = rest.next().context("--config needs a file argument")?;
                config = Some(path.clone());
            }
            other if expression.is_none() => expression = Some(other.to_string()),
            other => bail!("Unexpected argument '{}'", other),
        }
    }

    Ok(Args {
        config,
        expression: expression.context("Missing expression file")?,
    })
}

fn init_tracing(config: &LibraryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("Loading library config {}", path))?,
        None => LibraryConfig::default(),
    };
    init_tracing(&config);

    let file = ExpressionFile::load(&args.expression)
        .with_context(|| format!("Loading expression file {}", args.expression))?;
    let mut built = file
        .build()
        .with_context(|| format!("Building expression from {}", args.expression))?;

    let library = Library::new(config).context("Creating library")?;
    library
        .submit(&mut built.expression)
        .with_context(|| format!("Evaluating expression '{}'", built.expression.label()))?;

    println!("{}", serde_json::to_string_pretty(&built.to_json())?);
    Ok(())
}

fn main() {
    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            let program = argv.first().map(String::as_str).unwrap_or("spla-flow");
            eprintln!("Usage: {} [--config <library.yaml|toml>] <expression.yaml>", program);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
