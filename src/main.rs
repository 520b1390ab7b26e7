use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use json_mapper::serve::{serve, ServeConfig, DEFAULT_BODY_LIMIT, DEFAULT_PORT};
use json_mapper::{
    apply, check_types, fetch_metadata, target_entities, Analyzer, FieldType, MappingRule,
    DEFAULT_MAX_DEPTH,
};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{stdin, BufReader, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Infers field lists from JSON documents and re-shapes them with mapping rules
#[derive(Parser)]
#[command(name = "json-mapper", version, about)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace). RUST_LOG takes
    /// precedence when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// How many nesting levels below the root to describe
    #[arg(long, global = true, env = "JSON_MAPPER_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the entities and fields of a document
    Infer {
        /// Where to read the document from. Dash (hyphen) indicates stdin
        #[arg(default_value = "-")]
        input: String,

        /// Print only the flat field list instead of entities
        #[arg(long)]
        fields: bool,
    },

    /// Check whether a source type can be mapped onto a target type
    Check {
        source_type: String,
        target_type: String,
    },

    /// Apply mapping rules to a document and print the result and warnings
    Apply {
        /// Where to read the document from. Dash (hyphen) indicates stdin
        #[arg(default_value = "-")]
        input: String,

        /// JSON file holding an array of rules
        #[arg(long)]
        rules: PathBuf,
    },

    /// Print the built-in target schema
    Targets,

    /// Fetch a document by URL and print its entities
    Fetch { url: String },

    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "JSON_MAPPER_HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "JSON_MAPPER_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Maximum request body size in bytes
        #[arg(long, env = "JSON_MAPPER_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
        body_limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let analyzer = Analyzer::new(cli.max_depth);

    match cli.command {
        Command::Infer { input, fields } => {
            let document = read_document(&input)?;
            if fields {
                print_json(&analyzer.analyze(&document))
            } else {
                print_json(&analyzer.group_into_entities(&document))
            }
        }
        Command::Check {
            source_type,
            target_type,
        } => print_json(&check_types(
            &FieldType::from(source_type),
            &FieldType::from(target_type),
        )),
        Command::Apply { input, rules } => {
            let document = read_document(&input)?;
            let rules: Vec<MappingRule> = serde_json::from_reader(BufReader::new(
                File::open(&rules).with_context(|| format!("opening {}", rules.display()))?,
            ))
            .with_context(|| format!("parsing rules from {}", rules.display()))?;

            print_json(&apply(&document, &rules))
        }
        Command::Targets => print_json(&target_entities()),
        Command::Fetch { url } => {
            let text = fetch_metadata(&url)?;
            let document: Value = serde_json::from_str(&text)
                .with_context(|| format!("{} did not return valid JSON", url))?;
            print_json(&analyzer.group_into_entities(&document))
        }
        Command::Serve {
            host,
            port,
            body_limit,
        } => {
            let config = ServeConfig {
                host,
                port,
                max_depth: cli.max_depth,
                body_limit,
            };

            tokio::runtime::Runtime::new()?.block_on(serve(config))?;
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_document(input: &str) -> Result<Value> {
    let reader = BufReader::new(match input {
        "-" => Box::new(stdin()) as Box<dyn Read>,
        file => Box::new(File::open(file).with_context(|| format!("opening {}", file))?)
            as Box<dyn Read>,
    });

    let document = serde_json::from_reader(reader).map_err(json_mapper::Error::MalformedInput)?;
    Ok(document)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
