//! Command-line interface implementation for plinth.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for plinth.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "plinth: namespaced templates with inheritance",
    long_about = None
)]
pub struct Args {
    /// Configuration file (JSON or YAML).
    /// Defaults to plinth.json/.yml/.yaml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Register a namespace root, e.g. `-n layouts=./templates/layouts`
    #[arg(
        short,
        long = "namespace",
        value_name = "NAME=DIR",
        value_parser = parse_namespace
    )]
    pub namespaces: Vec<(String, String)>,

    /// Template file extension
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Fail on undefined template variables
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Render a template
    Render {
        /// Template identifier (namespace::path)
        #[arg(value_name = "TEMPLATE")]
        template: String,

        /// Template parameters as a JSON object
        #[arg(short, long, value_name = "JSON")]
        params: Option<String>,

        /// Read template parameters from stdin
        #[arg(short, long)]
        stdin: bool,

        /// Write the output to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print whether a template exists
    Exists {
        #[arg(value_name = "TEMPLATE")]
        template: String,
    },

    /// Print the file a template identifier resolves to
    Resolve {
        #[arg(value_name = "TEMPLATE")]
        template: String,
    },
}

/// Parses a `NAME=DIR` namespace registration.
pub fn parse_namespace(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, root)) if !name.is_empty() && !root.is_empty() && !name.contains(':') => {
            Ok((name.to_string(), root.to_string()))
        }
        _ => Err(format!("expected NAME=DIR with a colon-free NAME, got '{s}'")),
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
