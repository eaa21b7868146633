//! plinth's command-line entry point.
//! Builds an engine from the configuration file and command-line overrides,
//! then renders, checks or resolves a single template.

use std::path::Path;

use plinth::{
    cli::{get_args, Args, Command},
    config::{get_config, load_config_file, EngineConfig},
    engine::Engine,
    error::{default_error_handler, Error, Result},
    logger::init_logger,
    parser::{get_params, ParamsSource},
};

/// Main application entry point.
fn main() {
    let args = get_args();

    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Loads the configuration and applies command-line overrides to it.
fn get_engine_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(config_path) => load_config_file(config_path)?,
        None => get_config(std::env::current_dir().map_err(Error::IoError)?)?,
    };

    config.namespaces.extend(args.namespaces.iter().cloned());
    if let Some(extension) = &args.extension {
        config.extension = extension.clone();
    }
    config.strict_undefined |= args.strict;

    Ok(config)
}

fn write_file<P: AsRef<Path>>(content: &str, dest_path: P) -> Result<()> {
    let dest_path = dest_path.as_ref();
    if let Some(parent) = dest_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(Error::IoError)?;
    }
    std::fs::write(dest_path, content).map_err(Error::IoError)
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads the configuration and applies overrides
/// 2. Builds the engine
/// 3. Runs the requested command
fn run(args: Args) -> Result<()> {
    let config = get_engine_config(&args)?;
    log::debug!("Using configuration: {config:?}");
    let engine = Engine::from_config(&config);

    match args.command {
        Command::Render {
            template,
            params,
            stdin,
            output,
        } => {
            let params = get_params(ParamsSource::new(stdin, params))?;
            let content = engine.render(&template, params)?;
            match output {
                Some(output) => {
                    write_file(&content, &output)?;
                    log::info!("Rendered '{}' to '{}'.", template, output.display());
                }
                None => print!("{content}"),
            }
        }
        Command::Exists { template } => {
            println!("{}", engine.exists(&template)?);
        }
        Command::Resolve { template } => {
            println!("{}", engine.resolve_path(&template)?.display());
        }
    }

    Ok(())
}
