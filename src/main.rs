use anyhow::{anyhow, Context, Result};
use clap::Parser;
use memaccess::cli::{Cli, OutputFormat};
use memaccess::config::{validate_config, Config, ConfigLoader, DEFAULT_CONFIG_FILE};
use memaccess::AttachOptions;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);
    debug!(version = memaccess::VERSION, "memaccess starting");

    match run(&cli, &config) {
        Ok(output) => {
            if let Err(e) = write!(io::stdout(), "{output}") {
                if e.kind() != io::ErrorKind::BrokenPipe {
                    eprintln!("Error writing to stdout: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
                }
                OutputFormat::Text => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let loader = ConfigLoader::new(
        cli.config
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE)),
    );
    // An explicitly named file must exist
    let loaded = if cli.config.is_some() {
        loader.load()
    } else {
        loader.load_or_default()
    };
    let mut config = loaded.with_context(|| format!("loading {}", loader.path().display()))?;

    if let Some(width) = &cli.pointer_width {
        config.target.pointer_width = width.clone();
    }
    if let Some(process) = &cli.process {
        config.target.process = Some(process.clone());
    }
    if let Some(module) = &cli.module {
        config.target.module = Some(module.clone());
    }

    validate_config(&config)?;
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli, config: &Config) -> Result<String> {
    let process = config
        .target
        .process
        .as_deref()
        .ok_or_else(|| anyhow!("no target process: pass --process or set [target].process"))?;
    let module = config.target.module.as_deref().unwrap_or(process);
    let options = config.attach_options()?;

    attach_and_execute(cli, process, module, &options)
}

#[cfg(windows)]
fn attach_and_execute(
    cli: &Cli,
    process: &str,
    module: &str,
    options: &AttachOptions,
) -> Result<String> {
    let session = memaccess::SystemSession::attach_with_config(process, module, options)
        .with_context(|| format!("attaching to {process} ({module})"))?;
    let output = memaccess::cli::execute(&session, &cli.command, cli.format)?;
    session.close();
    Ok(output)
}

#[cfg(not(windows))]
fn attach_and_execute(
    _cli: &Cli,
    _process: &str,
    _module: &str,
    _options: &AttachOptions,
) -> Result<String> {
    Err(memaccess::MemoryError::UnsupportedPlatform.into())
}
