mod assets;
mod cli;
mod commands;
mod config;
mod engine;
mod frontend;
mod logsink;
mod notebook;
mod paths;
mod render;
mod testutil;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use config::ExecutionMode;
use frontend::DesktopFrontend;
use render::ExportFormat;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };

    match cli.command {
        Command::Docx {
            notebook,
            execute,
            no_execute,
        } => run_export(
            notebook,
            ExportFormat::Docx,
            mode_override(execute, no_execute),
            &config_path,
            cli.json,
        ),
        Command::Pdf {
            notebook,
            execute,
            no_execute,
        } => run_export(
            notebook,
            ExportFormat::Pdf,
            mode_override(execute, no_execute),
            &config_path,
            cli.json,
        ),
        Command::Init {
            engine_path,
            output_dir,
            execution,
            reference_doc,
            force,
            show_path,
        } => {
            if show_path {
                println!("{}", config_path.display());
                return Ok(());
            }

            let inputs = commands::InitInputs {
                engine_path,
                output_dir,
                execution,
                reference_doc,
            };
            let result = commands::cmd_init(inputs, &config_path, force)?;
            output(&result, cli.json, commands::format_init_human)
        }
        Command::Doctor => {
            let config = config::load_config(&config_path)?;
            let result = commands::cmd_doctor(&config, &config_path)?;
            let healthy = result.healthy();
            output(&result, cli.json, commands::format_doctor_human)?;
            if !healthy {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn run_export(
    notebook: Option<PathBuf>,
    format: ExportFormat,
    mode_override: Option<ExecutionMode>,
    config_path: &Path,
    json: bool,
) -> Result<()> {
    let config = config::load_config(config_path)?;
    let mut sink = logsink::LogSink::begin(&logsink::default_log_path()?)?;

    let inputs = commands::ExportInputs {
        notebook,
        format,
        mode_override,
    };
    match commands::cmd_export(inputs, &config, &DesktopFrontend, &mut sink)? {
        Some(result) => output(&result, json, commands::format_export_human),
        // The user backed out of a prompt; end without a word.
        None => Ok(()),
    }
}

fn mode_override(execute: bool, no_execute: bool) -> Option<ExecutionMode> {
    if execute {
        Some(ExecutionMode::Always)
    } else if no_execute {
        Some(ExecutionMode::Never)
    } else {
        None
    }
}

fn output<T: serde::Serialize>(result: &T, json: bool, human_fn: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let text = human_fn(result);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
