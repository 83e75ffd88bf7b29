use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ExecutionMode, OutputDirMode};

#[derive(Parser)]
#[command(name = "nbexport", about = "Export Jupyter notebooks to DOCX or PDF via Quarto", version)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export a notebook to DOCX
    Docx {
        /// Notebook to export (resolved interactively when omitted)
        notebook: Option<PathBuf>,
        /// Run all cells before exporting, whatever the config says
        #[arg(long, conflicts_with = "no_execute")]
        execute: bool,
        /// Export stored outputs without running cells
        #[arg(long)]
        no_execute: bool,
    },
    /// Export a notebook to PDF
    Pdf {
        /// Notebook to export (resolved interactively when omitted)
        notebook: Option<PathBuf>,
        /// Run all cells before exporting, whatever the config says
        #[arg(long, conflicts_with = "no_execute")]
        execute: bool,
        /// Export stored outputs without running cells
        #[arg(long)]
        no_execute: bool,
    },
    /// Write the nbexport config file
    Init {
        /// Engine executable (empty: look up `quarto` on PATH)
        #[arg(long, default_value = "")]
        engine_path: String,
        /// Where exported files land
        #[arg(long, value_enum, default_value = "same-folder")]
        output_dir: OutputDirMode,
        /// Whether cells run before exporting
        #[arg(long, value_enum, default_value = "prompt")]
        execution: ExecutionMode,
        /// Style-reference document for DOCX (empty: bundled default)
        #[arg(long, default_value = "")]
        reference_doc: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
        /// Print config path and exit
        #[arg(long)]
        show_path: bool,
    },
    /// Check the engine installation and current configuration
    Doctor,
}
