use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{Config, ExecutionMode, OutputDirMode};
use crate::engine;
use crate::frontend::{CellHandling, Frontend};
use crate::logsink::LogSink;
use crate::notebook::resolve_notebook;
use crate::render::{build_plan, finalize_output, ExportFormat, ExportRequest};

pub struct ExportInputs {
    /// Notebook named on the command line, if any.
    pub notebook: Option<PathBuf>,
    pub format: ExportFormat,
    /// Per-run override of the configured execution mode.
    pub mode_override: Option<ExecutionMode>,
}

#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub notebook: PathBuf,
    pub format: ExportFormat,
    pub output: PathBuf,
    pub executed: bool,
}

/// The whole export workflow, input resolution through reveal. `Ok(None)`
/// means the user backed out of a prompt: nothing ran and nothing should be
/// printed.
pub fn cmd_export(
    inputs: ExportInputs,
    config: &Config,
    frontend: &dyn Frontend,
    sink: &mut LogSink,
) -> Result<Option<ExportResult>> {
    let notebook = match resolve_notebook(inputs.notebook, frontend)? {
        Some(path) => path,
        None => return Ok(None),
    };

    let output_dir = match resolve_output_dir(config.output_dir, &notebook, frontend) {
        Some(dir) => dir,
        None => return Ok(None),
    };

    let mode = inputs.mode_override.unwrap_or(config.execution);
    let execute = match decide_execution(mode, frontend) {
        Some(execute) => execute,
        None => return Ok(None),
    };

    let request = ExportRequest {
        notebook: notebook.clone(),
        format: inputs.format,
        output_dir,
        execute,
        reference_doc: config.reference_doc.clone(),
    };
    let plan = build_plan(&request, &config.engine_path)?;

    sink.line(&format!("Export started: {}", notebook.display()));
    sink.line(&format!("Format: {}", inputs.format.label()));
    sink.line(&format!("Run cells: {}", if execute { "yes" } else { "no" }));
    sink.line(&format!("Command: {} {}", plan.program.display(), shell_join(&plan.args)));
    sink.line("");

    let run_result = engine::run(&plan.program, &plan.args, sink);
    plan.discard_metadata();
    let engine_output = run_result?;
    log::debug!(
        "engine exited with {:?} after {} output lines",
        engine_output.code,
        engine_output.lines.len()
    );

    finalize_output(&plan)?;
    sink.line("");
    sink.line(&format!("Exported: {}", plan.expected_output.display()));

    frontend.reveal(&plan.expected_output);

    Ok(Some(ExportResult {
        notebook,
        format: inputs.format,
        output: plan.expected_output.clone(),
        executed: execute,
    }))
}

/// Output directory per the configured policy. `None` means the folder
/// picker was cancelled.
fn resolve_output_dir(
    mode: OutputDirMode,
    notebook: &Path,
    frontend: &dyn Frontend,
) -> Option<PathBuf> {
    let notebook_dir = notebook.parent().unwrap_or(Path::new("."));
    match mode {
        OutputDirMode::SameFolder => Some(notebook_dir.to_path_buf()),
        OutputDirMode::ChooseEachTime => frontend.pick_output_dir(notebook_dir),
    }
}

/// Only `Prompt` needs interaction. `None` aborts the workflow.
fn decide_execution(mode: ExecutionMode, frontend: &dyn Frontend) -> Option<bool> {
    match mode {
        ExecutionMode::Always => Some(true),
        ExecutionMode::Never => Some(false),
        ExecutionMode::Prompt => frontend
            .confirm_execution()
            .map(|choice| choice == CellHandling::RunCells),
    }
}

fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|a| format!("{:?}", a))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_export_human(result: &ExportResult) -> String {
    let name = result
        .output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut lines = Vec::new();
    lines.push(format!("Exported: {}", name));
    lines.push(format!("  Format: {}", result.format.label()));
    lines.push(format!("  Output: {}", result.output.display()));
    lines.push(format!(
        "  Cells: {}",
        if result.executed { "re-run before export" } else { "stored outputs" }
    ));
    lines.join("\n")
}
