use anyhow::{bail, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{self, ConfigFile, ExecutionMode, ExportSection, OutputDirMode};
use crate::paths::expand_tilde;

pub struct InitInputs {
    /// Engine executable; empty means bare `quarto` from PATH.
    pub engine_path: String,
    pub output_dir: OutputDirMode,
    pub execution: ExecutionMode,
    /// Style-reference document; empty means the bundled default.
    pub reference_doc: String,
}

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub config_path: PathBuf,
    pub engine_path: String,
    pub output_dir: OutputDirMode,
    pub execution: ExecutionMode,
    pub reference_doc: String,
}

pub fn cmd_init(inputs: InitInputs, config_path: &Path, force: bool) -> Result<InitResult> {
    let reference_doc = inputs.reference_doc.trim().to_string();
    if !reference_doc.is_empty() {
        let path = expand_tilde(&reference_doc);
        if !path.is_file() {
            bail!(
                "reference document not found: {}\n  hint: pass an existing .docx file, or omit --reference-doc to use the bundled default",
                path.display()
            );
        }
    }

    let file = ConfigFile {
        export: ExportSection {
            engine_path: inputs.engine_path.trim().to_string(),
            output_dir: inputs.output_dir,
            execution: Some(inputs.execution),
            execute: None,
            reference_doc: reference_doc.clone(),
        },
    };
    config::write_config_atomic(config_path, &file, force)?;

    Ok(InitResult {
        config_path: config_path.to_path_buf(),
        engine_path: file.export.engine_path,
        output_dir: inputs.output_dir,
        execution: inputs.execution,
        reference_doc,
    })
}

pub fn format_init_human(result: &InitResult) -> String {
    let engine = if result.engine_path.is_empty() {
        format!("{} (from PATH)", config::DEFAULT_ENGINE)
    } else {
        result.engine_path.clone()
    };
    let reference = if result.reference_doc.is_empty() {
        "bundled default".to_string()
    } else {
        result.reference_doc.clone()
    };

    let mut lines = Vec::new();
    lines.push(format!("Config written to {}", result.config_path.display()));
    lines.push(format!("  Engine: {}", engine));
    lines.push(format!("  Output dir: {}", result.output_dir.as_str()));
    lines.push(format!("  Execution: {}", result.execution.as_str()));
    lines.push(format!("  Reference doc: {}", reference));
    lines.join("\n")
}
