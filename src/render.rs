use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::assets;
use crate::paths::{exported_file, slashed};

/// Target format of one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    /// Doubles as the file extension and the engine's `--to` value.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Docx => "DOCX",
            ExportFormat::Pdf => "PDF",
        }
    }
}

/// Everything one export needs, fixed before any side effects happen.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub notebook: PathBuf,
    pub format: ExportFormat,
    pub output_dir: PathBuf,
    /// Run all cells before converting.
    pub execute: bool,
    /// Style-reference document for DOCX; `None` means the bundled default.
    pub reference_doc: Option<PathBuf>,
}

/// The engine invocation derived from an [`ExportRequest`].
#[derive(Debug)]
pub struct RenderPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Where the finished file must end up.
    pub expected_output: PathBuf,
    /// Where the engine drops the file when left to its own devices:
    /// next to the notebook.
    pub default_output: PathBuf,
    /// Per-run DOCX metadata file, removed once the engine exits.
    pub metadata_file: Option<PathBuf>,
}

impl RenderPlan {
    /// Remove the per-run metadata file, if any. Best effort; the file is
    /// scratch.
    pub fn discard_metadata(&self) {
        if let Some(path) = &self.metadata_file {
            if let Err(e) = std::fs::remove_file(path) {
                log::debug!("could not remove metadata file {}: {}", path.display(), e);
            }
        }
    }
}

/// Extra document metadata handed to the engine for DOCX runs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct DocxMetadata {
    reference_doc: String,
    highlight_style: String,
    filters: Vec<String>,
}

/// Turn a request into the exact engine invocation. DOCX requests also get
/// a metadata file next to the output; a configured reference document that
/// does not exist fails here, before anything is spawned.
pub fn build_plan(request: &ExportRequest, engine_path: &Path) -> Result<RenderPlan> {
    debug_assert!(
        request.notebook.is_absolute(),
        "notebook path must be absolute by planning time"
    );
    std::fs::create_dir_all(&request.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            request.output_dir.display()
        )
    })?;

    let extension = request.format.extension();
    let expected_output = exported_file(&request.notebook, &request.output_dir, extension);
    let notebook_dir = request.notebook.parent().unwrap_or(Path::new("."));
    let default_output = exported_file(&request.notebook, notebook_dir, extension);

    let mut args = vec![
        "render".to_string(),
        request.notebook.to_string_lossy().into_owned(),
        "--to".to_string(),
        extension.to_string(),
        "--output-dir".to_string(),
        request.output_dir.to_string_lossy().into_owned(),
    ];
    if request.execute {
        args.push("--execute".to_string());
    }

    let metadata_file = match request.format {
        ExportFormat::Docx => {
            let path = write_metadata_file(request)?;
            args.push("--metadata-file".to_string());
            args.push(path.to_string_lossy().into_owned());
            Some(path)
        }
        ExportFormat::Pdf => None,
    };

    Ok(RenderPlan {
        program: engine_path.to_path_buf(),
        args,
        expected_output,
        default_output,
        metadata_file,
    })
}

/// Deterministic per-notebook name inside the output directory. Two
/// simultaneous exports of the same notebook would collide here.
pub fn metadata_file_path(notebook: &Path, output_dir: &Path) -> PathBuf {
    let stem = notebook.file_stem().unwrap_or_default();
    output_dir.join(format!(".{}.nbexport.yml", stem.to_string_lossy()))
}

/// DOCX styling rides in a YAML metadata file: the reference document, a
/// highlight override so code is not colorized, and the filter that strips
/// shaded backgrounds from output cells. Paths are forward-slashed for the
/// engine's YAML parser.
fn write_metadata_file(request: &ExportRequest) -> Result<PathBuf> {
    let reference_doc = match &request.reference_doc {
        Some(path) => {
            if !path.is_file() {
                bail!(
                    "reference document not found: {}\n  hint: fix reference_doc in the config, or clear it to use the bundled default",
                    path.display()
                );
            }
            path.clone()
        }
        None => assets::default_reference_doc()?,
    };
    let filter = assets::output_filter()?;

    let metadata = DocxMetadata {
        reference_doc: slashed(&reference_doc),
        highlight_style: "none".to_string(),
        filters: vec![slashed(&filter)],
    };
    let yaml = serde_yaml::to_string(&metadata).context("failed to serialize DOCX metadata")?;

    let path = metadata_file_path(&request.notebook, &request.output_dir);
    std::fs::write(&path, yaml)
        .with_context(|| format!("failed to write metadata file {}", path.display()))?;
    Ok(path)
}

/// Confirm the engine produced the file where the user asked for it,
/// relocating from the engine's default spot when the two differ. An
/// existing file at the destination is replaced.
pub fn finalize_output(plan: &RenderPlan) -> Result<()> {
    if plan.default_output != plan.expected_output {
        if !plan.default_output.is_file() {
            bail!(
                "export finished but no output was found at {}",
                plan.default_output.display()
            );
        }
        if plan.expected_output.exists() {
            std::fs::remove_file(&plan.expected_output).with_context(|| {
                format!("failed to replace {}", plan.expected_output.display())
            })?;
        }
        move_file(&plan.default_output, &plan.expected_output)?;
    }

    if !plan.expected_output.is_file() {
        bail!(
            "export failed: output file not found at {}",
            plan.expected_output.display()
        );
    }
    Ok(())
}

/// Rename, falling back to copy and delete when the destination sits on
/// another filesystem.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)
        .with_context(|| format!("failed to move {} to {}", from.display(), to.display()))?;
    std::fs::remove_file(from)
        .with_context(|| format!("failed to remove {}", from.display()))?;
    Ok(())
}
