use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::frontend::Frontend;
use crate::paths::is_notebook;

/// Resolve the notebook an export acts on: an explicit path wins, then the
/// frontend's active document when it is a notebook, then the picker.
///
/// The returned path is always absolute. Later steps decide whether to
/// relocate by comparing output locations, so one file must have one
/// spelling.
///
/// `Ok(None)` means the picker was cancelled and the command should end
/// without output.
pub fn resolve_notebook(
    explicit: Option<PathBuf>,
    frontend: &dyn Frontend,
) -> Result<Option<PathBuf>> {
    let selected = match select_notebook(explicit, frontend)? {
        Some(path) => path,
        None => return Ok(None),
    };
    let resolved = std::path::absolute(&selected)
        .with_context(|| format!("failed to resolve {}", selected.display()))?;
    Ok(Some(resolved))
}

fn select_notebook(
    explicit: Option<PathBuf>,
    frontend: &dyn Frontend,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !is_notebook(&path) {
            bail!(
                "not an .ipynb notebook: {}\n  hint: exports only work on Jupyter notebooks",
                path.display()
            );
        }
        if !path.is_file() {
            bail!("notebook not found: {}", path.display());
        }
        return Ok(Some(path));
    }

    if let Some(active) = frontend.active_document() {
        if is_notebook(&active) {
            return Ok(Some(active));
        }
    }

    match frontend.pick_notebook() {
        Some(path) if is_notebook(&path) => Ok(Some(path)),
        Some(path) => bail!(
            "not an .ipynb notebook: {}\n  hint: exports only work on Jupyter notebooks",
            path.display()
        ),
        None => Ok(None),
    }
}
