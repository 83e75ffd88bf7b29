//! Interaction with the surrounding desktop shell: pickers, the execution
//! prompt, and revealing finished exports.

use std::path::{Path, PathBuf};

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::paths::{is_notebook, NOTEBOOK_EXT};

const NOTEBOOK_EXTENSIONS: &[&str] = &[NOTEBOOK_EXT];

/// What happens to cells for a single export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellHandling {
    /// Run every cell before converting.
    RunCells,
    /// Convert the outputs already stored in the notebook.
    StoredOutputs,
}

/// Everything the export workflow asks of the user's environment. Methods
/// that wait on the user return `None` when dismissed, and the workflow
/// treats that as a silent abort.
pub trait Frontend {
    /// The document the user is "in" when the command names no notebook.
    fn active_document(&self) -> Option<PathBuf>;

    /// Single-file picker filtered to notebooks.
    fn pick_notebook(&self) -> Option<PathBuf>;

    /// Folder picker for the export destination.
    fn pick_output_dir(&self, start: &Path) -> Option<PathBuf>;

    /// Two-way choice: run cells first, or export stored outputs.
    fn confirm_execution(&self) -> Option<CellHandling>;

    /// Ask the OS file browser to show `path`.
    fn reveal(&self, path: &Path);
}

/// Production frontend: native dialogs via rfd, reveal via the system
/// opener.
pub struct DesktopFrontend;

impl Frontend for DesktopFrontend {
    fn active_document(&self) -> Option<PathBuf> {
        // A terminal has no focused editor tab; the nearest equivalent is a
        // working directory containing exactly one notebook.
        sole_notebook_in(&std::env::current_dir().ok()?)
    }

    fn pick_notebook(&self) -> Option<PathBuf> {
        FileDialog::new()
            .set_title("Select Notebook")
            .add_filter("Jupyter Notebooks", NOTEBOOK_EXTENSIONS)
            .pick_file()
    }

    fn pick_output_dir(&self, start: &Path) -> Option<PathBuf> {
        FileDialog::new()
            .set_title("Choose Output Folder")
            .set_directory(start)
            .pick_folder()
    }

    fn confirm_execution(&self) -> Option<CellHandling> {
        let answer = MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title("Export Notebook")
            .set_description(
                "Run all cells before exporting?\n\
                 \"No\" exports the outputs already saved in the notebook.",
            )
            .set_buttons(MessageButtons::YesNoCancel)
            .show();

        match answer {
            MessageDialogResult::Yes => Some(CellHandling::RunCells),
            MessageDialogResult::No => Some(CellHandling::StoredOutputs),
            _ => None,
        }
    }

    fn reveal(&self, path: &Path) {
        let folder = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| path.to_path_buf());
        if let Err(e) = open::that(&folder) {
            log::warn!("failed to reveal {} in file browser: {}", folder.display(), e);
        }
    }
}

/// The single notebook in `dir`, or `None` when there are zero or several.
pub fn sole_notebook_in(dir: &Path) -> Option<PathBuf> {
    let mut found = None;
    for entry in std::fs::read_dir(dir).ok()? {
        let path = entry.ok()?.path();
        if path.is_file() && is_notebook(&path) {
            if found.is_some() {
                return None;
            }
            found = Some(path);
        }
    }
    found
}
