use std::path::{Path, PathBuf};

/// File extension that marks a Jupyter notebook, matched case-insensitively.
pub const NOTEBOOK_EXT: &str = "ipynb";

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    } else if path == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    PathBuf::from(path)
}

pub fn is_notebook(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(NOTEBOOK_EXT))
        .unwrap_or(false)
}

/// Name of the file an export produces: notebook stem plus the target
/// extension, inside `dir`.
pub fn exported_file(notebook: &Path, dir: &Path, extension: &str) -> PathBuf {
    let stem = notebook.file_stem().unwrap_or_default();
    dir.join(format!("{}.{}", stem.to_string_lossy(), extension))
}

/// Forward-slash form of a path. YAML handed to the engine treats
/// backslashes as escapes, so Windows paths must be rewritten.
pub fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_replaces_home() {
        let home = std::env::var("HOME").unwrap();
        let result = expand_tilde("~/notebooks/report.ipynb");
        assert_eq!(result, PathBuf::from(&home).join("notebooks/report.ipynb"));
    }

    #[test]
    fn expand_tilde_bare_tilde() {
        let home = std::env::var("HOME").unwrap();
        assert_eq!(expand_tilde("~"), PathBuf::from(&home));
    }

    #[test]
    fn expand_tilde_leaves_absolute_unchanged() {
        let result = expand_tilde("/usr/local/bin/quarto");
        assert_eq!(result, PathBuf::from("/usr/local/bin/quarto"));
    }

    #[test]
    fn expand_tilde_leaves_relative_unchanged() {
        let result = expand_tilde("bin/quarto");
        assert_eq!(result, PathBuf::from("bin/quarto"));
    }

    #[test]
    fn notebook_extension_lowercase() {
        assert!(is_notebook(Path::new("/tmp/report.ipynb")));
    }

    #[test]
    fn notebook_extension_mixed_case() {
        assert!(is_notebook(Path::new("/tmp/Report.IPYNB")));
    }

    #[test]
    fn notebook_extension_rejects_other_files() {
        assert!(!is_notebook(Path::new("/tmp/report.qmd")));
        assert!(!is_notebook(Path::new("/tmp/report.ipynb.bak")));
    }

    #[test]
    fn notebook_extension_rejects_missing_extension() {
        assert!(!is_notebook(Path::new("/tmp/report")));
    }

    #[test]
    fn exported_file_swaps_extension() {
        let result = exported_file(
            Path::new("/work/report.ipynb"),
            Path::new("/work/out"),
            "pdf",
        );
        assert_eq!(result, PathBuf::from("/work/out/report.pdf"));
    }

    #[test]
    fn exported_file_keeps_dotted_stem() {
        let result = exported_file(
            Path::new("/work/q3.sales.ipynb"),
            Path::new("/work"),
            "docx",
        );
        assert_eq!(result, PathBuf::from("/work/q3.sales.docx"));
    }

    #[test]
    fn slashed_rewrites_backslashes() {
        assert_eq!(slashed(Path::new(r"C:\docs\ref.docx")), "C:/docs/ref.docx");
    }

    #[test]
    fn slashed_leaves_unix_paths_alone() {
        assert_eq!(slashed(Path::new("/docs/ref.docx")), "/docs/ref.docx");
    }
}
