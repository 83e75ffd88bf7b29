//! Styling assets shipped inside the binary. The engine needs real files on
//! disk, so each asset is written into the platform data directory the
//! first time an export needs it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config;

pub const REFERENCE_DOC_NAME: &str = "default-reference.docx";
pub const OUTPUT_FILTER_NAME: &str = "strip-output-background.lua";

const REFERENCE_DOC: &[u8] = include_bytes!("../assets/default-reference.docx");
const OUTPUT_FILTER: &[u8] = include_bytes!("../assets/strip-output-background.lua");

/// Path of the bundled default reference document, written out on first use.
pub fn default_reference_doc() -> Result<PathBuf> {
    let dir = config::data_dir()?;
    materialize(&dir, REFERENCE_DOC_NAME, REFERENCE_DOC)
}

/// Path of the bundled Lua filter that strips shaded output backgrounds.
pub fn output_filter() -> Result<PathBuf> {
    let dir = config::data_dir()?;
    materialize(&dir, OUTPUT_FILTER_NAME, OUTPUT_FILTER)
}

fn materialize(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    if needs_write(&path, bytes) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write bundled asset {}", path.display()))?;
        log::debug!("materialized bundled asset {}", path.display());
    }
    Ok(path)
}

/// Anything but an exact byte match is rewritten; a differing copy on disk
/// came from an older build or was edited in place.
fn needs_write(path: &Path, bytes: &[u8]) -> bool {
    match std::fs::read(path) {
        Ok(existing) => existing != bytes,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_writes_asset() {
        let dir = tempfile::tempdir().unwrap();
        let path = materialize(dir.path(), OUTPUT_FILTER_NAME, OUTPUT_FILTER).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), OUTPUT_FILTER);
    }

    #[test]
    fn materialize_refreshes_stale_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OUTPUT_FILTER_NAME);
        std::fs::write(&path, b"stale").unwrap();

        materialize(dir.path(), OUTPUT_FILTER_NAME, OUTPUT_FILTER).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), OUTPUT_FILTER);
    }

    #[test]
    fn materialize_refreshes_same_length_edit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OUTPUT_FILTER_NAME);
        let mut tampered = OUTPUT_FILTER.to_vec();
        tampered[0] ^= 0xff;
        std::fs::write(&path, &tampered).unwrap();

        materialize(dir.path(), OUTPUT_FILTER_NAME, OUTPUT_FILTER).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), OUTPUT_FILTER);
    }

    #[test]
    fn materialize_leaves_current_copy_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = materialize(dir.path(), OUTPUT_FILTER_NAME, OUTPUT_FILTER).unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        materialize(dir.path(), OUTPUT_FILTER_NAME, OUTPUT_FILTER).unwrap();
        let after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn materialize_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data/nbexport");
        let path = materialize(&nested, REFERENCE_DOC_NAME, REFERENCE_DOC).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn bundled_reference_doc_is_a_zip() {
        // DOCX is a ZIP container; PK is its magic number.
        assert_eq!(&REFERENCE_DOC[..2], b"PK");
    }
}
