use anyhow::Result;
use semver::Version;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::assets;
use crate::config::Config;
use crate::engine;
use crate::logsink;

/// Oldest engine release the render flags are known to work with.
fn min_engine_version() -> Version {
    Version::new(1, 0, 0)
}

#[derive(Debug, Serialize)]
pub struct DoctorResult {
    pub config_path: PathBuf,
    pub config_found: bool,
    pub engine_path: PathBuf,
    pub engine_version: Option<String>,
    pub engine_ok: bool,
    pub engine_outdated: bool,
    /// `None` means the bundled default reference document.
    pub reference_doc: Option<PathBuf>,
    pub reference_ok: bool,
    pub log_file: PathBuf,
}

impl DoctorResult {
    /// False when the next export would fail outright. An outdated engine
    /// is only a warning.
    pub fn healthy(&self) -> bool {
        self.engine_ok && self.reference_ok
    }
}

/// Read-only diagnosis of the setup: config presence, engine reachability
/// and version, reference document, transcript location.
pub fn cmd_doctor(config: &Config, config_path: &Path) -> Result<DoctorResult> {
    let engine_version = engine::probe_version(&config.engine_path);
    let engine_ok = engine_version.is_some();
    let engine_outdated = engine_version
        .as_deref()
        .and_then(|v| Version::parse(v).ok())
        .map(|v| v < min_engine_version())
        .unwrap_or(false);

    let (reference_doc, reference_ok) = match &config.reference_doc {
        Some(path) => (Some(path.clone()), path.is_file()),
        // The bundled default is materialized on demand, so there is
        // nothing to check yet.
        None => (None, true),
    };

    Ok(DoctorResult {
        config_path: config_path.to_path_buf(),
        config_found: config_path.is_file(),
        engine_path: config.engine_path.clone(),
        engine_version,
        engine_ok,
        engine_outdated,
        reference_doc,
        reference_ok,
        log_file: logsink::default_log_path()?,
    })
}

pub fn format_doctor_human(result: &DoctorResult) -> String {
    let mut lines = Vec::new();

    if result.config_found {
        lines.push(format!("Config: {}", result.config_path.display()));
    } else {
        lines.push(format!(
            "Config: {} (not found, defaults in use)",
            result.config_path.display()
        ));
    }

    match &result.engine_version {
        Some(version) if result.engine_outdated => lines.push(format!(
            "Engine: {} {} (older than supported {})",
            result.engine_path.display(),
            version,
            min_engine_version()
        )),
        Some(version) => lines.push(format!(
            "Engine: {} {}",
            result.engine_path.display(),
            version
        )),
        None => lines.push(format!(
            "Engine: {} NOT FOUND\n  hint: install Quarto (https://quarto.org) or set engine_path in the config",
            result.engine_path.display()
        )),
    }

    match &result.reference_doc {
        Some(path) if result.reference_ok => {
            lines.push(format!("Reference doc: {}", path.display()));
        }
        Some(path) => lines.push(format!("Reference doc: {} NOT FOUND", path.display())),
        None => lines.push(format!(
            "Reference doc: bundled default ({})",
            assets::REFERENCE_DOC_NAME
        )),
    }

    lines.push(format!("Export log: {}", result.log_file.display()));
    lines.join("\n")
}
