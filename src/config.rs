use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::expand_tilde;

/// Engine looked up on PATH when the config names no executable.
pub const DEFAULT_ENGINE: &str = "quarto";

/// Where an exported file lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputDirMode {
    /// Next to the source notebook.
    #[default]
    SameFolder,
    /// Ask for a folder on every export.
    ChooseEachTime,
}

impl OutputDirMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputDirMode::SameFolder => "same-folder",
            OutputDirMode::ChooseEachTime => "choose-each-time",
        }
    }
}

/// Whether notebook cells run before the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Run all cells on every export.
    Always,
    /// Convert the outputs already stored in the notebook.
    Never,
    /// Ask on every export.
    #[default]
    Prompt,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Always => "always",
            ExecutionMode::Never => "never",
            ExecutionMode::Prompt => "prompt",
        }
    }

    /// Fold the retired `execute` boolean into the mode. The boolean is
    /// honored only when `execution` is absent, so configs that set both
    /// follow the newer key.
    pub fn from_parts(execution: Option<ExecutionMode>, legacy_execute: Option<bool>) -> ExecutionMode {
        match (execution, legacy_execute) {
            (Some(mode), _) => mode,
            (None, Some(true)) => ExecutionMode::Always,
            (None, Some(false)) => ExecutionMode::Never,
            (None, None) => ExecutionMode::Prompt,
        }
    }
}

/// On-disk shape of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub export: ExportSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSection {
    /// Engine executable; empty means bare `quarto` resolved via PATH.
    #[serde(default)]
    pub engine_path: String,
    #[serde(default)]
    pub output_dir: OutputDirMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionMode>,
    /// Deprecated pre-0.2 boolean, read but never written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute: Option<bool>,
    /// Style-reference document for DOCX; empty means the bundled default.
    #[serde(default)]
    pub reference_doc: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Bare name or full path of the engine executable.
    pub engine_path: PathBuf,
    pub output_dir: OutputDirMode,
    pub execution: ExecutionMode,
    /// `None` means the bundled default reference document.
    pub reference_doc: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            engine_path: PathBuf::from(DEFAULT_ENGINE),
            output_dir: OutputDirMode::SameFolder,
            execution: ExecutionMode::Prompt,
            reference_doc: None,
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Directory for assets shipped inside the binary and written out on demand.
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Directory for the export transcript. Platforms without a state
/// directory fall back to local data.
pub fn state_dir() -> Result<PathBuf> {
    let proj = project_dirs()?;
    Ok(proj
        .state_dir()
        .unwrap_or_else(|| proj.data_local_dir())
        .to_path_buf())
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "nbexport")
        .context("could not determine config directory")
}

/// Read the config at `path`. A missing file is not an error; every key
/// has a default.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let raw: ConfigFile = toml::from_str(contents).context("failed to parse config TOML")?;
    let export = raw.export;

    let engine_path = match export.engine_path.trim() {
        "" => PathBuf::from(DEFAULT_ENGINE),
        path => expand_tilde(path),
    };

    let reference_doc = match export.reference_doc.trim() {
        "" => None,
        path => Some(expand_tilde(path)),
    };

    let config = Config {
        engine_path,
        output_dir: export.output_dir,
        execution: ExecutionMode::from_parts(export.execution, export.execute),
        reference_doc,
    };

    debug_assert!(
        !config.engine_path.as_os_str().is_empty(),
        "engine path must be non-empty after parsing"
    );

    Ok(config)
}

pub fn write_config_atomic(path: &Path, config: &ConfigFile, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "config already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(config).context("failed to serialize config")?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write temp config to {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename config to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[export]
engine_path = "/opt/quarto/bin/quarto"
output_dir = "choose-each-time"
execution = "always"
reference_doc = "/docs/corporate.docx"
"#;
        let config = parse_config(toml).unwrap();
        assert_eq!(config.engine_path, PathBuf::from("/opt/quarto/bin/quarto"));
        assert_eq!(config.output_dir, OutputDirMode::ChooseEachTime);
        assert_eq!(config.execution, ExecutionMode::Always);
        assert_eq!(config.reference_doc, Some(PathBuf::from("/docs/corporate.docx")));
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.engine_path, PathBuf::from(DEFAULT_ENGINE));
        assert_eq!(config.output_dir, OutputDirMode::SameFolder);
        assert_eq!(config.execution, ExecutionMode::Prompt);
        assert_eq!(config.reference_doc, None);
    }

    #[test]
    fn parse_empty_section_uses_defaults() {
        let config = parse_config("[export]\n").unwrap();
        assert_eq!(config.engine_path, PathBuf::from(DEFAULT_ENGINE));
        assert_eq!(config.execution, ExecutionMode::Prompt);
    }

    #[test]
    fn blank_engine_path_falls_back_to_default() {
        let config = parse_config("[export]\nengine_path = \"   \"\n").unwrap();
        assert_eq!(config.engine_path, PathBuf::from(DEFAULT_ENGINE));
    }

    #[test]
    fn tilde_expansion_on_engine_path() {
        let home = std::env::var("HOME").unwrap();
        let config = parse_config("[export]\nengine_path = \"~/bin/quarto\"\n").unwrap();
        assert_eq!(config.engine_path, PathBuf::from(&home).join("bin/quarto"));
    }

    #[test]
    fn tilde_expansion_on_reference_doc() {
        let home = std::env::var("HOME").unwrap();
        let config = parse_config("[export]\nreference_doc = \"~/styles/ref.docx\"\n").unwrap();
        assert_eq!(
            config.reference_doc,
            Some(PathBuf::from(&home).join("styles/ref.docx"))
        );
    }

    #[test]
    fn legacy_execute_true_maps_to_always() {
        let config = parse_config("[export]\nexecute = true\n").unwrap();
        assert_eq!(config.execution, ExecutionMode::Always);
    }

    #[test]
    fn legacy_execute_false_maps_to_never() {
        let config = parse_config("[export]\nexecute = false\n").unwrap();
        assert_eq!(config.execution, ExecutionMode::Never);
    }

    #[test]
    fn execution_mode_wins_over_legacy_execute() {
        let toml = "[export]\nexecution = \"never\"\nexecute = true\n";
        let config = parse_config(toml).unwrap();
        assert_eq!(config.execution, ExecutionMode::Never);
    }

    #[test]
    fn from_parts_covers_all_arms() {
        use ExecutionMode::*;
        assert_eq!(ExecutionMode::from_parts(Some(Never), Some(true)), Never);
        assert_eq!(ExecutionMode::from_parts(None, Some(true)), Always);
        assert_eq!(ExecutionMode::from_parts(None, Some(false)), Never);
        assert_eq!(ExecutionMode::from_parts(None, None), Prompt);
    }

    #[test]
    fn malformed_toml_errors() {
        let result = parse_config("[export\nengine_path = ");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to parse config TOML"));
    }

    #[test]
    fn unknown_execution_value_errors() {
        let result = parse_config("[export]\nexecution = \"sometimes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.engine_path, PathBuf::from(DEFAULT_ENGINE));
    }

    #[test]
    fn write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let file = ConfigFile {
            export: ExportSection {
                engine_path: "/opt/quarto/bin/quarto".to_string(),
                output_dir: OutputDirMode::ChooseEachTime,
                execution: Some(ExecutionMode::Never),
                execute: None,
                reference_doc: "/docs/ref.docx".to_string(),
            },
        };
        write_config_atomic(&path, &file, false).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.engine_path, PathBuf::from("/opt/quarto/bin/quarto"));
        assert_eq!(config.output_dir, OutputDirMode::ChooseEachTime);
        assert_eq!(config.execution, ExecutionMode::Never);
        assert_eq!(config.reference_doc, Some(PathBuf::from("/docs/ref.docx")));
    }

    #[test]
    fn write_never_emits_deprecated_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let file = ConfigFile {
            export: ExportSection {
                execution: Some(ExecutionMode::Always),
                ..ExportSection::default()
            },
        };
        write_config_atomic(&path, &file, false).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("execution = "));
        assert!(!content.contains("execute = "));
    }

    #[test]
    fn write_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_atomic(&path, &ConfigFile::default(), false).unwrap();

        let result = write_config_atomic(&path, &ConfigFile::default(), false);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));
    }

    #[test]
    fn write_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_atomic(&path, &ConfigFile::default(), false).unwrap();

        let file = ConfigFile {
            export: ExportSection {
                engine_path: "/new/quarto".to_string(),
                ..ExportSection::default()
            },
        };
        write_config_atomic(&path, &file, true).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.engine_path, PathBuf::from("/new/quarto"));
    }

    #[cfg(target_os = "linux")]
    mod xdg {
        use super::*;
        use crate::testutil::XdgEnvGuard;
        use serial_test::serial;

        #[test]
        #[serial]
        fn default_config_path_honors_xdg_config_home() {
            let dir = tempfile::tempdir().unwrap();
            let _guard = XdgEnvGuard::set("XDG_CONFIG_HOME", dir.path());

            let path = default_config_path().unwrap();
            assert!(path.starts_with(dir.path()));
            assert!(path.ends_with("nbexport/config.toml"));
        }

        #[test]
        #[serial]
        fn state_dir_honors_xdg_state_home() {
            let dir = tempfile::tempdir().unwrap();
            let _guard = XdgEnvGuard::set("XDG_STATE_HOME", dir.path());

            let state = state_dir().unwrap();
            assert!(state.starts_with(dir.path()));
        }
    }
}
