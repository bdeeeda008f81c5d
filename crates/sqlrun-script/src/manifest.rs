//! Run manifest
//!
//! A TOML file listing the scripts of a deployment in execution order:
//!
//! ```toml
//! base_dir = "System"
//! files = [
//!     "processbudget/01_schema_setup.sql",
//!     "processbudget/02_usp_ProcessBudget.sql",
//! ]
//! summary_pattern = "USP_%"
//! setup = ["USE WAREHOUSE WH_PLANNING"]
//! fail_on_error = false
//! mode = "auto"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ModeSelection, RunError, RunOptions, RunResult, ScriptFile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunManifest {
    /// Directory the `files` entries are relative to
    ///
    /// A relative `base_dir` is resolved against the manifest's own
    /// directory. Defaults to that directory.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Script paths in execution order
    pub files: Vec<String>,
    #[serde(default)]
    pub summary_pattern: Option<String>,
    /// Statements run before the first file
    #[serde(default)]
    pub setup: Vec<String>,
    #[serde(default)]
    pub fail_on_error: bool,
    #[serde(default)]
    pub mode: ModeSelection,
    /// Directory of the manifest file, when loaded from disk
    #[serde(skip)]
    manifest_dir: Option<PathBuf>,
}

impl RunManifest {
    /// Load and validate a manifest file
    pub fn load(path: impl AsRef<Path>) -> RunResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| RunError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut manifest = Self::from_toml_str(&contents)?;
        manifest.manifest_dir = path.parent().map(Path::to_path_buf);
        tracing::debug!(
            manifest = %path.display(),
            files = manifest.files.len(),
            "loaded run manifest"
        );
        Ok(manifest)
    }

    /// Parse and validate manifest contents
    pub fn from_toml_str(contents: &str) -> RunResult<Self> {
        let manifest: Self =
            toml::from_str(contents).map_err(|e| RunError::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> RunResult<()> {
        if self.files.is_empty() {
            return Err(RunError::Manifest("`files` must list at least one script".into()));
        }

        if let Some(entry) = self.files.iter().find(|f| f.trim().is_empty()) {
            return Err(RunError::Manifest(format!(
                "`files` contains a blank entry: {entry:?}"
            )));
        }

        Ok(())
    }

    /// Directory the script entries resolve against
    pub fn base_dir(&self) -> PathBuf {
        let manifest_dir = self.manifest_dir.clone().unwrap_or_default();
        match &self.base_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => manifest_dir.join(dir),
            None => manifest_dir,
        }
    }

    /// The ordered run list
    pub fn script_files(&self) -> Vec<ScriptFile> {
        ScriptFile::resolve_all(&self.base_dir(), &self.files)
    }

    /// Run options described by this manifest
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            mode: self.mode,
            fail_on_error: self.fail_on_error,
            summary_pattern: self.summary_pattern.clone(),
            setup_statements: self.setup.clone(),
        }
    }
}
