// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::config::validate::cycle_report;
use crate::errors::Result;

/// Load a project file from a given path and return the raw `RawProjectFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProjectFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let project: RawProjectFile = toml::from_str(&contents)?;

    Ok(project)
}

/// Load a project file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks scheduling/telemetry settings, task windows and dependency
///   references.
///
/// Dependency cycles are not rejected here: the scheduling engine refuses to
/// cascade through them at run time. They are logged as a warning.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectFile> {
    let raw = load_from_path(&path)?;
    let project = ProjectFile::try_from(raw)?;

    if let Some(report) = cycle_report(&project) {
        warn!(path = %path.as_ref().display(), "{report}");
    }

    Ok(project)
}

/// Default project file location: `Autosched.toml` in the current directory.
pub fn default_project_path() -> PathBuf {
    PathBuf::from("Autosched.toml")
}
