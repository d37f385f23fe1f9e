//! Saving task results as JSON files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::{
    error::{NavigatorError, Result},
    models::TaskResult,
};

/// Default location for a saved result following the XDG Base Directory
/// specification: `$XDG_DATA_HOME/pathway/results/<task>-<unix seconds>.json`.
pub fn default_result_path(result: &TaskResult) -> Result<PathBuf> {
    let name = format!(
        "results/{}-{}.json",
        result.identifier,
        result.start_date.as_second()
    );
    xdg::BaseDirectories::with_prefix("pathway")
        .place_data_file(name)
        .map_err(|e| NavigatorError::XdgDirectory(e.to_string()))
}

/// Write a result as pretty-printed JSON, creating parent directories.
///
/// Returns the path written to.
///
/// # Errors
///
/// Returns `NavigatorError::FileSystem` if the file or its directory cannot
/// be written and `NavigatorError::XdgDirectory` if no default location is
/// available.
pub fn save_result(result: &TaskResult, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_result_path(result)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| NavigatorError::FileSystem {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(result)?;
    fs::write(&path, json).map_err(|e| NavigatorError::FileSystem {
        path: path.clone(),
        source: e,
    })?;
    info!("Saved result '{}' to {}", result.identifier, path.display());
    Ok(path)
}

/// Read a result saved by [`save_result`].
pub fn load_result(path: &Path) -> Result<TaskResult> {
    let text = fs::read_to_string(path).map_err(|e| NavigatorError::FileSystem {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&text)?)
}
