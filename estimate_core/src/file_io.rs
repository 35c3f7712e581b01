//! # File I/O Module
//!
//! Estimation documents are saved as pretty-printed JSON:
//! - **Atomic saves**: write `<name>.tmp`, fsync, rename over the target
//! - **Version validation**: refuse files from an incompatible schema
//!
//! ## Example
//!
//! ```rust,no_run
//! use estimate_core::estimation::Estimation;
//! use estimate_core::file_io::{load_estimation, save_estimation};
//! use std::path::Path;
//!
//! let est = Estimation::new("Block A", "Plot 12", "QS Office");
//! let path = Path::new("block_a.json");
//!
//! save_estimation(&est, path)?;
//! let loaded = load_estimation(path)?;
//! assert_eq!(loaded.meta.name, "Block A");
//! # Ok::<(), estimate_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::estimation::{Estimation, SCHEMA_VERSION};

/// Temp path next to the target: `plan.json` → `plan.json.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save an estimation with atomic write semantics.
///
/// 1. Serialize to JSON
/// 2. Write to `<path>.tmp` and sync to disk
/// 3. Rename over `path`
pub fn save_estimation(estimation: &Estimation, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(estimation)?;
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!(path = %path.display(), items = estimation.items.len(), "saved estimation");
    Ok(())
}

/// Load an estimation from a JSON file.
///
/// # Returns
///
/// * `Err(CalcError::FileError)` - I/O error
/// * `Err(CalcError::SerializationError)` - Invalid JSON
/// * `Err(CalcError::VersionMismatch)` - File version is incompatible
pub fn load_estimation(path: &Path) -> CalcResult<Estimation> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let estimation: Estimation =
        serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    validate_version(&estimation.meta.version)?;

    debug!(path = %path.display(), items = estimation.items.len(), "loaded estimation");
    Ok(estimation)
}

/// Major must match; while on 0.x a newer minor is also refused.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.trim().parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let (Some(&file_major), Some(&current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }

    if current_major == 0 {
        if let (Some(&file_minor), Some(&current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::BarForm;
    use crate::estimation::EstimationItem;
    use tempfile::tempdir;

    #[test]
    fn test_tmp_path() {
        assert_eq!(tmp_path_for(Path::new("/a/plan.json")), Path::new("/a/plan.json.tmp"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("est.json");

        let mut est = Estimation::new("Block A", "Plot 12", "QS");
        est.add_item(EstimationItem::Steel(BarForm::new("B1", "straight", 12).with_dim("A", 3000.0))).unwrap();
        save_estimation(&est, &path).unwrap();

        let loaded = load_estimation(&path).unwrap();
        assert_eq!(loaded.meta.name, "Block A");
        assert_eq!(loaded.meta.site, "Plot 12");
        assert_eq!(loaded.items, est.items);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("est.json");

        save_estimation(&Estimation::default(), &path).unwrap();
        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_estimation(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_estimation(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_newer_schema_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.json");

        let mut est = Estimation::default();
        est.meta.version = "0.9.0".to_string();
        save_estimation(&est, &path).unwrap();

        let err = load_estimation(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }
}
