//! Temp files left behind by an interrupted flush or compaction.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tessera_core::errors::{StorageError, TesseraResult};

/// `<path>.tmp`, the staging file for rewrites of `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(".tmp");
    PathBuf::from(s)
}

/// Delete a leftover staging file. Returns whether one existed.
///
/// A staging file is never renamed into place until it is complete, so a leftover
/// one is always garbage and the container itself is still the pre-rewrite version.
pub fn remove_stale_temp(path: &Path) -> TesseraResult<bool> {
    let tmp = temp_path(path);
    if !tmp.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&tmp).map_err(|e| StorageError::io("remove stale temp file", &e))?;
    tracing::warn!(path = %tmp.display(), "removed stale container temp file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_temp_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.tess");
        assert!(!remove_stale_temp(&path).unwrap());

        std::fs::write(temp_path(&path), b"half written").unwrap();
        assert!(remove_stale_temp(&path).unwrap());
        assert!(!temp_path(&path).exists());
    }
}
