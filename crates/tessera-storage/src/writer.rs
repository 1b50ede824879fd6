//! Whole-file container writes: staged to `<path>.tmp`, synced, then renamed into place.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use tessera_core::errors::{StorageError, TesseraResult};
use tessera_core::tile::TileId;

use crate::format::{encode_index, ContainerHeader, ContainerMetadata, IndexEntry};
use crate::recovery::temp_path;

/// Sink for the body region of a container being written.
pub(crate) type BodyWriter = BufWriter<File>;

/// Write a complete container at `path`.
///
/// `write_body` must write exactly `body_len` bytes laid out as `index` describes.
/// The existing file at `path` is replaced only after the new one is fully on disk.
pub(crate) fn write_container<F>(
    path: &Path,
    metadata: &ContainerMetadata,
    index: &BTreeMap<TileId, IndexEntry>,
    body_len: u64,
    write_body: F,
) -> TesseraResult<ContainerHeader>
where
    F: FnOnce(&mut BodyWriter) -> TesseraResult<u64>,
{
    let metadata_bytes = metadata.encode()?;
    let index_bytes = encode_index(index)?;
    let tile_count = u32::try_from(index.len())
        .map_err(|_| StorageError::corrupt("more than u32::MAX tiles"))?;
    let header = ContainerHeader::new(
        &metadata.domain_code,
        tile_count,
        &metadata_bytes,
        &index_bytes,
        body_len,
    )?;

    let tmp = temp_path(path);
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)
        .map_err(|e| StorageError::io("create temp container", &e))?;
    let mut out = BufWriter::new(file);

    let staged = (|| -> TesseraResult<()> {
        out.write_all(&header.encode()?)
            .and_then(|_| out.write_all(&metadata_bytes))
            .and_then(|_| out.write_all(&index_bytes))
            .map_err(|e| StorageError::io("write container header", &e))?;
        let written = write_body(&mut out)?;
        if written != body_len {
            return Err(StorageError::corrupt(format!(
                "body writer produced {written} bytes, expected {body_len}"
            ))
            .into());
        }
        out.flush().map_err(|e| StorageError::io("flush temp container", &e))?;
        out.get_ref()
            .sync_all()
            .map_err(|e| StorageError::io("sync temp container", &e))?;
        Ok(())
    })();
    if let Err(e) = staged {
        drop(out);
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    drop(out);

    std::fs::rename(&tmp, path).map_err(|e| StorageError::io("rename temp container", &e))?;
    sync_parent_dir(path);
    Ok(header)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
            tracing::debug!(path = %parent.display(), error = %e, "directory sync failed");
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
