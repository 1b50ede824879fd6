use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tessera_core::errors::{StorageError, TesseraResult};

use crate::format::IndexEntry;
use crate::io::{read_exact_at, write_all_at};

/// One open container file. Replaced wholesale by flush and compaction;
/// readers holding an `Arc<Segment>` keep reading the file they started with.
#[derive(Debug)]
pub(crate) struct Segment {
    file: File,
    path: PathBuf,
    body_start: u64,
    generation: u64,
}

impl Segment {
    pub(crate) fn open(path: &Path, body_start: u64, generation: u64) -> TesseraResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| StorageError::io("open segment", &e))?;
        Ok(Self::from_file(file, path, body_start, generation))
    }

    pub(crate) fn from_file(file: File, path: &Path, body_start: u64, generation: u64) -> Self {
        Self {
            file,
            path: path.to_path_buf(),
            body_start,
            generation,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn body_start(&self) -> u64 {
        self.body_start
    }

    /// Read the payload bytes an index entry points at.
    pub(crate) fn read_payload(&self, entry: IndexEntry) -> TesseraResult<Vec<u8>> {
        let mut buf = vec![0u8; entry.length as usize];
        read_exact_at(&self.file, &mut buf, self.body_start + entry.offset)
            .map_err(|e| StorageError::io("read tile body", &e))?;
        Ok(buf)
    }

    /// Read `len` raw bytes at an absolute file offset.
    pub(crate) fn read_raw(&self, offset: u64, len: usize) -> TesseraResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        read_exact_at(&self.file, &mut buf, offset).map_err(|e| StorageError::io("read", &e))?;
        Ok(buf)
    }

    /// Write `bytes` at a body-relative offset.
    pub(crate) fn write_body_at(&self, body_offset: u64, bytes: &[u8], sync: bool) -> TesseraResult<()> {
        write_all_at(&self.file, bytes, self.body_start + body_offset)
            .map_err(|e| StorageError::io("append tile body", &e))?;
        if sync {
            self.file
                .sync_data()
                .map_err(|e| StorageError::io("sync tile body", &e))?;
        }
        Ok(())
    }
}
