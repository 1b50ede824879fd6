//! ContainerStore: owns the open segment, the in-memory index, the writer lock
//! and the decoded-tile hot cache.

use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use moka::sync::Cache;

use tessera_codec::{Compression, TileCodec};
use tessera_core::config::StorageConfig;
use tessera_core::errors::{
    CodecError, StorageError, TesseraError, TesseraResult, VerificationError,
};
use tessera_core::tile::{KnowledgeTile, TileId};
use tessera_core::tracing_setup::events;
use tessera_core::traits::{ITileStorage, TileMutator};

use crate::format::header::read_exact_section;
use crate::format::{
    decode_index, encode_frame, validate_index, ContainerHeader, ContainerMetadata, IndexEntry,
    FRAME_FIXED_LEN,
};
use crate::recovery::{remove_stale_temp, replay_tail};
use crate::segment::Segment;
use crate::stats::StoreStats;
use crate::writer::{write_container, BodyWriter};

/// Hot cache key: a payload location is unique within one segment generation.
type CacheKey = (u64, u64);

const EXPORT_CHUNK: usize = 64 * 1024;

struct StoreState {
    segment: Arc<Segment>,
    index: HashMap<TileId, IndexEntry>,
    /// End of the body region, relative to its start.
    body_len: u64,
    /// Portion of the body region covered by the on-disk index block.
    flushed_body_len: u64,
    /// Bytes of frames superseded by later appends.
    dead_bytes: u64,
    metadata: ContainerMetadata,
}

impl StoreState {
    fn is_dirty(&self) -> bool {
        self.body_len != self.flushed_body_len
    }

    fn sorted_index(&self) -> BTreeMap<TileId, IndexEntry> {
        self.index.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

/// Append-only container of knowledge tiles.
///
/// Many concurrent readers; `put`, `update`, `flush` and `compact` serialize on
/// a single writer lock. Readers never block on the writer except for the brief
/// index swap at the end of a write.
pub struct ContainerStore {
    path: PathBuf,
    config: StorageConfig,
    codec: TileCodec,
    state: RwLock<StoreState>,
    writer: Mutex<()>,
    cache: Cache<CacheKey, Arc<KnowledgeTile>>,
    generation: AtomicU64,
    closed: AtomicBool,
}

impl ContainerStore {
    // --- Lifecycle ---

    /// Create a new, empty container. Fails if `path` already exists.
    pub fn create(path: &Path, config: &StorageConfig) -> TesseraResult<Self> {
        let _span = tessera_core::container_span!("create", path.display()).entered();
        if path.exists() {
            return Err(StorageError::AlreadyExists {
                path: path.display().to_string(),
            }
            .into());
        }
        let metadata = ContainerMetadata::new(
            &config.domain_code,
            Compression::zstd(config.compression_level),
            Utc::now(),
        );
        write_container(path, &metadata, &BTreeMap::new(), 0, |_| Ok(0))?;
        tracing::info!(path = %path.display(), domain = %config.domain_code, "container created");
        Self::open(path, config)
    }

    /// Open an existing container, validating its header, metadata and index,
    /// and replaying any bodies appended after the last flush.
    ///
    /// Structural corruption is fatal: no handle is returned.
    pub fn open(path: &Path, config: &StorageConfig) -> TesseraResult<Self> {
        let _span = tessera_core::container_span!("open", path.display()).entered();
        remove_stale_temp(path)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| StorageError::io("open container", &e))?;
        let file_len = file
            .metadata()
            .map_err(|e| StorageError::io("stat container", &e))?
            .len();

        let (header, metadata, flushed_index) = {
            let mut reader = BufReader::new(&mut file);
            let header = ContainerHeader::read_from(&mut reader)?;
            let metadata_bytes = read_exact_section(&mut reader, header.metadata_len as usize, "metadata block")?;
            let index_bytes = read_exact_section(&mut reader, header.index_len as usize, "index block")?;
            header.verify(&metadata_bytes, &index_bytes)?;
            let metadata = ContainerMetadata::decode(&metadata_bytes)?;
            let index = decode_index(&index_bytes)?;
            (header, metadata, index)
        };

        if metadata.domain_code != header.domain_code {
            return Err(StorageError::corrupt(format!(
                "header domain '{}' disagrees with metadata domain '{}'",
                header.domain_code, metadata.domain_code
            ))
            .into());
        }
        if flushed_index.len() != header.tile_count as usize {
            return Err(StorageError::corrupt(format!(
                "header declares {} tiles, index holds {}",
                header.tile_count,
                flushed_index.len()
            ))
            .into());
        }
        let body_start = header.body_start();
        let flushed_end = body_start
            .checked_add(header.flushed_body_len)
            .ok_or_else(|| StorageError::corrupt("flushed body length overflows"))?;
        if file_len < flushed_end {
            return Err(CodecError::truncated(
                "body region",
                header.flushed_body_len as usize,
                file_len.saturating_sub(body_start) as usize,
            )
            .into());
        }
        validate_index(&flushed_index, header.flushed_body_len)?;

        // Unflushed tail.
        let tail_len = (file_len - flushed_end) as usize;
        let mut index: HashMap<TileId, IndexEntry> = flushed_index.into_iter().collect();
        let mut body_len = header.flushed_body_len;
        if tail_len > 0 {
            file.seek(SeekFrom::Start(flushed_end))
                .map_err(|e| StorageError::io("seek tail", &e))?;
            let tail = read_exact_section(&mut file, tail_len, "body tail")?;
            let replay = replay_tail(&tail, header.flushed_body_len);
            if replay.is_torn() {
                if !config.truncate_torn_tail {
                    return Err(StorageError::corrupt(format!(
                        "torn body frame: {} unreadable bytes after offset {}",
                        replay.torn_len,
                        header.flushed_body_len + replay.valid_len
                    ))
                    .into());
                }
                file.set_len(flushed_end + replay.valid_len)
                    .map_err(|e| StorageError::io("truncate torn tail", &e))?;
                file.sync_all()
                    .map_err(|e| StorageError::io("sync truncated tail", &e))?;
                tracing::warn!(
                    path = %path.display(),
                    truncated_bytes = replay.torn_len,
                    "truncated torn tail"
                );
            }
            events::tail_replayed(
                &path.display().to_string(),
                replay.entries.len(),
                replay.torn_len,
            );
            for (id, entry) in replay.entries {
                index.insert(id, entry);
            }
            body_len += replay.valid_len;
        }

        let live: u64 = index
            .iter()
            .map(|(id, e)| frame_len(id, e.length))
            .sum();
        let dead_bytes = body_len.saturating_sub(live);

        let segment = Segment::from_file(file, path, body_start, 0);
        let store = Self {
            path: path.to_path_buf(),
            config: config.clone(),
            codec: TileCodec::new(metadata.compression),
            state: RwLock::new(StoreState {
                segment: Arc::new(segment),
                index,
                body_len,
                flushed_body_len: header.flushed_body_len,
                dead_bytes,
                metadata,
            }),
            writer: Mutex::new(()),
            cache: Cache::new(config.hot_cache_capacity),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        };
        tracing::info!(
            path = %path.display(),
            tiles = store.read_state()?.index.len(),
            "container opened"
        );
        Ok(store)
    }

    /// Open `path`, creating an empty container first if it does not exist.
    pub fn open_or_create(path: &Path, config: &StorageConfig) -> TesseraResult<Self> {
        if path.exists() {
            Self::open(path, config)
        } else {
            Self::create(path, config)
        }
    }

    /// Flush a dirty index and refuse further operations.
    pub fn close(&self) -> TesseraResult<()> {
        let guard = self.lock_writer()?;
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        if self.read_state()?.is_dirty() {
            self.flush_locked(&guard)?;
        }
        self.closed.store(true, Ordering::Release);
        self.cache.invalidate_all();
        tracing::info!(path = %self.path.display(), "container closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // --- Read ---

    /// Decode the latest version of a tile. Bodies are decoded lazily and cached.
    pub fn get(&self, id: &TileId) -> TesseraResult<KnowledgeTile> {
        self.ensure_open()?;
        let (segment, entry) = {
            let state = self.read_state()?;
            let entry = *state
                .index
                .get(id)
                .ok_or_else(|| TesseraError::tile_not_found(id.as_str()))?;
            (Arc::clone(&state.segment), entry)
        };
        let key = (segment.generation(), entry.offset);
        if let Some(tile) = self.cache.get(&key) {
            return Ok((*tile).clone());
        }
        let payload = segment.read_payload(entry)?;
        let tile = self.codec.decode(&payload)?;
        if tile.id != *id {
            return Err(StorageError::corrupt(format!(
                "index entry for {id} points at a body for {}",
                tile.id
            ))
            .into());
        }
        self.cache.insert(key, Arc::new(tile.clone()));
        Ok(tile)
    }

    pub fn contains(&self, id: &TileId) -> TesseraResult<bool> {
        self.ensure_open()?;
        Ok(self.read_state()?.index.contains_key(id))
    }

    /// All tile ids, sorted.
    pub fn ids(&self) -> TesseraResult<Vec<TileId>> {
        self.ensure_open()?;
        let mut ids: Vec<TileId> = self.read_state()?.index.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn len(&self) -> TesseraResult<usize> {
        self.ensure_open()?;
        Ok(self.read_state()?.index.len())
    }

    pub fn is_empty(&self) -> TesseraResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Decode every live tile, sorted by id.
    pub fn scan(&self) -> TesseraResult<Vec<KnowledgeTile>> {
        self.ids()?.iter().map(|id| self.get(id)).collect()
    }

    pub fn metadata(&self) -> TesseraResult<ContainerMetadata> {
        self.ensure_open()?;
        Ok(self.read_state()?.metadata.clone())
    }

    pub fn domain_code(&self) -> TesseraResult<String> {
        Ok(self.metadata()?.domain_code)
    }

    pub fn stats(&self) -> TesseraResult<StoreStats> {
        self.ensure_open()?;
        let state = self.read_state()?;
        Ok(StoreStats {
            tile_count: state.index.len(),
            body_bytes: state.body_len,
            live_bytes: state.body_len.saturating_sub(state.dead_bytes),
            dead_bytes: state.dead_bytes,
            unflushed_bytes: state.body_len - state.flushed_body_len,
            dirty: state.is_dirty(),
            generation: state.segment.generation(),
            cached_tiles: self.cache.entry_count(),
        })
    }

    // --- Write ---

    /// Append a tile that is not stored yet.
    pub fn put(&self, tile: &KnowledgeTile) -> TesseraResult<()> {
        let guard = self.lock_writer()?;
        self.ensure_open()?;
        if self.read_state()?.index.contains_key(&tile.id) {
            return Err(StorageError::DuplicateTile {
                id: tile.id.to_string(),
            }
            .into());
        }
        tile.validate()?;
        self.append_locked(&guard, tile)
    }

    /// Optimistic update: apply `mutator` to the stored tile if its version still
    /// equals `expected_version`, then append the result with `version + 1`.
    ///
    /// The mutator may not change the id or the domain, nor move the
    /// verification mark backward.
    pub fn update<F>(
        &self,
        id: &TileId,
        expected_version: u64,
        mutator: F,
    ) -> TesseraResult<KnowledgeTile>
    where
        F: FnOnce(&mut KnowledgeTile) -> TesseraResult<()>,
    {
        let guard = self.lock_writer()?;
        self.ensure_open()?;
        let current = self.get(id)?;
        if current.version != expected_version {
            return Err(TesseraError::ConcurrencyConflict {
                tile_id: id.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }

        let mut next = current.clone();
        mutator(&mut next)?;
        if next.id != current.id || next.domain != current.domain {
            return Err(TesseraError::InvalidTile {
                id: id.to_string(),
                reason: "update may not change id or domain".to_string(),
            });
        }
        if next.verification.kind < current.verification.kind {
            return Err(VerificationError::MarkRegression {
                tile_id: id.to_string(),
                current: current.verification.kind,
                proposed: next.verification.kind,
            }
            .into());
        }
        next.version = current.version + 1;
        next.updated_at = Utc::now().max(current.updated_at);
        next.created_at = current.created_at;
        next.validate()?;

        self.append_locked(&guard, &next)?;
        Ok(next)
    }

    /// Read the current version and update against it; on a conflict, re-read
    /// once and retry before surfacing the conflict.
    pub fn update_with_retry<F>(&self, id: &TileId, mut mutator: F) -> TesseraResult<KnowledgeTile>
    where
        F: FnMut(&mut KnowledgeTile) -> TesseraResult<()>,
    {
        let version = self.get(id)?.version;
        match self.update(id, version, &mut mutator) {
            Err(e) if e.is_conflict() => {
                tracing::debug!(tile_id = %id, "version conflict, retrying once");
                let version = self.get(id)?.version;
                self.update(id, version, &mut mutator)
            }
            other => other,
        }
    }

    /// Persist the in-memory index by rewriting the container with the current
    /// body region verbatim. No-op when nothing was appended since the last flush.
    pub fn flush(&self) -> TesseraResult<()> {
        let guard = self.lock_writer()?;
        self.ensure_open()?;
        if !self.read_state()?.is_dirty() {
            return Ok(());
        }
        self.flush_locked(&guard)
    }

    /// Rewrite the container keeping only the latest body of each tile.
    ///
    /// The new file is staged beside the old one and swapped in by rename; an
    /// interruption leaves the old container intact. Reads in flight keep using
    /// the old segment until they finish.
    pub fn compact(&self) -> TesseraResult<()> {
        let _guard = self.lock_writer()?;
        self.ensure_open()?;
        let _span = tessera_core::container_span!("compact", self.path.display()).entered();

        let (segment, old_index, mut metadata, old_body_len) = {
            let state = self.read_state()?;
            (
                Arc::clone(&state.segment),
                state.sorted_index(),
                state.metadata.clone(),
                state.body_len,
            )
        };

        // Lay out live frames contiguously in id order.
        let mut new_index = BTreeMap::new();
        let mut body_len = 0u64;
        for (id, entry) in &old_index {
            let payload_offset = (FRAME_FIXED_LEN + id.as_str().len()) as u64;
            new_index.insert(
                id.clone(),
                IndexEntry {
                    offset: body_len + payload_offset,
                    length: entry.length,
                },
            );
            body_len += frame_len(id, entry.length);
        }
        metadata.last_compacted_at = Some(Utc::now());

        let header = write_container(&self.path, &metadata, &new_index, body_len, |out| {
            copy_live_frames(&segment, &old_index, out)
        })?;
        self.swap_segment(&header, new_index, metadata, 0)?;

        events::container_rewritten(
            &self.path.display().to_string(),
            old_index.len(),
            old_body_len.saturating_sub(body_len),
        );
        Ok(())
    }

    // --- Export ---

    /// Stream the raw container bytes, including any unflushed tail.
    pub fn export_container<W: Write>(&self, out: &mut W) -> TesseraResult<u64> {
        let _guard = self.lock_writer()?;
        self.ensure_open()?;
        let (segment, total) = {
            let state = self.read_state()?;
            (
                Arc::clone(&state.segment),
                state.segment.body_start() + state.body_len,
            )
        };
        let mut offset = 0u64;
        while offset < total {
            let len = EXPORT_CHUNK.min((total - offset) as usize);
            let chunk = segment.read_raw(offset, len)?;
            out.write_all(&chunk)
                .map_err(|e| StorageError::io("export container", &e))?;
            offset += len as u64;
        }
        Ok(total)
    }

    /// Write every live tile as one JSON object per line, sorted by id.
    pub fn export_json_lines<W: Write>(&self, out: &mut W) -> TesseraResult<usize> {
        let tiles = self.scan()?;
        for tile in &tiles {
            serde_json::to_writer(&mut *out, tile)?;
            out.write_all(b"\n")
                .map_err(|e| StorageError::io("export json lines", &e))?;
        }
        Ok(tiles.len())
    }

    // --- Internals ---

    fn ensure_open(&self) -> TesseraResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed.into());
        }
        Ok(())
    }

    fn lock_writer(&self) -> TesseraResult<MutexGuard<'_, ()>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::poisoned("container writer").into())
    }

    fn read_state(&self) -> TesseraResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| StorageError::poisoned("container state").into())
    }

    fn write_state(&self) -> TesseraResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| StorageError::poisoned("container state").into())
    }

    /// Append one framed body at the end of the segment and publish it in the index.
    /// Caller holds the writer lock.
    fn append_locked(&self, _writer: &MutexGuard<'_, ()>, tile: &KnowledgeTile) -> TesseraResult<()> {
        let payload = self.codec.encode(tile)?;
        if payload.len() > self.config.max_tile_bytes {
            return Err(StorageError::TileTooLarge {
                size: payload.len(),
                limit: self.config.max_tile_bytes,
            }
            .into());
        }
        let (frame, payload_offset) = encode_frame(tile.id.as_str(), &payload)?;

        let (segment, body_len) = {
            let state = self.read_state()?;
            (Arc::clone(&state.segment), state.body_len)
        };
        segment.write_body_at(body_len, &frame, self.config.fsync_on_write)?;

        let entry = IndexEntry {
            offset: body_len + payload_offset as u64,
            length: payload.len() as u32,
        };
        let mut state = self.write_state()?;
        if let Some(old) = state.index.insert(tile.id.clone(), entry) {
            state.dead_bytes += frame_len(&tile.id, old.length);
        }
        state.body_len = body_len + frame.len() as u64;
        drop(state);

        self.cache
            .insert((segment.generation(), entry.offset), Arc::new(tile.clone()));
        events::tile_written(tile.id.as_str(), tile.version, payload.len());
        Ok(())
    }

    fn flush_locked(&self, _writer: &MutexGuard<'_, ()>) -> TesseraResult<()> {
        let _span = tessera_core::container_span!("flush", self.path.display()).entered();
        let (segment, index, metadata, body_len, dead_bytes) = {
            let state = self.read_state()?;
            (
                Arc::clone(&state.segment),
                state.sorted_index(),
                state.metadata.clone(),
                state.body_len,
                state.dead_bytes,
            )
        };
        let header = write_container(&self.path, &metadata, &index, body_len, |out| {
            copy_body_region(&segment, body_len, out)
        })?;
        let tile_count = index.len();
        self.swap_segment(&header, index, metadata, dead_bytes)?;
        events::container_rewritten(&self.path.display().to_string(), tile_count, 0);
        Ok(())
    }

    /// Open the freshly renamed container and make it the current segment.
    fn swap_segment(
        &self,
        header: &ContainerHeader,
        index: BTreeMap<TileId, IndexEntry>,
        metadata: ContainerMetadata,
        dead_bytes: u64,
    ) -> TesseraResult<()> {
        let body_len = header.flushed_body_len;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let segment = Segment::open(&self.path, header.body_start(), generation)?;

        let mut state = self.write_state()?;
        state.segment = Arc::new(segment);
        state.index = index.into_iter().collect();
        state.body_len = body_len;
        state.flushed_body_len = body_len;
        state.dead_bytes = dead_bytes;
        state.metadata = metadata;
        Ok(())
    }
}

/// Bytes a frame for `id` with a payload of `length` bytes occupies.
fn frame_len(id: &TileId, length: u32) -> u64 {
    (FRAME_FIXED_LEN + id.as_str().len()) as u64 + length as u64
}

fn copy_body_region(segment: &Segment, body_len: u64, out: &mut BodyWriter) -> TesseraResult<u64> {
    let mut offset = 0u64;
    while offset < body_len {
        let len = EXPORT_CHUNK.min((body_len - offset) as usize);
        let chunk = segment.read_raw(segment.body_start() + offset, len)?;
        out.write_all(&chunk)
            .map_err(|e| StorageError::io("copy body region", &e))?;
        offset += len as u64;
    }
    Ok(offset)
}

fn copy_live_frames(
    segment: &Segment,
    index: &BTreeMap<TileId, IndexEntry>,
    out: &mut BodyWriter,
) -> TesseraResult<u64> {
    let mut written = 0u64;
    for (id, entry) in index {
        let payload = segment.read_payload(*entry)?;
        let (frame, _) = encode_frame(id.as_str(), &payload)?;
        out.write_all(&frame)
            .map_err(|e| StorageError::io("write compacted frame", &e))?;
        written += frame.len() as u64;
    }
    Ok(written)
}

impl ITileStorage for ContainerStore {
    fn get(&self, id: &TileId) -> TesseraResult<KnowledgeTile> {
        ContainerStore::get(self, id)
    }

    fn contains(&self, id: &TileId) -> TesseraResult<bool> {
        ContainerStore::contains(self, id)
    }

    fn ids(&self) -> TesseraResult<Vec<TileId>> {
        ContainerStore::ids(self)
    }

    fn put(&self, tile: &KnowledgeTile) -> TesseraResult<()> {
        ContainerStore::put(self, tile)
    }

    fn update_dyn(
        &self,
        id: &TileId,
        expected_version: u64,
        mutator: &mut TileMutator<'_>,
    ) -> TesseraResult<KnowledgeTile> {
        ContainerStore::update(self, id, expected_version, |tile| mutator(tile))
    }
}

impl std::fmt::Debug for ContainerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerStore")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
