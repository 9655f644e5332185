//! Disk-backed sequence of fixed-width records.
//!
//! Two typed views of the same file:
//!
//! - [`Sequence`] — the builder-phase view.  Appends go through an in-memory
//!   buffer that is flushed to the end of the file when full; indexed reads
//!   and in-place updates work on both flushed and buffered records.  Needs
//!   `&mut self` for every access (it owns the file cursor).
//! - [`FrozenSequence`] — the read-only view produced by
//!   [`Sequence::freeze`].  The file is memory-mapped, so lookups take
//!   `&self` and the view can be shared across worker threads.
//!
//! Records are encoded with [`FixedRecord`]; the file is a plain
//! concatenation of `T::SIZE`-byte records with no header.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use thiserror::Error;

/// Records buffered in memory before a flush.
const DEFAULT_BUFFER_RECORDS: usize = 4096;

// ── FixedRecord ───────────────────────────────────────────────────────────────

/// A value with a fixed-width little-endian byte encoding.
pub trait FixedRecord: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Write `self` into `buf` (exactly `SIZE` bytes).
    fn encode(&self, buf: &mut [u8]);

    /// Read a value from `buf` (exactly `SIZE` bytes).
    fn decode(buf: &[u8]) -> Self;
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("record {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}

pub type SequenceResult<T> = Result<T, SequenceError>;

// ── Sequence ──────────────────────────────────────────────────────────────────

/// Append-only, updatable, file-backed record sequence.
pub struct Sequence<T: FixedRecord> {
    file:     File,
    path:     PathBuf,
    /// Records written to the file.
    flushed:  usize,
    /// Encoded records not yet written; they follow `flushed` in order.
    pending:  Vec<u8>,
    capacity: usize,
    scratch:  Vec<u8>,
    _marker:  PhantomData<fn() -> T>,
}

impl<T: FixedRecord> Sequence<T> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> SequenceResult<Self> {
        Self::create_with_buffer(path, DEFAULT_BUFFER_RECORDS)
    }

    /// Like [`create`](Self::create) with an explicit append buffer size in
    /// records (clamped to at least 1).
    pub fn create_with_buffer(path: &Path, records: usize) -> SequenceResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| SequenceError::Io { path: path.to_path_buf(), source })?;
        let capacity = records.max(1);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            flushed: 0,
            pending: Vec::with_capacity(capacity * T::SIZE),
            capacity,
            scratch: vec![0; T::SIZE],
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flushed + self.pending.len() / T::SIZE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record`, returning its position.
    pub fn append(&mut self, record: &T) -> SequenceResult<usize> {
        let index = self.len();
        let start = self.pending.len();
        self.pending.resize(start + T::SIZE, 0);
        record.encode(&mut self.pending[start..]);
        if self.pending.len() >= self.capacity * T::SIZE {
            self.flush()?;
        }
        Ok(index)
    }

    /// Read the record at `index`.
    pub fn get(&mut self, index: usize) -> SequenceResult<T> {
        self.check(index)?;
        if index >= self.flushed {
            let off = (index - self.flushed) * T::SIZE;
            return Ok(T::decode(&self.pending[off..off + T::SIZE]));
        }
        let pos = (index * T::SIZE) as u64;
        let (file, scratch) = (&mut self.file, &mut self.scratch);
        file.seek(SeekFrom::Start(pos))
            .and_then(|_| file.read_exact(scratch))
            .map_err(|source| SequenceError::Io { path: self.path.clone(), source })?;
        Ok(T::decode(&self.scratch))
    }

    /// Overwrite the record at `index` in place.
    pub fn update(&mut self, index: usize, record: &T) -> SequenceResult<()> {
        self.check(index)?;
        if index >= self.flushed {
            let off = (index - self.flushed) * T::SIZE;
            record.encode(&mut self.pending[off..off + T::SIZE]);
            return Ok(());
        }
        record.encode(&mut self.scratch);
        let pos = (index * T::SIZE) as u64;
        let (file, scratch) = (&mut self.file, &self.scratch);
        file.seek(SeekFrom::Start(pos))
            .and_then(|_| file.write_all(scratch))
            .map_err(|source| SequenceError::Io { path: self.path.clone(), source })
    }

    /// Write buffered records to the end of the file.
    pub fn flush(&mut self) -> SequenceResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let end = (self.flushed * T::SIZE) as u64;
        let (file, pending) = (&mut self.file, &self.pending);
        file.seek(SeekFrom::Start(end))
            .and_then(|_| file.write_all(pending))
            .and_then(|_| file.flush())
            .map_err(|source| SequenceError::Io { path: self.path.clone(), source })?;
        self.flushed += self.pending.len() / T::SIZE;
        self.pending.clear();
        Ok(())
    }

    /// Flush and re-open the file as a read-only memory map.
    pub fn freeze(mut self) -> SequenceResult<FrozenSequence<T>> {
        self.flush()?;
        let len = self.flushed;
        // Mapping a zero-length file fails on some platforms.
        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the file was created by this sequence and is not
            // modified again; the map is read-only.
            let map = unsafe { Mmap::map(&self.file) }
                .map_err(|source| SequenceError::Io { path: self.path.clone(), source })?;
            Some(map)
        };
        Ok(FrozenSequence { mmap, len, path: self.path, _marker: PhantomData })
    }

    #[inline]
    fn check(&self, index: usize) -> SequenceResult<()> {
        let len = self.len();
        if index >= len {
            return Err(SequenceError::OutOfRange { index, len });
        }
        Ok(())
    }
}

// ── FrozenSequence ────────────────────────────────────────────────────────────

/// Read-only, memory-mapped view of a finished [`Sequence`].
pub struct FrozenSequence<T: FixedRecord> {
    mmap:    Option<Mmap>,
    len:     usize,
    path:    PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FixedRecord> FrozenSequence<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the record at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let bytes = self.mmap.as_ref()?;
        let off = index * T::SIZE;
        bytes.get(off..off + T::SIZE).map(T::decode)
    }

    /// Records in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}
