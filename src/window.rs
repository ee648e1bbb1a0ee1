//! Windowed access to an ELF file. The regions a symbol dump needs (ident,
//! header, section header table, string tables, symbol table) are scattered
//! through the file and processed one after another, so instead of mapping the
//! whole file we keep a single memory-mapped window that is remapped on demand.
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("no such file")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("is a directory")]
    IsDirectory,

    #[error("couldn't open file: {0}")]
    Internal(#[source] io::Error),

    #[error("no file is open")]
    NotOpen,

    #[error("offset {offset:#x} is past the end of the file ({size:#x} bytes)")]
    OffsetPastEnd { offset: u64, size: u64 },

    #[error("zero length window")]
    ZeroLength,

    #[error("couldn't map window: {0}")]
    MappingFailed(#[source] io::Error),

    #[error("no window is mapped")]
    NoMapping,
}

/// A read-only file with at most one live memory-mapped window at a time.
/// The file size is fixed at open time.
#[derive(Default)]
pub struct SourceWindow {
    file: Option<File>,
    size: u64,
    window: Option<Mmap>,
}

impl SourceWindow {
    pub fn new() -> SourceWindow {
        SourceWindow::default()
    }

    /// Open `path` read-only. Any previously opened file (and its window) is
    /// closed first, so re-opening the same accessor is fine.
    pub fn open(&mut self, path: &Path) -> Result<(), WindowError> {
        self.window = None;
        self.file = None;
        self.size = 0;

        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => WindowError::NotFound,
            io::ErrorKind::PermissionDenied => WindowError::PermissionDenied,
            _ => WindowError::Internal(err),
        })?;
        // Opening a directory succeeds on Linux; it only fails on read.
        let meta = file.metadata().map_err(WindowError::Internal)?;
        if meta.is_dir() {
            return Err(WindowError::IsDirectory);
        }
        self.size = meta.len();
        self.file = Some(file);
        Ok(())
    }

    /// Release the window (if any) and close the file.
    pub fn close(&mut self) -> Result<(), WindowError> {
        if self.file.is_none() {
            return Err(WindowError::NotOpen);
        }
        self.window = None;
        self.file = None;
        self.size = 0;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Size of the open file, fixed at open time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Map a window over `[offset, offset + length)`, clipped to the end of
    /// the file. The previous window is released first so exactly one mapping
    /// is ever live; any view into it becomes invalid. A failed argument check
    /// leaves the previous window untouched.
    pub fn acquire(&mut self, offset: u64, length: usize) -> Result<&[u8], WindowError> {
        let file = self.file.as_ref().ok_or(WindowError::NotOpen)?;
        if offset >= self.size {
            return Err(WindowError::OffsetPastEnd {
                offset,
                size: self.size,
            });
        }
        if length == 0 {
            return Err(WindowError::ZeroLength);
        }
        let length = length.min((self.size - offset) as usize);

        self.window = None;
        // Unsafe because the mapping has undefined behavior if the underlying
        // file is modified while it is in use. memmap2 page-aligns the actual
        // mapping internally; the view starts exactly at `offset`.
        let map = unsafe { MmapOptions::new().offset(offset).len(length).map(file) }
            .map_err(WindowError::MappingFailed)?;
        Ok(&*self.window.insert(map))
    }

    /// The currently mapped window, if any.
    pub fn window(&self) -> Option<&[u8]> {
        self.window.as_deref()
    }

    /// Unmap the current window.
    pub fn release(&mut self) -> Result<(), WindowError> {
        if self.window.take().is_none() {
            return Err(WindowError::NoMapping);
        }
        Ok(())
    }
}
