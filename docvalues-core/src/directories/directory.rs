//! Async storage for segment files
//!
//! A segment file is written once through a [`StreamingWriter`] and becomes
//! visible only when the writer finishes. Readers load a file whole as
//! [`OwnedBytes`] and slice it without copying.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{self, Write};
#[cfg(feature = "native")]
use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Write buffer of a filesystem streaming writer.
#[cfg(feature = "native")]
const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// Shared, immutable file content; clones and slices share one allocation.
#[derive(Debug, Clone)]
pub struct OwnedBytes {
    data: Arc<Vec<u8>>,
    range: Range<usize>,
}

impl OwnedBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self::shared(Arc::new(data))
    }

    fn shared(data: Arc<Vec<u8>>) -> Self {
        let range = 0..data.len();
        Self { data, range }
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Sub-range relative to this view.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let start = self.range.start + range.start;
        let end = self.range.start + range.end;
        debug_assert!(end <= self.range.end, "slice past end of OwnedBytes");
        Self {
            data: Arc::clone(&self.data),
            range: start..end,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.range.clone()]
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

impl AsRef<[u8]> for OwnedBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::ops::Deref for OwnedBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

/// Read side of a segment directory.
#[async_trait]
pub trait Directory: Send + Sync + 'static {
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Load a whole file.
    async fn open_read(&self, path: &Path) -> io::Result<OwnedBytes>;

    /// Files under `prefix`, sorted, relative to the directory root.
    async fn list_files(&self, prefix: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Sink for one directory file.
///
/// Data becomes visible to readers only after [`finish`](Self::finish).
/// [`abort`](Self::abort) discards whatever was written.
pub trait StreamingWriter: Write + Send {
    /// Flush and publish the file.
    fn finish(self: Box<Self>) -> io::Result<()>;

    /// Discard the file. Partially written data is never published.
    fn abort(self: Box<Self>) -> io::Result<()>;
}

/// Write side of a segment directory.
#[async_trait]
pub trait DirectoryWriter: Directory {
    /// Create or replace a small file in one call.
    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Open `path` for incremental writing.
    async fn streaming_writer(&self, path: &Path) -> io::Result<Box<dyn StreamingWriter>>;
}

type RamFiles = Arc<RwLock<HashMap<PathBuf, Arc<Vec<u8>>>>>;

/// Buffers in memory and inserts into the owning [`RamDirectory`] on finish.
struct RamStreamingWriter {
    path: PathBuf,
    buffer: Vec<u8>,
    files: RamFiles,
}

impl Write for RamStreamingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StreamingWriter for RamStreamingWriter {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let Self {
            path,
            buffer,
            files,
        } = *self;
        files.write().insert(path, Arc::new(buffer));
        Ok(())
    }

    fn abort(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

/// Buffered file writer; the file is created up front and removed on abort.
#[cfg(feature = "native")]
struct FileStreamingWriter {
    path: PathBuf,
    file: BufWriter<std::fs::File>,
}

#[cfg(feature = "native")]
impl Write for FileStreamingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(feature = "native")]
impl StreamingWriter for FileStreamingWriter {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let file = self.file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }

    fn abort(self: Box<Self>) -> io::Result<()> {
        let Self { path, file } = *self;
        // unflushed bytes are dropped with the buffer
        let (file, _) = file.into_parts();
        drop(file);
        std::fs::remove_file(path)
    }
}

/// In-memory directory for tests and throwaway segments.
#[derive(Debug, Default, Clone)]
pub struct RamDirectory {
    files: RamFiles,
}

impl RamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a file's content in place. Test hook for corruption checks.
    pub fn overwrite(&self, path: &Path, data: Vec<u8>) {
        self.files.write().insert(path.to_path_buf(), Arc::new(data));
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("File not found: {}", path.display()),
    )
}

#[async_trait]
impl Directory for RamDirectory {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.files.read().contains_key(path))
    }

    async fn open_read(&self, path: &Path) -> io::Result<OwnedBytes> {
        let files = self.files.read();
        let data = files.get(path).ok_or_else(|| not_found(path))?;
        Ok(OwnedBytes::shared(Arc::clone(data)))
    }

    async fn list_files(&self, prefix: &Path) -> io::Result<Vec<PathBuf>> {
        let mut listed: Vec<PathBuf> = self
            .files
            .read()
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect();
        listed.sort();
        Ok(listed)
    }
}

#[async_trait]
impl DirectoryWriter for RamDirectory {
    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.overwrite(path, data.to_vec());
        Ok(())
    }

    async fn streaming_writer(&self, path: &Path) -> io::Result<Box<dyn StreamingWriter>> {
        Ok(Box::new(RamStreamingWriter {
            path: path.to_path_buf(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }
}

/// Local filesystem directory rooted at one path.
#[cfg(feature = "native")]
#[derive(Debug, Clone)]
pub struct FsDirectory {
    root: PathBuf,
}

#[cfg(feature = "native")]
impl FsDirectory {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Resolve `path` and make sure its parent exists.
    async fn prepare(&self, path: &Path) -> io::Result<PathBuf> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(full_path)
    }
}

#[cfg(feature = "native")]
#[async_trait]
impl Directory for FsDirectory {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(self.resolve(path)).await
    }

    async fn open_read(&self, path: &Path) -> io::Result<OwnedBytes> {
        let data = tokio::fs::read(self.resolve(path)).await?;
        Ok(OwnedBytes::new(data))
    }

    async fn list_files(&self, prefix: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(self.resolve(prefix)).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file()
                && let Ok(relative) = entry.path().strip_prefix(&self.root)
            {
                files.push(relative.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(feature = "native")]
#[async_trait]
impl DirectoryWriter for FsDirectory {
    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let full_path = self.prepare(path).await?;
        tokio::fs::write(full_path, data).await
    }

    async fn streaming_writer(&self, path: &Path) -> io::Result<Box<dyn StreamingWriter>> {
        let full_path = self.prepare(path).await?;
        let file = std::fs::File::create(&full_path)?;
        Ok(Box::new(FileStreamingWriter {
            path: full_path,
            file: BufWriter::with_capacity(FILE_BUFFER_SIZE, file),
        }))
    }
}
