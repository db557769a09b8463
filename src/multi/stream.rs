// Stream resolution - destination string to sink

use crate::error::{MultiError, Result};
use crate::utils::FileUtils;
use futures::future::{BoxFuture, FutureExt};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Destination meaning "the shared default output"
pub const SHARED_DESTINATION: &str = "-";

/// Where one reporter's output goes
#[derive(Debug, Clone)]
pub enum Sink {
    /// The shared default output. Not owned, never closed here.
    Shared,
    /// A dedicated file, owned by the fan-out
    File(FileSink),
}

impl Sink {
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared)
    }

    pub fn as_file(&self) -> Option<&FileSink> {
        match self {
            Self::File(file) => Some(file),
            Self::Shared => None,
        }
    }
}

/// An owned, buffered file destination.
///
/// Clones share the same handle. The handle is closed at most once; writes
/// after close fail with `BrokenPipe`.
#[derive(Clone)]
pub struct FileSink {
    inner: Arc<FileSinkInner>,
}

struct FileSinkInner {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.inner.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl FileSink {
    /// Create (or truncate) the file at `path` and open it for writing
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = FileUtils::create_truncated(path)?;
        Ok(Self {
            inner: Arc::new(FileSinkInner {
                path: path.to_path_buf(),
                writer: Mutex::new(Some(BufWriter::new(file))),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn is_closed(&self) -> bool {
        self.writer().is_none()
    }

    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match self.writer().as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(closed_error(&self.inner.path)),
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        match self.writer().as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    /// Flush buffered bytes, sync them to disk and release the handle.
    ///
    /// Closing an already closed sink succeeds immediately.
    pub fn close(&self) -> BoxFuture<'static, io::Result<()>> {
        let writer = self.writer().take();
        let path = self.inner.path.clone();

        async move {
            let Some(writer) = writer else {
                return Ok(());
            };

            tokio::task::spawn_blocking(move || {
                let file = writer.into_inner().map_err(|e| e.into_error())?;
                file.sync_all()
            })
            .await
            .map_err(io::Error::other)??;

            debug!("Closed sink '{}'", path.display());
            Ok(())
        }
        .boxed()
    }

    fn writer(&self) -> MutexGuard<'_, Option<BufWriter<File>>> {
        self.inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn closed_error(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("sink '{}' is already closed", path.display()),
    )
}

/// Resolve a destination descriptor.
///
/// `-` maps to [`Sink::Shared`]. Anything else is a file path: missing parent
/// directories are created and the file is truncated before it is returned.
pub fn resolve_stream(destination: &str) -> Result<Sink> {
    if destination == SHARED_DESTINATION {
        debug!("Resolved stream '-' into shared output");
        return Ok(Sink::Shared);
    }

    debug!("Resolved stream '{}' into writeable file stream", destination);
    let path = Path::new(destination);
    let sink = FileSink::create(path).map_err(|e| MultiError::io(path, e))?;
    Ok(Sink::File(sink))
}
