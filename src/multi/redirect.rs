// Output redirection - a scoped "current output" slot per fan-out

use super::stream::{FileSink, Sink};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

type SharedWriter = Mutex<Box<dyn Write + Send>>;

/// Which default channel an [`Output`] falls back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Out,
    Err,
}

/// Owner of the "current output" slot of one fan-out.
///
/// While no redirection is active, [`Output`] handles write to the default
/// writers (stdout and stderr for [`OutputRedirector::stdio`]). Inside
/// [`OutputRedirector::with_redirected`] both channels write to the given file
/// sink instead.
///
/// Redirections are not meant to nest with different sinks. A nested call
/// still restores correctly, innermost first.
pub struct OutputRedirector {
    stdout: SharedWriter,
    stderr: SharedWriter,
    current: Mutex<Option<FileSink>>,
}

impl OutputRedirector {
    /// Redirector whose defaults are the process stdout and stderr
    pub fn stdio() -> Arc<Self> {
        Self::with_writers(io::stdout(), io::stderr())
    }

    /// Redirector with custom default writers
    pub fn with_writers<O, E>(stdout: O, stderr: E) -> Arc<Self>
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        Arc::new(Self {
            stdout: Mutex::new(Box::new(stdout)),
            stderr: Mutex::new(Box::new(stderr)),
            current: Mutex::new(None),
        })
    }

    /// Handle on the output channel
    pub fn output(self: &Arc<Self>) -> Output {
        Output {
            redirector: self.clone(),
            channel: Channel::Out,
        }
    }

    /// Handle on the error channel
    pub fn error_output(self: &Arc<Self>) -> Output {
        Output {
            redirector: self.clone(),
            channel: Channel::Err,
        }
    }

    /// Run `func` with both channels pointed at `sink`.
    ///
    /// [`Sink::Shared`] runs `func` untouched. The previous target is restored
    /// when `func` returns and also when it unwinds.
    pub fn with_redirected<R, F>(&self, sink: &Sink, func: F) -> R
    where
        F: FnOnce() -> R,
    {
        let Sink::File(file) = sink else {
            return func();
        };

        let _guard = self.substitute(file.clone());
        func()
    }

    /// Sink currently receiving redirected output, if any
    pub fn current(&self) -> Option<FileSink> {
        lock(&self.current).clone()
    }

    pub fn is_redirected(&self) -> bool {
        lock(&self.current).is_some()
    }

    /// Flush the default writers
    pub fn flush_defaults(&self) -> io::Result<()> {
        lock(&self.stdout).flush()?;
        lock(&self.stderr).flush()
    }

    fn substitute(&self, sink: FileSink) -> RedirectGuard<'_> {
        debug!("Replacing stdout with '{}'", sink.path().display());
        let previous = lock(&self.current).replace(sink);
        RedirectGuard {
            redirector: self,
            previous,
        }
    }

    fn write(&self, channel: Channel, buf: &[u8]) -> io::Result<usize> {
        // Clone the handle so the slot lock is not held across the write.
        match self.current() {
            Some(sink) => sink.write(buf),
            None => lock(self.default_writer(channel)).write(buf),
        }
    }

    fn flush(&self, channel: Channel) -> io::Result<()> {
        match self.current() {
            Some(sink) => sink.flush(),
            None => lock(self.default_writer(channel)).flush(),
        }
    }

    fn default_writer(&self, channel: Channel) -> &SharedWriter {
        match channel {
            Channel::Out => &self.stdout,
            Channel::Err => &self.stderr,
        }
    }
}

struct RedirectGuard<'a> {
    redirector: &'a OutputRedirector,
    previous: Option<FileSink>,
}

impl Drop for RedirectGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.redirector.current) = self.previous.take();
        debug!("stdout restored");
    }
}

/// Writer handed to reporters. Every write goes to whatever the redirector's
/// slot points at when the write happens.
#[derive(Clone)]
pub struct Output {
    redirector: Arc<OutputRedirector>,
    channel: Channel,
}

impl Output {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Write text, ignoring failures the way console printing does
    pub fn print(&self, text: &str) {
        let _ = Write::write_all(&mut &*self, text.as_bytes());
    }

    /// Write text followed by a newline
    pub fn println(&self, text: &str) {
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        self.print(&line);
    }
}

impl Write for &Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.redirector.write(self.channel, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.redirector.flush(self.channel)
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut &*self)
    }
}

/// In-memory writer whose clones share one buffer
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.bytes)).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.bytes).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
