//! Console writer implementation

use crate::core::{LoggerError, Result, WriteSyncer};
use parking_lot::Mutex;
use std::io::{IsTerminal, Write};
use std::sync::Arc;

/// In-memory stand-in for a standard stream
///
/// Clones share the same buffer, so a handle kept by the caller observes
/// everything the logger wrote.
///
/// # Example
///
/// ```
/// use tee_logger::writers::{CaptureBuffer, ConsoleWriter};
/// use tee_logger::WriteSyncer;
///
/// let buffer = CaptureBuffer::new();
/// let writer = ConsoleWriter::capture(buffer.clone());
/// writer.write(b"hello\n").unwrap();
/// assert_eq!(buffer.contents(), "hello\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    fn append(&self, bytes: &[u8]) {
        self.inner.lock().extend_from_slice(bytes);
    }
}

#[derive(Debug, Clone)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
    Capture(CaptureBuffer),
}

pub struct ConsoleWriter {
    target: ConsoleTarget,
}

impl ConsoleWriter {
    pub fn new(target: ConsoleTarget) -> Self {
        Self { target }
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleTarget::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleTarget::Stderr)
    }

    pub fn capture(buffer: CaptureBuffer) -> Self {
        Self::new(ConsoleTarget::Capture(buffer))
    }

    pub fn target(&self) -> &ConsoleTarget {
        &self.target
    }

    /// Whether ANSI colors make sense on this target
    pub fn is_terminal(&self) -> bool {
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().is_terminal(),
            ConsoleTarget::Stderr => std::io::stderr().is_terminal(),
            ConsoleTarget::Capture(_) => false,
        }
    }
}

impl WriteSyncer for ConsoleWriter {
    fn write(&self, bytes: &[u8]) -> Result<usize> {
        // One write_all on the locked handle keeps concurrent records whole
        let result = match &self.target {
            ConsoleTarget::Stdout => std::io::stdout().lock().write_all(bytes),
            ConsoleTarget::Stderr => std::io::stderr().lock().write_all(bytes),
            ConsoleTarget::Capture(buffer) => {
                buffer.append(bytes);
                Ok(())
            }
        };
        result.map_err(|e| LoggerError::io_operation("write to console", self.name(), e))?;
        Ok(bytes.len())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        match self.target {
            ConsoleTarget::Stdout => "stdout",
            ConsoleTarget::Stderr => "stderr",
            ConsoleTarget::Capture(_) => "capture",
        }
    }
}
