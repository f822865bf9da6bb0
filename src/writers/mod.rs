//! Writer implementations

pub mod console;
pub mod network;
pub mod rotating_file;

pub use console::{CaptureBuffer, ConsoleTarget, ConsoleWriter};
pub use network::NetworkWriter;
pub use rotating_file::{RotatingFileWriter, RotationPolicy};

pub use crate::core::WriteSyncer;

use crate::core::Result;

/// Every destination kind the router can deliver to
pub enum Writer {
    Console(ConsoleWriter),
    File(RotatingFileWriter),
    Network(NetworkWriter),
}

impl Writer {
    fn inner(&self) -> &dyn WriteSyncer {
        match self {
            Writer::Console(w) => w,
            Writer::File(w) => w,
            Writer::Network(w) => w,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Writer::Console(_) => "console",
            Writer::File(_) => "file",
            Writer::Network(_) => "network",
        }
    }
}

impl WriteSyncer for Writer {
    fn write(&self, bytes: &[u8]) -> Result<usize> {
        self.inner().write(bytes)
    }

    fn sync(&self) -> Result<()> {
        self.inner().sync()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Writer::{}({})", self.kind(), self.name())
    }
}

impl From<ConsoleWriter> for Writer {
    fn from(writer: ConsoleWriter) -> Self {
        Writer::Console(writer)
    }
}

impl From<RotatingFileWriter> for Writer {
    fn from(writer: RotatingFileWriter) -> Self {
        Writer::File(writer)
    }
}

impl From<NetworkWriter> for Writer {
    fn from(writer: NetworkWriter) -> Self {
        Writer::Network(writer)
    }
}
