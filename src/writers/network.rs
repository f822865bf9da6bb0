//! Network writer for remote collectors
//!
//! Sends encoded records to a remote server over one TCP connection opened
//! at construction. There is no timeout, retry or reconnect: a dropped
//! connection surfaces as write errors until the logger is rebuilt.

use crate::core::{LoggerError, Result, WriteSyncer};
use parking_lot::Mutex;
use std::io::Write;
use std::net::TcpStream;

/// # Example
///
/// ```no_run
/// use tee_logger::writers::NetworkWriter;
/// use tee_logger::WriteSyncer;
///
/// let writer = NetworkWriter::connect("127.0.0.1:5170")
///     .expect("Failed to connect to log collector");
/// writer.write(b"{\"msg\":\"hello\"}\n").unwrap();
/// ```
pub struct NetworkWriter {
    address: String,
    stream: Mutex<TcpStream>,
}

impl NetworkWriter {
    /// Connect to `address` (e.g. "localhost:5170", "10.0.0.5:9000")
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be resolved or the connection fails
    pub fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address)
            .map_err(|e| LoggerError::network(address, format!("Failed to connect: {}", e)))?;

        // Records are already whole lines; don't hold them back
        stream
            .set_nodelay(true)
            .map_err(|e| LoggerError::network(address, format!("Failed to set TCP_NODELAY: {}", e)))?;

        Ok(Self {
            address: address.to_string(),
            stream: Mutex::new(stream),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl WriteSyncer for NetworkWriter {
    fn write(&self, bytes: &[u8]) -> Result<usize> {
        self.stream
            .lock()
            .write_all(bytes)
            .map_err(|e| LoggerError::network(self.address.clone(), format!("Failed to send: {}", e)))?;
        Ok(bytes.len())
    }

    fn sync(&self) -> Result<()> {
        self.stream
            .lock()
            .flush()
            .map_err(|e| LoggerError::network(self.address.clone(), format!("Failed to flush: {}", e)))
    }

    fn name(&self) -> &str {
        &self.address
    }
}
