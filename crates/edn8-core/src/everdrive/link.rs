use super::DeviceError;
use log::debug;
use std::io::{ErrorKind, Read, Write};

/// Largest single write handed to the underlying stream
pub const BLOCK_SIZE: usize = 8192;

/// Number of bytes shown when a transfer is logged
const LOG_PREVIEW_LEN: usize = 48;

/// Chunked, blocking transfers over an ordered half-duplex byte stream.
///
/// The stream's own read timeout bounds every `receive`. Anything shorter
/// than the requested length is reported as [`DeviceError::ShortRead`] so a
/// truncated reply can never be decoded as a smaller value.
pub struct Transport<T: Read + Write> {
    stream: T,
}

impl<T: Read + Write> Transport<T> {
    pub fn new(stream: T) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &T {
        &self.stream
    }

    pub fn into_inner(self) -> T {
        self.stream
    }

    pub fn send(&mut self, data: &[u8]) -> Result<(), DeviceError> {
        debug!("Transmitting {}: {}", data.len(), hex_preview(data));
        for chunk in data.chunks(BLOCK_SIZE) {
            self.stream.write_all(chunk)?;
        }
        self.stream.flush()?;
        Ok(())
    }

    pub fn receive(&mut self, length: usize) -> Result<Vec<u8>, DeviceError> {
        let mut data = vec![0u8; length];
        let mut received = 0;
        while received < length {
            match self.stream.read(&mut data[received..]) {
                Ok(0) => break,
                Ok(n) => received += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        debug!("Received {}: {}", received, hex_preview(&data[..received]));

        if received < length {
            return Err(DeviceError::ShortRead {
                expected: length,
                received,
            });
        }
        Ok(data)
    }
}

pub(crate) fn hex_preview(data: &[u8]) -> String {
    data.iter()
        .take(LOG_PREVIEW_LEN)
        .map(|b| format!("{b:02x}"))
        .collect()
}
