pub mod fifo;
pub mod file;
pub mod fpga;
pub mod frame;
pub mod link;
pub mod loader;
pub mod memory;
pub mod port;

#[cfg(test)]
mod test_utils;


use frame::CommandFrame;
use link::Transport;
use log::debug;
use port::LinkConfig;
use serialport::SerialPort;
use std::io::{Read, Write};
use thiserror::Error;

pub const CMD_STATUS: u8 = 0x10;
pub const CMD_MEM_RD: u8 = 0x19;
pub const CMD_MEM_WR: u8 = 0x1A;
pub const CMD_FPG_SDC: u8 = 0x1F;
pub const CMD_F_FOPN: u8 = 0xC9;
pub const CMD_F_FRD: u8 = 0xCA;
pub const CMD_F_FCLOSE: u8 = 0xCE;
pub const CMD_F_FINFO: u8 = 0xD0;

/// High byte of every well-formed status reply
pub const STATUS_SENTINEL: u8 = 0xA5;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Serial I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Unable to locate a device named {0:?}")]
    DeviceNotFound(String),

    #[error("Short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    #[error("Unexpected response: {0:04x}")]
    UnexpectedResponse(u16),

    #[error("Operation error: {0:02x}")]
    OperationFailed(u8),

    #[error("Menu rejected {step}: {code:02x}")]
    AckFailed { step: &'static str, code: u8 },

    #[error("String of {0} bytes does not fit a 16-bit length prefix")]
    StringTooLong(usize),

    #[error("File access error: {0:02x}")]
    FileAccess(u8),

    #[error("File read error: {0:02x}")]
    FileRead(u8),

    #[error("Mapper index {index} is outside the {table_len} byte routing table")]
    MapperIndexOutOfRange { index: u16, table_len: usize },
}

/// Host side of the EverDrive N8 command protocol.
///
/// The device is half-duplex: every method sends its request and consumes the
/// complete reply before returning, so calls must never interleave.
pub struct Everdrive<T: Read + Write> {
    transport: Transport<T>,
}

impl Everdrive<Box<dyn SerialPort>> {
    /// Opens the serial link described by `config`, discovering the port by
    /// its USB product string when no explicit path is given.
    pub fn connect(config: &LinkConfig) -> Result<Self, DeviceError> {
        let port = port::open_port(config)?;
        Ok(Self::new(port))
    }
}

impl<T: Read + Write> Everdrive<T> {
    pub fn new(stream: T) -> Self {
        Self {
            transport: Transport::new(stream),
        }
    }

    pub fn link(&self) -> &T {
        self.transport.get_ref()
    }

    pub fn into_inner(self) -> T {
        self.transport.into_inner()
    }

    pub(crate) fn transmit_data(&mut self, data: &[u8]) -> Result<(), DeviceError> {
        self.transport.send(data)
    }

    pub(crate) fn receive_data(&mut self, length: usize) -> Result<Vec<u8>, DeviceError> {
        self.transport.receive(length)
    }

    pub fn transmit_command(&mut self, command: u8) -> Result<(), DeviceError> {
        let frame = CommandFrame::new(command);
        debug!("Transmitting command: {frame}");
        self.transmit_data(frame.as_bytes())
    }

    pub fn transmit_u8(&mut self, data: u8) -> Result<(), DeviceError> {
        debug!("transmit_u8: {data:02x}");
        self.transmit_data(&[data])
    }

    pub fn transmit_u16(&mut self, data: u16) -> Result<(), DeviceError> {
        debug!("transmit_u16: {data:04x}");
        self.transmit_data(&data.to_le_bytes())
    }

    pub fn transmit_u32(&mut self, data: u32) -> Result<(), DeviceError> {
        debug!("transmit_u32: {data:08x}");
        self.transmit_data(&data.to_le_bytes())
    }

    pub fn receive_u8(&mut self) -> Result<u8, DeviceError> {
        let data = self.receive_data(1)?;
        debug!("receive_u8: {:02x}", data[0]);
        Ok(data[0])
    }

    pub fn receive_u16(&mut self) -> Result<u16, DeviceError> {
        let data = self.receive_data(2)?;
        let result = u16::from_le_bytes([data[0], data[1]]);
        debug!("receive_u16: {result:04x}");
        Ok(result)
    }

    pub fn receive_u32(&mut self) -> Result<u32, DeviceError> {
        let data = self.receive_data(4)?;
        let result = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        debug!("receive_u32: {result:08x}");
        Ok(result)
    }

    /// Sends a 16-bit length prefix followed by the raw text, no terminator.
    pub fn transmit_string(&mut self, message: &str) -> Result<(), DeviceError> {
        let length = string_length(message)?;
        debug!("string: {length:04x} {message:?}");
        self.transmit_u16(length)?;
        self.transmit_data(message.as_bytes())
    }

    pub fn receive_string(&mut self) -> Result<String, DeviceError> {
        let length = self.receive_u16()? as usize;
        debug!("Receiving string of {length} length");
        let data = self.receive_data(length)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

/// Wire length of a string; the prefix is 16 bits wide.
pub(crate) fn string_length(message: &str) -> Result<u16, DeviceError> {
    u16::try_from(message.len()).map_err(|_| DeviceError::StringTooLong(message.len()))
}
