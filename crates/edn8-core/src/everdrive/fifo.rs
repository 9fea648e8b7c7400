//! Mailbox to the cartridge's menu program.
//!
//! Messages are plain memory writes to a fixed address. The menu answers on
//! the serial link; reading those replies in order is up to the caller.

use super::{DeviceError, Everdrive, string_length};
use log::debug;
use std::io::{Read, Write};

pub const ADDR_FIFO: u32 = 0x1810000;

const MENU_COMMAND_MARKER: u8 = b'*';

pub const CMD_SEL_GAME: u8 = b'n';
pub const CMD_RUN_GAME: u8 = b's';

impl<T: Read + Write> Everdrive<T> {
    pub fn write_fifo(&mut self, data: &[u8]) -> Result<(), DeviceError> {
        self.memory_write(ADDR_FIFO, data)
    }

    pub fn transmit_string_fifo(&mut self, message: &str) -> Result<(), DeviceError> {
        let length = string_length(message)?.to_le_bytes();
        debug!("string fifo: {length:02x?} {message:?}");
        self.write_fifo(&length)?;
        self.write_fifo(message.as_bytes())
    }

    pub fn menu_command(&mut self, command: u8) -> Result<(), DeviceError> {
        let data = [MENU_COMMAND_MARKER, command];
        debug!("menu command: {data:02x?}");
        self.write_fifo(&data)
    }
}
