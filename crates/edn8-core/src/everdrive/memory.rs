use super::{
    CMD_MEM_RD, CMD_MEM_WR, CMD_STATUS, DeviceError, Everdrive, STATUS_SENTINEL,
};
use log::debug;
use std::io::{Read, Write};

/// System state registers
pub const ADDR_SSR: u32 = 0x1802000;
pub const STATE_LENGTH: usize = 0x100;

impl<T: Read + Write> Everdrive<T> {
    pub fn memory_read(&mut self, address: u32, length: usize) -> Result<Vec<u8>, DeviceError> {
        debug!("Reading {length} from 0x{address:08x}");
        self.transmit_command(CMD_MEM_RD)?;
        self.transmit_u32(address)?;
        self.transmit_u32(length as u32)?;
        self.transmit_u8(0)?;
        self.receive_data(length)
    }

    pub fn memory_write(&mut self, address: u32, data: &[u8]) -> Result<(), DeviceError> {
        debug!("Writing {} to 0x{address:08x}", data.len());
        self.transmit_command(CMD_MEM_WR)?;
        self.transmit_u32(address)?;
        self.transmit_u32(data.len() as u32)?;
        self.transmit_u8(0)?;
        self.transmit_data(data)
    }

    /// Queries the device status code, zero meaning the last operation succeeded.
    pub fn status(&mut self) -> Result<u8, DeviceError> {
        self.transmit_command(CMD_STATUS)?;
        let response = self.receive_u16()?;
        decode_status(response)
    }

    pub fn check_status(&mut self) -> Result<(), DeviceError> {
        debug!("Checking status");
        match self.status()? {
            0 => Ok(()),
            code => Err(DeviceError::OperationFailed(code)),
        }
    }

    pub fn read_state(&mut self) -> Result<Vec<u8>, DeviceError> {
        self.memory_read(ADDR_SSR, STATE_LENGTH)
    }
}

/// Splits a status reply into its code, rejecting replies without the sentinel.
pub fn decode_status(response: u16) -> Result<u8, DeviceError> {
    let [code, sentinel] = response.to_le_bytes();
    if sentinel != STATUS_SENTINEL {
        return Err(DeviceError::UnexpectedResponse(response));
    }
    Ok(code)
}

/// Renders a state dump as rows of `XX-XX-..   XX-XX-..`, 16 bytes per row.
pub fn format_state(state: &[u8]) -> Vec<String> {
    fn join(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join("-")
    }

    state
        .chunks(16)
        .map(|row| {
            let (left, right) = row.split_at(row.len().min(8));
            format!("{}   {}", join(left), join(right))
        })
        .collect()
}
