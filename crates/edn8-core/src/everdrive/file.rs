use super::{CMD_F_FCLOSE, CMD_F_FINFO, CMD_F_FOPN, CMD_F_FRD, DeviceError, Everdrive};
use log::debug;
use std::io::{Read, Write};

pub const FAT_READ: u8 = 0x01;

/// Remote reads arrive in blocks of this size, each gated by a status byte
const FILE_BLOCK_SIZE: usize = 4096;

/// Directory entry of a file on the cartridge's SD card.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u32,
    pub date: u16,
    pub time: u16,
    pub attrib: u8,
    pub name: String,
}

// Only one remote file may be open at a time; the protocol has no handles.
impl<T: Read + Write> Everdrive<T> {
    pub fn open_file(&mut self, path: &str, mode: u8) -> Result<(), DeviceError> {
        debug!("Opening: {path} (mode {mode:02x})");
        self.transmit_command(CMD_F_FOPN)?;
        self.transmit_u8(mode)?;
        self.transmit_string(path)?;
        self.check_status()
    }

    pub fn read_file(&mut self, length: usize) -> Result<Vec<u8>, DeviceError> {
        debug!("Receiving {length} from file");
        self.transmit_command(CMD_F_FRD)?;
        self.transmit_u32(length as u32)?;

        let mut data = Vec::with_capacity(length);
        let mut remaining = length;
        while remaining > 0 {
            let block = remaining.min(FILE_BLOCK_SIZE);
            let response = self.receive_u8()?;
            if response != 0 {
                return Err(DeviceError::FileRead(response));
            }
            data.extend_from_slice(&self.receive_data(block)?);
            remaining -= block;
        }
        Ok(data)
    }

    pub fn close_file(&mut self) -> Result<(), DeviceError> {
        debug!("Closing file");
        self.transmit_command(CMD_F_FCLOSE)?;
        self.check_status()
    }

    pub fn file_info(&mut self, path: &str) -> Result<FileInfo, DeviceError> {
        debug!("Requesting file info: {path}");
        self.transmit_command(CMD_F_FINFO)?;
        self.transmit_string(path)?;
        let response = self.receive_u8()?;
        if response != 0 {
            return Err(DeviceError::FileAccess(response));
        }
        self.receive_file_info()
    }

    fn receive_file_info(&mut self) -> Result<FileInfo, DeviceError> {
        // Field order is fixed by the firmware
        let size = self.receive_u32()?;
        let date = self.receive_u16()?;
        let time = self.receive_u16()?;
        let attrib = self.receive_u8()?;
        let name = self.receive_string()?;
        Ok(FileInfo {
            size,
            date,
            time,
            attrib,
            name,
        })
    }
}
