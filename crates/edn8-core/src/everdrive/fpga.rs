use super::file::FAT_READ;
use super::{CMD_FPG_SDC, DeviceError, Everdrive};
use log::debug;
use std::io::{Read, Write};

/// Maps a mapper index to the bitstream package implementing it
pub const MAP_ROUTE_PATH: &str = "EDN8/MAPROUT.BIN";
pub const MAP_ROUTE_LEN: usize = 4096;
const MAP_DIR: &str = "EDN8/MAPS/";

impl<T: Read + Write> Everdrive<T> {
    /// Loads an FPGA configuration bitstream stored on the SD card.
    pub fn fpga_init(&mut self, path: &str) -> Result<(), DeviceError> {
        debug!("Initializing FPGA: {path}");
        let info = self.file_info(path)?;
        self.open_file(path, FAT_READ)?;
        self.transmit_command(CMD_FPG_SDC)?;
        self.transmit_u32(info.size)?;
        self.transmit_u8(0)?;
        self.check_status()
    }

    pub fn read_mapper_table(&mut self) -> Result<Vec<u8>, DeviceError> {
        self.open_file(MAP_ROUTE_PATH, FAT_READ)?;
        let table = self.read_file(MAP_ROUTE_LEN)?;
        self.close_file()?;
        Ok(table)
    }
}

/// Builds the zero padded `EDN8/MAPS/NNN.RBF` path for a mapper index.
pub fn mapper_core_path(table: &[u8], mapper_index: u16) -> Result<String, DeviceError> {
    let package = table
        .get(mapper_index as usize)
        .ok_or(DeviceError::MapperIndexOutOfRange {
            index: mapper_index,
            table_len: table.len(),
        })?;
    Ok(format!("{MAP_DIR}{package:03}.RBF"))
}
