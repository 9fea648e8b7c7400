//! The "select, identify, run, transfer, configure" handshake that starts a game.
//!
//! Each step is a method on the session type for the state it starts from and
//! consumes the session, so steps can only run in order. A failed step drops
//! the session; the device is left wherever it stopped, nothing is rolled back.

use super::fifo::{CMD_RUN_GAME, CMD_SEL_GAME};
use super::fpga::mapper_core_path;
use super::{DeviceError, Everdrive};
use crate::rom::{ADDR_CHR, ADDR_PRG, NesRom};
use log::{debug, info};
use std::io::{Read, Write};

pub struct Idle;
pub struct GameSelected;
pub struct NameSent;
pub struct IdSent;

pub struct MapperKnown {
    pub mapper_index: u16,
}

pub struct Running {
    mapper_index: u16,
}

pub struct ImageTransferred {
    mapper_index: u16,
}

pub struct MapperCoreSelected {
    mapper_index: u16,
    pub core_path: String,
}

pub struct Complete {
    report: LoadReport,
}

/// Outcome of a successful load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    /// Index the menu program assigned to the image's mapper
    pub mapper_index: u16,
    /// Bitstream that was loaded into the FPGA
    pub core_path: String,
}

pub struct GameLoadSession<'a, T: Read + Write, S> {
    device: &'a mut Everdrive<T>,
    rom: &'a NesRom,
    state: S,
}

impl<'a, T: Read + Write, S> GameLoadSession<'a, T, S> {
    pub fn state(&self) -> &S {
        &self.state
    }

    fn advance<N>(self, state: N) -> GameLoadSession<'a, T, N> {
        GameLoadSession {
            device: self.device,
            rom: self.rom,
            state,
        }
    }

    /// Reads the menu program's 1-byte reply; anything but zero ends the load.
    fn receive_ack(&mut self, step: &'static str) -> Result<(), DeviceError> {
        let ack = self.device.receive_u8()?;
        debug!("{step}: received {ack:02x}");
        if ack != 0 {
            return Err(DeviceError::AckFailed { step, code: ack });
        }
        Ok(())
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, Idle> {
    pub fn new(device: &'a mut Everdrive<T>, rom: &'a NesRom) -> Self {
        Self {
            device,
            rom,
            state: Idle,
        }
    }

    pub fn select_game(self) -> Result<GameLoadSession<'a, T, GameSelected>, DeviceError> {
        debug!("Sending command to select game");
        self.device.menu_command(CMD_SEL_GAME)?;
        Ok(self.advance(GameSelected))
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, GameSelected> {
    pub fn send_name(mut self) -> Result<GameLoadSession<'a, T, NameSent>, DeviceError> {
        let rom_name = format!("USB:{}", self.rom.name);
        self.device.transmit_string_fifo(&rom_name)?;
        self.receive_ack("rom name")?;
        Ok(self.advance(NameSent))
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, NameSent> {
    pub fn send_id(mut self) -> Result<GameLoadSession<'a, T, IdSent>, DeviceError> {
        let rom_id = self.rom.rom_id();
        debug!("Writing rom id to fifo: {rom_id:02X?}");
        self.device.write_fifo(&rom_id)?;
        self.receive_ack("rom id")?;
        Ok(self.advance(IdSent))
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, IdSent> {
    pub fn read_mapper(self) -> Result<GameLoadSession<'a, T, MapperKnown>, DeviceError> {
        let mapper_index = self.device.receive_u16()?;
        debug!("Mapper index: {mapper_index}");
        Ok(self.advance(MapperKnown { mapper_index }))
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, MapperKnown> {
    pub fn run_game(mut self) -> Result<GameLoadSession<'a, T, Running>, DeviceError> {
        debug!("Running the game");
        self.device.menu_command(CMD_RUN_GAME)?;
        self.receive_ack("run game")?;
        let mapper_index = self.state.mapper_index;
        Ok(self.advance(Running { mapper_index }))
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, Running> {
    pub fn transfer_image(self) -> Result<GameLoadSession<'a, T, ImageTransferred>, DeviceError> {
        self.device.memory_write(ADDR_PRG, self.rom.prg())?;
        self.device.memory_write(ADDR_CHR, self.rom.chr())?;
        let mapper_index = self.state.mapper_index;
        Ok(self.advance(ImageTransferred { mapper_index }))
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, ImageTransferred> {
    pub fn select_mapper_core(
        self,
    ) -> Result<GameLoadSession<'a, T, MapperCoreSelected>, DeviceError> {
        let mapper_index = self.state.mapper_index;
        let table = self.device.read_mapper_table()?;
        let core_path = mapper_core_path(&table, mapper_index)?;
        debug!("Mapper core: {core_path}");
        Ok(self.advance(MapperCoreSelected {
            mapper_index,
            core_path,
        }))
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, MapperCoreSelected> {
    pub fn configure(self) -> Result<GameLoadSession<'a, T, Complete>, DeviceError> {
        self.device.fpga_init(&self.state.core_path)?;
        let report = LoadReport {
            mapper_index: self.state.mapper_index,
            core_path: self.state.core_path.clone(),
        };
        Ok(self.advance(Complete { report }))
    }
}

impl<'a, T: Read + Write> GameLoadSession<'a, T, Complete> {
    pub fn finish(self) -> LoadReport {
        self.state.report
    }
}

impl<T: Read + Write> Everdrive<T> {
    /// Runs the whole load handshake for `rom`.
    pub fn load_game(&mut self, rom: &NesRom) -> Result<LoadReport, DeviceError> {
        let report = GameLoadSession::new(self, rom)
            .select_game()?
            .send_name()?
            .send_id()?
            .read_mapper()?
            .run_game()?
            .transfer_image()?
            .select_mapper_core()?
            .configure()?
            .finish();
        info!("Started {} with {}", rom.name, report.core_path);
        Ok(report)
    }
}
