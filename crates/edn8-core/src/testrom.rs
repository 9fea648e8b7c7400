//! Small test ROMs for checking a cartridge link without a game image.
//!
//! Each ROM ships as a BPS patch against an all-zero image and is rebuilt
//! whenever it is requested.

use crate::patch::{BpsPatch, PatchError};

pub const TEST_ROM_LEN: usize = 40976;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TestRom {
    /// Echoes FIFO traffic back over the link
    Fifo,
    /// Prints a greeting, nothing else
    HelloWorld,
}

impl TestRom {
    fn patch(self) -> &'static [u8] {
        match self {
            TestRom::Fifo => include_bytes!("../assets/fifo_testrom.bps"),
            TestRom::HelloWorld => include_bytes!("../assets/hello_testrom.bps"),
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            TestRom::Fifo => "fifo_testrom.nes",
            TestRom::HelloWorld => "testrom.nes",
        }
    }

    pub fn build(self) -> Result<Vec<u8>, PatchError> {
        let patch = BpsPatch::parse(self.patch())?;
        patch.apply(&vec![0u8; TEST_ROM_LEN])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::{Mirroring, NesRom};

    #[test]
    fn fifo_rom_builds() {
        let raw = TestRom::Fifo.build().unwrap();
        assert_eq!(raw.len(), TEST_ROM_LEN);
        assert_eq!(crc32fast::hash(&raw), 0x7B55_42E2);

        let rom = NesRom::parse(raw, TestRom::Fifo.file_name()).unwrap();
        assert_eq!(rom.mapper, 0);
        assert_eq!(rom.prg_size, 0x8000);
        assert_eq!(rom.chr_size, 0x2000);
        assert_eq!(rom.mirroring, Mirroring::Vertical);
        assert_eq!(rom.crc32, 0xAF79_26B8);
    }

    #[test]
    fn hello_rom_builds() {
        let raw = TestRom::HelloWorld.build().unwrap();
        assert_eq!(crc32fast::hash(&raw), 0x29D4_43E4);

        let rom = NesRom::parse(raw, TestRom::HelloWorld.file_name()).unwrap();
        assert_eq!(rom.crc32, 0xFDF8_27BE);
        assert_eq!(rom.prg().len() + rom.chr().len() + 16, TEST_ROM_LEN);
    }
}
