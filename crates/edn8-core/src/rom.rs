use log::debug;
use std::path::Path;
use thiserror::Error;

const NES_MAGIC_BYTES: &[u8; 3] = b"NES";
pub const HEADER_LEN: usize = 16;
const PRG_ROM_PAGE_SIZE: usize = 0x4000;
const CHR_ROM_PAGE_SIZE: usize = 0x2000;
/// A PRG bank count of zero selects the largest supported PRG size
const MAX_PRG_SIZE: usize = 0x400000;
const SRM_SIZE: usize = 0x2000;
/// Reserved for the cartridge OS, games cannot use it
const OS_MAPPER: u8 = 255;

/// Leading image bytes included in the id sent to the menu
const ID_HEADER_LEN: usize = 32;
const ID_TRAILER: u32 = 16;

/// Device memory receiving PRG data
pub const ADDR_PRG: u32 = 0x0000000;
/// Device memory receiving CHR data
pub const ADDR_CHR: u32 = 0x0800000;

#[derive(Debug, Error)]
pub enum RomError {
    #[error("Failed to read ROM: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidFormat(String),

    #[error("Unsupported Mapper: {0}")]
    UnsupportedMapper(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
    SingleScreen,
}

/// An iNES image and the header fields the cartridge needs to start it.
#[derive(Clone, Debug)]
pub struct NesRom {
    pub name: String,
    raw: Vec<u8>,
    pub mapper: u8,
    pub prg_size: usize,
    pub chr_size: usize,
    pub srm_size: usize,
    pub mirroring: Mirroring,
    pub battery_backed: bool,
    /// CRC32 of everything after the header
    pub crc32: u32,
}

impl NesRom {
    pub fn parse(raw: Vec<u8>, name: impl Into<String>) -> Result<NesRom, RomError> {
        if raw.len() < NES_MAGIC_BYTES.len() || &raw[0..3] != NES_MAGIC_BYTES {
            let found = &raw[..raw.len().min(3)];
            return Err(RomError::InvalidFormat(format!(
                "Only NES images are supported, found header {found:02x?}"
            )));
        }
        if raw.len() < HEADER_LEN {
            return Err(RomError::InvalidFormat(format!(
                "Truncated iNES header: {} bytes",
                raw.len()
            )));
        }

        let mapper = (raw[7] & 0b1111_0000) | (raw[6] >> 4);
        if mapper == OS_MAPPER {
            return Err(RomError::UnsupportedMapper(mapper));
        }

        let prg_size = match raw[4] as usize * PRG_ROM_PAGE_SIZE {
            0 => MAX_PRG_SIZE,
            size => size,
        };
        let chr_size = raw[5] as usize * CHR_ROM_PAGE_SIZE;

        let four_screen = raw[6] & 0b1000 != 0;
        let vertical_mirroring = raw[6] & 0b1 != 0;
        let mirroring = match (four_screen, vertical_mirroring) {
            (true, _) => Mirroring::FourScreen,
            (false, true) => Mirroring::Vertical,
            (false, false) => Mirroring::Horizontal,
        };
        let battery_backed = raw[6] & 0b10 != 0;

        let crc32 = crc32fast::hash(&raw[HEADER_LEN..]);

        let rom = NesRom {
            name: name.into(),
            raw,
            mapper,
            prg_size,
            chr_size,
            srm_size: SRM_SIZE,
            mirroring,
            battery_backed,
            crc32,
        };
        debug!(
            "{}: mapper={} prg={} chr={} srm={} mirroring={:?} battery={} crc={:08x}",
            rom.name,
            rom.mapper,
            rom.prg_size,
            rom.chr_size,
            rom.srm_size,
            rom.mirroring,
            rom.battery_backed,
            rom.crc32
        );
        Ok(rom)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<NesRom, RomError> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(raw, name)
    }

    pub fn size(&self) -> usize {
        self.raw.len()
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// PRG data, cut short if the file ends early.
    pub fn prg(&self) -> &[u8] {
        self.slice(HEADER_LEN, self.prg_size)
    }

    /// CHR data, empty for boards with CHR RAM.
    pub fn chr(&self) -> &[u8] {
        self.slice(HEADER_LEN + self.prg_size, self.chr_size)
    }

    fn slice(&self, start: usize, len: usize) -> &[u8] {
        let start = start.min(self.raw.len());
        let end = (start + len).min(self.raw.len());
        &self.raw[start..end]
    }

    /// Identifier blob the menu program uses to pick a mapper:
    /// leading image bytes, then total size, CRC32 and a constant 16, all u32 LE.
    pub fn rom_id(&self) -> Vec<u8> {
        let header = &self.raw[..self.raw.len().min(ID_HEADER_LEN)];
        let mut id = Vec::with_capacity(header.len() + 12);
        id.extend_from_slice(header);
        id.extend_from_slice(&(self.size() as u32).to_le_bytes());
        id.extend_from_slice(&self.crc32.to_le_bytes());
        id.extend_from_slice(&ID_TRAILER.to_le_bytes());
        id
    }
}
