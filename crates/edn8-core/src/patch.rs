pub mod bps;
pub mod ips;
pub mod number;

#[cfg(test)]
mod bps_test;

pub use bps::BpsPatch;
pub use ips::apply_ips;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Magic header {found:02x?} is incorrect, expected {expected:?}")]
    BadMagic { expected: &'static str, found: Vec<u8> },

    #[error("Patch is too short: {0} bytes")]
    TooShort(usize),

    #[error("Patch checksum {expected:08x} does not match actual checksum {actual:08x}")]
    PatchChecksum { expected: u32, actual: u32 },

    #[error("Source size {actual} does not match expected {expected}")]
    SourceSize { expected: usize, actual: usize },

    #[error("Source checksum {actual:08x} does not match expected {expected:08x}")]
    SourceChecksum { expected: u32, actual: u32 },

    #[error("Target checksum {actual:08x} does not match expected {expected:08x}")]
    TargetChecksum { expected: u32, actual: u32 },

    #[error("Patch data ends inside {0}")]
    Truncated(&'static str),

    #[error("Encoded number does not fit in 64 bits")]
    NumberOverflow,

    #[error("{action} of {length} bytes at offset {offset} is out of bounds")]
    OutOfBounds {
        action: &'static str,
        offset: i64,
        length: usize,
    },

    #[error("Invalid sha1sum: {actual}, expected {expected}")]
    Sha1Mismatch { expected: String, actual: String },

    #[error("Unrecognised patch format")]
    UnknownFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PatchFormat {
    Bps,
    Ips,
}

impl PatchFormat {
    pub fn detect(patch: &[u8]) -> Option<PatchFormat> {
        if patch.starts_with(bps::BPS_MAGIC) {
            Some(PatchFormat::Bps)
        } else if patch.starts_with(ips::IPS_MAGIC) {
            Some(PatchFormat::Ips)
        } else {
            None
        }
    }
}

/// Applies a BPS or IPS patch, picked by its magic bytes.
pub fn apply_patch(source: Vec<u8>, patch: &[u8]) -> Result<Vec<u8>, PatchError> {
    match PatchFormat::detect(patch) {
        Some(PatchFormat::Bps) => BpsPatch::parse(patch)?.apply(&source),
        Some(PatchFormat::Ips) => {
            let mut rom = source;
            apply_ips(&mut rom, patch)?;
            Ok(rom)
        }
        None => Err(PatchError::UnknownFormat),
    }
}

/// Compares the SHA-1 of `data` with a hex digest, ignoring case.
pub fn verify_sha1(data: &[u8], expected: &str) -> Result<(), PatchError> {
    let actual = sha1_smol::Sha1::from(data).digest().to_string();
    if actual != expected.trim().to_lowercase() {
        return Err(PatchError::Sha1Mismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
