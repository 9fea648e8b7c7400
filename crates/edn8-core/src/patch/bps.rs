use super::PatchError;
use super::number::{decode_number, decode_offset, decode_size};
use log::debug;

pub const BPS_MAGIC: &[u8; 4] = b"BPS1";
/// Source, target and patch CRC32s
const FOOTER_LEN: usize = 12;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Action {
    /// Copy from the source at the current output position
    SourceRead,
    /// Copy literal bytes out of the patch
    TargetRead,
    /// Copy from anywhere in the source
    SourceCopy,
    /// Copy from earlier output, ranges may overlap
    TargetCopy,
}

impl Action {
    fn decode(word: u64) -> Result<(Action, usize), PatchError> {
        let action = match word & 0b11 {
            0 => Action::SourceRead,
            1 => Action::TargetRead,
            2 => Action::SourceCopy,
            _ => Action::TargetCopy,
        };
        let length = usize::try_from(word >> 2)
            .ok()
            .and_then(|l| l.checked_add(1))
            .ok_or(PatchError::NumberOverflow)?;
        Ok((action, length))
    }

    fn name(self) -> &'static str {
        match self {
            Action::SourceRead => "SourceRead",
            Action::TargetRead => "TargetRead",
            Action::SourceCopy => "SourceCopy",
            Action::TargetCopy => "TargetCopy",
        }
    }
}

/// A parsed BPS patch. The patch checksum has already been verified.
#[derive(Clone, Debug)]
pub struct BpsPatch {
    pub source_size: usize,
    pub target_size: usize,
    pub metadata: String,
    pub(crate) actions: Vec<u8>,
    pub source_checksum: u32,
    pub target_checksum: u32,
    pub patch_checksum: u32,
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn bounded(action: Action, offset: i64, length: usize, limit: usize) -> Result<usize, PatchError> {
    let out_of_bounds = || PatchError::OutOfBounds {
        action: action.name(),
        offset,
        length,
    };
    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    match start.checked_add(length) {
        Some(end) if end <= limit => Ok(start),
        _ => Err(out_of_bounds()),
    }
}

fn advance(offset: i64, delta: i64) -> Result<i64, PatchError> {
    offset.checked_add(delta).ok_or(PatchError::NumberOverflow)
}

impl BpsPatch {
    pub fn parse(patch: &[u8]) -> Result<BpsPatch, PatchError> {
        if !patch.starts_with(BPS_MAGIC) {
            return Err(PatchError::BadMagic {
                expected: "BPS1",
                found: patch[..patch.len().min(4)].to_vec(),
            });
        }
        if patch.len() < BPS_MAGIC.len() + FOOTER_LEN {
            return Err(PatchError::TooShort(patch.len()));
        }

        let footer = patch.len() - FOOTER_LEN;
        let source_checksum = read_u32_le(&patch[footer..]);
        let target_checksum = read_u32_le(&patch[footer + 4..]);
        let patch_checksum = read_u32_le(&patch[footer + 8..]);

        // Covers everything but the patch checksum itself
        let actual = crc32fast::hash(&patch[..patch.len() - 4]);
        if actual != patch_checksum {
            return Err(PatchError::PatchChecksum {
                expected: patch_checksum,
                actual,
            });
        }

        let body = &patch[BPS_MAGIC.len()..footer];
        let mut pos = 0;
        let source_size = decode_size(body, &mut pos)?;
        let target_size = decode_size(body, &mut pos)?;
        let metadata_size = decode_size(body, &mut pos)?;

        let metadata_end = pos
            .checked_add(metadata_size)
            .filter(|&end| end <= body.len())
            .ok_or(PatchError::Truncated("metadata"))?;
        let metadata = String::from_utf8_lossy(&body[pos..metadata_end]).into_owned();

        debug!("BPS patch: source={source_size} target={target_size} metadata={metadata_size}");
        Ok(BpsPatch {
            source_size,
            target_size,
            metadata,
            actions: body[metadata_end..].to_vec(),
            source_checksum,
            target_checksum,
            patch_checksum,
        })
    }

    pub fn actions(&self) -> &[u8] {
        &self.actions
    }

    /// Builds the target image from `source`.
    ///
    /// The source is checked against its size and CRC32 before decoding; the
    /// result is only returned if its CRC32 matches the patch.
    pub fn apply(&self, source: &[u8]) -> Result<Vec<u8>, PatchError> {
        if source.len() != self.source_size {
            return Err(PatchError::SourceSize {
                expected: self.source_size,
                actual: source.len(),
            });
        }
        let actual = crc32fast::hash(source);
        if actual != self.source_checksum {
            return Err(PatchError::SourceChecksum {
                expected: self.source_checksum,
                actual,
            });
        }

        let target = self.decode_actions(source)?;

        let actual = crc32fast::hash(&target);
        if actual != self.target_checksum {
            return Err(PatchError::TargetChecksum {
                expected: self.target_checksum,
                actual,
            });
        }
        Ok(target)
    }

    fn decode_actions(&self, source: &[u8]) -> Result<Vec<u8>, PatchError> {
        let actions = &self.actions[..];
        let mut target = vec![0u8; self.target_size];
        let mut pos = 0;

        let mut output_offset = 0usize;
        let mut source_relative_offset = 0i64;
        let mut target_relative_offset = 0i64;

        while pos < actions.len() {
            let (action, length) = Action::decode(decode_number(actions, &mut pos)?)?;
            debug!("BPS action {action:?}, length {length}");

            let out = bounded(action, output_offset as i64, length, target.len())?;
            let out_end = out + length;

            match action {
                Action::SourceRead => {
                    let start = bounded(action, out as i64, length, source.len())?;
                    target[out..out_end].copy_from_slice(&source[start..start + length]);
                }
                Action::TargetRead => {
                    let data = pos
                        .checked_add(length)
                        .and_then(|end| actions.get(pos..end))
                        .ok_or(PatchError::Truncated("TargetRead data"))?;
                    target[out..out_end].copy_from_slice(data);
                    pos += length;
                }
                Action::SourceCopy => {
                    source_relative_offset =
                        advance(source_relative_offset, decode_offset(actions, &mut pos)?)?;
                    let start = bounded(action, source_relative_offset, length, source.len())?;
                    target[out..out_end].copy_from_slice(&source[start..start + length]);
                    source_relative_offset += length as i64;
                }
                Action::TargetCopy => {
                    target_relative_offset =
                        advance(target_relative_offset, decode_offset(actions, &mut pos)?)?;
                    let start = bounded(action, target_relative_offset, length, target.len())?;
                    // Byte by byte: the ranges may overlap to repeat a pattern
                    for i in 0..length {
                        target[out + i] = target[start + i];
                    }
                    target_relative_offset += length as i64;
                }
            }
            output_offset = out_end;
        }

        Ok(target)
    }
}
