use super::PatchError;
use log::debug;

pub const IPS_MAGIC: &[u8; 5] = b"PATCH";
const IPS_EOF: &[u8; 3] = b"EOF";

fn read_be(bytes: &[u8]) -> usize {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | b as usize)
}

fn write_at(rom: &mut Vec<u8>, offset: usize, data: impl ExactSizeIterator<Item = u8>) {
    let end = offset + data.len();
    if rom.len() < end {
        rom.resize(end, 0);
    }
    for (slot, byte) in rom[offset..end].iter_mut().zip(data) {
        *slot = byte;
    }
}

/// Applies an IPS patch in place. Records past the end grow the image.
pub fn apply_ips(rom: &mut Vec<u8>, patch: &[u8]) -> Result<(), PatchError> {
    if !patch.starts_with(IPS_MAGIC) {
        return Err(PatchError::BadMagic {
            expected: "PATCH",
            found: patch[..patch.len().min(5)].to_vec(),
        });
    }

    let mut ptr = IPS_MAGIC.len();
    while ptr < patch.len() {
        // An offset of 0x454F46 is also "EOF", so only a trailing marker ends the patch
        if &patch[ptr..] == IPS_EOF {
            break;
        }

        let record = patch
            .get(ptr..ptr + 5)
            .ok_or(PatchError::Truncated("an IPS record header"))?;
        let offset = read_be(&record[0..3]);
        let size = read_be(&record[3..5]);
        ptr += 5;

        if size > 0 {
            let data = patch
                .get(ptr..ptr + size)
                .ok_or(PatchError::Truncated("IPS record data"))?;
            debug!("IPS write {size} at {offset:06x}");
            write_at(rom, offset, data.iter().copied());
            ptr += size;
        } else {
            let run = patch
                .get(ptr..ptr + 3)
                .ok_or(PatchError::Truncated("an IPS run record"))?;
            let count = read_be(&run[0..2]);
            debug!("IPS fill {count} x {:02x} at {offset:06x}", run[2]);
            write_at(rom, offset, std::iter::repeat_n(run[2], count));
            ptr += 3;
        }
    }
    Ok(())
}
