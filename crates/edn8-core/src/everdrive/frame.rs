use std::fmt;

const FRAME_MARKER: u8 = b'+';

/// Four byte header preceding every command: `['+', !'+', cmd, !cmd]`.
///
/// The complemented copies let the firmware reject frames damaged by line noise.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommandFrame([u8; 4]);

impl CommandFrame {
    pub fn new(command: u8) -> Self {
        Self([FRAME_MARKER, FRAME_MARKER ^ 0xFF, command, command ^ 0xFF])
    }

    /// Accepts raw bytes only if both complement pairs hold.
    pub fn parse(bytes: [u8; 4]) -> Option<Self> {
        let valid = bytes[0] == FRAME_MARKER
            && bytes[1] == bytes[0] ^ 0xFF
            && bytes[3] == bytes[2] ^ 0xFF;
        valid.then_some(Self(bytes))
    }

    pub fn command(&self) -> u8 {
        self.0[2]
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a:02x}{b:02x}{c:02x}{d:02x}")
    }
}
