//! Convenient imports for consumers of edn8-core
//!
//! Pull in everything commonly needed in one line:
//! ```rust
//! use edn8_core::prelude::*;
//! ```

// Device API
pub use crate::everdrive::loader::{GameLoadSession, LoadReport};
pub use crate::everdrive::port::{BAUD_RATE, LinkConfig};
pub use crate::everdrive::{DeviceError, Everdrive};

// Images and patches
pub use crate::patch::{PatchError, PatchFormat, apply_patch, verify_sha1};
pub use crate::rom::{Mirroring, NesRom, RomError};
pub use crate::testrom::TestRom;
