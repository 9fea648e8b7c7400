// EverDrive N8 link modules
pub mod everdrive;
pub mod patch;
pub mod prelude;
pub mod rom;
pub mod testrom;

// Re-exports
pub use everdrive::{DeviceError, Everdrive};

pub use patch::PatchError;
pub use rom::{NesRom, RomError};
