#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Context;
use clap::{CommandFactory, Parser, ValueEnum};
use edn8_core::everdrive::memory::format_state;
use edn8_core::prelude::*;
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TestRomArg {
    Fifo,
    Hello,
}

impl From<TestRomArg> for TestRom {
    fn from(arg: TestRomArg) -> Self {
        match arg {
            TestRomArg::Fifo => TestRom::Fifo,
            TestRomArg::Hello => TestRom::HelloWorld,
        }
    }
}

/// Load NES games onto an EverDrive N8 PRO over USB
#[derive(Parser, Debug)]
#[command(name = "edn8", version)]
struct Args {
    /// Load this rom
    rom: Option<PathBuf>,

    /// Apply an .ips or .bps patch to the rom first
    #[arg(short, long, requires = "rom")]
    patch: Option<PathBuf>,

    /// sha1sum to validate the patched rom
    #[arg(short, long, requires = "patch")]
    sha1sum: Option<String>,

    /// Launch a built-in test rom
    #[arg(short, long, value_enum, num_args = 0..=1, default_missing_value = "fifo")]
    test: Option<TestRomArg>,

    /// Dump the cartridge state registers
    #[arg(short = 'S', long)]
    print_state: bool,

    /// Serial device to use instead of searching for the cartridge
    #[arg(long)]
    port: Option<String>,

    #[arg(long, default_value_t = BAUD_RATE)]
    baud: u32,

    /// Read timeout in milliseconds
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,

    /// Log protocol traffic
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn link_config(&self) -> LinkConfig {
        LinkConfig {
            port: self.port.clone(),
            baud_rate: self.baud,
            timeout: Duration::from_millis(self.timeout_ms),
            ..LinkConfig::default()
        }
    }
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn patched_name(patch_path: &Path) -> String {
    let stem = patch_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "patched".to_string());
    format!("{stem}.nes")
}

fn open_rom_with_patch(
    rom_path: &Path,
    patch_path: &Path,
    sha1sum: Option<&str>,
) -> anyhow::Result<NesRom> {
    let rom = std::fs::read(rom_path)
        .with_context(|| format!("Failed to read ROM '{}'", rom_path.display()))?;
    let patch = std::fs::read(patch_path)
        .with_context(|| format!("Failed to read patch '{}'", patch_path.display()))?;

    let patched = apply_patch(rom, &patch)
        .with_context(|| format!("Failed to apply '{}'", patch_path.display()))?;
    if let Some(expected) = sha1sum {
        verify_sha1(&patched, expected).context("Patched ROM failed verification")?;
        info!("Valid sha1sum");
    }

    let rom = NesRom::parse(patched, patched_name(patch_path)).context("Rom parsing failed")?;
    Ok(rom)
}

fn select_rom(args: &Args) -> anyhow::Result<Option<NesRom>> {
    if let (Some(rom_path), Some(patch_path)) = (&args.rom, &args.patch) {
        return open_rom_with_patch(rom_path, patch_path, args.sha1sum.as_deref()).map(Some);
    }
    if let Some(rom_path) = &args.rom {
        let rom = NesRom::from_file(rom_path)
            .with_context(|| format!("Failed to load ROM '{}'", rom_path.display()))?;
        return Ok(Some(rom));
    }
    if let Some(test) = args.test {
        let test = TestRom::from(test);
        info!("Launching {} test rom", test.file_name());
        let raw = test.build().context("Embedded test rom is corrupt")?;
        let rom = NesRom::parse(raw, test.file_name()).context("Rom parsing failed")?;
        return Ok(Some(rom));
    }
    Ok(None)
}

fn run(args: Args) -> anyhow::Result<()> {
    let rom = select_rom(&args)?;
    if rom.is_none() && !args.print_state {
        Args::command().print_help()?;
        return Ok(());
    }

    let mut everdrive =
        Everdrive::connect(&args.link_config()).context("Unable to open the cartridge link")?;

    if let Some(rom) = rom {
        let report = everdrive
            .load_game(&rom)
            .with_context(|| format!("Failed to start '{}'", rom.name))?;
        info!("Mapper {} running on {}", rom.mapper, report.core_path);
    } else {
        let state = everdrive.read_state().context("Failed to read state")?;
        for line in format_state(&state) {
            println!("{line}");
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
