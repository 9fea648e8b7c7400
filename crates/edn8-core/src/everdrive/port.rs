use super::DeviceError;
use log::{debug, info};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::time::Duration;

pub const BAUD_RATE: u32 = 115_200;
pub const IDENTIFIER: &str = "EverDrive N8";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// How to reach the cartridge.
#[derive(Clone, Debug)]
pub struct LinkConfig {
    /// Device path; when unset the port is found by `identifier`
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Per-read timeout, a reply slower than this is a short read
    pub timeout: Duration,
    /// USB product string reported by the cartridge
    pub identifier: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
            identifier: IDENTIFIER.to_string(),
        }
    }
}

fn product(info: &SerialPortInfo) -> Option<&str> {
    match &info.port_type {
        SerialPortType::UsbPort(usb) => usb.product.as_deref(),
        _ => None,
    }
}

/// Returns the name of the first port whose USB product string matches.
pub fn find_port(identifier: &str) -> Result<String, DeviceError> {
    for port in serialport::available_ports()? {
        let description = product(&port);
        debug!("Found {}: {}", port.port_name, description.unwrap_or("n/a"));
        if description == Some(identifier) {
            info!("Everdrive found on {}", port.port_name);
            return Ok(port.port_name);
        }
    }
    Err(DeviceError::DeviceNotFound(identifier.to_string()))
}

pub fn open_port(config: &LinkConfig) -> Result<Box<dyn SerialPort>, DeviceError> {
    let path = match &config.port {
        Some(path) => path.clone(),
        None => find_port(&config.identifier)?,
    };
    debug!("Opening {path} at {} baud", config.baud_rate);
    let port = serialport::new(&path, config.baud_rate)
        .timeout(config.timeout)
        .open()?;
    Ok(port)
}
