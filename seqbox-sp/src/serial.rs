//! Real serial port implementation of [`Channel`] and port enumeration

use std::io::Write;
use std::time::Duration;

use tracing::{debug, info};

use crate::channel::{Channel, ChannelError, BAUD_RATE};
use crate::error::{Error, Result};

/// Settle time after opening the port. Arduino-class boards reset when the
/// serial connection opens and drop bytes until the bootloader hands off.
pub const RESET_SETTLE: Duration = Duration::from_secs(2);

/// An available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// OS device name (`/dev/ttyACM0`, `COM9`, ...)
    pub name: String,
    /// Human-readable description, when the OS provides one
    pub description: Option<String>,
}

/// Enumerate serial ports available on this machine
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()
        .map_err(|e| Error::Internal(format!("port enumeration failed: {}", e)))?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                serialport::SerialPortType::UsbPort(usb) => usb.product.or(usb.manufacturer),
                serialport::SerialPortType::PciPort => Some("PCI serial device".to_string()),
                serialport::SerialPortType::BluetoothPort => {
                    Some("Bluetooth serial device".to_string())
                }
                serialport::SerialPortType::Unknown => None,
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect())
}

/// [`Channel`] over a physical serial port at the fixed device baud rate
pub struct SerialChannel {
    port_name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialChannel {
    /// Open `port_name` at the protocol baud rate (9600)
    pub fn open(port_name: &str, read_timeout: Duration) -> std::result::Result<Self, ChannelError> {
        let port = serialport::new(port_name, BAUD_RATE)
            .timeout(read_timeout)
            .open()
            .map_err(|e| ChannelError::OpenFailed {
                port: port_name.to_string(),
                details: e.to_string(),
            })?;

        info!("Opened serial port {} at {} baud", port_name, BAUD_RATE);
        Ok(Self {
            port_name: port_name.to_string(),
            port: Some(port),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    #[cfg(test)]
    fn detached(port_name: &str) -> Self {
        Self {
            port_name: port_name.to_string(),
            port: None,
        }
    }
}

impl Channel for SerialChannel {
    fn write(&mut self, bytes: &[u8]) -> std::result::Result<(), ChannelError> {
        let port = self.port.as_mut().ok_or(ChannelError::Closed)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed serial port {}", self.port_name);
        }
    }
}
