//! Locate an instrument's serial port from its USB IDs.
//!
//! Ports are enumerated with [`tokio_serial::available_ports`], which
//! reports the vendor and product ID of every USB serial bridge. The
//! matching itself is a plain filter over the enumerated
//! [`SerialPortInfo`] values.

use tokio_serial::{SerialPortInfo, SerialPortType};

use rfmon_core::error::{Error, Result};

/// A USB vendor/product ID pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl UsbId {
    /// Whether `port` is a USB serial port of this device.
    pub fn matches(&self, port: &SerialPortInfo) -> bool {
        match &port.port_type {
            SerialPortType::UsbPort(usb) => {
                usb.vid == self.vendor_id && usb.pid == self.product_id
            }
            _ => false,
        }
    }
}

/// Silicon Labs CP210x bridge used by RF Explorer analyzers.
pub const RF_EXPLORER: UsbId = UsbId {
    vendor_id: 0x10c4,
    product_id: 0xea60,
};

/// WCH CH340 bridge used by PM8000 power meters.
pub const POWER_METER: UsbId = UsbId {
    vendor_id: 0x1a86,
    product_id: 0x7523,
};

/// Names of the ports in `ports` that belong to `id`, sorted so the same
/// hardware always resolves to the same port.
pub fn matching_ports(ports: &[SerialPortInfo], id: UsbId) -> Vec<String> {
    let mut names: Vec<String> = ports
        .iter()
        .filter(|port| id.matches(port))
        .map(|port| port.port_name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// First port in `ports` that belongs to `id`.
pub fn select_port(ports: &[SerialPortInfo], id: UsbId) -> Result<String> {
    matching_ports(ports, id)
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound {
            vendor_id: id.vendor_id,
            product_id: id.product_id,
        })
}

/// Serial ports of attached devices matching `id`.
pub fn find_serial_ports(id: UsbId) -> Result<Vec<String>> {
    Ok(matching_ports(&enumerate()?, id))
}

/// Pick the port to open: an explicit one wins, otherwise the first
/// attached device matching `id`.
pub fn resolve_port(explicit: Option<&str>, id: UsbId) -> Result<String> {
    if let Some(port) = explicit {
        return Ok(port.to_string());
    }
    let port = select_port(&enumerate()?, id)?;
    tracing::debug!(port = %port, vendor_id = id.vendor_id, product_id = id.product_id, "found device");
    Ok(port)
}

fn enumerate() -> Result<Vec<SerialPortInfo>> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| Error::Transport(format!("cannot enumerate serial ports: {e}")))?;
    tracing::trace!(count = ports.len(), "enumerated serial ports");
    Ok(ports)
}
