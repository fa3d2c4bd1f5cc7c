//! Device Registry.
//! Physical devices of the site, keyed by serial number.
use std::collections::HashMap;

use crate::integration::livoltek::schemas::DeviceDetails;

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEntry {
    pub id: String,
    pub serial_number: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
}

impl From<DeviceDetails> for DeviceEntry {
    fn from(details: DeviceDetails) -> Self {
        DeviceEntry {
            name: format!("Livoltek {}", details.inverter_sn),
            id: details.id,
            serial_number: details.inverter_sn,
            manufacturer: details.device_manufacturer,
            model: details.product_type,
            sw_version: details.firmware_version,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    devices: HashMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, serial_number: &str) -> bool {
        self.devices.contains_key(serial_number)
    }

    pub fn get(&self, serial_number: &str) -> Option<&DeviceEntry> {
        self.devices.get(serial_number)
    }

    /// Insert or replace the entry of `entry.serial_number`.
    /// Returns `true` when the device was not registered yet.
    pub fn upsert(&mut self, entry: DeviceEntry) -> bool {
        self.devices
            .insert(entry.serial_number.clone(), entry)
            .is_none()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.devices.values()
    }
}
