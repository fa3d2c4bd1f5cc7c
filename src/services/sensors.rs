//! Sensor Entities.
//! Declarative table mapping snapshot fields to Home Assistant sensors.
use strum_macros::{Display, EnumString};

use super::coordinator::Snapshot;
use crate::integration::homeassistant::Sensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SensorKey {
    BatterySoc,
    PowerGridPower,
    PvPower,
    LoadPower,
    EnergyPower,
    GridImportEnergy,
    GridExportEnergy,
    SolarGenerationEnergy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    Battery,
    Power,
    Energy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

pub struct SensorDescription {
    pub key: SensorKey,
    pub name: &'static str,
    pub unit: &'static str,
    pub device_class: DeviceClass,
    pub state_class: StateClass,
    /// Decimals of the published state.
    pub precision: usize,
    pub value_fn: fn(&Snapshot) -> Option<f64>,
}

impl std::fmt::Debug for SensorDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorDescription")
            .field("key", &self.key)
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

impl PartialEq for SensorDescription {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

pub static SENSORS: [SensorDescription; 8] = [
    SensorDescription {
        key: SensorKey::BatterySoc,
        name: "Battery State of Charge",
        unit: "%",
        device_class: DeviceClass::Battery,
        state_class: StateClass::Measurement,
        precision: 1,
        value_fn: |s| s.power_flow.energy_soc,
    },
    SensorDescription {
        key: SensorKey::PowerGridPower,
        name: "Grid Power",
        unit: "kW",
        device_class: DeviceClass::Power,
        state_class: StateClass::Measurement,
        precision: 2,
        value_fn: |s| s.power_flow.power_grid_power,
    },
    SensorDescription {
        key: SensorKey::PvPower,
        name: "PV Power",
        unit: "kW",
        device_class: DeviceClass::Power,
        state_class: StateClass::Measurement,
        precision: 2,
        value_fn: |s| s.power_flow.pv_power,
    },
    SensorDescription {
        key: SensorKey::LoadPower,
        name: "Load Power",
        unit: "kW",
        device_class: DeviceClass::Power,
        state_class: StateClass::Measurement,
        precision: 2,
        value_fn: |s| s.power_flow.load_power,
    },
    SensorDescription {
        key: SensorKey::EnergyPower,
        name: "Battery Power",
        unit: "kW",
        device_class: DeviceClass::Power,
        state_class: StateClass::Measurement,
        precision: 2,
        value_fn: |s| s.power_flow.energy_power,
    },
    SensorDescription {
        key: SensorKey::GridImportEnergy,
        name: "Grid Import Energy Today",
        unit: "kWh",
        device_class: DeviceClass::Energy,
        state_class: StateClass::TotalIncreasing,
        precision: 1,
        value_fn: |s| s.todays_grid.as_ref().and_then(|r| r.positive),
    },
    SensorDescription {
        key: SensorKey::GridExportEnergy,
        name: "Grid Export Energy Today",
        unit: "kWh",
        device_class: DeviceClass::Energy,
        state_class: StateClass::TotalIncreasing,
        precision: 1,
        value_fn: |s| s.todays_grid.as_ref().and_then(|r| r.negative),
    },
    SensorDescription {
        key: SensorKey::SolarGenerationEnergy,
        name: "Solar Generation Today",
        unit: "kWh",
        device_class: DeviceClass::Energy,
        state_class: StateClass::TotalIncreasing,
        precision: 1,
        value_fn: |s| s.todays_solar.as_ref().and_then(|r| r.power_generation),
    },
];

/// Value of one sensor for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorValue {
    pub description: &'static SensorDescription,
    pub value: Option<f64>,
}

impl SensorValue {
    pub fn key(&self) -> SensorKey {
        self.description.key
    }

    /// Home Assistant sensor of this value for `site_id`.
    pub fn to_sensor(&self, site_id: &str) -> Sensor {
        let description = self.description;
        Sensor {
            entity_id: entity_id(site_id, description.key),
            friendly_name: description.name.to_string(),
            value: self.value,
            precision: description.precision,
            unit_of_measurement: Some(description.unit.to_string()),
            device_class: Some(description.device_class.to_string()),
            state_class: Some(description.state_class.to_string()),
        }
    }
}

/// Values of every sensor. A missing source field gives a `None` value.
pub fn sensor_values(snapshot: &Snapshot) -> impl Iterator<Item = SensorValue> + '_ {
    SENSORS.iter().map(|description| SensorValue {
        description,
        value: (description.value_fn)(snapshot),
    })
}

/// Entity id `sensor.livoltek_<site>_<key>`, the site id lower-cased with
/// anything but ASCII alphanumerics replaced by `_`.
pub fn entity_id(site_id: &str, key: SensorKey) -> String {
    let site: String = site_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("sensor.livoltek_{site}_{key}")
}
