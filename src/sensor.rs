use crate::model::RuntimeSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Watt,
    Volt,
    Hertz,
    KiloWattHour,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Watt => "W",
            Unit::Volt => "V",
            Unit::Hertz => "Hz",
            Unit::KiloWattHour => "kWh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Battery,
    Power,
    Voltage,
    Frequency,
    Energy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Unit,
    pub device_class: DeviceClass,
    pub state_class: StateClass,
    pub value: fn(&RuntimeSnapshot) -> Option<f64>,
}

impl SensorDescription {
    /// Current reading, `None` when the snapshot carries no value for it.
    pub fn read(&self, snapshot: &RuntimeSnapshot) -> Option<f64> {
        (self.value)(snapshot)
    }
}

macro_rules! measurement {
    ($key:expr, $name:expr, $unit:ident, $class:ident, $value:expr $(,)?) => {
        SensorDescription {
            key: $key,
            name: $name,
            unit: Unit::$unit,
            device_class: DeviceClass::$class,
            state_class: StateClass::Measurement,
            value: $value,
        }
    };
}

macro_rules! energy {
    ($key:expr, $name:expr, $value:expr $(,)?) => {
        SensorDescription {
            key: $key,
            name: $name,
            unit: Unit::KiloWattHour,
            device_class: DeviceClass::Energy,
            state_class: StateClass::TotalIncreasing,
            value: $value,
        }
    };
}

pub const SENSORS: &[SensorDescription] = &[
    measurement!(
        "battery_soc",
        "Battery State of Charge",
        Percent,
        Battery,
        |s| Some(s.battery.soc),
    ),
    measurement!("battery_power", "Battery Power", Watt, Power, |s| Some(s.battery.power)),
    measurement!("battery_voltage", "Battery Voltage", Volt, Voltage, |s| Some(s.battery.voltage)),
    measurement!("solar_power", "Solar Power", Watt, Power, |s| Some(s.solar.total_power)),
    measurement!("pv1_power", "PV1 Power", Watt, Power, |s| Some(s.solar.pv1.power)),
    measurement!("pv2_power", "PV2 Power", Watt, Power, |s| Some(s.solar.pv2.power)),
    measurement!("grid_power", "Grid Power", Watt, Power, |s| Some(s.grid.power)),
    measurement!("grid_voltage", "Grid Voltage", Volt, Voltage, |s| Some(s.grid.voltage)),
    measurement!("grid_frequency", "Grid Frequency", Hertz, Frequency, |s| s.grid.frequency),
    measurement!("load_power", "Load Power", Watt, Power, |s| Some(s.load.power)),
    measurement!("eps_power", "EPS Power", Watt, Power, |s| s.eps.power),
    measurement!("eps_frequency", "EPS Frequency", Hertz, Frequency, |s| s.eps.frequency),
    energy!(
        "today_solar",
        "Today's Solar Generation",
        |s| s.energy.as_ref().map(|e| e.today.solar_generation),
    ),
    energy!(
        "today_grid_import",
        "Today's Grid Import",
        |s| s.energy.as_ref().map(|e| e.today.grid_import),
    ),
    energy!(
        "today_grid_export",
        "Today's Grid Export",
        |s| s.energy.as_ref().map(|e| e.today.grid_export),
    ),
    energy!(
        "total_solar",
        "Total Solar Generation",
        |s| s.energy.as_ref().map(|e| e.total.solar_generation),
    ),
    energy!(
        "total_grid_import",
        "Total Grid Import",
        |s| s.energy.as_ref().map(|e| e.total.grid_import),
    ),
    energy!(
        "total_grid_export",
        "Total Grid Export",
        |s| s.energy.as_ref().map(|e| e.total.grid_export),
    ),
];

pub fn find(key: &str) -> Option<&'static SensorDescription> {
    SENSORS.iter().find(|sensor| sensor.key == key)
}
