use crate::api::response::get_inverter_energy::InverterEnergy;
use crate::api::response::get_inverter_runtime::InverterRuntime;
use crate::model::{
    Battery, Eps, EnergySnapshot, EnergyTotals, Grid, Load, PvString, RuntimeSnapshot, Solar,
    Temperatures,
};

const UNIT: f64 = 1.0;
const DECI: f64 = 10.0;
const CENTI: f64 = 100.0;

const UNKNOWN: &str = "Unknown";

fn required(raw: Option<f64>, divisor: f64) -> f64 {
    raw.unwrap_or(0.0) / divisor
}

fn optional(raw: Option<f64>, divisor: f64) -> Option<f64> {
    raw.map(|v| v / divisor)
}

fn nonzero(raw: Option<f64>, divisor: f64) -> Option<f64> {
    raw.filter(|v| *v != 0.0).map(|v| v / divisor)
}

fn text(raw: &Option<String>) -> String {
    raw.clone().unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn normalize(runtime: &InverterRuntime, energy: Option<&InverterEnergy>) -> RuntimeSnapshot {
    RuntimeSnapshot {
        time: text(&runtime.device_time),
        status: text(&runtime.status_text),
        battery: Battery {
            soc: required(runtime.soc, UNIT),
            power: required(runtime.bat_power, UNIT),
            voltage: required(runtime.v_bat, DECI),
            current: optional(runtime.i_bat, DECI),
            temperature: optional(runtime.bat_temp, UNIT),
        },
        solar: Solar {
            pv1: PvString {
                voltage: required(runtime.vpv1, DECI),
                current: required(runtime.ipv1, DECI),
                power: required(runtime.ppv1, UNIT),
            },
            pv2: PvString {
                voltage: required(runtime.vpv2, DECI),
                current: required(runtime.ipv2, DECI),
                power: required(runtime.ppv2, UNIT),
            },
            total_power: required(runtime.ppv, UNIT),
        },
        grid: Grid {
            voltage: required(runtime.vgrid, DECI),
            frequency: nonzero(runtime.fgrid, CENTI),
            power: required(runtime.pgrid, UNIT),
            current: required(runtime.igrid, DECI),
        },
        load: Load {
            power: required(runtime.pload, UNIT),
            current: optional(runtime.iload, DECI),
        },
        eps: Eps {
            voltage: optional(runtime.veps, DECI),
            frequency: optional(runtime.feps, CENTI),
            power: optional(runtime.peps, UNIT),
        },
        temperature: Temperatures {
            inverter: optional(runtime.temp, UNIT),
            environment: optional(runtime.env_temp, UNIT),
        },
        energy: energy.map(normalize_energy),
    }
}

/// Accumulators arrive in tenths of a kWh.
pub fn normalize_energy(energy: &InverterEnergy) -> EnergySnapshot {
    EnergySnapshot {
        today: EnergyTotals {
            solar_generation: required(energy.e_today, DECI),
            grid_import: required(energy.e_to_grid_today, DECI),
            grid_export: required(energy.e_to_user_today, DECI),
            battery_charge: required(energy.e_charge_today, DECI),
            battery_discharge: required(energy.e_discharge_today, DECI),
        },
        total: EnergyTotals {
            solar_generation: required(energy.e_total, DECI),
            grid_import: required(energy.e_to_grid_total, DECI),
            grid_export: required(energy.e_to_user_total, DECI),
            battery_charge: required(energy.e_charge_total, DECI),
            battery_discharge: required(energy.e_discharge_total, DECI),
        },
    }
}
