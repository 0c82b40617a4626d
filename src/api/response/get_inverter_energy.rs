use super::number;
use serde::Deserialize;

/// Raw `getInverterEnergy` payload, accumulators in tenths of a kWh.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InverterEnergy {
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_today: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_to_grid_today: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_to_user_today: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_charge_today: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_discharge_today: Option<f64>,

    #[serde(default, deserialize_with = "number::lenient")]
    pub e_total: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_to_grid_total: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_to_user_total: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_charge_total: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub e_discharge_total: Option<f64>,
}
