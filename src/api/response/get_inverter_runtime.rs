use super::number;
use serde::Deserialize;

/// Raw `getInverterRuntime` payload. Every reading is optional: a missing key
/// is `None` and the normalizer decides what absence means for that field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InverterRuntime {
    pub device_time: Option<String>,
    pub status_text: Option<String>,

    #[serde(default, deserialize_with = "number::lenient")]
    pub soc: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub bat_power: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub v_bat: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub i_bat: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub bat_temp: Option<f64>,

    #[serde(default, deserialize_with = "number::lenient")]
    pub vpv1: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub ipv1: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub ppv1: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub vpv2: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub ipv2: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub ppv2: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub ppv: Option<f64>,

    #[serde(default, deserialize_with = "number::lenient")]
    pub vgrid: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub fgrid: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub pgrid: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub igrid: Option<f64>,

    #[serde(default, deserialize_with = "number::lenient")]
    pub pload: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub iload: Option<f64>,

    #[serde(default, deserialize_with = "number::lenient")]
    pub veps: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub feps: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub peps: Option<f64>,

    #[serde(default, deserialize_with = "number::lenient")]
    pub temp: Option<f64>,
    #[serde(default, deserialize_with = "number::lenient")]
    pub env_temp: Option<f64>,
}
