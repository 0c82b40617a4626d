use serde::Deserialize;
use serde_json::Value;

/* POST /api/inverter/getInverterList */
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub serial_num: Option<String>,
}

#[derive(Deserialize)]
pub struct GetInverterList {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub rows: Vec<Row>,
}

/* POST /api/device/list, `data` is not always a list */
#[derive(Deserialize)]
pub struct GetDeviceList {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Value,
}
