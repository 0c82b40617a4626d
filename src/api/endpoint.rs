pub type Endpoint = str;

pub const LOGIN: &Endpoint = "/web/login";
pub const MONITOR_INVERTER: &Endpoint = "/web/monitor/inverter";
pub const INVERTER_LIST: &Endpoint = "/api/inverter/getInverterList";
pub const DEVICE_LIST: &Endpoint = "/api/device/list";
pub const INVERTER_RUNTIME: &Endpoint = "/api/inverter/getInverterRuntime";
pub const INVERTER_ENERGY: &Endpoint = "/api/inverter/getInverterEnergy";
