use crate::api::{self, response::get_device_list::{GetDeviceList, GetInverterList}};
use crate::model::{Portal, SerialNumber, Session};
use regex::Regex;

lazy_static! {
    static ref SERIAL_PATTERNS: Vec<Regex> = [
        r#"(?i)serialNum["']?\s*[:=]\s*["']([^"']+)["']"#,
        r#"(?i)serialNumber["']?\s*[:=]\s*["']([^"']+)["']"#,
        r#"(?i)sn["']?\s*[:=]\s*["']([^"']+)["']"#,
        r#"(?i)deviceSn["']?\s*[:=]\s*["']([^"']+)["']"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Scrape the inverter monitor page.
    MonitorPage,
    /// `rows[0].serialNum` of the inverter list.
    InverterList,
    /// `data[0].sn` (or `serialNum`) of the generic device list.
    DeviceList,
}

pub const STRATEGIES: [Strategy; 3] = [
    Strategy::MonitorPage,
    Strategy::InverterList,
    Strategy::DeviceList,
];

fn non_empty(serial: Option<&str>) -> Option<SerialNumber> {
    serial
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// First match of the first serial pattern that matches anywhere in `html`.
pub fn serial_from_html(html: &str) -> Option<SerialNumber> {
    SERIAL_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(html)
            .find_map(|c| non_empty(c.get(1).map(|m| m.as_str())))
    })
}

pub fn serial_from_inverter_list(list: &GetInverterList) -> Option<SerialNumber> {
    if !list.success {
        return None;
    }
    list.rows
        .first()
        .and_then(|row| non_empty(row.serial_num.as_deref()))
}

pub fn serial_from_device_list(list: &GetDeviceList) -> Option<SerialNumber> {
    if !list.success {
        return None;
    }
    let device = list.data.as_array().and_then(|devices| devices.first())?;

    ["sn", "serialNum"]
        .iter()
        .find_map(|key| non_empty(device.get(key).and_then(serde_json::Value::as_str)))
}

async fn attempt(
    strategy: Strategy,
    portal: &Portal,
    session: &mut Session,
) -> Result<Option<SerialNumber>, api::Error> {
    match strategy {
        Strategy::MonitorPage => api::monitor_page(portal, session)
            .await
            .map(|html| serial_from_html(&html)),
        Strategy::InverterList => api::inverter_list(portal, session)
            .await
            .map(|list| serial_from_inverter_list(&list)),
        Strategy::DeviceList => api::device_list(portal, session)
            .await
            .map(|list| serial_from_device_list(&list)),
    }
}

/// Run every strategy in order until one yields a serial number.
///
/// Failures of individual strategies are logged and skipped.
pub async fn resolve(portal: &Portal, session: &mut Session) -> Option<SerialNumber> {
    for strategy in STRATEGIES.iter() {
        match attempt(*strategy, portal, session).await {
            Ok(Some(serial)) => {
                log::debug!("Found serial number via {:?}: {}", strategy, serial);
                return Some(serial);
            }
            Ok(None) => log::debug!("No serial number via {:?}", strategy),
            Err(e) => log::warn!("Serial number lookup via {:?} failed: {}", strategy, e),
        }
    }

    log::error!("Could not find serial number after trying all methods");
    None
}
