use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::SET_COOKIE;
use reqwest::Url;
use serde::Serialize;
use std::fmt;

type Percent = f64;
type Watts = f64;
type Volts = f64;
type Amps = f64;
type Hertz = f64;
type Celsius = f64;
type KWh = f64;

pub type SerialNumber = String;

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Portal location plus the HTTP client handle borrowed from the host.
#[derive(Debug, Clone)]
pub struct Portal {
    pub base_url: String,
    pub client: reqwest::Client,
}

/// Authentication state of one client instance.
///
/// Cookies are kept in a jar of their own rather than in the HTTP client so that
/// a client shared with other consumers never carries this session.
#[derive(Debug, Default)]
pub struct Session {
    jar: Jar,
    pub logged_in: bool,
}

impl Session {
    /// Fold the `Set-Cookie` headers of `response` into the jar. Expired
    /// cookies evict the stored ones.
    pub fn store_cookies(&mut self, response: &reqwest::Response) {
        let mut headers = response.headers().get_all(SET_COOKIE).iter();
        self.jar.set_cookies(&mut headers, response.url());
    }

    pub fn add_cookie(&mut self, cookie: &str, url: &Url) {
        self.jar.add_cookie_str(cookie, url);
    }

    /// Value for a `Cookie` request header to `url`, `None` when no cookie applies.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(String::from))
    }

    pub fn invalidate(&mut self) {
        self.logged_in = false;
        self.jar = Jar::default();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeSnapshot {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Battery")]
    pub battery: Battery,
    #[serde(rename = "Solar")]
    pub solar: Solar,
    #[serde(rename = "Grid")]
    pub grid: Grid,
    #[serde(rename = "Load")]
    pub load: Load,
    #[serde(rename = "EPS")]
    pub eps: Eps,
    #[serde(rename = "Temperature")]
    pub temperature: Temperatures,
    #[serde(rename = "Energy", skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Battery {
    #[serde(rename = "SOC")]
    pub soc: Percent,
    #[serde(rename = "Power")]
    pub power: Watts,
    #[serde(rename = "Voltage")]
    pub voltage: Volts,
    #[serde(rename = "Current")]
    pub current: Option<Amps>,
    #[serde(rename = "Temperature")]
    pub temperature: Option<Celsius>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PvString {
    #[serde(rename = "Voltage")]
    pub voltage: Volts,
    #[serde(rename = "Current")]
    pub current: Amps,
    #[serde(rename = "Power")]
    pub power: Watts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solar {
    #[serde(rename = "PV1")]
    pub pv1: PvString,
    #[serde(rename = "PV2")]
    pub pv2: PvString,
    #[serde(rename = "Total Power")]
    pub total_power: Watts,
}

/// `power` is positive while importing from the grid and negative while exporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    #[serde(rename = "Voltage")]
    pub voltage: Volts,
    #[serde(rename = "Frequency")]
    pub frequency: Option<Hertz>,
    #[serde(rename = "Power")]
    pub power: Watts,
    #[serde(rename = "Current")]
    pub current: Amps,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Load {
    #[serde(rename = "Power")]
    pub power: Watts,
    #[serde(rename = "Current")]
    pub current: Option<Amps>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eps {
    #[serde(rename = "Voltage")]
    pub voltage: Option<Volts>,
    #[serde(rename = "Frequency")]
    pub frequency: Option<Hertz>,
    #[serde(rename = "Power")]
    pub power: Option<Watts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Temperatures {
    #[serde(rename = "Inverter")]
    pub inverter: Option<Celsius>,
    #[serde(rename = "Environment")]
    pub environment: Option<Celsius>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySnapshot {
    #[serde(rename = "Today")]
    pub today: EnergyTotals,
    #[serde(rename = "Total")]
    pub total: EnergyTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyTotals {
    #[serde(rename = "Solar Generation")]
    pub solar_generation: KWh,
    #[serde(rename = "Grid Import")]
    pub grid_import: KWh,
    #[serde(rename = "Grid Export")]
    pub grid_export: KWh,
    #[serde(rename = "Battery Charge")]
    pub battery_charge: KWh,
    #[serde(rename = "Battery Discharge")]
    pub battery_discharge: KWh,
}
