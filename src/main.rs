#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use eg4_monitor_rs::api::{self, Error};
use eg4_monitor_rs::model::RuntimeSnapshot;
use eg4_monitor_rs::{Eg4Client, LoginResult};
use rocket::fairing::AdHoc;
use rocket::http::ContentType;
use rocket::{Build, Rocket, Shutdown, State};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

mod metrics;

#[derive(Clone, serde::Deserialize)]
pub struct Eg4Config {
    api_url: String,
    username: String,
    password: String,
    /// Seconds between two update cycles
    interval: u64,
    /// Upper bound of a single update cycle, in seconds
    timeout: u64,
}

#[derive(Default)]
struct Coordinator {
    snapshot: Option<RuntimeSnapshot>,
    last_update_success: bool,
    /// Timestamp of the last successful update cycle
    last_success: Option<Instant>,
    last_error: Option<Error>,
}

/// Structure containing state for API handlers.
#[derive(Default)]
pub struct StateData {
    coordinator: Mutex<Coordinator>,
}

impl StateData {
    fn update_succeeded(&self, snapshot: RuntimeSnapshot) {
        if let Ok(mut coordinator) = self.coordinator.lock() {
            coordinator.snapshot = Some(snapshot);
            coordinator.last_update_success = true;
            coordinator.last_success = Some(Instant::now());
            coordinator.last_error = None;
        } else {
            log::error!("Unable to lock coordinator state, snapshot dropped")
        }
    }

    /// Keeps the previous snapshot around, but marks it stale.
    fn update_failed(&self, error: Error) {
        if let Ok(mut coordinator) = self.coordinator.lock() {
            coordinator.last_update_success = false;
            coordinator.last_error = Some(error);
        }
    }

    /// Last snapshot, only while the last update succeeded.
    fn current(&self) -> Result<RuntimeSnapshot, Error> {
        let coordinator = self
            .coordinator
            .lock()
            .or(Err(Error::NoData(String::from("coordinator state unavailable"))))?;

        if let Some(error) = coordinator.last_error.as_ref().filter(|e| e.is_auth_failure()) {
            return Err(error.clone());
        }

        match (&coordinator.snapshot, coordinator.last_update_success) {
            (Some(snapshot), true) => Ok(snapshot.clone()),
            (Some(_), false) => Err(Error::NoData(format!(
                "last update failed, last success {}s ago",
                coordinator
                    .last_success
                    .map(|t| t.elapsed().as_secs())
                    .unwrap_or_default()
            ))),
            (None, _) => Err(Error::NoData(String::from("no successful update yet"))),
        }
    }
}

pub fn read_settings() -> Result<Eg4Config, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .merge(config::Environment::with_prefix("EG4"))?
        .set_default("api_url", api::DEFAULT_API_URL)?
        .set_default("interval", 30_i64)?
        .set_default("timeout", 30_i64)?;

    settings.try_into()
}

/// Drive the client on a fixed interval until the server shuts down.
async fn poll_loop(
    mut client: Eg4Client,
    state: Arc<StateData>,
    interval: Duration,
    mut shutdown: Shutdown,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }

        match client.poll().await {
            Ok(snapshot) => {
                log::debug!("Successfully received data from EG4");
                metrics::publish(&snapshot, client.serial_number().unwrap_or("unknown"));
                state.update_succeeded(snapshot);
            }
            Err(e) => {
                if e.is_auth_failure() {
                    log::error!(
                        "EG4 portal rejected the credentials, check EG4_USERNAME and EG4_PASSWORD"
                    );
                } else if e.is_connectivity() {
                    log::warn!("Error communicating with EG4 portal: {}", e);
                } else {
                    log::error!("EG4 update failed: {}", e);
                }
                metrics::mark_unavailable(e.is_auth_failure());
                state.update_failed(e);
            }
        }
    }

    client.close();
    log::info!("EG4 poller stopped");
}

#[get("/metrics")]
async fn metrics_route() -> Result<String, Error> {
    metrics::read().await
}

#[get("/snapshot")]
async fn snapshot_route(state: &State<Arc<StateData>>) -> Result<(ContentType, String), Error> {
    let snapshot = state.current()?;
    serde_json::to_string_pretty(&snapshot)
        .map(|json| (ContentType::JSON, json))
        .or(Err(Error::FormatError))
}

#[launch]
async fn rocket() -> Rocket<Build> {
    env_logger::init();

    let settings = read_settings().expect("Configuration error");
    let http_client = reqwest::Client::builder()
        .build()
        .expect("Unable to build HTTP client");
    let mut client = Eg4Client::new(settings.username, settings.password, http_client)
        .with_base_url(settings.api_url)
        .with_cycle_timeout(Duration::from_secs(settings.timeout));

    match client.try_login().await {
        LoginResult::Success => log::info!("Logged in to the EG4 portal"),
        failure => panic!("Failed to login to EG4: {:?}", failure),
    }

    let state = Arc::new(StateData::default());
    let poller_state = state.clone();
    let interval = Duration::from_secs(settings.interval.max(1));

    rocket::build()
        .manage(state)
        .attach(AdHoc::on_liftoff("EG4 poller", move |rocket| {
            let shutdown = rocket.shutdown();
            Box::pin(async move {
                tokio::spawn(poll_loop(client, poller_state, interval, shutdown));
            })
        }))
        .mount("/", routes![metrics_route, snapshot_route])
}
