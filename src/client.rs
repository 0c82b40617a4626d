use crate::api::{self, Error, LoginResult};
use crate::model::{Credentials, Portal, RuntimeSnapshot, SerialNumber, Session};
use crate::normalize::normalize;
use crate::resolver;
use std::time::Duration;

pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateful client for one EG4 portal account.
///
/// Owns the session cookies and the cached serial number; borrows the HTTP
/// client from the host, which stays responsible for its lifecycle. Calls are
/// expected to be serialized by the caller.
#[derive(Debug)]
pub struct Eg4Client {
    credentials: Credentials,
    portal: Portal,
    session: Session,
    serial_number: Option<SerialNumber>,
    cycle_timeout: Duration,
}

impl Eg4Client {
    pub fn new(username: String, password: String, client: reqwest::Client) -> Self {
        Eg4Client {
            credentials: Credentials { username, password },
            portal: api::api(api::DEFAULT_API_URL.to_string(), client),
            session: Session::default(),
            serial_number: None,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.portal.base_url = base_url.into();
        self
    }

    pub fn with_cycle_timeout(mut self, cycle_timeout: Duration) -> Self {
        self.cycle_timeout = cycle_timeout;
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.logged_in
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub async fn try_login(&mut self) -> LoginResult {
        api::login(&self.portal, &self.credentials, &mut self.session).await
    }

    pub async fn login(&mut self) -> bool {
        self.try_login().await.is_success()
    }

    async fn ensure_logged_in(&mut self) -> Result<(), Error> {
        if self.session.logged_in {
            return Ok(());
        }

        log::debug!("Not logged in, attempting login");
        match self.try_login().await {
            LoginResult::Success => Ok(()),
            LoginResult::InvalidCredentials => Err(Error::InvalidCredentials),
            LoginResult::Rejected(reason) => Err(Error::LoginError(reason)),
            LoginResult::Unavailable(reason) => Err(Error::ApiError(reason)),
            LoginResult::ConnectivityError(e) => Err(Error::ConnectionError(e)),
        }
    }

    async fn serial(&mut self) -> Result<SerialNumber, Error> {
        if let Some(serial) = &self.serial_number {
            return Ok(serial.clone());
        }

        log::debug!("Fetching serial number");
        let serial = resolver::resolve(&self.portal, &mut self.session)
            .await
            .ok_or(Error::IdentifierNotFound)?;
        self.serial_number = Some(serial.clone());
        Ok(serial)
    }

    /// Log in if needed, resolve the serial number on first use, then fetch and
    /// normalize runtime and energy data.
    pub async fn fetch_snapshot(&mut self) -> Result<RuntimeSnapshot, Error> {
        self.ensure_logged_in().await?;
        let serial = self.serial().await?;

        log::debug!("Fetching runtime data for {}", serial);
        let runtime = api::inverter_runtime(&self.portal, &mut self.session, &serial)
            .await
            .into_result()?
            .ok_or_else(|| Error::NoData(format!("no runtime data for inverter {}", serial)))?;

        log::debug!("Fetching energy statistics for {}", serial);
        let energy = api::inverter_energy(&self.portal, &mut self.session, &serial)
            .await
            .into_result()?;
        if energy.is_none() {
            log::warn!("No energy statistics for inverter {}", serial);
        }

        Ok(normalize(&runtime, energy.as_ref()))
    }

    async fn cycle(&mut self) -> Result<RuntimeSnapshot, Error> {
        let resumed_session = self.session.logged_in;

        match self.fetch_snapshot().await {
            Err(e) if resumed_session && !self.session.logged_in => {
                log::warn!("Portal session lost ({}), logging in again", e);
                self.fetch_snapshot().await
            }
            result => result,
        }
    }

    /// One update cycle as driven by the host's scheduler.
    ///
    /// All-or-nothing: on timeout the cycle is abandoned and no snapshot is
    /// returned. The cached serial number survives failures.
    pub async fn poll(&mut self) -> Result<RuntimeSnapshot, Error> {
        let cycle_timeout = self.cycle_timeout;
        tokio::time::timeout(cycle_timeout, self.cycle())
            .await
            .map_err(|_| Error::Timeout(cycle_timeout))?
    }

    /// Forget the session and the serial number. The HTTP client is left alone.
    pub fn close(&mut self) {
        self.session.invalidate();
        self.serial_number = None;
    }
}
