pub mod endpoint;
pub mod error;
pub mod response;

use crate::model;
pub use error::Error;
use reqwest::header::{ACCEPT, COOKIE, REFERER};
use reqwest::{RequestBuilder, Response, Url};
use response::get_device_list::{GetDeviceList, GetInverterList};
use response::get_inverter_energy::InverterEnergy;
use response::get_inverter_runtime::InverterRuntime;
use response::SuccessResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const DEFAULT_API_URL: &str = "https://monitor.eg4electronics.com/WManage";

const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";
const X_REQUESTED_WITH: &str = "X-Requested-With";
const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

const INVALID_CREDENTIALS_MARKERS: [&str; 2] =
    ["Invalid username or password", "Invalid account or password"];
const LOGIN_SUCCESS_MARKERS: [&str; 2] = ["Login successful", "Welcome"];

/// Outcome of the login handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    Success,
    InvalidCredentials,
    /// Login answered 200 with a body carrying neither marker.
    Rejected(String),
    /// Login page or form answered with a non-200 status.
    Unavailable(String),
    ConnectivityError(String),
}

impl LoginResult {
    pub fn is_success(&self) -> bool {
        *self == LoginResult::Success
    }
}

/// Outcome of a telemetry request. The portal reports soft failures (device
/// offline, nothing recorded yet) through a false `success` flag.
#[derive(Debug)]
pub enum FetchResult<T> {
    Data(T),
    SoftFailure,
    HardError(Error),
}

impl<T> FetchResult<T> {
    pub fn into_result(self) -> Result<Option<T>, Error> {
        match self {
            FetchResult::Data(data) => Ok(Some(data)),
            FetchResult::SoftFailure => Ok(None),
            FetchResult::HardError(e) => Err(e),
        }
    }
}

impl<T> From<Result<Option<T>, Error>> for FetchResult<T> {
    fn from(result: Result<Option<T>, Error>) -> Self {
        match result {
            Ok(Some(data)) => FetchResult::Data(data),
            Ok(None) => FetchResult::SoftFailure,
            Err(e) => FetchResult::HardError(e),
        }
    }
}

pub fn api(base_url: String, client: reqwest::Client) -> model::Portal {
    model::Portal { base_url, client }
}

fn url(portal: &model::Portal, endpoint: &endpoint::Endpoint) -> Result<Url, Error> {
    let url = format!("{}{}", portal.base_url.trim_end_matches('/'), endpoint);
    Url::parse(&url).map_err(|e| Error::ApiError(format!("invalid portal URL {}: {}", url, e)))
}

/// Map transport-level failures to Error
fn map_transport_err(error: reqwest::Error) -> Error {
    Error::ConnectionError(error.to_string())
}

fn with_cookies(request: RequestBuilder, session: &model::Session, url: &Url) -> RequestBuilder {
    match session.cookie_header(url) {
        Some(cookies) => request.header(COOKIE, cookies),
        None => request,
    }
}

/// Send a request carrying the session cookies and fold any `Set-Cookie` back
/// into the session. Responses signalling a lost session invalidate it.
async fn send(
    request: RequestBuilder,
    url: &Url,
    session: &mut model::Session,
) -> Result<Response, Error> {
    let response = with_cookies(request, session, url)
        .send()
        .await
        .map_err(map_transport_err)?;
    session.store_cookies(&response);

    let status = response.status();
    let bounced_to_login = response.url().path().ends_with(endpoint::LOGIN);

    if status == http::StatusCode::UNAUTHORIZED
        || status == http::StatusCode::FORBIDDEN
        || (status.is_success() && bounced_to_login)
    {
        log::debug!("{} answered with {}, session lost", response.url(), status);
        session.invalidate();
        return Err(Error::SessionExpired);
    }

    match status {
        http::StatusCode::OK => Ok(response),
        http::StatusCode::TOO_MANY_REQUESTS => {
            Err(Error::RateExceeded(format!("{} answered {}", response.url(), status)))
        }
        _ => Err(Error::ApiError(format!(
            "{} answered {}",
            response.url(),
            status
        ))),
    }
}

async fn read_text(response: Response) -> Result<String, Error> {
    response
        .text()
        .await
        .map_err(|e| Error::ConnectionError(format!("Error reading portal response: {}", e)))
}

/// GET an HTML page of the web UI.
async fn get_page(
    portal: &model::Portal,
    session: &mut model::Session,
    endpoint: &endpoint::Endpoint,
) -> Result<String, Error> {
    let page_url = url(portal, endpoint)?;
    let request = portal.client.get(page_url.clone());
    let response = send(request, &page_url, session).await?;
    read_text(response).await
}

/// The web UI answers AJAX calls of an expired session with its HTML login page.
fn is_html(body: &str) -> bool {
    body.trim_start().starts_with('<')
}

/// POST a form to one of the AJAX endpoints and decode the JSON answer.
async fn post_form(
    portal: &model::Portal,
    session: &mut model::Session,
    endpoint: &endpoint::Endpoint,
    form: &[(&str, &str)],
) -> Result<Value, Error> {
    let form_url = url(portal, endpoint)?;
    let referer = url(portal, endpoint::MONITOR_INVERTER)?;
    let request = portal
        .client
        .post(form_url.clone())
        .header(ACCEPT, ACCEPT_JSON)
        .header(X_REQUESTED_WITH, XML_HTTP_REQUEST)
        .header(REFERER, referer.as_str())
        .form(form);

    let response_text = read_text(send(request, &form_url, session).await?).await?;

    log::trace!(
        "endpoint: {}, form: {:?}, response_text: {}",
        endpoint,
        form,
        response_text
    );

    if is_html(&response_text) {
        log::debug!("{} answered with an HTML page, session lost", endpoint);
        session.invalidate();
        return Err(Error::SessionExpired);
    }

    serde_json::from_str::<Value>(&response_text)
        .map_err(|e| Error::InvalidResponse(e.to_string(), response_text))
}

/// Split a decoded payload on its `success` flag: `Ok(None)` for soft failures,
/// the typed payload otherwise.
fn map_response_status<T: DeserializeOwned>(value: Value) -> Result<Option<T>, Error> {
    let success = serde_json::from_value::<SuccessResponse>(value.clone())
        .map(|r| r.success)
        .unwrap_or(false);

    if !success {
        log::debug!("portal reported success=false: {}", value);
        return Ok(None);
    }

    serde_json::from_value::<T>(value.clone())
        .map(Some)
        .map_err(|e| Error::InvalidResponse(e.to_string(), value.to_string()))
}

fn classify_login_body(body: &str) -> LoginResult {
    if INVALID_CREDENTIALS_MARKERS
        .iter()
        .any(|marker| body.contains(marker))
    {
        return LoginResult::InvalidCredentials;
    }

    if LOGIN_SUCCESS_MARKERS
        .iter()
        .any(|marker| body.contains(marker))
        || body.to_lowercase().contains("success")
    {
        return LoginResult::Success;
    }

    LoginResult::Rejected(String::from("unexpected login response"))
}

async fn login_handshake(
    portal: &model::Portal,
    credentials: &model::Credentials,
    session: &mut model::Session,
    login_url: &Url,
) -> Result<LoginResult, reqwest::Error> {
    /* Prime the session cookies from the login page */
    let response = with_cookies(portal.client.get(login_url.clone()), session, login_url)
        .send()
        .await?;
    session.store_cookies(&response);
    if response.status() != http::StatusCode::OK {
        let status = response.status();
        log::debug!("login page response: {}", response.text().await?);
        return Ok(LoginResult::Unavailable(format!(
            "login page answered {}",
            status
        )));
    }

    let form = [
        ("account", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
        ("remember", "false"),
    ];
    let request = portal
        .client
        .post(login_url.clone())
        .header(ACCEPT, ACCEPT_JSON)
        .header(X_REQUESTED_WITH, XML_HTTP_REQUEST)
        .form(&form);

    let response = with_cookies(request, session, login_url).send().await?;
    session.store_cookies(&response);
    let status = response.status();
    let body = response.text().await?;
    log::trace!("login response ({}): {}", status, body);

    if status != http::StatusCode::OK {
        return Ok(LoginResult::Unavailable(format!("login answered {}", status)));
    }

    Ok(classify_login_body(&body))
}

/// Log in to the portal, marking `session` as authenticated on success.
///
/// Never fails: every problem is folded into the returned `LoginResult`.
pub async fn login(
    portal: &model::Portal,
    credentials: &model::Credentials,
    session: &mut model::Session,
) -> LoginResult {
    session.invalidate();
    let login_url = match url(portal, endpoint::LOGIN) {
        Ok(login_url) => login_url,
        Err(e) => {
            log::error!("Login failed: {}", e);
            return LoginResult::Unavailable(e.to_string());
        }
    };
    log::debug!("Attempting to login at {}", login_url);

    let result = login_handshake(portal, credentials, session, &login_url)
        .await
        .unwrap_or_else(|e| LoginResult::ConnectivityError(e.to_string()));

    match &result {
        LoginResult::Success => {
            session.logged_in = true;
            log::debug!("Login successful");
        }
        LoginResult::InvalidCredentials => log::error!("Login failed: invalid credentials"),
        LoginResult::Rejected(reason) | LoginResult::Unavailable(reason) => {
            log::error!("Login failed: {}", reason)
        }
        LoginResult::ConnectivityError(e) => log::error!("Network error during login: {}", e),
    }

    result
}

pub async fn monitor_page(
    portal: &model::Portal,
    session: &mut model::Session,
) -> Result<String, Error> {
    get_page(portal, session, endpoint::MONITOR_INVERTER).await
}

pub async fn inverter_list(
    portal: &model::Portal,
    session: &mut model::Session,
) -> Result<GetInverterList, Error> {
    let value = post_form(portal, session, endpoint::INVERTER_LIST, &[]).await?;
    serde_json::from_value(value.clone())
        .map_err(|e| Error::InvalidResponse(e.to_string(), value.to_string()))
}

pub async fn device_list(
    portal: &model::Portal,
    session: &mut model::Session,
) -> Result<GetDeviceList, Error> {
    let value = post_form(portal, session, endpoint::DEVICE_LIST, &[]).await?;
    serde_json::from_value(value.clone())
        .map_err(|e| Error::InvalidResponse(e.to_string(), value.to_string()))
}

/// Read instantaneous runtime metrics of inverter `serial`.
pub async fn inverter_runtime(
    portal: &model::Portal,
    session: &mut model::Session,
    serial: &str,
) -> FetchResult<InverterRuntime> {
    let result = post_form(
        portal,
        session,
        endpoint::INVERTER_RUNTIME,
        &[("serialNum", serial)],
    )
    .await
    .and_then(map_response_status::<InverterRuntime>);

    FetchResult::from(result)
}

/// Read today/lifetime energy accumulators of inverter `serial`.
pub async fn inverter_energy(
    portal: &model::Portal,
    session: &mut model::Session,
    serial: &str,
) -> FetchResult<InverterEnergy> {
    let result = post_form(
        portal,
        session,
        endpoint::INVERTER_ENERGY,
        &[("serialNum", serial)],
    )
    .await
    .and_then(map_response_status::<InverterEnergy>);

    FetchResult::from(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use mockito::{Matcher, Server};

    fn portal(base_url: String) -> model::Portal {
        api(base_url, reqwest::Client::new())
    }

    fn credentials() -> model::Credentials {
        model::Credentials {
            username: "owner@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn negative_marker_wins_over_positive() {
        assert_eq!(
            LoginResult::InvalidCredentials,
            classify_login_body("Welcome! Invalid account or password")
        );
        assert_eq!(
            LoginResult::InvalidCredentials,
            classify_login_body(r#"{"success":false,"msg":"Invalid username or password"}"#)
        );
    }

    #[test]
    fn positive_markers() {
        assert!(classify_login_body("Login successful").is_success());
        assert!(classify_login_body("<h1>Welcome back</h1>").is_success());
        assert!(classify_login_body(r#"{"SUCCESS":true}"#).is_success());
        assert!(!classify_login_body("<html>maintenance</html>").is_success());
    }

    #[tokio::test]
    async fn login_success_sets_session() {
        let mut server = Server::new_async().await;
        let page = server
            .mock("GET", "/web/login")
            .with_status(200)
            .with_header("set-cookie", "JSESSIONID=abc123; Path=/")
            .with_body("<html>login</html>")
            .create_async()
            .await;
        let post = server
            .mock("POST", "/web/login")
            .match_header("x-requested-with", "XMLHttpRequest")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_header("cookie", Matcher::Regex("JSESSIONID=abc123".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("account".into(), "owner@example.com".into()),
                Matcher::UrlEncoded("password".into(), "hunter2".into()),
                Matcher::UrlEncoded("remember".into(), "false".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        let result = login(&portal, &credentials(), &mut session).await;

        assert_eq!(LoginResult::Success, result);
        assert!(session.logged_in);
        let api_url = url(&portal, endpoint::INVERTER_RUNTIME).unwrap();
        assert_eq!(
            Some("JSESSIONID=abc123".to_string()),
            session.cookie_header(&api_url)
        );
        page.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn login_invalid_credentials() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/web/login")
            .with_status(200)
            .create_async()
            .await;
        let _mock = server
            .mock("POST", "/web/login")
            .with_status(200)
            .with_body(r#"{"success":false,"msg":"Invalid account or password"}"#)
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        let result = login(&portal, &credentials(), &mut session).await;

        assert_eq!(LoginResult::InvalidCredentials, result);
        assert!(!session.logged_in);
    }

    #[tokio::test]
    async fn login_page_non_200_skips_post() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/web/login")
            .with_status(502)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/web/login")
            .expect(0)
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        let result = login(&portal, &credentials(), &mut session).await;

        assert!(matches!(result, LoginResult::Unavailable(_)));
        assert!(!session.logged_in);
        post.assert_async().await;
    }

    #[tokio::test]
    async fn login_unexpected_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/web/login")
            .with_status(200)
            .create_async()
            .await;
        let _mock = server
            .mock("POST", "/web/login")
            .with_status(200)
            .with_body("<html>Scheduled maintenance</html>")
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        let result = login(&portal, &credentials(), &mut session).await;

        assert!(matches!(result, LoginResult::Rejected(_)));
        assert!(!session.logged_in);
    }

    #[tokio::test]
    async fn login_unreachable_portal() {
        /* Nothing listens on port 9 of localhost */
        let portal = portal("http://127.0.0.1:9".to_string());
        let mut session = model::Session::default();
        let result = login(&portal, &credentials(), &mut session).await;

        assert!(matches!(result, LoginResult::ConnectivityError(_)));
    }

    #[tokio::test]
    async fn runtime_soft_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/inverter/getInverterRuntime")
            .match_body(Matcher::UrlEncoded("serialNum".into(), "4512345678".into()))
            .with_status(200)
            .with_body(r#"{"success":false,"msg":"DEVICE_OFFLINE"}"#)
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        let result = inverter_runtime(&portal, &mut session, "4512345678").await;

        assert!(matches!(result, FetchResult::SoftFailure));
    }

    #[tokio::test]
    async fn runtime_data_sends_cookies() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/inverter/getInverterRuntime")
            .match_header("cookie", "JSESSIONID=abc123")
            .match_header("x-requested-with", "XMLHttpRequest")
            .with_status(200)
            .with_body(response::test::read_resource("getInverterRuntime.json"))
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        session.add_cookie("JSESSIONID=abc123; Path=/", &Url::parse(&server.url()).unwrap());
        let result = inverter_runtime(&portal, &mut session, "4512345678").await;

        match result {
            FetchResult::Data(runtime) => assert_eq!(Some(534.0), runtime.v_bat),
            other => panic!("unexpected {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_invalidates_session() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/inverter/getInverterEnergy")
            .with_status(401)
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        session.logged_in = true;
        let result = inverter_energy(&portal, &mut session, "4512345678").await;

        assert!(matches!(result, FetchResult::HardError(Error::SessionExpired)));
        assert!(!session.logged_in);
    }

    #[tokio::test]
    async fn html_instead_of_json_invalidates_session() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/inverter/getInverterEnergy")
            .with_status(200)
            .with_body("\n<!DOCTYPE html><html>login</html>")
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        session.logged_in = true;
        let result = inverter_energy(&portal, &mut session, "4512345678").await;

        assert!(matches!(result, FetchResult::HardError(Error::SessionExpired)));
        assert!(!session.logged_in);
    }

    #[tokio::test]
    async fn garbage_instead_of_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/inverter/getInverterEnergy")
            .with_status(200)
            .with_body("oops")
            .create_async()
            .await;

        let portal = portal(server.url());
        let mut session = model::Session::default();
        session.logged_in = true;
        let result = inverter_energy(&portal, &mut session, "4512345678").await;

        assert!(matches!(
            result,
            FetchResult::HardError(Error::InvalidResponse(_, _))
        ));
        assert!(session.logged_in);
    }

    #[tokio::test]
    async fn expiring_set_cookie_evicts_cookie() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/web/monitor/inverter")
            .with_status(200)
            .with_header(
                "set-cookie",
                "rememberMe=deleteMe; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:10 GMT",
            )
            .with_body("<html></html>")
            .create_async()
            .await;
        let runtime = server
            .mock("POST", "/api/inverter/getInverterRuntime")
            .match_header("cookie", "JSESSIONID=s1")
            .with_status(200)
            .with_body(r#"{"success":false}"#)
            .expect(1)
            .create_async()
            .await;

        let portal = portal(server.url());
        let base = Url::parse(&server.url()).unwrap();
        let mut session = model::Session::default();
        session.add_cookie("JSESSIONID=s1; Path=/", &base);
        session.add_cookie("rememberMe=tok; Path=/", &base);

        monitor_page(&portal, &mut session).await.unwrap();
        assert_eq!(Some("JSESSIONID=s1".to_string()), session.cookie_header(&base));

        inverter_runtime(&portal, &mut session, "4512345678").await;
        runtime.assert_async().await;
    }
}
