use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::fmt;
use std::io::Cursor;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Error {
    /// The portal refused the configured account or password.
    InvalidCredentials,
    LoginError(String),
    ConnectionError(String),
    Timeout(Duration),
    SessionExpired,
    IdentifierNotFound,
    ApiError(String),
    InvalidResponse(String, String),
    RateExceeded(String),
    NoData(String),
    FormatError,
}

impl Error {
    /// Connectivity problems clear up on their own; the next cycle simply tries again.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::ConnectionError(_) | Error::Timeout(_))
    }

    /// Retrying is pointless until the credentials are reconfigured.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::InvalidCredentials)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCredentials => write!(f, "invalid username or password"),
            Error::LoginError(s) => write!(f, "login failed: {}", s),
            Error::ConnectionError(s) => write!(f, "connection error: {}", s),
            Error::Timeout(d) => write!(f, "update cycle timed out after {}s", d.as_secs()),
            Error::SessionExpired => write!(f, "portal session expired"),
            Error::IdentifierNotFound => write!(f, "inverter serial number not found"),
            Error::ApiError(s) => write!(f, "portal error: {}", s),
            Error::InvalidResponse(e, body) => {
                write!(f, "invalid portal response ({}): {}", e, body)
            }
            Error::RateExceeded(s) => write!(f, "rate limit exceeded: {}", s),
            Error::NoData(s) => write!(f, "no data: {}", s),
            Error::FormatError => write!(f, "unable to format metrics"),
        }
    }
}

impl std::error::Error for Error {}

fn html_response(status: Status, error: String) -> response::Result<'static> {
    Response::build()
        .status(status)
        .sized_body(error.len(), Cursor::new(error))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::RateExceeded(s) => html_response(
                Status::TooManyRequests,
                format!("<html><body><h3>429 Too Many Requests</h3>Portal response: <code>{}</code></body></html>", s),
            ),
            Error::InvalidCredentials => html_response(
                Status::Forbidden,
                String::from("<html><body><h3>403 Forbidden</h3>The EG4 portal rejected the configured username or password</body></html>"),
            ),
            Error::LoginError(s) => html_response(
                Status::Forbidden,
                format!("<html><body><h3>403 Forbidden</h3>Error while authenticating to the EG4 portal: <code>{}</code></body></html>", s),
            ),
            _ => html_response(
                Status::ServiceUnavailable,
                format!(
                    "<html><body><h3>503 Service Unavailable</h3><code>{}</code></body></html>",
                    self
                ),
            ),
        }
    }
}
