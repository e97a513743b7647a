//! Client for the Ariel e-learning platform of the University of Milan.
//!
//! Log in with [`Ariel::login`](Ariel::login), then read pages as typed records: rooms and
//! threads of a course site, the recent-activity feed and the course listings. Extractors in
//! [`parser`](parser) also work on HTML obtained elsewhere.

mod ariel;
mod auth;
mod cookies;
pub mod model;
pub mod parser;
mod session;
mod urls;

pub use ariel::Ariel;
pub use auth::{Credentials, LoginResult, UserType};
pub use cookies::CookieStore;
pub use parser::{Document, MalformedRowError, ParseError};
pub use session::{read_text, Session, SessionError};
pub use urls::Endpoints;

use hyper::StatusCode;

/// A client over HTTPS (and plain HTTP) with the system trust roots.
#[cfg(feature = "rustls")]
pub fn connect() -> Ariel<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>> {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Ariel::new(hyper::Client::builder().build(connector))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    MalformedRow(#[from] MalformedRowError),
    /// The server answered a request whose body is needed with an error status.
    #[error("server responded with {0}")]
    HttpStatus(StatusCode),
}

impl Error {
    /// Whether the operation was aborted rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Session(SessionError::Cancelled))
    }
}
