use std::{future::Future, string::FromUtf8Error};

use cookie::Cookie;
use futures::future::{AbortRegistration, Abortable};
use hyper::{
    body::HttpBody,
    client::connect::Connect,
    header, Body, Client, HeaderMap, Method, Request, Response, StatusCode,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::cookies::CookieStore;

const USER_AGENT: &str = "ariel-lib";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MAX_REDIRECTS: usize = 10;
// Upper bound on what a `Content-Length` may make us allocate up front.
const MAX_PREALLOCATION: usize = 64 * 1024;

/// An HTTP client bound to a single cookie store.
///
/// Cookies set by any response (including intermediate redirects) are sent back on the
/// following requests made through the same `Session` to the hosts and paths they are scoped
/// to, see [`CookieStore`](CookieStore). Methods take `&mut self`, so one session
/// can't be shared between concurrent requests; create another session instead.
#[derive(Debug)]
pub struct Session<T> {
    client: Client<T, Body>,
    cookies: CookieStore,
}

impl<T> Session<T> {
    pub fn new(client: Client<T, Body>) -> Self {
        Self {
            client,
            cookies: CookieStore::new(),
        }
    }

    /// Cookies accumulated so far.
    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    fn store_cookies(&mut self, url: &Url, headers: &HeaderMap) {
        for cookie in headers
            .get_all(header::SET_COOKIE)
            .iter()
            // If it can't be parsed then skip it
            .filter_map(|raw| raw.to_str().ok())
            .filter_map(|raw| Cookie::parse(raw.to_owned()).ok())
        {
            self.cookies.store(url, cookie);
        }
    }
}

impl<T> Session<T>
where
    T: Connect + Clone + Send + Sync + 'static,
{
    /// Sends `body` as an urlencoded form and returns the final response after redirects.
    pub async fn post(
        &mut self,
        url: &str,
        body: String,
        abort: Option<AbortRegistration>,
    ) -> Result<Response<Body>, SessionError> {
        cancellable(self.send(Method::POST, url, Some(body)), abort).await
    }

    /// Issues a GET and hands back the final response with its body still unread.
    ///
    /// The status code is not inspected. `abort` covers the request and redirects; reading the
    /// body is cancelled separately, e.g. through [`read_text`](read_text).
    pub async fn get_stream(
        &mut self,
        url: &str,
        abort: Option<AbortRegistration>,
    ) -> Result<Response<Body>, SessionError> {
        cancellable(self.send(Method::GET, url, None), abort).await
    }

    async fn send(
        &mut self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<Response<Body>, SessionError> {
        let mut url = Url::parse(url)?;
        let mut method = method;
        let mut body = body;

        for _ in 0..=MAX_REDIRECTS {
            let response = self.send_once(&method, &url, body.clone()).await?;
            if !response.status().is_redirection() {
                return Ok(response);
            }

            let location = match response
                .headers()
                .get(header::LOCATION)
                .and_then(|location| location.to_str().ok())
            {
                Some(location) => url.join(location)?,
                // Nothing to follow (e.g. `304 Not Modified`), let the caller decide.
                None => return Ok(response),
            };
            debug!(status = %response.status(), from = %url, to = %location, "following redirect");

            if matches!(
                response.status(),
                StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
            ) {
                method = Method::GET;
                body = None;
            }
            url = location;
        }

        Err(SessionError::TooManyRedirects(MAX_REDIRECTS))
    }

    async fn send_once(
        &mut self,
        method: &Method,
        url: &Url,
        body: Option<String>,
    ) -> Result<Response<Body>, SessionError> {
        debug!(%method, %url, "sending request");
        let mut request = Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(cookies) = self.cookies.header_for(url) {
            request = request.header(header::COOKIE, cookies);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(Body::from(body))?,
            None => request.body(Body::empty())?,
        };

        let response = self.client.request(request).await?;
        self.store_cookies(url, response.headers());
        Ok(response)
    }
}

/// Reads a whole body as UTF-8 text.
pub async fn read_text(
    body: Body,
    abort: Option<AbortRegistration>,
) -> Result<String, SessionError> {
    cancellable(
        async { Ok::<_, SessionError>(String::from_utf8(read_body(body).await?)?) },
        abort,
    )
    .await
}

/// Drains a body chunk by chunk into memory.
pub(crate) async fn read_body(mut body: Body) -> Result<Vec<u8>, SessionError> {
    // The hint comes from the server, trust it only so far.
    let hint = usize::try_from(body.size_hint().lower()).unwrap_or(usize::MAX);
    let mut bytes = Vec::with_capacity(hint.min(MAX_PREALLOCATION));
    while let Some(chunk) = body.data().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(bytes)
}

/// Runs `future`, resolving to [`SessionError::Cancelled`](SessionError::Cancelled) if `abort` is
/// triggered first.
pub(crate) async fn cancellable<F, O>(
    future: F,
    abort: Option<AbortRegistration>,
) -> Result<O, SessionError>
where
    F: Future<Output = Result<O, SessionError>>,
{
    match abort {
        Some(registration) => Abortable::new(future, registration)
            .await
            .unwrap_or(Err(SessionError::Cancelled)),
        None => future.await,
    }
}

/// Represents errors that can occur while talking to the platform.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An argument to build the HTTP request was invalid.
    /// See more [here](https://docs.rs/http/0.2.8/http/request/struct.Builder.html#errors)
    #[error("an argument while building an HTTP request was invalid")]
    MalformedHttpArgs(#[from] hyper::http::Error),
    /// Failed to send the HTTP request or to read its response.
    #[error("failed to send HTTP request: {0}")]
    HttpRequestFailed(#[from] hyper::Error),
    /// A URL (requested or redirected to) could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The server kept redirecting.
    #[error("gave up after {0} redirects")]
    TooManyRedirects(usize),
    /// The response body is not valid UTF-8.
    #[error("response body is not valid Utf-8")]
    InvalidUtf8(#[from] FromUtf8Error),
    /// The operation was aborted through its `AbortHandle`.
    #[error("operation canceled")]
    Cancelled,
}
