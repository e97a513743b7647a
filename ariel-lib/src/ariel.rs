use futures::future::AbortRegistration;
use hyper::{client::connect::Connect, Body, Client, StatusCode};
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

use crate::{
    auth::{Credentials, LoginResult},
    model::{Course, Page, RecentActivity},
    parser::{self, Document},
    session::{self, Session, SessionError},
    urls::Endpoints,
    Error,
};

/// A logged-in (or about to be) view of the platform.
///
/// Wraps a [`Session`](Session) together with the [`Endpoints`](Endpoints) it talks to and
/// exposes one method per page. Every method takes an optional abort registration; aborting
/// resolves the method with a cancellation error.
#[derive(Debug)]
pub struct Ariel<T> {
    session: Session<T>,
    endpoints: Endpoints,
}

impl<T> Ariel<T> {
    /// Talks to the production platform.
    pub fn new(client: Client<T, Body>) -> Self {
        Self::with_endpoints(client, Endpoints::default())
    }

    pub fn with_endpoints(client: Client<T, Body>, endpoints: Endpoints) -> Self {
        Self {
            session: Session::new(client),
            endpoints,
        }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Resolves a link found on a page, which is often relative, against the site root.
    ///
    /// Absolute links are returned unchanged.
    pub fn resolve(&self, link: &str) -> Result<Url, SessionError> {
        Ok(Url::parse(&self.endpoints.home)?.join(link)?)
    }
}

impl<T> Ariel<T>
where
    T: Connect + Clone + Send + Sync + 'static,
{
    /// Authenticates the session, see [`Session::login`](Session::login).
    pub async fn login(
        &mut self,
        credentials: &Credentials,
        abort: Option<AbortRegistration>,
    ) -> LoginResult {
        self.session
            .login(&self.endpoints.login, credentials, abort)
            .await
    }

    /// Downloads `url` and parses it, whatever the status code.
    ///
    /// `url` may be relative to the site root, as links read from pages usually are.
    pub async fn fetch(
        &mut self,
        url: &str,
        abort: Option<AbortRegistration>,
    ) -> Result<Document, Error> {
        let url = self.resolve(url)?;
        let bytes = session::cancellable(
            async {
                let response = self.session.get_stream(url.as_str(), None).await?;
                debug!(status = %response.status(), %url, "fetched page");
                session::read_body(response.into_body()).await
            },
            abort,
        )
        .await?;
        Ok(Document::new(bytes)?)
    }

    /// Rooms and threads of the page at `url`.
    pub async fn page(
        &mut self,
        url: &str,
        abort: Option<AbortRegistration>,
    ) -> Result<Page, Error> {
        let document = self.fetch(url, abort).await?;
        Ok(parser::page(&document)?)
    }

    pub async fn recent_activity(
        &mut self,
        abort: Option<AbortRegistration>,
    ) -> Result<Vec<RecentActivity>, Error> {
        let url = self.endpoints.recent_activity.clone();
        let document = self.fetch(&url, abort).await?;
        Ok(parser::recent_activity(&document)?)
    }

    /// Every course offered, with or without an active site.
    pub async fn courses(
        &mut self,
        abort: Option<AbortRegistration>,
    ) -> Result<Vec<Course>, Error> {
        let url = self.endpoints.courses.clone();
        let document = self.fetch(&url, abort).await?;
        Ok(parser::courses(&document))
    }

    pub async fn course_history(
        &mut self,
        abort: Option<AbortRegistration>,
    ) -> Result<Vec<Course>, Error> {
        let url = self.endpoints.history.clone();
        let document = self.fetch(&url, abort).await?;
        Ok(parser::course_history(&document)?)
    }

    pub async fn favorite_courses(
        &mut self,
        abort: Option<AbortRegistration>,
    ) -> Result<Vec<Course>, Error> {
        let url = self.endpoints.favorites.clone();
        let document = self.fetch(&url, abort).await?;
        Ok(parser::favorite_courses(&document))
    }

    /// Searches course sites by keyword. A search the server refuses finds nothing.
    pub async fn search_courses(
        &mut self,
        query: &str,
        abort: Option<AbortRegistration>,
    ) -> Result<Vec<Course>, Error> {
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("keyword", query)
            .finish();
        let url = self.endpoints.search.clone();

        let bytes = session::cancellable(
            async {
                let response = self.session.post(&url, form, None).await?;
                if response.status() != StatusCode::OK {
                    warn!(status = %response.status(), query, "search refused");
                    return Ok(None);
                }
                Ok::<_, SessionError>(Some(session::read_body(response.into_body()).await?))
            },
            abort,
        )
        .await?;

        match bytes {
            Some(bytes) => Ok(parser::search_results(&Document::new(bytes)?)),
            None => Ok(Vec::new()),
        }
    }

    /// Downloads an attachment into memory. `url` may be relative to the site root.
    pub async fn download(
        &mut self,
        url: &str,
        abort: Option<AbortRegistration>,
    ) -> Result<Vec<u8>, Error> {
        let url = self.resolve(url)?;
        let download = session::cancellable(
            async {
                let response = self.session.get_stream(url.as_str(), None).await?;
                let status = response.status();
                if !status.is_success() {
                    return Ok(Err(status));
                }
                Ok::<_, SessionError>(Ok(session::read_body(response.into_body()).await?))
            },
            abort,
        )
        .await?;

        let bytes = download.map_err(Error::HttpStatus)?;
        debug!(%url, len = bytes.len(), "downloaded attachment");
        Ok(bytes)
    }
}
