use futures::future::AbortRegistration;
use hyper::{client::connect::Connect, StatusCode};
use tracing::info;
use url::form_urlencoded;

use crate::session::{self, Session, SessionError};

/// Shown by the login page when the username/password pair is rejected.
const INVALID_CREDENTIALS_PHRASE: &str = "Nome utente e/o password non sono corretti";

/// The account domain picked in the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserType {
    /// `@studenti.unimi.it`
    Student,
    /// `@unimi.it`
    Staff,
    Raw(String),
}

impl UserType {
    pub fn id(&self) -> &str {
        match self {
            UserType::Student => "@studenti.unimi.it",
            UserType::Staff => "@unimi.it",
            UserType::Raw(id) => id,
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    /// Username without the domain (typically `name.surname`).
    pub username: String,
    pub password: String,
    pub user_type: UserType,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        user_type: UserType,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            user_type,
        }
    }

    fn form(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("hdnSilent", "true")
            .append_pair("tbLogin", &self.username)
            .append_pair("tbPassword", &self.password)
            .append_pair("ddlType", self.user_type.id())
            .finish()
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("user_type", &self.user_type)
            .finish_non_exhaustive()
    }
}

/// Outcome of a login attempt.
///
/// A rejected password is an expected outcome, so it is reported here instead of through an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    Success,
    InvalidCredentials,
    /// The server answered with a non-OK status, holds its description.
    HttpError(String),
    /// The request never completed, holds the transport error message.
    TransportError(String),
    Cancelled,
}

impl LoginResult {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginResult::Success)
    }
}

impl<T> Session<T>
where
    T: Connect + Clone + Send + Sync + 'static,
{
    /// Posts `credentials` to the login form at `url`.
    ///
    /// Makes exactly one attempt. On success the authentication cookies stay in this session.
    pub async fn login(
        &mut self,
        url: &str,
        credentials: &Credentials,
        abort: Option<AbortRegistration>,
    ) -> LoginResult {
        let attempt = session::cancellable(
            async {
                let response = self.post(url, credentials.form(), None).await?;
                let status = response.status();
                if status != StatusCode::OK {
                    return Ok(LoginResult::HttpError(status.to_string()));
                }

                let content = session::read_text(response.into_body(), None).await?;
                Ok::<_, SessionError>(if content.contains(INVALID_CREDENTIALS_PHRASE) {
                    LoginResult::InvalidCredentials
                } else {
                    LoginResult::Success
                })
            },
            abort,
        )
        .await;

        let result = match attempt {
            Ok(result) => result,
            Err(SessionError::Cancelled) => LoginResult::Cancelled,
            Err(err) => LoginResult::TransportError(err.to_string()),
        };
        info!(username = %credentials.username, ?result, "login attempt finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_is_urlencoded_in_field_order() {
        let credentials = Credentials::new("mario.rossi", "p&ss word", UserType::Student);
        assert_eq!(
            credentials.form(),
            "hdnSilent=true&tbLogin=mario.rossi&tbPassword=p%26ss+word&ddlType=%40studenti.unimi.it"
        );
    }

    #[test]
    fn debug_hides_password() {
        let credentials = Credentials::new("mario.rossi", "hunter2", UserType::Staff);
        let debug = format!("{credentials:?}");
        assert!(debug.contains("mario.rossi"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn raw_user_type_is_passed_through() {
        assert_eq!(UserType::Raw("@example.org".to_owned()).id(), "@example.org");
    }
}
