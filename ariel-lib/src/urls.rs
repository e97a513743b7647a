#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

const LOGIN_ROOT: &str = "https://elearning.unimi.it/";
const SITE_ROOT: &str = "https://ariel.unimi.it/";

// The login page redirects back to the site root once the session cookies are set.
const LOGIN_PATH: &str = "authentication/skin/portaleariel/login.aspx?url=";
const SEARCH_PATH: &str = "offerta/search";
const COURSES_PATH: &str = "Offerta";
const HISTORY_PATH: &str = "offerta/History";
const FAVORITES_PATH: &str = "offerta/favorite";
const RECENT_ACTIVITY_PATH: &str = "offerta/myariel";

/// Every platform URL the library talks to.
///
/// [`Endpoints::default`](Endpoints::default) points at the production platform. Use
/// [`Endpoints::with_roots`](Endpoints::with_roots) to aim the same paths at another host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Endpoints {
    pub login: String,
    /// Site root, also the base relative page links are resolved against.
    pub home: String,
    pub search: String,
    pub courses: String,
    pub history: String,
    pub favorites: String,
    pub recent_activity: String,
}

impl Endpoints {
    /// Builds the endpoints under `login_root` (authentication host) and `site_root` (the
    /// learning platform itself). Both roots are expected to end with `/`.
    pub fn with_roots(login_root: &str, site_root: &str) -> Self {
        let site = |path: &str| format!("{site_root}{path}");
        Self {
            login: format!("{login_root}{LOGIN_PATH}{site_root}"),
            home: site_root.to_owned(),
            search: site(SEARCH_PATH),
            courses: site(COURSES_PATH),
            history: site(HISTORY_PATH),
            favorites: site(FAVORITES_PATH),
            recent_activity: site(RECENT_ACTIVITY_PATH),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_roots(LOGIN_ROOT, SITE_ROOT)
    }
}
