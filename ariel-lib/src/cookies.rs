use cookie::Cookie;
use tracing::debug;
use url::Url;

/// Cookies of a [`Session`](crate::Session), scoped the way browsers scope them.
///
/// A cookie goes back only to requests whose host matches its domain and whose path is inside
/// its path. Without a `Domain` attribute a cookie belongs to the exact host that set it.
/// Ports are not part of the scope.
#[derive(Debug, Default)]
pub struct CookieStore {
    cookies: Vec<StoredCookie>,
}

#[derive(Debug)]
struct StoredCookie {
    cookie: Cookie<'static>,
    // Set without a `Domain` attribute.
    host_only: bool,
}

impl StoredCookie {
    fn domain(&self) -> &str {
        self.cookie.domain().unwrap_or_default()
    }

    fn path(&self) -> &str {
        self.cookie.path().unwrap_or("/")
    }

    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.cookie.name() == other.cookie.name()
            && self.domain() == other.domain()
            && self.path() == other.path()
    }

    fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let domain_matches = if self.host_only {
            host == self.domain()
        } else {
            domain_match(host, self.domain())
        };
        domain_matches
            && path_match(url.path(), self.path())
            && (!self.cookie.secure().unwrap_or(false) || url.scheme() == "https")
    }
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first stored cookie called `name`, whatever its scope.
    pub fn get(&self, name: &str) -> Option<&Cookie<'static>> {
        self.iter().find(|cookie| cookie.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.cookies.iter().map(|stored| &stored.cookie)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// The value of the `Cookie` header for a request to `url`, if any cookie applies.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let cookies = self
            .cookies
            .iter()
            .filter(|stored| stored.matches(url))
            .map(|stored| format!("{}={}", stored.cookie.name(), stored.cookie.value()))
            .collect::<Vec<_>>();
        (!cookies.is_empty()).then(|| cookies.join("; "))
    }

    /// Records a cookie set by a response from `url`.
    ///
    /// Cookies claiming a domain `url` doesn't belong to are dropped. An empty value or a
    /// non-positive `Max-Age` deletes the stored cookie instead.
    pub fn store(&mut self, url: &Url, mut cookie: Cookie<'static>) {
        let Some(host) = url.host_str() else {
            return;
        };

        let host_only = match cookie
            .domain()
            .map(|domain| domain.trim_start_matches('.').to_ascii_lowercase())
        {
            Some(domain) if !domain.is_empty() => {
                if !domain_match(host, &domain) {
                    debug!(name = cookie.name(), %domain, host, "rejecting foreign cookie");
                    return;
                }
                cookie.set_domain(domain);
                false
            }
            _ => {
                cookie.set_domain(host.to_owned());
                true
            }
        };
        if !cookie.path().map_or(false, |path| path.starts_with('/')) {
            cookie.set_path(default_path(url));
        }

        let expired = cookie.value().is_empty()
            || cookie
                .max_age()
                .map_or(false, |age| age.is_zero() || age.is_negative());
        let stored = StoredCookie { cookie, host_only };

        self.cookies.retain(|existing| !existing.same_slot(&stored));
        if expired {
            debug!(name = stored.cookie.name(), host, "removing cookie");
        } else {
            debug!(name = stored.cookie.name(), domain = stored.domain(), "storing cookie");
            self.cookies.push(stored);
        }
    }
}

fn domain_match(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

fn path_match(request: &str, cookie: &str) -> bool {
    request == cookie
        || (request.starts_with(cookie)
            && (cookie.ends_with('/') || request[cookie.len()..].starts_with('/')))
}

// The directory of the request path: `/a/b/c` gives `/a/b`, `/a` gives `/`.
fn default_path(url: &Url) -> String {
    match url.path().rfind('/') {
        Some(0) | None => "/".to_owned(),
        Some(end) => url.path()[..end].to_owned(),
    }
}
