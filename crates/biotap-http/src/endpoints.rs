//! URL builder for the REST API

use url::Url;

/// Builds endpoint URLs under a base URL
///
/// Segments are percent-encoded, so a username can never escape its
/// path segment.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// `base` must be able to carry a path, which [`crate::ApiConfig`]
    /// guarantees
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `/links/`
    pub fn links(&self) -> Url {
        self.path(&["links", ""])
    }

    /// `/links/{id}`
    pub fn link(&self, id: i64) -> Url {
        self.path(&["links", &id.to_string()])
    }

    /// `/links/public/{username}`
    pub fn public_links(&self, username: &str) -> Url {
        self.path(&["links", "public", username])
    }

    /// `/links/{id}/redirect`, which counts the click and redirects to the target
    pub fn redirect(&self, id: i64) -> Url {
        self.path(&["links", &id.to_string(), "redirect"])
    }

    /// `/links/{id}/stats`
    pub fn link_stats(&self, id: i64) -> Url {
        self.path(&["links", &id.to_string(), "stats"])
    }

    /// `/analytics/?days=N`
    pub fn analytics(&self, days: u32) -> Url {
        let mut url = self.path(&["analytics", ""]);
        url.query_pairs_mut().append_pair("days", &days.to_string());
        url
    }

    /// `/analytics/geographic?days=N`
    pub fn geographic(&self, days: u32) -> Url {
        let mut url = self.path(&["analytics", "geographic"]);
        url.query_pairs_mut().append_pair("days", &days.to_string());
        url
    }

    /// `/auth/login`
    pub fn login(&self) -> Url {
        self.path(&["auth", "login"])
    }

    /// `/auth/register`
    pub fn register(&self) -> Url {
        self.path(&["auth", "register"])
    }

    /// `/auth/password-reset/request`
    pub fn password_reset_request(&self) -> Url {
        self.path(&["auth", "password-reset", "request"])
    }

    /// `/auth/password-reset/confirm`
    pub fn password_reset_confirm(&self) -> Url {
        self.path(&["auth", "password-reset", "confirm"])
    }

    /// `/users/me`
    pub fn current_user(&self) -> Url {
        self.path(&["users", "me"])
    }

    /// `/users/change-password`
    pub fn change_password(&self) -> Url {
        self.path(&["users", "change-password"])
    }

    fn path(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(base: &str) -> Endpoints {
        Endpoints::new(Url::parse(base).unwrap())
    }

    #[test]
    fn test_paths() {
        let e = endpoints("http://127.0.0.1:8000");
        assert_eq!(e.links().as_str(), "http://127.0.0.1:8000/links/");
        assert_eq!(e.link(42).as_str(), "http://127.0.0.1:8000/links/42");
        assert_eq!(e.public_links("alice").as_str(), "http://127.0.0.1:8000/links/public/alice");
        assert_eq!(e.redirect(42).as_str(), "http://127.0.0.1:8000/links/42/redirect");
        assert_eq!(e.analytics(30).as_str(), "http://127.0.0.1:8000/analytics/?days=30");
        assert_eq!(
            e.geographic(7).as_str(),
            "http://127.0.0.1:8000/analytics/geographic?days=7"
        );
        assert_eq!(e.login().as_str(), "http://127.0.0.1:8000/auth/login");
        assert_eq!(e.current_user().as_str(), "http://127.0.0.1:8000/users/me");
    }

    #[test]
    fn test_account_paths() {
        let e = endpoints("http://127.0.0.1:8000");
        assert_eq!(e.link_stats(42).as_str(), "http://127.0.0.1:8000/links/42/stats");
        assert_eq!(e.register().as_str(), "http://127.0.0.1:8000/auth/register");
        assert_eq!(
            e.password_reset_request().as_str(),
            "http://127.0.0.1:8000/auth/password-reset/request"
        );
        assert_eq!(
            e.password_reset_confirm().as_str(),
            "http://127.0.0.1:8000/auth/password-reset/confirm"
        );
        assert_eq!(
            e.change_password().as_str(),
            "http://127.0.0.1:8000/users/change-password"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let e = endpoints("https://example.com/api/");
        assert_eq!(e.link(1).as_str(), "https://example.com/api/links/1");
    }

    #[test]
    fn test_username_is_encoded() {
        let e = endpoints("http://localhost");
        assert_eq!(
            e.public_links("../users/me").as_str(),
            "http://localhost/links/public/..%2Fusers%2Fme"
        );
    }
}
