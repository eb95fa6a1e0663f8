// Account credentials, OAuth client identity, and endpoint layout.
//
// The vendor runs a Keycloak-style OAuth realm on one host and the IoT
// REST API on another. Both bases are configurable so the client can be
// pointed at a mock server or an alternate deployment.

use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Default OAuth realm base.
pub const DEFAULT_OAUTH_BASE_URL: &str = "https://oauth.perenio.com/auth/realms/aaa.kaa";
/// Default IoT REST API base.
pub const DEFAULT_API_BASE_URL: &str = "https://iot.perenio.com/apif/api/v1";
/// Fixed tenant identifier sent as the `tenantId` header.
pub const DEFAULT_TENANT_ID: &str = "perenio";
/// OAuth client id of the vendor's mobile app.
pub const DEFAULT_CLIENT_ID: &str = "perenio-app";
/// OAuth client secret of the vendor's mobile app.
pub const DEFAULT_CLIENT_SECRET: &str = "ecbea13f-a1cd-47ff-a01e-60082fb8b999";

/// Account credentials used for the password grant.
///
/// Held for the client's lifetime so the client can re-authenticate
/// whenever refreshing fails.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// OAuth client identity presented to the token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            tenant_id: DEFAULT_TENANT_ID.into(),
            client_id: DEFAULT_CLIENT_ID.into(),
            client_secret: SecretString::from(DEFAULT_CLIENT_SECRET),
        }
    }
}

/// Base URLs for the OAuth realm and the REST API.
///
/// Both bases are normalized to end with `/` so relative paths append
/// instead of replacing the last segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    oauth_base: Url,
    api_base: Url,
}

impl Endpoints {
    pub fn new(oauth_base: &str, api_base: &str) -> Result<Self, Error> {
        Ok(Self {
            oauth_base: normalize_base(oauth_base)?,
            api_base: normalize_base(api_base)?,
        })
    }

    pub fn oauth_base(&self) -> &Url {
        &self.oauth_base
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// `{oauth}/protocol/openid-connect/token`
    pub fn token_url(&self) -> Url {
        append_segments(&self.oauth_base, &["protocol", "openid-connect", "token"])
    }

    /// `{oauth}/users/me`
    pub fn user_info_url(&self) -> Url {
        append_segments(&self.oauth_base, &["users", "me"])
    }

    /// Join path segments onto the API base. Each segment is percent-encoded,
    /// so camera ids cannot escape their path position.
    pub fn api_url(&self, segments: &[&str]) -> Url {
        append_segments(&self.api_base, segments)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            oauth_base: built_in(DEFAULT_OAUTH_BASE_URL),
            api_base: built_in(DEFAULT_API_BASE_URL),
        }
    }
}

fn built_in(raw: &str) -> Url {
    normalize_base(raw).unwrap_or_else(|e| unreachable!("built-in base URL {raw} is invalid: {e}"))
}

fn normalize_base(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
    }
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

fn append_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    // `normalize_base` rejected cannot-be-a-base URLs, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_point_at_vendor_hosts() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.token_url().as_str(),
            "https://oauth.perenio.com/auth/realms/aaa.kaa/protocol/openid-connect/token"
        );
        assert_eq!(
            endpoints.user_info_url().as_str(),
            "https://oauth.perenio.com/auth/realms/aaa.kaa/users/me"
        );
        assert_eq!(
            endpoints.api_url(&["endpoints"]).as_str(),
            "https://iot.perenio.com/apif/api/v1/endpoints"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_tolerated() {
        let endpoints = Endpoints::new("http://localhost:8080/auth/", "http://localhost:8080/api/v1/")
            .expect("valid bases");
        assert_eq!(
            endpoints.api_url(&["file", "cam-1", "snapshot"]).as_str(),
            "http://localhost:8080/api/v1/file/cam-1/snapshot"
        );
    }

    #[test]
    fn root_base_joins_without_double_slash() {
        let endpoints = Endpoints::new("http://127.0.0.1:9000", "http://127.0.0.1:9000").expect("valid");
        assert_eq!(endpoints.api_url(&["devices"]).path(), "/devices");
    }

    #[test]
    fn camera_id_segments_are_escaped() {
        let endpoints = Endpoints::default();
        let url = endpoints.api_url(&["mediastream", "a/b?c", "offer"]);
        assert_eq!(url.path(), "/apif/api/v1/mediastream/a%2Fb%3Fc/offer");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(Endpoints::new("mailto:someone@example.com", DEFAULT_API_BASE_URL).is_err());
        assert!(Endpoints::new("not a url", DEFAULT_API_BASE_URL).is_err());
    }
}
