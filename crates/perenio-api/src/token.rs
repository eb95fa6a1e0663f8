// In-memory OAuth token state.
//
// Pure bookkeeping: deciding whether a grant is needed and applying a
// grant response. The network side lives in `oauth.rs`.

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Lifetime assumed when the token response omits `expires_in` (10 days).
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 864_000;

/// Refresh this many seconds before the recorded expiry.
pub const REFRESH_MARGIN_SECS: i64 = 300;

/// Upper bound on a granted lifetime (ten years); keeps the expiry arithmetic in range.
const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 3600;

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_lifetime", deserialize_with = "lifetime_secs")]
    pub expires_in: i64,
}

fn default_lifetime() -> i64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

/// `expires_in` may arrive as any JSON number; `null` means the default.
fn lifetime_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let Some(secs) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(DEFAULT_TOKEN_LIFETIME_SECS);
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::as_conversions)]
    let clamped = secs.round().clamp(0.0, MAX_TOKEN_LIFETIME_SECS as f64) as i64;
    Ok(clamped)
}

/// What the refresh guard has to do before an authenticated call.
#[derive(Debug)]
pub(crate) enum TokenAction {
    /// No usable grant on record -- run the password grant.
    Authenticate,
    /// Inside the refresh margin -- run the refresh-token grant.
    Refresh(SecretString),
    /// Current access token is good.
    Valid,
}

/// `{ access_token, refresh_token, expires_at }` for one client.
///
/// `access_token` and `expires_at` are always set and cleared together.
#[derive(Debug, Default)]
pub(crate) struct TokenState {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn next_action(&self, now: DateTime<Utc>) -> TokenAction {
        let (Some(expires_at), Some(refresh)) = (self.expires_at, self.refresh_token.as_ref())
        else {
            return TokenAction::Authenticate;
        };

        if now >= expires_at - Duration::seconds(REFRESH_MARGIN_SECS) {
            TokenAction::Refresh(refresh.clone())
        } else {
            TokenAction::Valid
        }
    }

    /// Record a successful grant issued at `now`.
    ///
    /// A grant without a `refresh_token` keeps the previous one.
    pub fn apply(&mut self, grant: TokenGrant, now: DateTime<Utc>) {
        self.access_token = Some(SecretString::from(grant.access_token));
        if let Some(refresh) = grant.refresh_token {
            self.refresh_token = Some(SecretString::from(refresh));
        }
        let lifetime = grant.expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        self.expires_at = Some(now + Duration::seconds(lifetime));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn grant(expires_in: i64) -> TokenGrant {
        TokenGrant {
            access_token: "T1".into(),
            refresh_token: Some("R1".into()),
            expires_in,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap_or_default()
    }

    #[test]
    fn empty_state_requires_authentication() {
        let state = TokenState::default();
        assert!(matches!(state.next_action(at(0)), TokenAction::Authenticate));
        assert!(state.access_token().is_none());
    }

    #[test]
    fn missing_refresh_token_requires_authentication() {
        let mut state = TokenState::default();
        state.apply(
            TokenGrant {
                access_token: "T1".into(),
                refresh_token: None,
                expires_in: 3600,
            },
            at(0),
        );
        assert!(matches!(state.next_action(at(1)), TokenAction::Authenticate));
    }

    #[test]
    fn refresh_boundary_is_five_minutes_before_expiry() {
        let mut state = TokenState::default();
        state.apply(grant(3600), at(0));
        assert_eq!(state.expires_at(), Some(at(3600)));

        assert!(matches!(state.next_action(at(0)), TokenAction::Valid));
        assert!(matches!(state.next_action(at(3600 - 301)), TokenAction::Valid));
        assert!(matches!(state.next_action(at(3600 - 300)), TokenAction::Refresh(_)));
        assert!(matches!(state.next_action(at(3600 - 240)), TokenAction::Refresh(_)));
        assert!(matches!(state.next_action(at(7200)), TokenAction::Refresh(_)));
    }

    #[test]
    fn refresh_action_carries_stored_refresh_token() {
        let mut state = TokenState::default();
        state.apply(grant(100), at(0));
        match state.next_action(at(0)) {
            TokenAction::Refresh(token) => assert_eq!(token.expose_secret(), "R1"),
            other => panic!("expected refresh, got {other:?}"),
        }
    }

    #[test]
    fn grant_without_refresh_token_keeps_previous_one() {
        let mut state = TokenState::default();
        state.apply(grant(100), at(0));
        state.apply(
            TokenGrant {
                access_token: "T2".into(),
                refresh_token: None,
                expires_in: 100,
            },
            at(50),
        );
        assert_eq!(state.access_token().map(|t| t.expose_secret().to_owned()).as_deref(), Some("T2"));
        assert!(matches!(state.next_action(at(50)), TokenAction::Refresh(_)));
    }

    #[test]
    fn grant_response_defaults_lifetime() {
        let parsed: TokenGrant =
            serde_json::from_str(r#"{"access_token":"T1","refresh_token":"R1"}"#).expect("parses");
        assert_eq!(parsed.expires_in, DEFAULT_TOKEN_LIFETIME_SECS);

        let parsed: TokenGrant =
            serde_json::from_str(r#"{"access_token":"T1","expires_in":null}"#).expect("parses");
        assert_eq!(parsed.expires_in, DEFAULT_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn grant_response_accepts_fractional_lifetime() {
        let parse = |raw: &str| -> i64 {
            serde_json::from_str::<TokenGrant>(raw)
                .expect("parses")
                .expires_in
        };
        assert_eq!(parse(r#"{"access_token":"T1","expires_in":100.0}"#), 100);
        assert_eq!(parse(r#"{"access_token":"T1","expires_in":99.6}"#), 100);
        assert_eq!(parse(r#"{"access_token":"T1","expires_in":3600}"#), 3600);
        assert_eq!(parse(r#"{"access_token":"T1","expires_in":-5}"#), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = TokenState::default();
        state.apply(grant(100), at(0));
        state.clear();
        assert!(state.access_token().is_none());
        assert!(state.expires_at().is_none());
        assert!(matches!(state.next_action(at(0)), TokenAction::Authenticate));
    }
}
