// OAuth2 grants against the vendor's token endpoint.
//
// Password grant for initial login, refresh-token grant for renewal,
// and the refresh guard that every authenticated call runs first.
// Token state transitions happen only here, always under the `tokens`
// mutex, which makes refresh single-flight across concurrent callers.

use std::sync::PoisonError;
use std::sync::atomic::Ordering;

use chrono::Utc;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, warn};

use crate::client::{PerenioClient, TENANT_HEADER, expect_ok, preview, read_json};
use crate::error::Error;
use crate::models::UserInfo;
use crate::token::{TokenAction, TokenGrant, TokenState};

impl PerenioClient {
    /// Log in with the account's email and password.
    ///
    /// `POST {oauth}/protocol/openid-connect/token` with `grant_type=password`.
    /// Opens the session if it is not open yet. On success the token state
    /// is replaced and the account profile is fetched best-effort. On
    /// failure the token state is cleared and the error is logged and
    /// returned; nothing panics or escapes further than the caller.
    pub async fn authenticate(&self) -> Result<(), Error> {
        let mut tokens = self.tokens.lock().await;
        let result = self.password_grant(&mut tokens).await;
        self.grant_epoch.fetch_add(1, Ordering::AcqRel);
        result
    }

    /// Make sure the access token is usable, refreshing or re-authenticating
    /// as needed.
    ///
    /// - no recorded grant: password grant
    /// - within five minutes of expiry: refresh-token grant, falling back
    ///   to one password grant if the refresh is rejected or fails
    /// - otherwise: nothing
    pub async fn refresh_token_if_needed(&self) -> Result<(), Error> {
        self.ensure_token().await.map(drop)
    }

    /// Refresh guard returning the bearer token to use for the next call.
    pub(crate) async fn ensure_token(&self) -> Result<SecretString, Error> {
        let seen_epoch = self.grant_epoch.load(Ordering::Acquire);
        let mut tokens = self.tokens.lock().await;

        if self.grant_epoch.load(Ordering::Acquire) != seen_epoch {
            // Another caller finished a grant while we waited; share its outcome.
            debug!("reusing token grant completed by a concurrent caller");
            return tokens.access_token().cloned().ok_or(Error::NotAuthenticated);
        }

        match tokens.next_action(Utc::now()) {
            TokenAction::Valid => {}
            TokenAction::Authenticate => {
                let result = self.password_grant(&mut tokens).await;
                self.grant_epoch.fetch_add(1, Ordering::AcqRel);
                result?;
            }
            TokenAction::Refresh(refresh_token) => {
                debug!("token expiring soon, refreshing");
                let result = match self.refresh_grant(&refresh_token).await {
                    Ok(grant) => {
                        tokens.apply(grant, Utc::now());
                        info!("token refreshed");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(error = %e, "token refresh failed, re-authenticating");
                        self.password_grant(&mut tokens).await
                    }
                };
                self.grant_epoch.fetch_add(1, Ordering::AcqRel);
                result?;
            }
        }

        tokens.access_token().cloned().ok_or(Error::NotAuthenticated)
    }

    /// Fetch the account profile with the current token.
    ///
    /// `GET {oauth}/users/me`. Stores the result on success.
    pub async fn try_get_user_info(&self) -> Result<UserInfo, Error> {
        let token = self
            .access_token()
            .await
            .ok_or(Error::NotAuthenticated)?;
        self.fetch_user_info(&token).await
    }

    /// [`try_get_user_info`](Self::try_get_user_info), logging failures
    /// and returning `None`.
    pub async fn get_user_info(&self) -> Option<UserInfo> {
        match self.try_get_user_info().await {
            Ok(info) => Some(info),
            Err(e) => {
                error!(error = %e, "failed to get user info");
                None
            }
        }
    }

    // ── Grants ───────────────────────────────────────────────────────

    async fn password_grant(&self, tokens: &mut TokenState) -> Result<(), Error> {
        let credentials = self.credentials();
        let oauth = self.oauth();
        let form = [
            ("grant_type", "password"),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.expose_secret()),
            ("username", credentials.email.as_str()),
            ("password", credentials.password.expose_secret()),
        ];

        match self.request_grant(&form).await {
            Ok(grant) => {
                tokens.apply(grant, Utc::now());
                info!(email = %credentials.email, "authenticated with Perenio");
                if let Some(token) = tokens.access_token() {
                    if let Err(e) = self.fetch_user_info(token).await {
                        warn!(error = %e, "failed to get user info");
                    }
                }
                Ok(())
            }
            Err(e) => {
                tokens.clear();
                error!(error = %e, "authentication failed");
                Err(e)
            }
        }
    }

    async fn refresh_grant(&self, refresh_token: &SecretString) -> Result<TokenGrant, Error> {
        let oauth = self.oauth();
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
        ];
        self.request_grant(&form).await
    }

    /// POST a form-encoded grant to the token endpoint.
    ///
    /// A 200 body carries live tokens, so decode failures keep neither the
    /// body nor a preview of it.
    async fn request_grant(&self, form: &[(&str, &str)]) -> Result<TokenGrant, Error> {
        let http = self.open_session()?;
        let url = self.endpoints().token_url();
        debug!(%url, "requesting token grant");

        let resp = http
            .post(url)
            .header(TENANT_HEADER, &self.oauth().tenant_id)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("token endpoint returned HTTP {status}: {}", preview(&body)),
            });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| Error::Deserialization {
            message: format!("malformed token response: {e}"),
            body: String::new(),
        })
    }

    async fn fetch_user_info(&self, token: &SecretString) -> Result<UserInfo, Error> {
        let http = self.session()?;
        let url = self.endpoints().user_info_url();
        debug!(%url, "fetching user info");

        let resp = self.authorized(http.get(url), token).send().await?;
        let info: UserInfo = read_json(expect_ok(resp).await?).await?;
        debug!(email = ?info.email(), "user info received");

        *self
            .user_info
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(info.clone());
        Ok(info)
    }
}
