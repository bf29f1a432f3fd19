use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::identity::{AuthUser, IdentityProvider, OauthSession};
use crate::bootstrap::config::Config;

/// OAuth 2.0 authorization-code client for the configured provider. The
/// endpoint defaults in `Config` target Google, but anything speaking the
/// standard form-encoded token exchange and bearer userinfo lookup works.
pub struct ReqwestIdentityProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    authorize_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
    revoke_endpoint: Option<String>,
    scopes: String,
}

impl ReqwestIdentityProvider {
    pub fn new(cfg: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: cfg.oauth_client_id.clone(),
            client_secret: cfg.oauth_client_secret.clone(),
            authorize_endpoint: cfg.oauth_authorize_url.clone(),
            token_endpoint: cfg.oauth_token_url.clone(),
            userinfo_endpoint: cfg.oauth_userinfo_url.clone(),
            revoke_endpoint: cfg.oauth_revoke_url.clone(),
            scopes: cfg.oauth_scopes.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UserinfoResponse {
    #[serde(default)]
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

#[async_trait]
impl IdentityProvider for ReqwestIdentityProvider {
    fn authorize_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}",
            self.authorize_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scopes),
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> anyhow::Result<OauthSession> {
        let resp = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            anyhow::bail!("token endpoint returned {}", resp.status());
        }
        let token: TokenResponse = resp.json().await?;
        Ok(OauthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        })
    }

    async fn fetch_user(&self, access_token: &str) -> anyhow::Result<Option<AuthUser>> {
        let resp = self
            .http
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("userinfo endpoint returned {}", resp.status());
        }
        let info: UserinfoResponse = resp.json().await?;
        if info.sub.is_empty() {
            return Ok(None);
        }
        Ok(Some(AuthUser {
            id: info.sub,
            email: info.email,
            display_name: info.name,
        }))
    }

    async fn revoke(&self, access_token: &str) -> anyhow::Result<()> {
        let Some(endpoint) = &self.revoke_endpoint else {
            return Ok(());
        };
        self.http
            .post(endpoint)
            .form(&[("token", access_token)])
            .send()
            .await?;
        Ok(())
    }
}
