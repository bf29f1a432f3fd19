use async_trait::async_trait;

/// Opaque session material issued by the external identity service. The
/// tokens are never inspected locally, only stored in cookies and replayed.
#[derive(Debug, Clone)]
pub struct OauthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl AuthUser {
    pub fn display_label(&self) -> &str {
        self.email
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or("User")
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider authorization URL the browser is sent to for sign-in.
    fn authorize_url(&self, redirect_uri: &str) -> String;

    async fn exchange_code(&self, code: &str, redirect_uri: &str)
    -> anyhow::Result<OauthSession>;

    /// Resolves the principal behind an access token. `None` means the token
    /// is not (or no longer) associated with a user.
    async fn fetch_user(&self, access_token: &str) -> anyhow::Result<Option<AuthUser>>;

    /// Best-effort revocation on sign-out.
    async fn revoke(&self, access_token: &str) -> anyhow::Result<()>;
}
