use crate::application::ports::identity::{AuthUser, IdentityProvider, OauthSession};

#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error("authorization code exchange failed")]
    Exchange(#[source] anyhow::Error),
    #[error("exchange succeeded but returned no session")]
    EmptySession,
    #[error("user lookup failed")]
    UserLookup(#[source] anyhow::Error),
    #[error("session exists but no user could be resolved")]
    NoUser,
}

pub struct CompleteSignIn<'a, I: IdentityProvider + ?Sized> {
    pub identity: &'a I,
}

impl<'a, I: IdentityProvider + ?Sized> CompleteSignIn<'a, I> {
    /// Exchanges `code` for a session and independently verifies that both a
    /// usable session and a resolvable user came back; exchange success alone
    /// is not trusted.
    pub async fn execute(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<(OauthSession, AuthUser), SignInError> {
        let session = self
            .identity
            .exchange_code(code, redirect_uri)
            .await
            .map_err(SignInError::Exchange)?;
        if session.access_token.is_empty() {
            return Err(SignInError::EmptySession);
        }
        let user = self
            .identity
            .fetch_user(&session.access_token)
            .await
            .map_err(SignInError::UserLookup)?
            .ok_or(SignInError::NoUser)?;
        Ok((session, user))
    }
}
