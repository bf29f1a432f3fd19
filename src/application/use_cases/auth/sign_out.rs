use tracing::debug;

use crate::application::ports::identity::IdentityProvider;

pub struct SignOut<'a, I: IdentityProvider + ?Sized> {
    pub identity: &'a I,
}

impl<'a, I: IdentityProvider + ?Sized> SignOut<'a, I> {
    /// Revocation is best-effort; the cookies are cleared either way.
    pub async fn execute(&self, access_token: &str) {
        if let Err(err) = self.identity.revoke(access_token).await {
            debug!(error = ?err, "token_revoke_failed");
        }
    }
}
