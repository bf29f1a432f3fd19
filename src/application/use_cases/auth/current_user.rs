use crate::application::ports::identity::{AuthUser, IdentityProvider};

pub struct GetCurrentUser<'a, I: IdentityProvider + ?Sized> {
    pub identity: &'a I,
}

impl<'a, I: IdentityProvider + ?Sized> GetCurrentUser<'a, I> {
    pub async fn execute(&self, access_token: &str) -> anyhow::Result<Option<AuthUser>> {
        self.identity.fetch_user(access_token).await
    }
}
