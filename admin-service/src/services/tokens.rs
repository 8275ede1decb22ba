use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::JwtConfig;
use crate::services::error::ServiceError;
use crate::services::passwords::PasswordsService;
use crate::services::token::TokenBuilder;

/// Issues access tokens for users logging in with nickname and encrypted password.
#[derive(Clone)]
pub struct TokensService {
    passwords: PasswordsService,
    jwt: JwtConfig,
}

impl TokensService {
    pub fn new(passwords: PasswordsService, jwt: JwtConfig) -> Self {
        Self { passwords, jwt }
    }

    /// Resolve the user owning `encrypted_password`, check it is `nickname`
    /// and sign a token carrying the user's rights.
    #[instrument(skip(self, encrypted_password, cancel))]
    pub async fn issue(
        &self,
        nickname: &str,
        encrypted_password: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        let password = self
            .passwords
            .find_by_encrypted_value(encrypted_password, cancel)
            .await?
            .ok_or_else(|| {
                warn!("No user owns the supplied password");
                ServiceError::NotFound("No user owns the supplied password".to_string())
            })?;

        let user = password
            .user
            .ok_or_else(|| ServiceError::NotFound("Password has no owning user".to_string()))?;

        if user.nickname != nickname {
            warn!("Password does not belong to the supplied nickname");
            return Err(ServiceError::InvalidCredentials);
        }

        let rights = user.granted_rights();
        if rights.is_empty() {
            warn!("User has no granted rights");
            return Err(ServiceError::NoRights);
        }

        let mut builder = TokenBuilder::new(&self.jwt);
        builder.add_username(&user.nickname)?.add_claims(&rights)?;
        let token = builder.build()?;

        info!(rights = rights.len(), "Token issued");
        Ok(token)
    }
}
