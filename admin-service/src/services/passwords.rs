use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::models::Password;
use crate::services::cache::CacheService;
use crate::services::error::{ensure_active, ServiceError};
use crate::services::store::AdminStore;

pub fn password_cache_key(password_id: Uuid) -> String {
    format!("password:{}", password_id)
}

#[derive(Clone)]
pub struct PasswordsService {
    store: Arc<dyn AdminStore>,
    cache: CacheService,
}

impl PasswordsService {
    pub fn new(store: Arc<dyn AdminStore>, cache: CacheService) -> Self {
        Self { store, cache }
    }

    #[instrument(skip(self, password, cancel), fields(user_id = %password.user_id))]
    pub async fn create(
        &self,
        password: Password,
        cancel: &CancellationToken,
    ) -> Result<Password, ServiceError> {
        password.validate()?;
        ensure_active(cancel)?;
        self.store
            .insert_password(&password)
            .await
            .map_err(ServiceError::Create)?;
        info!(password_id = %password.password_id, "Password created");
        Ok(password)
    }

    pub async fn get(
        &self,
        password_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Option<Password>, ServiceError> {
        let store = self.store.clone();
        self.cache
            .wrap_cache_operations(
                &password_cache_key(password_id),
                move || async move {
                    store
                        .find_password_by_id(password_id)
                        .await
                        .map_err(ServiceError::Database)
                },
                cancel,
            )
            .await
    }

    /// Resolve a password by its stored value together with the owning
    /// user's granted rights and their games.
    pub async fn find_by_encrypted_value(
        &self,
        encrypted_value: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Password>, ServiceError> {
        if encrypted_value.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Encrypted password must not be blank".to_string(),
            ));
        }
        ensure_active(cancel)?;
        self.store
            .find_password_with_rights(encrypted_value)
            .await
            .map_err(ServiceError::Database)
    }
}
