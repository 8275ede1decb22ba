use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Password, User};
use crate::services::cache::CacheService;
use crate::services::error::{ensure_active, ServiceError};
use crate::services::passwords::password_cache_key;
use crate::services::store::AdminStore;

pub fn user_cache_key(user_id: Uuid) -> String {
    format!("user:{}", user_id)
}

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn AdminStore>,
    cache: CacheService,
}

impl UsersService {
    pub fn new(store: Arc<dyn AdminStore>, cache: CacheService) -> Self {
        Self { store, cache }
    }

    /// Create `user`, with its password when `encrypted_password` is given.
    #[instrument(skip_all, fields(user_id = %user.user_id))]
    pub async fn create(
        &self,
        user: User,
        encrypted_password: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<User, ServiceError> {
        user.validate()?;
        let password = encrypted_password.map(|value| Password::new(value, user.user_id));
        if let Some(password) = &password {
            password.validate()?;
        }

        ensure_active(cancel)?;
        self.store
            .insert_user(&user, password.as_ref())
            .await
            .map_err(ServiceError::Create)?;
        info!("User created");
        Ok(user)
    }

    pub async fn get(
        &self,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Option<User>, ServiceError> {
        let store = self.store.clone();
        self.cache
            .wrap_cache_operations(
                &user_cache_key(user_id),
                move || async move {
                    store
                        .find_user_by_id(user_id)
                        .await
                        .map_err(ServiceError::Database)
                },
                cancel,
            )
            .await
    }

    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<User>, ServiceError> {
        ensure_active(cancel)?;
        self.store.list_users().await.map_err(ServiceError::Database)
    }

    /// Overwrite email and nickname of the stored user `user_id`.
    #[instrument(skip(self, user, cancel))]
    pub async fn update(
        &self,
        user_id: Uuid,
        user: &User,
        cancel: &CancellationToken,
    ) -> Result<User, ServiceError> {
        user.validate()?;
        ensure_active(cancel)?;
        let mut stored = self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(ServiceError::Database)?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        stored.email = user.email.clone();
        stored.nickname = user.nickname.clone();

        // Invalidate first: a cache failure must abort before the row changes.
        self.cache.delete(&user_cache_key(user_id), cancel).await?;
        ensure_active(cancel)?;
        self.store
            .update_user(&stored)
            .await
            .map_err(ServiceError::Update)?;
        info!("User updated");
        Ok(stored)
    }

    /// Delete the user with its password and grants, dropping the cached
    /// user and password first. Returns false when absent.
    #[instrument(skip(self, cancel))]
    pub async fn try_delete(
        &self,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<bool, ServiceError> {
        ensure_active(cancel)?;
        if self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(ServiceError::Database)?
            .is_none()
        {
            warn!("User to delete not found");
            return Ok(false);
        }
        let password = self
            .store
            .find_password_by_user(user_id)
            .await
            .map_err(ServiceError::Database)?;

        // The password row goes with the user, so both entries are dropped
        // before anything is deleted.
        self.cache.delete(&user_cache_key(user_id), cancel).await?;
        if let Some(password) = &password {
            self.cache
                .delete(&password_cache_key(password.password_id), cancel)
                .await?;
        }

        ensure_active(cancel)?;
        let deleted = self
            .store
            .delete_user(user_id)
            .await
            .map_err(ServiceError::Delete)?;
        if !deleted {
            warn!("User to delete not found");
            return Ok(false);
        }
        info!("User deleted");
        Ok(true)
    }

    #[instrument(skip(self, cancel))]
    pub async fn grant_right(
        &self,
        user_id: Uuid,
        right_name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        let right_id = self.resolve_grant(user_id, right_name, cancel).await?;
        self.store
            .grant_right(user_id, right_id)
            .await
            .map_err(ServiceError::Create)?;
        info!("Right granted");
        Ok(())
    }

    /// Returns false when the user did not hold the right.
    #[instrument(skip(self, cancel))]
    pub async fn revoke_right(
        &self,
        user_id: Uuid,
        right_name: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ServiceError> {
        let right_id = self.resolve_grant(user_id, right_name, cancel).await?;
        self.store
            .revoke_right(user_id, right_id)
            .await
            .map_err(ServiceError::Delete)
    }

    async fn resolve_grant(
        &self,
        user_id: Uuid,
        right_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Uuid, ServiceError> {
        if right_name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Right name must not be blank".to_string(),
            ));
        }
        ensure_active(cancel)?;

        if self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(ServiceError::Database)?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!("User {} not found", user_id)));
        }

        let right = self
            .store
            .find_rights_by_names(&[right_name.to_string()])
            .await
            .map_err(ServiceError::Database)?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("Right '{}' not found", right_name)))?;

        ensure_active(cancel)?;
        Ok(right.right_id)
    }
}
