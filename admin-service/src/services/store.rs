//! Persistence seam for the admin backend.
//!
//! Every bulk operation on rights is a single unit of work: it either
//! commits completely or leaves the store untouched.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Game, Password, Right, User};

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn health_check(&self) -> Result<(), anyhow::Error>;

    // ==================== Game Operations ====================

    async fn find_game_by_name(&self, name: &str) -> Result<Option<Game>, anyhow::Error>;
    async fn find_game_by_id(&self, game_id: Uuid) -> Result<Option<Game>, anyhow::Error>;
    async fn insert_game(&self, game: &Game) -> Result<(), anyhow::Error>;
    async fn update_game(&self, game: &Game) -> Result<(), anyhow::Error>;

    // ==================== Right Operations ====================

    async fn find_rights_by_game(&self, game_id: Uuid) -> Result<Vec<Right>, anyhow::Error>;
    /// Rights whose name matches any of `names`, ignoring case.
    async fn find_rights_by_names(&self, names: &[String]) -> Result<Vec<Right>, anyhow::Error>;
    async fn add_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error>;
    async fn update_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error>;
    async fn remove_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error>;

    // ==================== User Operations ====================

    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error>;
    /// Insert the user together with its password, when one is given.
    async fn insert_user(
        &self,
        user: &User,
        password: Option<&Password>,
    ) -> Result<(), anyhow::Error>;
    async fn update_user(&self, user: &User) -> Result<(), anyhow::Error>;
    /// Delete the user with its password and granted rights. Returns false when absent.
    async fn delete_user(&self, user_id: Uuid) -> Result<bool, anyhow::Error>;
    async fn grant_right(&self, user_id: Uuid, right_id: Uuid) -> Result<(), anyhow::Error>;
    /// Returns false when the user did not hold the right.
    async fn revoke_right(&self, user_id: Uuid, right_id: Uuid) -> Result<bool, anyhow::Error>;

    // ==================== Password Operations ====================

    async fn insert_password(&self, password: &Password) -> Result<(), anyhow::Error>;
    async fn find_password_by_id(&self, password_id: Uuid)
        -> Result<Option<Password>, anyhow::Error>;
    async fn find_password_by_user(&self, user_id: Uuid)
        -> Result<Option<Password>, anyhow::Error>;
    /// Resolve a password by its stored value, eagerly loading the owning
    /// user, the user's granted rights and each right's game.
    async fn find_password_with_rights(
        &self,
        encrypted_value: &str,
    ) -> Result<Option<Password>, anyhow::Error>;
}
