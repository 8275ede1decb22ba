//! Password model. The value is stored already encrypted by the caller and
//! only ever compared for equality.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::User;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct Password {
    pub password_id: Uuid,
    #[validate(
        length(min = 1, max = 32, message = "Encrypted value must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub encrypted_value: String,
    pub user_id: Uuid,
    /// Owning user, populated only by the login lookup.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Password {
    pub fn new(encrypted_value: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            password_id: Uuid::new_v4(),
            encrypted_value: encrypted_value.into(),
            user_id,
            user: None,
        }
    }
}
