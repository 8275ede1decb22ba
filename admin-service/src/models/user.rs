//! User model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{Right, UserRight};

/// User entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct User {
    pub user_id: Uuid,
    #[validate(
        length(min = 1, max = 32, message = "Email must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub email: String,
    #[validate(
        length(min = 1, max = 20, message = "Nickname must be 1-20 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub nickname: String,
    pub created_utc: DateTime<Utc>,
    /// Granted rights, populated only by eager lookups.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_rights: Vec<UserRight>,
}

impl User {
    /// Create a new user.
    pub fn new(email: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email: email.into(),
            nickname: nickname.into(),
            created_utc: Utc::now(),
            user_rights: Vec::new(),
        }
    }

    /// Rights resolved through the loaded user rights.
    pub fn granted_rights(&self) -> Vec<Right> {
        self.user_rights
            .iter()
            .filter_map(|user_right| user_right.right.clone())
            .collect()
    }
}
