//! UserRight model - grants one right to one user.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Right;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRight {
    pub user_right_id: Uuid,
    pub user_id: Uuid,
    pub right_id: Uuid,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Right>,
}

impl UserRight {
    pub fn new(user_id: Uuid, right_id: Uuid) -> Self {
        Self {
            user_right_id: Uuid::new_v4(),
            user_id,
            right_id,
            right: None,
        }
    }
}
