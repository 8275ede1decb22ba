use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::User;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 20, message = "Nickname must be 1-20 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "alice")]
    pub nickname: String,

    #[validate(
        length(min = 1, max = 32, message = "Email must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(
        length(min = 1, max = 32, message = "Encrypted password must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "c2VjcmV0")]
    pub encrypted_password_value: String,
}

/// Body of `PUT /users/{id}`. Absent fields keep their stored value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    pub id: Uuid,

    #[validate(length(min = 1, max = 20, message = "Nickname must be 1-20 characters"))]
    pub nickname: Option<String>,

    #[validate(length(min = 1, max = 32, message = "Email must be 1-32 characters"))]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    /// Overlay the supplied fields onto `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(nickname) = &self.nickname {
            user.nickname = nickname.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
    }

    /// User to create when the target does not exist yet.
    pub fn to_new_user(&self) -> User {
        let mut user = User::new(
            self.email.clone().unwrap_or_default(),
            self.nickname.clone().unwrap_or_default(),
        );
        user.user_id = self.id;
        user
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub user_id: Uuid,
    #[schema(example = "alice")]
    pub nickname: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub created_utc: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            nickname: user.nickname,
            email: user.email,
            created_utc: user.created_utc,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GrantRightRequest {
    #[validate(
        length(min = 1, max = 32, message = "Right name must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "move")]
    pub right_name: String,
}
