use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Password;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePasswordRequest {
    #[validate(
        length(min = 1, max = 32, message = "Encrypted value must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "c2VjcmV0")]
    pub encrypted_value: String,

    pub user_id: Uuid,
}

impl From<CreatePasswordRequest> for Password {
    fn from(req: CreatePasswordRequest) -> Self {
        Password::new(req.encrypted_value, req.user_id)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordDto {
    pub password_id: Uuid,
    pub encrypted_value: String,
    pub user_id: Uuid,
}

impl From<Password> for PasswordDto {
    fn from(password: Password) -> Self {
        Self {
            password_id: password.password_id,
            encrypted_value: password.encrypted_value,
            user_id: password.user_id,
        }
    }
}
