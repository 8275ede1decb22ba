use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        length(min = 1, max = 20, message = "Nickname must be 1-20 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "alice")]
    pub nickname: String,

    #[validate(
        length(min = 1, max = 32, message = "Encrypted password must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "c2VjcmV0")]
    pub encrypted_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Signed HS256 token.
    pub token: String,
}
