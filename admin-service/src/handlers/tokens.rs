use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::tokens::{LoginRequest, TokenResponse},
    utils::ValidatedJson,
    AppState,
};

/// Issue an access token carrying the user's rights grouped by game
#[utoipa::path(
    post,
    path = "/tokens",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Password does not belong to the nickname", body = ErrorResponse),
        (status = 403, description = "User has no rights", body = ErrorResponse),
        (status = 404, description = "No user owns the password", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Tokens"
)]
pub async fn create_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .tokens
        .issue(&req.nickname, &req.encrypted_password, &state.cancellation())
        .await?;
    Ok((StatusCode::OK, Json(TokenResponse { token })))
}
