use service_core::{
    axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};
use uuid::Uuid;

use crate::{
    dtos::passwords::{CreatePasswordRequest, PasswordDto},
    utils::ValidatedJson,
    AppState,
};

#[utoipa::path(
    get,
    path = "/passwords/{id}",
    params(("id" = Uuid, Path, description = "Password id")),
    responses(
        (status = 200, description = "Password found", body = PasswordDto),
        (status = 404, description = "Password not found", body = ErrorResponse)
    ),
    tag = "Passwords"
)]
pub async fn get_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let password = state
        .passwords
        .get(id, &state.cancellation())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Password {} not found", id)))?;
    Ok(Json(PasswordDto::from(password)))
}

#[utoipa::path(
    post,
    path = "/passwords",
    request_body = CreatePasswordRequest,
    responses(
        (status = 201, description = "Password created", body = PasswordDto),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Passwords"
)]
pub async fn create_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password = state
        .passwords
        .create(req.into(), &state.cancellation())
        .await?;
    Ok((StatusCode::CREATED, Json(PasswordDto::from(password))))
}
