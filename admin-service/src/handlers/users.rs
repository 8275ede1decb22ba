use service_core::{
    axum::{
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    },
    error::AppError,
};
use uuid::Uuid;

use crate::{
    dtos::users::{CreateUserRequest, GrantRightRequest, UpdateUserRequest, UserDto},
    models::User,
    utils::ValidatedJson,
    AppState,
};

#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All users", body = [UserDto])),
    tag = "Users"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.users.list(&state.cancellation()).await?;
    Ok(Json(
        users.into_iter().map(UserDto::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .get(id, &state.cancellation())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", id)))?;
    Ok(Json(UserDto::from(user)))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .create(
            User::new(req.email, req.nickname),
            Some(req.encrypted_password_value),
            &state.cancellation(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// Update a user, creating it when the id is unknown
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserDto),
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Path and body ids differ", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Response, AppError> {
    if id != req.id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Path id {} does not match body id {}",
            id,
            req.id
        )));
    }

    let cancel = state.cancellation();
    let Some(mut user) = state.users.get(id, &cancel).await? else {
        tracing::warn!(user_id = %id, "User to update not found, creating it");
        let created = state.users.create(req.to_new_user(), None, &cancel).await?;
        return Ok((StatusCode::CREATED, Json(UserDto::from(created))).into_response());
    };

    req.apply_to(&mut user);
    let updated = state.users.update(id, &user, &cancel).await?;
    Ok((StatusCode::OK, Json(UserDto::from(updated))).into_response())
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Nil id", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if id.is_nil() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "A nil id cannot identify a user"
        )));
    }

    if !state.users.try_delete(id, &state.cancellation()).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("User {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/{id}/rights",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = GrantRightRequest,
    responses(
        (status = 204, description = "Right granted"),
        (status = 404, description = "User or right not found", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn grant_right(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<GrantRightRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .users
        .grant_right(id, &req.right_name, &state.cancellation())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/users/{id}/rights/{right_name}",
    params(
        ("id" = Uuid, Path, description = "User id"),
        ("right_name" = String, Path, description = "Right name")
    ),
    responses(
        (status = 204, description = "Right revoked"),
        (status = 404, description = "User, right or grant not found", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn revoke_right(
    State(state): State<AppState>,
    Path((id, right_name)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let revoked = state
        .users
        .revoke_right(id, &right_name, &state.cancellation())
        .await?;
    if !revoked {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "User {} does not hold right '{}'",
            id,
            right_name
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
