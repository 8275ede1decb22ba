use service_core::{
    axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};

use crate::{
    dtos::rights::{RegisterRightsRequest, RegisterRightsResponse, RightDto},
    models::Right,
    utils::ValidatedJson,
    AppState,
};

/// Register the complete right-set of a game
///
/// Creates the game when unknown and refreshes it when its description
/// changed, then creates, updates and deletes rights so the stored set
/// matches the request.
#[utoipa::path(
    post,
    path = "/rights/register",
    request_body = RegisterRightsRequest,
    responses(
        (status = 200, description = "Rights reconciled", body = RegisterRightsResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Rights"
)]
pub async fn register_rights(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRightsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let cancel = state.cancellation();
    let game = state.games.ensure_registered(req.game.into(), &cancel).await?;

    let desired: Vec<Right> = req
        .rights
        .into_iter()
        .map(|right| Right::new(right.name, right.description, game.game_id))
        .collect();

    let sorted = state.rights.register(&game.name, &desired, &cancel).await?;
    Ok((
        StatusCode::OK,
        Json(RegisterRightsResponse::new(game.game_id, sorted)),
    ))
}

/// List the stored rights of a game
#[utoipa::path(
    get,
    path = "/rights/{game_name}",
    params(("game_name" = String, Path, description = "Game name")),
    responses(
        (status = 200, description = "Rights of the game", body = [RightDto]),
        (status = 404, description = "Game not found", body = ErrorResponse)
    ),
    tag = "Rights"
)]
pub async fn get_game_rights(
    State(state): State<AppState>,
    Path(game_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rights = state
        .rights
        .get_all(&game_name, &state.cancellation())
        .await?;
    Ok(Json(
        rights.into_iter().map(RightDto::from).collect::<Vec<_>>(),
    ))
}
