use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Game, Right, SortedRights};

/// Game as described by the external system registering its rights.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ExternalGameDto {
    #[validate(
        length(min = 1, max = 32, message = "Game name must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "Chess", max_length = 32)]
    pub name: String,

    #[validate(length(min = 1, max = 32, message = "Game description must be 1-32 characters"))]
    #[schema(example = "Board game", max_length = 32)]
    pub description: Option<String>,
}

impl From<ExternalGameDto> for Game {
    fn from(dto: ExternalGameDto) -> Self {
        Game::new(dto.name, dto.description)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ExternalRightDto {
    #[validate(
        length(min = 1, max = 32, message = "Right name must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "move", max_length = 32)]
    pub name: String,

    #[validate(
        length(min = 1, max = 32, message = "Right description must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    #[schema(example = "Move pieces", max_length = 32)]
    pub description: String,
}

/// Full desired right-set of one game. Stored rights of the game that are
/// not listed here are removed.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRightsRequest {
    #[validate(nested)]
    pub game: ExternalGameDto,

    #[validate(nested)]
    pub rights: Vec<ExternalRightDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RightDto {
    pub right_id: Uuid,
    #[schema(example = "move")]
    pub name: String,
    #[schema(example = "Move pieces")]
    pub description: String,
    pub game_id: Uuid,
}

impl From<Right> for RightDto {
    fn from(right: Right) -> Self {
        Self {
            right_id: right.right_id,
            name: right.name,
            description: right.description,
            game_id: right.game_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterRightsResponse {
    pub game_id: Uuid,
    pub created: Vec<RightDto>,
    pub updated: Vec<RightDto>,
    pub deleted: Vec<RightDto>,
}

impl RegisterRightsResponse {
    pub fn new(game_id: Uuid, sorted: SortedRights) -> Self {
        let convert = |rights: Vec<Right>| rights.into_iter().map(RightDto::from).collect();
        Self {
            game_id,
            created: convert(sorted.rights_to_create),
            updated: convert(sorted.rights_to_update),
            deleted: convert(sorted.rights_to_delete),
        }
    }
}
