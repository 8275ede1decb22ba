//! Game model - an external system that owns a set of rights.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Game entity. Names are unique across the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
pub struct Game {
    pub game_id: Uuid,
    #[validate(
        length(min = 1, max = 32, message = "Game name must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "Game description must be 1-32 characters"))]
    pub description: Option<String>,
}

impl Game {
    /// Create a new game.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            game_id: Uuid::new_v4(),
            name: name.into(),
            description,
        }
    }

    /// Copy the externally supplied fields onto this game, keeping its identity.
    pub fn apply(&mut self, source: &Game) {
        self.name = source.name.clone();
        self.description = source.description.clone();
    }
}
