//! Right model - a named permission scoped to exactly one game.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Game;

/// Right entity. Names are unique across the system, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
pub struct Right {
    pub right_id: Uuid,
    #[validate(
        length(min = 1, max = 32, message = "Right name must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub name: String,
    #[validate(
        length(min = 1, max = 32, message = "Right description must be 1-32 characters"),
        custom(function = "crate::utils::validation::not_blank")
    )]
    pub description: String,
    pub game_id: Uuid,
    /// Owning game, populated only by eager lookups (token issuance).
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<Game>,
}

impl Right {
    /// Create a new right owned by `game_id`.
    pub fn new(name: impl Into<String>, description: impl Into<String>, game_id: Uuid) -> Self {
        Self {
            right_id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            game_id,
            game: None,
        }
    }

    /// Attach the owning game.
    pub fn with_game(mut self, game: Game) -> Self {
        self.game_id = game.game_id;
        self.game = Some(game);
        self
    }

    /// Whether this right carries `name`, ignoring case.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Copy the desired fields onto this persisted right, keeping its identity.
    pub fn apply(&mut self, desired: &Right) {
        self.name = desired.name.clone();
        self.description = desired.description.clone();
        self.game_id = desired.game_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_right_passes() {
        assert!(Right::new("kick", "Kick players", Uuid::new_v4())
            .validate()
            .is_ok());
    }

    #[test]
    fn blank_description_is_rejected() {
        let right = Right::new("kick", "  ", Uuid::new_v4());
        assert!(right.validate().is_err());
    }

    #[test]
    fn name_over_limit_is_rejected() {
        let right = Right::new("k".repeat(33), "Kick players", Uuid::new_v4());
        assert!(right.validate().is_err());
    }

    #[test]
    fn name_match_ignores_case() {
        let right = Right::new("Kick", "Kick players", Uuid::new_v4());
        assert!(right.has_name("KICK"));
        assert!(!right.has_name("ban"));
    }
}
