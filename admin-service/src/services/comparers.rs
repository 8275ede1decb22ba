//! Semantic equality for games and rights.
//!
//! Equality here is what reconciliation cares about, not identity: two rows
//! with different ids can still be equal.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::models::{Game, Right};
use crate::utils::validation::is_blank;

pub trait EqualityComparer<T> {
    /// The same value (or two absent values) is always equal; an absent
    /// operand never equals a present one.
    fn equals(&self, a: Option<&T>, b: Option<&T>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::eq(a, b) || self.fields_equal(a, b),
            _ => false,
        }
    }

    fn fields_equal(&self, a: &T, b: &T) -> bool;

    /// Hash consistent with [`EqualityComparer::equals`].
    fn hash_of(&self, value: &T) -> u64;
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Compares a game supplied by an external system with a stored one.
///
/// Descriptions only match when both are present and not blank, so two
/// games without a description are never equal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExternalGamesComparer;

impl EqualityComparer<Game> for ExternalGamesComparer {
    fn fields_equal(&self, a: &Game, b: &Game) -> bool {
        let (a_desc, b_desc) = (a.description.as_deref(), b.description.as_deref());
        if is_blank(a_desc) || is_blank(b_desc) {
            return false;
        }
        eq_ignore_case(&a.name, &b.name)
            && eq_ignore_case(a_desc.unwrap_or_default(), b_desc.unwrap_or_default())
    }

    fn hash_of(&self, game: &Game) -> u64 {
        let mut hasher = DefaultHasher::new();
        game.name.to_lowercase().hash(&mut hasher);
        game.description
            .as_deref()
            .map(str::to_lowercase)
            .hash(&mut hasher);
        hasher.finish()
    }
}

/// Compares rights by name, description and owning game.
#[derive(Debug, Default, Clone, Copy)]
pub struct RightsComparer;

impl EqualityComparer<Right> for RightsComparer {
    fn fields_equal(&self, a: &Right, b: &Right) -> bool {
        eq_ignore_case(&a.name, &b.name)
            && eq_ignore_case(&a.description, &b.description)
            && a.game_id == b.game_id
    }

    fn hash_of(&self, right: &Right) -> u64 {
        let mut hasher = DefaultHasher::new();
        right.name.to_lowercase().hash(&mut hasher);
        right.description.to_lowercase().hash(&mut hasher);
        right.game_id.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chess(description: Option<&str>) -> Game {
        Game::new("Chess", description.map(str::to_string))
    }

    #[test]
    fn game_equals_itself() {
        let game = chess(Some("Board game"));
        assert!(ExternalGamesComparer.equals(Some(&game), Some(&game)));
    }

    #[test]
    fn game_without_description_equals_itself() {
        let game = chess(None);
        assert!(ExternalGamesComparer.equals(Some(&game), Some(&game)));
        // A separate instance with the same fields has no description to match on.
        let copy = game.clone();
        assert!(!ExternalGamesComparer.equals(Some(&game), Some(&copy)));
    }

    #[test]
    fn game_comparison_ignores_case_and_identity() {
        let a = chess(Some("Board game"));
        let mut b = Game::new("CHESS", Some("board GAME".to_string()));
        assert!(ExternalGamesComparer.equals(Some(&a), Some(&b)));
        assert_eq!(
            ExternalGamesComparer.hash_of(&a),
            ExternalGamesComparer.hash_of(&b)
        );

        b.name = "Checkers".to_string();
        assert!(!ExternalGamesComparer.equals(Some(&a), Some(&b)));
    }

    #[test]
    fn absent_game_never_equals_present_one() {
        let game = chess(Some("Board game"));
        assert!(!ExternalGamesComparer.equals(None, Some(&game)));
        assert!(!ExternalGamesComparer.equals(Some(&game), None));
    }

    #[test]
    fn blank_descriptions_are_not_equal() {
        let with = chess(Some("Board game"));
        let without = chess(None);
        let blank = chess(Some("  "));
        assert!(!ExternalGamesComparer.equals(Some(&with), Some(&without)));
        assert!(!ExternalGamesComparer.equals(Some(&without), Some(&chess(None))));
        assert!(!ExternalGamesComparer.equals(Some(&blank), Some(&chess(Some(" ")))));
    }

    #[test]
    fn rights_compare_name_description_and_game() {
        let game_id = Uuid::new_v4();
        let a = Right::new("Kick", "Kick players", game_id);
        let b = Right::new("kick", "KICK PLAYERS", game_id);
        assert!(RightsComparer.equals(Some(&a), Some(&b)));
        assert_eq!(RightsComparer.hash_of(&a), RightsComparer.hash_of(&b));

        let other_game = Right::new("Kick", "Kick players", Uuid::new_v4());
        assert!(!RightsComparer.equals(Some(&a), Some(&other_game)));

        let other_description = Right::new("Kick", "Remove players", game_id);
        assert!(!RightsComparer.equals(Some(&a), Some(&other_description)));
        assert!(!RightsComparer.equals(Some(&a), None));
    }
}
