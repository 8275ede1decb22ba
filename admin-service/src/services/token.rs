//! Signed access tokens carrying a user's rights grouped by game.
//!
//! Every game becomes one claim named after the game whose value maps right
//! names to right descriptions:
//!
//! ```json
//! { "Username": "alice", "Chess": { "move": "Move pieces" }, "iss": "...", ... }
//! ```

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::Right;
use crate::services::error::ServiceError;

pub const USERNAME_CLAIM: &str = "Username";

/// Claim names stamped by [`TokenBuilder::build`]; no game may use them.
const RESERVED_CLAIMS: [&str; 7] = ["iss", "aud", "exp", "nbf", "iat", "jti", USERNAME_CLAIM];

/// Accumulates claims for one token request.
///
/// `build` does not consume the builder or clear its claims, so building
/// twice yields two tokens with the same claims but fresh `exp` and `jti`.
pub struct TokenBuilder {
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    expiry_in_minutes: i64,
    claims: Map<String, Value>,
}

impl TokenBuilder {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.security_key.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiry_in_minutes: config.expiry_in_minutes,
            claims: Map::new(),
        }
    }

    /// Set the `Username` claim, replacing any earlier value.
    pub fn add_username(&mut self, username: &str) -> Result<&mut Self, ServiceError> {
        if username.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Username must not be blank".to_string(),
            ));
        }
        self.claims
            .insert(USERNAME_CLAIM.to_string(), Value::String(username.to_string()));
        Ok(self)
    }

    /// Add one claim per game. Rights must carry their game; rights without
    /// one are skipped. Repeated calls for the same game merge the maps.
    pub fn add_claims(&mut self, rights: &[Right]) -> Result<&mut Self, ServiceError> {
        if rights.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "At least one right is required to build claims".to_string(),
            ));
        }

        let mut grouped: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
        for right in rights {
            let Some(game) = right.game.as_ref() else {
                warn!(right_name = %right.name, "Right has no game loaded, skipping claim");
                continue;
            };
            if RESERVED_CLAIMS.contains(&game.name.as_str()) {
                return Err(ServiceError::InvalidArgument(format!(
                    "Game name '{}' collides with a reserved claim",
                    game.name
                )));
            }
            grouped
                .entry(game.name.as_str())
                .or_default()
                .insert(right.name.clone(), Value::String(right.description.clone()));
        }

        for (game_name, rights) in grouped {
            match self.claims.get_mut(game_name) {
                Some(Value::Object(existing)) => existing.extend(rights),
                _ => {
                    self.claims
                        .insert(game_name.to_string(), Value::Object(rights));
                }
            }
        }
        Ok(self)
    }

    /// Sign the accumulated claims with a fresh expiry and token id.
    pub fn build(&self) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.expiry_in_minutes);

        let mut claims = self.claims.clone();
        claims.insert("iss".to_string(), Value::String(self.issuer.clone()));
        claims.insert("aud".to_string(), Value::String(self.audience.clone()));
        claims.insert("exp".to_string(), Value::from(exp.timestamp()));
        claims.insert("nbf".to_string(), Value::from(now.timestamp()));
        claims.insert("iat".to_string(), Value::from(now.timestamp()));
        claims.insert("jti".to_string(), Value::String(Uuid::new_v4().to_string()));

        let header = Header::new(Algorithm::HS256);
        Ok(encode(&header, &claims, &self.encoding_key)?)
    }
}

/// Verify a token issued with `config` and return its claims.
pub fn decode_claims(token: &str, config: &JwtConfig) -> Result<Map<String, Value>, ServiceError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_audience(&[config.audience.as_str()]);
    let data = decode::<Map<String, Value>>(
        token,
        &DecodingKey::from_secret(config.security_key.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Game;

    fn config() -> JwtConfig {
        JwtConfig {
            issuer: "admin".to_string(),
            audience: "games".to_string(),
            expiry_in_minutes: 1,
            security_key: "a-very-long-test-signing-secret".to_string(),
        }
    }

    fn right(name: &str, description: &str, game: &Game) -> Right {
        Right::new(name, description, game.game_id).with_game(game.clone())
    }

    #[test]
    fn claims_are_grouped_by_game() {
        let a = Game::new("A", None);
        let b = Game::new("B", None);
        let mut builder = TokenBuilder::new(&config());
        builder
            .add_claims(&[right("r1", "d1", &a), right("r2", "d2", &a), right("r3", "d3", &b)])
            .unwrap();

        let claims = decode_claims(&builder.build().unwrap(), &config()).unwrap();
        let custom: Vec<&String> = claims
            .keys()
            .filter(|k| !RESERVED_CLAIMS.contains(&k.as_str()))
            .collect();
        assert_eq!(custom, vec!["A", "B"]);
        assert_eq!(claims["A"], serde_json::json!({"r1": "d1", "r2": "d2"}));
        assert_eq!(claims["B"], serde_json::json!({"r3": "d3"}));
        assert_eq!(claims["iss"], "admin");
        assert_eq!(claims["aud"], "games");
    }

    #[test]
    fn blank_username_is_rejected() {
        let mut builder = TokenBuilder::new(&config());
        assert!(matches!(
            builder.add_username("  "),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_rights_are_rejected() {
        let mut builder = TokenBuilder::new(&config());
        assert!(matches!(
            builder.add_claims(&[]),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn username_is_overwritten() {
        let mut builder = TokenBuilder::new(&config());
        builder.add_username("alice").unwrap();
        builder.add_username("bob").unwrap();
        let claims = decode_claims(&builder.build().unwrap(), &config()).unwrap();
        assert_eq!(claims[USERNAME_CLAIM], "bob");
    }

    #[test]
    fn each_build_gets_a_fresh_token_id() {
        let game = Game::new("A", None);
        let mut builder = TokenBuilder::new(&config());
        builder.add_claims(&[right("r1", "d1", &game)]).unwrap();

        let first = decode_claims(&builder.build().unwrap(), &config()).unwrap();
        let second = decode_claims(&builder.build().unwrap(), &config()).unwrap();
        assert_ne!(first["jti"], second["jti"]);
        assert_eq!(first["A"], second["A"]);
    }

    #[test]
    fn reserved_game_name_is_rejected() {
        let game = Game::new("exp", None);
        let mut builder = TokenBuilder::new(&config());
        assert!(builder.add_claims(&[right("r1", "d1", &game)]).is_err());
    }

    #[test]
    fn expiry_follows_configuration() {
        let builder = TokenBuilder::new(&config());
        let claims = decode_claims(&builder.build().unwrap(), &config()).unwrap();
        let exp = claims["exp"].as_i64().unwrap();
        let iat = claims["iat"].as_i64().unwrap();
        assert_eq!(exp - iat, 60);
    }
}
