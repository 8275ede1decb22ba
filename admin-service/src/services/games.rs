use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::models::Game;
use crate::services::comparers::{EqualityComparer, ExternalGamesComparer};
use crate::services::error::{ensure_active, ServiceError};
use crate::services::store::AdminStore;

#[derive(Clone)]
pub struct GamesService {
    store: Arc<dyn AdminStore>,
}

impl GamesService {
    pub fn new(store: Arc<dyn AdminStore>) -> Self {
        Self { store }
    }

    pub async fn get_by_name(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Game>, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Game name must not be blank".to_string(),
            ));
        }
        ensure_active(cancel)?;
        self.store
            .find_game_by_name(name)
            .await
            .map_err(ServiceError::Database)
    }

    pub async fn get_by_id(
        &self,
        game_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Option<Game>, ServiceError> {
        ensure_active(cancel)?;
        self.store
            .find_game_by_id(game_id)
            .await
            .map_err(ServiceError::Database)
    }

    #[instrument(skip(self, game, cancel), fields(game_name = %game.name))]
    pub async fn add(&self, game: Game, cancel: &CancellationToken) -> Result<Game, ServiceError> {
        game.validate()?;
        ensure_active(cancel)?;
        self.store
            .insert_game(&game)
            .await
            .map_err(ServiceError::Create)?;
        info!(game_id = %game.game_id, "Game created");
        Ok(game)
    }

    /// Overwrite the stored game `game_id` with the fields of `game`.
    #[instrument(skip(self, game, cancel), fields(game_name = %game.name))]
    pub async fn update(
        &self,
        game_id: Uuid,
        game: &Game,
        cancel: &CancellationToken,
    ) -> Result<Game, ServiceError> {
        game.validate()?;
        let mut stored = self
            .get_by_id(game_id, cancel)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Game {} not found", game_id)))?;

        stored.apply(game);
        ensure_active(cancel)?;
        self.store
            .update_game(&stored)
            .await
            .map_err(ServiceError::Update)?;
        info!(game_id = %stored.game_id, "Game updated");
        Ok(stored)
    }

    /// Make sure the externally described game is stored: create it when
    /// unknown, refresh it when it differs from the stored one.
    pub async fn ensure_registered(
        &self,
        external: Game,
        cancel: &CancellationToken,
    ) -> Result<Game, ServiceError> {
        external.validate()?;
        match self.get_by_name(&external.name, cancel).await? {
            None => self.add(external, cancel).await,
            Some(stored) if ExternalGamesComparer.equals(Some(&stored), Some(&external)) => {
                Ok(stored)
            }
            Some(stored) => self.update(stored.game_id, &external, cancel).await,
        }
    }
}
