//! Rights registration: diff a desired right-set for one game against the
//! stored one and apply the result.
//!
//! Rights are matched by name, ignoring case, never by id: the external
//! systems that register rights do not know stored identities.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::models::{Right, SortedRights};
use crate::services::comparers::{EqualityComparer, RightsComparer};
use crate::services::error::{ensure_active, ServiceError};
use crate::services::games::GamesService;
use crate::services::metrics;
use crate::services::store::AdminStore;

#[derive(Clone)]
pub struct RightsService {
    store: Arc<dyn AdminStore>,
    games: GamesService,
    comparer: RightsComparer,
}

/// Field validation for every right, plus name uniqueness within the batch.
fn validate_rights(rights: &[Right]) -> Result<(), ServiceError> {
    let mut names = HashSet::with_capacity(rights.len());
    for right in rights {
        right.validate()?;
        if !names.insert(right.name.to_lowercase()) {
            return Err(ServiceError::ValidationMessage(format!(
                "Right '{}' is listed more than once",
                right.name
            )));
        }
    }
    Ok(())
}

fn names_of(rights: &[Right]) -> Vec<String> {
    rights.iter().map(|right| right.name.clone()).collect()
}

impl RightsService {
    pub fn new(store: Arc<dyn AdminStore>, games: GamesService) -> Self {
        Self {
            store,
            games,
            comparer: RightsComparer,
        }
    }

    /// Every stored right of the game called `game_name`.
    pub async fn get_all(
        &self,
        game_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Right>, ServiceError> {
        ensure_active(cancel)?;
        if game_name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Game name must not be blank".to_string(),
            ));
        }

        let game = self
            .games
            .get_by_name(game_name, cancel)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Game '{}' not found", game_name)))?;

        ensure_active(cancel)?;
        let rights = self
            .store
            .find_rights_by_game(game.game_id)
            .await
            .map_err(ServiceError::Database)?;
        debug!(game_name, count = rights.len(), "Loaded rights of game");
        Ok(rights)
    }

    /// Stored rights carrying any of `names`, or `None` when none match.
    pub async fn get_by_names(
        &self,
        names: &[String],
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<Right>>, ServiceError> {
        ensure_active(cancel)?;
        if names.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "At least one right name is required".to_string(),
            ));
        }

        let rights = self
            .store
            .find_rights_by_names(names)
            .await
            .map_err(ServiceError::Database)?;
        if rights.is_empty() {
            debug!(?names, "No rights match the requested names");
            return Ok(None);
        }
        Ok(Some(rights))
    }

    /// Classify `desired` against the rights stored for `game_name`.
    #[instrument(skip(self, desired, cancel), fields(desired = desired.len()))]
    pub async fn sort_game_rights(
        &self,
        game_name: &str,
        desired: &[Right],
        cancel: &CancellationToken,
    ) -> Result<SortedRights, ServiceError> {
        ensure_active(cancel)?;
        if game_name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Game name must not be blank".to_string(),
            ));
        }
        validate_rights(desired)?;

        let stored = self.get_all(game_name, cancel).await?;
        if stored.is_empty() {
            debug!("Game has no stored rights, every desired right is new");
            return Ok(SortedRights::create_all(desired.to_vec()));
        }

        let mut sorted = SortedRights::default();
        for right in desired {
            match stored.iter().find(|s| s.has_name(&right.name)) {
                None => sorted.rights_to_create.push(right.clone()),
                Some(existing) if !self.comparer.equals(Some(right), Some(existing)) => {
                    sorted.rights_to_update.push(right.clone())
                }
                Some(_) => {}
            }
        }
        sorted.rights_to_delete = stored
            .into_iter()
            .filter(|s| !desired.iter().any(|right| right.has_name(&s.name)))
            .collect();

        debug!(
            create = sorted.rights_to_create.len(),
            update = sorted.rights_to_update.len(),
            delete = sorted.rights_to_delete.len(),
            "Rights sorted"
        );
        Ok(sorted)
    }

    /// Reconcile `desired` with the stored rights of `game_name`, then apply
    /// the deletes, creates and updates in that order.
    ///
    /// Each phase commits on its own. A failing phase stops the remaining
    /// ones but does not undo those already committed.
    #[instrument(skip(self, desired, cancel), fields(desired = desired.len()))]
    pub async fn register(
        &self,
        game_name: &str,
        desired: &[Right],
        cancel: &CancellationToken,
    ) -> Result<SortedRights, ServiceError> {
        validate_rights(desired)?;
        let sorted = self.sort_game_rights(game_name, desired, cancel).await?;

        if !sorted.rights_to_delete.is_empty() {
            self.try_delete_range(&sorted.rights_to_delete, cancel)
                .await?;
        }
        if !sorted.rights_to_create.is_empty() {
            self.add_range(&sorted.rights_to_create, cancel).await?;
        }
        if !sorted.rights_to_update.is_empty() {
            self.update_range(&sorted.rights_to_update, cancel).await?;
        }

        info!(
            created = sorted.rights_to_create.len(),
            updated = sorted.rights_to_update.len(),
            deleted = sorted.rights_to_delete.len(),
            "Rights registered"
        );
        Ok(sorted)
    }

    /// Delete the stored rights named like `rights`.
    ///
    /// Returns false when none of the names resolve. Names that do not
    /// resolve are skipped with a warning.
    pub async fn try_delete_range(
        &self,
        rights: &[Right],
        cancel: &CancellationToken,
    ) -> Result<bool, ServiceError> {
        ensure_active(cancel)?;
        if rights.is_empty() {
            return Ok(false);
        }

        let Some(found) = self.get_by_names(&names_of(rights), cancel).await? else {
            warn!("None of the rights to delete exist");
            return Ok(false);
        };

        ensure_active(cancel)?;
        self.store
            .remove_rights(&found)
            .await
            .map_err(ServiceError::Delete)?;
        metrics::record_rights_phase("delete", found.len());

        if found.len() != rights.len() {
            warn!(
                requested = rights.len(),
                deleted = found.len(),
                "Some rights to delete were not found"
            );
        }
        Ok(true)
    }

    pub async fn add_range(
        &self,
        rights: &[Right],
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        ensure_active(cancel)?;
        validate_rights(rights)?;
        if rights.is_empty() {
            return Ok(());
        }

        self.store
            .add_rights(rights)
            .await
            .map_err(ServiceError::Create)?;
        metrics::record_rights_phase("create", rights.len());
        Ok(())
    }

    /// Copy name, description and game of each desired right onto the
    /// stored right of the same name, keeping stored ids.
    pub async fn update_range(
        &self,
        rights: &[Right],
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        ensure_active(cancel)?;
        validate_rights(rights)?;
        if rights.is_empty() {
            return Ok(());
        }

        let mut stored = self
            .get_by_names(&names_of(rights), cancel)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No rights to update were found".to_string()))?;

        for existing in stored.iter_mut() {
            if let Some(desired) = rights.iter().find(|r| r.has_name(&existing.name)) {
                existing.apply(desired);
            }
        }

        ensure_active(cancel)?;
        self.store
            .update_rights(&stored)
            .await
            .map_err(ServiceError::Update)?;
        metrics::record_rights_phase("update", stored.len());
        Ok(())
    }
}
