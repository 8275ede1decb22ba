//! In-memory implementation of [`AdminStore`].
//!
//! Mirrors the relational constraints of the Postgres schema: unique game
//! names, case-insensitive unique right names, and cascading deletes from
//! games to rights and from users to passwords and granted rights.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Game, Password, Right, User, UserRight};
use crate::services::store::AdminStore;

#[derive(Default)]
struct State {
    games: HashMap<Uuid, Game>,
    rights: HashMap<Uuid, Right>,
    users: HashMap<Uuid, User>,
    passwords: HashMap<Uuid, Password>,
    user_rights: Vec<UserRight>,
    failing: HashSet<&'static str>,
}

impl State {
    fn check(&self, operation: &'static str) -> Result<(), anyhow::Error> {
        if self.failing.contains(operation) {
            anyhow::bail!("Injected failure in {}", operation);
        }
        Ok(())
    }

    fn right_name_taken(&self, name: &str, except: Uuid) -> bool {
        let lowered = name.to_lowercase();
        self.rights
            .values()
            .any(|r| r.right_id != except && r.name.to_lowercase() == lowered)
    }

    fn game_name_taken(&self, name: &str, except: Uuid) -> bool {
        self.games
            .values()
            .any(|g| g.game_id != except && g.name == name)
    }
}

/// Store backed by process memory, used by tests and local runs without a database.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, anyhow::Error> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("In-memory store lock poisoned"))
    }

    /// Make every subsequent call of `operation` (a trait method name) fail.
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut state) = self.lock() {
            state.failing.insert(operation);
        }
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.lock() {
            state.failing.clear();
        }
    }

    /// Snapshot of every persisted right, ordered by name.
    pub fn all_rights(&self) -> Vec<Right> {
        let mut rights: Vec<Right> = self
            .lock()
            .map(|state| state.rights.values().cloned().collect())
            .unwrap_or_default();
        rights.sort_by(|a, b| a.name.cmp(&b.name));
        rights
    }
}

#[async_trait]
impl AdminStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.lock()?.check("health_check")
    }

    // ==================== Game Operations ====================

    async fn find_game_by_name(&self, name: &str) -> Result<Option<Game>, anyhow::Error> {
        let state = self.lock()?;
        state.check("find_game_by_name")?;
        Ok(state.games.values().find(|g| g.name == name).cloned())
    }

    async fn find_game_by_id(&self, game_id: Uuid) -> Result<Option<Game>, anyhow::Error> {
        let state = self.lock()?;
        state.check("find_game_by_id")?;
        Ok(state.games.get(&game_id).cloned())
    }

    async fn insert_game(&self, game: &Game) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("insert_game")?;
        if state.games.contains_key(&game.game_id) || state.game_name_taken(&game.name, game.game_id)
        {
            anyhow::bail!("Game '{}' already exists", game.name);
        }
        state.games.insert(game.game_id, game.clone());
        Ok(())
    }

    async fn update_game(&self, game: &Game) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("update_game")?;
        if !state.games.contains_key(&game.game_id) {
            anyhow::bail!("Game {} no longer exists", game.game_id);
        }
        if state.game_name_taken(&game.name, game.game_id) {
            anyhow::bail!("Game '{}' already exists", game.name);
        }
        state.games.insert(game.game_id, game.clone());
        Ok(())
    }

    // ==================== Right Operations ====================

    async fn find_rights_by_game(&self, game_id: Uuid) -> Result<Vec<Right>, anyhow::Error> {
        let state = self.lock()?;
        state.check("find_rights_by_game")?;
        let mut rights: Vec<Right> = state
            .rights
            .values()
            .filter(|r| r.game_id == game_id)
            .cloned()
            .collect();
        rights.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rights)
    }

    async fn find_rights_by_names(&self, names: &[String]) -> Result<Vec<Right>, anyhow::Error> {
        let state = self.lock()?;
        state.check("find_rights_by_names")?;
        let wanted: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        Ok(state
            .rights
            .values()
            .filter(|r| wanted.contains(&r.name.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn add_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("add_rights")?;

        // Validate the whole batch before touching state so a failure leaves nothing behind.
        let mut batch_names = HashSet::new();
        for right in rights {
            if !state.games.contains_key(&right.game_id) {
                anyhow::bail!("Right '{}' references unknown game {}", right.name, right.game_id);
            }
            if state.rights.contains_key(&right.right_id)
                || state.right_name_taken(&right.name, right.right_id)
                || !batch_names.insert(right.name.to_lowercase())
            {
                anyhow::bail!("Right '{}' already exists", right.name);
            }
        }

        for right in rights {
            let mut stored = right.clone();
            stored.game = None;
            state.rights.insert(stored.right_id, stored);
        }
        Ok(())
    }

    async fn update_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("update_rights")?;

        let updated_ids: HashSet<Uuid> = rights.iter().map(|r| r.right_id).collect();
        let mut batch_names = HashSet::new();
        for right in rights {
            if !state.rights.contains_key(&right.right_id) {
                anyhow::bail!("Right '{}' no longer exists", right.name);
            }
            if !state.games.contains_key(&right.game_id) {
                anyhow::bail!("Right '{}' references unknown game {}", right.name, right.game_id);
            }
            let lowered = right.name.to_lowercase();
            let clashes = state.rights.values().any(|other| {
                !updated_ids.contains(&other.right_id) && other.name.to_lowercase() == lowered
            });
            if clashes || !batch_names.insert(lowered) {
                anyhow::bail!("Right '{}' already exists", right.name);
            }
        }

        for right in rights {
            let mut stored = right.clone();
            stored.game = None;
            state.rights.insert(stored.right_id, stored);
        }
        Ok(())
    }

    async fn remove_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("remove_rights")?;
        let ids: HashSet<Uuid> = rights.iter().map(|r| r.right_id).collect();
        state.rights.retain(|id, _| !ids.contains(id));
        state.user_rights.retain(|ur| !ids.contains(&ur.right_id));
        Ok(())
    }

    // ==================== User Operations ====================

    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error> {
        let state = self.lock()?;
        state.check("list_users")?;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_utc);
        Ok(users)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        let state = self.lock()?;
        state.check("find_user_by_id")?;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn insert_user(
        &self,
        user: &User,
        password: Option<&Password>,
    ) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("insert_user")?;
        if state.users.contains_key(&user.user_id) {
            anyhow::bail!("User {} already exists", user.user_id);
        }
        if let Some(password) = password {
            if state.passwords.contains_key(&password.password_id) {
                anyhow::bail!("Password {} already exists", password.password_id);
            }
            let mut stored_password = password.clone();
            stored_password.user_id = user.user_id;
            stored_password.user = None;
            state
                .passwords
                .insert(stored_password.password_id, stored_password);
        }
        let mut stored_user = user.clone();
        stored_user.user_rights.clear();
        state.users.insert(stored_user.user_id, stored_user);
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("update_user")?;
        let Some(existing) = state.users.get_mut(&user.user_id) else {
            anyhow::bail!("User {} no longer exists", user.user_id);
        };
        existing.email = user.email.clone();
        existing.nickname = user.nickname.clone();
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, anyhow::Error> {
        let mut state = self.lock()?;
        state.check("delete_user")?;
        if state.users.remove(&user_id).is_none() {
            return Ok(false);
        }
        state.passwords.retain(|_, p| p.user_id != user_id);
        state.user_rights.retain(|ur| ur.user_id != user_id);
        Ok(true)
    }

    async fn grant_right(&self, user_id: Uuid, right_id: Uuid) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("grant_right")?;
        if !state.users.contains_key(&user_id) {
            anyhow::bail!("User {} does not exist", user_id);
        }
        if !state.rights.contains_key(&right_id) {
            anyhow::bail!("Right {} does not exist", right_id);
        }
        let already = state
            .user_rights
            .iter()
            .any(|ur| ur.user_id == user_id && ur.right_id == right_id);
        if !already {
            state.user_rights.push(UserRight::new(user_id, right_id));
        }
        Ok(())
    }

    async fn revoke_right(&self, user_id: Uuid, right_id: Uuid) -> Result<bool, anyhow::Error> {
        let mut state = self.lock()?;
        state.check("revoke_right")?;
        let before = state.user_rights.len();
        state
            .user_rights
            .retain(|ur| !(ur.user_id == user_id && ur.right_id == right_id));
        Ok(state.user_rights.len() < before)
    }

    // ==================== Password Operations ====================

    async fn insert_password(&self, password: &Password) -> Result<(), anyhow::Error> {
        let mut state = self.lock()?;
        state.check("insert_password")?;
        if !state.users.contains_key(&password.user_id) {
            anyhow::bail!("User {} does not exist", password.user_id);
        }
        if state.passwords.values().any(|p| p.user_id == password.user_id) {
            anyhow::bail!("User {} already has a password", password.user_id);
        }
        let mut stored = password.clone();
        stored.user = None;
        state.passwords.insert(stored.password_id, stored);
        Ok(())
    }

    async fn find_password_by_id(
        &self,
        password_id: Uuid,
    ) -> Result<Option<Password>, anyhow::Error> {
        let state = self.lock()?;
        state.check("find_password_by_id")?;
        Ok(state.passwords.get(&password_id).cloned())
    }

    async fn find_password_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Password>, anyhow::Error> {
        let state = self.lock()?;
        state.check("find_password_by_user")?;
        Ok(state
            .passwords
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn find_password_with_rights(
        &self,
        encrypted_value: &str,
    ) -> Result<Option<Password>, anyhow::Error> {
        let state = self.lock()?;
        state.check("find_password_with_rights")?;

        let matches: Vec<&Password> = state
            .passwords
            .values()
            .filter(|p| p.encrypted_value == encrypted_value)
            .collect();
        if matches.len() > 1 {
            anyhow::bail!("More than one password shares the same encrypted value");
        }
        let Some(password) = matches.first() else {
            return Ok(None);
        };

        let mut password = (*password).clone();
        if let Some(user) = state.users.get(&password.user_id) {
            let mut user = user.clone();
            user.user_rights = state
                .user_rights
                .iter()
                .filter(|ur| ur.user_id == user.user_id)
                .map(|ur| {
                    let mut loaded = ur.clone();
                    loaded.right = state.rights.get(&ur.right_id).map(|right| {
                        let mut right = right.clone();
                        right.game = state.games.get(&right.game_id).cloned();
                        right
                    });
                    loaded
                })
                .collect();
            password.user = Some(user);
        }
        Ok(Some(password))
    }
}
