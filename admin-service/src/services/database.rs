//! PostgreSQL implementation of [`AdminStore`].

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Game, Password, Right, User, UserRight};
use crate::services::store::AdminStore;

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// Granted right joined with its right and game rows.
#[derive(Debug, FromRow)]
struct UserRightRow {
    user_right_id: Uuid,
    user_id: Uuid,
    right_id: Uuid,
    right_name: String,
    right_description: String,
    game_id: Uuid,
    game_name: String,
    game_description: Option<String>,
}

impl From<UserRightRow> for UserRight {
    fn from(row: UserRightRow) -> Self {
        let game = Game {
            game_id: row.game_id,
            name: row.game_name,
            description: row.game_description,
        };
        let right = Right {
            right_id: row.right_id,
            name: row.right_name,
            description: row.right_description,
            game_id: row.game_id,
            game: Some(game),
        };
        Self {
            user_right_id: row.user_right_id,
            user_id: row.user_id,
            right_id: row.right_id,
            right: Some(right),
        }
    }
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AdminStore for Database {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        crate::db::health_check(&self.pool)
            .await
            .context("Database health check failed")
    }

    // ==================== Game Operations ====================

    async fn find_game_by_name(&self, name: &str) -> Result<Option<Game>, anyhow::Error> {
        sqlx::query_as::<_, Game>("SELECT game_id, name, description FROM games WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find game by name")
    }

    async fn find_game_by_id(&self, game_id: Uuid) -> Result<Option<Game>, anyhow::Error> {
        sqlx::query_as::<_, Game>("SELECT game_id, name, description FROM games WHERE game_id = $1")
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find game by id")
    }

    #[instrument(skip(self, game), fields(game_name = %game.name))]
    async fn insert_game(&self, game: &Game) -> Result<(), anyhow::Error> {
        sqlx::query("INSERT INTO games (game_id, name, description) VALUES ($1, $2, $3)")
            .bind(game.game_id)
            .bind(&game.name)
            .bind(&game.description)
            .execute(&self.pool)
            .await
            .context("Failed to insert game")?;
        Ok(())
    }

    #[instrument(skip(self, game), fields(game_id = %game.game_id))]
    async fn update_game(&self, game: &Game) -> Result<(), anyhow::Error> {
        let result = sqlx::query("UPDATE games SET name = $1, description = $2 WHERE game_id = $3")
            .bind(&game.name)
            .bind(&game.description)
            .bind(game.game_id)
            .execute(&self.pool)
            .await
            .context("Failed to update game")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Game {} no longer exists", game.game_id);
        }
        Ok(())
    }

    // ==================== Right Operations ====================

    async fn find_rights_by_game(&self, game_id: Uuid) -> Result<Vec<Right>, anyhow::Error> {
        sqlx::query_as::<_, Right>(
            "SELECT right_id, name, description, game_id FROM rights WHERE game_id = $1 ORDER BY name",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load rights of game")
    }

    async fn find_rights_by_names(&self, names: &[String]) -> Result<Vec<Right>, anyhow::Error> {
        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        sqlx::query_as::<_, Right>(
            "SELECT right_id, name, description, game_id FROM rights WHERE LOWER(name) = ANY($1)",
        )
        .bind(lowered)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load rights by names")
    }

    #[instrument(skip(self, rights), fields(count = rights.len()))]
    async fn add_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error> {
        let mut tx = self.pool.begin().await?;
        for right in rights {
            sqlx::query(
                "INSERT INTO rights (right_id, name, description, game_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(right.right_id)
            .bind(&right.name)
            .bind(&right.description)
            .bind(right.game_id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert right '{}'", right.name))?;
        }
        tx.commit().await.context("Failed to commit inserted rights")?;
        Ok(())
    }

    #[instrument(skip(self, rights), fields(count = rights.len()))]
    async fn update_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error> {
        let mut tx = self.pool.begin().await?;
        for right in rights {
            let result = sqlx::query(
                "UPDATE rights SET name = $1, description = $2, game_id = $3 WHERE right_id = $4",
            )
            .bind(&right.name)
            .bind(&right.description)
            .bind(right.game_id)
            .bind(right.right_id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to update right '{}'", right.name))?;

            if result.rows_affected() == 0 {
                anyhow::bail!("Right '{}' no longer exists", right.name);
            }
        }
        tx.commit().await.context("Failed to commit updated rights")?;
        Ok(())
    }

    #[instrument(skip(self, rights), fields(count = rights.len()))]
    async fn remove_rights(&self, rights: &[Right]) -> Result<(), anyhow::Error> {
        let ids: Vec<Uuid> = rights.iter().map(|r| r.right_id).collect();
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM rights WHERE right_id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await
            .context("Failed to delete rights")?;
        tx.commit().await.context("Failed to commit deleted rights")?;
        Ok(())
    }

    // ==================== User Operations ====================

    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, email, nickname, created_utc FROM users ORDER BY created_utc",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, email, nickname, created_utc FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find user by id")
    }

    #[instrument(skip(self, user, password), fields(user_id = %user.user_id))]
    async fn insert_user(
        &self,
        user: &User,
        password: Option<&Password>,
    ) -> Result<(), anyhow::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO users (user_id, email, nickname, created_utc) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(user.created_utc)
        .execute(&mut *tx)
        .await
        .context("Failed to insert user")?;

        if let Some(password) = password {
            sqlx::query(
                "INSERT INTO passwords (password_id, encrypted_value, user_id) VALUES ($1, $2, $3)",
            )
            .bind(password.password_id)
            .bind(&password.encrypted_value)
            .bind(user.user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to insert user password")?;
        }

        tx.commit().await.context("Failed to commit user")?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    async fn update_user(&self, user: &User) -> Result<(), anyhow::Error> {
        let result = sqlx::query("UPDATE users SET email = $1, nickname = $2 WHERE user_id = $3")
            .bind(&user.email)
            .bind(&user.nickname)
            .bind(user.user_id)
            .execute(&self.pool)
            .await
            .context("Failed to update user")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("User {} no longer exists", user.user_id);
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }

    async fn grant_right(&self, user_id: Uuid, right_id: Uuid) -> Result<(), anyhow::Error> {
        let user_right = UserRight::new(user_id, right_id);
        sqlx::query(
            r#"
            INSERT INTO users_rights (user_right_id, user_id, right_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, right_id) DO NOTHING
            "#,
        )
        .bind(user_right.user_right_id)
        .bind(user_right.user_id)
        .bind(user_right.right_id)
        .execute(&self.pool)
        .await
        .context("Failed to grant right")?;
        Ok(())
    }

    async fn revoke_right(&self, user_id: Uuid, right_id: Uuid) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM users_rights WHERE user_id = $1 AND right_id = $2")
            .bind(user_id)
            .bind(right_id)
            .execute(&self.pool)
            .await
            .context("Failed to revoke right")?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Password Operations ====================

    async fn insert_password(&self, password: &Password) -> Result<(), anyhow::Error> {
        sqlx::query(
            "INSERT INTO passwords (password_id, encrypted_value, user_id) VALUES ($1, $2, $3)",
        )
        .bind(password.password_id)
        .bind(&password.encrypted_value)
        .bind(password.user_id)
        .execute(&self.pool)
        .await
        .context("Failed to insert password")?;
        Ok(())
    }

    async fn find_password_by_id(
        &self,
        password_id: Uuid,
    ) -> Result<Option<Password>, anyhow::Error> {
        sqlx::query_as::<_, Password>(
            "SELECT password_id, encrypted_value, user_id FROM passwords WHERE password_id = $1",
        )
        .bind(password_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find password by id")
    }

    async fn find_password_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Password>, anyhow::Error> {
        sqlx::query_as::<_, Password>(
            "SELECT password_id, encrypted_value, user_id FROM passwords WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find password of user")
    }

    async fn find_password_with_rights(
        &self,
        encrypted_value: &str,
    ) -> Result<Option<Password>, anyhow::Error> {
        let mut matches = sqlx::query_as::<_, Password>(
            "SELECT password_id, encrypted_value, user_id FROM passwords WHERE encrypted_value = $1",
        )
        .bind(encrypted_value)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find password by value")?;

        if matches.len() > 1 {
            anyhow::bail!("More than one password shares the same encrypted value");
        }
        let Some(mut password) = matches.pop() else {
            return Ok(None);
        };

        let Some(mut user) = self.find_user_by_id(password.user_id).await? else {
            return Ok(Some(password));
        };

        let rows = sqlx::query_as::<_, UserRightRow>(
            r#"
            SELECT ur.user_right_id, ur.user_id, ur.right_id,
                   r.name AS right_name, r.description AS right_description,
                   g.game_id, g.name AS game_name, g.description AS game_description
            FROM users_rights ur
            JOIN rights r ON r.right_id = ur.right_id
            JOIN games g ON g.game_id = r.game_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user.user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load granted rights")?;

        user.user_rights = rows.into_iter().map(UserRight::from).collect();
        password.user = Some(user);
        Ok(Some(password))
    }
}
