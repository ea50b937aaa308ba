use chrono::Utc;
use log::info;

use crate::db::{generate_id, DbPool, NewShooting, Shooting};
use crate::error::{AppError, AppResult};

const SHOOTING_SELECT: &str = "SELECT s.id, s.name, s.description, s.cover_media_id, s.created_at, s.user_id, \
     (SELECT COUNT(*) FROM media_metadata mm WHERE mm.shooting_id = s.id) AS media_count \
     FROM shootings s";

#[derive(Clone)]
pub struct ShootingRepository {
    pool: DbPool,
}

impl ShootingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Newest first, each with the number of media currently filed under it.
    pub async fn list(&self) -> AppResult<Vec<Shooting>> {
        let shootings = sqlx::query_as::<_, Shooting>(&format!(
            "{} ORDER BY s.created_at DESC, s.id DESC",
            SHOOTING_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(shootings)
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<Shooting> {
        sqlx::query_as::<_, Shooting>(&format!("{} WHERE s.id = ?", SHOOTING_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Shooting not found"))
    }

    pub async fn create(&self, data: NewShooting) -> AppResult<Shooting> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Missing required field: name"));
        }

        let id = generate_id();
        sqlx::query(
            "INSERT INTO shootings (id, name, description, cover_media_id, created_at, user_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(&data.description)
        .bind(&data.cover_media_id)
        .bind(Utc::now())
        .bind(&data.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("A shooting named '{}' already exists", name))
            }
            other => other,
        })?;

        info!("Created shooting '{}' ({})", name, id);
        self.get_by_id(&id).await
    }

    /// Detaches every media item from the shooting, then removes it. Media rows stay.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let orphaned = sqlx::query("UPDATE media_metadata SET shooting_id = NULL WHERE shooting_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM shootings WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Shooting not found"));
        }

        tx.commit().await?;
        info!("Deleted shooting {} ({} media detached)", id, orphaned);
        Ok(())
    }
}
