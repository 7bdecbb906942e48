//! Like ledger: at most one like per (user, simulation).
//!
//! The `UNIQUE (user_id, simulation_id)` constraint on `simulation_likes` is
//! the only thing that enforces the invariant. The existence pre-check in
//! [`LikeLedger::toggle_on`] just produces a friendlier path for the common
//! case; when two requests race past it, the losing insert trips the
//! constraint and is reported as the same `Conflict`.
//!
//! Counts are always a fresh `COUNT(*)`, never a stored counter.

use super::turso::{database_error, is_foreign_key_violation, is_unique_violation, TursoClient};
use crate::types::{AppError, LikeCount, Result};
use chrono::Utc;
use libsql::Connection;
use tracing::{info, warn};

/// Like operations over a [`TursoClient`].
pub struct LikeLedger<'a> {
    client: &'a TursoClient,
}

impl TursoClient {
    /// Access the like ledger.
    pub fn likes(&self) -> LikeLedger<'_> {
        LikeLedger { client: self }
    }
}

impl LikeLedger<'_> {
    /// Record that `user_id` likes `simulation_id`.
    ///
    /// Fails with `NotFound` if the simulation does not exist and with
    /// `Conflict` if the like already exists. Returns the new count.
    pub async fn toggle_on(&self, user_id: i64, simulation_id: i64) -> Result<LikeCount> {
        let conn = self.client.connection().await?;

        if !simulation_exists(&conn, simulation_id).await? {
            return Err(simulation_not_found());
        }

        if like_exists(&conn, user_id, simulation_id).await? {
            return Err(already_liked());
        }

        insert_like(&conn, user_id, simulation_id).await?;

        let likes = count(&conn, simulation_id).await?;
        info!(user_id, simulation_id, likes, "Simulation liked");

        Ok(LikeCount {
            simulation_id,
            likes,
        })
    }

    /// Remove the like of `user_id` on `simulation_id`.
    ///
    /// Fails with `NotFound` if there is no such like. Returns the new count.
    pub async fn toggle_off(&self, user_id: i64, simulation_id: i64) -> Result<LikeCount> {
        let conn = self.client.connection().await?;

        let deleted = conn
            .execute(
                "DELETE FROM simulation_likes WHERE user_id = ? AND simulation_id = ?",
                (user_id, simulation_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to remove like: {}", e)))?;

        if deleted == 0 {
            return Err(AppError::NotFound(
                "No like recorded for this simulation".to_string(),
            ));
        }

        let likes = count(&conn, simulation_id).await?;
        info!(user_id, simulation_id, likes, "Simulation unliked");

        Ok(LikeCount {
            simulation_id,
            likes,
        })
    }

    /// Number of likes currently recorded for a simulation.
    pub async fn count(&self, simulation_id: i64) -> Result<i64> {
        let conn = self.client.connection().await?;
        count(&conn, simulation_id).await
    }

    /// Whether `user_id` currently likes `simulation_id`.
    pub async fn is_liked(&self, user_id: i64, simulation_id: i64) -> Result<bool> {
        let conn = self.client.connection().await?;
        like_exists(&conn, user_id, simulation_id).await
    }
}

/// Insert the like row, translating constraint failures.
///
/// A duplicate pair is `Conflict`; a missing simulation or user (deleted
/// after the pre-checks) is `NotFound`.
async fn insert_like(conn: &Connection, user_id: i64, simulation_id: i64) -> Result<()> {
    let now = Utc::now().timestamp();
    let inserted = conn
        .execute(
            "INSERT INTO simulation_likes (user_id, simulation_id, created_at)
             VALUES (?, ?, ?)",
            (user_id, simulation_id, now),
        )
        .await;

    match inserted {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => {
            warn!(
                user_id,
                simulation_id, "Concurrent like rejected by uniqueness constraint"
            );
            Err(already_liked())
        }
        Err(e) if is_foreign_key_violation(&e) => Err(simulation_not_found()),
        Err(e) => Err(AppError::Database(format!("Failed to add like: {}", e))),
    }
}

fn already_liked() -> AppError {
    AppError::Conflict("Simulation already liked".to_string())
}

fn simulation_not_found() -> AppError {
    AppError::NotFound("Simulation not found".to_string())
}

async fn simulation_exists(conn: &Connection, simulation_id: i64) -> Result<bool> {
    let mut rows = conn
        .query("SELECT 1 FROM simulations WHERE id = ?", [simulation_id])
        .await
        .map_err(|e| AppError::Database(format!("Failed to query simulation: {}", e)))?;

    Ok(rows.next().await.map_err(database_error)?.is_some())
}

async fn like_exists(conn: &Connection, user_id: i64, simulation_id: i64) -> Result<bool> {
    let mut rows = conn
        .query(
            "SELECT 1 FROM simulation_likes WHERE user_id = ? AND simulation_id = ?",
            (user_id, simulation_id),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to query like: {}", e)))?;

    Ok(rows.next().await.map_err(database_error)?.is_some())
}

async fn count(conn: &Connection, simulation_id: i64) -> Result<i64> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM simulation_likes WHERE simulation_id = ?",
            [simulation_id],
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to count likes: {}", e)))?;

    let row = rows
        .next()
        .await
        .map_err(database_error)?
        .ok_or_else(|| AppError::Database("Like count returned no row".to_string()))?;

    row.get(0).map_err(database_error)
}
