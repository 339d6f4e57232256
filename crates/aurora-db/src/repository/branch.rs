//! # Branch Repository
//!
//! Branches are reference data created at seed time; the engine only checks
//! that a checkout's branch exists.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use aurora_core::{Branch, Ownership};

/// Repository for branch database operations.
#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    /// Creates a new BranchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    /// Inserts a branch.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the id is taken.
    pub async fn insert(&self, id: &str, name: &str, ownership: Ownership) -> DbResult<Branch> {
        debug!(id = %id, ?ownership, "Inserting branch");

        let branch = Branch {
            id: id.to_string(),
            name: name.to_string(),
            ownership,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO branches (id, name, ownership, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&branch.id)
        .bind(&branch.name)
        .bind(branch.ownership)
        .bind(branch.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: id.to_string(),
            },
            other => other,
        })?;

        Ok(branch)
    }

    /// Gets a branch by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Branch>> {
        let branch = sqlx::query_as::<_, Branch>(
            "SELECT id, name, ownership, created_at FROM branches WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(branch)
    }

    /// Lists all branches ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Branch>> {
        let branches = sqlx::query_as::<_, Branch>(
            "SELECT id, name, ownership, created_at FROM branches ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(branches)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use aurora_core::Ownership;

    #[tokio::test]
    async fn test_insert_get_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.branches();

        repo.insert("BR-MAKATI", "Makati", Ownership::CompanyOwned)
            .await
            .unwrap();
        repo.insert("BR-CEBU", "Cebu", Ownership::Managed)
            .await
            .unwrap();

        let makati = repo.get("BR-MAKATI").await.unwrap().unwrap();
        assert_eq!(makati.ownership, Ownership::CompanyOwned);
        assert!(repo.get("BR-NOPE").await.unwrap().is_none());

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Cebu", "Makati"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.branches();

        repo.insert("BR-1", "One", Ownership::Managed).await.unwrap();
        let err = repo.insert("BR-1", "Again", Ownership::Managed).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "BR-1"));
    }
}
