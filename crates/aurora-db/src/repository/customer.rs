//! # Customer Repository
//!
//! Customer/patient records. Store credit is also written by the engine
//! during checkout and refund; [`CustomerRepository::set_store_credit`] is
//! the direct admin edit.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use aurora_core::Customer;

/// Fields needed to create a customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub store_credit_cents: i64,
    pub medical_notes: Option<String>,
    pub allergies: Option<String>,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>) -> Self {
        NewCustomer {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn store_credit(mut self, cents: i64) -> Self {
        self.store_credit_cents = cents;
        self
    }
}

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, store_credit_cents, medical_notes, \
                                allergies, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer.
    pub async fn insert(&self, new: &NewCustomer) -> DbResult<Customer> {
        debug!(name = %new.name, "Inserting customer");

        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO customers (
                name, phone, email, store_credit_cents,
                medical_notes, allergies, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(new.store_credit_cents)
        .bind(&new.medical_notes)
        .bind(&new.allergies)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Customer {
            id,
            name: new.name.clone(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            store_credit_cents: new.store_credit_cents,
            medical_notes: new.medical_notes.clone(),
            allergies: new.allergies.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a customer by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Overwrites a customer's store credit balance.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the customer doesn't exist
    /// - `DbError::CheckViolation` for a negative balance
    pub async fn set_store_credit(&self, id: i64, cents: i64) -> DbResult<()> {
        info!(customer_id = id, cents, "Setting store credit");

        let result = sqlx::query(
            "UPDATE customers SET store_credit_cents = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let mut new = NewCustomer::new("Maria Santos").store_credit(50_000);
        new.allergies = Some("Penicillin".to_string());
        let created = repo.insert(&new).await.unwrap();

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Maria Santos");
        assert_eq!(fetched.store_credit().cents(), 50_000);
        assert_eq!(fetched.allergies.as_deref(), Some("Penicillin"));
        assert!(fetched.phone.is_none());
    }

    #[tokio::test]
    async fn test_set_store_credit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        let customer = repo.insert(&NewCustomer::new("Ana")).await.unwrap();

        repo.set_store_credit(customer.id, 12_500).await.unwrap();
        assert_eq!(
            repo.get(customer.id).await.unwrap().unwrap().store_credit_cents,
            12_500
        );

        assert!(matches!(
            repo.set_store_credit(customer.id, -1).await,
            Err(DbError::CheckViolation { .. })
        ));
        assert!(matches!(
            repo.set_store_credit(9_999, 100).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
