// Customer store: persistence for customer records

use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::customers::models::{CreateCustomerRequest, Customer, UpdateCustomerRequest};
use crate::error::ApiError;

/// Storage operations for customer records
///
/// Requests arrive validated. Every write is a single atomic step.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// All records, newest first
    async fn list(&self) -> Result<Vec<Customer>, ApiError>;

    /// Insert a record; the store assigns the id and timestamps
    async fn create(&self, request: &CreateCustomerRequest) -> Result<Customer, ApiError>;

    /// Apply a partial update; `None` when no record has this id
    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateCustomerRequest,
    ) -> Result<Option<Customer>, ApiError>;

    /// Remove a record; `false` when no record has this id
    async fn delete(&self, id: Uuid) -> Result<bool, ApiError>;
}

/// PostgreSQL-backed customer repository
#[derive(Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn list(&self) -> Result<Vec<Customer>, ApiError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, company, address, created_at, updated_at
            FROM customers
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    async fn create(&self, request: &CreateCustomerRequest) -> Result<Customer, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, name, email, phone, company, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, company, address, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.company)
        .bind(&request.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateCustomerRequest,
    ) -> Result<Option<Customer>, ApiError> {
        // each optional column carries a "supplied" flag so NULL can clear it
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                email = CASE WHEN $3 THEN $4 ELSE email END,
                phone = CASE WHEN $5 THEN $6 ELSE phone END,
                company = CASE WHEN $7 THEN $8 ELSE company END,
                address = CASE WHEN $9 THEN $10 ELSE address END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, phone, company, address, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.email.is_some())
        .bind(supplied_value(&changes.email))
        .bind(changes.phone.is_some())
        .bind(supplied_value(&changes.phone))
        .bind(changes.company.is_some())
        .bind(supplied_value(&changes.company))
        .bind(changes.address.is_some())
        .bind(supplied_value(&changes.address))
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn supplied_value(field: &Option<Option<String>>) -> Option<&str> {
    field.as_ref().and_then(|value| value.as_deref())
}

/// In-memory customer repository
///
/// Records are kept in insertion order, so listing is a reverse walk.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    records: RwLock<Vec<Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn list(&self) -> Result<Vec<Customer>, ApiError> {
        Ok(self.records.read().await.iter().rev().cloned().collect())
    }

    async fn create(&self, request: &CreateCustomerRequest) -> Result<Customer, ApiError> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            company: request.company.clone(),
            address: request.address.clone(),
            created_at: now,
            updated_at: now,
        };

        self.records.write().await.push(customer.clone());
        Ok(customer)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateCustomerRequest,
    ) -> Result<Option<Customer>, ApiError> {
        let mut records = self.records.write().await;
        let Some(customer) = records.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        changes.apply_to(customer);
        customer.updated_at = Utc::now();
        Ok(Some(customer.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|c| c.id != id);
        Ok(records.len() < before)
    }
}
